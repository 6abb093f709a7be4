//! Random-forest scorer: mean decrease in Gini impurity over bagged trees.

use ndarray::{Array2, ArrayView1};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use hyrank_common::ranking_config::ForestParams;
use hyrank_common::{FeatureMatrix, MethodKind, Result, TargetVector};

use super::tree::{bootstrap_rows, grow_gini_tree, GiniParams, Tree};
use super::{require_both_classes, ImportanceScorer};

/// A fitted forest. Tree i is grown from `seed + i`, so the result does not
/// depend on how rayon schedules the trees.
pub(crate) struct RandomForestModel {
    trees: Vec<Tree>,
    importances: Vec<f64>,
}

impl RandomForestModel {
    pub(crate) fn fit(x: &Array2<f64>, y: &[u8], params: &ForestParams, seed: u64) -> Self {
        let n_features = x.ncols();
        let gini = GiniParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: params
                .max_features
                .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize),
        };

        let grown: Vec<(Tree, Vec<f64>)> = (0..params.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(i as u64));
                let rows = bootstrap_rows(x.nrows(), &mut rng);
                grow_gini_tree(x, y, rows, &gini, &mut rng)
            })
            .collect();

        // per-tree normalisation, then average
        let mut importances = vec![0.0; n_features];
        for (_, tree_imp) in &grown {
            let total: f64 = tree_imp.iter().sum();
            if total > 0.0 {
                for (acc, v) in importances.iter_mut().zip(tree_imp) {
                    *acc += v / total;
                }
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }

        let trees: Vec<Tree> = grown.into_iter().map(|(t, _)| t).collect();
        debug!(
            trees = trees.len(),
            mean_leaves = trees.iter().map(Tree::n_leaves).sum::<usize>() as f64 / trees.len().max(1) as f64,
            "Fitted random forest"
        );
        Self { trees, importances }
    }

    pub(crate) fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub(crate) fn predict_proba(&self, row: ArrayView1<'_, f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        sum / self.trees.len().max(1) as f64
    }

    /// Fraction of rows whose majority vote (P(up) > 0.5) matches `y`.
    pub(crate) fn accuracy(&self, x: &Array2<f64>, y: &[u8]) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        let hits = x
            .rows()
            .into_iter()
            .zip(y)
            .filter(|(row, label)| u8::from(self.predict_proba(row.view()) > 0.5) == **label)
            .count();
        hits as f64 / y.len() as f64
    }
}

pub struct RandomForestScorer {
    params: ForestParams,
    seed: u64,
}

impl RandomForestScorer {
    pub fn new(params: ForestParams, seed: u64) -> Self {
        Self { params, seed }
    }
}

impl ImportanceScorer for RandomForestScorer {
    fn method(&self) -> MethodKind {
        MethodKind::RandomForest
    }

    fn score(&self, x: &FeatureMatrix, y: &TargetVector) -> Result<Vec<f64>> {
        require_both_classes(self.method(), y)?;
        let model = RandomForestModel::fit(x.values(), y.labels(), &self.params, self.seed);
        Ok(model.importances().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> ForestParams {
        ForestParams { n_trees: 20, max_depth: 4, ..Default::default() }
    }

    fn planted() -> (FeatureMatrix, TargetVector) {
        let labels: Vec<u8> = (0..60).map(|i| u8::from((i * 7) % 5 < 2)).collect();
        let signal: Vec<f64> = labels.iter().map(|&l| l as f64 * 2.0 - 1.0).collect();
        let noise: Vec<f64> = (0..60).map(|i| ((i * 37) % 11) as f64).collect();
        let x = FeatureMatrix::from_columns(vec![("noise".into(), noise), ("signal".into(), signal)])
            .unwrap();
        (x, TargetVector::new(labels).unwrap())
    }

    #[test]
    fn test_signal_dominates_importance() {
        let (x, y) = planted();
        let scores = RandomForestScorer::new(small_params(), 42).score(&x, &y).unwrap();
        assert!(scores[1] > scores[0]);
        assert!((scores.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_same_scores() {
        let (x, y) = planted();
        let a = RandomForestScorer::new(small_params(), 9).score(&x, &y).unwrap();
        let b = RandomForestScorer::new(small_params(), 9).score(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_class_target_fails() {
        let (x, _) = planted();
        let y = TargetVector::new(vec![1; 60]).unwrap();
        assert!(RandomForestScorer::new(small_params(), 1).score(&x, &y).is_err());
    }

    #[test]
    fn test_fitted_forest_predicts_training_signal() {
        let (x, y) = planted();
        let model = RandomForestModel::fit(x.values(), y.labels(), &small_params(), 3);
        assert!(model.accuracy(x.values(), y.labels()) > 0.95);
    }
}
