//! Per-method importance scorers.
//!
//! Every scorer maps (matrix, target) to one score per feature, in column
//! order, larger meaning more predictive. Scorers read the shared matrix
//! and never mutate it, so they can run side by side.

pub mod boosting;
pub mod elimination;
pub mod forest;
pub mod lasso;
pub(crate) mod logistic;
pub mod mutual_info;
pub mod permutation;
pub mod statistical;
pub(crate) mod tree;

use std::collections::HashMap;

use ndarray::Array2;

use hyrank_common::ranking_config::MethodParams;
use hyrank_common::{FeatureMatrix, HyrankError, MethodKind, Result, TargetVector};

use crate::rank::MethodScoreTable;

pub use boosting::BoostingScorer;
pub use elimination::EliminationScorer;
pub use forest::RandomForestScorer;
pub use lasso::LassoScorer;
pub use mutual_info::MutualInfoScorer;
pub use permutation::PermutationScorer;
pub use statistical::{FTestScorer, VarianceScorer};

/// A feature-importance method.
///
/// Implementations can be:
/// - one of the built-in scorers below
/// - scores computed elsewhere and injected through [`PrecomputedScorer`]
pub trait ImportanceScorer: Send + Sync {
    fn method(&self) -> MethodKind;

    /// One score per column of `x`. A method that cannot score the input
    /// returns `DegenerateMethod`; it never substitutes a default score.
    fn score(&self, x: &FeatureMatrix, y: &TargetVector) -> Result<Vec<f64>>;
}

/// The eight built-in scorers in canonical method order.
pub fn default_scorers(params: &MethodParams) -> Vec<Box<dyn ImportanceScorer>> {
    vec![
        Box::new(BoostingScorer::new(params.xgboost.clone())),
        Box::new(RandomForestScorer::new(params.random_forest.clone(), params.seed)),
        Box::new(PermutationScorer::new(
            params.permutation.clone(),
            params.random_forest.clone(),
            params.seed,
        )),
        Box::new(EliminationScorer::new(params.rfe_step, params.logistic.clone())),
        Box::new(FTestScorer),
        Box::new(MutualInfoScorer::new(params.mutual_info_bins)),
        Box::new(LassoScorer::new(params.lasso_alpha, params.logistic.clone())),
        Box::new(VarianceScorer),
    ]
}

/// Run one scorer and rank its output.
pub fn score_table(
    scorer: &dyn ImportanceScorer,
    x: &FeatureMatrix,
    y: &TargetVector,
) -> Result<MethodScoreTable> {
    let scores = scorer.score(x, y)?;
    MethodScoreTable::from_scores(scorer.method(), x.names(), &scores)
}

// ── Precomputed scores ──────────────────────────────────────────────────────

/// Serves scores computed outside this crate, keyed by feature name.
pub struct PrecomputedScorer {
    method: MethodKind,
    scores: HashMap<String, f64>,
}

impl PrecomputedScorer {
    pub fn new(method: MethodKind) -> Self {
        Self { method, scores: HashMap::new() }
    }

    /// Add a feature's score.
    pub fn with(mut self, feature: &str, score: f64) -> Self {
        self.scores.insert(feature.to_string(), score);
        self
    }
}

impl ImportanceScorer for PrecomputedScorer {
    fn method(&self) -> MethodKind {
        self.method
    }

    fn score(&self, x: &FeatureMatrix, _y: &TargetVector) -> Result<Vec<f64>> {
        x.names()
            .iter()
            .map(|name| {
                self.scores.get(name).copied().ok_or_else(|| {
                    HyrankError::degenerate(self.method, format!("no score for '{name}'"))
                })
            })
            .collect()
    }
}

// ── Shared helpers ──────────────────────────────────────────────────────────

pub(crate) fn require_both_classes(method: MethodKind, y: &TargetVector) -> Result<()> {
    if y.positives() == 0 || y.negatives() == 0 {
        return Err(HyrankError::degenerate(
            method,
            format!(
                "target has a single class ({} up, {} down)",
                y.positives(),
                y.negatives()
            ),
        ));
    }
    Ok(())
}

/// Column-wise z-scores (population std). A constant column cannot be
/// standardised and fails the method.
pub(crate) fn standardize(method: MethodKind, x: &FeatureMatrix) -> Result<Array2<f64>> {
    let mut z = x.values().clone();
    for (j, mut column) in z.columns_mut().into_iter().enumerate() {
        let mean = column.mean().unwrap_or(0.0);
        let std = column.std(0.0);
        if !(std > 0.0) || !std.is_finite() {
            return Err(HyrankError::degenerate(
                method,
                format!("feature '{}' is constant and cannot be standardised", x.names()[j]),
            ));
        }
        column.mapv_inplace(|v| (v - mean) / std);
    }
    Ok(z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> FeatureMatrix {
        FeatureMatrix::from_columns(vec![
            ("a".into(), vec![1.0, 2.0, 3.0, 4.0]),
            ("b".into(), vec![0.0, 1.0, 0.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_default_scorers_cover_every_method_in_order() {
        let scorers = default_scorers(&MethodParams::default());
        let methods: Vec<MethodKind> = scorers.iter().map(|s| s.method()).collect();
        assert_eq!(methods, MethodKind::ALL.to_vec());
    }

    #[test]
    fn test_precomputed_scorer() {
        let y = TargetVector::new(vec![0, 1, 0, 1]).unwrap();
        let scorer = PrecomputedScorer::new(MethodKind::Xgboost).with("a", 0.2).with("b", 0.7);
        let table = score_table(&scorer, &matrix(), &y).unwrap();
        assert_eq!(table.rank_of("b"), Some(1));

        let partial = PrecomputedScorer::new(MethodKind::Xgboost).with("a", 0.2);
        assert!(partial.score(&matrix(), &y).is_err());
    }

    #[test]
    fn test_single_class_rejected() {
        let y = TargetVector::new(vec![0, 0, 0, 0]).unwrap();
        assert!(require_both_classes(MethodKind::FTest, &y).is_err());
    }

    #[test]
    fn test_standardize() {
        let z = standardize(MethodKind::Lasso, &matrix()).unwrap();
        for column in z.columns() {
            assert!(column.mean().unwrap().abs() < 1e-12);
            assert!((column.std(0.0) - 1.0).abs() < 1e-12);
        }
    }
}
