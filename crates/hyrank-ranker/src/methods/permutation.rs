//! Permutation importance on a time-ordered holdout.
//!
//! A forest is fitted on the leading rows; each column of the trailing
//! holdout is shuffled `n_repeats` times and the mean accuracy drop is the
//! feature's score. Rows are never shuffled across the split.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use hyrank_common::ranking_config::{ForestParams, PermutationParams};
use hyrank_common::{FeatureMatrix, HyrankError, MethodKind, Result, TargetVector};

use super::forest::RandomForestModel;
use super::{require_both_classes, ImportanceScorer};

/// Offset separating the shuffle stream from the forest's tree seeds.
const SHUFFLE_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct PermutationScorer {
    params: PermutationParams,
    forest: ForestParams,
    seed: u64,
}

impl PermutationScorer {
    pub fn new(params: PermutationParams, forest: ForestParams, seed: u64) -> Self {
        Self { params, forest, seed }
    }

    /// Index of the first holdout row.
    fn split_point(&self, n: usize) -> usize {
        ((n as f64) * (1.0 - self.params.holdout_fraction)).floor() as usize
    }
}

impl ImportanceScorer for PermutationScorer {
    fn method(&self) -> MethodKind {
        MethodKind::Permutation
    }

    fn score(&self, x: &FeatureMatrix, y: &TargetVector) -> Result<Vec<f64>> {
        let n = x.n_rows();
        let split = self.split_point(n);
        if split < 2 || n - split < 2 {
            return Err(HyrankError::degenerate(
                self.method(),
                format!(
                    "{n} rows are too few for a {:.0}% holdout",
                    self.params.holdout_fraction * 100.0
                ),
            ));
        }

        let (train_x, train_y) = (x.slice_rows(0..split), y.slice(0..split));
        let (test_x, test_y) = (x.slice_rows(split..n), y.slice(split..n));
        require_both_classes(self.method(), &train_y)?;

        let model = RandomForestModel::fit(train_x.values(), train_y.labels(), &self.forest, self.seed);
        let baseline = model.accuracy(test_x.values(), test_y.labels());
        debug!(train_rows = split, holdout_rows = n - split, baseline, "Permutation baseline");

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ SHUFFLE_STREAM);
        let mut shuffled = test_x.values().clone();
        let mut scores = Vec::with_capacity(x.n_features());

        for j in 0..x.n_features() {
            let original = test_x.column(j).to_vec();
            let mut drop = 0.0;
            for _ in 0..self.params.n_repeats {
                let mut column = original.clone();
                column.shuffle(&mut rng);
                for (i, v) in column.into_iter().enumerate() {
                    shuffled[[i, j]] = v;
                }
                drop += baseline - model.accuracy(&shuffled, test_y.labels());
            }
            for (i, v) in original.into_iter().enumerate() {
                shuffled[[i, j]] = v;
            }
            scores.push(drop / self.params.n_repeats as f64);
        }

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> PermutationScorer {
        PermutationScorer::new(
            PermutationParams::default(),
            ForestParams { n_trees: 15, max_depth: 4, ..Default::default() },
            42,
        )
    }

    fn data(n: usize) -> (FeatureMatrix, TargetVector) {
        let labels: Vec<u8> = (0..n).map(|i| u8::from((i * 3) % 7 < 3)).collect();
        let x = FeatureMatrix::from_columns(vec![
            ("noise".into(), (0..n).map(|i| ((i * 11) % 13) as f64).collect()),
            ("signal".into(), labels.iter().map(|&l| l as f64).collect()),
        ])
        .unwrap();
        (x, TargetVector::new(labels).unwrap())
    }

    #[test]
    fn test_split_point_is_time_ordered() {
        assert_eq!(scorer().split_point(100), 80);
        assert_eq!(scorer().split_point(11), 8);
    }

    #[test]
    fn test_shuffling_signal_hurts_accuracy() {
        let (x, y) = data(80);
        let scores = scorer().score(&x, &y).unwrap();
        assert!(scores[1] > 0.0);
        assert!(scores[1] > scores[0]);
    }

    #[test]
    fn test_seeded_repeatability() {
        let (x, y) = data(50);
        assert_eq!(scorer().score(&x, &y).unwrap(), scorer().score(&x, &y).unwrap());
    }

    #[test]
    fn test_too_few_rows_is_degenerate() {
        let (x, y) = data(4);
        let err = scorer().score(&x, &y).unwrap_err();
        assert!(matches!(err, HyrankError::DegenerateMethod { method: MethodKind::Permutation, .. }));
    }
}
