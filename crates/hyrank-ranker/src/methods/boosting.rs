//! Gradient-boosting scorer (logistic loss, second-order split gain).
//! Importance is the total gain a feature contributes across all trees.

use tracing::debug;

use hyrank_common::ranking_config::BoostingParams;
use hyrank_common::{FeatureMatrix, MethodKind, Result, TargetVector};

use super::logistic::sigmoid;
use super::tree::{grow_gradient_tree, GradientParams};
use super::{require_both_classes, ImportanceScorer};

pub struct BoostingScorer {
    params: BoostingParams,
}

impl BoostingScorer {
    pub fn new(params: BoostingParams) -> Self {
        Self { params }
    }
}

impl ImportanceScorer for BoostingScorer {
    fn method(&self) -> MethodKind {
        MethodKind::Xgboost
    }

    fn score(&self, x: &FeatureMatrix, y: &TargetVector) -> Result<Vec<f64>> {
        require_both_classes(self.method(), y)?;
        let values = x.values();
        let labels = y.as_f64();
        let n = labels.len();

        let tree_params = GradientParams {
            max_depth: self.params.max_depth,
            reg_lambda: self.params.reg_lambda,
            min_child_weight: self.params.min_child_weight,
            learning_rate: self.params.learning_rate,
        };

        // start from the prior log-odds
        let base = (y.positives() as f64 / y.negatives() as f64).ln();
        let mut margin = vec![base; n];
        let mut gain = vec![0.0; x.n_features()];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];

        for round in 0..self.params.n_estimators {
            for i in 0..n {
                let p = sigmoid(margin[i]);
                grad[i] = p - labels[i];
                hess[i] = p * (1.0 - p);
            }

            let (tree, tree_gain) = grow_gradient_tree(values, &grad, &hess, &tree_params);
            if tree.n_leaves() == 1 {
                debug!(round, "No further split improves the loss; stopping early");
                break;
            }
            for (acc, g) in gain.iter_mut().zip(&tree_gain) {
                *acc += g;
            }
            for (i, row) in values.rows().into_iter().enumerate() {
                margin[i] += tree.predict(row);
            }
        }

        Ok(gain)
    }
}
