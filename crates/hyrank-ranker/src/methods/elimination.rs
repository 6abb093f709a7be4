//! Recursive feature elimination.
//!
//! Repeatedly fit a lightly ridge-penalised logistic regression on the
//! surviving standardised columns and drop the `step` columns with the
//! smallest |coefficient|. A feature's score is its elimination position:
//! the first one eliminated scores 1, the last survivor scores F.

use ndarray::{Array1, Axis};
use tracing::debug;

use hyrank_common::ranking_config::LogisticParams;
use hyrank_common::{FeatureMatrix, MethodKind, Result, TargetVector};

use super::logistic::{fit_logistic, LogisticModel, Penalty};
use super::{require_both_classes, standardize, ImportanceScorer};

/// Keeps separable columns from driving coefficients to infinity.
const RIDGE: f64 = 1e-3;

pub struct EliminationScorer {
    step: usize,
    params: LogisticParams,
}

impl EliminationScorer {
    pub fn new(step: usize, params: LogisticParams) -> Self {
        Self { step: step.max(1), params }
    }
}

impl ImportanceScorer for EliminationScorer {
    fn method(&self) -> MethodKind {
        MethodKind::Rfe
    }

    fn score(&self, x: &FeatureMatrix, y: &TargetVector) -> Result<Vec<f64>> {
        require_both_classes(self.method(), y)?;
        let z = standardize(self.method(), x)?;
        let labels = Array1::from(y.as_f64());
        let f = x.n_features();

        let mut alive: Vec<usize> = (0..f).collect();
        let mut scores = vec![0.0; f];
        let mut next_position = 1usize;
        let mut warm: Option<LogisticModel> = None;

        while alive.len() > 1 {
            let sub = z.select(Axis(1), &alive);
            let model = fit_logistic(&sub, &labels, &self.params, Penalty::ridge(RIDGE), warm.as_ref());

            // weakest first; equal |coef| eliminates the earlier column first
            let mut order: Vec<usize> = (0..alive.len()).collect();
            order.sort_by(|&a, &b| model.coef[a].abs().total_cmp(&model.coef[b].abs()));

            let drop_n = self.step.min(alive.len() - 1);
            let dropped: Vec<usize> = order[..drop_n].to_vec();
            for &k in &dropped {
                scores[alive[k]] = next_position as f64;
                next_position += 1;
            }

            let keep: Vec<usize> = (0..alive.len()).filter(|k| !dropped.contains(k)).collect();
            warm = Some(LogisticModel {
                coef: keep.iter().map(|&k| model.coef[k]).collect(),
                intercept: model.intercept,
                iterations: 0,
            });
            alive = keep.iter().map(|&k| alive[k]).collect();
            debug!(remaining = alive.len(), iterations = model.iterations, "Elimination round");
        }

        if let Some(&last) = alive.first() {
            scores[last] = next_position as f64;
        }
        Ok(scores)
    }
}
