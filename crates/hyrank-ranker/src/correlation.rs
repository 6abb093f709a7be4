//! Pearson correlation and collinear-pair detection.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use tracing::info;

use hyrank_common::{FeatureMatrix, TargetVector};

/// Two features whose |correlation| exceeds the pruning threshold.
/// `first` precedes `second` in matrix column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedPair {
    pub first: String,
    pub second: String,
    pub correlation: f64,
}

/// Pearson r. Zero-variance inputs give 0.0.
pub fn pearson(x: ArrayView1<'_, f64>, y: ArrayView1<'_, f64>) -> f64 {
    let n = x.len();
    if n == 0 || n != y.len() {
        return 0.0;
    }
    let mx = x.sum() / n as f64;
    let my = y.sum() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y.iter()) {
        let (dx, dy) = (a - mx, b - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Absolute correlation of every column with the 0/1 target, in column order.
pub fn target_correlations(matrix: &FeatureMatrix, target: &TargetVector) -> Vec<f64> {
    let y = ndarray::Array1::from(target.as_f64());
    (0..matrix.n_features())
        .map(|j| pearson(matrix.column(j), y.view()).abs())
        .collect()
}

/// All pairs with |r| strictly above `threshold`, in upper-triangle order:
/// (0,1), (0,2), ..., (1,2), ...
pub fn correlated_pairs(matrix: &FeatureMatrix, threshold: f64) -> Vec<CorrelatedPair> {
    let names = matrix.names();
    let f = matrix.n_features();
    let mut pairs = Vec::new();

    for i in 0..f {
        for j in (i + 1)..f {
            let r = pearson(matrix.column(i), matrix.column(j));
            if r.abs() > threshold {
                pairs.push(CorrelatedPair {
                    first: names[i].clone(),
                    second: names[j].clone(),
                    correlation: r,
                });
            }
        }
    }

    info!(features = f, threshold, pairs = pairs.len(), "Computed correlated pairs");
    pairs
}
