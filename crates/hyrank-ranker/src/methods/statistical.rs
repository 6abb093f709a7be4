//! Filter scorers that need no model fit: ANOVA F and raw variance.

use hyrank_common::{FeatureMatrix, HyrankError, MethodKind, Result, TargetVector};

use super::{require_both_classes, ImportanceScorer};

/// One-way ANOVA F statistic between the down and up groups.
pub struct FTestScorer;

/// F for one column. `None` when the column is constant.
pub(crate) fn f_statistic(values: &[f64], labels: &[u8]) -> Option<f64> {
    let first = *values.first()?;
    if values.iter().all(|&v| v == first) {
        return None;
    }

    let mut sum = [0.0f64; 2];
    let mut count = [0usize; 2];
    for (&v, &l) in values.iter().zip(labels) {
        let g = usize::from(l == 1);
        sum[g] += v;
        count[g] += 1;
    }
    let n = values.len() as f64;
    let grand = (sum[0] + sum[1]) / n;
    let mean = [sum[0] / count[0] as f64, sum[1] / count[1] as f64];

    let between: f64 = (0..2).map(|g| count[g] as f64 * (mean[g] - grand).powi(2)).sum();
    let within: f64 = values
        .iter()
        .zip(labels)
        .map(|(&v, &l)| (v - mean[usize::from(l == 1)]).powi(2))
        .sum();

    // two groups: df_between = 1, df_within = n - 2
    if within <= 0.0 {
        return Some(f64::INFINITY);
    }
    Some(between / (within / (n - 2.0)))
}

impl ImportanceScorer for FTestScorer {
    fn method(&self) -> MethodKind {
        MethodKind::FTest
    }

    fn score(&self, x: &FeatureMatrix, y: &TargetVector) -> Result<Vec<f64>> {
        require_both_classes(self.method(), y)?;
        if y.len() < 3 {
            return Err(HyrankError::degenerate(
                self.method(),
                format!("need at least 3 rows for the within-group variance, got {}", y.len()),
            ));
        }

        (0..x.n_features())
            .map(|j| {
                f_statistic(&x.column(j).to_vec(), y.labels()).ok_or_else(|| {
                    HyrankError::degenerate(
                        self.method(),
                        format!("feature '{}' is constant", x.names()[j]),
                    )
                })
            })
            .collect()
    }
}

/// Population variance of the raw feature. Ignores the target.
pub struct VarianceScorer;

impl ImportanceScorer for VarianceScorer {
    fn method(&self) -> MethodKind {
        MethodKind::Variance
    }

    fn score(&self, x: &FeatureMatrix, _y: &TargetVector) -> Result<Vec<f64>> {
        Ok((0..x.n_features()).map(|j| x.column(j).var(0.0)).collect())
    }
}
