//! Lasso scorer: |coefficient| of L1-penalised logistic regression on
//! standardised features.

use ndarray::Array1;

use hyrank_common::ranking_config::LogisticParams;
use hyrank_common::{FeatureMatrix, HyrankError, MethodKind, Result, TargetVector};

use super::logistic::{fit_logistic, Penalty};
use super::{require_both_classes, standardize, ImportanceScorer};

pub struct LassoScorer {
    alpha: f64,
    params: LogisticParams,
}

impl LassoScorer {
    pub fn new(alpha: f64, params: LogisticParams) -> Self {
        Self { alpha, params }
    }
}

impl ImportanceScorer for LassoScorer {
    fn method(&self) -> MethodKind {
        MethodKind::Lasso
    }

    fn score(&self, x: &FeatureMatrix, y: &TargetVector) -> Result<Vec<f64>> {
        require_both_classes(self.method(), y)?;
        let z = standardize(self.method(), x)?;
        let labels = Array1::from(y.as_f64());

        let model = fit_logistic(&z, &labels, &self.params, Penalty::lasso(self.alpha), None);
        if !model.intercept.is_finite() || model.coef.iter().any(|c| !c.is_finite()) {
            return Err(HyrankError::degenerate(self.method(), "coefficients diverged"));
        }
        Ok(model.coef.iter().map(|c| c.abs()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_column_is_degenerate() {
        let x = FeatureMatrix::from_columns(vec![
            ("a".into(), vec![1.0, 2.0, 3.0, 4.0]),
            ("flat".into(), vec![7.0; 4]),
        ])
        .unwrap();
        let y = TargetVector::new(vec![0, 0, 1, 1]).unwrap();
        let err = LassoScorer::new(0.01, LogisticParams::default()).score(&x, &y).unwrap_err();
        assert!(err.to_string().contains("flat"), "{err}");
    }

    #[test]
    fn test_informative_feature_has_largest_coefficient() {
        let labels: Vec<u8> = (0..40).map(|i| u8::from(i % 4 < 2)).collect();
        let x = FeatureMatrix::from_columns(vec![
            ("noise".into(), (0..40).map(|i| ((i * 7) % 10) as f64).collect()),
            ("signal".into(), labels.iter().map(|&l| l as f64 + 0.1 * (l as f64)).collect()),
        ])
        .unwrap();
        let y = TargetVector::new(labels).unwrap();
        let scores = LassoScorer::new(0.01, LogisticParams::default()).score(&x, &y).unwrap();
        assert!(scores[1] > scores[0]);
        assert!(scores.iter().all(|s| *s >= 0.0));
    }
}
