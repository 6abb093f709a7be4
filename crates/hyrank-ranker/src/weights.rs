//! Composite weighting schemes.
//!
//! A scheme is a named set of (method, weight) pairs summing to 1.0.
//! The composite rank of a feature is Σ weight(m) × rank_m(f); lower is better.

use serde::{Deserialize, Serialize};

use hyrank_common::ranking_config::{CompositeSpec, WEIGHT_SUM_TOLERANCE, REFERENCE_COMPOSITE};
use hyrank_common::{HyrankError, MethodKind, MethodWeights, Result};

/// A validated composite. Components are held in canonical method order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScheme {
    name: String,
    components: Vec<(MethodKind, f64)>,
}

impl CompositeScheme {
    /// Build a scheme, rejecting empty, duplicated, negative or
    /// non-normalised weightings.
    pub fn new(name: impl Into<String>, mut components: Vec<(MethodKind, f64)>) -> Result<Self> {
        let name = name.into();
        if components.is_empty() {
            return Err(HyrankError::Config(format!("composite '{name}' has no methods")));
        }

        components.sort_by_key(|(m, _)| *m);
        if let Some(w) = components.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(HyrankError::Config(format!(
                "composite '{name}' weights {} twice",
                w[0].0
            )));
        }
        for (m, w) in &components {
            if !(*w >= 0.0 && w.is_finite()) {
                return Err(HyrankError::Config(format!(
                    "composite '{name}' gives {m} weight {w}"
                )));
            }
        }

        let sum: f64 = components.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(HyrankError::Config(format!(
                "composite '{name}' weights sum to {sum}, expected 1.0"
            )));
        }

        Ok(Self { name, components })
    }

    /// Unweighted mean over a subset of methods.
    pub fn mean_of(name: impl Into<String>, methods: &[MethodKind]) -> Result<Self> {
        let w = 1.0 / methods.len().max(1) as f64;
        Self::new(name, methods.iter().map(|m| (*m, w)).collect())
    }

    pub fn from_spec(spec: &CompositeSpec) -> Result<Self> {
        Self::new(spec.name.clone(), spec.resolve()?)
    }

    /// The reference scheme built from the per-method weight vector.
    /// Zero-weight methods are left out.
    pub fn reference(weights: &MethodWeights) -> Result<Self> {
        weights.validate()?;
        let components = MethodKind::ALL
            .iter()
            .map(|m| (*m, weights.get(*m)))
            .filter(|(_, w)| *w > 0.0)
            .collect();
        Self::new(REFERENCE_COMPOSITE, components)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[(MethodKind, f64)] {
        &self.components
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodKind> + '_ {
        self.components.iter().map(|(m, _)| *m)
    }

    pub fn weight(&self, method: MethodKind) -> f64 {
        self.components
            .iter()
            .find(|(m, _)| *m == method)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }

    /// Σ weight × rank. Components are folded in canonical order so the
    /// result is bit-identical across runs. `None` if a component's rank is
    /// missing.
    pub fn combine<F>(&self, mut rank_of: F) -> Option<f64>
    where
        F: FnMut(MethodKind) -> Option<usize>,
    {
        let mut total = 0.0;
        for (m, w) in &self.components {
            total += w * rank_of(*m)? as f64;
        }
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_matches_default_weights() {
        let scheme = CompositeScheme::reference(&MethodWeights::default()).unwrap();
        assert_eq!(scheme.name(), "weighted_rank");
        assert_eq!(scheme.components().len(), 8);
        assert!((scheme.weight(MethodKind::Xgboost) - 0.40).abs() < 1e-12);
        assert!((scheme.weight(MethodKind::Variance) - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let off = CompositeScheme::new("off", vec![(MethodKind::Xgboost, 0.6), (MethodKind::Lasso, 0.3)]);
        assert!(matches!(off, Err(HyrankError::Config(_))));

        // within tolerance
        let ok = CompositeScheme::new(
            "ok",
            vec![(MethodKind::Xgboost, 0.7), (MethodKind::Lasso, 0.3 + 1e-12)],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_rejects_duplicates_negatives_and_empty() {
        assert!(CompositeScheme::new("e", vec![]).is_err());
        assert!(CompositeScheme::new(
            "d",
            vec![(MethodKind::Rfe, 0.5), (MethodKind::Rfe, 0.5)]
        )
        .is_err());
        assert!(CompositeScheme::new(
            "n",
            vec![(MethodKind::Rfe, 1.5), (MethodKind::Lasso, -0.5)]
        )
        .is_err());
    }

    #[test]
    fn test_zero_weight_methods_left_out_of_reference() {
        let mut w = MethodWeights::default();
        w.xgboost += w.variance;
        w.variance = 0.0;
        let scheme = CompositeScheme::reference(&w).unwrap();
        assert!(scheme.methods().all(|m| m != MethodKind::Variance));
    }

    #[test]
    fn test_combine_is_weighted_sum() {
        let scheme = CompositeScheme::new(
            "s",
            vec![(MethodKind::Variance, 0.25), (MethodKind::Xgboost, 0.75)],
        )
        .unwrap();
        let v = scheme
            .combine(|m| match m {
                MethodKind::Xgboost => Some(2),
                MethodKind::Variance => Some(6),
                _ => None,
            })
            .unwrap();
        assert_eq!(v, 0.75 * 2.0 + 0.25 * 6.0);
        assert_eq!(scheme.combine(|_| None), None);
    }

    #[test]
    fn test_mean_of_subset() {
        let s = CompositeScheme::mean_of("m", &[MethodKind::FTest, MethodKind::Rfe]).unwrap();
        assert_eq!(s.combine(|_| Some(4)), Some(4.0));
        // canonical order regardless of input order
        assert_eq!(s.components()[0].0, MethodKind::Rfe);
    }
}
