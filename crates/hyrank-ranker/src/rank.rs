//! Score-to-rank conversion.
//! Rank 1 = highest score; exact ties keep original column order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use hyrank_common::{HyrankError, MethodKind, Result};

/// One feature's raw score and derived rank under a single method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub feature: String,
    pub raw_score: f64,
    pub rank: usize,
}

/// All features scored by one method, kept in original column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodScoreTable {
    method: MethodKind,
    entries: Vec<FeatureScore>,
}

/// Ordinal ranks for `scores`: rank 1 to the largest, stable on ties.
/// Callers guarantee no NaN.
pub fn ordinal_ranks(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // sort_by is stable, so equal scores stay in column order
    order.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0usize; scores.len()];
    for (position, &idx) in order.iter().enumerate() {
        ranks[idx] = position + 1;
    }
    ranks
}

impl MethodScoreTable {
    /// Rank one method's scores. The score vector must cover `features`
    /// exactly and contain no NaN.
    pub fn from_scores(method: MethodKind, features: &[String], scores: &[f64]) -> Result<Self> {
        if scores.len() != features.len() {
            return Err(HyrankError::degenerate(
                method,
                format!("produced {} scores for {} features", scores.len(), features.len()),
            ));
        }
        if let Some(i) = scores.iter().position(|s| s.is_nan()) {
            return Err(HyrankError::degenerate(
                method,
                format!("score for '{}' is NaN", features[i]),
            ));
        }

        let ranks = ordinal_ranks(scores);
        let entries = features
            .iter()
            .zip(scores)
            .zip(ranks)
            .map(|((feature, &raw_score), rank)| FeatureScore {
                feature: feature.clone(),
                raw_score,
                rank,
            })
            .collect();

        Ok(Self { method, entries })
    }

    pub fn method(&self) -> MethodKind {
        self.method
    }

    /// Entries in original column order.
    pub fn entries(&self) -> &[FeatureScore] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureScore> {
        self.entries.iter().find(|e| e.feature == feature)
    }

    pub fn rank_of(&self, feature: &str) -> Option<usize> {
        self.get(feature).map(|e| e.rank)
    }

    /// Entries sorted best-first.
    pub fn ordered(&self) -> Vec<&FeatureScore> {
        let mut v: Vec<&FeatureScore> = self.entries.iter().collect();
        v.sort_by_key(|e| e.rank);
        v
    }

    /// Ranks form exactly {1, ..., F}.
    pub fn is_total(&self) -> bool {
        let mut seen = vec![false; self.entries.len()];
        for e in &self.entries {
            if e.rank == 0 || e.rank > seen.len() || seen[e.rank - 1] {
                return false;
            }
            seen[e.rank - 1] = true;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn test_highest_score_is_rank_one() {
        assert_eq!(ordinal_ranks(&[10.0, 30.0, 20.0]), vec![3, 1, 2]);
    }

    #[test]
    fn test_ties_follow_column_order() {
        // f1 and f3 tie; f1 is earlier so it ranks first
        assert_eq!(ordinal_ranks(&[0.1, 0.5, 0.2, 0.5]), vec![4, 1, 3, 2]);
        assert_eq!(ordinal_ranks(&[0.0, 0.0, 0.0]), vec![1, 2, 3]);
    }

    #[test]
    fn test_signed_zero_ties() {
        assert_eq!(ordinal_ranks(&[-0.0, 0.0]), vec![1, 2]);
    }

    #[test]
    fn test_infinity_orders_first() {
        assert_eq!(ordinal_ranks(&[1.0, f64::INFINITY, f64::NEG_INFINITY]), vec![2, 1, 3]);
    }

    #[test]
    fn test_rank_totality() {
        let scores = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0];
        let table = MethodScoreTable::from_scores(MethodKind::FTest, &names(10), &scores).unwrap();
        assert!(table.is_total());
        let mut ranks: Vec<usize> = table.entries().iter().map(|e| e.rank).collect();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_nan_is_degenerate() {
        let err = MethodScoreTable::from_scores(MethodKind::Lasso, &names(2), &[1.0, f64::NAN])
            .unwrap_err();
        assert!(matches!(err, HyrankError::DegenerateMethod { method: MethodKind::Lasso, .. }));
    }

    #[test]
    fn test_length_mismatch_is_degenerate() {
        assert!(MethodScoreTable::from_scores(MethodKind::Variance, &names(3), &[1.0]).is_err());
    }

    #[test]
    fn test_ordered_and_lookup() {
        let table = MethodScoreTable::from_scores(MethodKind::Variance, &names(3), &[0.2, 0.9, 0.5])
            .unwrap();
        let best: Vec<&str> = table.ordered().iter().map(|e| e.feature.as_str()).collect();
        assert_eq!(best, vec!["f1", "f2", "f0"]);
        assert_eq!(table.rank_of("f0"), Some(3));
        assert_eq!(table.rank_of("zz"), None);
    }
}
