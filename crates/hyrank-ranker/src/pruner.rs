//! Greedy collinearity pruning over an ordered candidate list.
//!
//! Pairs are visited in the order given. When both members are still
//! candidates, the one with the worse (larger) composite rank is removed and
//! stays removed. The result depends on pair order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::correlation::CorrelatedPair;

/// What happened to one correlated pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PairDecision {
    /// Both members were present; one was dropped.
    Resolved { kept: String, removed: String },
    /// At most one member is still a candidate (or one lies outside the
    /// candidate list); nothing to do.
    NoConflict,
    /// Both members were already gone.
    NeitherPresent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairAudit {
    pub first: String,
    pub second: String,
    pub correlation: f64,
    #[serde(flatten)]
    pub decision: PairDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneOutcome {
    /// Surviving candidates, in the input order
    pub retained: Vec<String>,
    /// Removed candidates, in removal order
    pub removed: Vec<String>,
    pub audit: Vec<PairAudit>,
}

#[derive(Clone, Copy, PartialEq)]
enum Status {
    Present,
    Removed,
}

/// Prune `candidates` (name, composite rank), ordered best-first.
///
/// On equal composite ranks the member earlier in the candidate list is
/// kept. Features outside the candidate list are never considered.
pub fn prune(candidates: &[(String, f64)], pairs: &[CorrelatedPair]) -> PruneOutcome {
    // name → (position, composite, status)
    let mut state: HashMap<&str, (usize, f64, Status)> = candidates
        .iter()
        .enumerate()
        .map(|(i, (name, rank))| (name.as_str(), (i, *rank, Status::Present)))
        .collect();

    let mut removed = Vec::new();
    let mut audit = Vec::with_capacity(pairs.len());

    for pair in pairs {
        let a = state.get(pair.first.as_str()).copied();
        let b = state.get(pair.second.as_str()).copied();

        let decision = match (a, b) {
            (Some((pa, ra, Status::Present)), Some((pb, rb, Status::Present))) => {
                let a_wins = ra < rb || (ra == rb && pa < pb);
                let (kept, loser) = if a_wins {
                    (&pair.first, &pair.second)
                } else {
                    (&pair.second, &pair.first)
                };
                if let Some(entry) = state.get_mut(loser.as_str()) {
                    entry.2 = Status::Removed;
                }
                removed.push(loser.clone());
                debug!(
                    kept = kept.as_str(),
                    removed = loser.as_str(),
                    correlation = pair.correlation,
                    "Pruned collinear feature"
                );
                PairDecision::Resolved { kept: kept.clone(), removed: loser.clone() }
            }
            (Some((_, _, Status::Removed)), Some((_, _, Status::Removed))) => {
                PairDecision::NeitherPresent
            }
            _ => PairDecision::NoConflict,
        };

        audit.push(PairAudit {
            first: pair.first.clone(),
            second: pair.second.clone(),
            correlation: pair.correlation,
            decision,
        });
    }

    let retained: Vec<String> = candidates
        .iter()
        .filter(|(name, _)| matches!(state.get(name.as_str()), Some((_, _, Status::Present))))
        .map(|(name, _)| name.clone())
        .collect();

    info!(
        candidates = candidates.len(),
        pairs = pairs.len(),
        removed = removed.len(),
        retained = retained.len(),
        "Collinearity pruning complete"
    );

    PruneOutcome { retained, removed, audit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pair(a: &str, b: &str) -> CorrelatedPair {
        CorrelatedPair { first: a.into(), second: b.into(), correlation: 0.9 }
    }

    fn cands(c: &[(&str, f64)]) -> Vec<(String, f64)> {
        let mut v: Vec<(String, f64)> = c.iter().map(|(n, r)| (n.to_string(), *r)).collect();
        v.sort_by(|x, y| x.1.total_cmp(&y.1));
        v
    }

    #[test]
    fn test_chain_collapses_to_best() {
        // A(3), B(1), C(5); (A,B) drops A, (B,C) drops C
        let c = cands(&[("A", 3.0), ("B", 1.0), ("C", 5.0)]);
        let out = prune(&c, &[pair("A", "B"), pair("B", "C")]);
        assert_eq!(out.retained, vec!["B".to_string()]);
        assert_eq!(out.removed, vec!["A".to_string(), "C".to_string()]);
    }

    #[test]
    fn test_pair_order_changes_outcome() {
        // A(1), B(2), C(3). (A,B) then (B,C): B dropped first, so (B,C)
        // is no conflict and C survives.
        let c = cands(&[("A", 1.0), ("B", 2.0), ("C", 3.0)]);
        let forward = prune(&c, &[pair("A", "B"), pair("B", "C")]);
        assert_eq!(forward.retained, vec!["A".to_string(), "C".to_string()]);
        assert_eq!(forward.audit[1].decision, PairDecision::NoConflict);

        // (B,C) then (A,B): C dropped, then B dropped → only A
        let reverse = prune(&c, &[pair("B", "C"), pair("A", "B")]);
        assert_eq!(reverse.retained, vec!["A".to_string()]);
    }

    #[test]
    fn test_pruning_is_idempotent() {
        let c = cands(&[("A", 3.0), ("B", 1.0), ("C", 5.0), ("D", 2.0)]);
        let pairs = vec![pair("A", "B"), pair("B", "C"), pair("C", "D"), pair("A", "D")];
        let once = prune(&c, &pairs);

        let survivors: Vec<(String, f64)> = c
            .iter()
            .filter(|(n, _)| once.retained.contains(n))
            .cloned()
            .collect();
        let twice = prune(&survivors, &pairs);
        assert_eq!(twice.retained, once.retained);
        assert!(twice.removed.is_empty());
    }

    #[test]
    fn test_neither_present_and_outside_candidates() {
        let c = cands(&[("A", 1.0), ("B", 2.0), ("C", 3.0)]);
        let out = prune(
            &c,
            &[pair("A", "B"), pair("A", "C"), pair("B", "C"), pair("C", "Z")],
        );
        assert_eq!(out.retained, vec!["A".to_string()]);
        assert_eq!(out.audit[2].decision, PairDecision::NeitherPresent);
        // Z is not a candidate
        assert_eq!(out.audit[3].decision, PairDecision::NoConflict);
    }

    #[test]
    fn test_equal_ranks_keep_earlier_candidate() {
        let c = vec![("X".to_string(), 2.0), ("Y".to_string(), 2.0)];
        let out = prune(&c, &[pair("Y", "X")]);
        assert_eq!(
            out.audit[0].decision,
            PairDecision::Resolved { kept: "X".into(), removed: "Y".into() }
        );
    }

    #[test]
    fn test_audit_serialises_with_decision_tag() {
        let c = cands(&[("A", 1.0), ("B", 2.0)]);
        let out = prune(&c, &[pair("A", "B")]);
        let json = serde_json::to_value(&out.audit[0]).unwrap();
        assert_eq!(json["decision"], "resolved");
        assert_eq!(json["removed"], "B");
    }
}
