//! End-to-end ranking run: score, rank, combine, prune, truncate.

use std::collections::HashSet;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hyrank_common::entities::ensure_aligned;
use hyrank_common::{FeatureMatrix, HyrankError, MethodKind, RankingConfig, Result, TargetVector};

use crate::consensus::ConsensusTable;
use crate::correlation::{correlated_pairs, target_correlations, CorrelatedPair};
use crate::methods::{default_scorers, score_table, ImportanceScorer};
use crate::pruner::{prune, PruneOutcome};
use crate::rank::MethodScoreTable;
use crate::weights::CompositeScheme;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodTiming {
    pub method: MethodKind,
    pub elapsed_ms: u128,
}

/// Everything one run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingOutcome {
    pub consensus: ConsensusTable,
    /// Composite that ordered the candidates
    pub primary: String,
    /// (feature, primary composite) in pruning order
    pub candidates: Vec<(String, f64)>,
    pub pairs: Vec<CorrelatedPair>,
    pub pruning: PruneOutcome,
    /// Pruned list truncated to `top_k`
    pub final_features: Vec<String>,
    pub timings: Vec<MethodTiming>,
}

pub struct ConsensusRanker {
    config: RankingConfig,
    scorers: Vec<Box<dyn ImportanceScorer>>,
}

impl ConsensusRanker {
    /// Ranker with the eight built-in scorers. Rejects invalid configuration
    /// before anything is scored.
    pub fn new(config: RankingConfig) -> Result<Self> {
        let scorers = default_scorers(&config.methods);
        Self::with_scorers(config, scorers)
    }

    /// Ranker with a caller-supplied scorer set (one scorer per method).
    pub fn with_scorers(config: RankingConfig, scorers: Vec<Box<dyn ImportanceScorer>>) -> Result<Self> {
        config.validate()?;
        if scorers.is_empty() {
            return Err(HyrankError::Config("no scorers configured".into()));
        }
        let mut seen = HashSet::new();
        for s in &scorers {
            if !seen.insert(s.method()) {
                return Err(HyrankError::Config(format!("scorer for {} supplied twice", s.method())));
            }
        }
        Ok(Self { config, scorers })
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    pub fn run(&self, x: &FeatureMatrix, y: &TargetVector) -> Result<RankingOutcome> {
        ensure_aligned(x, y)?;
        let selection = &self.config.selection;
        if selection.top_k > x.n_features() {
            return Err(HyrankError::Config(format!(
                "top_k ({}) exceeds the {} available features",
                selection.top_k,
                x.n_features()
            )));
        }

        let schemes = self
            .config
            .composite_specs()
            .iter()
            .map(CompositeScheme::from_spec)
            .collect::<Result<Vec<_>>>()?;

        info!(
            rows = x.n_rows(),
            features = x.n_features(),
            methods = self.scorers.len(),
            parallel = self.config.execution.parallel_scorers,
            "Starting consensus ranking"
        );
        let (tables, timings) = self.score_all(x, y)?;

        let correlations = target_correlations(x, y);
        let consensus = ConsensusTable::build(tables, &schemes, &self.config.consensus, &correlations)?;

        let primary = selection.primary_composite.clone();
        let pool = selection.candidate_pool.unwrap_or(x.n_features());
        let candidates: Vec<(String, f64)> = consensus
            .ordered_by(&primary)?
            .into_iter()
            .take(pool)
            .map(|r| (r.feature.clone(), r.composites[&primary]))
            .collect();

        let pairs = correlated_pairs(x, selection.correlation_threshold);
        let pruning = prune(&candidates, &pairs);
        let final_features: Vec<String> =
            pruning.retained.iter().take(selection.top_k).cloned().collect();

        if final_features.len() < selection.top_k {
            warn!(
                requested = selection.top_k,
                available = final_features.len(),
                "Fewer features survive pruning than requested"
            );
        }
        info!(
            candidates = candidates.len(),
            removed = pruning.removed.len(),
            selected = final_features.len(),
            primary = primary.as_str(),
            "Consensus ranking complete"
        );

        Ok(RankingOutcome {
            consensus,
            primary,
            candidates,
            pairs,
            pruning,
            final_features,
            timings,
        })
    }

    /// Run every scorer. Results come back in scorer order whether or not
    /// they ran concurrently; the first failure aborts the run.
    fn score_all(
        &self,
        x: &FeatureMatrix,
        y: &TargetVector,
    ) -> Result<(Vec<MethodScoreTable>, Vec<MethodTiming>)> {
        let run_one = |scorer: &Box<dyn ImportanceScorer>| -> Result<(MethodScoreTable, MethodTiming)> {
            let started = Instant::now();
            let table = score_table(scorer.as_ref(), x, y)?;
            let elapsed_ms = started.elapsed().as_millis();
            info!(method = scorer.method().as_str(), features = table.len(), elapsed_ms, "Scored");
            Ok((table, MethodTiming { method: scorer.method(), elapsed_ms }))
        };

        let results: Vec<Result<(MethodScoreTable, MethodTiming)>> = if self.config.execution.parallel_scorers {
            self.scorers.par_iter().map(run_one).collect()
        } else {
            self.scorers.iter().map(run_one).collect()
        };

        let mut tables = Vec::with_capacity(results.len());
        let mut timings = Vec::with_capacity(results.len());
        for r in results {
            let (t, timing) = r?;
            tables.push(t);
            timings.push(timing);
        }
        Ok((tables, timings))
    }
}
