//! Run report and on-disk outputs.
//!
//! | File                    | Contents                                          |
//! |-------------------------|---------------------------------------------------|
//! | `consensus_ranking.csv` | one row per feature, sorted by primary composite  |
//! | `final_features.txt`    | selected feature names, one per line              |
//! | `ranking_report.json`   | the full [`RankingReport`]                        |

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use hyrank_common::{MethodKind, RankingConfig, Result};

use crate::consensus::ConsensusRecord;
use crate::correlation::CorrelatedPair;
use crate::pipeline::{MethodTiming, RankingOutcome};
use crate::pruner::PairAudit;

pub const CONSENSUS_CSV: &str = "consensus_ranking.csv";
pub const FINAL_FEATURES_TXT: &str = "final_features.txt";
pub const REPORT_JSON: &str = "ranking_report.json";

/// Selection settings echoed into the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub top_k: usize,
    pub correlation_threshold: f64,
    pub candidate_pool: Option<usize>,
    pub primary_composite: String,
    pub horizon: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub selection: SelectionSummary,
    pub methods: Vec<MethodKind>,
    pub composites: Vec<String>,
    pub timings: Vec<MethodTiming>,
    /// Sorted by the primary composite
    pub features: Vec<ConsensusRecord>,
    pub correlated_pairs: Vec<CorrelatedPair>,
    pub pair_audit: Vec<PairAudit>,
    pub removed: Vec<String>,
    pub final_features: Vec<String>,
}

/// Paths written by [`write_outputs`].
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub consensus_csv: PathBuf,
    pub final_features: PathBuf,
    pub report_json: Option<PathBuf>,
}

impl RankingReport {
    pub fn new(outcome: &RankingOutcome, config: &RankingConfig, rows: usize) -> Result<Self> {
        let features = outcome
            .consensus
            .ordered_by(&outcome.primary)?
            .into_iter()
            .cloned()
            .collect();

        Ok(Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            rows,
            selection: SelectionSummary {
                top_k: config.selection.top_k,
                correlation_threshold: config.selection.correlation_threshold,
                candidate_pool: config.selection.candidate_pool,
                primary_composite: outcome.primary.clone(),
                horizon: config.target.horizon,
            },
            methods: outcome.consensus.methods().to_vec(),
            composites: outcome.consensus.schemes().iter().map(|s| s.name().to_string()).collect(),
            timings: outcome.timings.clone(),
            features,
            correlated_pairs: outcome.pairs.clone(),
            pair_audit: outcome.pruning.audit.clone(),
            removed: outcome.pruning.removed.clone(),
            final_features: outcome.final_features.clone(),
        })
    }

    /// CSV header: feature, `<method>_score`/`<method>_rank` per method, one
    /// column per composite, then dispersion, quality and target correlation.
    fn csv_header(&self) -> Vec<String> {
        let mut header = vec!["feature".to_string()];
        for m in &self.methods {
            header.push(format!("{m}_score"));
            header.push(format!("{m}_rank"));
        }
        header.extend(self.composites.iter().cloned());
        header.extend(
            ["rank_dispersion", "consensus_quality", "target_correlation"]
                .iter()
                .map(|s| s.to_string()),
        );
        header
    }

    fn csv_row(&self, record: &ConsensusRecord) -> Vec<String> {
        let mut row = vec![record.feature.clone()];
        for m in &self.methods {
            match record.methods.iter().find(|e| e.method == *m) {
                Some(e) => {
                    row.push(e.raw_score.to_string());
                    row.push(e.rank.to_string());
                }
                None => row.extend([String::new(), String::new()]),
            }
        }
        for c in &self.composites {
            row.push(record.composite(c).map(|v| v.to_string()).unwrap_or_default());
        }
        row.push(record.dispersion.to_string());
        row.push(record.quality.to_string());
        row.push(record.target_correlation.to_string());
        row
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.csv_header())?;
        for record in &self.features {
            writer.write_record(self.csv_row(record))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Write the three output files into `dir`, creating it if needed.
pub fn write_outputs(report: &RankingReport, dir: &Path, write_json: bool) -> Result<OutputPaths> {
    fs::create_dir_all(dir)?;

    let consensus_csv = dir.join(CONSENSUS_CSV);
    report.write_csv(&consensus_csv)?;

    let final_features = dir.join(FINAL_FEATURES_TXT);
    let mut listing = report.final_features.join("\n");
    listing.push('\n');
    fs::write(&final_features, listing)?;

    let report_json = if write_json {
        let path = dir.join(REPORT_JSON);
        fs::write(&path, serde_json::to_string_pretty(report)?)?;
        Some(path)
    } else {
        None
    };

    info!(
        dir = %dir.display(),
        run_id = %report.run_id,
        features = report.features.len(),
        selected = report.final_features.len(),
        "Wrote ranking outputs"
    );
    Ok(OutputPaths { consensus_csv, final_features, report_json })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::{ImportanceScorer, PrecomputedScorer};
    use crate::pipeline::ConsensusRanker;
    use hyrank_common::{FeatureMatrix, TargetVector};

    fn outcome() -> (RankingOutcome, RankingConfig) {
        let x = FeatureMatrix::from_columns(vec![
            ("x1".into(), vec![1.0, 3.0, 2.0, 5.0]),
            ("x2".into(), vec![4.0, 1.0, 3.0, 2.0]),
        ])
        .unwrap();
        let y = TargetVector::new(vec![0, 1, 0, 1]).unwrap();
        let scorers: Vec<Box<dyn ImportanceScorer>> = MethodKind::ALL
            .iter()
            .map(|&m| {
                Box::new(PrecomputedScorer::new(m).with("x1", 1.0).with("x2", 2.0))
                    as Box<dyn ImportanceScorer>
            })
            .collect();
        let mut config = RankingConfig::default();
        config.selection.top_k = 1;
        let out = ConsensusRanker::with_scorers(config.clone(), scorers).unwrap().run(&x, &y).unwrap();
        (out, config)
    }

    #[test]
    fn test_report_orders_by_primary() {
        let (out, config) = outcome();
        let report = RankingReport::new(&out, &config, 4).unwrap();
        assert_eq!(report.features[0].feature, "x2");
        assert_eq!(report.final_features, vec!["x2".to_string()]);
        assert_eq!(report.composites[0], "weighted_rank");
    }

    #[test]
    fn test_csv_header_shape() {
        let (out, config) = outcome();
        let report = RankingReport::new(&out, &config, 4).unwrap();
        let header = report.csv_header();
        assert_eq!(header[0], "feature");
        assert_eq!(header[1], "xgboost_score");
        assert_eq!(header[2], "xgboost_rank");
        assert_eq!(header.len(), 1 + 2 * 8 + report.composites.len() + 3);
        assert_eq!(report.csv_row(&report.features[0]).len(), header.len());
    }

    #[test]
    fn test_write_outputs() {
        let (out, config) = outcome();
        let report = RankingReport::new(&out, &config, 4).unwrap();
        let dir = std::env::temp_dir().join(format!("hyrank-report-{}", report.run_id));
        let paths = write_outputs(&report, &dir, true).unwrap();

        let listing = fs::read_to_string(&paths.final_features).unwrap();
        assert_eq!(listing, "x2\n");
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(paths.report_json.unwrap()).unwrap()).unwrap();
        assert_eq!(json["final_features"][0], "x2");
        let csv = fs::read_to_string(&paths.consensus_csv).unwrap();
        assert_eq!(csv.lines().count(), 3);

        fs::remove_dir_all(&dir).unwrap();
    }
}
