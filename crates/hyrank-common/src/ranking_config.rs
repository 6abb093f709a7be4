//! Ranking run configuration.
//!
//! Every knob the ranker reads lives here and travels as an explicit value.
//! Every field has a serde default, so a partial YAML/TOML/JSON file is valid.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::consensus::ConsensusThresholds;
use crate::error::{HyrankError, Result};
use crate::method::MethodKind;

/// Tolerance for "weights sum to 1.0".
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Name of the composite built from [`MethodWeights`].
pub const REFERENCE_COMPOSITE: &str = "weighted_rank";

/// Complete configuration for one ranking run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Where the direction label comes from
    #[serde(default)]
    pub target: TargetSpec,

    /// Input panel handling
    #[serde(default)]
    pub data: DataConfig,

    /// Shortlist size and collinearity pruning
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Reference per-method weights (the `weighted_rank` composite)
    #[serde(default)]
    pub weights: MethodWeights,

    /// Additional named composite ranks
    #[serde(default = "default_composites")]
    pub composites: Vec<CompositeSpec>,

    /// Dispersion thresholds for consensus-quality labels
    #[serde(default)]
    pub consensus: ConsensusThresholds,

    /// Scorer hyperparameters and seeds
    #[serde(default)]
    pub methods: MethodParams,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            target: TargetSpec::default(),
            data: DataConfig::default(),
            selection: SelectionConfig::default(),
            weights: MethodWeights::default(),
            composites: default_composites(),
            consensus: ConsensusThresholds::default(),
            methods: MethodParams::default(),
            output: OutputConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

// ── Target Specification ─────────────────────────────────────────────────────

/// Where the binary direction target comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Precomputed 0/1 target column (used when `reference_column` is unset)
    #[serde(default = "default_target_column")]
    pub column: String,

    /// Reference return column to derive the target from, e.g. the HY ETF return
    #[serde(default)]
    pub reference_column: Option<String>,

    /// Periods ahead the target looks (h >= 1)
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Keep the reference column as a feature (its value at t is known at t)
    #[serde(default = "default_true")]
    pub keep_reference_as_feature: bool,
}

fn default_target_column() -> String { "target".to_string() }
fn default_horizon() -> usize { 1 }
fn default_true() -> bool { true }

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            column: default_target_column(),
            reference_column: None,
            horizon: default_horizon(),
            keep_reference_as_feature: true,
        }
    }
}

// ── Data ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Name of the row-label column (first column when absent from the header)
    #[serde(default = "default_date_column")]
    pub date_column: String,

    /// Date format for the row-label column
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Columns that are zero-filled (with a warning) when absent from the panel.
    /// A filled column is constant, so `f_test`, `rfe` and `lasso` reject it;
    /// with the built-in scorers it must also be listed in `exclude_columns`.
    #[serde(default)]
    pub optional_columns: Vec<String>,

    /// Regex patterns; matching columns never become features
    #[serde(default)]
    pub exclude_columns: Vec<String>,
}

fn default_date_column() -> String { "date".to_string() }
fn default_date_format() -> String { "%Y-%m-%d".to_string() }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            date_column: default_date_column(),
            date_format: default_date_format(),
            optional_columns: vec![],
            exclude_columns: vec![],
        }
    }
}

// ── Selection ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Number of final features to retain (K)
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// |corr| strictly above this flags a pair as collinear
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,

    /// Restrict pruning candidates to the top-N by primary composite
    #[serde(default)]
    pub candidate_pool: Option<usize>,

    /// Composite rank that orders the candidate list
    #[serde(default = "default_primary_composite")]
    pub primary_composite: String,
}

fn default_top_k() -> usize { 20 }
fn default_correlation_threshold() -> f64 { 0.85 }
fn default_primary_composite() -> String { REFERENCE_COMPOSITE.to_string() }

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            correlation_threshold: default_correlation_threshold(),
            candidate_pool: None,
            primary_composite: default_primary_composite(),
        }
    }
}

// ── Method weights ───────────────────────────────────────────────────────────

/// The 8-component weight vector. Weights sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodWeights {
    #[serde(default = "w_xgboost")]
    pub xgboost: f64,
    #[serde(default = "w_random_forest")]
    pub random_forest: f64,
    #[serde(default = "w_permutation")]
    pub permutation: f64,
    #[serde(default = "w_rfe")]
    pub rfe: f64,
    #[serde(default = "w_f_test")]
    pub f_test: f64,
    #[serde(default = "w_mutual_info")]
    pub mutual_info: f64,
    #[serde(default = "w_lasso")]
    pub lasso: f64,
    #[serde(default = "w_variance")]
    pub variance: f64,
}

fn w_xgboost() -> f64 { 0.40 }
fn w_random_forest() -> f64 { 0.25 }
fn w_permutation() -> f64 { 0.08 }
fn w_rfe() -> f64 { 0.07 }
fn w_f_test() -> f64 { 0.08 }
fn w_mutual_info() -> f64 { 0.07 }
fn w_lasso() -> f64 { 0.03 }
fn w_variance() -> f64 { 0.02 }

impl Default for MethodWeights {
    /// Reference weights, chosen empirically.
    fn default() -> Self {
        Self {
            xgboost:       w_xgboost(),
            random_forest: w_random_forest(),
            permutation:   w_permutation(),
            rfe:           w_rfe(),
            f_test:        w_f_test(),
            mutual_info:   w_mutual_info(),
            lasso:         w_lasso(),
            variance:      w_variance(),
        }
    }
}

impl MethodWeights {
    pub fn get(&self, method: MethodKind) -> f64 {
        match method {
            MethodKind::Xgboost      => self.xgboost,
            MethodKind::RandomForest => self.random_forest,
            MethodKind::Permutation  => self.permutation,
            MethodKind::Rfe          => self.rfe,
            MethodKind::FTest        => self.f_test,
            MethodKind::MutualInfo   => self.mutual_info,
            MethodKind::Lasso        => self.lasso,
            MethodKind::Variance     => self.variance,
        }
    }

    /// Weights in canonical method order.
    pub fn as_array(&self) -> [f64; 8] {
        MethodKind::ALL.map(|m| self.get(m))
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Reject negative weights and sums away from 1.0.
    pub fn validate(&self) -> Result<()> {
        for m in MethodKind::ALL {
            let w = self.get(m);
            if !(w >= 0.0 && w.is_finite()) {
                return Err(HyrankError::Config(format!("weight for {m} is {w}")));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(HyrankError::Config(format!(
                "method weights sum to {sum}, expected 1.0"
            )));
        }
        Ok(())
    }

    /// Renormalise weights so they sum to 1.0
    pub fn normalise(&mut self) {
        let sum = self.sum();
        if sum > 0.0 {
            self.xgboost       /= sum;
            self.random_forest /= sum;
            self.permutation   /= sum;
            self.rfe           /= sum;
            self.f_test        /= sum;
            self.mutual_info   /= sum;
            self.lasso         /= sum;
            self.variance      /= sum;
        }
    }

    /// Non-zero entries as a composite specification.
    pub fn to_spec(&self, name: &str) -> CompositeSpec {
        CompositeSpec {
            name: name.to_string(),
            methods: vec![],
            weights: MethodKind::ALL
                .iter()
                .filter(|m| self.get(**m) > 0.0)
                .map(|m| (m.as_str().to_string(), self.get(*m)))
                .collect(),
        }
    }
}

// ── Composite specifications ─────────────────────────────────────────────────

/// A named composite rank over a subset of methods.
///
/// Either list `methods` (unweighted mean) or give explicit `weights`
/// keyed by method id; not both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositeSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodKind>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub weights: BTreeMap<String, f64>,
}

impl CompositeSpec {
    pub fn mean_of(name: &str, methods: &[MethodKind]) -> Self {
        Self { name: name.to_string(), methods: methods.to_vec(), weights: BTreeMap::new() }
    }

    pub fn weighted(name: &str, weights: &[(MethodKind, f64)]) -> Self {
        Self {
            name: name.to_string(),
            methods: vec![],
            weights: weights.iter().map(|(m, w)| (m.as_str().to_string(), *w)).collect(),
        }
    }

    /// Resolve to (method, weight) pairs in canonical method order.
    /// Sum-to-one is checked by the caller that builds the composite.
    pub fn resolve(&self) -> Result<Vec<(MethodKind, f64)>> {
        if self.name.trim().is_empty() {
            return Err(HyrankError::Config("composite with empty name".into()));
        }
        let mut pairs: Vec<(MethodKind, f64)> = match (self.methods.is_empty(), self.weights.is_empty()) {
            (false, true) => {
                let mut seen = HashSet::new();
                for m in &self.methods {
                    if !seen.insert(*m) {
                        return Err(HyrankError::Config(format!(
                            "composite '{}' lists {m} twice",
                            self.name
                        )));
                    }
                }
                let w = 1.0 / self.methods.len() as f64;
                self.methods.iter().map(|m| (*m, w)).collect()
            }
            (true, false) => self
                .weights
                .iter()
                .map(|(k, w)| {
                    k.parse::<MethodKind>()
                        .map(|m| (m, *w))
                        .map_err(|e| HyrankError::Config(format!("composite '{}': {e}", self.name)))
                })
                .collect::<Result<Vec<_>>>()?,
            (true, true) => {
                return Err(HyrankError::Config(format!(
                    "composite '{}' names no methods",
                    self.name
                )))
            }
            (false, false) => {
                return Err(HyrankError::Config(format!(
                    "composite '{}' sets both `methods` and `weights`",
                    self.name
                )))
            }
        };
        pairs.sort_by_key(|(m, _)| *m);
        Ok(pairs)
    }
}

/// Presets registered alongside the reference weights.
fn default_composites() -> Vec<CompositeSpec> {
    vec![
        CompositeSpec::mean_of(
            "core_mean_rank",
            &[
                MethodKind::RandomForest,
                MethodKind::Rfe,
                MethodKind::FTest,
                MethodKind::MutualInfo,
                MethodKind::Permutation,
            ],
        ),
        CompositeSpec::weighted(
            "legacy_split",
            &[
                (MethodKind::Xgboost, 0.40),
                (MethodKind::RandomForest, 0.25),
                (MethodKind::Permutation, 0.15),
                (MethodKind::Rfe, 0.15),
                (MethodKind::MutualInfo, 0.05),
            ],
        ),
    ]
}

// ── Method hyperparameters ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodParams {
    /// Base seed; each stochastic method derives its own stream from it
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// L1 strength for the lasso scorer
    #[serde(default = "default_lasso_alpha")]
    pub lasso_alpha: f64,
    /// Quantile bins per feature for mutual information
    #[serde(default = "default_mi_bins")]
    pub mutual_info_bins: usize,
    /// Features eliminated per recursive-elimination round
    #[serde(default = "default_rfe_step")]
    pub rfe_step: usize,
    #[serde(default)]
    pub xgboost: BoostingParams,
    #[serde(default)]
    pub random_forest: ForestParams,
    #[serde(default)]
    pub permutation: PermutationParams,
    #[serde(default)]
    pub logistic: LogisticParams,
}

fn default_seed() -> u64 { 42 }
fn default_lasso_alpha() -> f64 { 0.01 }
fn default_mi_bins() -> usize { 10 }
fn default_rfe_step() -> usize { 1 }

impl Default for MethodParams {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            xgboost: BoostingParams::default(),
            random_forest: ForestParams::default(),
            permutation: PermutationParams::default(),
            logistic: LogisticParams::default(),
            lasso_alpha: default_lasso_alpha(),
            mutual_info_bins: default_mi_bins(),
            rfe_step: default_rfe_step(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostingParams {
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    #[serde(default = "default_boost_depth")]
    pub max_depth: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// L2 penalty on leaf weights
    #[serde(default = "default_reg_lambda")]
    pub reg_lambda: f64,
    /// Minimum hessian sum per child
    #[serde(default = "default_min_child_weight")]
    pub min_child_weight: f64,
}

fn default_n_estimators() -> usize { 100 }
fn default_boost_depth() -> usize { 3 }
fn default_learning_rate() -> f64 { 0.1 }
fn default_reg_lambda() -> f64 { 1.0 }
fn default_min_child_weight() -> f64 { 1.0 }

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            max_depth: default_boost_depth(),
            learning_rate: default_learning_rate(),
            reg_lambda: default_reg_lambda(),
            min_child_weight: default_min_child_weight(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestParams {
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    #[serde(default = "default_forest_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    /// Features tried per split (ceil(sqrt(F)) when unset)
    #[serde(default)]
    pub max_features: Option<usize>,
}

fn default_n_trees() -> usize { 100 }
fn default_forest_depth() -> usize { 8 }
fn default_min_samples_split() -> usize { 5 }
fn default_min_samples_leaf() -> usize { 2 }

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            max_depth: default_forest_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermutationParams {
    /// Trailing fraction of rows held out for scoring
    #[serde(default = "default_holdout")]
    pub holdout_fraction: f64,
    #[serde(default = "default_repeats")]
    pub n_repeats: usize,
}

fn default_holdout() -> f64 { 0.2 }
fn default_repeats() -> usize { 5 }

impl Default for PermutationParams {
    fn default() -> Self {
        Self { holdout_fraction: default_holdout(), n_repeats: default_repeats() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticParams {
    #[serde(default = "default_logit_lr")]
    pub learning_rate: f64,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_logit_lr() -> f64 { 0.1 }
fn default_max_iter() -> usize { 500 }
fn default_tolerance() -> f64 { 1e-6 }

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: default_logit_lr(),
            max_iter: default_max_iter(),
            tolerance: default_tolerance(),
        }
    }
}

// ── Output / Execution ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for the consensus table, final list and JSON report
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Also write the full JSON report
    #[serde(default = "default_true")]
    pub write_json: bool,
}

fn default_output_dir() -> String { "results".to_string() }

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir(), write_json: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionConfig {
    /// Run the eight scorers concurrently on the rayon pool
    #[serde(default)]
    pub parallel_scorers: bool,
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl RankingConfig {
    /// Load from YAML file
    pub fn from_yaml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Load from JSON file
    pub fn from_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load from TOML file
    pub fn from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load by file extension (`.yaml`/`.yml`, `.json`, anything else as TOML).
    pub fn load(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(path),
            Some("json") => Self::from_json(path),
            _ => Self::from_toml(path),
        }
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// All composite specifications: the reference weights first, then extras.
    pub fn composite_specs(&self) -> Vec<CompositeSpec> {
        let mut specs = vec![self.weights.to_spec(REFERENCE_COMPOSITE)];
        specs.extend(self.composites.iter().cloned());
        specs
    }

    /// Every check that does not need the data. Runs before any scoring.
    pub fn validate(&self) -> Result<()> {
        if self.target.horizon == 0 {
            return Err(HyrankError::Config(
                "target.horizon must be >= 1 (the target must look strictly ahead)".into(),
            ));
        }
        if self.selection.top_k == 0 {
            return Err(HyrankError::Config("selection.top_k must be >= 1".into()));
        }
        let thr = self.selection.correlation_threshold;
        if !(thr > 0.0 && thr <= 1.0) {
            return Err(HyrankError::Config(format!(
                "selection.correlation_threshold must be in (0, 1], got {thr}"
            )));
        }
        if let Some(pool) = self.selection.candidate_pool {
            if pool < self.selection.top_k {
                return Err(HyrankError::Config(format!(
                    "selection.candidate_pool ({pool}) is smaller than top_k ({})",
                    self.selection.top_k
                )));
            }
        }

        self.weights.validate()?;
        self.consensus.validate()?;

        let mut names = HashSet::new();
        for spec in self.composite_specs() {
            let pairs = spec.resolve()?;
            let sum: f64 = pairs.iter().map(|(_, w)| w).sum();
            if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
                return Err(HyrankError::Config(format!(
                    "composite '{}' weights sum to {sum}, expected 1.0",
                    spec.name
                )));
            }
            if !names.insert(spec.name.clone()) {
                return Err(HyrankError::Config(format!(
                    "composite '{}' defined twice",
                    spec.name
                )));
            }
        }
        if !names.contains(&self.selection.primary_composite) {
            return Err(HyrankError::Config(format!(
                "primary composite '{}' is not defined",
                self.selection.primary_composite
            )));
        }

        let p = &self.methods;
        if !(p.permutation.holdout_fraction > 0.0 && p.permutation.holdout_fraction < 1.0) {
            return Err(HyrankError::Config(format!(
                "methods.permutation.holdout_fraction must be in (0, 1), got {}",
                p.permutation.holdout_fraction
            )));
        }
        if p.permutation.n_repeats == 0 || p.random_forest.n_trees == 0 || p.xgboost.n_estimators == 0 {
            return Err(HyrankError::Config(
                "n_repeats, n_trees and n_estimators must all be >= 1".into(),
            ));
        }
        if p.mutual_info_bins < 2 {
            return Err(HyrankError::Config("methods.mutual_info_bins must be >= 2".into()));
        }
        if p.rfe_step == 0 {
            return Err(HyrankError::Config("methods.rfe_step must be >= 1".into()));
        }
        if p.lasso_alpha < 0.0 {
            return Err(HyrankError::Config("methods.lasso_alpha must be >= 0".into()));
        }

        for pattern in &self.data.exclude_columns {
            if pattern.is_empty() {
                return Err(HyrankError::Config("empty exclude_columns pattern".into()));
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
