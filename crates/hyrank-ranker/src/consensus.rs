//! Consensus table: per-method ranks joined per feature, composite ranks,
//! rank dispersion and a quality label.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use hyrank_common::consensus::population_std;
use hyrank_common::{ConsensusQuality, ConsensusThresholds, HyrankError, MethodKind, Result};

use crate::rank::MethodScoreTable;
use crate::weights::CompositeScheme;

/// One method's view of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodEntry {
    pub method: MethodKind,
    pub raw_score: f64,
    pub rank: usize,
}

/// One row of the consensus table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusRecord {
    pub feature: String,
    /// In canonical method order
    pub methods: Vec<MethodEntry>,
    /// Composite name → composite rank
    pub composites: BTreeMap<String, f64>,
    /// Population std-dev of the per-method ranks
    pub dispersion: f64,
    pub quality: ConsensusQuality,
    /// |Pearson r| with the target
    pub target_correlation: f64,
}

impl ConsensusRecord {
    pub fn rank(&self, method: MethodKind) -> Option<usize> {
        self.methods.iter().find(|e| e.method == method).map(|e| e.rank)
    }

    pub fn composite(&self, name: &str) -> Option<f64> {
        self.composites.get(name).copied()
    }
}

/// All features, in original column order, with every registered composite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusTable {
    records: Vec<ConsensusRecord>,
    methods: Vec<MethodKind>,
    schemes: Vec<CompositeScheme>,
}

impl ConsensusTable {
    /// Join method tables into one record per feature.
    ///
    /// Every table must rank the identical feature universe (same names, same
    /// column order) and each method may appear once. `target_correlation`
    /// is indexed by column.
    pub fn build(
        mut tables: Vec<MethodScoreTable>,
        schemes: &[CompositeScheme],
        thresholds: &ConsensusThresholds,
        target_correlation: &[f64],
    ) -> Result<Self> {
        let first = tables
            .first()
            .ok_or_else(|| HyrankError::InputContract("no method score tables to combine".into()))?;
        let universe: Vec<String> = first.entries().iter().map(|e| e.feature.clone()).collect();

        tables.sort_by_key(|t| t.method());
        let mut seen = HashSet::new();
        for table in &tables {
            if !seen.insert(table.method()) {
                return Err(HyrankError::InputContract(format!(
                    "method {} supplied twice",
                    table.method()
                )));
            }
            let same = table.len() == universe.len()
                && table.entries().iter().zip(&universe).all(|(e, n)| &e.feature == n);
            if !same {
                return Err(HyrankError::InputContract(format!(
                    "method {} ranks a different feature universe",
                    table.method()
                )));
            }
        }
        if target_correlation.len() != universe.len() {
            return Err(HyrankError::InputContract(format!(
                "{} target correlations for {} features",
                target_correlation.len(),
                universe.len()
            )));
        }

        let methods: Vec<MethodKind> = tables.iter().map(|t| t.method()).collect();
        let records = universe
            .iter()
            .enumerate()
            .map(|(j, feature)| {
                let entries: Vec<MethodEntry> = tables
                    .iter()
                    .map(|t| {
                        let e = &t.entries()[j];
                        MethodEntry { method: t.method(), raw_score: e.raw_score, rank: e.rank }
                    })
                    .collect();
                let ranks: Vec<f64> = entries.iter().map(|e| e.rank as f64).collect();
                let dispersion = population_std(&ranks);
                ConsensusRecord {
                    feature: feature.clone(),
                    methods: entries,
                    composites: BTreeMap::new(),
                    dispersion,
                    quality: thresholds.classify(dispersion),
                    target_correlation: target_correlation[j],
                }
            })
            .collect();

        let mut table = Self { records, methods, schemes: Vec::new() };
        for scheme in schemes {
            table.add_composite(scheme.clone())?;
        }
        Ok(table)
    }

    /// Register another composite over the already-computed ranks.
    pub fn add_composite(&mut self, scheme: CompositeScheme) -> Result<()> {
        if self.schemes.iter().any(|s| s.name() == scheme.name()) {
            return Err(HyrankError::Config(format!(
                "composite '{}' already registered",
                scheme.name()
            )));
        }
        if let Some(missing) = scheme.methods().find(|m| !self.methods.contains(m)) {
            return Err(HyrankError::Config(format!(
                "composite '{}' uses {missing}, which was not scored",
                scheme.name()
            )));
        }

        for record in &mut self.records {
            let value = scheme.combine(|m| record.rank(m)).ok_or_else(|| {
                HyrankError::Config(format!(
                    "composite '{}' cannot be computed for '{}'",
                    scheme.name(),
                    record.feature
                ))
            })?;
            record.composites.insert(scheme.name().to_string(), value);
        }
        debug!(composite = scheme.name(), "Registered composite rank");
        self.schemes.push(scheme);
        Ok(())
    }

    /// Records in original column order.
    pub fn records(&self) -> &[ConsensusRecord] {
        &self.records
    }

    pub fn methods(&self) -> &[MethodKind] {
        &self.methods
    }

    pub fn schemes(&self) -> &[CompositeScheme] {
        &self.schemes
    }

    pub fn get(&self, feature: &str) -> Option<&ConsensusRecord> {
        self.records.iter().find(|r| r.feature == feature)
    }

    /// Records sorted by a composite, ascending. Stable: equal composite
    /// values keep column order.
    pub fn ordered_by(&self, composite: &str) -> Result<Vec<&ConsensusRecord>> {
        if !self.schemes.iter().any(|s| s.name() == composite) {
            return Err(HyrankError::Config(format!("composite '{composite}' is not registered")));
        }
        let mut ordered: Vec<&ConsensusRecord> = self.records.iter().collect();
        ordered.sort_by(|a, b| {
            let (x, y) = (a.composites[composite], b.composites[composite]);
            x.total_cmp(&y)
        });
        Ok(ordered)
    }
}
