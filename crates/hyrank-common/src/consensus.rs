/// Consensus-quality labelling for per-feature rank dispersion.
/// Low dispersion across methods means the methods agree on a feature.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HyrankError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsensusQuality {
    High,
    Medium,
    Low,
}

impl ConsensusQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusQuality::High   => "HIGH",
            ConsensusQuality::Medium => "MEDIUM",
            ConsensusQuality::Low    => "LOW",
        }
    }
}

impl fmt::Display for ConsensusQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispersion cut-offs on the rank-count scale.
///
/// The defaults assume a feature universe of roughly a hundred columns;
/// smaller universes should scale them down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusThresholds {
    /// Dispersion strictly below this is `HIGH`
    #[serde(default = "default_high_below")]
    pub high_below: f64,
    /// Dispersion strictly below this (and not `HIGH`) is `MEDIUM`
    #[serde(default = "default_medium_below")]
    pub medium_below: f64,
}

fn default_high_below() -> f64 { 15.0 }
fn default_medium_below() -> f64 { 30.0 }

impl Default for ConsensusThresholds {
    fn default() -> Self {
        Self {
            high_below: default_high_below(),
            medium_below: default_medium_below(),
        }
    }
}

impl ConsensusThresholds {
    pub fn validate(&self) -> Result<()> {
        if !(self.high_below > 0.0 && self.high_below.is_finite()) {
            return Err(HyrankError::Config(format!(
                "consensus.high_below must be positive, got {}",
                self.high_below
            )));
        }
        if !(self.medium_below > self.high_below && self.medium_below.is_finite()) {
            return Err(HyrankError::Config(format!(
                "consensus.medium_below ({}) must exceed high_below ({})",
                self.medium_below, self.high_below
            )));
        }
        Ok(())
    }

    pub fn classify(&self, dispersion: f64) -> ConsensusQuality {
        if dispersion < self.high_below {
            ConsensusQuality::High
        } else if dispersion < self.medium_below {
            ConsensusQuality::Medium
        } else {
            ConsensusQuality::Low
        }
    }
}

/// Population standard deviation (divides by n, not n - 1).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}
