//! hyrank-common: Shared types, errors, and configuration used across all hyrank crates.

pub mod error;
pub mod entities;
pub mod method;
pub mod consensus;
pub mod ranking_config;

// Re-export commonly used types
pub use error::{HyrankError, Result};
pub use entities::{FeatureMatrix, TargetVector};
pub use method::MethodKind;
pub use consensus::{ConsensusQuality, ConsensusThresholds};
pub use ranking_config::{RankingConfig, MethodWeights, SelectionConfig, TargetSpec};
