//! Panel loading and target engineering for the consensus ranker.
//!
//! The surrounding research scripts write one CSV per run: a date column
//! followed by already-engineered, already-filled numeric features
//! (sector/style ETF momentum, credit spread changes, volatility terms, ...).
//! This crate turns that file into the immutable [`FeatureMatrix`] /
//! [`TargetVector`] pair the ranker consumes.
//!
//! # Target construction
//!
//! | Row | Features use | Target uses |
//! |-----|--------------|-------------|
//! | t   | row t only   | reference return at t + h |
//! | last h rows | dropped | undefined, never imputed |
//!
//! # Example
//!
//! ```rust,no_run
//! use hyrank_common::RankingConfig;
//! use hyrank_data::{build_dataset, PanelLoader};
//!
//! fn main() -> hyrank_common::Result<()> {
//!     let config = RankingConfig::default();
//!     let panel = PanelLoader::new(&config.data).load("data/features.csv")?;
//!     let dataset = build_dataset(&panel, &config.target, &config.data)?;
//!     println!("{} rows x {} features", dataset.features.n_rows(), dataset.features.n_features());
//!     Ok(())
//! }
//! ```
//!
//! [`FeatureMatrix`]: hyrank_common::FeatureMatrix
//! [`TargetVector`]: hyrank_common::TargetVector

pub mod panel;
pub mod target;

pub use panel::{Panel, PanelLoader};
pub use target::{build_dataset, direction_target, RankingDataset};
