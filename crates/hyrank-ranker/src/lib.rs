//! hyrank-ranker: Consensus feature ranking engine.
//!
//! Eight importance methods score every feature, each score table is turned
//! into ordinal ranks, ranks are blended into weighted composites, and the
//! best-ranked features are pruned for collinearity before the top K are
//! returned.

pub mod consensus;
pub mod correlation;
pub mod methods;
pub mod pipeline;
pub mod pruner;
pub mod rank;
pub mod report;
pub mod weights;

pub use consensus::{ConsensusRecord, ConsensusTable};
pub use methods::{default_scorers, ImportanceScorer, PrecomputedScorer};
pub use pipeline::{ConsensusRanker, RankingOutcome};
pub use rank::{FeatureScore, MethodScoreTable};
pub use report::{write_outputs, RankingReport};
pub use weights::CompositeScheme;
