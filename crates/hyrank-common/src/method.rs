//! Identifiers for the importance-scoring methods that feed the consensus.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the eight scoring methods.
///
/// Declaration order is the canonical method order: it fixes the column
/// order of exported tables and the order scorers are collected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// Gradient boosting with second-order split gain
    Xgboost,
    /// Bagged Gini trees (mean impurity decrease)
    RandomForest,
    /// Holdout accuracy drop under column shuffling
    Permutation,
    /// Recursive feature elimination, inverted elimination order
    Rfe,
    /// One-way ANOVA F statistic
    FTest,
    /// Mutual information with the label
    MutualInfo,
    /// |coefficient| of L1-regularised logistic regression
    Lasso,
    /// Raw feature variance
    Variance,
}

impl MethodKind {
    pub const ALL: [MethodKind; 8] = [
        MethodKind::Xgboost,
        MethodKind::RandomForest,
        MethodKind::Permutation,
        MethodKind::Rfe,
        MethodKind::FTest,
        MethodKind::MutualInfo,
        MethodKind::Lasso,
        MethodKind::Variance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Xgboost      => "xgboost",
            MethodKind::RandomForest => "random_forest",
            MethodKind::Permutation  => "permutation",
            MethodKind::Rfe          => "rfe",
            MethodKind::FTest        => "f_test",
            MethodKind::MutualInfo   => "mutual_info",
            MethodKind::Lasso        => "lasso",
            MethodKind::Variance     => "variance",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MethodKind::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown scoring method '{s}'"))
    }
}
