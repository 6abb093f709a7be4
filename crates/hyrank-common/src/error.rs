use thiserror::Error;

use crate::method::MethodKind;

#[derive(Debug, Error)]
pub enum HyrankError {
    /// Missing target, non-numeric or missing cells, or misaligned lengths.
    #[error("Input contract violation: {0}")]
    InputContract(String),

    /// A single scoring method could not score the input; the whole run fails.
    #[error("Method '{method}' failed: {reason}")]
    DegenerateMethod { method: MethodKind, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HyrankError {
    pub fn degenerate(method: MethodKind, reason: impl Into<String>) -> Self {
        HyrankError::DegenerateMethod { method, reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, HyrankError>;
