//! Error types for the buildrisk-core crate.

use thiserror::Error;

/// Top-level error type for risk inference.
#[derive(Debug, Error)]
pub enum RiskError {
    /// A field is missing or cannot be coerced; raised before any model call.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// One or more values fall outside their documented bounds.
    #[error("Validation failed: {}", .issues.join("; "))]
    Validation { issues: Vec<String> },

    /// Artifacts could not be loaded; no inference is possible.
    #[error("Artifact load error: {0}")]
    ArtifactLoad(String),

    /// A model failed for a single prediction (shape mismatch, missing column, ...).
    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The prediction log could not be written or read.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl RiskError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn validation(issues: Vec<String>) -> Self {
        Self::Validation { issues }
    }

    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::ArtifactLoad(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Prefix input-related messages with `scope`, e.g. a scenario name.
    pub fn scoped(self, scope: &str) -> Self {
        match self {
            Self::MalformedInput(msg) => Self::MalformedInput(format!("{scope}: {msg}")),
            Self::Validation { issues } => Self::Validation {
                issues: issues
                    .into_iter()
                    .map(|issue| format!("{scope}: {issue}"))
                    .collect(),
            },
            Self::Inference(msg) => Self::Inference(format!("{scope}: {msg}")),
            other => other,
        }
    }

    /// Every violated constraint, when this is a validation failure.
    pub fn issues(&self) -> &[String] {
        match self {
            Self::Validation { issues } => issues,
            _ => &[],
        }
    }
}
