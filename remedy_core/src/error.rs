//! Error types for the remedy_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for remedy_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing store failed (network, disk, lock). Never treated as "no data".
    #[error("Repository error: {0}")]
    Repository(String),

    /// A referenced medication, plant, remedy or user record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A record violates a closed enumeration or references a missing entity
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Whether this error should be shown as a failure banner rather than an
    /// informational message.
    pub fn is_repository_failure(&self) -> bool {
        matches!(self, Error::Repository(_) | Error::Io(_))
    }
}
