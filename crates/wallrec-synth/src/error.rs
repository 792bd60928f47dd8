//! Error types for wallrec-synth.

use std::path::PathBuf;

use thiserror::Error;

/// Generator error types.
///
/// Data-quality problems (malformed embedding lines, missing vectors, users
/// without liked items) never surface here: they are logged and skipped where
/// they are detected.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog file does not exist.
    #[error("Catalog not found: {}", .0.display())]
    CatalogNotFound(PathBuf),

    /// Catalog was read but contained no items.
    #[error("Catalog is empty: {} yielded no items", .0.display())]
    CatalogEmpty(PathBuf),

    /// Catalog header lacks a required column.
    #[error("Catalog is missing required column '{0}'")]
    MissingColumn(&'static str),

    /// Vectors averaged for one user disagree on dimensionality.
    #[error(
        "Embedding dimension mismatch for user {user_id}: expected {expected}, got {actual} (item '{external_id}')"
    )]
    EmbeddingDimensionMismatch {
        /// User whose embedding was being aggregated.
        user_id: u32,
        /// External id of the offending item.
        external_id: String,
        /// Dimension of the first vector seen for this user.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// A user needs more distinct items than the catalog holds.
    #[error("User {user_id} needs {needed} distinct items but the catalog only has {available}")]
    InsufficientItems {
        /// User being filled.
        user_id: u32,
        /// Distinct items required.
        needed: usize,
        /// Catalog size.
        available: usize,
    },

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Layered configuration extraction error.
    #[error("Config extraction error: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, Error>;
