//! Error types for the omics-ged library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum OmicsGedError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate {kind} name '{name}'")]
    DuplicateKey { kind: &'static str, name: String },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid state: {0}")]
    State(String),

    #[error("{kind} id {id} out of range (environment holds {len})")]
    Range {
        kind: &'static str,
        id: usize,
        len: usize,
    },

    #[error("'{value}' is not a recognized {kind}")]
    Config { kind: &'static str, value: String },

    #[error("degenerate dataset: {0}")]
    Degenerate(String),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, OmicsGedError>;
