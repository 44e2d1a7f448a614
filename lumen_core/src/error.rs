//! Error types for the lumen_core library.
//!
//! Only structural problems are errors. Gaps in clinical data (unknown
//! drugs, missing compatibility records, lumen type mismatches) are reported
//! as [`crate::Warning`] values inside results instead.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for lumen_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Lumen configuration rejected before allocation
    #[error("Invalid lumen configuration: {0}")]
    InvalidConfiguration(String),

    /// Drug database is structurally unusable
    #[error("Database error: {0}")]
    Database(String),
}
