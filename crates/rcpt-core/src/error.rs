//! Error types for the rcpt-core library.

use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// Extraction setup error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while building an extractor from configuration.
///
/// Extraction itself never fails; only construction does.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A configured regular expression does not compile.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A keyword or noise word is empty after trimming.
    #[error("empty keyword in {0}")]
    EmptyKeyword(String),

    /// A numeric setting is out of range.
    #[error("invalid setting {field}: {reason}")]
    InvalidSetting { field: String, reason: String },
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;
