//! Error types for pomostat-core

use thiserror::Error;

/// Main error type for the pomostat-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A stored event timestamp that could not be parsed
    #[error("malformed event timestamp {value:?}: {reason}")]
    MalformedEvent { value: String, reason: String },

    /// Calendar arithmetic left the representable date range
    #[error("date out of range: {0}")]
    DateOutOfRange(String),

    /// A report could not be computed.
    ///
    /// The underlying cause is logged, never carried in the message.
    #[error("failed to generate {report} data")]
    Aggregation { report: &'static str },

    /// Referenced record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A task can only be completed once
    #[error("task {0} is already done")]
    AlreadyCompleted(i64),
}

/// Result type alias for pomostat-core
pub type Result<T> = std::result::Result<T, Error>;
