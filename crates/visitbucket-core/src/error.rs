//! Error types for visitbucket-core.
//!
//! Parse failures abort the aggregation that hit them. Transport failures
//! are carried upward with the raw status and body untouched. An empty
//! collection or bucket series is a valid result and never an error.

use thiserror::Error;

/// The main error type for visitbucket operations.
#[derive(Debug, Error)]
pub enum VisitBucketError {
    /// A timestamp string could not be decoded.
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// Unknown bucket granularity name.
    #[error("Invalid granularity: {0}")]
    InvalidGranularity(String),

    /// Unknown timestamp encoding name.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A data-source payload could not be decoded.
    #[error("Payload error: {0}")]
    PayloadError(String),

    /// The reporting service answered with something other than success,
    /// or could not be reached at all (`status` is `None`).
    #[error("Transport error (status {}): {body}", fmt_status(.status))]
    TransportError { status: Option<u16>, body: String },
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

/// Result type alias for visitbucket operations.
pub type Result<T> = std::result::Result<T, VisitBucketError>;
