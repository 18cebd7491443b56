//! Error types for geolead-quota

use std::time::Duration;

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, QuotaError>;

/// Quota store failure.
///
/// Every variant means "enforcement unavailable": callers must deny the
/// guarded action, never fall back to assuming zero usage.
#[derive(Error, Debug)]
pub enum QuotaError {
    /// Transport failure talking to the store
    #[error("quota store unavailable: {0}")]
    Unavailable(String),

    /// Store round trip exceeded the operation timeout
    #[error("quota store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The value under a quota key is not a counter
    #[error("corrupt counter under quota key {key}")]
    CorruptCounter { key: String },
}

impl QuotaError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        QuotaError::Unavailable(msg.into())
    }
}
