//! Error types for geolead-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// Latitude or longitude outside the valid range (or non-finite)
    #[error("invalid coordinate: lat={lat}, lon={lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// Caller identity failed shape validation
    #[error("invalid caller identity: {0}")]
    InvalidCallerId(String),

    /// A catalog record failed validation
    #[error("invalid point of interest: {0}")]
    InvalidPoi(String),

    /// Catalog file could not be read
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog file could not be parsed
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Candidate source backend failure
    #[error("candidate source error: {0}")]
    Source(String),
}

impl CoreError {
    /// Create an invalid-POI error
    pub fn invalid_poi(msg: impl Into<String>) -> Self {
        CoreError::InvalidPoi(msg.into())
    }

    /// Create a candidate source error
    pub fn source(msg: impl Into<String>) -> Self {
        CoreError::Source(msg.into())
    }
}
