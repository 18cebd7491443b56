//! Error types for geolead-api

use thiserror::Error;

use geolead_core::CoreError;
use geolead_quota::QuotaError;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, EngineError>;

/// Request-level engine failure.
///
/// Blocked and challenged requests are not errors; they come back as
/// decisions. This type covers the cases where no decision can be served.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed request input, rejected before any policy work
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Coordinates outside the configured service area
    #[error("coordinates outside the service area: lat={lat}, lon={lon}")]
    OutsideServiceArea { lat: f64, lon: f64 },

    /// Quota store unreachable; enforcement cannot run, so the request
    /// fails closed
    #[error("quota enforcement unavailable: {0}")]
    EnforcementUnavailable(#[from] QuotaError),

    /// Candidate source failure after admission; no quota was consumed
    #[error("candidate lookup failed: {0}")]
    Candidates(#[from] CoreError),

    /// Engine was assembled with inconsistent or missing configuration
    #[error("engine configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Create an invalid-input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }

    /// Machine-readable code for API surfaces and logs.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidInput(_) => "INVALID_INPUT",
            EngineError::OutsideServiceArea { .. } => "OUTSIDE_SERVICE_AREA",
            EngineError::EnforcementUnavailable(_) => "ENFORCEMENT_UNAVAILABLE",
            EngineError::Candidates(_) => "CANDIDATE_SOURCE_FAILURE",
            EngineError::Config(_) => "ENGINE_MISCONFIGURED",
        }
    }
}
