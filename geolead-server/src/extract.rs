//! Geolead-specific HTTP headers extractor

use axum::extract::FromRequestParts;
use axum::http::header::HeaderMap;
use axum::http::request::Parts;

use geolead_core::CallerId;

use crate::error::{Result, ServerError};

/// Caller identity and credentials carried on request headers.
///
/// The caller header is mandatory on every client-facing endpoint; the rest
/// are optional and only change which path a request takes through the
/// engine.
#[derive(Debug, Clone)]
pub struct ClientHeaders {
    /// Stable caller identifier (device or account scoped)
    pub caller: CallerId,
    /// Session credential for tier resolution
    pub credential: Option<String>,
    /// Human-verification token from a completed challenge
    pub human_token: Option<String>,
    /// Operator override token
    pub admin_token: Option<String>,
}

impl ClientHeaders {
    /// Header names
    pub const CALLER: &'static str = "x-geolead-caller";
    pub const ENTITLEMENT: &'static str = "x-geolead-entitlement";
    pub const HUMAN_TOKEN: &'static str = "x-geolead-human-token";
    pub const ADMIN_TOKEN: &'static str = "x-geolead-admin-token";

    /// Parse headers from a HeaderMap
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        let raw_caller = get_header_str(headers, Self::CALLER).ok_or_else(|| {
            ServerError::bad_request(format!("missing {} header", Self::CALLER))
        })?;
        let caller = CallerId::parse(raw_caller)
            .map_err(|e| ServerError::bad_request(format!("{}: {e}", Self::CALLER)))?;

        Ok(Self {
            caller,
            credential: get_header_str(headers, Self::ENTITLEMENT).map(str::to_string),
            human_token: get_header_str(headers, Self::HUMAN_TOKEN).map(str::to_string),
            admin_token: get_header_str(headers, Self::ADMIN_TOKEN).map(str::to_string),
        })
    }
}

/// Get a header value as a string, ignoring non-UTF8 values
fn get_header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Axum extractor implementation
#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientHeaders
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        ClientHeaders::from_headers(&parts.headers)
    }
}
