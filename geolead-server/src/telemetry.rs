//! Logging setup and request correlation.

use std::env;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Primary log filter (RUST_LOG env var)
    pub log_filter: String,
    /// Fallback log level if RUST_LOG not set
    pub default_level: String,
    /// Request ID header name (default: "x-request-id")
    pub request_id_header: String,
    /// Log format ("human" or "json")
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Human,
    Json,
}

impl TelemetryConfig {
    /// Create telemetry config with server config for CLI log level support
    pub fn with_server_config(server_config: &ServerConfig) -> Self {
        let rust_log = env::var("RUST_LOG").unwrap_or_default();
        let default_level = if rust_log.is_empty() {
            env::var("LOG_LEVEL").unwrap_or_else(|_| server_config.log_level.clone())
        } else {
            server_config.log_level.clone()
        };
        Self::from_env_with_defaults(default_level)
    }

    fn from_env_with_defaults(default_level: String) -> Self {
        Self {
            log_filter: env::var("RUST_LOG").unwrap_or_default(),
            default_level,
            request_id_header: env::var("LOG_REQUEST_ID_HEADER")
                .unwrap_or_else(|_| "x-request-id".to_string()),
            log_format: match env::var("LOG_FORMAT")
                .unwrap_or_default()
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Human,
            },
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        let rust_log = env::var("RUST_LOG").unwrap_or_default();
        let default_level = if rust_log.is_empty() {
            env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
        } else {
            "info".to_string()
        };
        Self::from_env_with_defaults(default_level)
    }
}

/// Initialize the global tracing subscriber.
///
/// Safe to call multiple times - will only initialize once.
pub fn init_logging(config: &TelemetryConfig) {
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("tracing subscriber already initialized, skipping");
        return;
    }

    let filter = if config.log_filter.is_empty() {
        EnvFilter::new(&config.default_level)
    } else {
        EnvFilter::new(&config.log_filter)
    };

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
        LogFormat::Human => tracing_subscriber::fmt::layer().compact().boxed(),
    };

    // try_init covers the race where another thread set the subscriber
    // between the has_been_set check and now (tests do this)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Correlation id for one request, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Extract request ID from headers
///
/// Checks the configured header first, then x-correlation-id.
/// Returns None if no request ID found.
pub fn extract_request_id(
    headers: &axum::http::HeaderMap,
    config: &TelemetryConfig,
) -> Option<String> {
    if let Some(value) = headers.get(&config.request_id_header) {
        if let Ok(id) = value.to_str() {
            return Some(id.to_string());
        }
    }

    if let Some(value) = headers.get("x-correlation-id") {
        if let Ok(id) = value.to_str() {
            return Some(id.to_string());
        }
    }

    None
}

/// Middleware wrapping every request in a correlation span.
///
/// The request id is taken from the inbound headers or generated, recorded
/// on the span, stashed as an extension, and echoed on the response.
pub async fn request_context(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = extract_request_id(request.headers(), &state.telemetry)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
        caller = tracing::field::Empty,
        area = tracing::field::Empty,
    );

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Record the caller identity on the active request span.
///
/// The span is created before header extraction runs, so the field starts
/// empty and handlers fill it in once they know who is asking.
pub fn set_span_caller(caller: &str) {
    tracing::Span::current().record("caller", caller);
}

/// Record the query's area bucket on the active request span.
pub fn set_span_area(area: &str) {
    tracing::Span::current().record("area", area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;

    #[test]
    fn request_id_from_configured_header() {
        let config = TelemetryConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "req-123".parse().unwrap());
        assert_eq!(
            extract_request_id(&headers, &config),
            Some("req-123".to_string())
        );
    }

    #[test]
    fn request_id_falls_back_to_correlation_header() {
        let config = TelemetryConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert("x-correlation-id", "corr-456".parse().unwrap());
        assert_eq!(
            extract_request_id(&headers, &config),
            Some("corr-456".to_string())
        );
    }

    #[test]
    fn request_id_absent() {
        let config = TelemetryConfig::default();
        assert_eq!(extract_request_id(&HeaderMap::new(), &config), None);
    }
}
