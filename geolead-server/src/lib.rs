//! Geolead HTTP Server
//!
//! A thin HTTP wrapper around `geolead-api`, exposing the admission and
//! proximity-search pipeline as a small REST surface:
//!
//! - `POST /v1/find-nearest` - admitted search with spaced results
//! - `GET /v1/status`        - decision peek, nothing consumed
//! - `GET /health`           - liveness and startup facts
//!
//! # Example
//!
//! ```ignore
//! use geolead_server::{GeoleadServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig::from_args();
//!     let server = GeoleadServer::new(config).await.unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod turnstile;

pub use config::{FrictionMode, ServerConfig};
pub use error::{Result, ServerError};
pub use state::AppState;
pub use telemetry::{init_logging, TelemetryConfig};

use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Geolead HTTP Server
pub struct GeoleadServer {
    /// Application state
    state: Arc<AppState>,
    /// Configured router
    router: Router,
}

impl GeoleadServer {
    /// Create a new server with the given configuration
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let telemetry = TelemetryConfig::with_server_config(&config);
        let state = Arc::new(AppState::new(config, telemetry).await?);
        let router = routes::build_router(state.clone());
        Ok(Self { state, router })
    }

    /// Get a reference to the application state
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Get the router for testing
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> std::io::Result<()> {
        let addr = self.state.config.listen_addr;
        let listener = TcpListener::bind(addr).await?;

        info!(
            addr = %addr,
            quota_backend = self.state.config.quota_backend_str(),
            pois = self.state.poi_count,
            "geolead server listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
