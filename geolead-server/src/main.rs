//! Geolead Server CLI
//!
//! Run with: `cargo run -p geolead-server -- --help`

use geolead_server::{init_logging, GeoleadServer, ServerConfig, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_args();

    let telemetry = TelemetryConfig::with_server_config(&config);
    init_logging(&telemetry);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.listen_addr,
        quota_backend = config.quota_backend_str(),
        friction = ?config.friction_mode,
        poi_path = %config.poi_path.display(),
        log_format = ?telemetry.log_format,
        "Starting geolead server"
    );

    let server = GeoleadServer::new(config).await?;
    server.run().await.map_err(Into::into)
}
