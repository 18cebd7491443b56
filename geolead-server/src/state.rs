//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use geolead_api::{
    AdmissionEngine, CandidateSource, MemoryGeoIndex, MemoryQuotaStore, PoiCatalog, QuotaStore,
    RedisQuotaStore,
};
use geolead_policy::{AcceptAllVerifier, DenyAllVerifier, HumanVerifier, StaticEntitlements};

use crate::config::{FrictionMode, ServerConfig};
use crate::error::{Result, ServerError};
use crate::telemetry::TelemetryConfig;
use crate::turnstile::TurnstileVerifier;

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    /// The admission and search pipeline
    pub engine: AdmissionEngine,
    /// Server configuration
    pub config: ServerConfig,
    /// Telemetry configuration
    pub telemetry: TelemetryConfig,
    /// Number of catalog points loaded at startup
    pub poi_count: usize,
    /// Start time for uptime reporting
    start_time: Instant,
}

impl AppState {
    /// Validate configuration, load the catalog, connect the quota store,
    /// and assemble the engine.
    pub async fn new(config: ServerConfig, telemetry: TelemetryConfig) -> Result<Self> {
        config.validate().map_err(ServerError::Config)?;

        let catalog = PoiCatalog::load(&config.poi_path).map_err(|e| {
            ServerError::Config(format!(
                "failed to load poi catalog from {}: {e}",
                config.poi_path.display()
            ))
        })?;
        let poi_count = catalog.len();
        let source: Arc<dyn CandidateSource> = Arc::new(MemoryGeoIndex::new(catalog));

        let quota: Arc<dyn QuotaStore> = match &config.redis_url {
            Some(url) => {
                let store = RedisQuotaStore::connect_with_timeout(url, config.store_timeout())
                    .await
                    .map_err(|e| ServerError::Config(format!("quota store: {e}")))?;
                Arc::new(store)
            }
            None => Arc::new(MemoryQuotaStore::new()),
        };

        let verifier: Arc<dyn HumanVerifier> = match config.friction_mode {
            FrictionMode::Turnstile => {
                let secret = config.turnstile_secret.clone().ok_or_else(|| {
                    ServerError::Config("turnstile mode requires a secret".to_string())
                })?;
                Arc::new(TurnstileVerifier::new(secret))
            }
            FrictionMode::AcceptAll => Arc::new(AcceptAllVerifier),
            FrictionMode::DenyAll => Arc::new(DenyAllVerifier),
        };

        let engine_config = config.engine_config().map_err(ServerError::Config)?;
        let engine = AdmissionEngine::builder()
            .quota(quota)
            .source(source)
            .entitlements(Arc::new(StaticEntitlements::new(
                config.paid_credentials.iter().cloned(),
            )))
            .verifier(verifier)
            .config(engine_config)
            .build()?;

        info!(
            pois = poi_count,
            quota_backend = config.quota_backend_str(),
            friction = ?config.friction_mode,
            paid_credentials = config.paid_credentials.len(),
            service_area = config.service_area.as_deref().unwrap_or("none"),
            "application state ready"
        );

        Ok(Self {
            engine,
            config,
            telemetry,
            poi_count,
            start_time: Instant::now(),
        })
    }

    /// Server uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
