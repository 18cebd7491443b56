//! Server configuration

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use geolead_api::{BoundingBox, EngineConfig, PolicyConfig, PolicyLimits};
use geolead_policy::TierLimits;

/// How human-verification tokens are checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FrictionMode {
    /// Verify tokens against Cloudflare Turnstile (production)
    #[default]
    Turnstile,
    /// Accept any non-empty token (DEV ONLY - not a security boundary)
    AcceptAll,
    /// Reject every token; challenges can never be passed
    DenyAll,
}

/// Geolead HTTP server configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "geolead-server")]
#[command(about = "Geolead proximity search and admission API server")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "GEOLEAD_LISTEN_ADDR", default_value = "0.0.0.0:8090")]
    pub listen_addr: SocketAddr,

    /// Path to the POI catalog JSON file
    #[arg(long, env = "GEOLEAD_POI_PATH", default_value = "data/pois.sample.json")]
    pub poi_path: PathBuf,

    /// Redis URL for the quota store (e.g. redis://127.0.0.1:6379)
    #[arg(long, env = "GEOLEAD_REDIS_URL")]
    pub redis_url: Option<String>,

    /// Use the in-process quota store instead of Redis.
    /// Counters are per-instance and lost on restart; single-instance only.
    #[arg(long, env = "GEOLEAD_MEMORY_QUOTA")]
    pub memory_quota: bool,

    /// Quota store operation timeout in milliseconds
    #[arg(long, env = "GEOLEAD_STORE_TIMEOUT_MS", default_value = "2000")]
    pub store_timeout_ms: u64,

    /// Daily search limit for free-tier callers
    #[arg(long, env = "GEOLEAD_FREE_DAILY_LIMIT", default_value = "2")]
    pub free_daily_limit: u32,

    /// Result cap per search for free-tier callers
    #[arg(long, env = "GEOLEAD_FREE_MAX_RESULTS", default_value = "1")]
    pub free_max_results: u32,

    /// Daily search limit for paid-tier callers
    #[arg(long, env = "GEOLEAD_PAID_DAILY_LIMIT", default_value = "50")]
    pub paid_daily_limit: u32,

    /// Result cap per search for paid-tier callers
    #[arg(long, env = "GEOLEAD_PAID_MAX_RESULTS", default_value = "5")]
    pub paid_max_results: u32,

    /// Candidate search radius in meters
    #[arg(long, env = "GEOLEAD_SEARCH_RADIUS_M", default_value = "5000")]
    pub search_radius_m: f64,

    /// Minimum spacing between returned results in meters
    #[arg(long, env = "GEOLEAD_MIN_SPACING_M", default_value = "30")]
    pub min_spacing_m: f64,

    /// Decimal places for area bucket codes in logs
    #[arg(long, env = "GEOLEAD_AREA_PRECISION", default_value = "3")]
    pub area_precision: u32,

    /// TTL in seconds for quota counters (one day)
    #[arg(long, env = "GEOLEAD_COUNTER_TTL_SECS", default_value = "86400")]
    pub counter_ttl_secs: u64,

    /// How long a passed challenge is honored per caller, in seconds
    #[arg(long, env = "GEOLEAD_VERIFY_GRACE_SECS", default_value = "600")]
    pub verify_grace_secs: u64,

    /// Human-verification backend
    #[arg(
        long,
        env = "GEOLEAD_FRICTION_MODE",
        default_value = "turnstile",
        value_enum
    )]
    pub friction_mode: FrictionMode,

    /// Turnstile secret key (required when friction-mode=turnstile)
    #[arg(long, env = "GEOLEAD_TURNSTILE_SECRET")]
    pub turnstile_secret: Option<String>,

    /// Operator override token; requests presenting it bypass quota and friction
    #[arg(long, env = "GEOLEAD_ADMIN_TOKEN")]
    pub admin_token: Option<String>,

    /// Service area as "min_lat,min_lon,max_lat,max_lon"; queries outside it are rejected
    #[arg(long, env = "GEOLEAD_SERVICE_AREA")]
    pub service_area: Option<String>,

    /// Credential granting paid-tier access (can be specified multiple times)
    #[arg(
        long = "paid-credential",
        env = "GEOLEAD_PAID_CREDENTIALS",
        value_delimiter = ','
    )]
    pub paid_credentials: Vec<String>,

    /// Enable CORS (Cross-Origin Resource Sharing)
    #[arg(long, env = "GEOLEAD_CORS_ENABLED", default_value = "true")]
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GEOLEAD_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8090".parse().expect("valid default addr"),
            poi_path: PathBuf::from("data/pois.sample.json"),
            redis_url: None,
            memory_quota: false,
            store_timeout_ms: 2000,
            free_daily_limit: 2,
            free_max_results: 1,
            paid_daily_limit: 50,
            paid_max_results: 5,
            search_radius_m: 5000.0,
            min_spacing_m: 30.0,
            area_precision: 3,
            counter_ttl_secs: 86_400,
            verify_grace_secs: 600,
            friction_mode: FrictionMode::Turnstile,
            turnstile_secret: None,
            admin_token: None,
            service_area: None,
            paid_credentials: Vec::new(),
            cors_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from CLI args
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Quota backend name for logging
    pub fn quota_backend_str(&self) -> &'static str {
        if self.redis_url.is_some() {
            "redis"
        } else {
            "memory"
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Tier limits assembled from the flat CLI fields
    pub fn policy_limits(&self) -> PolicyLimits {
        PolicyLimits {
            free: TierLimits {
                daily_limit: self.free_daily_limit,
                max_results: self.free_max_results,
            },
            paid: TierLimits {
                daily_limit: self.paid_daily_limit,
                max_results: self.paid_max_results,
            },
        }
    }

    /// Parse the service area string, if configured
    pub fn parsed_service_area(&self) -> Result<Option<BoundingBox>, String> {
        let Some(raw) = &self.service_area else {
            return Ok(None);
        };
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!(
                "service_area must be \"min_lat,min_lon,max_lat,max_lon\", got \"{raw}\""
            ));
        }
        let mut corners = [0.0f64; 4];
        for (slot, part) in corners.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("service_area: \"{part}\" is not a number"))?;
        }
        let bbox = BoundingBox::new(corners[0], corners[1], corners[2], corners[3])
            .map_err(|e| format!("service_area: {e}"))?;
        Ok(Some(bbox))
    }

    /// Assemble the engine configuration
    pub fn engine_config(&self) -> Result<EngineConfig, String> {
        Ok(EngineConfig {
            search_radius_m: self.search_radius_m,
            min_spacing_m: self.min_spacing_m,
            area_precision: self.area_precision,
            policy: PolicyConfig {
                limits: self.policy_limits(),
                counter_ttl: Duration::from_secs(self.counter_ttl_secs),
            },
            service_area: self.parsed_service_area()?,
            admin_token: self.admin_token.clone(),
            verify_grace: Duration::from_secs(self.verify_grace_secs),
        })
    }

    /// Validate all configuration at startup
    pub fn validate(&self) -> Result<(), String> {
        match (&self.redis_url, self.memory_quota) {
            (Some(_), true) => {
                return Err("--redis-url and --memory-quota are mutually exclusive".to_string())
            }
            (None, false) => {
                return Err(
                    "a quota backend is required: --redis-url or --memory-quota".to_string()
                )
            }
            _ => {}
        }

        if self.store_timeout_ms == 0 {
            return Err("store_timeout_ms must be > 0".to_string());
        }

        if self.friction_mode == FrictionMode::Turnstile && self.turnstile_secret.is_none() {
            return Err(
                "friction-mode=turnstile requires --turnstile-secret (or set \
                 --friction-mode accept-all for local development)"
                    .to_string(),
            );
        }

        self.policy_limits().validate()?;
        self.parsed_service_area()?;

        if !self.search_radius_m.is_finite() || self.search_radius_m <= 0.0 {
            return Err("search_radius_m must be positive".to_string());
        }
        if !self.min_spacing_m.is_finite() || self.min_spacing_m < 0.0 {
            return Err("min_spacing_m must be non-negative".to_string());
        }

        Ok(())
    }
}
