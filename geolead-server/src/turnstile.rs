//! Cloudflare Turnstile token verification.
//!
//! # Trust Model
//!
//! A token proves a human completed the challenge widget. Verification is a
//! server-to-server call against the siteverify endpoint; any failure along
//! the way (transport, timeout, non-success answer) counts as unverified.
//! The per-caller grace window lives upstream in the engine, so one caller
//! does not hit this endpoint on every request.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use geolead_core::CallerId;
use geolead_policy::HumanVerifier;

/// Cloudflare's verification endpoint.
const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Timeout for a verification round trip.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Verifies human tokens against Cloudflare Turnstile.
pub struct TurnstileVerifier {
    client: reqwest::Client,
    secret: String,
    endpoint: String,
}

impl std::fmt::Debug for TurnstileVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnstileVerifier")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl TurnstileVerifier {
    pub fn new(secret: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(VERIFY_TIMEOUT)
            .connect_timeout(Duration::from_secs(3))
            .build()
            .expect("Failed to build Turnstile HTTP client");
        Self {
            client,
            secret,
            endpoint: SITEVERIFY_URL.to_string(),
        }
    }

    /// Point verification at a different endpoint (tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

#[async_trait]
impl HumanVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, caller: &CallerId) -> bool {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                warn!(caller = %caller, "turnstile verification request failed: {e}");
                return false;
            }
        };

        let verdict: SiteverifyResponse = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(caller = %caller, "turnstile verification response unreadable: {e}");
                return false;
            }
        };

        if !verdict.success {
            debug!(
                caller = %caller,
                errors = ?verdict.error_codes,
                "turnstile rejected token"
            );
        }
        verdict.success
    }
}
