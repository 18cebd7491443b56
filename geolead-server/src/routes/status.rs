//! The peek endpoint: GET /v1/status

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use geolead_api::{Decision, Tier};

use crate::error::Result;
use crate::extract::ClientHeaders;
use crate::state::AppState;
use crate::telemetry;

/// Status response body
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub caller: String,
    pub tier: Tier,
    pub decision: Decision,
}

/// Report what a search would decide right now, without consuming quota or
/// triggering a live verification.
///
/// GET /v1/status
pub async fn status(
    State(state): State<Arc<AppState>>,
    client: ClientHeaders,
) -> Result<Json<StatusResponse>> {
    telemetry::set_span_caller(client.caller.as_str());
    let report = state
        .engine
        .status(&client.caller, client.credential.as_deref())
        .await?;

    Ok(Json(StatusResponse {
        caller: client.caller.to_string(),
        tier: report.tier,
        decision: report.decision,
    }))
}
