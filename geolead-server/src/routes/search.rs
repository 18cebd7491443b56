//! The search endpoint: POST /v1/find-nearest

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use geolead_api::{Candidate, Decision, GeoPoint, SearchRequest, Tier};

use crate::error::{Result, ServerError};
use crate::extract::ClientHeaders;
use crate::state::AppState;
use crate::telemetry;

/// Search request body
#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub lat: f64,
    pub lon: f64,
}

/// Search response body.
///
/// The decision is always present; `results` only when the search was
/// admitted and served.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub decision: Decision,
    pub tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<PoiResult>>,
}

/// One selected point, shaped for clients.
#[derive(Debug, Serialize)]
pub struct PoiResult {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Distance from the query point, rounded for presentation
    pub distance_m: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Deep link for opening the point in a maps client
    pub maps_url: String,
}

impl From<Candidate> for PoiResult {
    fn from(candidate: Candidate) -> Self {
        let maps_url = format!(
            "https://www.google.com/maps/dir/?api=1&destination={:.6},{:.6}",
            candidate.poi.lat, candidate.poi.lon
        );
        PoiResult {
            id: candidate.poi.id,
            name: candidate.poi.name,
            lat: candidate.poi.lat,
            lon: candidate.poi.lon,
            distance_m: (candidate.distance_m * 100.0).round() / 100.0,
            thumbnail: candidate.poi.thumbnail,
            maps_url,
        }
    }
}

/// Find spaced-out points near a location, subject to admission.
///
/// POST /v1/find-nearest
///
/// Returns 200 with a decision body for served and challenged requests, and
/// 429 with a Retry-After header when the caller's daily quota is exhausted.
pub async fn find_nearest(
    State(state): State<Arc<AppState>>,
    client: ClientHeaders,
    Json(body): Json<SearchBody>,
) -> Result<Response> {
    telemetry::set_span_caller(client.caller.as_str());
    let location = GeoPoint::new(body.lat, body.lon)
        .map_err(|e| ServerError::bad_request(e.to_string()))?;

    let request = SearchRequest {
        caller: client.caller,
        location,
        credential: client.credential,
        human_token: client.human_token,
        admin_token: client.admin_token,
    };

    let outcome = state.engine.search(request).await?;
    telemetry::set_span_area(&outcome.area_bucket);

    let status = if outcome.decision.is_blocked() {
        StatusCode::TOO_MANY_REQUESTS
    } else {
        StatusCode::OK
    };
    let retry_after = outcome.decision.retry_after;

    let response_body = SearchResponse {
        tier: outcome.tier,
        results: outcome
            .results
            .map(|found| found.into_iter().map(PoiResult::from).collect()),
        decision: outcome.decision,
    };

    let mut response = (status, Json(response_body)).into_response();
    if let Some(secs) = retry_after {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    }
    Ok(response)
}
