use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use super::AppState;
use crate::resolver::{ClientHeaders, ExtractionResult};

/// Pull `url` out of the JSON body. A malformed body counts as an empty one.
fn requested_url(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("url")?.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn client_headers(headers: &HeaderMap) -> ClientHeaders {
    ClientHeaders {
        user_agent: header_value(headers, header::USER_AGENT),
        referer: header_value(headers, header::REFERER),
        cookie: header_value(headers, header::COOKIE),
        accept_language: header_value(headers, header::ACCEPT_LANGUAGE),
    }
}

/// POST /api/fetch
///
/// Logical failures come back as 200 with `status: "error"`; only invalid
/// input is a 400.
pub async fn fetch(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let url = requested_url(&body);
    debug!(url = %url, "POST /api/fetch");

    match state.orchestrator.extract(&url, client_headers(&headers)).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(ExtractionResult::failure(&e))).into_response(),
    }
}

/// OPTIONS /api/fetch
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}
