//! HTTP handlers for exception intake

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tracing::{debug, info};
use triage_core::ExceptionReport;
use triage_tracker::FilingOutcome;

use crate::{error::AppError, server::AppState};

/// Create the intake router with all endpoint routes
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_open_issues).post(receive_exception))
        .route("/health", get(health_check))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
        })
        .unwrap_or(false)
}

/// POST / - Triage an exception report and file or update its record
pub async fn receive_exception(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    if !is_json(&headers) {
        debug!("Non-JSON POST, answering with open issues");
        return list_open_issues(State(state)).await;
    }

    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid JSON body: {}", e)))?;
    info!("Received json data: {}", value);

    let report = ExceptionReport::from_value(value)?;
    let outcome = state.service.report(&report).await?;

    let response = match outcome {
        FilingOutcome::Created { key } => (
            StatusCode::CREATED,
            format!("Jira issue added: {}", key),
        ),
        FilingOutcome::Updated { key, .. } => (
            StatusCode::OK,
            format!("Jira issue already exists, updated: {}", key),
        ),
    };
    Ok(response.into_response())
}

/// GET / - Records that are still open
pub async fn list_open_issues(State(state): State<AppState>) -> Result<Response, AppError> {
    let listing = state.service.open_issues().await?;
    Ok((StatusCode::OK, Json(listing)).into_response())
}

/// GET /health - Liveness check
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
