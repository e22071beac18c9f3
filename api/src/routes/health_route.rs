use std::sync::Arc;

use ai_llm_service::health_service::HealthStatus;
use axum::{extract::State, http::StatusCode, response::Response};
use serde::Serialize;
use tracing::warn;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub directory_records: usize,
    pub services: Vec<HealthStatus>,
}

/// Handler: GET /health: 200 when every LLM profile answers, 503 otherwise.
///
/// A degraded report carries `success: false` with the per-service details as data.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let services = state.llm.health_all().await;
    let ok = services.iter().all(|s| s.ok);
    if !ok {
        warn!(failing = services.iter().filter(|s| !s.ok).count(), "health: degraded");
    }

    let report = HealthResponse {
        ok,
        directory_records: state.directory.len(),
        services,
    };
    if ok {
        ApiResponse::ok(report)
    } else {
        ApiResponse::failure_with(report).into_response_with_status(StatusCode::SERVICE_UNAVAILABLE)
    }
}
