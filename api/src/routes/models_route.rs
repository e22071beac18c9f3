use std::sync::Arc;

use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
};

#[derive(Debug, Serialize)]
pub struct ModelItem {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelItem>,
}

/// Handler: GET /models: models usable for chat with the configured key.
pub async fn list_models(State(state): State<Arc<AppState>>) -> AppResult<Response> {
    let models = state
        .llm
        .generation_models()
        .await?
        .into_iter()
        .map(|m| ModelItem {
            name: m.name,
            display_name: m.display_name,
        })
        .collect();

    Ok(ApiResponse::ok(ModelsResponse { models }))
}
