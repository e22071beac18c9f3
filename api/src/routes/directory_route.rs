use std::sync::Arc;

use axum::{extract::State, response::Response};
use directory_store::DirectoryRecord;
use serde::Serialize;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct DirectoryResponse {
    pub count: usize,
    pub records: Vec<DirectoryRecord>,
}

/// Handler: GET /directory: the records loaded at startup.
pub async fn list_directory(State(state): State<Arc<AppState>>) -> Response {
    let records = state.directory.to_vec();
    ApiResponse::ok(DirectoryResponse {
        count: records.len(),
        records,
    })
}
