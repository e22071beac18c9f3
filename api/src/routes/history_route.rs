//! GET /history and DELETE /history.

use std::sync::Arc;

use ai_llm_service::ConversationTurn;
use axum::{extract::State, response::Response};
use serde::Serialize;

use crate::core::{app_state::AppState, http::response_envelope::ApiResponse};

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    /// Number of turns removed.
    pub cleared: usize,
}

pub async fn get_history(State(state): State<Arc<AppState>>) -> Response {
    let turns = state.session.lock().await.history().to_vec();
    ApiResponse::ok(HistoryResponse { turns })
}

/// Handler: DELETE /history ("Clear Chat").
pub async fn clear_history(State(state): State<Arc<AppState>>) -> Response {
    let cleared = {
        let mut session = state.session.lock().await;
        let n = session.history().len();
        session.clear();
        n
    };
    ApiResponse::ok(ClearResponse { cleared })
}
