//! POST /chat: one exchange with the assistant.

use std::sync::Arc;

use axum::{Json, extract::State, response::Response};
use tracing::debug;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse},
    error_handler::AppResult,
    routes::chat::chat_request::ChatRequest,
};

/// Handler: POST /chat
///
/// The session lock is held for the whole exchange, including retry pauses,
/// so concurrent messages are answered in arrival order.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/chat \
///   -H 'content-type: application/json' \
///   -d '{"message":"Find a cardiologist"}'
/// ```
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Response> {
    debug!(chars = body.message.chars().count(), "chat: start");

    let reply = {
        let mut session = state.session.lock().await;
        session.send(&body.message).await?
    };

    debug!(
        attempts = reply.attempts,
        context = reply.context.len(),
        "chat: success"
    );
    Ok(ApiResponse::ok(reply))
}
