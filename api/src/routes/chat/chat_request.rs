use serde::Deserialize;

/// Request payload for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Free-text user message.
    pub message: String,
}
