//! Typed error for the contextor crate.

use ai_llm_service::{AiLlmError, OracleError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// The user message was empty or whitespace only.
    #[error("message is empty")]
    EmptyMessage,

    /// Final oracle failure after the retry policy gave up.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Embedding or other adapter failure outside the chat call.
    #[error(transparent)]
    Llm(#[from] AiLlmError),

    /// Invalid retrieval configuration.
    #[error("config error: {0}")]
    Config(String),
}
