//! The text-generation oracle seam.
//!
//! Application code talks to the hosted model only through [`Oracle`]: one
//! request carrying the system instruction, the prior conversation and the new
//! message, answered by plain text or a structured [`OracleError`].

use std::{future::Future, pin::Pin};

use serde::{Deserialize, Serialize};

use crate::error_handler::OracleError;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// A single request to the oracle.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub system_instruction: String,
    /// Turns accumulated so far, oldest first.
    pub history: Vec<ConversationTurn>,
    /// The pending user message (possibly augmented with context).
    pub message: String,
}

/// Successful oracle answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleReply {
    pub text: String,
}

/// Future type returned by [`Oracle::generate`].
pub type OracleFuture<'a> =
    Pin<Box<dyn Future<Output = Result<OracleReply, OracleError>> + Send + 'a>>;

/// Opaque request/response text-generation service.
///
/// Implementations perform exactly one attempt per call; retrying is the
/// caller's policy (see [`crate::retry`]).
pub trait Oracle: Send + Sync {
    fn generate<'a>(&'a self, request: &'a OracleRequest) -> OracleFuture<'a>;
}
