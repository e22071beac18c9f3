//! Oracle adapter for the hosted Gemini API.
//!
//! Exposes the [`oracle::Oracle`] seam used by the chat session, the
//! structured error taxonomy, a reusable retry policy, embeddings, model
//! listing, health probes and the telemetry layer.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod oracle;
pub mod retry;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use error_handler::{AiLlmError, OracleError, OracleErrorKind};
pub use oracle::{ConversationTurn, Oracle, OracleFuture, OracleReply, OracleRequest, Role};
pub use retry::{Backoff, RetryOutcome, RetryPolicy, with_retry};
pub use service_profiles::LlmServiceProfiles;
