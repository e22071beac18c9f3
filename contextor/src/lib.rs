//! Context injection and the chat session for the healthcare assistant.
//!
//! A user message is checked against trigger terms, a [`SelectionPolicy`]
//! picks directory records, and the records are appended to the outbound
//! message as a bracketed note. [`ChatSession`] owns the conversation log and
//! calls the oracle under a retry policy.

pub mod cfg;
pub mod embed;
mod error;
pub mod inject;
pub mod prompt;
pub mod select;
pub mod session;
pub mod trigger;

mod api_types;

pub use api_types::{ChatReply, Injection};
pub use cfg::{ContextorConfig, PolicyKind};
pub use embed::{EmbeddingsProvider, LlmEmbedder};
pub use error::ContextorError;
pub use inject::ContextInjector;
pub use prompt::{DEFAULT_SYSTEM, build_contextual_prompt, format_addendum};
pub use select::{CityPolicy, EmbeddingPolicy, KeywordPolicy, SelectionPolicy};
pub use session::{ChatSession, ConversationLog};
pub use trigger::{DEFAULT_TRIGGER_TERMS, TriggerSet, matches};

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use directory_store::DirectoryRecord;
use tracing::info;

/// Builds a [`ChatSession`] over the shared LLM service using env config.
///
/// # Errors
/// Propagates `ContextorError::Config` from [`ContextorConfig::from_env`].
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use ai_llm_service::{LlmServiceProfiles, config::default_config::config_gemini_chat};
/// # use directory_store::SeedSet;
/// # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let svc = Arc::new(LlmServiceProfiles::new(config_gemini_chat()?, None, None)?);
/// let mut session = contextor::session_from_env(svc, SeedSet::Clinics.records().into())?;
/// let reply = session.send("Find a cardiologist").await?;
/// println!("{}", reply.reply);
/// # Ok(()) }
/// ```
pub fn session_from_env(
    svc: Arc<LlmServiceProfiles>,
    records: Arc<[DirectoryRecord]>,
) -> Result<ChatSession, ContextorError> {
    let cfg = ContextorConfig::from_env()?;

    let embedder: Option<Arc<dyn EmbeddingsProvider>> = match cfg.policy {
        PolicyKind::Embedding => Some(Arc::new(LlmEmbedder::new(svc.clone()))),
        _ => None,
    };
    let injector = cfg.build_injector(embedder)?;

    info!(
        policy = injector.policy_name(),
        top_k = cfg.top_k,
        records = records.len(),
        max_attempts = cfg.retry.max_attempts,
        "chat session configured"
    );

    Ok(ChatSession::new(svc, injector, records).with_retry(cfg.retry))
}
