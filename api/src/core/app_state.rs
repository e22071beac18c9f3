use std::sync::Arc;

use ai_llm_service::{
    LlmServiceProfiles,
    config::default_config::{config_gemini_chat, config_gemini_embedding},
};
use contextor::ChatSession;
use directory_store::{DirectoryConfig, DirectoryRecord, DirectoryStore};
use tokio::sync::Mutex;
use tracing::info;

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// The single conversation served by this process.
    pub session: Mutex<ChatSession>,
    /// Directory loaded at startup; read-only afterwards.
    pub directory: Arc<[DirectoryRecord]>,
    /// LLM profiles, used for health probes and model listing.
    pub llm: Arc<LlmServiceProfiles>,
}

impl AppState {
    pub fn new(
        session: ChatSession,
        directory: Arc<[DirectoryRecord]>,
        llm: Arc<LlmServiceProfiles>,
    ) -> Self {
        Self {
            session: Mutex::new(session),
            directory,
            llm,
        }
    }

    /// Loads the directory, builds the LLM profiles and the chat session from env.
    pub async fn from_env() -> Result<Self, AppError> {
        let dir_cfg = DirectoryConfig::from_env()?;
        let directory: Arc<[DirectoryRecord]> = DirectoryStore::bootstrap_async(dir_cfg).await?.into();

        let llm = Arc::new(LlmServiceProfiles::new(
            config_gemini_chat()?,
            Some(config_gemini_embedding()?),
            None,
        )?);
        let session = contextor::session_from_env(llm.clone(), directory.clone())?;

        info!(
            records = directory.len(),
            policy = session.policy_name(),
            "application state ready"
        );
        Ok(Self::new(session, directory, llm))
    }
}
