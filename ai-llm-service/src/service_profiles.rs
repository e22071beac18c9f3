//! Shared LLM service with two profiles: `chat` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (endpoint+model+key+timeout).
//! - Implements [`Oracle`] for the chat profile (one attempt per call).
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::config::default_config::{config_gemini_chat, config_gemini_embedding};
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::new(
//!     config_gemini_chat()?,
//!     Some(config_gemini_embedding()?),
//!     Some(10),
//! )?);
//!
//! let emb = svc.embed("Cardiologist").await?;
//! println!("Embedding dim = {}", emb.len());
//! # Ok(()) }
//! ```

use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::Arc,
};

use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, OracleError},
    health_service::{HealthService, HealthStatus},
    oracle::{Oracle, OracleFuture, OracleReply, OracleRequest},
    services::gemini_service::{GeminiModelInfo, GeminiService},
};

/// Shared service that manages the **chat** and **embedding** profiles.
pub struct LlmServiceProfiles {
    chat: LlmModelConfig,
    embedding: LlmModelConfig,

    gemini: RwLock<HashMap<ClientKey, Arc<GeminiService>>>,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates a new service.
    ///
    /// - `chat`: required generation profile.
    /// - `embedding_opt`: optional embedding profile; falls back to `chat`.
    /// - `health_timeout_secs`: optional timeout for the health checker.
    pub fn new(
        chat: LlmModelConfig,
        embedding_opt: Option<LlmModelConfig>,
        health_timeout_secs: Option<u64>,
    ) -> Result<Self, AiLlmError> {
        let embedding = embedding_opt.unwrap_or_else(|| chat.clone());

        Ok(Self {
            chat,
            embedding,
            gemini: RwLock::new(HashMap::new()),
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Generates text using the **chat** profile.
    pub async fn generate_chat(
        &self,
        system: Option<&str>,
        history: &[crate::oracle::ConversationTurn],
        message: &str,
    ) -> Result<String, AiLlmError> {
        match self.chat.provider {
            LlmProvider::Gemini => {
                let cli = self.get_or_init_gemini(&self.chat).await?;
                cli.generate(system, history, message).await
            }
        }
    }

    /// Computes embeddings using the **embedding** profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        match self.embedding.provider {
            LlmProvider::Gemini => {
                let cli = self.get_or_init_gemini(&self.embedding).await?;
                cli.embeddings(input).await
            }
        }
    }

    /// Lists models that support `generateContent` for the chat key.
    pub async fn generation_models(&self) -> Result<Vec<GeminiModelInfo>, AiLlmError> {
        let cli = self.get_or_init_gemini(&self.chat).await?;
        let models = cli.list_models().await?;
        Ok(models
            .into_iter()
            .filter(GeminiModelInfo::supports_generation)
            .collect())
    }

    /// Returns a health snapshot for all distinct profiles.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut list = vec![self.chat.clone()];
        if self.embedding != self.chat {
            list.push(self.embedding.clone());
        }
        self.health.check_many(&list).await
    }

    /// Returns references to the current profiles `(chat, embedding)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.chat, &self.embedding)
    }

    /* --------------------- Internals --------------------- */

    async fn get_or_init_gemini(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<GeminiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.gemini.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.gemini.write().await;
        if let Some(cli) = w.get(&key).cloned() {
            return Ok(cli);
        }
        debug!(model = %cfg.model, "creating Gemini client");
        let cli = Arc::new(GeminiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

impl Oracle for LlmServiceProfiles {
    fn generate<'a>(&'a self, request: &'a OracleRequest) -> OracleFuture<'a> {
        Box::pin(async move {
            let text = self
                .generate_chat(
                    Some(request.system_instruction.as_str()),
                    &request.history,
                    &request.message,
                )
                .await
                .map_err(OracleError::from)?;
            Ok(OracleReply { text })
        })
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

impl Hash for ClientKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.endpoint.hash(state);
        self.model.hash(state);
        self.api_key.hash(state);
        self.timeout.hash(state);
    }
}
