//! Embedding provider seam used by the similarity policy.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::LlmServiceProfiles;

use crate::error::ContextorError;

/// Future returned by [`EmbeddingsProvider::embed`].
pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<f32>, ContextorError>> + Send + 'a>>;

/// Turns text into a fixed-length vector.
///
/// Implement this to plug in another backend (local model, fake in tests).
pub trait EmbeddingsProvider: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a>;
}

/// Uses the embedding profile of the shared LLM service.
#[derive(Clone)]
pub struct LlmEmbedder {
    svc: Arc<LlmServiceProfiles>,
}

impl LlmEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async move { Ok(self.svc.embed(text).await?) })
    }
}
