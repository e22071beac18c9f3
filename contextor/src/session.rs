//! Chat session: append-only conversation log plus the retrying oracle call.

use std::sync::Arc;

use ai_llm_service::{ConversationTurn, Oracle, OracleError, OracleRequest, RetryPolicy};
use directory_store::DirectoryRecord;
use tracing::{info, warn};

use crate::{
    api_types::{ChatReply, Injection},
    error::ContextorError,
    inject::ContextInjector,
    prompt::DEFAULT_SYSTEM,
};

/// Ordered user/assistant turns, oldest first.
///
/// Only whole exchanges are appended, so the log always alternates and
/// starts with a user turn.
#[derive(Clone, Debug, Default)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(ConversationTurn::user(user));
        self.turns.push(ConversationTurn::assistant(assistant));
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// One conversation with the oracle.
pub struct ChatSession {
    oracle: Arc<dyn Oracle>,
    injector: ContextInjector,
    records: Arc<[DirectoryRecord]>,
    system: String,
    retry: RetryPolicy,
    log: ConversationLog,
}

impl ChatSession {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        injector: ContextInjector,
        records: Arc<[DirectoryRecord]>,
    ) -> Self {
        Self {
            oracle,
            injector,
            records,
            system: DEFAULT_SYSTEM.trim().to_string(),
            retry: RetryPolicy::rate_limit_default(),
            log: ConversationLog::new(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = system.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sends one user message.
    ///
    /// The oracle sees the prior turns plus the (possibly augmented) message.
    /// On success the log gains `(user_text, reply)`; on failure it is left
    /// untouched and the final [`OracleError`] is returned.
    pub async fn send(&mut self, user_text: &str) -> Result<ChatReply, ContextorError> {
        if user_text.trim().is_empty() {
            return Err(ContextorError::EmptyMessage);
        }

        let Injection { prompt, records } = self.injector.inject(user_text, &self.records).await?;
        let request = OracleRequest {
            system_instruction: self.system.clone(),
            history: self.log.turns().to_vec(),
            message: prompt,
        };

        let oracle = self.oracle.as_ref();
        let req = &request;
        let outcome = self
            .retry
            .run(
                move || oracle.generate(req),
                |e: &OracleError| e.kind.is_retryable(),
            )
            .await;

        match outcome.result {
            Ok(reply) => {
                self.log.push_exchange(user_text, reply.text.clone());
                info!(
                    attempts = outcome.attempts,
                    context = records.len(),
                    turns = self.log.len(),
                    "chat exchange completed"
                );
                Ok(ChatReply {
                    reply: reply.text,
                    context: records,
                    attempts: outcome.attempts,
                })
            }
            Err(err) => {
                warn!(attempts = outcome.attempts, kind = ?err.kind, "chat exchange failed");
                Err(err.into())
            }
        }
    }

    /// Drops every turn ("Clear Chat").
    pub fn clear(&mut self) {
        self.log.clear();
        info!("conversation cleared");
    }

    pub fn history(&self) -> &[ConversationTurn] {
        self.log.turns()
    }

    pub fn records(&self) -> &[DirectoryRecord] {
        &self.records
    }

    pub fn policy_name(&self) -> &'static str {
        self.injector.policy_name()
    }
}
