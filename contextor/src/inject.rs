//! Query augmentation: select records, then fold them into the prompt.

use directory_store::DirectoryRecord;
use tracing::debug;

use crate::{
    api_types::Injection,
    error::ContextorError,
    prompt::build_contextual_prompt,
    select::{KeywordPolicy, SelectionPolicy},
};

/// Default number of records a ranking policy may return.
pub const DEFAULT_TOP_K: usize = 3;

/// Pairs a selection policy with its `k`.
pub struct ContextInjector {
    policy: Box<dyn SelectionPolicy>,
    k: usize,
}

impl ContextInjector {
    pub fn new(policy: Box<dyn SelectionPolicy>, k: usize) -> Self {
        Self { policy, k }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Selects records for `query` and builds the outbound prompt.
    ///
    /// With no selected records the prompt is `query` unchanged.
    pub async fn inject(
        &self,
        query: &str,
        records: &[DirectoryRecord],
    ) -> Result<Injection, ContextorError> {
        let selected = self.policy.select(query, records, self.k).await?;
        debug!(
            policy = self.policy.name(),
            k = self.k,
            selected = selected.len(),
            "directory selection"
        );
        Ok(Injection {
            prompt: build_contextual_prompt(query, &selected),
            records: selected,
        })
    }
}

impl Default for ContextInjector {
    fn default() -> Self {
        Self::new(Box::new(KeywordPolicy::default()), DEFAULT_TOP_K)
    }
}
