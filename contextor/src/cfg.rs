//! Runtime configuration loaded from environment variables.

use std::{str::FromStr, sync::Arc, time::Duration};

use ai_llm_service::{Backoff, RetryPolicy};

use crate::{
    embed::EmbeddingsProvider,
    error::ContextorError,
    inject::{ContextInjector, DEFAULT_TOP_K},
    select::{
        CityPolicy, DEFAULT_SIMILARITY_THRESHOLD, EmbeddingPolicy, KeywordPolicy, SelectionPolicy,
    },
    trigger::TriggerSet,
};

/// Which [`SelectionPolicy`] to build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    Keyword,
    City,
    Embedding,
}

impl FromStr for PolicyKind {
    type Err = ContextorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "city" => Ok(Self::City),
            "embedding" => Ok(Self::Embedding),
            other => Err(ContextorError::Config(format!(
                "RETRIEVAL_POLICY: unknown policy `{other}` (keyword|city|embedding)"
            ))),
        }
    }
}

/// Retrieval and retry knobs. All fields have defaults via `from_env`.
#[derive(Clone, Debug)]
pub struct ContextorConfig {
    pub policy: PolicyKind,
    pub city: Option<String>,
    pub top_k: usize,
    pub threshold: f32,
    pub triggers: TriggerSet,
    /// Embedding policy only ranks queries that also match a trigger term.
    pub trigger_gate: bool,
    pub retry: RetryPolicy,
}

impl Default for ContextorConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::Keyword,
            city: None,
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            triggers: TriggerSet::default(),
            trigger_gate: false,
            retry: RetryPolicy::rate_limit_default(),
        }
    }
}

impl ContextorConfig {
    /// Build from environment variables with defaults.
    ///
    /// # Errors
    /// Returns `ContextorError::Config` for unparsable values.
    pub fn from_env() -> Result<Self, ContextorError> {
        let dflt = Self::default();

        let policy = match var("RETRIEVAL_POLICY") {
            Some(v) => v.parse()?,
            None => dflt.policy,
        };
        let triggers = var("TRIGGER_TERMS")
            .map(|v| TriggerSet::from_csv(&v))
            .unwrap_or(dflt.triggers);

        let max_attempts: u32 = parse("RETRY_MAX_ATTEMPTS", dflt.retry.max_attempts)?;
        let step_secs: u64 = parse("RETRY_STEP_SECS", 10)?;

        let cfg = Self {
            policy,
            city: var("RETRIEVAL_CITY"),
            top_k: parse("RETRIEVAL_TOP_K", dflt.top_k)?,
            threshold: parse("RETRIEVAL_THRESHOLD", dflt.threshold)?,
            triggers,
            trigger_gate: parse("RETRIEVAL_TRIGGER_GATE", dflt.trigger_gate)?,
            retry: RetryPolicy {
                max_attempts: max_attempts.max(1),
                backoff: Backoff::Linear {
                    step: Duration::from_secs(step_secs),
                },
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ContextorError> {
        if !self.threshold.is_finite() || !(-1.0..=1.0).contains(&self.threshold) {
            return Err(ContextorError::Config(format!(
                "RETRIEVAL_THRESHOLD must be within [-1, 1], got {}",
                self.threshold
            )));
        }
        if self.policy == PolicyKind::City && self.city.is_none() {
            return Err(ContextorError::Config(
                "RETRIEVAL_CITY is required for the city policy".into(),
            ));
        }
        Ok(())
    }

    /// Builds the configured policy. `embedder` is only used by the embedding policy.
    pub fn build_policy(
        &self,
        embedder: Option<Arc<dyn EmbeddingsProvider>>,
    ) -> Result<Box<dyn SelectionPolicy>, ContextorError> {
        let policy: Box<dyn SelectionPolicy> = match self.policy {
            PolicyKind::Keyword => Box::new(KeywordPolicy::new(self.triggers.clone())),
            PolicyKind::City => {
                let city = self.city.clone().ok_or_else(|| {
                    ContextorError::Config("RETRIEVAL_CITY is required for the city policy".into())
                })?;
                Box::new(CityPolicy::new(self.triggers.clone(), city))
            }
            PolicyKind::Embedding => {
                let provider = embedder.ok_or_else(|| {
                    ContextorError::Config("embedding policy needs an embeddings provider".into())
                })?;
                let mut p = EmbeddingPolicy::new(provider).with_threshold(self.threshold);
                if self.trigger_gate {
                    p = p.with_trigger_gate(self.triggers.clone());
                }
                Box::new(p)
            }
        };
        Ok(policy)
    }

    pub fn build_injector(
        &self,
        embedder: Option<Arc<dyn EmbeddingsProvider>>,
    ) -> Result<ContextInjector, ContextorError> {
        Ok(ContextInjector::new(self.build_policy(embedder)?, self.top_k))
    }
}

fn var(k: &str) -> Option<String> {
    std::env::var(k)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse<T: FromStr>(k: &str, dflt: T) -> Result<T, ContextorError> {
    match var(k) {
        Some(v) => v
            .parse()
            .map_err(|_| ContextorError::Config(format!("{k}: cannot parse `{v}`"))),
        None => Ok(dflt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_names_parse() {
        assert_eq!("Keyword".parse::<PolicyKind>().unwrap(), PolicyKind::Keyword);
        assert_eq!(" embedding ".parse::<PolicyKind>().unwrap(), PolicyKind::Embedding);
        assert!("mmr".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn city_policy_requires_a_city() {
        let cfg = ContextorConfig {
            policy: PolicyKind::City,
            ..ContextorConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert!(cfg.build_policy(None).is_err());

        let cfg = ContextorConfig {
            city: Some("Mumbai".into()),
            ..cfg
        };
        assert_eq!(cfg.build_policy(None).unwrap().name(), "city");
    }

    #[test]
    fn embedding_policy_requires_a_provider() {
        let cfg = ContextorConfig {
            policy: PolicyKind::Embedding,
            ..ContextorConfig::default()
        };
        assert!(cfg.build_injector(None).is_err());
    }

    #[test]
    fn defaults_match_rate_limit_policy() {
        let cfg = ContextorConfig::default();
        assert_eq!(cfg.top_k, 3);
        assert_eq!(cfg.retry, RetryPolicy::rate_limit_default());
        assert!(cfg.validate().is_ok());
    }
}
