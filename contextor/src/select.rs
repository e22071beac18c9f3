//! Record selection policies.
//!
//! A [`SelectionPolicy`] decides which directory records accompany a query:
//! - [`KeywordPolicy`]: whole directory whenever a trigger term matches
//! - [`CityPolicy`]: same, restricted to one city
//! - [`EmbeddingPolicy`]: top-k by cosine similarity of query vs. specialty

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use directory_store::DirectoryRecord;
use futures::future::try_join_all;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::{embed::EmbeddingsProvider, error::ContextorError, trigger::TriggerSet};

/// Minimum similarity (exclusive) for a record to be selected.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.2;

/// Future returned by [`SelectionPolicy::select`].
pub type SelectFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<DirectoryRecord>, ContextorError>> + Send + 'a>>;

/// Strategy choosing the records to attach to a query.
pub trait SelectionPolicy: Send + Sync {
    /// Returns the selected records in presentation order.
    ///
    /// `k` caps the result for ranking policies; filters may ignore it.
    fn select<'a>(
        &'a self,
        query: &'a str,
        records: &'a [DirectoryRecord],
        k: usize,
    ) -> SelectFuture<'a>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Returns every record when the query matches a trigger term.
#[derive(Clone, Debug, Default)]
pub struct KeywordPolicy {
    pub triggers: TriggerSet,
}

impl KeywordPolicy {
    pub fn new(triggers: TriggerSet) -> Self {
        Self { triggers }
    }
}

impl SelectionPolicy for KeywordPolicy {
    fn select<'a>(
        &'a self,
        query: &'a str,
        records: &'a [DirectoryRecord],
        _k: usize,
    ) -> SelectFuture<'a> {
        let out = if self.triggers.matches(query) {
            records.to_vec()
        } else {
            Vec::new()
        };
        Box::pin(async move { Ok(out) })
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

/// Keyword policy restricted to records whose `city` equals `city` exactly.
#[derive(Clone, Debug)]
pub struct CityPolicy {
    pub triggers: TriggerSet,
    pub city: String,
}

impl CityPolicy {
    pub fn new(triggers: TriggerSet, city: impl Into<String>) -> Self {
        Self {
            triggers,
            city: city.into(),
        }
    }
}

impl SelectionPolicy for CityPolicy {
    fn select<'a>(
        &'a self,
        query: &'a str,
        records: &'a [DirectoryRecord],
        _k: usize,
    ) -> SelectFuture<'a> {
        let out = if self.triggers.matches(query) {
            records
                .iter()
                .filter(|r| r.city.as_deref() == Some(self.city.as_str()))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        Box::pin(async move { Ok(out) })
    }

    fn name(&self) -> &'static str {
        "city"
    }
}

/// Ranks records by cosine similarity between the query and each specialty.
///
/// Specialty vectors are cached; the directory is static so they never go stale.
pub struct EmbeddingPolicy {
    provider: Arc<dyn EmbeddingsProvider>,
    threshold: f32,
    gate: Option<TriggerSet>,
    cache: RwLock<HashMap<String, Arc<Vec<f32>>>>,
}

impl EmbeddingPolicy {
    pub fn new(provider: Arc<dyn EmbeddingsProvider>) -> Self {
        Self {
            provider,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            gate: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Only rank when the query also matches `triggers`.
    pub fn with_trigger_gate(mut self, triggers: TriggerSet) -> Self {
        self.gate = Some(triggers);
        self
    }

    async fn specialty_vectors(
        &self,
        records: &[DirectoryRecord],
    ) -> Result<Vec<Arc<Vec<f32>>>, ContextorError> {
        let missing: Vec<&str> = {
            let cache = self.cache.read().await;
            let mut seen = Vec::new();
            for r in records {
                let s = r.specialty.as_str();
                if !cache.contains_key(s) && !seen.contains(&s) {
                    seen.push(s);
                }
            }
            seen
        };

        if !missing.is_empty() {
            debug!(count = missing.len(), "embedding directory specialties");
            let vectors = try_join_all(missing.iter().map(|s| self.provider.embed(s))).await?;
            let mut cache = self.cache.write().await;
            for (s, v) in missing.into_iter().zip(vectors) {
                cache.insert(s.to_string(), Arc::new(v));
            }
        }

        let cache = self.cache.read().await;
        records
            .iter()
            .map(|r| {
                cache.get(&r.specialty).cloned().ok_or_else(|| {
                    ContextorError::Config(format!("no vector cached for `{}`", r.specialty))
                })
            })
            .collect()
    }

    async fn rank(
        &self,
        query: &str,
        records: &[DirectoryRecord],
        k: usize,
    ) -> Result<Vec<DirectoryRecord>, ContextorError> {
        if k == 0 || records.is_empty() || query.trim().is_empty() {
            return Ok(Vec::new());
        }
        if let Some(gate) = &self.gate {
            if !gate.matches(query) {
                return Ok(Vec::new());
            }
        }

        let qvec = self.provider.embed(query).await?;
        let rvecs = self.specialty_vectors(records).await?;
        if let Some(bad) = rvecs.iter().find(|v| v.len() != qvec.len()) {
            warn!(
                query_dims = qvec.len(),
                specialty_dims = bad.len(),
                "embedding dimensions differ; dropping cached specialty vectors"
            );
            self.cache.write().await.clear();
            return Err(ContextorError::Config(format!(
                "embedding dimension mismatch: query has {}, specialty has {}",
                qvec.len(),
                bad.len()
            )));
        }

        let mut scored: Vec<(usize, f32)> = rvecs
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine(&qvec, v)))
            .filter(|&(_, s)| s > self.threshold)
            .collect();
        // Stable: equal scores keep directory order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        for (i, s) in &scored {
            trace!(name = %records[*i].name, score = s, "selected");
        }
        Ok(scored.into_iter().map(|(i, _)| records[i].clone()).collect())
    }
}

impl SelectionPolicy for EmbeddingPolicy {
    fn select<'a>(
        &'a self,
        query: &'a str,
        records: &'a [DirectoryRecord],
        k: usize,
    ) -> SelectFuture<'a> {
        Box::pin(self.rank(query, records, k))
    }

    fn name(&self) -> &'static str {
        "embedding"
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm.
///
/// Callers must pass vectors of equal length.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}
