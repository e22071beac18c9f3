//! Health service for the hosted LLM backend.
//!
//! Probe for Gemini: `GET {endpoint}/v1beta/models` with the API key header,
//! then a best-effort check that `models/{model}` is listed.
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a `/health` endpoint.
//! [`HealthService::check`] is resilient and never fails (errors mapped to `ok=false`).

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::AiLlmError;
use crate::services::gemini_service::GeminiService;

/// A serializable health snapshot for a single provider/config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "Gemini").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured latency in milliseconds for the probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    #[inline]
    fn new(
        cfg: &LlmModelConfig,
        ok: bool,
        latency_ms: u128,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: format!("{:?}", cfg.provider),
            endpoint: cfg.endpoint.clone(),
            model: Some(cfg.model.clone()),
            ok,
            latency_ms,
            message: message.into(),
        }
    }
}

/// Health checker with a bounded probe timeout.
pub struct HealthService {
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional probe timeout (seconds).
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));

        info!(
            default_timeout_secs = timeout.as_secs(),
            "HealthService initialized"
        );

        Ok(Self {
            default_timeout: timeout,
        })
    }

    /// Checks health for a single config.
    ///
    /// This method never returns an error; any failure becomes `ok: false`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Gemini => self.try_probe_gemini(cfg).await,
        };

        match result {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    model = %status.model.as_deref().unwrap_or("n/a"),
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status = HealthStatus::new(cfg, false, start.elapsed().as_millis(), err.to_string());
                warn!(
                    provider = %status.provider,
                    model = %status.model.as_deref().unwrap_or("n/a"),
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Checks health for multiple configs, in order.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    /// Strict Gemini probe. Returns an error on hard failures.
    async fn try_probe_gemini(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let mut probe_cfg = cfg.clone();
        probe_cfg.timeout_secs = Some(
            cfg.timeout_secs
                .unwrap_or(self.default_timeout.as_secs())
                .min(self.default_timeout.as_secs()),
        );
        let client = GeminiService::new(probe_cfg)?;

        let start = Instant::now();
        let models = client.list_models().await?;
        let latency = start.elapsed().as_millis();

        let wanted = format!("models/{}", cfg.model);
        let status = match models.iter().find(|m| m.name == wanted) {
            Some(m) if m.supports_generation() => HealthStatus::new(
                cfg,
                true,
                latency,
                "Gemini is healthy; model is available for generateContent",
            ),
            Some(_) => HealthStatus::new(cfg, true, latency, "Gemini is healthy; model is available"),
            None => HealthStatus::new(
                cfg,
                false,
                latency,
                "Gemini is up, but model not found in /v1beta/models",
            ),
        };
        Ok(status)
    }
}
