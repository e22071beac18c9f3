//! Google Gemini service for chat generation, embeddings and model listing.
//!
//! Minimal, non-streaming client around the Generative Language REST API.
//! Endpoints are derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1beta/models/{model}:generateContent: chat completion
//! - POST {endpoint}/v1beta/models/{model}:embedContent   : embeddings
//! - GET  {endpoint}/v1beta/models                        : model listing
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::Gemini`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://
//!
//! The key travels in the `x-goog-api-key` header so it never shows up in URLs
//! or logs.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
    oracle::{ConversationTurn, Role},
};

const API_VERSION: &str = "v1beta";

/// Thin client for the Gemini API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    base: String,
}

/// Model descriptor returned by [`GeminiService::list_models`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeminiModelInfo {
    /// Fully qualified name, e.g. `models/gemini-2.0-flash`.
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl GeminiModelInfo {
    /// Whether the model can answer `generateContent` calls.
    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - [`ProviderErrorKind::InvalidProvider`] if `cfg.provider` is not Gemini
    /// - [`ProviderErrorKind::MissingApiKey`] if `cfg.api_key` is `None` or blank
    /// - [`ProviderErrorKind::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(
                ProviderError::new(Provider::Gemini, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::new(Provider::Gemini, ProviderErrorKind::MissingApiKey))?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        let mut key_value = header::HeaderValue::from_str(api_key).map_err(|e| {
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;
        key_value.set_sensitive(true);
        headers.insert("x-goog-api-key", key_value);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = format!("{}/{}", endpoint.trim_end_matches('/'), API_VERSION);

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "GeminiService initialized"
        );

        Ok(Self { client, cfg, base })
    }

    /// Performs a **non-streaming** `generateContent` call.
    ///
    /// `history` is sent as prior `contents` (assistant turns use the `model`
    /// role), followed by `message` as the final user turn.
    ///
    /// # Errors
    /// - [`ProviderErrorKind::HttpStatus`] for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`ProviderErrorKind::Decode`] if the JSON cannot be parsed
    /// - [`ProviderErrorKind::EmptyCandidates`] if no text is returned
    pub async fn generate(
        &self,
        system: Option<&str>,
        history: &[ConversationTurn],
        message: &str,
    ) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let url = format!("{}/models/{}:generateContent", self.base, self.cfg.model);
        let body = GenerateRequest::from_cfg(&self.cfg, system, history, message);

        debug!(
            model = %self.cfg.model,
            history_len = history.len(),
            message_len = message.len(),
            has_system = system.is_some(),
            "POST {}", url
        );

        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(self.status_error(resp, url, started).await);
        }

        let out: GenerateResponse = resp.json().await.map_err(|e| {
            error!(
                error = %e,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode generateContent response"
            );
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `candidates[0].content.parts[].text`"
                )),
            )
        })?;

        let text = out
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::new(Provider::Gemini, ProviderErrorKind::EmptyCandidates)
            })?;

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            reply_len = text.len(),
            "generateContent completed"
        );

        Ok(text)
    }

    /// Retrieves a single embeddings vector via `embedContent`.
    ///
    /// # Errors
    /// Same classes as [`GeminiService::generate`].
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let started = Instant::now();
        let url = format!("{}/models/{}:embedContent", self.base, self.cfg.model);
        let model = format!("models/{}", self.cfg.model);
        let body = EmbedRequest {
            model: &model,
            content: Content {
                role: None,
                parts: vec![Part { text: input }],
            },
        };

        debug!(
            model = %self.cfg.model,
            input_len = input.len(),
            "POST {}", url
        );

        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(self.status_error(resp, url, started).await);
        }

        let out: EmbedResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `embedding.values`")),
            )
        })?;

        debug!(
            model = %self.cfg.model,
            dim = out.embedding.values.len(),
            latency_ms = started.elapsed().as_millis(),
            "embedContent completed"
        );

        Ok(out.embedding.values)
    }

    /// Lists the models visible to the configured key (first page, up to 1000).
    pub async fn list_models(&self) -> Result<Vec<GeminiModelInfo>, AiLlmError> {
        let started = Instant::now();
        let url = format!("{}/models", self.base);

        debug!(endpoint = %self.cfg.endpoint, "GET {}", url);

        let resp = self
            .client
            .get(&url)
            .query(&[("pageSize", "1000")])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(self.status_error(resp, url, started).await);
        }

        let out: ListModelsResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `models[]`")),
            )
        })?;

        Ok(out.models)
    }

    /// Reads a non-success response into a classified provider error.
    async fn status_error(
        &self,
        resp: reqwest::Response,
        url: String,
        started: Instant,
    ) -> AiLlmError {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let api_status = serde_json::from_str::<ErrorEnvelope>(&text)
            .ok()
            .and_then(|e| e.error.status);
        let snippet = make_snippet(&text);

        error!(
            %status,
            %url,
            api_status = api_status.as_deref().unwrap_or("n/a"),
            %snippet,
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "Gemini returned non-success status"
        );

        ProviderError::new(
            Provider::Gemini,
            ProviderErrorKind::HttpStatus {
                http: HttpError {
                    status,
                    url,
                    snippet,
                },
                api_status,
            },
        )
        .into()
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl<'a> GenerateRequest<'a> {
    fn from_cfg(
        cfg: &LlmModelConfig,
        system: Option<&'a str>,
        history: &'a [ConversationTurn],
        message: &'a str,
    ) -> Self {
        let mut contents = Vec::with_capacity(history.len() + 1);
        for turn in history {
            contents.push(Content {
                role: Some(match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                }),
                parts: vec![Part { text: &turn.text }],
            });
        }
        contents.push(Content {
            role: Some("user"),
            parts: vec![Part { text: message }],
        });

        let generation_config = if cfg.temperature.is_some()
            || cfg.top_p.is_some()
            || cfg.max_tokens.is_some()
        {
            Some(GenerationConfig {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                max_output_tokens: cfg.max_tokens,
            })
        } else {
            None
        };

        Self {
            system_instruction: system
                .filter(|s| !s.trim().is_empty())
                .map(|s| Content {
                    role: None,
                    parts: vec![Part { text: s }],
                }),
            contents,
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModelInfo>,
}

/// `{ "error": { "code": 429, "message": "...", "status": "RESOURCE_EXHAUSTED" } }`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::OracleErrorKind;
    use mockito::Matcher;
    use serde_json::json;

    fn cfg(endpoint: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-2.0-flash".into(),
            endpoint: endpoint.into(),
            api_key: Some("test-key".into()),
            max_tokens: Some(256),
            temperature: Some(0.4),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn rejects_missing_key_and_bad_endpoint() {
        let mut c = cfg("http://localhost");
        c.api_key = Some("  ".into());
        let err = GeminiService::new(c).unwrap_err();
        assert_eq!(err.oracle_kind(), OracleErrorKind::InvalidCredential);

        let err = GeminiService::new(cfg("ftp://nope")).unwrap_err();
        assert!(err.to_string().contains("invalid endpoint"));
    }

    #[test]
    fn request_maps_assistant_to_model_role() {
        let c = cfg("http://localhost");
        let history = vec![
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("hello"),
        ];
        let body = GenerateRequest::from_cfg(&c, Some("be careful"), &history, "I have a headache");
        let v = serde_json::to_value(&body).unwrap();

        assert_eq!(v["systemInstruction"]["parts"][0]["text"], "be careful");
        assert_eq!(v["contents"][0]["role"], "user");
        assert_eq!(v["contents"][1]["role"], "model");
        assert_eq!(v["contents"][2]["parts"][0]["text"], "I have a headache");
        assert_eq!(v["generationConfig"]["maxOutputTokens"], 256);
        assert!(v["generationConfig"].get("topP").is_none());
    }

    #[tokio::test]
    async fn generate_joins_candidate_parts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "ping" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "candidates": [{
                        "content": { "role": "model", "parts": [{ "text": "po" }, { "text": "ng" }] }
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let svc = GeminiService::new(cfg(&server.url())).unwrap();
        let out = svc.generate(None, &[], "ping").await.unwrap();

        assert_eq!(out, "pong");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limit_body_is_classified() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .with_status(429)
            .with_body(
                json!({
                    "error": { "code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let svc = GeminiService::new(cfg(&server.url())).unwrap();
        let err = svc.generate(None, &[], "ping").await.unwrap_err();

        assert_eq!(err.oracle_kind(), OracleErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn empty_candidates_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1beta/models/gemini-2.0-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let svc = GeminiService::new(cfg(&server.url())).unwrap();
        let err = svc.generate(None, &[], "ping").await.unwrap_err();

        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::EmptyCandidates,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn list_models_keeps_generation_flags() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1beta/models")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "models": [
                        { "name": "models/gemini-2.0-flash", "supportedGenerationMethods": ["generateContent", "countTokens"] },
                        { "name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"] }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let svc = GeminiService::new(cfg(&server.url())).unwrap();
        let models = svc.list_models().await.unwrap();

        assert_eq!(models.len(), 2);
        assert!(models[0].supports_generation());
        assert!(!models[1].supports_generation());
    }
}
