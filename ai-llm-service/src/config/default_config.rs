//! Default LLM configs loaded from environment variables.
//!
//! Two roles are provided for the Gemini provider:
//!
//! - **Chat**      → the text-generation model answering the user
//! - **Embedding** → the model encoding queries and directory specialties
//!
//! # Environment variables
//!
//! - `GEMINI_API_KEY`   = API key (mandatory)
//! - `GEMINI_URL`       = API base URL (default `https://generativelanguage.googleapis.com`)
//! - `GEMINI_MODEL`     = chat model (default `gemini-2.0-flash`)
//! - `EMBEDDING_MODEL`  = embedding model (default `text-embedding-004`)
//! - `LLM_MAX_TOKENS`   = optional max output tokens (u32)
//! - `LLM_TEMPERATURE`  = optional sampling temperature (0.0..=2.0)
//! - `LLM_TIMEOUT_SECS` = request timeout (default 60)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, env_opt_f32, env_opt_u32, env_opt_u64, env_or, must_env,
        validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn gemini_endpoint() -> Result<String, AiLlmError> {
    let url = env_or("GEMINI_URL", DEFAULT_GEMINI_URL);
    validate_http_endpoint("GEMINI_URL", &url)?;
    Ok(url.trim_end_matches('/').to_string())
}

/// Constructs the config for the **chat** model.
///
/// # Errors
/// - [`crate::error_handler::ConfigError::MissingVar`] if `GEMINI_API_KEY` is unset
/// - [`crate::error_handler::ConfigError::InvalidNumber`] / `OutOfRange` on bad numeric knobs
pub fn config_gemini_chat() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = gemini_endpoint()?;
    let api_key = must_env("GEMINI_API_KEY")?;
    let model = env_or("GEMINI_MODEL", DEFAULT_CHAT_MODEL);
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let temperature = env_opt_f32("LLM_TEMPERATURE")?;
    if let Some(t) = temperature {
        validate_range_f32("temperature", t, 0.0, 2.0)?;
    }
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens,
        temperature,
        top_p: None,
        timeout_secs: Some(timeout_secs),
    })
}

/// Constructs the config for the **embedding** model.
///
/// # Defaults
/// - `temperature = Some(0.0)`
/// - `timeout_secs = Some(30)`
pub fn config_gemini_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = gemini_endpoint()?;
    let api_key = must_env("GEMINI_API_KEY")?;
    let model = env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL);

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(30),
    })
}
