use crate::config::llm_provider::LlmProvider;

/// Configuration for an LLM model invocation.
///
/// # Fields
///
/// - `provider`: Which LLM provider/backend to use.
/// - `model`: The model identifier (e.g., `"gemini-2.0-flash"`).
/// - `endpoint`: API base URL, without the version segment.
/// - `api_key`: API key sent with every request.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Optional request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Gemini,
///     model: "gemini-2.0-flash".to_string(),
///     endpoint: "https://generativelanguage.googleapis.com".to_string(),
///     api_key: Some("AIza...".to_string()),
///     max_tokens: Some(1024),
///     temperature: Some(0.7),
///     top_p: None,
///     timeout_secs: Some(60),
/// };
/// assert_eq!(cfg.model, "gemini-2.0-flash");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// API base URL.
    pub endpoint: String,

    /// API key for authentication.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
