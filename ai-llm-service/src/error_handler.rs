//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a single top-level error type [`AiLlmError`] for the whole
//! library, and groups domain-specific errors in nested enums (e.g., [`ConfigError`],
//! [`HealthError`], [`ProviderError`]). Small helpers for reading/validating
//! environment variables are provided and return the unified [`Result<T>`] alias.
//!
//! The oracle-facing taxonomy ([`OracleErrorKind`]) is derived from these errors
//! exactly once, in [`AiLlmError::oracle_kind`]. Callers never inspect message
//! strings to decide whether to retry.
//!
//! All messages include the suffix `[AI LLM Service]` to simplify attribution in logs.

use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Health-check/connectivity/decoding errors.
    #[error(transparent)]
    Health(#[from] HealthError),

    /// Errors reported by (or while talking to) a concrete provider.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl AiLlmError {
    /// Maps this error onto the oracle taxonomy.
    ///
    /// This is the only place where provider/transport failures are classified.
    pub fn oracle_kind(&self) -> OracleErrorKind {
        match self {
            AiLlmError::Provider(p) => p.kind.oracle_kind(),
            AiLlmError::HttpTransport(e) => {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    OracleErrorKind::Unavailable
                } else if let Some(status) = e.status() {
                    classify_status(status)
                } else {
                    OracleErrorKind::Unknown
                }
            }
            AiLlmError::Timeout(_) => OracleErrorKind::Unavailable,
            AiLlmError::Health(HealthError::HttpStatus(http)) => classify_status(http.status),
            AiLlmError::Config(ConfigError::MissingVar("GEMINI_API_KEY")) => {
                OracleErrorKind::InvalidCredential
            }
            AiLlmError::Config(_) | AiLlmError::Health(_) => OracleErrorKind::Unknown,
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_TOKENS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `GEMINI_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        /// Field name (e.g., `temperature`).
        field: &'static str,
        /// Description of the expected range.
        detail: &'static str,
    },

    /// Model name was empty or invalid.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Health errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for provider health checks.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HealthError {
    /// The endpoint is empty or does not start with http/https.
    #[error("[AI LLM Service] invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Upstream returned a non-successful HTTP status.
    #[error("[AI LLM Service] {0}")]
    HttpStatus(HttpError),

    /// Response payload could not be decoded as expected.
    #[error("[AI LLM Service] decode error: {0}")]
    Decode(String),
}

/// Non-success HTTP response captured for diagnostics.
#[derive(Debug, Clone)]
pub struct HttpError {
    /// Numeric HTTP status code.
    pub status: StatusCode,
    /// Request URL (without credentials).
    pub url: String,
    /// Short snippet of the response body (trimmed).
    pub snippet: String,
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {} from {}: {}", self.status, self.url, self.snippet)
    }
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Which backend produced a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

/// Error raised by a concrete provider client.
#[derive(Debug, Error)]
#[error("[AI LLM Service] {provider:?}: {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// Detailed reason of a [`ProviderError`].
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    /// Config was built for another provider.
    #[error("config targets a different provider")]
    InvalidProvider,

    /// No API key was configured.
    #[error("missing API key")]
    MissingApiKey,

    /// Endpoint is empty or lacks an http/https scheme.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Upstream answered with a non-success status.
    ///
    /// `api_status` carries Google's canonical status string (e.g.
    /// `RESOURCE_EXHAUSTED`) when the body could be decoded.
    #[error("{http} (api status: {})", .api_status.as_deref().unwrap_or("n/a"))]
    HttpStatus {
        http: HttpError,
        api_status: Option<String>,
    },

    /// Response payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The model returned no usable candidate text.
    #[error("response contained no candidates")]
    EmptyCandidates,
}

impl ProviderErrorKind {
    fn oracle_kind(&self) -> OracleErrorKind {
        match self {
            ProviderErrorKind::MissingApiKey => OracleErrorKind::InvalidCredential,
            ProviderErrorKind::HttpStatus { http, api_status } => {
                // Google reports rejected keys as INVALID_ARGUMENT with an
                // API_KEY_INVALID reason, so the body is checked first.
                let by_body = if http.snippet.contains("API_KEY_INVALID")
                    || http.snippet.contains("API key not valid")
                {
                    Some(OracleErrorKind::InvalidCredential)
                } else {
                    None
                };
                by_body
                    .or_else(|| api_status.as_deref().and_then(classify_api_status))
                    .unwrap_or_else(|| classify_status(http.status))
            }
            ProviderErrorKind::InvalidProvider
            | ProviderErrorKind::InvalidEndpoint(_)
            | ProviderErrorKind::Decode(_)
            | ProviderErrorKind::EmptyCandidates => OracleErrorKind::Unknown,
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Oracle taxonomy                                                           */
/* ------------------------------------------------------------------------- */

/// Structured failure categories of the text-generation oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleErrorKind {
    /// Quota/rate limit hit; the only retryable kind.
    RateLimited,
    /// API key missing, invalid or lacking permission.
    InvalidCredential,
    /// The request itself was rejected.
    InvalidArgument,
    /// Upstream unreachable or temporarily failing.
    Unavailable,
    Unknown,
}

impl OracleErrorKind {
    /// Whether another attempt may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, OracleErrorKind::RateLimited)
    }

    /// Fixed user-facing text for this failure.
    pub fn user_message(self) -> &'static str {
        match self {
            OracleErrorKind::RateLimited => {
                "Still rate limited. Please wait 1 minute and try again."
            }
            OracleErrorKind::InvalidCredential => {
                "The assistant is not configured with a valid API key. Please contact the administrator."
            }
            OracleErrorKind::InvalidArgument => "Invalid request. Please rephrase your message.",
            OracleErrorKind::Unavailable | OracleErrorKind::Unknown => {
                "Something went wrong. Please try again."
            }
        }
    }
}

/// Error returned by an [`crate::oracle::Oracle`].
#[derive(Debug, Clone, Error)]
#[error("oracle error ({kind:?}): {message}")]
pub struct OracleError {
    pub kind: OracleErrorKind,
    pub message: String,
}

impl OracleError {
    pub fn new(kind: OracleErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<AiLlmError> for OracleError {
    fn from(err: AiLlmError) -> Self {
        Self {
            kind: err.oracle_kind(),
            message: err.to_string(),
        }
    }
}

fn classify_api_status(status: &str) -> Option<OracleErrorKind> {
    match status {
        "RESOURCE_EXHAUSTED" => Some(OracleErrorKind::RateLimited),
        "UNAUTHENTICATED" | "PERMISSION_DENIED" => Some(OracleErrorKind::InvalidCredential),
        "INVALID_ARGUMENT" | "FAILED_PRECONDITION" | "OUT_OF_RANGE" => {
            Some(OracleErrorKind::InvalidArgument)
        }
        "UNAVAILABLE" | "DEADLINE_EXCEEDED" | "INTERNAL" => Some(OracleErrorKind::Unavailable),
        _ => None,
    }
}

fn classify_status(status: StatusCode) -> OracleErrorKind {
    match status.as_u16() {
        429 => OracleErrorKind::RateLimited,
        401 | 403 => OracleErrorKind::InvalidCredential,
        400 => OracleErrorKind::InvalidArgument,
        500 | 502 | 503 | 504 => OracleErrorKind::Unavailable,
        _ => OracleErrorKind::Unknown,
    }
}

/// Trims and clamps a response body for logs and error messages.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 300;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        return trimmed.to_string();
    }
    let mut end = MAX;
    while end > 0 && !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &trimmed[..end])
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`AiLlmError::Config`] with [`ConfigError::MissingVar`] if the
/// variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Reads an optional environment variable, falling back to `default`.
pub fn env_or(name: &'static str, default: &str) -> String {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u32`.
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<u32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<u64>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        _ => Ok(None),
    }
}

/// Parses an optional `f32` from env (`Ok(None)` if unset/empty).
pub fn env_opt_f32(name: &'static str) -> Result<Option<f32>> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse::<f32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected f32",
            })
        }),
        _ => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start with
/// a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_err(code: u16, api_status: Option<&str>, snippet: &str) -> AiLlmError {
        ProviderError::new(
            Provider::Gemini,
            ProviderErrorKind::HttpStatus {
                http: HttpError {
                    status: StatusCode::from_u16(code).unwrap(),
                    url: "http://localhost/v1beta/models/x:generateContent".into(),
                    snippet: snippet.into(),
                },
                api_status: api_status.map(str::to_string),
            },
        )
        .into()
    }

    #[test]
    fn api_status_wins_over_http_code() {
        let err = http_err(400, Some("RESOURCE_EXHAUSTED"), "quota");
        assert_eq!(err.oracle_kind(), OracleErrorKind::RateLimited);
    }

    #[test]
    fn falls_back_to_http_code() {
        assert_eq!(
            http_err(429, None, "").oracle_kind(),
            OracleErrorKind::RateLimited
        );
        assert_eq!(
            http_err(503, None, "").oracle_kind(),
            OracleErrorKind::Unavailable
        );
        assert_eq!(
            http_err(418, None, "").oracle_kind(),
            OracleErrorKind::Unknown
        );
    }

    #[test]
    fn invalid_key_reported_as_bad_request_is_a_credential_error() {
        let err = http_err(
            400,
            Some("INVALID_ARGUMENT"),
            "API key not valid. Please pass a valid API key.",
        );
        assert_eq!(err.oracle_kind(), OracleErrorKind::InvalidCredential);

        let err = http_err(400, Some("INVALID_ARGUMENT"), "contents is empty");
        assert_eq!(err.oracle_kind(), OracleErrorKind::InvalidArgument);
    }

    #[test]
    fn only_rate_limit_is_retryable() {
        assert!(OracleErrorKind::RateLimited.is_retryable());
        for kind in [
            OracleErrorKind::InvalidCredential,
            OracleErrorKind::InvalidArgument,
            OracleErrorKind::Unavailable,
            OracleErrorKind::Unknown,
        ] {
            assert!(!kind.is_retryable(), "{kind:?}");
        }
    }

    #[test]
    fn snippet_is_clamped_on_char_boundary() {
        let long = "é".repeat(400);
        let s = make_snippet(&long);
        assert!(s.ends_with('…'));
        assert!(s.len() <= 300 + '…'.len_utf8());
    }
}
