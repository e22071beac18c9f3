use ai_llm_service::{AiLlmError, OracleError, OracleErrorKind};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use directory_store::DirectoryError;
use thiserror::Error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    // --- IO / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Oracle failure surfaced to the client with a fixed user-facing text.
    #[error("{message}")]
    Oracle {
        kind: OracleErrorKind,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Llm(e) => oracle_status(e.oracle_kind()),
            AppError::Oracle { kind, .. } => oracle_status(*kind),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Directory(_) => "DIRECTORY_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Llm(e) => oracle_code(e.oracle_kind()),
            AppError::Oracle { kind, .. } => oracle_code(*kind),
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Llm(e) => e.oracle_kind().user_message().to_string(),
            other => other.to_string(),
        }
    }
}

fn oracle_status(kind: OracleErrorKind) -> StatusCode {
    match kind {
        OracleErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        OracleErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        OracleErrorKind::InvalidCredential => StatusCode::BAD_GATEWAY,
        OracleErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        OracleErrorKind::Unknown => StatusCode::BAD_GATEWAY,
    }
}

fn oracle_code(kind: OracleErrorKind) -> &'static str {
    match kind {
        OracleErrorKind::RateLimited => "RATE_LIMITED",
        OracleErrorKind::InvalidArgument => "INVALID_ARGUMENT",
        OracleErrorKind::InvalidCredential => "INVALID_CREDENTIAL",
        OracleErrorKind::Unavailable => "ORACLE_UNAVAILABLE",
        OracleErrorKind::Unknown => "ORACLE_ERROR",
    }
}

impl From<OracleError> for AppError {
    fn from(err: OracleError) -> Self {
        AppError::Oracle {
            kind: err.kind,
            message: err.kind.user_message().to_string(),
        }
    }
}

impl From<ContextorError> for AppError {
    fn from(err: ContextorError) -> Self {
        match err {
            ContextorError::EmptyMessage => AppError::BadRequest("message must not be empty".into()),
            ContextorError::Oracle(e) => e.into(),
            ContextorError::Llm(e) => AppError::Llm(e),
            ContextorError::Config(msg) => AppError::Config(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        ApiResponse::<()>::error(self.error_code(), self.client_message(), Vec::new())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;
