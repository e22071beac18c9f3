//! JSON envelope shared by every route: `{ success, data?, error? }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Serialize)]
pub struct ApiError {
    /// Machine-readable code, e.g. `RATE_LIMITED`.
    pub code: &'static str,
    /// Text that can be shown to the end user as is.
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ApiErrorDetail>,
}

/// Per-field hint attached to request validation failures.
#[derive(Serialize)]
pub struct ApiErrorDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Payload attached to a failed outcome, e.g. a degraded health report.
    pub fn failure_with(data: T) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: None,
        }
    }

    /// `200 OK` with `data` in the envelope.
    pub fn ok(data: T) -> Response {
        Self::success(data).into_response_with_status(StatusCode::OK)
    }

    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl ApiResponse<()> {
    pub fn error(
        code: &'static str,
        message: impl Into<String>,
        details: Vec<ApiErrorDetail>,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
                details,
            }),
        }
    }
}
