use axum::response::Response;
use serde::Serialize;

use crate::core::http::response_envelope::ApiResponse;

pub const CAPABILITIES: &[&str] = &[
    "Symptom checker",
    "Diet & nutrition plans",
    "Find local doctors",
    "General medicine info",
];

pub const EXAMPLE_PROMPTS: &[&str] = &[
    "I have a headache",
    "Suggest a diet plan",
    "Find a cardiologist",
];

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub capabilities: &'static [&'static str],
    pub examples: &'static [&'static str],
}

/// Handler: GET /suggestions: what the assistant can do plus starter prompts.
pub async fn suggestions() -> Response {
    ApiResponse::ok(SuggestionsResponse {
        capabilities: CAPABILITIES,
        examples: EXAMPLE_PROMPTS,
    })
}
