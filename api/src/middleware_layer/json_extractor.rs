use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::core::http::response_envelope::{ApiErrorDetail, ApiResponse};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Rejection bodies are short; anything longer is replaced rather than buffered.
const MAX_REWRAP_BYTES: usize = 64 * 1024;

/// Message used when the rejection body is too large or unreadable.
const UNREADABLE_REJECTION: &str = "The request was rejected.";

async fn take_body(res: Response) -> (axum::http::response::Parts, Option<Bytes>) {
    let (parts, body) = res.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_REWRAP_BYTES).await {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            tracing::warn!(error = %err, "rejection body not readable");
            None
        }
    };
    (parts, bytes)
}

fn guess_path_from_serde_msg(msg: &str) -> Option<String> {
    ["message"]
        .into_iter()
        .find(|key| msg.contains(key))
        .map(str::to_string)
}

fn ensure_request_id(parts: &mut axum::http::response::Parts) -> String {
    if let Some(v) = parts
        .headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
    {
        return v.to_string();
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    let id = format!("req-{nanos}");
    if let Ok(value) = HeaderValue::from_str(&id) {
        parts.headers.insert(REQUEST_ID_HEADER, value);
    }
    id
}

fn is_envelope(bytes: &[u8]) -> bool {
    serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()
        .and_then(|v| v.get("success").map(serde_json::Value::is_boolean))
        .unwrap_or(false)
}

/// Rewraps plain-text 400/422 rejections (bad JSON, missing fields) into the envelope.
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let res = next.run(req).await;
    let status = res.status();

    if !(status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY) {
        return res;
    }

    let (mut parts, bytes) = take_body(res).await;
    let req_id = ensure_request_id(&mut parts);

    let bytes = bytes.unwrap_or_else(|| Bytes::from_static(UNREADABLE_REJECTION.as_bytes()));
    if is_envelope(&bytes) {
        return Response::from_parts(parts, Body::from(bytes));
    }

    let original = String::from_utf8_lossy(&bytes);
    tracing::debug!(request_id = %req_id, status = status.as_u16(), "rewrapping extractor rejection");

    let detail = ApiErrorDetail {
        path: guess_path_from_serde_msg(&original),
        hint: if original.contains("missing field") {
            Some("Send a JSON object like { \"message\": \"I have a headache\" }.".into())
        } else if original.contains("invalid type") {
            Some("`message` must be a JSON string.".into())
        } else {
            None
        },
    };

    let envelope = ApiResponse::<()>::error(
        if status == StatusCode::BAD_REQUEST {
            "BAD_REQUEST"
        } else {
            "UNPROCESSABLE_ENTITY"
        },
        original.trim(),
        vec![detail],
    );

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use axum::{Router, middleware, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    async fn oversized_rejection() -> (StatusCode, String) {
        (StatusCode::BAD_REQUEST, "x".repeat(MAX_REWRAP_BYTES + 1))
    }

    async fn plain_rejection() -> (StatusCode, &'static str) {
        (StatusCode::UNPROCESSABLE_ENTITY, "missing field `message`")
    }

    fn app() -> Router {
        Router::new()
            .route("/oversized", get(oversized_rejection))
            .route("/plain", get(plain_rejection))
            .layer(middleware::from_fn(json_error_mapper))
    }

    async fn call(uri: &str) -> (StatusCode, serde_json::Value) {
        let res = app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        assert!(res.headers().contains_key(REQUEST_ID_HEADER));
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn oversized_rejection_keeps_status_with_fixed_message() {
        let (status, body) = call("/oversized").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(body["error"]["message"], UNREADABLE_REJECTION);
    }

    #[tokio::test]
    async fn plain_rejection_is_wrapped_with_hint() {
        let (status, body) = call("/plain").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
        assert_eq!(body["error"]["message"], "missing field `message`");
        assert_eq!(body["error"]["details"][0]["path"], "message");
    }
}
