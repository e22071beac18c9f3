use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use ai_llm_service::{
    AiLlmError, Backoff, LlmServiceProfiles, Oracle, OracleError, OracleErrorKind, OracleFuture, OracleReply,
    OracleRequest, RetryPolicy,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
};
use api::{AppState, router};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use contextor::{
    ChatSession, ContextInjector, EmbeddingPolicy, EmbeddingsProvider, KeywordPolicy,
    SelectionPolicy, TriggerSet, embed::EmbedFuture,
};
use directory_store::{DirectoryRecord, SeedSet};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

struct ScriptedOracle {
    script: Mutex<VecDeque<Result<String, OracleErrorKind>>>,
}

impl Oracle for ScriptedOracle {
    fn generate<'a>(&'a self, _request: &'a OracleRequest) -> OracleFuture<'a> {
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(OracleErrorKind::Unknown));
        Box::pin(async move {
            next.map(|text| OracleReply { text })
                .map_err(|kind| OracleError::new(kind, "scripted"))
        })
    }
}

fn llm(endpoint: &str) -> Arc<LlmServiceProfiles> {
    let cfg = LlmModelConfig {
        provider: LlmProvider::Gemini,
        model: "gemini-2.0-flash".into(),
        endpoint: endpoint.into(),
        api_key: Some("test-key".into()),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(5),
    };
    Arc::new(LlmServiceProfiles::new(cfg, None, Some(2)).unwrap())
}

fn state_with(script: Vec<Result<&str, OracleErrorKind>>, endpoint: &str) -> Arc<AppState> {
    state_with_policy(
        script,
        endpoint,
        Box::new(KeywordPolicy::new(TriggerSet::new(["find a doctor", "pain"]))),
    )
}

fn state_with_policy(
    script: Vec<Result<&str, OracleErrorKind>>,
    endpoint: &str,
    policy: Box<dyn SelectionPolicy>,
) -> Arc<AppState> {
    let oracle = Arc::new(ScriptedOracle {
        script: Mutex::new(script.into_iter().map(|r| r.map(str::to_string)).collect()),
    });
    let records: Arc<[DirectoryRecord]> = SeedSet::Clinics.records().into();
    let injector = ContextInjector::new(policy, 3);
    let session = ChatSession::new(oracle, injector, records.clone()).with_retry(RetryPolicy {
        max_attempts: 3,
        backoff: Backoff::Fixed(Duration::ZERO),
    });
    Arc::new(AppState::new(session, records, llm(endpoint)))
}

fn state(script: Vec<Result<&str, OracleErrorKind>>) -> Arc<AppState> {
    state_with(script, "http://127.0.0.1:9")
}

async fn call(state: Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
    let res = router(state).oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_chat(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn chat_attaches_directory_when_triggered() {
    let (status, body) = call(
        state(vec![Ok("See Dr. Rajan Mehta.")]),
        post_chat(json!({ "message": "Can you find a doctor for chest pain?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["reply"], "See Dr. Rajan Mehta.");
    assert_eq!(body["data"]["attempts"], 1);
    assert_eq!(body["data"]["context"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["context"][1]["specialty"], "Cardiologist");
}

#[tokio::test]
async fn blank_message_is_rejected_with_envelope() {
    let (status, body) = call(state(vec![]), post_chat(json!({ "message": "   " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn malformed_body_is_rewrapped_by_middleware() {
    let res = router(state(vec![]))
        .oneshot(post_chat(json!({ "text": "hello" })))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.headers().contains_key("X-Request-Id"));
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    assert_eq!(body["error"]["details"][0]["path"], "message");
}

#[tokio::test]
async fn exhausted_rate_limit_maps_to_429_with_user_text() {
    let rl = Err(OracleErrorKind::RateLimited);
    let (status, body) = call(state(vec![rl, rl, rl]), post_chat(json!({ "message": "hi" }))).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
    assert_eq!(
        body["error"]["message"],
        "Still rate limited. Please wait 1 minute and try again."
    );
}

#[tokio::test]
async fn oracle_failures_map_to_distinct_statuses() {
    let cases = [
        (OracleErrorKind::InvalidArgument, StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
        (OracleErrorKind::InvalidCredential, StatusCode::BAD_GATEWAY, "INVALID_CREDENTIAL"),
        (OracleErrorKind::Unavailable, StatusCode::SERVICE_UNAVAILABLE, "ORACLE_UNAVAILABLE"),
        (OracleErrorKind::Unknown, StatusCode::BAD_GATEWAY, "ORACLE_ERROR"),
    ];
    for (kind, expected, code) in cases {
        let (status, body) = call(state(vec![Err(kind)]), post_chat(json!({ "message": "hi" }))).await;
        assert_eq!(status, expected, "{kind:?}");
        assert_eq!(body["error"]["code"], code);
        assert_eq!(body["error"]["message"], kind.user_message());
    }
}

#[tokio::test]
async fn history_round_trip_and_clear() {
    let st = state(vec![Ok("hello back")]);

    let (status, _) = call(st.clone(), post_chat(json!({ "message": "hello" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(st.clone(), get("/history")).await;
    let turns = body["data"]["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0], json!({ "role": "user", "text": "hello" }));
    assert_eq!(turns[1], json!({ "role": "assistant", "text": "hello back" }));

    let del = Request::builder()
        .method("DELETE")
        .uri("/history")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(st.clone(), del).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cleared"], 2);

    let (_, body) = call(st, get("/history")).await;
    assert!(body["data"]["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn failed_chat_does_not_grow_history() {
    let st = state(vec![Err(OracleErrorKind::InvalidArgument)]);

    let (status, _) = call(st.clone(), post_chat(json!({ "message": "hello" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(st, get("/history")).await;
    assert!(body["data"]["turns"].as_array().unwrap().is_empty());
}

struct TimingOutEmbedder;

impl EmbeddingsProvider for TimingOutEmbedder {
    fn embed<'a>(&'a self, _text: &'a str) -> EmbedFuture<'a> {
        Box::pin(async { Err(AiLlmError::Timeout(Duration::from_secs(30)).into()) })
    }
}

#[tokio::test]
async fn embedding_failure_maps_to_oracle_status_and_keeps_history() {
    let st = state_with_policy(
        vec![Ok("never sent")],
        "http://127.0.0.1:9",
        Box::new(EmbeddingPolicy::new(Arc::new(TimingOutEmbedder))),
    );

    let (status, body) = call(st.clone(), post_chat(json!({ "message": "heart doctor" }))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "ORACLE_UNAVAILABLE");
    assert_eq!(
        body["error"]["message"],
        OracleErrorKind::Unavailable.user_message()
    );

    let (_, body) = call(st, get("/history")).await;
    assert!(body["data"]["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn directory_and_suggestions_are_listed() {
    let st = state(vec![]);

    let (status, body) = call(st.clone(), get("/directory")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 5);
    assert_eq!(body["data"]["records"][0]["name"], "Dr. Priya Sharma");

    let (status, body) = call(st, get("/suggestions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["examples"],
        json!(["I have a headache", "Suggest a diet plan", "Find a cardiologist"])
    );
    assert_eq!(body["data"]["capabilities"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn health_and_models_use_gemini_listing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1beta/models")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "models": [
                    {
                        "name": "models/gemini-2.0-flash",
                        "displayName": "Gemini 2.0 Flash",
                        "supportedGenerationMethods": ["generateContent", "countTokens"]
                    },
                    { "name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"] }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let st = state_with(vec![], &server.url());

    let (status, body) = call(st.clone(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["ok"], true);
    assert_eq!(body["data"]["directory_records"], 5);

    let (status, body) = call(st, get("/models")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["models"],
        json!([{ "name": "models/gemini-2.0-flash", "display_name": "Gemini 2.0 Flash" }])
    );
}

#[tokio::test]
async fn degraded_health_reports_failure_with_details() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1beta/models")
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .with_body(r#"{"error":{"code":503,"message":"down","status":"UNAVAILABLE"}}"#)
        .create_async()
        .await;

    let (status, body) = call(state_with(vec![], &server.url()), get("/health")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["ok"], false);
    assert_eq!(body["data"]["services"][0]["ok"], false);
}

#[tokio::test]
async fn models_error_uses_oracle_mapping() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1beta/models")
        .match_query(mockito::Matcher::Any)
        .with_status(429)
        .with_body(r#"{"error":{"code":429,"message":"quota","status":"RESOURCE_EXHAUSTED"}}"#)
        .create_async()
        .await;

    let (status, body) = call(state_with(vec![], &server.url()), get("/models")).await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
}
