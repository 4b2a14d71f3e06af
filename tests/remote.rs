//! Remote extractor against a local mock of the chat-completions API.

use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;

use paper_analyzer::config::ExtractorConfig;
use paper_analyzer::extractor::{
    ExtractionService, ExtractionSource, Extractor, ExtractorError, RemoteExtractor,
};
use paper_analyzer::models::ExtractionResult;
use paper_analyzer::segment;

const TEXT: &str = "Sparse Attention at Scale\nAbstract: attention is sparse.\nmore\nmore\n";

fn canned() -> ExtractionResult {
    ExtractionResult {
        title: "Sparse Attention at Scale".into(),
        summary: "Attention can be sparse.".into(),
        problem_statement: "Dense attention is quadratic.".into(),
        methodology: "Block-sparse kernels.".into(),
        results: "3x faster.".into(),
        conclusion: "Sparse attention is practical.".into(),
    }
}

async fn spawn_mock(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn completions(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer sk-test");
    let has_schema = body["response_format"]["type"] == "json_schema";
    let has_text = body["messages"][1]["content"]
        .as_str()
        .is_some_and(|c| c.contains("Abstract: attention is sparse."));

    if !(authorized && has_schema && has_text) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad request" })));
    }

    let content = serde_json::to_string(&canned()).unwrap();
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })),
    )
}

fn config_for(addr: SocketAddr) -> ExtractorConfig {
    ExtractorConfig {
        base_url: format!("http://{}/v1", addr),
        timeout_secs: 5,
        ..ExtractorConfig::default()
    }
}

#[tokio::test]
async fn test_remote_extractor_parses_structured_reply() {
    let addr = spawn_mock(Router::new().route("/v1/chat/completions", post(completions))).await;
    let remote = RemoteExtractor::with_key(&config_for(addr), "sk-test".into()).unwrap();

    let result = remote.extract(TEXT).await.unwrap();
    assert_eq!(result, canned());
}

#[tokio::test]
async fn test_remote_extractor_reports_status_errors() {
    let addr = spawn_mock(Router::new().route("/v1/chat/completions", post(completions))).await;
    let remote = RemoteExtractor::with_key(&config_for(addr), "sk-wrong".into()).unwrap();

    let err = remote.extract(TEXT).await.unwrap_err();
    assert!(matches!(err, ExtractorError::Status { status: 401, .. }));
}

#[tokio::test]
async fn test_service_prefers_remote_when_it_succeeds() {
    let addr = spawn_mock(Router::new().route("/v1/chat/completions", post(completions))).await;
    let remote = RemoteExtractor::with_key(&config_for(addr), "sk-test".into()).unwrap();
    let service = ExtractionService::new(Some(Box::new(remote)));

    let analysis = service.analyze(TEXT).await;
    assert_eq!(analysis.source, ExtractionSource::Remote);
    assert_eq!(analysis.result, canned());
}

#[tokio::test]
async fn test_service_falls_back_on_server_error() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let addr = spawn_mock(app).await;
    let remote = RemoteExtractor::with_key(&config_for(addr), "sk-test".into()).unwrap();
    let service = ExtractionService::new(Some(Box::new(remote)));

    let analysis = service.analyze(TEXT).await;
    assert_eq!(analysis.source, ExtractionSource::Heuristic);
    assert_eq!(analysis.result, segment::segment(TEXT));
}

#[tokio::test]
async fn test_service_falls_back_on_malformed_content() {
    let app = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            Json(json!({ "choices": [{ "message": { "content": "not json at all" } }] }))
        }),
    );
    let addr = spawn_mock(app).await;
    let remote = RemoteExtractor::with_key(&config_for(addr), "sk-test".into()).unwrap();
    let service = ExtractionService::new(Some(Box::new(remote)));

    let analysis = service.analyze(TEXT).await;
    assert_eq!(analysis.source, ExtractionSource::Heuristic);
}

#[tokio::test]
async fn test_service_falls_back_when_unreachable() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let remote = RemoteExtractor::with_key(&config_for(addr), "sk-test".into()).unwrap();
    let service = ExtractionService::new(Some(Box::new(remote)));

    let analysis = service.analyze(TEXT).await;
    assert_eq!(analysis.source, ExtractionSource::Heuristic);
    assert_eq!(analysis.result.title, "Sparse Attention at Scale");
}
