//! Integration tests for the chat route

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chatgate_core::config::GenerationConfig;
use chatgate_core::{SystemResolver, WhitelistPolicy};
use chatgate_service::{router, AppState, GenerationClient};
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const API_KEY: &str = "sk-test";

/// Fake completion API that echoes the user message back
async fn spawn_upstream() -> SocketAddr {
    let app = Router::new().route(
        "/chat/completions",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            let expected = format!("Bearer {API_KEY}");
            let authorized = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                == Some(expected.as_str());
            if !authorized {
                return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
            }
            let content = body["messages"][0]["content"].as_str().unwrap_or_default();
            (
                StatusCode::OK,
                Json(json!({
                    "model": body["model"],
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": format!("echo: {content}")}
                    }]
                })),
            )
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::Server::from_tcp(listener)
        .unwrap()
        .serve(app.into_make_service());
    tokio::spawn(server);
    addr
}

fn generator(base_url: String, api_key: &str) -> GenerationClient {
    GenerationClient::from_config(&GenerationConfig {
        api_key: Some(api_key.to_string()),
        base_url,
        timeout_secs: 5,
        ..GenerationConfig::default()
    })
    .unwrap()
}

fn app(rules: &str, enabled: bool, generator: GenerationClient) -> Router {
    let resolver = SystemResolver::new(false, Duration::from_millis(100));
    router(Arc::new(AppState {
        policy: WhitelistPolicy::compile(rules, enabled, resolver),
        generator,
    }))
}

fn request(uri: &str, peer: [u8; 4], forwarded: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = forwarded {
        builder = builder.header("X-Forwarded-For", value);
    }
    let mut req = builder.body(Body::empty()).unwrap();
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((peer, 40000))));
    req
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_whitelisted_peer_gets_reply() {
    let upstream = spawn_upstream().await;
    let app = app("127.0.0.1,localhost", true, generator(format!("http://{upstream}"), API_KEY));

    let response = app
        .oneshot(request("/dduoai/chat?message=hello%20there", [127, 0, 0, 1], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "echo: hello there");
}

#[tokio::test]
async fn test_unlisted_peer_is_forbidden() {
    let app = app(
        "127.0.0.1,localhost",
        true,
        generator("http://127.0.0.1:9".to_string(), API_KEY),
    );

    let response = app
        .oneshot(request("/dduoai/chat?message=hi", [203, 0, 113, 9], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/problem+json"
    );
    let problem: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(problem["title"], "Access Denied");
    assert_eq!(problem["status"], 403);
    assert_eq!(problem["instance"], "/dduoai/chat");
    assert!(problem["detail"].as_str().unwrap().contains("[203.0.113.9]"));
}

#[tokio::test]
async fn test_forwarded_header_takes_precedence() {
    let upstream = spawn_upstream().await;
    let app = app("10.0.0.0/8", true, generator(format!("http://{upstream}"), API_KEY));

    let allowed = app
        .clone()
        .oneshot(request(
            "/dduoai/chat?message=x",
            [203, 0, 113, 9],
            Some(" 10.1.2.3 , 203.0.113.9"),
        ))
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);

    let denied = app
        .oneshot(request(
            "/dduoai/chat?message=x",
            [10, 1, 2, 3],
            Some("198.51.100.1"),
        ))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_disabled_whitelist_allows_anyone() {
    let upstream = spawn_upstream().await;
    let app = app("127.0.0.1", false, generator(format!("http://{upstream}"), API_KEY));

    let response = app
        .oneshot(request("/dduoai/chat?message=open", [8, 8, 8, 8], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "echo: open");
}

#[tokio::test]
async fn test_generation_failure_is_service_unavailable() {
    let upstream = spawn_upstream().await;
    let app = app("localhost", true, generator(format!("http://{upstream}"), "sk-wrong"));

    let response = app
        .oneshot(request("/dduoai/chat?message=hi", [127, 0, 0, 1], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let problem: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(problem["title"], "Service Unavailable");
    assert_eq!(problem["detail"], "AI service is temporarily unavailable");
    assert!(problem["errorDetails"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn test_missing_message_is_bad_request() {
    let app = app("localhost", true, generator("http://127.0.0.1:9".to_string(), API_KEY));

    let response = app
        .oneshot(request("/dduoai/chat", [127, 0, 0, 1], None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
