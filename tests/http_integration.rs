mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use btc_rpc_gateway::transport::http_transport::MAX_BODY_BYTES;
use btc_rpc_gateway::{Metrics, UpstreamError};
use common::{router_for, StubUpstream};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn post(router: Router, path: &str, body: &str) -> (StatusCode, Option<String>, String) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get(router: Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_blockchain_info_scenario() {
    let stub = StubUpstream::new();
    stub.reply("getblockchaininfo", json!({"chain": "main", "blocks": 800000}));
    let router = router_for(&stub, Arc::new(Metrics::new()));

    let (status, content_type, body) = post(
        router,
        "/",
        r#"{"method":"getblockchaininfo","params":[],"id":1}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(
        body,
        r#"{"result":{"chain":"main","blocks":800000},"error":null,"id":1}"#
    );
}

#[tokio::test]
async fn test_unknown_method_scenario() {
    let stub = StubUpstream::new();
    let router = router_for(&stub, Arc::new(Metrics::new()));

    let (status, _, body) = post(router, "/", r#"{"method":"nosuchmethod","params":[],"id":2}"#).await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], Value::Null);
    assert_eq!(body["id"], 2);
    assert!(body["error"]["code"].is_i64());
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_transport_fault_keeps_serving() {
    let stub = StubUpstream::new();
    stub.fail("getpeerinfo", UpstreamError::Transport("connection refused".into()));
    stub.reply("getchaintips", json!([{"height": 800000, "status": "active"}]));
    let router = router_for(&stub, Arc::new(Metrics::new()));

    let (status, _, body) = post(
        router.clone(),
        "/",
        r#"{"method":"getpeerinfo","params":[],"id":3}"#,
    )
    .await;
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(!body["error"].is_null());
    assert_eq!(body["result"], Value::Null);

    // the same router still answers the next request
    let (status, _, body) = post(router, "/", r#"{"method":"getchaintips","params":[],"id":4}"#).await;
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"][0]["status"], "active");
}

#[tokio::test]
async fn test_any_path_accepts_rpc() {
    let stub = StubUpstream::new();
    let router = router_for(&stub, Arc::new(Metrics::new()));

    for path in ["/", "/rpc", "/wallet/main", "/health", "/metrics"] {
        let (status, _, body) = post(
            router.clone(),
            path,
            r#"{"method":"getpeerinfo","params":[],"id":5}"#,
        )
        .await;
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(status, StatusCode::OK, "path {}", path);
        assert_eq!(body["id"], 5, "path {}", path);
    }
    assert_eq!(stub.calls().len(), 5);
}

#[tokio::test]
async fn test_parse_error_is_still_200() {
    let stub = StubUpstream::new();
    let router = router_for(&stub, Arc::new(Metrics::new()));

    let (status, _, body) = post(router, "/", "{\"method\": ").await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn test_batch_is_rejected_in_envelope() {
    let stub = StubUpstream::new();
    let router = router_for(&stub, Arc::new(Metrics::new()));

    let (status, _, body) = post(
        router,
        "/",
        r#"[{"method":"getpeerinfo","params":[],"id":1}]"#,
    )
    .await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], -32600);
    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn test_amount_precision_is_preserved() {
    let stub = StubUpstream::new();
    let result: Value = serde_json::from_str(r#"{"total_amount":19460000.12340000}"#).unwrap();
    stub.reply("gettxoutsetinfo", result);
    let router = router_for(&stub, Arc::new(Metrics::new()));

    let (_, _, body) = post(
        router,
        "/",
        r#"{"method":"gettxoutsetinfo","params":["muhash"],"id":6}"#,
    )
    .await;

    assert!(body.contains(r#""total_amount":19460000.12340000"#), "{}", body);
}

#[tokio::test]
async fn test_jsonrpc_version_is_echoed() {
    let stub = StubUpstream::new();
    let router = router_for(&stub, Arc::new(Metrics::new()));

    let (_, _, body) = post(
        router,
        "/",
        r#"{"jsonrpc":"2.0","method":"getpeerinfo","params":[],"id":"req-1"}"#,
    )
    .await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(body["jsonrpc"], "2.0");
    assert_eq!(body["id"], "req-1");
}

#[tokio::test]
async fn test_health_endpoint() {
    let stub = StubUpstream::new();
    let router = router_for(&stub, Arc::new(Metrics::new()));

    let (status, body) = get(router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(btc_rpc_gateway::codec::decode_timestamp(&body["started_at"]).is_ok());
    assert_eq!(body["methods"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn test_metrics_endpoint_counts_requests() {
    let stub = StubUpstream::new();
    stub.fail("getblock", UpstreamError::Timeout(std::time::Duration::from_secs(30)));
    let metrics = Arc::new(Metrics::new());
    let router = router_for(&stub, metrics.clone());

    post(router.clone(), "/", r#"{"method":"getpeerinfo","params":[],"id":1}"#).await;
    post(router.clone(), "/", r#"{"method":"getblock","params":["00ab",1],"id":2}"#).await;
    post(router.clone(), "/", r#"{"method":"nosuchmethod","params":[],"id":3}"#).await;
    post(router.clone(), "/", "not json").await;

    let (status, body) = get(router, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_requests"], 4);
    assert_eq!(body["relayed"], 1);
    assert_eq!(body["upstream_failures"]["timeout"], 1);
    assert_eq!(body["unknown_methods"], 1);
    assert_eq!(body["rejected"], 1);
    assert_eq!(body["method_counts"]["getpeerinfo"], 1);
    assert_eq!(body["method_counts"]["getblock"], 1);
    assert!(body["method_counts"].get("nosuchmethod").is_none());
}

#[tokio::test]
async fn test_oversized_body_gets_envelope() {
    let stub = StubUpstream::new();
    let metrics = Arc::new(Metrics::new());
    let router = router_for(&stub, metrics.clone());

    let hash = "a".repeat(3 * 1024 * 1024);
    let request = format!(r#"{{"method":"getblock","params":["{}",1],"id":9}}"#, hash);
    assert!(request.len() > MAX_BODY_BYTES);

    let (status, content_type, body) = post(router, "/", &request).await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(body["result"], Value::Null);
    assert_eq!(body["id"], Value::Null);
    assert!(stub.calls().is_empty());
    assert_eq!(metrics.snapshot().rejected, 1);
}

#[tokio::test]
async fn test_body_at_limit_is_dispatched() {
    let stub = StubUpstream::new();
    let router = router_for(&stub, Arc::new(Metrics::new()));

    let prefix = r#"{"method":"getblock","params":[""#;
    let suffix = r#"",1],"id":10}"#;
    let hash = "a".repeat(MAX_BODY_BYTES - prefix.len() - suffix.len());
    let request = format!("{}{}{}", prefix, hash, suffix);
    assert_eq!(request.len(), MAX_BODY_BYTES);

    let (status, _, body) = post(router, "/", &request).await;
    let body: Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 10);
    assert_eq!(stub.calls().len(), 1);
}

#[tokio::test]
async fn test_concurrent_requests_share_the_registry() {
    let stub = StubUpstream::new();
    let router = router_for(&stub, Arc::new(Metrics::new()));

    let requests = (0..16).map(|i| {
        let router = router.clone();
        async move {
            let body = format!(r#"{{"method":"getblock","params":["00ab",{}],"id":{}}}"#, i % 3, i);
            let (status, _, body) = post(router, "/", &body).await;
            (i, status, serde_json::from_str::<Value>(&body).unwrap())
        }
    });

    for (i, status, body) in futures::future::join_all(requests).await {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], i);
    }
    assert_eq!(stub.calls().len(), 16);
}
