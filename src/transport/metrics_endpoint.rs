use crate::codec;
use crate::transport::HttpTransport;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use std::sync::Arc;

/// GET /metrics - Returns current metrics
pub(crate) async fn get_metrics(State(transport): State<Arc<HttpTransport>>) -> impl IntoResponse {
    match &transport.metrics {
        Some(metrics) => (StatusCode::OK, Json(json!(metrics.snapshot()))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "metrics are disabled" })),
        ),
    }
}

/// GET /health - Health check endpoint
pub(crate) async fn health_check(State(transport): State<Arc<HttpTransport>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "btc_rpc_gateway",
            "started_at": codec::encode_timestamp(&transport.started_at),
            "methods": transport.server.methods(),
        })),
    )
}
