use crate::codec;
use crate::registry::BitcoinMethod;
use crate::rpc::{parse_rpc_request, RpcResponse, RpcServer, INVALID_REQUEST, PARSE_ERROR};
use crate::server::metrics::{Metrics, Outcome, RequestTimer};
use crate::transport::metrics_endpoint::{get_metrics, health_check};
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Largest request body the gateway reads. Larger bodies get an
/// invalid-request envelope.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// HTTP transport layer for the gateway
///
/// Example usage:
/// ```rust,no_run
/// use btc_rpc_gateway::*;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = UpstreamConfig::from_env()?;
///     let client = BitcoinClient::new(Arc::new(HttpUpstream::new(&config)?));
///     let server = Arc::new(server::build_rpc_server(Arc::new(client)));
///
///     HttpTransport::new(server)
///         .with_metrics(Arc::new(Metrics::new()))
///         .serve("127.0.0.1:4000")
///         .await?;
///
///     Ok(())
/// }
/// ```
pub struct HttpTransport {
    pub(crate) server: Arc<RpcServer>,
    pub(crate) metrics: Option<Arc<Metrics>>,
    pub(crate) started_at: DateTime<Utc>,
}

impl HttpTransport {
    pub fn new(server: Arc<RpcServer>) -> Self {
        Self {
            server,
            metrics: None,
            started_at: Utc::now(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Create the axum router.
    ///
    /// Every path accepts JSON-RPC. `/health` and `/metrics` additionally
    /// answer `GET`.
    pub fn router(self) -> Router {
        let state = Arc::new(self);

        Router::new()
            .route("/health", get(health_check).post(rpc_handler))
            .route("/metrics", get(get_metrics).post(rpc_handler))
            .fallback(rpc_handler)
            .with_state(state)
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(TraceLayer::new_for_http())
    }

    /// Start the HTTP server; runs until the process is terminated.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve_listener(listener, std::future::pending::<()>()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    /// In-flight requests are allowed to finish.
    pub async fn serve_listener<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("HTTP gateway listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Main RPC handler for HTTP requests. Always answers 200 with a JSON-RPC envelope.
async fn rpc_handler(
    State(transport): State<Arc<HttpTransport>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let mut timer = transport.metrics.clone().map(RequestTimer::start);

    let parsed = match body {
        Ok(body) => parse_rpc_request(&body).inspect_err(|_| {
            warn!("Rejected request body ({} bytes)", body.len());
        }),
        Err(rejection) => Err(unreadable_body(&rejection)),
    };
    let req = match parsed {
        Ok(req) => req,
        Err(resp) => {
            if let Some(timer) = timer {
                timer.finish(Outcome::Rejected);
            }
            return json_response(&resp);
        }
    };

    let method = BitcoinMethod::from_name(&req.method)
        .filter(|method| transport.server.has_method(method.name()));
    if let (Some(timer), Some(method)) = (timer.as_mut(), method) {
        timer.method(method);
    }

    let resp = transport.server.handle_request(req).await;

    if let Some(timer) = timer {
        let outcome = match method {
            Some(_) => Outcome::of(&resp),
            None => Outcome::UnknownMethod,
        };
        timer.finish(outcome);
    }

    json_response(&resp)
}

/// Envelope for a body axum could not hand over, most often one over
/// [`MAX_BODY_BYTES`].
fn unreadable_body(rejection: &BytesRejection) -> RpcResponse {
    warn!(status = %rejection.status(), "request body not read: {}", rejection.body_text());
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        RpcResponse::with_error(
            Value::Null,
            INVALID_REQUEST,
            format!("Invalid Request: body exceeds {} bytes", MAX_BODY_BYTES),
        )
    } else {
        RpcResponse::with_error(
            Value::Null,
            PARSE_ERROR,
            format!("Parse error: {}", rejection.body_text()),
        )
    }
}

fn json_response(resp: &RpcResponse) -> Response {
    match codec::to_body(resp) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("failed to encode response: {}", e);
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                r#"{"result":null,"error":{"code":-32603,"message":"Internal error: response encoding failed"},"id":null}"#,
            )
                .into_response()
        }
    }
}
