use crate::config::UpstreamConfig;
use crate::error::UpstreamError;
use crate::upstream::UpstreamTransport;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Bitcoin Core's reply envelope.
#[derive(Debug, Deserialize)]
struct NodeReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<NodeFault>,
}

#[derive(Debug, Deserialize)]
struct NodeFault {
    code: i64,
    message: String,
}

/// JSON-RPC 1.0 over HTTP with Basic credentials, the dialect `bitcoind` speaks.
///
/// Each call is one POST with its own UUID correlation id. There is no retry:
/// a failed call is reported to the caller as-is.
pub struct HttpUpstream {
    client: Client,
    url: String,
    user: String,
    password: String,
    timeout: Duration,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url(),
            user: config.user.clone(),
            password: config.password.clone(),
            timeout: config.timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl UpstreamTransport for HttpUpstream {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, UpstreamError> {
        let id = Uuid::new_v4().to_string();
        let body = json!({
            "jsonrpc": "1.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let start = Instant::now();
        debug!(%id, method, "forwarding to upstream");

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;

        debug!(
            %id,
            method,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "upstream replied"
        );

        // bitcoind reports RPC faults with a 4xx/5xx status *and* a JSON body,
        // so the body is inspected before the status.
        let reply: NodeReply = match serde_json::from_slice(&bytes) {
            Ok(reply) => reply,
            Err(e) if status.is_success() => {
                return Err(UpstreamError::Decode(e.to_string()));
            }
            Err(_) => {
                warn!(%id, method, status = status.as_u16(), "upstream returned a non-JSON error");
                return Err(UpstreamError::Http {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).trim().to_string(),
                });
            }
        };

        if let Some(fault) = reply.error {
            return Err(UpstreamError::Rpc {
                code: fault.code,
                message: fault.message,
            });
        }

        if !status.is_success() {
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).trim().to_string(),
            });
        }

        Ok(reply.result.unwrap_or(Value::Null))
    }
}
