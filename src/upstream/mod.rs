// Upstream node access
pub mod client;
pub mod http;

use crate::error::UpstreamError;
use async_trait::async_trait;
use serde_json::Value;

pub use client::BitcoinClient;
pub use http::HttpUpstream;

/// One remote-procedure call against the upstream node.
///
/// `HttpUpstream` is the real implementation; tests substitute a stub that
/// records what it was asked to forward.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, UpstreamError>;
}
