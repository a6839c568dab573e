#![allow(dead_code)]

use async_trait::async_trait;
use btc_rpc_gateway::server::build_rpc_server;
use btc_rpc_gateway::{BitcoinClient, HttpTransport, Metrics, UpstreamError, UpstreamTransport};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Upstream stand-in: records every forwarded call and answers from a script.
#[derive(Default)]
pub struct StubUpstream {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    replies: Mutex<HashMap<String, Result<Value, UpstreamError>>>,
}

impl StubUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, method: &str, result: Value) {
        self.replies
            .lock()
            .unwrap()
            .insert(method.to_string(), Ok(result));
    }

    pub fn fail(&self, method: &str, err: UpstreamError) {
        self.replies
            .lock()
            .unwrap()
            .insert(method.to_string(), Err(err));
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpstreamTransport for StubUpstream {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, UpstreamError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        match self.replies.lock().unwrap().remove(method) {
            Some(reply) => reply,
            None => Ok(Value::Null),
        }
    }
}

pub fn client_for(stub: &Arc<StubUpstream>) -> Arc<BitcoinClient> {
    let transport: Arc<dyn UpstreamTransport> = stub.clone();
    Arc::new(BitcoinClient::new(transport))
}

pub fn router_for(stub: &Arc<StubUpstream>, metrics: Arc<Metrics>) -> axum::Router {
    let server = Arc::new(build_rpc_server(client_for(stub)));
    HttpTransport::new(server).with_metrics(metrics).router()
}
