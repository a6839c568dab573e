use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value, // id can be string or number or null
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObj {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// `result` and `error` are both always written, one of them as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObj>,
    #[serde(default)]
    pub id: Value,
}

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

impl RpcErrorObj {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        RpcErrorObj {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self::new(INVALID_PARAMS, format!("Invalid params: {}", detail))
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Helper methods for constructing JSON-RPC responses.
///
/// The gateway answers in the envelope shape Bitcoin Core clients expect:
/// `{"result": ..., "error": ..., "id": ...}`. When the caller sent a
/// `jsonrpc` version tag, [`RpcResponse::with_version`] echoes it back.
impl RpcResponse {
    /// Constructs a successful response with the given `id` and `result`.
    ///
    /// # Example
    /// ```rust
    /// # use btc_rpc_gateway::RpcResponse;
    /// let res = RpcResponse::with_result(serde_json::json!(1), serde_json::json!({"blocks": 800000}));
    /// assert!(res.error.is_none());
    /// ```
    pub fn with_result(id: Value, res: Value) -> Self {
        RpcResponse {
            jsonrpc: None,
            result: Some(res),
            error: None,
            id,
        }
    }

    /// Constructs an error response with the given `id`, `code`, and `message`.
    ///
    /// # Example
    /// ```rust
    /// # use btc_rpc_gateway::RpcResponse;
    /// let err = RpcResponse::with_error(serde_json::json!(2), -32601, "Method not found");
    /// assert!(err.result.is_none());
    /// ```
    pub fn with_error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self::from_error(id, RpcErrorObj::new(code, message))
    }

    /// Constructs an error response carrying a prepared error object, `data` included.
    pub fn from_error(id: Value, error: RpcErrorObj) -> Self {
        RpcResponse {
            jsonrpc: None,
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn with_version(mut self, jsonrpc: Option<String>) -> Self {
        self.jsonrpc = jsonrpc;
        self
    }
}

// A Handler is an async function that takes params and returns Result<Value, RpcErrorObj>.
pub type Handler = dyn Fn(Value) -> HandlerFuture + Send + Sync + 'static;
pub type HandlerFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Value, RpcErrorObj>> + Send>>;

/// Table of JSON-RPC method handlers.
///
/// Handlers are registered while the server is being assembled and the table
/// is then frozen behind an `Arc`: dispatch only ever reads it, so requests
/// share it without locking.
#[derive(Default)]
pub struct RpcServer {
    handlers: HashMap<String, Arc<Handler>>,
}

impl RpcServer {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `f` under the exact method name `method`, replacing any
    /// earlier handler with that name.
    pub fn register<F, Fut>(&mut self, method: &str, f: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value, RpcErrorObj>> + Send + 'static,
    {
        //wrap into Arc<Handlers>
        let method_name = method.to_string();
        let handler_arc: Arc<Handler> = Arc::new(move |params: Value| {
            let fut = f(params);
            Box::pin(fut)
        });

        self.handlers.insert(method_name, handler_arc);
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn handle_request(&self, req: RpcRequest) -> RpcResponse {
        let RpcRequest {
            jsonrpc,
            method,
            params,
            id,
        } = req;

        let response = if let Some(h) = self.handlers.get(&method) {
            debug!(method = %method, "dispatching request");
            match (h)(params).await {
                Ok(res) => RpcResponse::with_result(id, res),
                Err(err) => RpcResponse::from_error(id, err),
            }
        } else {
            debug!(method = %method, "unknown method");
            RpcResponse::with_error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
        };

        response.with_version(jsonrpc)
    }
}

/// Parses a raw HTTP body into a single request.
///
/// On failure the ready-to-send error response is returned instead: a parse
/// error when the body is not JSON, an invalid-request error when it is JSON
/// but not a request object. Batches (arrays) are rejected.
pub fn parse_rpc_request(raw: &[u8]) -> Result<RpcRequest, RpcResponse> {
    let value: Value = serde_json::from_slice(raw).map_err(|e| {
        RpcResponse::with_error(Value::Null, PARSE_ERROR, format!("Parse error: {}", e))
    })?;

    let mut obj = match value {
        Value::Object(obj) => obj,
        Value::Array(_) => {
            return Err(RpcResponse::with_error(
                Value::Null,
                INVALID_REQUEST,
                "Invalid Request: batch requests are not supported",
            ));
        }
        _ => {
            return Err(RpcResponse::with_error(
                Value::Null,
                INVALID_REQUEST,
                "Invalid Request: expected a JSON object",
            ));
        }
    };

    let id = obj.remove("id").unwrap_or(Value::Null);
    let jsonrpc = match obj.remove("jsonrpc") {
        Some(Value::String(version)) => Some(version),
        _ => None,
    };
    let method = match obj.remove("method") {
        Some(Value::String(method)) => method,
        _ => {
            return Err(RpcResponse::with_error(
                id,
                INVALID_REQUEST,
                "Invalid Request: 'method' must be a string",
            )
            .with_version(jsonrpc));
        }
    };
    let params = obj.remove("params").unwrap_or(Value::Null);

    Ok(RpcRequest {
        jsonrpc,
        method,
        params,
        id,
    })
}
