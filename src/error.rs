use crate::rpc::{RpcErrorObj, INTERNAL_ERROR};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single upstream call.
///
/// `Rpc` is the node's own fault report and is relayed to the caller with its
/// code and message intact. Everything else is a transport-level failure and
/// surfaces as a JSON-RPC internal error whose `data.kind` names the cause.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to reach upstream: {0}")]
    Transport(String),

    #[error("upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("upstream error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Every [`UpstreamError::kind`] except `"rpc"`: the ways a call can fail
    /// without the node answering it.
    pub const FAILURE_KINDS: [&'static str; 4] = ["timeout", "transport", "http", "decode"];

    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Http { .. } => "http",
            UpstreamError::Rpc { .. } => "rpc",
            UpstreamError::Decode(_) => "decode",
        }
    }
}

impl From<UpstreamError> for RpcErrorObj {
    fn from(err: UpstreamError) -> Self {
        let kind = err.kind();
        match err {
            UpstreamError::Rpc { code, message } => RpcErrorObj::new(code, message),
            other => RpcErrorObj::new(INTERNAL_ERROR, format!("Internal error: {}", other))
                .with_data(json!({ "kind": kind })),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a valid {expected}, got '{value}'")]
    InvalidValue {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("'{0}' is not a decimal number")]
    InvalidDecimal(String),

    #[error("expected an RFC 3339 timestamp string, got {0}")]
    InvalidTimestamp(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_fault_is_relayed_verbatim() {
        let err = UpstreamError::Rpc {
            code: -5,
            message: "Block not found".into(),
        };
        let obj = RpcErrorObj::from(err);
        assert_eq!(obj.code, -5);
        assert_eq!(obj.message, "Block not found");
        assert!(obj.data.is_none());
    }

    #[test]
    fn test_transport_fault_is_internal_error() {
        let obj = RpcErrorObj::from(UpstreamError::Transport("connection refused".into()));
        assert_eq!(obj.code, INTERNAL_ERROR);
        assert!(obj.message.contains("connection refused"));
        assert_eq!(obj.data, Some(json!({"kind": "transport"})));
    }

    #[test]
    fn test_timeout_kind() {
        let obj = RpcErrorObj::from(UpstreamError::Timeout(Duration::from_secs(30)));
        assert_eq!(obj.code, INTERNAL_ERROR);
        assert_eq!(obj.data, Some(json!({"kind": "timeout"})));
    }

    #[test]
    fn test_http_status_in_message() {
        let err = UpstreamError::Http {
            status: 401,
            body: String::new(),
        };
        assert_eq!(err.kind(), "http");
        assert!(RpcErrorObj::from(err).message.contains("401"));
    }

    #[test]
    fn test_failure_kinds_cover_non_rpc_variants() {
        let failures = [
            UpstreamError::Timeout(Duration::from_secs(1)),
            UpstreamError::Transport(String::new()),
            UpstreamError::Http {
                status: 500,
                body: String::new(),
            },
            UpstreamError::Decode(String::new()),
        ];
        for err in &failures {
            assert!(UpstreamError::FAILURE_KINDS.contains(&err.kind()), "{}", err.kind());
        }
        assert!(!UpstreamError::FAILURE_KINDS.contains(&"rpc"));
    }
}
