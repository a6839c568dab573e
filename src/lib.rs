// Core RPC functionality
pub mod rpc;

// Supported node methods
pub mod registry;

// Upstream node client
pub mod upstream;

// Configuration and errors
pub mod config;
pub mod error;

// Wire encodings
pub mod codec;

// Transport layer
pub mod transport;

// Server assembly
pub mod server;

// Client
pub mod client;

pub use config::{GatewayConfig, UpstreamConfig};
pub use error::{CodecError, ConfigError, UpstreamError};
pub use registry::{bind_params, BitcoinMethod, Signature};
pub use rpc::{RpcErrorObj, RpcRequest, RpcResponse, RpcServer};
pub use server::metrics::Metrics;
pub use transport::HttpTransport;
pub use upstream::{BitcoinClient, HttpUpstream, UpstreamTransport};
