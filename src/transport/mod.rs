pub mod http_transport;
pub mod metrics_endpoint;
pub mod shutdown;

pub use http_transport::HttpTransport;
pub use shutdown::ShutdownCoordinator;
