// Gateway assembly: handlers, metrics, startup
pub mod handlers;
pub mod metrics;
pub mod server;

pub use handlers::{build_rpc_server, register_bitcoin_handlers};
pub use server::run;
