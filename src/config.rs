use crate::error::ConfigError;
use std::fmt;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:4000";
pub const DEFAULT_UPSTREAM_HOST: &str = "127.0.0.1";
pub const DEFAULT_UPSTREAM_PORT: u16 = 8332;
pub const DEFAULT_RPC_USER: &str = "bitcoin";
pub const DEFAULT_RPC_PASSWORD: &str = "pass";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection parameters for the upstream node. Fixed for the life of the process.
#[derive(Clone)]
pub struct UpstreamConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
}

impl UpstreamConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BTC_IP` (default `127.0.0.1`): upstream host
    /// - `BTC_RPC_PORT` (default `8332`): upstream port
    /// - `BITCOIN_RPC_USER` / `BITCOIN_RPC_PASSWORD` (defaults `bitcoin` / `pass`):
    ///   placeholders only, a warning is logged when either is defaulted
    /// - `BTC_RPC_TIMEOUT_SECS` (default `30`): per-call timeout
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a numeric variable is set but
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`UpstreamConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("BTC_IP").unwrap_or_else(|| DEFAULT_UPSTREAM_HOST.to_string());

        let port = match lookup("BTC_RPC_PORT") {
            Some(val) => val.parse().map_err(|_| ConfigError::InvalidValue {
                var: "BTC_RPC_PORT",
                expected: "port number",
                value: val,
            })?,
            None => DEFAULT_UPSTREAM_PORT,
        };

        let user = lookup("BITCOIN_RPC_USER").unwrap_or_else(|| {
            warn!("BITCOIN_RPC_USER not set, using placeholder default");
            DEFAULT_RPC_USER.to_string()
        });

        let password = lookup("BITCOIN_RPC_PASSWORD").unwrap_or_else(|| {
            warn!("BITCOIN_RPC_PASSWORD not set, using placeholder default");
            DEFAULT_RPC_PASSWORD.to_string()
        });

        // zero is rejected, not treated as "no timeout"
        let timeout_secs: u64 = match lookup("BTC_RPC_TIMEOUT_SECS") {
            Some(val) => match val.parse() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "BTC_RPC_TIMEOUT_SECS",
                        expected: "positive integer",
                        value: val,
                    });
                }
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            host,
            port,
            user,
            password,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Endpoint URL the node's JSON-RPC interface is posted to.
    pub fn url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen_addr: String,
    pub upstream: UpstreamConfig,
}

impl GatewayConfig {
    /// Upstream settings plus `GATEWAY_ADDR` (default `127.0.0.1:4000`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("GATEWAY_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let upstream = UpstreamConfig::from_lookup(&lookup)?;
        Ok(Self {
            listen_addr,
            upstream,
        })
    }
}
