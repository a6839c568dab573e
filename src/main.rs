use btc_rpc_gateway::client::{self, CallArgs};
use btc_rpc_gateway::config::GatewayConfig;
use btc_rpc_gateway::server;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "btc_rpc_gateway")]
#[command(about = "JSON-RPC over HTTP gateway to a Bitcoin node")]
struct Opts {
    #[command(subcommand)]
    cmd: Option<Mode>,
}

/// CLI modes
#[derive(Subcommand, Debug)]
enum Mode {
    /// Run the gateway (default)
    Serve {
        /// Listen address, overrides GATEWAY_ADDR
        #[arg(short, long)]
        addr: Option<String>,
    },

    /// Send one request to a running gateway
    Call {
        #[command(flatten)]
        args: CallArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    server::metrics::init_logging();

    let opts = Opts::parse();
    match opts.cmd.unwrap_or(Mode::Serve { addr: None }) {
        Mode::Serve { addr } => {
            let mut config = GatewayConfig::from_env()?;
            if let Some(addr) = addr {
                config.listen_addr = addr;
            }
            server::run(config).await?;
        }

        Mode::Call { args } => {
            client::run_call(args).await?;
        }
    }
    Ok(())
}
