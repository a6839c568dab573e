use crate::config::GatewayConfig;
use crate::server::handlers::build_rpc_server;
use crate::server::metrics::Metrics;
use crate::transport::shutdown::ShutdownCoordinator;
use crate::transport::HttpTransport;
use crate::upstream::{BitcoinClient, HttpUpstream};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

const METRICS_REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Wire up the gateway from `config` and serve until SIGINT/SIGTERM.
pub async fn run(config: GatewayConfig) -> Result<()> {
    info!(upstream = ?config.upstream, "configuring upstream");
    let upstream = HttpUpstream::new(&config.upstream)?;
    let client = Arc::new(BitcoinClient::new(Arc::new(upstream)));
    let server = Arc::new(build_rpc_server(client));
    let metrics = Arc::new(Metrics::new());

    // Spawn metrics reporter
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(METRICS_REPORT_INTERVAL).await;
            metrics_clone.log_report();
        }
    });

    let coordinator = ShutdownCoordinator::new();
    let stopped = coordinator.wait();
    tokio::spawn(async move {
        if let Err(e) = coordinator.shutdown_on_signal().await {
            error!("failed to install signal handlers: {}", e);
            // dropping the coordinator would release `stopped`
            std::future::pending::<()>().await;
        }
    });

    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!(
        listen = %config.listen_addr,
        upstream = %config.upstream.url(),
        timeout = ?config.upstream.timeout,
        "gateway ready"
    );

    HttpTransport::new(server)
        .with_metrics(metrics)
        .serve_listener(listener, stopped)
        .await?;

    info!("gateway stopped");
    Ok(())
}
