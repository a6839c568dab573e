use std::future::Future;
use std::io;
use tokio::sync::watch;
use tracing::info;

/// Stop flag for the gateway's server loop.
///
/// The flag only ever goes from running to stopping. Waiters created after
/// [`ShutdownCoordinator::shutdown`] resolve immediately, and dropping the
/// coordinator releases every waiter as well.
pub struct ShutdownCoordinator {
    tx: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Future handed to `serve_listener`; completes once shutdown starts.
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            // Err: coordinator dropped, which also means stop
            let _ = rx.wait_for(|stopping| *stopping).await;
        }
    }

    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.tx.borrow()
    }

    /// Blocks until SIGINT or SIGTERM arrives, then starts shutdown.
    pub async fn shutdown_on_signal(&self) -> io::Result<()> {
        let name = termination_signal().await?;
        info!(signal = name, "starting graceful shutdown");
        self.shutdown();
        Ok(())
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves with the name of the first termination signal received.
#[cfg(unix)]
async fn termination_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn termination_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("CTRL+C")
}
