use std::fmt;

use tracing::warn;

/// Returned when a command is cut short by Ctrl+C or SIGTERM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Interrupted, MCP server shut down")
    }
}

impl std::error::Error for Interrupted {}

/// Resolves on the first SIGINT or SIGTERM. If the handlers cannot be
/// installed it never resolves.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let handlers = signal(SignalKind::interrupt())
        .and_then(|sigint| Ok((sigint, signal(SignalKind::terminate())?)));
    let (mut sigint, mut sigterm) = match handlers {
        Ok(handlers) => handlers,
        Err(e) => {
            warn!("Failed to install signal handlers: {}", e);
            return std::future::pending().await;
        }
    };

    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
