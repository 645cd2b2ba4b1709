// SPDX-FileCopyrightText: 2025 Jörg Thalheim
// SPDX-License-Identifier: MIT

use sqlbridge_daemon::config::Config;
use sqlbridge_daemon::error::{DaemonError, IoContext};
use sqlbridge_daemon::server::DaemonServer;
use sqlbridge_session::SessionHandler;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), DaemonError> {
    // Load configuration
    let config = match std::env::var("SQLBRIDGE_DAEMON_CONFIG") {
        Ok(path) => Config::from_file(&PathBuf::from(path))?,
        Err(_) => Config::default(),
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| DaemonError::config(format!("Invalid log level: {e}")))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting sqlbridge-daemon");
    info!("Socket path: {}", config.socket_path.display());
    info!("Data directory: {}", config.data_dir.display());
    info!("Bundle directory: {}", config.bundle_dir.display());

    let handler = SessionHandler::new(config.resolver());
    let server = DaemonServer::new(handler.clone(), config.socket_path.clone());

    // Set up signal handlers
    let shutdown = shutdown_signal();

    // Run the server
    tokio::select! {
        result = server.serve() => {
            if let Err(e) = result {
                error!("Server error: {e}");
                return Err(DaemonError::io("Server error", e));
            }
        }
        result = shutdown => {
            result.io_context(|| "Failed to install signal handlers".to_string())?;
            info!("Received shutdown signal");
        }
    }

    // Clean up: remove socket file
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path).io_context(|| {
            format!(
                "Failed to remove socket file at {}",
                config.socket_path.display()
            )
        })?;
    }

    // Let queued requests finish, then close every database.
    handler.shutdown().await?;

    info!("sqlbridge-daemon stopped");
    Ok(())
}

async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c().await
}
