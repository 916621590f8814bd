//! Bridge binary: connect upstream, publish the catalog on stdio, run
//! until the transport ends or a shutdown signal arrives.
//!
//! Exit codes: 0 for a normal or signal-requested shutdown, 1 for any
//! startup failure.

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use mcp_tool_bridge::core::bridge::ToolBridge;
use mcp_tool_bridge::core::cli::Cli;
use mcp_tool_bridge::core::config::Config;
use mcp_tool_bridge::core::pidfile::PidFile;
use mcp_tool_bridge::core::{control, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env();
    cli.apply(&mut config)?;

    let log_control = logging::init(&config.logging);
    info!(
        name = %config.server.name,
        version = %config.server.version,
        mode = ?config.forwarding.mode,
        "Starting bridge"
    );

    // Keep serving even if the PID file cannot be written; only external
    // tooling loses out.
    let _pid_guard = match PidFile::create(&config.control.pid_file) {
        Ok(guard) => Some(guard),
        Err(e) => {
            warn!(
                path = %config.control.pid_file.display(),
                "Failed to write PID file: {e}"
            );
            None
        }
    };

    let (control_tx, control_rx) = tokio::sync::mpsc::channel(8);
    let mut control_tasks = vec![
        control::spawn_apply_task(log_control, control_rx),
        control::spawn_file_watcher(config.control.control_file.clone(), control_tx.clone()),
    ];
    #[cfg(unix)]
    control_tasks.push(control::spawn_signal_listener(
        config.control.control_file.clone(),
        control_tx,
    ));
    #[cfg(not(unix))]
    drop(control_tx);

    let mut bridge = ToolBridge::connect(&config)
        .await
        .context("failed to connect to upstream")?;
    let service = bridge
        .serve_stdio()
        .await
        .context("failed to start the outward transport")?;

    bridge.run_until_shutdown(service, shutdown_signal()).await?;

    for task in control_tasks.drain(..) {
        task.abort();
    }
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
