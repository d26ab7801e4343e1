use std::process::ExitCode;

use chrono::Utc;
use nc_pipeline::config::Config;
use nc_pipeline::logging::{init_tracing, LogConfig};
use nc_pipeline::runner;
use nc_pipeline::workers::WorkerManager;
use tokio::sync::broadcast;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    init_tracing(&LogConfig::from_env());
    let config = Config::from_env();
    tracing::debug!(trigger = ?config.trigger, scheduler = ?config.scheduler, "Loaded settings");

    if !config.scheduler.enabled {
        let result = runner::invoke(Utc::now(), &config.trigger).await;
        return ExitCode::from(runner::exit_code(&result));
    }

    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let worker_manager =
        WorkerManager::new(&config.trigger, shutdown_tx.subscribe(), &config.scheduler);
    let worker_handle = tokio::spawn(worker_manager.start());

    shutdown_signal(shutdown_tx).await;

    match worker_handle.await {
        Ok(Ok(())) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Worker manager failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "Worker task panicked");
            ExitCode::FAILURE
        }
    }
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler; waiting for Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
