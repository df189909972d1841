//! Model container entry point.
//!
//! Bootstraps the container (discover -> load -> serve), then awaits
//! SIGINT/SIGTERM to drive a bounded graceful shutdown of the IPC socket.

use vas_model_container::telemetry::{init_logging, LogConfig, LogFormat};
use vas_model_container::{config, BootstrapError, Container};

#[tokio::main]
async fn main() {
    let env_config = config::load();

    let log_format = match env_config.log_format.as_str() {
        "pretty" => LogFormat::Pretty,
        _ => LogFormat::Json,
    };
    if let Err(e) = init_logging(&LogConfig { format: log_format, ..Default::default() }) {
        eprintln!("failed to initialize logging: {e}");
    }

    tracing::info!(effective_config = ?env_config.effective_config(), "starting");

    let container = match Container::bootstrap(env_config).await {
        Ok(container) => container,
        Err(e) => {
            tracing::error!(error = %e, "fatal startup error");
            std::process::exit(exit_code_for(&e));
        }
    };

    let shutdown = container.shutdown.clone();
    let grace = container.config.shutdown_grace;

    tokio::select! {
        result = container.serve() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "accept loop exited with error");
                std::process::exit(1);
            }
        }
        _ = wait_for_termination() => {
            tracing::info!("shutdown signal received, draining");
            let result = shutdown.initiate(grace).await;
            tracing::info!(?result, "shutdown complete");
        }
    }
}

async fn wait_for_termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn exit_code_for(error: &BootstrapError) -> i32 {
    match error {
        BootstrapError::NoModelConfigured => 2,
        BootstrapError::ModelNotDiscovered(_) => 3,
        BootstrapError::EngineLoad(_) => 4,
    }
}
