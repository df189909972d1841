//! AI Model Container runtime for the video analytics serving edge.
//!
//! A single container instance loads exactly one model and serves inference
//! requests for it over a Unix domain socket. It has no authority beyond
//! that: no multi-model routing, no network ingress, no business logic.
//!
//! # Design Principles
//!
//! - **Single model**: one container, one model, for its whole lifetime.
//! - **Local only**: IPC over a Unix domain socket, never a network port.
//! - **Fail closed**: a bad descriptor, a missing accelerator, or a frame
//!   read error never falls back to a guess — it is reported or it is fatal.
//!
//! # Filesystem Boundaries
//!
//! - Read: `models_root` (descriptors and weights), frame references passed
//!   in each request.
//! - Write: the IPC socket file, under `socket_dir`.
//! - Network: none.

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod frame;
pub mod health;
pub mod ipc;
pub mod shutdown;
pub mod telemetry;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use config::EnvConfig;
use descriptor::{discover, DiscoveryRegistry, ModelDescriptor};
use engine::{device::detect_accelerator, InferenceEngine};
use health::{HealthChecker, HealthConfig};
use ipc::IpcHandler;
use shutdown::{ContainerState, ShutdownCoordinator};
use telemetry::MetricsStore;

/// Fatal startup errors. Every variant here means the process must exit
/// non-zero with no auto-restart — there is no degraded mode to fall back
/// to for a container that cannot load its one model.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("VAS_MODEL_ID is not set; this container has no model to serve")]
    NoModelConfigured,

    #[error("model '{0}' was not found among discovered models")]
    ModelNotDiscovered(String),

    #[error("failed to load model: {0}")]
    EngineLoad(#[from] engine::InferenceError),
}

/// A single model container: everything wired together and ready to serve.
pub struct Container {
    pub config: EnvConfig,
    pub descriptor: ModelDescriptor,
    pub discovery: DiscoveryRegistry,
    pub engine: Arc<InferenceEngine>,
    pub handler: Arc<IpcHandler>,
    pub health: Arc<HealthChecker>,
    pub shutdown: Arc<ShutdownCoordinator>,
    pub metrics: Arc<MetricsStore>,
}

impl Container {
    /// Run the full `Init -> Discovering -> Loading -> Serving` startup
    /// sequence against `config`. Any failure here is fatal: the caller
    /// should log it and exit non-zero.
    pub async fn bootstrap(config: EnvConfig) -> Result<Self, BootstrapError> {
        let shutdown = Arc::new(ShutdownCoordinator::new());

        if config.model_id.is_empty() {
            return Err(BootstrapError::NoModelConfigured);
        }

        shutdown.advance(ContainerState::Discovering).await.expect("Init -> Discovering");
        let discovery = discover(&config.models_root);
        let descriptor = discovery
            .get(&config.model_id)
            .cloned()
            .ok_or_else(|| BootstrapError::ModelNotDiscovered(config.model_id.clone()))?;

        shutdown.advance(ContainerState::Loading).await.expect("Discovering -> Loading");
        let model_dir = descriptor::model_dir(&config.models_root, &config.model_id);
        let weights_path = descriptor.resolved_weights_path(&model_dir);
        let detected = detect_accelerator();
        let engine = Arc::new(InferenceEngine::load(descriptor.clone(), &weights_path, detected)?);

        let class_names = load_class_names(&model_dir);
        let health = Arc::new(HealthChecker::new(HealthConfig::default()));
        let metrics = Arc::new(MetricsStore::new());
        let handler = Arc::new(IpcHandler::new(
            engine.clone(),
            descriptor.clone(),
            class_names,
            health.clone(),
            shutdown.clone(),
            metrics.clone(),
        ));

        shutdown.advance(ContainerState::Serving).await.expect("Loading -> Serving");

        Ok(Self { config, descriptor, discovery, engine, handler, health, shutdown, metrics })
    }

    /// Bind the socket and run the accept loop until shutdown is initiated
    /// elsewhere (typically a signal handler calling
    /// `self.shutdown.initiate`).
    pub async fn serve(&self) -> std::io::Result<()> {
        let socket_path = self.config.socket_path();
        let listener = ipc::server::bind(&socket_path)?;
        let connections = Arc::new(ipc::ConnectionTracker::new());

        tracing::info!(
            model_id = %self.descriptor.model_id,
            socket = %socket_path.display(),
            device = %self.engine.device(),
            "serving"
        );

        ipc::server::serve(
            listener,
            socket_path,
            self.handler.clone(),
            self.shutdown.clone(),
            connections,
            self.config.io_deadline,
            self.config.max_message_bytes,
        )
        .await;

        Ok(())
    }

    /// Initiate graceful shutdown, waiting up to `config.shutdown_grace`
    /// for in-flight requests to drain before the socket is forced closed.
    pub async fn shutdown(&self) -> shutdown::ShutdownResult {
        self.shutdown.initiate(self.config.shutdown_grace).await
    }
}

/// Load an optional `classes.txt` sidecar (one class name per line) from a
/// model's directory. Missing file or unreadable content yields an empty
/// list; the handler falls back to `class_{id}` per class with no name.
fn load_class_names(model_dir: &Path) -> Vec<String> {
    let path = model_dir.join("classes.txt");
    match std::fs::read_to_string(path) {
        Ok(content) => content.lines().map(|line| line.trim().to_string()).collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_classes_file_yields_empty_list() {
        let names = load_class_names(Path::new("/nonexistent/model/dir"));
        assert!(names.is_empty());
    }

    #[test]
    fn classes_file_is_split_by_line() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("classes.txt"), "car\ntruck\nbus\n").unwrap();
        let names = load_class_names(tmp.path());
        assert_eq!(names, vec!["car", "truck", "bus"]);
    }

    #[tokio::test]
    async fn bootstrap_fails_without_model_id() {
        let mut config = config::load();
        config.model_id = String::new();
        let result = Container::bootstrap(config).await;
        assert!(matches!(result, Err(BootstrapError::NoModelConfigured)));
    }
}
