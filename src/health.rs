//! Liveness/readiness reporting for a single-model container.
//!
//! Consumed both by the IPC `health_check` message and as an internal gate
//! the orchestrator (`shutdown::ShutdownCoordinator`) can query without
//! spinning up a full inference request.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::shutdown::ContainerState;

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Detailed health report, served verbatim as the `health_response` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub state: HealthState,
    pub ready: bool,
    pub model_loaded: bool,
    pub device: String,
    pub uptime_secs: u64,
    pub requests_served: u64,
    pub requests_failed: u64,
}

/// Health check configuration.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Fraction of failed requests (of total served) above which the
    /// container reports `Degraded` instead of `Healthy`.
    pub degraded_failure_ratio: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { degraded_failure_ratio: 0.5 }
    }
}

/// Aggregates health information from runtime components.
pub struct HealthChecker {
    config: HealthConfig,
    start_time: Instant,
}

impl HealthChecker {
    pub fn new(config: HealthConfig) -> Self {
        Self { config, start_time: Instant::now() }
    }

    /// Liveness: the process is responsive. Always true once constructed.
    pub fn is_alive(&self) -> bool {
        true
    }

    /// Readiness: state == Serving and the model is loaded.
    pub fn is_ready(&self, state: ContainerState, model_loaded: bool) -> bool {
        state == ContainerState::Serving && model_loaded
    }

    /// Generate a full health report.
    pub fn report(
        &self,
        state: ContainerState,
        model_loaded: bool,
        device: &str,
        requests_served: u64,
        requests_failed: u64,
    ) -> HealthReport {
        let ready = self.is_ready(state, model_loaded);
        let health_state = self.compute_state(state, model_loaded, requests_served, requests_failed);

        HealthReport {
            state: health_state,
            ready,
            model_loaded,
            device: device.to_string(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            requests_served,
            requests_failed,
        }
    }

    fn compute_state(
        &self,
        state: ContainerState,
        model_loaded: bool,
        requests_served: u64,
        requests_failed: u64,
    ) -> HealthState {
        if state != ContainerState::Serving || !model_loaded {
            return HealthState::Unhealthy;
        }
        if requests_served > 0 {
            let ratio = requests_failed as f64 / requests_served as f64;
            if ratio >= self.config.degraded_failure_ratio {
                return HealthState::Degraded;
            }
        }
        HealthState::Healthy
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new(HealthConfig::default())
    }
}
