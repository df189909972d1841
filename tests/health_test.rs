//! Health check tests for the model container runtime.

use vas_model_container::health::{HealthChecker, HealthConfig, HealthState};
use vas_model_container::ipc::{decode_message, encode_message, HealthCheckResponse, IpcMessage};
use vas_model_container::shutdown::ContainerState;

// ----------------------------------------------------------------------
// HealthChecker
// ----------------------------------------------------------------------

#[test]
fn alive_always_true() {
    let checker = HealthChecker::default();
    assert!(checker.is_alive());
}

#[test]
fn ready_when_serving_with_model() {
    let checker = HealthChecker::default();
    assert!(checker.is_ready(ContainerState::Serving, true));
}

#[test]
fn not_ready_when_draining() {
    let checker = HealthChecker::default();
    assert!(!checker.is_ready(ContainerState::Draining, true));
}

#[test]
fn not_ready_when_model_not_loaded() {
    let checker = HealthChecker::default();
    assert!(!checker.is_ready(ContainerState::Serving, false));
}

#[test]
fn report_is_degraded_above_failure_ratio() {
    let checker = HealthChecker::new(HealthConfig { degraded_failure_ratio: 0.1 });
    let report = checker.report(ContainerState::Serving, true, "cpu", 100, 20);
    assert_eq!(report.state, HealthState::Degraded);
    assert!(report.ready);
}

#[test]
fn report_includes_all_fields() {
    let checker = HealthChecker::default();
    let report = checker.report(ContainerState::Serving, true, "cuda", 42, 1);
    assert!(report.ready);
    assert!(report.model_loaded);
    assert_eq!(report.device, "cuda");
    assert_eq!(report.requests_served, 42);
    assert_eq!(report.requests_failed, 1);
}

// ----------------------------------------------------------------------
// health_check / health_response wire round trip
// ----------------------------------------------------------------------

#[test]
fn health_check_roundtrip() {
    let message = IpcMessage::HealthCheck;
    let encoded = encode_message(&message).unwrap();
    let decoded = decode_message(&encoded).unwrap();
    assert!(matches!(decoded, IpcMessage::HealthCheck));
}

#[test]
fn health_response_roundtrip() {
    let checker = HealthChecker::default();
    let report = checker.report(ContainerState::Serving, true, "cpu", 10, 0);
    let message = IpcMessage::HealthResponse(HealthCheckResponse { report });

    let encoded = encode_message(&message).unwrap();
    let decoded = decode_message(&encoded).unwrap();

    match decoded {
        IpcMessage::HealthResponse(resp) => {
            assert_eq!(resp.report.state, HealthState::Healthy);
            assert!(resp.report.ready);
        }
        _ => panic!("expected HealthResponse message"),
    }
}
