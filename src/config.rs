//! Runtime configuration loading from environment variables.
//!
//! All configuration values are loaded from `VAS_MODEL_*` environment
//! variables with sensible defaults. Invalid values fall back to defaults
//! without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `VAS_MODEL_ID` | (required) | Model identifier this container serves |
//! | `VAS_MODEL_ROOT` | `/models` | Filesystem root model directories live under |
//! | `VAS_MODEL_SOCKET_DIR` | `/var/run/vas` | Directory IPC sockets are created in |
//! | `VAS_MODEL_MAX_MESSAGE_BYTES` | 10485760 | Max framed IPC message size (bytes) |
//! | `VAS_MODEL_IO_DEADLINE_SECS` | 30 | Per-connection I/O deadline |
//! | `VAS_MODEL_SHUTDOWN_GRACE_SECS` | 5 | Grace period before forcing socket close |
//! | `VAS_MODEL_LOG_FORMAT` | `json` | `json` or `pretty` |
//! | `VAS_MODEL_CPU_FALLBACK` | (descriptor-controlled) | Overrides descriptor's cpu_fallback_allowed when set |

use std::path::PathBuf;
use std::time::Duration;

/// Effective runtime configuration summary (loggable at startup).
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub model_id: String,
    pub models_root: PathBuf,
    pub socket_dir: PathBuf,
    pub max_message_bytes: usize,
    pub io_deadline_secs: u64,
    pub shutdown_grace_secs: u64,
    pub log_format: String,
}

/// All runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub model_id: String,
    pub models_root: PathBuf,
    pub socket_dir: PathBuf,
    pub max_message_bytes: usize,
    pub io_deadline: Duration,
    pub shutdown_grace: Duration,
    pub log_format: String,
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
/// `model_id` is the one value with no sensible default: an empty string
/// means the caller must fail loudly at startup (see `Container::bootstrap`).
pub fn load() -> EnvConfig {
    const DEFAULT_MAX_MESSAGE: usize = 10 * 1024 * 1024; // 10 MiB, per wire contract
    const MIN_MESSAGE: usize = 4096;

    let model_id = std::env::var("VAS_MODEL_ID").unwrap_or_default();
    let models_root = std::env::var("VAS_MODEL_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/models"));
    let socket_dir = std::env::var("VAS_MODEL_SOCKET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/run/vas"));

    // Clamped to [MIN_MESSAGE, DEFAULT_MAX_MESSAGE] — the wire contract's
    // 10 MiB cap is a hard ceiling this knob can only narrow, never raise.
    let max_message_bytes = parse_usize("VAS_MODEL_MAX_MESSAGE_BYTES", DEFAULT_MAX_MESSAGE);
    let max_message_bytes = max_message_bytes.clamp(MIN_MESSAGE, DEFAULT_MAX_MESSAGE);

    let io_deadline_secs = parse_u64("VAS_MODEL_IO_DEADLINE_SECS", 30).max(1);
    let shutdown_grace_secs = parse_u64("VAS_MODEL_SHUTDOWN_GRACE_SECS", 5).max(1);

    let log_format = std::env::var("VAS_MODEL_LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let log_format = match log_format.as_str() {
        "pretty" => "pretty".to_string(),
        _ => "json".to_string(),
    };

    EnvConfig {
        model_id,
        models_root,
        socket_dir,
        max_message_bytes,
        io_deadline: Duration::from_secs(io_deadline_secs),
        shutdown_grace: Duration::from_secs(shutdown_grace_secs),
        log_format,
    }
}

impl EnvConfig {
    /// Return a loggable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            model_id: self.model_id.clone(),
            models_root: self.models_root.clone(),
            socket_dir: self.socket_dir.clone(),
            max_message_bytes: self.max_message_bytes,
            io_deadline_secs: self.io_deadline.as_secs(),
            shutdown_grace_secs: self.shutdown_grace.as_secs(),
            log_format: self.log_format.clone(),
        }
    }

    /// Socket path this container's server binds to.
    pub fn socket_path(&self) -> PathBuf {
        self.socket_dir.join(format!("vas_model_{}.sock", self.model_id))
    }
}
