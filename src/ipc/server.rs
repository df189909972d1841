//! IPC Server (C5): the Unix domain socket accept loop.
//!
//! One task per accepted connection; requests on a connection are
//! pipelined (read-respond-read until EOF), each response going back
//! before the next request is read. Framing errors or oversize messages
//! close the connection without a response — they never reach the handler.

use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};

use super::connections::ConnectionTracker;
use super::handler::IpcHandler;
use super::protocol::MAX_MESSAGE_SIZE;
use crate::shutdown::ShutdownCoordinator;

/// Bind a Unix domain socket at `socket_path`, removing any stale socket
/// file left over from a previous run, and restricting permissions to the
/// owner (mode 0600).
pub fn bind(socket_path: &Path) -> io::Result<UnixListener> {
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if socket_path.exists() {
        std::fs::remove_file(socket_path)?;
    }

    let listener = UnixListener::bind(socket_path)?;
    std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
    Ok(listener)
}

/// Remove the socket file at shutdown. Best-effort: a missing file is not
/// an error.
pub fn unlink(socket_path: &Path) {
    let _ = std::fs::remove_file(socket_path);
}

/// Run the accept loop until `shutdown` leaves the `Serving` state.
/// Dispatch to `handler` never blocks this loop — each connection runs on
/// its own task.
///
/// `max_message_bytes` narrows the wire contract's 10 MiB hard cap
/// (`protocol::MAX_MESSAGE_SIZE`) down to the deployment's configured
/// limit; it can only ever be smaller, never larger.
pub async fn serve(
    listener: UnixListener,
    socket_path: PathBuf,
    handler: Arc<IpcHandler>,
    shutdown: Arc<ShutdownCoordinator>,
    connections: Arc<ConnectionTracker>,
    io_deadline: Duration,
    max_message_bytes: usize,
) {
    let max_message_bytes = max_message_bytes.min(MAX_MESSAGE_SIZE);
    loop {
        if !shutdown.is_accepting() {
            break;
        }

        let (stream, _addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };

        let Some(guard) = shutdown.track() else {
            // Lost the race with a shutdown transition between the
            // is_accepting() check and tracking this connection.
            continue;
        };

        let handler = handler.clone();
        let connections = connections.clone();
        tokio::spawn(async move {
            let connection_guard = connections.acquire();
            let metrics = handler_metrics(&handler);
            crate::telemetry::record_connection_opened(&metrics);
            metrics.set_gauge("active_connections", connections.active_count() as f64);

            if let Err(e) = handle_connection(stream, &handler, io_deadline, max_message_bytes).await {
                tracing::debug!(error = %e, "connection closed");
            }

            drop(connection_guard);
            crate::telemetry::record_connection_closed(&metrics);
            metrics.set_gauge("active_connections", connections.active_count() as f64);
            drop(guard);
        });
    }

    unlink(&socket_path);
}

// `IpcHandler` owns the metrics store privately; expose just enough to
// record connection lifecycle events without making the field public.
fn handler_metrics(handler: &IpcHandler) -> Arc<crate::telemetry::MetricsStore> {
    handler.metrics_handle()
}

async fn handle_connection(
    mut stream: UnixStream,
    handler: &IpcHandler,
    io_deadline: Duration,
    max_message_bytes: usize,
) -> io::Result<()> {
    loop {
        let read_result =
            tokio::time::timeout(io_deadline, read_frame(&mut stream, max_message_bytes)).await;
        let frame = match read_result {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => return Ok(()), // clean EOF between requests
            Ok(Err(_)) => return Ok(()),   // framing error: close without response
            Err(_elapsed) => return Ok(()), // deadline exceeded: close
        };

        let response = match handler.process(&frame).await {
            Ok(bytes) => bytes,
            Err(_) => return Ok(()),
        };

        let write_result = tokio::time::timeout(io_deadline, write_frame(&mut stream, &response)).await;
        match write_result {
            Ok(Ok(())) => {}
            _ => return Ok(()),
        }
    }
}

/// Read one `[u32 big-endian length][payload]` frame. Returns `Ok(None)` on
/// a clean EOF before any bytes of a new frame arrive. `max_message_bytes`
/// is the deployment-configured cap, never larger than the wire contract's
/// hard `MAX_MESSAGE_SIZE`.
async fn read_frame<S: tokio::io::AsyncRead + Unpin>(stream: &mut S, max_message_bytes: usize) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_message_bytes {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "frame exceeds max message size"));
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

async fn write_frame<S: tokio::io::AsyncWrite + Unpin>(stream: &mut S, payload: &[u8]) -> io::Result<()> {
    let len = payload.len() as u32;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(payload).await?;
    stream.flush().await
}
