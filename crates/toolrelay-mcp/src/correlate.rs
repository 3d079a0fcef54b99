//! Request/reply correlation over a tool server's stdin and stdout.
//!
//! Replies carry no framing or request id. A request is written as one JSON
//! line and the reply is whatever stdout produces next, accumulated until the
//! whole accumulation parses as a single JSON value.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use toolrelay_core::ToolServerError;

use crate::capture::OutputCursor;
use crate::process::{ProcessExit, ProcessHandle};

/// How long to keep reading stdout after the process has exited.
const EXIT_DRAIN: Duration = Duration::from_millis(250);

/// Send `payload` to `handle` and wait for the JSON value it answers with.
///
/// Only one correlation runs per handle at a time; later callers wait their
/// turn, and that wait counts against `timeout`. A timeout leaves the process
/// running. Any other failure marks the handle dead so the next turn starts a
/// fresh process.
///
/// # Errors
///
/// - [`ToolServerError::Spawn`] if the process never started
/// - [`ToolServerError::Process`] if the write fails, or the process exits or
///   closes stdout before a value is recovered
/// - [`ToolServerError::Timeout`] if nothing parses within `timeout`
pub async fn correlate(
    handle: &ProcessHandle,
    payload: &Value,
    timeout: Duration,
) -> Result<Value, ToolServerError> {
    let deadline = Instant::now() + timeout;

    let Ok(_turn) = tokio::time::timeout_at(deadline, handle.begin_correlation()).await else {
        debug!(server_name = %handle.name(), "Timed out waiting for an earlier request to finish");
        return Err(timeout_error(handle, timeout));
    };
    handle.ensure_usable()?;

    // Subscribe before writing so no part of the reply can be missed.
    let mut cursor = handle.stdout().subscribe();
    let mut exit = handle.exit_watch();

    if let Err(e) = handle.send_json(payload).await {
        handle.mark_dead();
        return Err(ToolServerError::process(
            handle.name(),
            format!("failed to write request: {e}"),
        ));
    }
    debug!(server_name = %handle.name(), "Request sent, waiting for reply");

    match tokio::time::timeout_at(deadline, read_reply(handle.name(), &mut cursor, &mut exit)).await
    {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(server_name = %handle.name(), error = %e, "Tool server failed during request");
            handle.mark_dead();
            Err(e)
        }
        Err(_) => Err(timeout_error(handle, timeout)),
    }
}

fn timeout_error(handle: &ProcessHandle, timeout: Duration) -> ToolServerError {
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    warn!(server_name = %handle.name(), timeout_ms, "Tool server reply timed out");
    ToolServerError::Timeout {
        server: handle.name().to_string(),
        timeout_ms,
    }
}

async fn read_reply(
    server_name: &str,
    cursor: &mut OutputCursor,
    exit: &mut watch::Receiver<ProcessExit>,
) -> Result<Value, ToolServerError> {
    let mut accumulated = String::new();
    let mut drain_until: Option<Instant> = None;

    loop {
        let exited = drain_until.is_some();
        let deadline = drain_until.unwrap_or_else(Instant::now);

        tokio::select! {
            biased;

            chunks = cursor.next_chunks() => {
                let Some(chunks) = chunks else {
                    return Err(closed_error(server_name, exit));
                };
                for chunk in chunks {
                    accumulated.push_str(&chunk);
                    // Reparses the whole accumulation per chunk, quadratic in
                    // reply size. Replies are small.
                    if let Ok(value) = serde_json::from_str::<Value>(&accumulated) {
                        return Ok(value);
                    }
                }
            }
            () = wait_for_exit(exit), if !exited => {
                // Output written just before exiting may still be in flight.
                drain_until = Some(Instant::now() + EXIT_DRAIN);
            }
            () = tokio::time::sleep_until(deadline), if exited => {
                return Err(closed_error(server_name, exit));
            }
        }
    }
}

async fn wait_for_exit(exit: &mut watch::Receiver<ProcessExit>) {
    // A closed channel still holds the final state, read by `closed_error`.
    let _ = exit.wait_for(|e| !e.is_running()).await;
}

fn closed_error(server_name: &str, exit: &watch::Receiver<ProcessExit>) -> ToolServerError {
    let status = exit.borrow().clone();
    let message = if status.is_running() {
        "output stream closed before a reply was received".to_string()
    } else {
        format!("{status} before a reply was received")
    };
    ToolServerError::process(server_name, message)
}
