//! Runtime record of one spawned tool server process.

use std::io;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{Mutex, MutexGuard, oneshot, watch};
use tracing::{debug, info, warn};

use toolrelay_core::{CapabilityDescriptor, ServerConfig, ServerKey, ToolServerError};

use super::exit::ProcessExit;
use super::shutdown::shutdown_child;
use super::supervisor::SupervisorConfig;
use crate::capture::{OutputBuffer, StreamKind, spawn_capture};

/// One spawned tool server process.
///
/// The child itself is owned by a monitor task that waits on it (reaping it
/// when it exits) and publishes the exit state. The handle keeps the stdin
/// pipe, the captured output and a channel asking the monitor to stop the
/// process. Dropping the last handle stops the process.
pub struct ProcessHandle {
    config: ServerConfig,
    key: ServerKey,
    pid: Option<u32>,
    stdin: Mutex<Option<ChildStdin>>,
    stdout: Arc<OutputBuffer>,
    stderr: Arc<OutputBuffer>,
    exit_rx: watch::Receiver<ProcessExit>,
    kill_tx: std::sync::Mutex<Option<oneshot::Sender<()>>>,
    available_tools: RwLock<Vec<CapabilityDescriptor>>,
    dead: AtomicBool,
    correlation: Mutex<()>,
}

impl ProcessHandle {
    /// Launch `config` through the configured shell.
    ///
    /// A failed OS spawn does not return an error: it yields a handle that is
    /// already in the [`ProcessExit::SpawnFailed`] state, so callers must
    /// check [`ensure_usable`](Self::ensure_usable) before relying on it.
    pub(crate) fn launch(config: ServerConfig, options: &SupervisorConfig) -> Self {
        let line = config.shell_line();
        let mut command = Command::new(options.shell_program());
        command
            .arg(options.shell_flag())
            .arg(&line)
            .envs(config.effective_env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(server_name = %config.name, command = %line, error = %e, "Failed to spawn tool server");
                return Self::spawn_failed(config, options, e.to_string());
            }
        };

        let pid = child.id();
        info!(server_name = %config.name, pid = ?pid, command = %line, "Spawned tool server");

        let stdout = Arc::new(OutputBuffer::new(
            StreamKind::Stdout,
            options.output_buffer_bytes,
        ));
        let stderr = Arc::new(OutputBuffer::new(
            StreamKind::Stderr,
            options.output_buffer_bytes,
        ));

        if let Some(out) = child.stdout.take() {
            spawn_capture(out, Arc::clone(&stdout), config.name.clone());
        } else {
            stdout.close();
        }
        if let Some(err) = child.stderr.take() {
            spawn_capture(err, Arc::clone(&stderr), config.name.clone());
        } else {
            stderr.close();
        }
        let stdin = child.stdin.take();

        let (exit_tx, exit_rx) = watch::channel(ProcessExit::Running);
        let (kill_tx, kill_rx) = oneshot::channel();
        spawn_monitor(
            child,
            kill_rx,
            exit_tx,
            config.name.clone(),
            options.shutdown_grace,
        );

        Self {
            key: config.key(),
            config,
            pid,
            stdin: Mutex::new(stdin),
            stdout,
            stderr,
            exit_rx,
            kill_tx: std::sync::Mutex::new(Some(kill_tx)),
            available_tools: RwLock::new(Vec::new()),
            dead: AtomicBool::new(false),
            correlation: Mutex::new(()),
        }
    }

    fn spawn_failed(config: ServerConfig, options: &SupervisorConfig, message: String) -> Self {
        let stdout = Arc::new(OutputBuffer::new(
            StreamKind::Stdout,
            options.output_buffer_bytes,
        ));
        let stderr = Arc::new(OutputBuffer::new(
            StreamKind::Stderr,
            options.output_buffer_bytes,
        ));
        stdout.close();
        stderr.close();

        let (_, exit_rx) = watch::channel(ProcessExit::SpawnFailed { message });

        Self {
            key: config.key(),
            config,
            pid: None,
            stdin: Mutex::new(None),
            stdout,
            stderr,
            exit_rx,
            kill_tx: std::sync::Mutex::new(None),
            available_tools: RwLock::new(Vec::new()),
            dead: AtomicBool::new(true),
            correlation: Mutex::new(()),
        }
    }

    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub const fn key(&self) -> &ServerKey {
        &self.key
    }

    /// Display name of the server.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Current lifecycle state.
    pub fn exit_status(&self) -> ProcessExit {
        self.exit_rx.borrow().clone()
    }

    /// Watch channel following the lifecycle state.
    pub fn exit_watch(&self) -> watch::Receiver<ProcessExit> {
        self.exit_rx.clone()
    }

    /// Whether the process is running and has not been marked dead.
    pub fn is_alive(&self) -> bool {
        self.exit_rx.borrow().is_running() && !self.dead.load(Ordering::SeqCst)
    }

    /// Check the handle can still be talked to.
    pub fn ensure_usable(&self) -> Result<(), ToolServerError> {
        match self.exit_status() {
            ProcessExit::SpawnFailed { message } => {
                Err(ToolServerError::spawn(self.name(), message))
            }
            ProcessExit::Running if !self.dead.load(Ordering::SeqCst) => Ok(()),
            ProcessExit::Running => Err(ToolServerError::process(
                self.name(),
                "process was marked unusable after an earlier failure",
            )),
            exit => Err(ToolServerError::process(self.name(), exit.to_string())),
        }
    }

    /// Mark the process as unusable for future turns.
    pub fn mark_dead(&self) {
        if !self.dead.swap(true, Ordering::SeqCst) {
            debug!(server_name = %self.name(), "Tool server marked dead");
        }
    }

    /// Write one line to the process's stdin.
    ///
    /// A trailing newline is added if missing.
    pub async fn send_line(&self, line: &str) -> io::Result<()> {
        let mut guard = self.stdin.lock().await;
        let stdin = guard
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin is closed"))?;

        stdin.write_all(line.as_bytes()).await?;
        if !line.ends_with('\n') {
            stdin.write_all(b"\n").await?;
        }
        stdin.flush().await
    }

    /// Write a JSON value as one newline-terminated line.
    pub async fn send_json(&self, value: &Value) -> io::Result<()> {
        let line = serde_json::to_string(value)?;
        self.send_line(&line).await
    }

    pub const fn stdout(&self) -> &Arc<OutputBuffer> {
        &self.stdout
    }

    pub const fn stderr(&self) -> &Arc<OutputBuffer> {
        &self.stderr
    }

    /// Retained stdout followed by retained stderr.
    pub fn combined_output(&self) -> String {
        let stdout = self.stdout.snapshot();
        let stderr = self.stderr.snapshot();
        match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout,
            (true, false) => stderr,
            (false, false) => format!("{stdout}\n{stderr}"),
        }
    }

    /// Capabilities cached by an earlier discovery, if any.
    pub fn cached_tools(&self) -> Option<Vec<CapabilityDescriptor>> {
        let tools = self
            .available_tools
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        (!tools.is_empty()).then(|| tools.clone())
    }

    /// Cache discovered capabilities. The first non-empty list wins.
    pub fn cache_tools(&self, tools: &[CapabilityDescriptor]) {
        if tools.is_empty() {
            return;
        }
        let mut cached = self
            .available_tools
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if cached.is_empty() {
            cached.extend_from_slice(tools);
        }
    }

    /// Serialize correlations on this handle.
    pub(crate) async fn begin_correlation(&self) -> MutexGuard<'_, ()> {
        self.correlation.lock().await
    }

    /// Ask the monitor to stop the process without waiting.
    pub fn request_shutdown(&self) {
        let sender = self
            .kill_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(());
        }
    }

    /// Wait until the process is no longer running.
    pub async fn wait_for_exit(&self) -> ProcessExit {
        let mut rx = self.exit_rx.clone();
        let finished = rx
            .wait_for(|exit| !exit.is_running())
            .await
            .map(|exit| exit.clone());
        finished.unwrap_or_else(|_| rx.borrow().clone())
    }

    /// Stop the process (SIGTERM, then SIGKILL) and wait for it to be reaped.
    pub async fn shutdown(&self) -> ProcessExit {
        self.request_shutdown();
        self.mark_dead();
        self.wait_for_exit().await
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("server", &self.config.name)
            .field("pid", &self.pid)
            .field("exit", &*self.exit_rx.borrow())
            .finish_non_exhaustive()
    }
}

/// Own the child until it exits or a stop is requested, then publish the
/// exit state. Waiting on the child here is what reaps it.
fn spawn_monitor(
    mut child: Child,
    kill_rx: oneshot::Receiver<()>,
    exit_tx: watch::Sender<ProcessExit>,
    server_name: String,
    grace: Duration,
) {
    tokio::spawn(async move {
        let exit = tokio::select! {
            status = child.wait() => ProcessExit::from_wait(status),
            // Fires on an explicit stop and when the handle is dropped
            _ = kill_rx => match shutdown_child(&mut child, grace).await {
                Ok(status) => ProcessExit::Killed { code: status.code() },
                Err(e) => ProcessExit::Failed { message: e.to_string() },
            },
        };

        if exit.is_error() {
            warn!(server_name = %server_name, status = %exit, "Tool server exited");
        } else {
            info!(server_name = %server_name, status = %exit, "Tool server exited");
        }

        exit_tx.send_replace(exit);
    });
}
