//! Tool server lifecycle management for one chat session.
//!
//! The supervisor creates, tracks and tears down [`ProcessHandle`]s. It keeps
//! at most one handle per server identity and reuses it for as long as the
//! process stays alive.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};

use toolrelay_core::{RelaySettings, ServerConfig, ServerKey, ToolServerError};

use super::exit::ProcessExit;
use super::handle::ProcessHandle;

#[cfg(not(windows))]
const DEFAULT_SHELL: &str = "sh";
#[cfg(windows)]
const DEFAULT_SHELL: &str = "cmd";

/// Launch settings shared by every process of a supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Shell intermediary (defaults to `sh`, or `cmd` on Windows).
    pub shell: Option<String>,
    /// Cap per captured output stream.
    pub output_buffer_bytes: usize,
    /// Wait between SIGTERM and SIGKILL on shutdown.
    pub shutdown_grace: Duration,
}

impl SupervisorConfig {
    pub fn from_settings(settings: &RelaySettings) -> Self {
        Self {
            shell: settings.shell.clone(),
            output_buffer_bytes: settings.effective_output_buffer_bytes(),
            shutdown_grace: settings.effective_shutdown_grace(),
        }
    }

    pub(crate) fn shell_program(&self) -> &str {
        self.shell.as_deref().unwrap_or(DEFAULT_SHELL)
    }

    /// Flag telling the shell to run the next argument as a command line.
    pub(crate) fn shell_flag(&self) -> &'static str {
        let program = self.shell_program().to_ascii_lowercase();
        if program.ends_with("cmd") || program.ends_with("cmd.exe") {
            "/C"
        } else {
            "-c"
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self::from_settings(&RelaySettings::default())
    }
}

/// Manager for the tool server processes of one session.
///
/// Dropping the supervisor drops its handles, which stops their processes.
/// Call [`shutdown_all`](Self::shutdown_all) to wait for them to be reaped.
pub struct ProcessSupervisor {
    config: SupervisorConfig,
    /// Tracked handles indexed by server identity
    handles: RwLock<HashMap<ServerKey, Arc<ProcessHandle>>>,
}

impl ProcessSupervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            handles: RwLock::new(HashMap::new()),
        }
    }

    pub const fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Spawn a fresh process for `config`, replacing any tracked handle with
    /// the same identity.
    ///
    /// Only a configuration error is returned here. An OS spawn failure is
    /// logged and shows up as a handle in the `SpawnFailed` state.
    pub async fn spawn(&self, config: &ServerConfig) -> Result<Arc<ProcessHandle>, ToolServerError> {
        config.validate()?;

        let handle = Arc::new(ProcessHandle::launch(config.clone(), &self.config));
        let previous = self
            .handles
            .write()
            .await
            .insert(handle.key().clone(), Arc::clone(&handle));

        if let Some(previous) = previous {
            debug!(server_name = %config.name, "Replacing tracked tool server process");
            previous.request_shutdown();
        }

        Ok(handle)
    }

    /// Return the live handle for `config`, spawning one if there is none.
    ///
    /// A handle is reused only while its process is running and it has not
    /// been marked dead by a failed request. Unusable handles of other servers
    /// are dropped on the way.
    pub async fn ensure_process(
        &self,
        config: &ServerConfig,
    ) -> Result<Arc<ProcessHandle>, ToolServerError> {
        config.validate()?;
        let key = config.key();

        // Hold the write lock across check and insert so concurrent callers
        // with the same configuration share one process.
        let mut handles = self.handles.write().await;
        reap_locked(&mut handles);
        if let Some(existing) = handles.get(&key) {
            debug!(server_name = %config.name, pid = ?existing.pid(), "Reusing tool server process");
            return Ok(Arc::clone(existing));
        }

        let handle = Arc::new(ProcessHandle::launch(config.clone(), &self.config));
        handles.insert(key, Arc::clone(&handle));
        drop(handles);

        Ok(handle)
    }

    /// Tracked handle for `config`, if any.
    pub async fn get(&self, config: &ServerConfig) -> Option<Arc<ProcessHandle>> {
        self.handles.read().await.get(&config.key()).cloned()
    }

    /// All tracked handles.
    pub async fn handles(&self) -> Vec<Arc<ProcessHandle>> {
        self.handles.read().await.values().cloned().collect()
    }

    /// Number of tracked handles.
    pub async fn count(&self) -> usize {
        self.handles.read().await.len()
    }

    /// Stop tracking handles that are no longer usable.
    ///
    /// Processes that are still running but were marked dead are stopped.
    pub async fn reap_exited(&self) -> Vec<ServerKey> {
        reap_locked(&mut *self.handles.write().await)
    }

    /// Stop one tracked process and wait for it to be reaped.
    pub async fn shutdown(&self, key: &ServerKey) -> Option<ProcessExit> {
        let handle = self.handles.write().await.remove(key)?;
        let exit = handle.shutdown().await;
        info!(server = %key, status = %exit, "Tool server stopped");
        Some(exit)
    }

    /// Stop every tracked process and wait for all of them to be reaped.
    pub async fn shutdown_all(&self) {
        let handles: Vec<Arc<ProcessHandle>> =
            self.handles.write().await.drain().map(|(_, h)| h).collect();

        if handles.is_empty() {
            return;
        }

        let count = handles.len();
        futures_util::future::join_all(handles.iter().map(|h| h.shutdown())).await;
        info!(count, "Stopped all tool servers");
    }
}

fn reap_locked(handles: &mut HashMap<ServerKey, Arc<ProcessHandle>>) -> Vec<ServerKey> {
    let dead: Vec<ServerKey> = handles
        .iter()
        .filter(|(_, handle)| !handle.is_alive())
        .map(|(key, _)| key.clone())
        .collect();

    for key in &dead {
        if let Some(handle) = handles.remove(key) {
            handle.request_shutdown();
            debug!(server = %key, status = %handle.exit_status(), "Removed tool server from supervisor");
        }
    }
    dead
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_flag_matches_program() {
        let mut config = SupervisorConfig::default();
        config.shell = Some("/bin/bash".to_string());
        assert_eq!(config.shell_flag(), "-c");
        config.shell = Some("C:\\Windows\\System32\\cmd.exe".to_string());
        assert_eq!(config.shell_flag(), "/C");
    }

    #[tokio::test]
    async fn test_spawn_rejects_empty_command() {
        let supervisor = ProcessSupervisor::default();
        let result = supervisor.spawn(&ServerConfig::stdio("A", "", "")).await;
        assert!(matches!(result, Err(ToolServerError::Configuration(_))));
        assert_eq!(supervisor.count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_shell_yields_spawn_failed_handle() {
        let supervisor = ProcessSupervisor::new(SupervisorConfig {
            shell: Some("/nonexistent/shell".to_string()),
            ..SupervisorConfig::default()
        });

        let handle = supervisor
            .spawn(&ServerConfig::stdio("A", "echo", "hi"))
            .await
            .unwrap();

        assert!(matches!(
            handle.exit_status(),
            ProcessExit::SpawnFailed { .. }
        ));
        assert!(matches!(
            handle.ensure_usable(),
            Err(ToolServerError::Spawn { .. })
        ));
    }

    #[tokio::test]
    async fn test_exited_handles_are_reaped() {
        let supervisor = ProcessSupervisor::new(SupervisorConfig {
            shell: Some("/nonexistent/shell".to_string()),
            ..SupervisorConfig::default()
        });
        let ghost = ServerConfig::stdio("Ghost", "cat", "");
        supervisor.ensure_process(&ghost).await.unwrap();
        assert_eq!(supervisor.count().await, 1);

        let reaped = supervisor.reap_exited().await;
        assert_eq!(reaped, vec![ghost.key()]);
        assert_eq!(supervisor.count().await, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ensure_process_drops_exited_handles() {
        let supervisor = ProcessSupervisor::default();
        let short = ServerConfig::stdio("Short", "true", "");
        let long = ServerConfig::stdio("Long", "sleep", "30");

        let first = supervisor.ensure_process(&short).await.unwrap();
        first.wait_for_exit().await;
        assert_eq!(supervisor.count().await, 1);

        supervisor.ensure_process(&long).await.unwrap();
        assert_eq!(supervisor.count().await, 1);
        assert!(supervisor.get(&short).await.is_none());
        assert!(supervisor.get(&long).await.is_some());

        supervisor.shutdown_all().await;
    }

    #[tokio::test]
    async fn test_shutdown_unknown_key_is_none() {
        let supervisor = ProcessSupervisor::default();
        let key = ServerConfig::stdio("A", "cat", "").key();
        assert!(supervisor.shutdown(&key).await.is_none());
    }
}
