//! Session-scoped supervisors.
//!
//! Each chat session owns its own [`ProcessSupervisor`]; there is no process
//! table shared across sessions.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::process::{ProcessSupervisor, SupervisorConfig};

/// Session id → supervisor of that session's tool server processes.
pub struct SessionRegistry {
    config: SupervisorConfig,
    sessions: RwLock<HashMap<String, Arc<ProcessSupervisor>>>,
}

impl SessionRegistry {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Supervisor for `session_id`, created on first use.
    pub async fn open(&self, session_id: &str) -> Arc<ProcessSupervisor> {
        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id, "Opening tool server session");
            Arc::new(ProcessSupervisor::new(self.config.clone()))
        }))
    }

    pub async fn get(&self, session_id: &str) -> Option<Arc<ProcessSupervisor>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Ids of the open sessions.
    pub async fn session_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Close a session and stop all of its processes.
    ///
    /// Returns `false` if no such session was open.
    pub async fn close(&self, session_id: &str) -> bool {
        let Some(supervisor) = self.sessions.write().await.remove(session_id) else {
            return false;
        };
        supervisor.shutdown_all().await;
        info!(session_id, "Closed tool server session");
        true
    }

    /// Close every session.
    pub async fn close_all(&self) {
        let supervisors: Vec<Arc<ProcessSupervisor>> =
            self.sessions.write().await.drain().map(|(_, s)| s).collect();
        futures_util::future::join_all(supervisors.iter().map(|s| s.shutdown_all())).await;
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SupervisorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_reuses_session_supervisor() {
        let registry = SessionRegistry::default();
        let first = registry.open("s1").await;
        let again = registry.open("s1").await;
        let other = registry.open("s2").await;

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(registry.session_ids().await.len(), 2);
    }

    #[tokio::test]
    async fn test_close_removes_session() {
        let registry = SessionRegistry::default();
        registry.open("s1").await;

        assert!(registry.close("s1").await);
        assert!(registry.get("s1").await.is_none());
        assert!(!registry.close("s1").await);
    }
}
