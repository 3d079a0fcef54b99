//! One chat conversation and the tool server processes it started.

use std::sync::Arc;

use tracing::{debug, info, warn};

use toolrelay_core::{ChatBackend, ConversationHistory};
use toolrelay_mcp::ProcessSupervisor;

use crate::error::ChatError;

/// A conversation with a bounded history.
///
/// The history is mutated only through `&mut self`. Share a session across
/// tasks by wrapping it in a `tokio::sync::Mutex`.
pub struct ChatSession {
    id: String,
    history: ConversationHistory,
    supervisor: Arc<ProcessSupervisor>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>, supervisor: Arc<ProcessSupervisor>) -> Self {
        Self {
            id: id.into(),
            history: ConversationHistory::new(),
            supervisor,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Supervisor owning this session's tool server processes.
    pub const fn supervisor(&self) -> &Arc<ProcessSupervisor> {
        &self.supervisor
    }

    /// Send `message` to `backend` and record the exchange.
    ///
    /// On failure the user message is taken back out of the history so it
    /// keeps strict user/assistant pairing.
    pub async fn turn(
        &mut self,
        message: &str,
        backend: &dyn ChatBackend,
    ) -> Result<String, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        self.history.push_user(message);
        debug!(session_id = %self.id, backend = %backend.label(), entries = self.history.len(), "Chat turn started");

        match backend.complete(self.history.messages()).await {
            Ok(reply) => {
                self.history.push_assistant(reply.clone());
                Ok(reply)
            }
            Err(e) => {
                self.history.discard_pending_user();
                warn!(session_id = %self.id, backend = %backend.label(), error = %e, "Chat turn failed");
                Err(e.into())
            }
        }
    }

    /// Like [`turn`](Self::turn), rendering a failure as `Error: <message>`.
    pub async fn respond(&mut self, message: &str, backend: &dyn ChatBackend) -> String {
        self.turn(message, backend)
            .await
            .unwrap_or_else(|e| format!("Error: {e}"))
    }

    /// Stop every tool server this session started.
    pub async fn close(self) {
        self.supervisor.shutdown_all().await;
        info!(session_id = %self.id, "Chat session closed");
    }
}
