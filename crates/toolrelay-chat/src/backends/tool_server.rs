//! Chat turns answered by a tool server process.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use toolrelay_core::{BackendError, ChatBackend, ChatMessage, MessageRole, ServerConfig};
use toolrelay_mcp::{ProcessSupervisor, correlate};

/// Fields checked, in order, for the reply text of an object reply.
const REPLY_FIELDS: &[&str] = &["response", "content", "message", "text"];

/// Backend writing `{message, history}` to a tool server and waiting for the
/// JSON value it prints back.
pub struct ToolServerBackend {
    supervisor: Arc<ProcessSupervisor>,
    server: ServerConfig,
    timeout: Duration,
}

impl ToolServerBackend {
    pub const fn new(
        supervisor: Arc<ProcessSupervisor>,
        server: ServerConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            supervisor,
            server,
            timeout,
        }
    }

    pub const fn server(&self) -> &ServerConfig {
        &self.server
    }
}

#[async_trait]
impl ChatBackend for ToolServerBackend {
    fn label(&self) -> String {
        format!("mcp:{}", self.server.name)
    }

    async fn complete(&self, history: &[ChatMessage]) -> Result<String, BackendError> {
        let handle = self.supervisor.ensure_process(&self.server).await?;
        let payload = request_payload(history);

        debug!(server_name = %self.server.name, pid = ?handle.pid(), "Forwarding chat turn to tool server");
        let reply = correlate(&handle, &payload, self.timeout).await?;
        Ok(reply_text(&reply))
    }
}

/// `{message, history}`: the pending user message and everything before it.
fn request_payload(history: &[ChatMessage]) -> Value {
    let (message, earlier) = match history.split_last() {
        Some((last, earlier)) if last.role == MessageRole::User => (last.content.as_str(), earlier),
        _ => ("", history),
    };
    json!({
        "message": message,
        "history": earlier,
    })
}

/// Readable text of a tool server reply.
pub fn reply_text(reply: &Value) -> String {
    if let Value::String(text) = reply {
        return text.clone();
    }
    REPLY_FIELDS
        .iter()
        .find_map(|field| reply.get(*field).and_then(Value::as_str))
        .map_or_else(|| reply.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_splits_pending_message() {
        let history = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("first"),
            ChatMessage::assistant("answer"),
            ChatMessage::user("second"),
        ];

        let payload = request_payload(&history);
        assert_eq!(payload["message"], "second");
        assert_eq!(payload["history"].as_array().map(Vec::len), Some(3));
        assert_eq!(payload["history"][2]["role"], "assistant");
    }

    #[test]
    fn test_reply_text_shapes() {
        assert_eq!(reply_text(&json!("plain")), "plain");
        assert_eq!(reply_text(&json!({"response": "r", "text": "t"})), "r");
        assert_eq!(reply_text(&json!({"text": "t"})), "t");
        assert_eq!(reply_text(&json!({"answer": 42})), r#"{"answer":42}"#);
        assert_eq!(reply_text(&json!([1, 2])), "[1,2]");
    }
}
