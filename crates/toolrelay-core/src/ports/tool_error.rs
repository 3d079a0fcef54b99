//! Tool server error types.
//!
//! This module defines the failure modes of the process supervisor and the
//! discovery engine. Not finding any capability in a server's output is not
//! one of them: extraction falls back to a placeholder descriptor instead.

use thiserror::Error;

/// Errors raised while launching or talking to a tool server process.
#[derive(Debug, Clone, Error)]
pub enum ToolServerError {
    /// The configuration cannot be launched (e.g. no command). Not retried.
    #[error("Invalid tool server configuration: {0}")]
    Configuration(String),

    /// The OS refused to create the process.
    #[error("Failed to spawn tool server '{server}': {message}")]
    Spawn { server: String, message: String },

    /// No parseable response arrived before the deadline. The process is
    /// left running.
    #[error("Tool server '{server}' did not respond within {timeout_ms}ms")]
    Timeout { server: String, timeout_ms: u64 },

    /// The process exited, errored or closed its output mid-request.
    #[error("Tool server '{server}' failed: {message}")]
    Process { server: String, message: String },
}

impl ToolServerError {
    pub fn spawn(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Spawn {
            server: server.into(),
            message: message.into(),
        }
    }

    pub fn process(server: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Process {
            server: server.into(),
            message: message.into(),
        }
    }
}
