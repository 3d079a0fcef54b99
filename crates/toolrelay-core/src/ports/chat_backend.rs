//! Chat backend port.
//!
//! This port defines the interface for anything that can produce the next
//! assistant message from a conversation: the OpenAI and Ollama HTTP APIs,
//! or a tool server process.

use async_trait::async_trait;
use thiserror::Error;

use super::ToolServerError;
use crate::domain::ChatMessage;

/// Errors returned by chat backends.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend is missing required settings (API key, model, ...).
    #[error("{0}")]
    Configuration(String),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("{backend} request failed: {message}")]
    Transport { backend: String, message: String },

    /// The API answered with a non-success status.
    #[error("{backend} API error ({status}): {message}")]
    Api {
        backend: String,
        status: u16,
        message: String,
    },

    /// The API answered with a body of unexpected shape.
    #[error("{backend} returned an unexpected response: {message}")]
    InvalidResponse { backend: String, message: String },

    /// A tool-backed turn failed.
    #[error(transparent)]
    ToolServer(#[from] ToolServerError),
}

/// Port for generating the next assistant message.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short label used in logs (e.g. "openai:gpt-4o").
    fn label(&self) -> String;

    /// Produce the assistant reply for `history`.
    ///
    /// `history` starts with the system preamble and ends with the pending
    /// user message.
    async fn complete(&self, history: &[ChatMessage]) -> Result<String, BackendError>;
}
