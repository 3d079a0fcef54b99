//! Provider selection.

use std::str::FromStr;
use std::sync::Arc;

use toolrelay_core::{ChatBackend, RelaySettings, ServerConfig};
use toolrelay_mcp::ProcessSupervisor;

use crate::backends::{OllamaBackend, OpenAiBackend, ToolServerBackend};
use crate::error::ChatError;

/// Source of assistant replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Ollama,
    /// A tool server process (`mcp`)
    ToolServer,
}

impl Provider {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::ToolServer => "mcp",
        }
    }

    /// Provider named in `settings`, `openai` when unset.
    pub fn from_settings(settings: &RelaySettings) -> Result<Self, ChatError> {
        settings.provider.as_deref().unwrap_or("openai").parse()
    }

    /// Build the backend for this provider.
    ///
    /// `server` is required for [`Provider::ToolServer`] and ignored
    /// otherwise.
    pub fn build_backend(
        self,
        settings: &RelaySettings,
        supervisor: &Arc<ProcessSupervisor>,
        server: Option<&ServerConfig>,
    ) -> Result<Box<dyn ChatBackend>, ChatError> {
        let backend: Box<dyn ChatBackend> = match self {
            Self::OpenAi => Box::new(OpenAiBackend::from_settings(settings)?),
            Self::Ollama => Box::new(OllamaBackend::from_settings(settings)?),
            Self::ToolServer => {
                let server = server.ok_or(ChatError::MissingToolServer)?;
                Box::new(ToolServerBackend::new(
                    Arc::clone(supervisor),
                    server.clone(),
                    settings.effective_chat_timeout(),
                ))
            }
        };
        Ok(backend)
    }
}

impl FromStr for Provider {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "mcp" => Ok(Self::ToolServer),
            _ => Err(ChatError::UnknownProvider(s.to_string())),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
