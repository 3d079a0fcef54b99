//! Settings domain types and validation.
//!
//! This module contains the relay's runtime settings. Persistence is not the
//! relay's concern: callers load them from wherever they like (the CLI reads
//! an optional JSON file) and hand them in.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default wait between spawning a tool server and extracting its capabilities.
pub const DEFAULT_DISCOVERY_GRACE_MS: u64 = 1500;

/// Default spacing between discovery probe writes.
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 500;

/// Default deadline for a tool-backed chat turn.
pub const DEFAULT_CHAT_TIMEOUT_MS: u64 = 60_000;

/// Default cap for each captured output stream.
pub const DEFAULT_OUTPUT_BUFFER_BYTES: usize = 1024 * 1024;

/// Default wait between SIGTERM and SIGKILL when stopping a tool server.
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2000;

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Default OpenAI chat model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Smallest accepted output buffer cap.
const MIN_OUTPUT_BUFFER_BYTES: usize = 1024;

/// Relay settings.
///
/// All fields are optional to support partial configuration files and
/// graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelaySettings {
    /// Active provider: "openai", "ollama" or "mcp".
    pub provider: Option<String>,

    /// OpenAI API key (falls back to `OPENAI_API_KEY`).
    pub openai_api_key: Option<String>,

    /// OpenAI chat model.
    pub openai_model: Option<String>,

    /// Ollama base URL.
    pub ollama_url: Option<String>,

    /// Ollama model (required when the provider is "ollama").
    pub ollama_model: Option<String>,

    /// Sampling temperature forwarded to the chat APIs.
    pub temperature: Option<f32>,

    /// Wait after spawn before capabilities are extracted (milliseconds).
    pub discovery_grace_ms: Option<u64>,

    /// Spacing between discovery probe writes (milliseconds).
    pub probe_interval_ms: Option<u64>,

    /// Deadline for a tool-backed chat turn (milliseconds).
    pub chat_timeout_ms: Option<u64>,

    /// Cap per captured output stream (bytes).
    pub output_buffer_bytes: Option<usize>,

    /// Shell used to launch tool servers (defaults to `sh`, or `cmd` on Windows).
    pub shell: Option<String>,

    /// Wait between SIGTERM and SIGKILL when stopping a tool server (milliseconds).
    pub shutdown_grace_ms: Option<u64>,
}

impl RelaySettings {
    /// Get the effective discovery grace period.
    #[must_use]
    pub fn effective_discovery_grace(&self) -> Duration {
        Duration::from_millis(self.discovery_grace_ms.unwrap_or(DEFAULT_DISCOVERY_GRACE_MS))
    }

    /// Get the effective probe spacing.
    #[must_use]
    pub fn effective_probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.unwrap_or(DEFAULT_PROBE_INTERVAL_MS))
    }

    /// Get the effective chat turn deadline.
    #[must_use]
    pub fn effective_chat_timeout(&self) -> Duration {
        Duration::from_millis(self.chat_timeout_ms.unwrap_or(DEFAULT_CHAT_TIMEOUT_MS))
    }

    /// Get the effective output buffer cap.
    #[must_use]
    pub fn effective_output_buffer_bytes(&self) -> usize {
        self.output_buffer_bytes.unwrap_or(DEFAULT_OUTPUT_BUFFER_BYTES)
    }

    /// Get the effective shutdown grace period.
    #[must_use]
    pub fn effective_shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms.unwrap_or(DEFAULT_SHUTDOWN_GRACE_MS))
    }

    /// Get the effective Ollama base URL.
    #[must_use]
    pub fn effective_ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL)
    }

    /// Get the effective OpenAI model.
    #[must_use]
    pub fn effective_openai_model(&self) -> &str {
        self.openai_model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL)
    }

    /// Overlay `other` onto these settings, only replacing fields that are set.
    pub fn merge(&mut self, other: Self) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            provider,
            openai_api_key,
            openai_model,
            ollama_url,
            ollama_model,
            temperature,
            discovery_grace_ms,
            probe_interval_ms,
            chat_timeout_ms,
            output_buffer_bytes,
            shell,
            shutdown_grace_ms,
        );
    }
}

/// Errors that can occur during settings validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Invalid timeout: {field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("Invalid output buffer size: {0} bytes (minimum 1024)")]
    BufferTooSmall(usize),

    #[error("Invalid temperature: {0}. Must be between 0 and 2")]
    InvalidTemperature(String),

    #[error("Shell must not be empty")]
    EmptyShell,
}

/// Validate settings values.
pub fn validate_settings(settings: &RelaySettings) -> Result<(), SettingsError> {
    if settings.probe_interval_ms == Some(0) {
        return Err(SettingsError::ZeroTimeout {
            field: "probe_interval_ms",
        });
    }
    if settings.chat_timeout_ms == Some(0) {
        return Err(SettingsError::ZeroTimeout {
            field: "chat_timeout_ms",
        });
    }

    if let Some(bytes) = settings.output_buffer_bytes {
        if bytes < MIN_OUTPUT_BUFFER_BYTES {
            return Err(SettingsError::BufferTooSmall(bytes));
        }
    }

    if let Some(temperature) = settings.temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(SettingsError::InvalidTemperature(temperature.to_string()));
        }
    }

    if let Some(ref shell) = settings.shell {
        if shell.trim().is_empty() {
            return Err(SettingsError::EmptyShell);
        }
    }

    Ok(())
}
