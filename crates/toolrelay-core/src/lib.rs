//! Core domain types and port definitions for toolrelay.
//!
//! This crate has no process, network or runtime dependencies. The tool
//! server supervisor (`toolrelay-mcp`), the chat backends (`toolrelay-chat`)
//! and the CLI build on the types defined here.
#![deny(unsafe_code)]

pub mod domain;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    CapabilityDescriptor, ChatMessage, ConversationHistory, DiscoveryReply, EnvVar,
    MAX_HISTORY_ENTRIES, MessageRole, SYSTEM_PREAMBLE, ServerConfig, ServerKey, ServerType,
};
pub use ports::{BackendError, ChatBackend, ToolServerError};
pub use settings::{RelaySettings, SettingsError, validate_settings};
