//! Domain types shared across the relay.

pub mod chat;
pub mod tool_server;

pub use chat::{
    ChatMessage, ConversationHistory, MAX_HISTORY_ENTRIES, MessageRole, SYSTEM_PREAMBLE,
};
pub use tool_server::{
    CapabilityDescriptor, DiscoveryReply, EnvVar, ServerConfig, ServerKey, ServerType,
};
