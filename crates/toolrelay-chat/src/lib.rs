//! Chat backends and sessions for toolrelay.
//!
//! A [`ChatSession`] keeps the bounded conversation history and hands each
//! turn to a [`ChatBackend`](toolrelay_core::ChatBackend): the OpenAI or
//! Ollama HTTP APIs, or a tool server process.
#![deny(unsafe_code)]

pub mod backends;
pub mod error;
pub mod provider;
pub mod session;

pub use backends::{ModelTag, OllamaBackend, OpenAiBackend, ToolServerBackend};
pub use error::ChatError;
pub use provider::Provider;
pub use session::ChatSession;
