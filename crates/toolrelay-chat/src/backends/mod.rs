//! [`ChatBackend`](toolrelay_core::ChatBackend) implementations.

mod http;
pub mod ollama;
pub mod openai;
pub mod tool_server;

pub use ollama::{ModelTag, OllamaBackend, normalize_ollama_url};
pub use openai::OpenAiBackend;
pub use tool_server::ToolServerBackend;
