//! Port definitions (traits and their error types) implemented by adapter crates.

mod chat_backend;
mod tool_error;

pub use chat_backend::{BackendError, ChatBackend};
pub use tool_error::ToolServerError;
