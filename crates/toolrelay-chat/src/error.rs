//! Chat-level errors.

use thiserror::Error;
use toolrelay_core::BackendError;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("The mcp provider needs a tool server to talk to")]
    MissingToolServer,

    #[error("Message is empty")]
    EmptyMessage,

    #[error(transparent)]
    Backend(#[from] BackendError),
}
