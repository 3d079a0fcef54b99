//! Available commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Start the configured tool servers and print their capabilities as JSON
    Discover {
        /// Tool server list (JSON array of server configurations)
        #[arg(short, long)]
        servers: PathBuf,
        /// Wait after spawn before reading output, in milliseconds
        #[arg(long)]
        grace_ms: Option<u64>,
    },

    /// Chat interactively, one message per line on stdin
    Chat(ChatArgs),

    /// List the models a provider offers
    Models {
        /// "openai" or "ollama"
        #[arg(short, long)]
        provider: String,
        /// Ollama base URL
        #[arg(long)]
        ollama_url: Option<String>,
    },
}

/// Arguments for the chat command. Anything left unset comes from settings.
#[derive(Args, Debug, Clone, Default)]
pub struct ChatArgs {
    /// "openai", "ollama" or "mcp"
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model for the openai or ollama provider
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Ollama base URL
    #[arg(long)]
    pub ollama_url: Option<String>,

    /// Tool server list, for the mcp provider
    #[arg(long)]
    pub servers: Option<PathBuf>,

    /// Name of the tool server to chat with (defaults to the first)
    #[arg(long)]
    pub server: Option<String>,
}
