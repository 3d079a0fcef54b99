//! Command-line interface for toolrelay.
#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod handlers;
pub mod parser;

pub use bootstrap::{CliContext, bootstrap, load_servers, load_settings, select_server};
pub use commands::{ChatArgs, Commands};
pub use parser::Cli;
