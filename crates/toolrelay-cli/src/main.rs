//! CLI entry point - the composition root.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use toolrelay_cli::{Cli, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables (OPENAI_API_KEY, RUST_LOG, ...)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so command output on stdout stays machine-readable
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let ctx = bootstrap(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Discover { servers, grace_ms } => {
            handlers::discover::execute(&ctx, &servers, grace_ms).await
        }
        Commands::Chat(args) => handlers::chat::execute(&ctx, args).await,
        Commands::Models {
            provider,
            ollama_url,
        } => handlers::models::execute(&ctx, &provider, ollama_url.as_deref()).await,
    };

    ctx.shutdown().await;
    result
}
