//! Chat command handler.
//!
//! Reads one message per line from stdin and prints each reply, or
//! `Error: <message>` when the turn failed. The conversation survives
//! failed turns.

use anyhow::{Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};

use toolrelay_chat::{ChatSession, Provider};
use toolrelay_core::RelaySettings;

use crate::bootstrap::{CliContext, load_servers, select_server};
use crate::commands::ChatArgs;

const CHAT_SESSION: &str = "chat";

pub async fn execute(ctx: &CliContext, args: ChatArgs) -> Result<()> {
    let provider = match args.provider.as_deref() {
        Some(name) => name.parse::<Provider>()?,
        None => Provider::from_settings(&ctx.settings)?,
    };
    let settings = apply_overrides(&ctx.settings, provider, &args);

    let server = match (provider, &args.servers) {
        (Provider::ToolServer, Some(path)) => Some(select_server(
            &load_servers(path)?,
            args.server.as_deref(),
        )?),
        (Provider::ToolServer, None) => bail!("--servers is required for the mcp provider"),
        _ => None,
    };

    let supervisor = ctx.session(CHAT_SESSION).await;
    let backend = provider.build_backend(&settings, &supervisor, server.as_ref())?;
    let mut session = ChatSession::new(CHAT_SESSION, supervisor);

    eprintln!("Chatting via {} (Ctrl-D to quit)", backend.label());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = session.respond(&line, backend.as_ref()).await;
        println!("{reply}");
    }

    session.close().await;
    Ok(())
}

/// Settings with the command-line overrides applied.
fn apply_overrides(base: &RelaySettings, provider: Provider, args: &ChatArgs) -> RelaySettings {
    let mut settings = base.clone();
    settings.provider = Some(provider.as_str().to_string());

    if let Some(model) = &args.model {
        match provider {
            Provider::OpenAi => settings.openai_model = Some(model.clone()),
            Provider::Ollama => settings.ollama_model = Some(model.clone()),
            Provider::ToolServer => {}
        }
    }
    if args.temperature.is_some() {
        settings.temperature = args.temperature;
    }
    if args.ollama_url.is_some() {
        settings.ollama_url.clone_from(&args.ollama_url);
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_override_targets_provider() {
        let args = ChatArgs {
            model: Some("llama3".to_string()),
            temperature: Some(0.7),
            ..ChatArgs::default()
        };

        let settings = apply_overrides(&RelaySettings::default(), Provider::Ollama, &args);
        assert_eq!(settings.ollama_model.as_deref(), Some("llama3"));
        assert_eq!(settings.openai_model, None);
        assert_eq!(settings.temperature, Some(0.7));
        assert_eq!(settings.provider.as_deref(), Some("ollama"));
    }
}
