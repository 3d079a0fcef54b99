//! Models command handler.

use anyhow::{Result, bail};

use toolrelay_chat::backends::ollama;
use toolrelay_chat::{OpenAiBackend, Provider};

use crate::bootstrap::CliContext;

/// Print the models `provider` offers, one per line.
pub async fn execute(ctx: &CliContext, provider: &str, ollama_url: Option<&str>) -> Result<()> {
    match provider.parse::<Provider>()? {
        Provider::OpenAi => {
            let backend = OpenAiBackend::from_settings(&ctx.settings)?;
            for id in backend.list_models().await? {
                println!("{id}");
            }
        }
        Provider::Ollama => {
            let url = ollama_url.unwrap_or_else(|| ctx.settings.effective_ollama_url());
            for model in ollama::list_models(url).await? {
                println!("{}", model.name);
            }
        }
        Provider::ToolServer => {
            bail!("The mcp provider has no model list; use `toolrelay discover` instead")
        }
    }
    Ok(())
}
