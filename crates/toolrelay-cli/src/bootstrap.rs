//! CLI bootstrap - the composition root.
//!
//! Settings and tool server lists are read here and the session registry is
//! created. Command handlers receive the composed [`CliContext`].

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::debug;

use toolrelay_core::{RelaySettings, ServerConfig, validate_settings};
use toolrelay_mcp::{ProcessSupervisor, SessionRegistry, SupervisorConfig};

/// Composed context for CLI commands.
pub struct CliContext {
    pub settings: RelaySettings,
    pub registry: SessionRegistry,
}

impl CliContext {
    /// Supervisor for a named session, created on first use.
    pub async fn session(&self, session_id: &str) -> Arc<ProcessSupervisor> {
        self.registry.open(session_id).await
    }

    /// Stop every process started through this context.
    pub async fn shutdown(&self) {
        self.registry.close_all().await;
    }
}

/// Load settings and compose the context.
pub fn bootstrap(config_path: Option<&Path>) -> Result<CliContext> {
    let settings = load_settings(config_path)?;
    let registry = SessionRegistry::new(SupervisorConfig::from_settings(&settings));
    Ok(CliContext { settings, registry })
}

/// Read settings from `path`, if given, and validate them.
///
/// Unset fields keep their defaults.
pub fn load_settings(path: Option<&Path>) -> Result<RelaySettings> {
    let mut settings = RelaySettings::default();

    if let Some(path) = path {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let file: RelaySettings = serde_json::from_str(&text)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        settings.merge(file);
        debug!(path = %path.display(), "Loaded settings");
    }

    validate_settings(&settings)?;
    Ok(settings)
}

/// Read a tool server list: a JSON array of server configurations.
pub fn load_servers(path: &Path) -> Result<Vec<ServerConfig>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read server list {}", path.display()))?;
    let servers: Vec<ServerConfig> = serde_json::from_str(&text)
        .with_context(|| format!("Invalid server list {}", path.display()))?;
    debug!(path = %path.display(), count = servers.len(), "Loaded tool server list");
    Ok(servers)
}

/// Pick the server named `name`, or the first one.
pub fn select_server(servers: &[ServerConfig], name: Option<&str>) -> Result<ServerConfig> {
    let selected = match name {
        Some(name) => servers.iter().find(|s| s.name == name),
        None => servers.first(),
    };
    match (selected, name) {
        (Some(server), _) => Ok(server.clone()),
        (None, Some(name)) => bail!("No tool server named '{name}' in the server list"),
        (None, None) => bail!("The server list is empty"),
    }
}
