//! Tool server domain types.
//!
//! These types are shared between the relay backend and the browser frontend,
//! so their serialized form uses the frontend's camelCase field names.

use serde::{Deserialize, Serialize};

use crate::ports::ToolServerError;

/// Transport hint for a tool server.
///
/// Only stdio is acted on. Other values are accepted so that configurations
/// written for newer frontends still load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    /// Process spawned by the relay, spoken to over stdin/stdout
    #[default]
    Stdio,
    /// Remote server reached over server-sent events (not supported)
    Sse,
}

/// Environment variable entry for a tool server process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvVar {
    /// Environment variable key
    pub key: String,
    /// Environment variable value
    pub value: String,
}

impl EnvVar {
    /// Create a new environment variable entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// User-supplied description of a tool server.
///
/// `args` is a single whitespace-separated string. There is no quoting
/// support, so an argument containing a space cannot be expressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Display label (not guaranteed unique).
    pub name: String,

    /// Transport hint.
    #[serde(rename = "type")]
    pub server_type: ServerType,

    /// Executable path or name.
    pub command: String,

    /// Space-separated arguments.
    pub args: String,

    /// Ordered environment overrides; later keys win.
    pub env_vars: Vec<EnvVar>,
}

impl ServerConfig {
    /// Create a stdio server configuration.
    #[must_use]
    pub fn stdio(
        name: impl Into<String>,
        command: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            server_type: ServerType::Stdio,
            command: command.into(),
            args: args.into(),
            env_vars: Vec::new(),
        }
    }

    /// Append an environment override.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push(EnvVar::new(key, value));
        self
    }

    /// Validate the configuration.
    ///
    /// A missing command is fatal for this spawn attempt and is never retried.
    pub fn validate(&self) -> Result<(), ToolServerError> {
        if self.command.trim().is_empty() {
            return Err(ToolServerError::Configuration(format!(
                "Tool server '{}' has no command configured",
                self.name
            )));
        }
        Ok(())
    }

    /// Split `args` on whitespace, discarding empty tokens.
    pub fn split_args(&self) -> Vec<String> {
        self.args.split_whitespace().map(str::to_string).collect()
    }

    /// Resolve `env_vars` into the overrides applied on top of the inherited
    /// environment.
    ///
    /// Duplicate keys collapse to the last declared value, keeping the
    /// position of the first declaration.
    pub fn effective_env(&self) -> Vec<(String, String)> {
        let mut resolved: Vec<(String, String)> = Vec::with_capacity(self.env_vars.len());
        for var in &self.env_vars {
            if let Some(existing) = resolved.iter_mut().find(|(k, _)| *k == var.key) {
                existing.1.clone_from(&var.value);
            } else {
                resolved.push((var.key.clone(), var.value.clone()));
            }
        }
        resolved
    }

    /// Command line handed to the shell intermediary.
    pub fn shell_line(&self) -> String {
        let mut line = self.command.trim().to_string();
        for arg in self.split_args() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }

    /// Identity used to decide whether a running process can be reused.
    pub fn key(&self) -> ServerKey {
        ServerKey {
            name: self.name.clone(),
            command: self.command.trim().to_string(),
            args: self.split_args(),
            env: self.effective_env(),
        }
    }
}

/// Identity of a tool server within one session.
///
/// Names are not unique, so the launch parameters are part of the key: two
/// configurations with the same label but different commands get separate
/// processes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerKey {
    name: String,
    command: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl ServerKey {
    /// Display name of the server this key belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for ServerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.command)
    }
}

/// A capability ("tool") exposed by a tool server, observed or guessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    pub name: String,
    pub description: String,
    /// Owning server's display name.
    #[serde(default)]
    pub server_name: String,
    /// True when guessed from keywords or vendor lists.
    #[serde(default)]
    pub inferred: bool,
    /// True when this entry stands in for a failed server.
    #[serde(default)]
    pub error: bool,
}

impl CapabilityDescriptor {
    /// A descriptor read from the server's own output.
    pub fn observed(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            server_name: String::new(),
            inferred: false,
            error: false,
        }
    }

    /// A descriptor guessed by heuristics.
    pub fn inferred(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            inferred: true,
            ..Self::observed(name, description)
        }
    }

    /// A placeholder reporting that discovery failed for a server.
    pub fn failure(server_name: impl Into<String>, message: impl Into<String>) -> Self {
        let server_name = server_name.into();
        Self {
            name: server_name.clone(),
            description: message.into(),
            server_name,
            inferred: false,
            error: true,
        }
    }

    /// Stamp the owning server name.
    #[must_use]
    pub fn for_server(mut self, server_name: &str) -> Self {
        server_name.clone_into(&mut self.server_name);
        self
    }
}

/// Reply to a discovery request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiscoveryReply {
    Tools { tools: Vec<CapabilityDescriptor> },
    Error { error: String },
}

impl DiscoveryReply {
    /// Tools carried by the reply (empty for an error reply).
    pub fn tools(&self) -> &[CapabilityDescriptor] {
        match self {
            Self::Tools { tools } => tools,
            Self::Error { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_command() {
        let config = ServerConfig::stdio("A", "  ", "");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ToolServerError::Configuration(_)));
        assert!(err.to_string().contains("no command"));
    }

    #[test]
    fn test_split_args_discards_empty_tokens() {
        let config = ServerConfig::stdio("A", "npx", "  -y   @scope/server\t--flag ");
        assert_eq!(config.split_args(), vec!["-y", "@scope/server", "--flag"]);
        assert_eq!(config.shell_line(), "npx -y @scope/server --flag");
    }

    #[test]
    fn test_effective_env_later_keys_win() {
        let config = ServerConfig::stdio("A", "cmd", "")
            .with_env("TOKEN", "one")
            .with_env("MODE", "fast")
            .with_env("TOKEN", "two");
        assert_eq!(
            config.effective_env(),
            vec![
                ("TOKEN".to_string(), "two".to_string()),
                ("MODE".to_string(), "fast".to_string()),
            ]
        );
    }

    #[test]
    fn test_key_distinguishes_same_name_different_command() {
        let a = ServerConfig::stdio("Files", "fs-server", "");
        let b = ServerConfig::stdio("Files", "other-server", "");
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), a.clone().key());
    }

    #[test]
    fn test_server_config_deserializes_frontend_shape() {
        let json = r#"{
            "name": "Weather",
            "type": "stdio",
            "command": "node",
            "args": "server.js --verbose",
            "envVars": [{"key": "API_KEY", "value": "abc"}]
        }"#;
        let config: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.name, "Weather");
        assert_eq!(config.server_type, ServerType::Stdio);
        assert_eq!(config.split_args().len(), 2);
        assert_eq!(config.env_vars[0].key, "API_KEY");
    }

    #[test]
    fn test_descriptor_serializes_camel_case() {
        let tool = CapabilityDescriptor::inferred("Search", "Search the web").for_server("Web");
        let json = serde_json::to_value(&tool).unwrap();
        assert_eq!(json["serverName"], "Web");
        assert_eq!(json["inferred"], true);
        assert_eq!(json["error"], false);
    }

    #[test]
    fn test_discovery_reply_shapes() {
        let reply = DiscoveryReply::Error {
            error: "none".to_string(),
        };
        assert_eq!(serde_json::to_string(&reply).unwrap(), r#"{"error":"none"}"#);

        let reply = DiscoveryReply::Tools { tools: vec![] };
        assert_eq!(serde_json::to_string(&reply).unwrap(), r#"{"tools":[]}"#);
    }
}
