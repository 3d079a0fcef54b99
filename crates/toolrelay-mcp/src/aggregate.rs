//! Capability discovery across every configured tool server.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use toolrelay_core::{
    CapabilityDescriptor, DiscoveryReply, RelaySettings, ServerConfig, ToolServerError,
};

use crate::extract::{extract, is_placeholder};
use crate::probe::probe;
use crate::process::ProcessSupervisor;

/// Error text returned when discovery is asked about no servers at all.
pub const NO_SERVERS_CONFIGURED: &str = "No MCP servers configured";

/// Timing of one discovery pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Wait after spawn before the output is read.
    pub grace: Duration,
    /// Spacing between probe writes.
    pub probe_interval: Duration,
}

impl DiscoveryOptions {
    pub fn from_settings(settings: &RelaySettings) -> Self {
        Self {
            grace: settings.effective_discovery_grace(),
            probe_interval: settings.effective_probe_interval(),
        }
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::from_settings(&RelaySettings::default())
    }
}

/// Fans capability discovery out over the processes of one supervisor.
pub struct ToolAggregator {
    supervisor: Arc<ProcessSupervisor>,
    options: DiscoveryOptions,
}

impl ToolAggregator {
    pub const fn new(supervisor: Arc<ProcessSupervisor>, options: DiscoveryOptions) -> Self {
        Self {
            supervisor,
            options,
        }
    }

    pub const fn supervisor(&self) -> &Arc<ProcessSupervisor> {
        &self.supervisor
    }

    /// Discover the capabilities of every server in `configs`.
    ///
    /// Never fails as a whole: a server that cannot be started contributes
    /// one `error` descriptor carrying the reason. Results keep configuration
    /// order.
    pub async fn discover_all(&self, configs: &[ServerConfig]) -> DiscoveryReply {
        if configs.is_empty() {
            return DiscoveryReply::Error {
                error: NO_SERVERS_CONFIGURED.to_string(),
            };
        }

        info!(count = configs.len(), "Discovering tool server capabilities");

        let per_server = join_all(configs.iter().map(|config| self.discover_one(config))).await;

        let tools: Vec<CapabilityDescriptor> = per_server
            .into_iter()
            .zip(configs)
            .flat_map(|(result, config)| {
                result.unwrap_or_else(|e| {
                    warn!(server_name = %config.name, error = %e, "Discovery failed");
                    vec![CapabilityDescriptor::failure(&config.name, e.to_string())]
                })
            })
            .collect();

        info!(tool_count = tools.len(), "Discovery finished");
        DiscoveryReply::Tools { tools }
    }

    async fn discover_one(
        &self,
        config: &ServerConfig,
    ) -> Result<Vec<CapabilityDescriptor>, ToolServerError> {
        let handle = self.supervisor.ensure_process(config).await?;

        if let Some(tools) = handle.cached_tools() {
            debug!(server_name = %config.name, count = tools.len(), "Using cached capabilities");
            return Ok(tools);
        }

        // A failed OS spawn is visible right away. A later exit is not an
        // error here: whatever the process printed is still usable.
        if let Err(e @ ToolServerError::Spawn { .. }) = handle.ensure_usable() {
            return Err(e);
        }

        tokio::time::sleep(self.options.grace).await;

        // Answers arrive after extraction. They only help a later discovery
        // on the same process, so a bare placeholder is not cached.
        probe(Arc::clone(&handle), self.options.probe_interval);

        let tools = extract(&config.name, &handle.combined_output());
        debug!(server_name = %config.name, count = tools.len(), "Capabilities extracted");
        if !tools.iter().all(is_placeholder) {
            handle.cache_tools(&tools);
        }
        Ok(tools)
    }
}
