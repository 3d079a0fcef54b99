//! Discover command handler.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use toolrelay_mcp::{DiscoveryOptions, ToolAggregator};

use crate::bootstrap::{CliContext, load_servers};

const DISCOVERY_SESSION: &str = "discover";

/// Start every server in the list, infer its capabilities and print the
/// discovery reply as JSON. The processes are stopped before returning.
pub async fn execute(ctx: &CliContext, servers: &Path, grace_ms: Option<u64>) -> Result<()> {
    let configs = load_servers(servers)?;

    let mut options = DiscoveryOptions::from_settings(&ctx.settings);
    if let Some(ms) = grace_ms {
        options.grace = Duration::from_millis(ms);
    }

    let supervisor = ctx.session(DISCOVERY_SESSION).await;
    let reply = ToolAggregator::new(supervisor, options)
        .discover_all(&configs)
        .await;

    println!("{}", serde_json::to_string_pretty(&reply)?);

    ctx.registry.close(DISCOVERY_SESSION).await;
    Ok(())
}
