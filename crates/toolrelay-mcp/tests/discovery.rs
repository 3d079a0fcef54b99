//! End-to-end capability discovery against real child processes.
#![cfg(unix)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use toolrelay_core::{DiscoveryReply, ServerConfig};
use toolrelay_mcp::{
    DiscoveryOptions, NO_SERVERS_CONFIGURED, ProcessSupervisor, SupervisorConfig, ToolAggregator,
};

fn options() -> DiscoveryOptions {
    DiscoveryOptions {
        grace: Duration::from_millis(300),
        probe_interval: Duration::from_millis(20),
    }
}

fn aggregator(config: SupervisorConfig) -> ToolAggregator {
    ToolAggregator::new(Arc::new(ProcessSupervisor::new(config)), options())
}

#[tokio::test]
async fn test_empty_config_list_is_an_error_reply() {
    let reply = aggregator(SupervisorConfig::default()).discover_all(&[]).await;
    assert_eq!(
        reply,
        DiscoveryReply::Error {
            error: NO_SERVERS_CONFIGURED.to_string()
        }
    );
}

#[tokio::test]
async fn test_every_failed_spawn_yields_one_error_descriptor() {
    let aggregator = aggregator(SupervisorConfig {
        shell: Some("/nonexistent/shell".to_string()),
        ..SupervisorConfig::default()
    });
    let configs = vec![
        ServerConfig::stdio("Alpha", "alpha-server", ""),
        ServerConfig::stdio("Beta", "beta-server", "--flag"),
        ServerConfig::stdio("Gamma", "gamma-server", ""),
    ];

    let reply = aggregator.discover_all(&configs).await;
    let tools = reply.tools();

    assert_eq!(tools.len(), 3);
    assert!(tools.iter().all(|t| t.error));
    let names: Vec<_> = tools.iter().map(|t| t.server_name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);
    assert!(tools.iter().all(|t| t.name == t.server_name));
}

#[tokio::test]
async fn test_missing_command_is_a_configuration_error() {
    let aggregator = aggregator(SupervisorConfig::default());

    let reply = aggregator
        .discover_all(&[ServerConfig::stdio("A", "", "")])
        .await;
    let tools = reply.tools();

    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "A");
    assert!(tools[0].error);
    assert!(tools[0].description.contains("no command configured"));
    assert_eq!(aggregator.supervisor().count().await, 0);
}

#[tokio::test]
async fn test_vendor_catalog_for_short_lived_server() {
    let aggregator = aggregator(SupervisorConfig::default());

    let reply = aggregator
        .discover_all(&[ServerConfig::stdio("Airbnb Helper", "echo", "hi")])
        .await;
    let tools = reply.tools();

    let inferred: Vec<_> = tools.iter().filter(|t| t.inferred).collect();
    assert_eq!(inferred.len(), 10);
    assert!(tools.iter().all(|t| !t.error));
    assert!(tools.iter().all(|t| t.server_name == "Airbnb Helper"));

    let unique: HashSet<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(unique.len(), tools.len());

    aggregator.supervisor().shutdown_all().await;
}

#[tokio::test]
async fn test_listing_printed_at_startup_is_extracted_and_cached() {
    let aggregator = aggregator(SupervisorConfig::default());
    let config = ServerConfig::stdio(
        "Files",
        "printf 'Available tools:\\n  read_file - Read a file\\n  list_dir - List a directory\\n\\n'; exec sleep 30",
        "",
    );

    let first = aggregator.discover_all(std::slice::from_ref(&config)).await;
    let names: Vec<_> = first.tools().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["read_file", "list_dir"]);
    assert!(first.tools().iter().all(|t| !t.inferred));

    let pid = aggregator.supervisor().get(&config).await.and_then(|h| h.pid());

    let second = aggregator.discover_all(std::slice::from_ref(&config)).await;
    assert_eq!(first, second);
    assert_eq!(aggregator.supervisor().count().await, 1);
    assert_eq!(
        aggregator.supervisor().get(&config).await.and_then(|h| h.pid()),
        pid
    );

    aggregator.supervisor().shutdown_all().await;
}

#[tokio::test]
async fn test_mixed_results_keep_configuration_order() {
    let aggregator = aggregator(SupervisorConfig::default());
    let configs = vec![
        ServerConfig::stdio("Broken", "  ", ""),
        ServerConfig::stdio("Quiet", "sleep", "30"),
    ];

    let reply = aggregator.discover_all(&configs).await;
    let tools = reply.tools();

    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].server_name, "Broken");
    assert!(tools[0].error);
    assert_eq!(tools[1].server_name, "Quiet");
    assert!(!tools[1].error);
    assert!(!tools[1].inferred);

    aggregator.supervisor().shutdown_all().await;
}
