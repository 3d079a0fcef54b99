//! Discovery probes written to a freshly started tool server.
//!
//! Servers speak no common introspection protocol, so a handful of likely
//! commands are sent in the hope that one of them makes the server print its
//! capabilities. Nothing waits for an answer: whatever comes back simply
//! lands in the captured output that extraction reads.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::process::ProcessHandle;

/// Payloads written in order, one per probe interval.
pub fn probe_sequence() -> [Value; 6] {
    [
        json!({"command": "list_tools"}),
        json!({"command": "get_tools"}),
        json!({"command": "get_capabilities"}),
        json!({"action": "list_tools"}),
        json!({"command": "help"}),
        json!({}),
    ]
}

/// Start writing the probe sequence to `handle` in the background.
///
/// The first payload is written immediately, the rest `interval` apart. A
/// failed write is logged and the remaining payloads are still attempted.
/// The returned task can be ignored; it only exists so tests can wait on it.
pub fn probe(handle: Arc<ProcessHandle>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        for (index, payload) in probe_sequence().iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(interval).await;
            }
            match handle.send_json(payload).await {
                Ok(()) => debug!(server_name = %handle.name(), payload = %payload, "Probe sent"),
                Err(e) => warn!(
                    server_name = %handle.name(),
                    payload = %payload,
                    error = %e,
                    "Failed to send probe"
                ),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{ProcessSupervisor, SupervisorConfig};
    use toolrelay_core::ServerConfig;
    use tokio::time::Instant;

    const INTERVAL: Duration = Duration::from_millis(30);

    #[test]
    fn test_sequence_order() {
        let lines: Vec<String> = probe_sequence().iter().map(Value::to_string).collect();
        assert_eq!(
            lines,
            vec![
                r#"{"command":"list_tools"}"#,
                r#"{"command":"get_tools"}"#,
                r#"{"command":"get_capabilities"}"#,
                r#"{"action":"list_tools"}"#,
                r#"{"command":"help"}"#,
                "{}",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sequence_reaches_the_process_in_order() {
        let supervisor = ProcessSupervisor::default();
        let handle = supervisor
            .ensure_process(&ServerConfig::stdio("Echo", "cat", ""))
            .await
            .unwrap();

        let started = Instant::now();
        probe(Arc::clone(&handle), INTERVAL).await.unwrap();
        assert!(started.elapsed() >= INTERVAL * 5);

        let expected: String = probe_sequence().iter().map(|p| format!("{p}\n")).collect();
        let deadline = Instant::now() + Duration::from_secs(5);
        while handle.stdout().snapshot() != expected && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(handle.stdout().snapshot(), expected);

        supervisor.shutdown_all().await;
    }

    #[tokio::test]
    async fn test_failed_writes_do_not_stop_the_sequence() {
        let supervisor = ProcessSupervisor::new(SupervisorConfig {
            shell: Some("/nonexistent/shell".to_string()),
            ..SupervisorConfig::default()
        });
        let handle = supervisor
            .ensure_process(&ServerConfig::stdio("Ghost", "cat", ""))
            .await
            .unwrap();
        assert!(handle.send_json(&json!({})).await.is_err());

        // Every attempt fails, yet all six are made with their spacing
        let started = Instant::now();
        probe(handle, INTERVAL).await.unwrap();
        assert!(started.elapsed() >= INTERVAL * 5);
    }
}
