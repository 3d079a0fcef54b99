//! Request/reply correlation against real child processes.
#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use toolrelay_core::{ServerConfig, ToolServerError};
use toolrelay_mcp::{ProcessSupervisor, SupervisorConfig, correlate};

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_echoed_request_is_the_reply() {
    let supervisor = ProcessSupervisor::default();
    let handle = supervisor
        .ensure_process(&ServerConfig::stdio("Echo", "cat", ""))
        .await
        .unwrap();

    let payload = json!({"message": "hello", "history": []});
    let reply = correlate(&handle, &payload, REPLY_TIMEOUT).await.unwrap();
    assert_eq!(reply, payload);

    // Sequential turns on the same process keep working.
    let second = json!({"message": "again"});
    assert_eq!(correlate(&handle, &second, REPLY_TIMEOUT).await.unwrap(), second);
    assert!(handle.is_alive());

    supervisor.shutdown_all().await;
}

#[tokio::test]
async fn test_reply_split_across_chunks() {
    let supervisor = ProcessSupervisor::default();
    let config = ServerConfig::stdio(
        "Slow",
        "read line; printf '{\"answer\":'; sleep 0.2; printf '42}\\n'; exec sleep 30",
        "",
    );
    let handle = supervisor.ensure_process(&config).await.unwrap();

    let reply = correlate(&handle, &json!({"message": "q"}), REPLY_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(reply, json!({"answer": 42}));

    supervisor.shutdown_all().await;
}

#[tokio::test]
async fn test_first_parseable_value_wins() {
    let supervisor = ProcessSupervisor::default();
    let config = ServerConfig::stdio(
        "Twice",
        "read line; printf '{\"a\":1}'; sleep 0.3; printf '{\"b\":2}'; exec sleep 30",
        "",
    );
    let handle = supervisor.ensure_process(&config).await.unwrap();

    let reply = correlate(&handle, &json!({"message": "q"}), REPLY_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(reply, json!({"a": 1}));

    supervisor.shutdown_all().await;
}

#[tokio::test]
async fn test_reply_larger_than_output_cap() {
    let supervisor = ProcessSupervisor::new(SupervisorConfig {
        output_buffer_bytes: 1024,
        ..SupervisorConfig::default()
    });
    let body = "x".repeat(3000);
    let script = format!("read line; echo '{{\"response\":\"{body}\"}}'; exec sleep 30");
    let handle = supervisor
        .ensure_process(&ServerConfig::stdio("Big", &script, ""))
        .await
        .unwrap();

    let reply = correlate(&handle, &json!({"message": "q"}), REPLY_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(reply, json!({"response": body}));
    assert!(handle.stdout().len() <= 1024);

    supervisor.shutdown_all().await;
}

#[tokio::test]
async fn test_queued_request_times_out_on_its_own_deadline() {
    let supervisor = ProcessSupervisor::default();
    let handle = supervisor
        .ensure_process(&ServerConfig::stdio("Busy", "sleep", "30"))
        .await
        .unwrap();

    let first = {
        let handle = Arc::clone(&handle);
        tokio::spawn(async move {
            correlate(&handle, &json!({"message": "one"}), Duration::from_millis(1500)).await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let started = Instant::now();
    let second = correlate(&handle, &json!({"message": "two"}), Duration::from_millis(300)).await;
    let elapsed = started.elapsed();

    assert!(matches!(
        second,
        Err(ToolServerError::Timeout { timeout_ms: 300, .. })
    ));
    assert!(elapsed < Duration::from_millis(1000), "waited {elapsed:?}");

    let first = first.await.unwrap();
    assert!(matches!(first, Err(ToolServerError::Timeout { .. })));
    assert!(handle.is_alive());

    supervisor.shutdown_all().await;
}

#[tokio::test]
async fn test_silence_times_out_and_keeps_process() {
    let supervisor = ProcessSupervisor::default();
    let handle = supervisor
        .ensure_process(&ServerConfig::stdio("Mute", "sleep", "30"))
        .await
        .unwrap();

    let result = correlate(&handle, &json!({"message": "hi"}), Duration::from_millis(200)).await;

    assert!(matches!(
        result,
        Err(ToolServerError::Timeout { timeout_ms: 200, .. })
    ));
    assert!(handle.is_alive());

    supervisor.shutdown_all().await;
}

#[tokio::test]
async fn test_noise_before_value_times_out() {
    let supervisor = ProcessSupervisor::default();
    let config = ServerConfig::stdio(
        "Chatty",
        "read line; echo 'thinking...'; echo '{\"ok\":true}'; exec sleep 30",
        "",
    );
    let handle = supervisor.ensure_process(&config).await.unwrap();

    let result = correlate(&handle, &json!({}), Duration::from_millis(500)).await;
    assert!(matches!(result, Err(ToolServerError::Timeout { .. })));

    supervisor.shutdown_all().await;
}

#[tokio::test]
async fn test_exit_is_a_process_error_and_handle_is_replaced() {
    let supervisor = ProcessSupervisor::default();
    let config = ServerConfig::stdio("Crashy", "exit", "3");
    let handle = supervisor.ensure_process(&config).await.unwrap();

    let result = correlate(&handle, &json!({"message": "hi"}), REPLY_TIMEOUT).await;
    assert!(matches!(result, Err(ToolServerError::Process { .. })));
    assert!(!handle.is_alive());

    let replacement = supervisor.ensure_process(&config).await.unwrap();
    assert!(!Arc::ptr_eq(&handle, &replacement));

    supervisor.shutdown_all().await;
}

#[tokio::test]
async fn test_failed_spawn_is_a_spawn_error() {
    let supervisor = ProcessSupervisor::new(SupervisorConfig {
        shell: Some("/nonexistent/shell".to_string()),
        ..SupervisorConfig::default()
    });
    let handle = supervisor
        .ensure_process(&ServerConfig::stdio("Ghost", "cat", ""))
        .await
        .unwrap();

    let result = correlate(&handle, &json!({}), REPLY_TIMEOUT).await;
    assert!(matches!(result, Err(ToolServerError::Spawn { .. })));
}
