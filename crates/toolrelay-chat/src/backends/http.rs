//! Shared HTTP plumbing for the API backends.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use toolrelay_core::BackendError;

/// Build a client with a whole-request timeout.
pub(crate) fn build_client(backend: &str, timeout: Duration) -> Result<Client, BackendError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BackendError::Configuration(format!("{backend} HTTP client: {e}")))
}

/// Send `request` and read the whole body as text, whatever the status.
pub(crate) async fn send(
    backend: &str,
    request: RequestBuilder,
) -> Result<(StatusCode, String), BackendError> {
    let response = request.send().await.map_err(|e| transport(backend, &e))?;
    let status = response.status();
    let body = response.text().await.map_err(|e| transport(backend, &e))?;
    Ok((status, body))
}

/// Decode a success body.
pub(crate) fn decode<T: DeserializeOwned>(backend: &str, body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::InvalidResponse {
        backend: backend.to_string(),
        message: e.to_string(),
    })
}

fn transport(backend: &str, error: &reqwest::Error) -> BackendError {
    let message = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("cannot connect: {error}")
    } else {
        error.to_string()
    };
    BackendError::Transport {
        backend: backend.to_string(),
        message,
    }
}
