//! Ollama chat backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use toolrelay_core::{BackendError, ChatBackend, ChatMessage, RelaySettings};

use super::http;

const BACKEND: &str = "Ollama";

/// Reply used when the API answers without message content.
pub const EMPTY_REPLY: &str = "No response content received";

const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Deadline for listing installed models.
const TAGS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    models: Vec<ModelTag>,
}

/// An installed model as reported by `GET /api/tags`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelTag {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

/// Backend calling `POST <base>/api/chat` without streaming.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaBackend {
    pub fn from_settings(settings: &RelaySettings) -> Result<Self, BackendError> {
        let model = settings
            .ollama_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| {
                BackendError::Configuration(
                    "Please select an Ollama model from the settings menu".to_string(),
                )
            })?;

        Ok(Self {
            client: http::build_client(BACKEND, settings.effective_chat_timeout())?,
            base_url: normalize_ollama_url(settings.effective_ollama_url()),
            model: model.to_string(),
            temperature: settings.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body<'a>(&'a self, history: &'a [ChatMessage]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: history,
            stream: false,
            options: ChatOptions {
                temperature: self.temperature,
            },
        }
    }
}

/// Models installed on the Ollama server at `url`.
///
/// Needs no model selection, unlike chatting.
pub async fn list_models(url: &str) -> Result<Vec<ModelTag>, BackendError> {
    let base = normalize_ollama_url(url);
    let client = http::build_client(BACKEND, TAGS_TIMEOUT)?;
    debug!(url = %base, "Fetching Ollama models");

    let request = client
        .get(format!("{base}/api/tags"))
        .header(reqwest::header::ACCEPT, "application/json");
    let (status, body) = http::send(BACKEND, request).await?;
    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }

    let tags: TagList = http::decode(BACKEND, &body)?;
    Ok(tags.models)
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn label(&self) -> String {
        format!("ollama:{}", self.model)
    }

    async fn complete(&self, history: &[ChatMessage]) -> Result<String, BackendError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(url = %url, model = %self.model, temperature = self.temperature, "Sending request to Ollama");

        let request = self.client.post(url).json(&self.request_body(history));
        let (status, body) = http::send(BACKEND, request).await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let response: ChatResponse = http::decode(BACKEND, &body)?;
        Ok(reply_content(response))
    }
}

/// Reduce a user-supplied Ollama URL to its base.
///
/// `localhost` becomes `127.0.0.1` (avoids IPv6 resolution), trailing
/// slashes go, and any `/api…` or `/v1…` path suffix is cut off.
pub fn normalize_ollama_url(url: &str) -> String {
    let url = url.trim().replacen("localhost", "127.0.0.1", 1);
    let url = url.trim_end_matches('/');

    let path_start = url.find("://").map_or(0, |i| i + 3);
    let (origin, path) = url.split_at(path_start);
    let cut = ["/api", "/v1"]
        .iter()
        .filter_map(|suffix| path.find(suffix))
        .min()
        .unwrap_or(path.len());

    format!("{origin}{}", &path[..cut])
}

fn api_error(status: u16, body: &str) -> BackendError {
    BackendError::Api {
        backend: BACKEND.to_string(),
        status,
        message: body.trim().to_string(),
    }
}

fn reply_content(response: ChatResponse) -> String {
    response
        .message
        .and_then(|m| m.content)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| EMPTY_REPLY.to_string())
}
