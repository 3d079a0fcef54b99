//! OpenAI chat completions backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use toolrelay_core::{BackendError, ChatBackend, ChatMessage, RelaySettings};

use super::http;

const BACKEND: &str = "OpenAI";

/// Default API root.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Environment variable consulted when settings carry no key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    n: u8,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Backend calling `POST /chat/completions`.
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiBackend {
    /// Build from settings, falling back to `OPENAI_API_KEY` for the key.
    pub fn from_settings(settings: &RelaySettings) -> Result<Self, BackendError> {
        let api_key = resolve_api_key(
            settings.openai_api_key.as_deref(),
            std::env::var(OPENAI_API_KEY_ENV).ok().as_deref(),
        )?;

        Ok(Self {
            client: http::build_client(BACKEND, settings.effective_chat_timeout())?,
            base_url: OPENAI_API_BASE.to_string(),
            api_key,
            model: settings.effective_openai_model().to_string(),
            temperature: settings.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        })
    }

    /// Point the backend at an OpenAI-compatible server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body<'a>(&'a self, history: &'a [ChatMessage]) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.model,
            messages: history,
            temperature: self.temperature,
            max_tokens: MAX_TOKENS,
            n: 1,
        }
    }

    /// Ids of the chat models available to this key.
    pub async fn list_models(&self) -> Result<Vec<String>, BackendError> {
        let request = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key);

        let (status, body) = http::send(BACKEND, request).await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let list: ModelList = http::decode(BACKEND, &body)?;
        Ok(chat_model_ids(list))
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn label(&self) -> String {
        format!("openai:{}", self.model)
    }

    async fn complete(&self, history: &[ChatMessage]) -> Result<String, BackendError> {
        debug!(model = %self.model, temperature = self.temperature, messages = history.len(), "Sending request to OpenAI");

        let request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(history));

        let (status, body) = http::send(BACKEND, request).await?;
        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        reply_content(http::decode(BACKEND, &body)?)
    }
}

fn resolve_api_key(configured: Option<&str>, env: Option<&str>) -> Result<String, BackendError> {
    configured
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .or_else(|| env.map(str::trim).filter(|k| !k.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| {
            BackendError::Configuration(
                "OpenAI API key is required. Please provide it in the settings.".to_string(),
            )
        })
}

/// `error.message` from an error body, else the body itself.
fn api_error(status: u16, body: &str) -> BackendError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .map(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map_or_else(|| v.to_string(), str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    BackendError::Api {
        backend: BACKEND.to_string(),
        status,
        message,
    }
}

fn reply_content(response: CompletionResponse) -> Result<String, BackendError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| BackendError::InvalidResponse {
            backend: BACKEND.to_string(),
            message: "no message content in the first choice".to_string(),
        })
}

fn chat_model_ids(list: ModelList) -> Vec<String> {
    let mut ids: Vec<String> = list
        .data
        .into_iter()
        .map(|m| m.id)
        .filter(|id| id.contains("gpt"))
        .collect();
    ids.sort();
    ids
}
