//! Upstream text-generation providers

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::ChatMessage;
use crate::config::ChatConfig;
use crate::error::ChatError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A service that turns a conversation into a single reply
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn complete(
        &self,
        model_id: &str,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ChatError>;
}

#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(client: Client, config: &ChatConfig) -> Self {
        Self {
            client,
            api_key: config.anthropic_api_key.clone(),
            base_url: config.anthropic_base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "Anthropic"
    }

    async fn complete(
        &self,
        model_id: &str,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ChatError> {
        if self.api_key.is_empty() {
            return Err(ChatError::MissingApiKey(self.name()));
        }

        let body = AnthropicRequest {
            model: model_id,
            max_tokens: self.max_tokens,
            system: system_prompt,
            messages,
        };
        debug!("Anthropic request: model={} messages={}", model_id, messages.len());

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let parsed: AnthropicResponse = check_status(self.name(), response).await?.json().await?;
        parsed
            .content
            .into_iter()
            .next()
            .and_then(|c| c.text)
            .ok_or_else(|| ChatError::Upstream("Anthropic reply had no text content".to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(client: Client, config: &ChatConfig) -> Self {
        Self {
            client,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    async fn complete(
        &self,
        model_id: &str,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ChatError> {
        if self.api_key.is_empty() {
            return Err(ChatError::MissingApiKey(self.name()));
        }

        // System message first
        let mut conversation = Vec::with_capacity(messages.len() + 1);
        conversation.push(ChatMessage::new("system", system_prompt));
        conversation.extend_from_slice(messages);

        let body = OpenAiRequest {
            model: model_id,
            max_tokens: self.max_tokens,
            messages: conversation,
        };
        debug!("OpenAI request: model={} messages={}", model_id, messages.len());

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: Value = check_status(self.name(), response).await?.json().await?;
        parsed
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ChatError::Upstream("OpenAI reply had no message content".to_string()))
    }
}

async fn check_status(provider: &str, response: Response) -> Result<Response, ChatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!("{} returned {}: {}", provider, status, body);
    Err(ChatError::Upstream(format!("{provider} returned {status}")))
}
