//! AI chat proxy
//!
//! Forwards a conversation to one of the supported text-generation services and returns
//! its reply. The model is picked by a short name from the request.

pub mod provider;

use log::info;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::ChatConfig;
use crate::error::ChatError;
use provider::{AnthropicProvider, ChatProvider, OpenAiProvider};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant embedded in STL Hub, \
a 3D printing file manager. \
Help the user with 3D printing questions, STL files, slicing, printer settings, \
and general development questions about the project. Be friendly and educational.";

/// Models selectable from the chat panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    Claude,
    ClaudeOpus,
    Gpt,
    GptMini,
}

impl ModelChoice {
    /// Upstream model identifier
    pub fn model_id(self) -> &'static str {
        match self {
            ModelChoice::Claude => "claude-sonnet-4-6",
            ModelChoice::ClaudeOpus => "claude-opus-4-6",
            ModelChoice::Gpt => "gpt-4o",
            ModelChoice::GptMini => "gpt-4o-mini",
        }
    }

    /// Name shown next to the reply
    pub fn label(self) -> &'static str {
        match self {
            ModelChoice::Claude => "Claude Sonnet 4.6",
            ModelChoice::ClaudeOpus => "Claude Opus 4.6",
            ModelChoice::Gpt => "GPT-4o",
            ModelChoice::GptMini => "GPT-4o Mini",
        }
    }

    fn is_anthropic(self) -> bool {
        matches!(self, ModelChoice::Claude | ModelChoice::ClaudeOpus)
    }
}

impl FromStr for ModelChoice {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude" => Ok(ModelChoice::Claude),
            "claude-opus" => Ok(ModelChoice::ClaudeOpus),
            "gpt" => Ok(ModelChoice::Gpt),
            "gpt-mini" => Ok(ModelChoice::GptMini),
            other => Err(ChatError::UnknownModel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub prompt: String,
}

fn default_model() -> String {
    "claude".to_string()
}

impl ChatRequest {
    /// Prior messages followed by the prompt, when there is one
    pub fn conversation(&self) -> Vec<ChatMessage> {
        let mut messages = self.messages.clone();
        if !self.prompt.is_empty() {
            messages.push(ChatMessage::new("user", self.prompt.clone()));
        }
        messages
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub model: String,
}

/// Dispatches chat requests to the provider serving the chosen model
pub struct ChatService {
    anthropic: Arc<dyn ChatProvider>,
    openai: Arc<dyn ChatProvider>,
}

impl ChatService {
    pub fn new(client: Client, config: &ChatConfig) -> Self {
        Self::with_providers(
            Arc::new(AnthropicProvider::new(client.clone(), config)),
            Arc::new(OpenAiProvider::new(client, config)),
        )
    }

    pub fn with_providers(
        anthropic: Arc<dyn ChatProvider>,
        openai: Arc<dyn ChatProvider>,
    ) -> Self {
        Self { anthropic, openai }
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let choice: ModelChoice = request.model.parse()?;
        let provider = if choice.is_anthropic() {
            &self.anthropic
        } else {
            &self.openai
        };

        let messages = request.conversation();
        info!(
            "Chat via {} ({}) with {} messages",
            provider.name(),
            choice.model_id(),
            messages.len()
        );
        let reply = provider
            .complete(choice.model_id(), SYSTEM_PROMPT, &messages)
            .await?;

        Ok(ChatReply {
            reply,
            model: choice.label().to_string(),
        })
    }
}
