//! LLM provider clients
//!
//! Variable detection and the data-collection interview are delegated to a
//! chat-completion provider. Handlers only see the [`LlmClient`] trait; the
//! concrete provider is picked once at startup from configuration.

pub mod anthropic;
pub mod json;
pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use anthropic::AnthropicClient;
pub use json::{parse_json_response, ResponseParseError};
pub use openai::OpenAiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation as sent by the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single completion call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    /// Ask the provider for a JSON object reply
    pub json_mode: bool,
    pub temperature: f32,
}

/// Unified interface over OpenAI and Anthropic
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run the completion and return the raw text of the reply
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    /// Model name for logging and `/api/info`
    fn model_name(&self) -> &str;

    /// Provider name for logging and `/api/info`
    fn provider_name(&self) -> &str;
}
