//! LLM provider configuration
//!
//! Provider settings come from the environment (optionally a `.env` file)
//! through clap's `env` support, so they can also be passed as flags.

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use tracing::info;

use crate::llm::{AnthropicClient, LlmClient, OpenAiClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    #[value(name = "openai")]
    OpenAi,
    #[value(name = "claude", alias = "anthropic")]
    Claude,
}

#[derive(Args, Debug, Clone)]
pub struct ProviderSettings {
    /// LLM provider
    #[arg(long, env = "AI_PROVIDER", value_enum, ignore_case = true, default_value = "openai")]
    pub provider: Provider,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// OpenAI model
    #[arg(long, env = "OPENAI_MODEL", default_value = crate::llm::openai::DEFAULT_MODEL)]
    pub openai_model: String,

    /// Anthropic API key
    #[arg(long, env = "CLAUDE_API_KEY", hide_env_values = true)]
    pub claude_api_key: Option<String>,

    /// Anthropic model
    #[arg(long, env = "CLAUDE_MODEL", default_value = crate::llm::anthropic::DEFAULT_MODEL)]
    pub claude_model: String,
}

fn non_blank(key: &Option<String>) -> Option<String> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
}

impl ProviderSettings {
    /// Build the client for the selected provider. Fails when its API key is missing.
    pub fn build_client(&self) -> Result<Arc<dyn LlmClient>> {
        let client: Arc<dyn LlmClient> = match self.provider {
            Provider::OpenAi => {
                let Some(key) = non_blank(&self.openai_api_key) else {
                    bail!("OPENAI_API_KEY must be set when AI_PROVIDER=openai");
                };
                Arc::new(OpenAiClient::with_model(key, &self.openai_model))
            }
            Provider::Claude => {
                let Some(key) = non_blank(&self.claude_api_key) else {
                    bail!("CLAUDE_API_KEY must be set when AI_PROVIDER=claude");
                };
                Arc::new(AnthropicClient::with_model(key, &self.claude_model))
            }
        };

        info!(
            "LLM provider: {} (model {})",
            client.provider_name(),
            client.model_name()
        );
        Ok(client)
    }
}
