pub mod models;
pub mod openai;

use openai::OpenAiProvider;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use models::{ChatOptions, ChatResponse, Message};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("Invalid Response: {0}")]
    InvalidResponse(String),
    #[error("Rate Limited")]
    RateLimited,
}

/// Narrow chat-completion contract the orchestrator talks to.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError>;
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown LLM provider '{0}'")]
    Unknown(String),
    #[error("missing '{0}' section in llm configuration")]
    MissingSection(&'static str),
    #[error("API key for '{0}' is not set")]
    MissingApiKey(&'static str),
}

pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_default(config: &AppConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let provider_name = config.llm.provider.as_str();

        match provider_name {
            "openai" => {
                let cfg = config
                    .llm
                    .openai
                    .as_ref()
                    .ok_or(ProviderError::MissingSection("openai"))?;
                if cfg.api_key.trim().is_empty() {
                    return Err(ProviderError::MissingApiKey("openai"));
                }
                Ok(Arc::new(OpenAiProvider::new(
                    cfg.api_key.clone(),
                    cfg.api_base.clone(),
                    cfg.default_model.clone(),
                )))
            }
            other => Err(ProviderError::Unknown(other.to_string())),
        }
    }
}
