pub mod openai;
pub mod mock;

pub use openai::*;
pub use mock::*;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::config::{AppConfig, LlmProvider};
use crate::pipeline::triage::types::ChatMessage;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("Cannot reach model provider at {0}")]
    Connection(String),

    #[error("Model request timed out after {0}s")]
    Timeout(u64),

    #[error("Model provider returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

/// Chat model abstraction (allows mocking).
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Human-readable backend name, for logs.
    fn name(&self) -> &str;

    /// Send the conversation and return the raw assistant text.
    ///
    /// `schema` is the JSON schema the reply should follow; backends that
    /// cannot enforce it may ignore it.
    async fn complete(&self, messages: &[ChatMessage], schema: &Value) -> Result<String, LlmError>;
}

/// Build the chat model selected by `LLM_PROVIDER`.
pub fn model_from_config(config: &AppConfig) -> Arc<dyn ChatModel> {
    match config.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiClient::new(
            &config.openai_base_url,
            config.openai_api_key.clone(),
            &config.model_name,
            config.llm_timeout.as_secs(),
        )),
        LlmProvider::Mock => Arc::new(MockChatModel::canned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_selects_backend() {
        let mut config = AppConfig::offline();
        assert_eq!(model_from_config(&config).name(), "mock");

        config.provider = LlmProvider::OpenAi;
        assert_eq!(model_from_config(&config).name(), "openai");
    }

    #[test]
    fn error_messages_carry_context() {
        let err = LlmError::Api {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(
            err.to_string(),
            "Model provider returned error (status 429): rate limited"
        );
        assert_eq!(LlmError::Timeout(60).to_string(), "Model request timed out after 60s");
    }
}
