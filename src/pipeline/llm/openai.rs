use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChatModel, LlmError};
use crate::pipeline::triage::types::{ChatMessage, Role};

const TEMPERATURE: f32 = 0.2;

/// Extra system message for the retry without schema enforcement.
pub const JSON_ONLY_REMINDER: &str = "Return ONLY valid JSON. No markdown.";

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: Option<String>, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    async fn send(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
        response_format: Option<ResponseFormat<'_>>,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            messages,
            response_format,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else if e.is_connect() {
                    LlmError::Connection(self.base_url.clone())
                } else {
                    LlmError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

/// Request body for `/chat/completions`
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat<'a>>,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: &'a Value,
}

/// Response body from `/chat/completions`
#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatModel for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    /// Schema-enforced request first. A provider rejection or an
    /// undecodable body triggers one retry without the schema and with a
    /// JSON-only reminder. Transport failures are returned as-is.
    async fn complete(&self, messages: &[ChatMessage], schema: &Value) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;

        let structured = ResponseFormat {
            kind: "json_schema",
            json_schema: schema,
        };
        match self.send(api_key, messages, Some(structured)).await {
            Ok(text) => Ok(text),
            Err(err @ (LlmError::Api { .. } | LlmError::ResponseParsing(_))) => {
                tracing::warn!(
                    model = %self.model,
                    error = %err,
                    "Structured completion failed, retrying without schema"
                );
                let mut degraded = messages.to_vec();
                degraded.push(ChatMessage {
                    role: Role::System,
                    content: JSON_ONLY_REMINDER.to_string(),
                });
                self.send(api_key, &degraded, None).await
            }
            Err(err) => Err(err),
        }
    }
}
