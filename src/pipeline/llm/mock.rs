use async_trait::async_trait;
use serde_json::Value;

use super::{ChatModel, LlmError};
use crate::pipeline::triage::types::ChatMessage;

/// Offline reply used when `LLM_PROVIDER=mock`.
pub const CANNED_TRIAGE_REPLY: &str = r#"{
  "triage_level": "routine",
  "summary": "Mock mode is on. This demo reply is not based on a language model.",
  "clarifying_questions": [
    "How long have the symptoms been going on?",
    "Do you have a fever, shortness of breath, or chest pain?"
  ],
  "possible_conditions": [
    {"name": "Viral infection", "why": "Common cause of short-lived general symptoms.", "confidence": "low"},
    {"name": "Muscle strain", "why": "Possible if pain started after physical activity.", "confidence": "low"}
  ],
  "recommended_next_steps": [
    "Rest, stay hydrated, and keep track of how your symptoms change.",
    "Book a routine appointment with a GP if symptoms persist or worsen."
  ],
  "when_to_seek_care": [
    "Seek urgent care for severe pain, breathing trouble, confusion, or fainting."
  ],
  "disclaimer": "Demo only. Not a medical diagnosis. If you think this is an emergency, call your local emergency number."
}"#;

/// Mock chat model for tests and offline demos. Returns a fixed reply.
pub struct MockChatModel {
    response: String,
}

impl MockChatModel {
    /// The canned routine reply.
    pub fn canned() -> Self {
        Self::with_response(CANNED_TRIAGE_REPLY)
    }

    pub fn with_response(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _messages: &[ChatMessage], _schema: &Value) -> Result<String, LlmError> {
        Ok(self.response.clone())
    }
}
