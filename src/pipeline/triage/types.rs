use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pipeline::safety::types::{SafetyReport, UrgencyTier};

/// Author of a chat message (OpenAI-style roles).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Model's self-reported confidence in a possible condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
}

/// A differential possibility (never a diagnosis).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PossibleCondition {
    pub name: String,
    pub why: String,
    pub confidence: Confidence,
}

/// Structured reply from the model, after lenient decoding.
///
/// Missing text fields stay `None`, missing list fields are empty.
/// Keys the schema does not know about are kept in `extra` and echoed back.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssistantPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triage_level: Option<UrgencyTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Narrative field some models emit instead of (or beside) `summary`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub what_to_do_now: Option<String>,
    pub clarifying_questions: Vec<String>,
    pub possible_conditions: Vec<PossibleCondition>,
    pub recommended_next_steps: Vec<String>,
    pub when_to_seek_care: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Final response for one triage request.
#[derive(Debug, Clone, Serialize)]
pub struct TriageResponse {
    pub ok: bool,
    pub triage_level: UrgencyTier,
    pub assistant: AssistantPayload,
    /// Raw model text, only when no JSON object could be recovered from it.
    pub raw_text: Option<String>,
    pub safety: SafetyReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_deserializes_lowercase() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"user","content":"hello"}"#).unwrap();
        assert_eq!(msg, ChatMessage::user("hello"));
    }

    #[test]
    fn unknown_role_rejected() {
        let result = serde_json::from_str::<ChatMessage>(r#"{"role":"doctor","content":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn payload_serialization_skips_absent_text_and_flattens_extra() {
        let mut payload = AssistantPayload {
            summary: Some("Cough for two days.".into()),
            ..Default::default()
        };
        payload
            .extra
            .insert("follow_up".into(), Value::String("in a week".into()));

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["summary"], "Cough for two days.");
        assert_eq!(json["follow_up"], "in a week");
        assert!(json.get("triage_level").is_none());
        assert!(json.get("sources").is_none());
        assert_eq!(json["recommended_next_steps"], serde_json::json!([]));
    }

    #[test]
    fn response_serializes_null_raw_text() {
        let response = TriageResponse {
            ok: true,
            triage_level: UrgencyTier::Routine,
            assistant: AssistantPayload::default(),
            raw_text: None,
            safety: SafetyReport {
                rule_based_urgency: UrgencyTier::Routine,
                red_flags: vec![],
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["triage_level"], "routine");
        assert!(json["raw_text"].is_null());
        assert_eq!(json["safety"]["rule_based_urgency"], "routine");
    }
}
