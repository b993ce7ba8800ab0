use serde_json::{json, Value};

use super::types::ChatMessage;
use crate::pipeline::safety::types::{UrgencyAssessment, UrgencyTier};

/// Schema name sent with `response_format = json_schema`.
pub const RESPONSE_SCHEMA_NAME: &str = "medassist_demo_response";

pub const TRIAGE_SYSTEM_PROMPT: &str = r#"
You are MedAssist Demo, a medical conversation assistant used in an industry demonstration.
You are NOT a doctor and you do NOT give a medical diagnosis. You provide:
- possible explanations (differential possibilities), phrased cautiously,
- clarifying questions,
- red-flag symptoms and when to seek urgent or emergency care,
- safe, general, non-prescriptive next steps.

SAFETY RULES (NO EXCEPTIONS):
1. If the symptoms may be an emergency, say so first and clearly advise calling the local emergency number.
2. Never give medication doses, titration, or instructions to start or stop prescription medicines.
3. Never claim certainty. Use cautious words: "may", "could", "possible".
4. Encourage professional evaluation, especially for children, pregnancy, severe pain, or long-lasting symptoms.
5. Keep answers concise and structured so a clinician can review them.
6. Respect privacy: never ask for full name, address, insurance or Medicare numbers.

OUTPUT: a single JSON object matching the provided schema. No prose outside the JSON.
"#;

/// JSON schema of the assistant payload.
///
/// All keys except `sources` are required; the object is closed.
pub fn response_schema() -> Value {
    json!({
        "name": RESPONSE_SCHEMA_NAME,
        "schema": {
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "triage_level": {
                    "type": "string",
                    "enum": ["emergency", "urgent", "soon", "routine"],
                    "description": "Overall urgency based on reported symptoms."
                },
                "summary": {
                    "type": "string",
                    "description": "1-3 sentence summary of what the user reported (no diagnosis)."
                },
                "clarifying_questions": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Up to 6 targeted questions that would change the advice."
                },
                "possible_conditions": {
                    "type": "array",
                    "description": "Differential possibilities (not a diagnosis), 3-6 items.",
                    "items": {
                        "type": "object",
                        "additionalProperties": false,
                        "properties": {
                            "name": {"type": "string"},
                            "why": {"type": "string"},
                            "confidence": {"type": "string", "enum": ["low", "medium"]}
                        },
                        "required": ["name", "why", "confidence"]
                    }
                },
                "recommended_next_steps": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "General, safe steps. No medication dosing."
                },
                "when_to_seek_care": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Red flags and timelines for seeking care."
                },
                "sources": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Optional guideline or source categories."
                },
                "disclaimer": {
                    "type": "string",
                    "description": "Clear statement that this is not a diagnosis and not for emergencies."
                }
            },
            "required": [
                "triage_level",
                "summary",
                "clarifying_questions",
                "possible_conditions",
                "recommended_next_steps",
                "when_to_seek_care",
                "disclaimer"
            ]
        }
    })
}

/// System note carrying the rule-based urgency hint.
pub fn urgency_hint_note(assessment: &UrgencyAssessment) -> String {
    let mut note = format!(
        "Rule-based urgency screen: triage_level_hint={}.",
        assessment.tier
    );
    if assessment.tier == UrgencyTier::Emergency {
        note.push_str(
            " The hint is 'emergency': prioritize advising immediate emergency care and stop.",
        );
    }
    note
}

/// Assemble the outbound conversation: system prompt, redacted history,
/// urgency hint.
pub fn build_triage_messages(
    redacted: &[ChatMessage],
    assessment: &UrgencyAssessment,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(redacted.len() + 2);
    messages.push(ChatMessage::system(TRIAGE_SYSTEM_PROMPT.trim()));
    messages.extend(redacted.iter().cloned());
    messages.push(ChatMessage::system(urgency_hint_note(assessment)));
    messages
}
