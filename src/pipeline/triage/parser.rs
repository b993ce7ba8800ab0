use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{AssistantPayload, PossibleCondition};
use crate::pipeline::safety::types::UrgencyTier;

/// Why no JSON object could be recovered from a model reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Model reply is empty")]
    Empty,

    #[error("No JSON object found in model reply")]
    NoJsonObject,

    #[error("Invalid JSON in model reply: {0}")]
    InvalidJson(String),

    #[error("Model reply JSON is not an object")]
    NotAnObject,
}

/// Recover a JSON object from raw model text.
///
/// Tries the whole trimmed text first, then the span from the first `{`
/// to the last `}`. The span scan is greedy: replies with several
/// brace-delimited blocks usually fail to parse and land in the error path.
pub fn extract_json_object(raw: &str) -> Result<Map<String, Value>, ExtractError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }

    let direct_error = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => return Ok(map),
        Ok(_) => ExtractError::NotAnObject,
        Err(e) => ExtractError::InvalidJson(e.to_string()),
    };

    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(match direct_error {
            ExtractError::NotAnObject => direct_error,
            _ => ExtractError::NoJsonObject,
        });
    };
    if end < start {
        return Err(ExtractError::NoJsonObject);
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ExtractError::NotAnObject),
        Err(e) => Err(ExtractError::InvalidJson(e.to_string())),
    }
}

impl AssistantPayload {
    /// Decode a model object leniently.
    ///
    /// Each known key is decoded on its own; a value of the wrong shape
    /// falls back to the field default instead of failing the whole payload.
    /// A list field sent as one string is split into lines.
    pub fn from_json_object(mut map: Map<String, Value>) -> Self {
        let triage_level = match map.remove("triage_level") {
            Some(Value::String(s)) => UrgencyTier::from_label(&s),
            _ => None,
        };
        let summary = take_text(&mut map, "summary");
        let what_to_do_now = take_text(&mut map, "what_to_do_now");
        let clarifying_questions = take_list(&mut map, "clarifying_questions");
        let possible_conditions =
            parse_array_lenient::<PossibleCondition>(map.remove("possible_conditions"));
        let recommended_next_steps = take_list(&mut map, "recommended_next_steps");
        let when_to_seek_care = take_list(&mut map, "when_to_seek_care");
        let sources = match map.remove("sources") {
            None | Some(Value::Null) => None,
            value => Some(list_from_value(value)),
        };
        let disclaimer = take_text(&mut map, "disclaimer");

        Self {
            triage_level,
            summary,
            what_to_do_now,
            clarifying_questions,
            possible_conditions,
            recommended_next_steps,
            when_to_seek_care,
            sources,
            disclaimer,
            extra: map,
        }
    }
}

fn take_text(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        scalar => Some(scalar.to_string()),
    }
}

fn take_list(map: &mut Map<String, Value>, key: &str) -> Vec<String> {
    list_from_value(map.remove(key))
}

fn list_from_value(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse an array leniently, skipping items that fail to deserialize.
fn parse_array_lenient<T: for<'de> Deserialize<'de>>(value: Option<Value>) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        _ => Vec::new(),
    }
}
