//! Post-generation guardrails.
//!
//! Runs on every parsed model payload before it reaches the caller:
//! 1. urgency floor (emergency override + never below the rule-based tier)
//! 2. disclaimer guarantee
//! 3. dosing scrub on `summary`, `what_to_do_now`, `recommended_next_steps`
//!    and any text echoed back through unrecognized keys
//!
//! Unsafe content is corrected, never rejected.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::types::UrgencyTier;
use crate::pipeline::triage::types::AssistantPayload;

/// Appended when the model's disclaimer lacks a not-a-diagnosis notice.
pub const STANDARD_DISCLAIMER: &str =
    "Demo only. This is not a medical diagnosis or a substitute for professional care.";

/// Disclaimer of the locally synthesized fallback payload.
pub const FALLBACK_DISCLAIMER: &str =
    "Demo only. Not a medical diagnosis. If you think this is an emergency, call your local emergency number.";

/// Always the first two steps of an emergency response, in this order.
pub const EMERGENCY_STEPS: [&str; 2] = [
    "If this is happening now or you feel unsafe: call your local emergency number immediately.",
    "Do not drive yourself if you are severely unwell; ask for help or an ambulance.",
];

const DISCLAIMER_MARKER: &str = "not a medical";

/// "<number> mg|ml|mcg|g"
static DOSAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+\s?(?:mg|ml|mcg|g)\b").expect("valid regex")
});

/// "take", "dose"/"dosage", "every N hours|hrs|h"
static INSTRUCTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:take|dos(?:e|age)|every\s+\d+\s+(?:hours|hrs|h))\b").expect("valid regex")
});

/// Run every guardrail over a parsed payload.
pub fn enforce_guardrails(mut payload: AssistantPayload, rule_tier: UrgencyTier) -> AssistantPayload {
    apply_urgency_floor(&mut payload, rule_tier);
    ensure_disclaimer(&mut payload);
    scrub_dosing(&mut payload);
    payload
}

/// Keep the payload's tier at or above the rule-based tier.
///
/// An emergency screen forces `emergency` and puts the two fixed
/// instructions ahead of whatever steps the model supplied.
pub fn apply_urgency_floor(payload: &mut AssistantPayload, rule_tier: UrgencyTier) {
    if rule_tier == UrgencyTier::Emergency {
        payload.triage_level = Some(UrgencyTier::Emergency);
        let mut steps: Vec<String> = EMERGENCY_STEPS.iter().map(|s| s.to_string()).collect();
        steps.append(&mut payload.recommended_next_steps);
        payload.recommended_next_steps = steps;
        return;
    }

    match payload.triage_level {
        Some(model_tier) if model_tier >= rule_tier => {}
        Some(model_tier) => {
            tracing::info!(
                model_tier = %model_tier,
                rule_tier = %rule_tier,
                "Raising model triage level to rule-based floor"
            );
            payload.triage_level = Some(rule_tier);
        }
        None => payload.triage_level = Some(rule_tier),
    }
}

/// Make sure the disclaimer carries a not-a-diagnosis notice.
///
/// Existing disclaimer text is kept; the standard sentence is appended once.
pub fn ensure_disclaimer(payload: &mut AssistantPayload) {
    let existing = payload.disclaimer.take().unwrap_or_default();
    let existing = existing.trim();

    let disclaimer = if existing.to_lowercase().contains(DISCLAIMER_MARKER) {
        existing.to_string()
    } else if existing.is_empty() {
        STANDARD_DISCLAIMER.to_string()
    } else {
        format!("{existing} {STANDARD_DISCLAIMER}")
    };
    payload.disclaimer = Some(disclaimer);
}

/// Remove dosing language from the narrative fields and next steps.
pub fn scrub_dosing(payload: &mut AssistantPayload) {
    if let Some(summary) = payload.summary.as_mut() {
        *summary = strip_dosing_lines(summary);
    }
    if let Some(text) = payload.what_to_do_now.as_mut() {
        *text = strip_dosing_lines(text);
    }
    let steps = std::mem::take(&mut payload.recommended_next_steps);
    payload.recommended_next_steps = scrub_dosing_items(steps);
    for value in payload.extra.values_mut() {
        scrub_dosing_value(value);
    }
}

/// Scrub every string inside an unrecognized JSON value.
///
/// Array items left empty are dropped; numbers, booleans and keys are kept.
fn scrub_dosing_value(value: &mut Value) {
    match value {
        Value::String(text) => *text = strip_dosing_lines(text),
        Value::Array(items) => {
            items.iter_mut().for_each(scrub_dosing_value);
            items.retain(|item| !matches!(item, Value::String(s) if s.is_empty()));
        }
        Value::Object(map) => map.values_mut().for_each(scrub_dosing_value),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Does this line look like a dose or a dosing instruction?
pub fn mentions_dosing(line: &str) -> bool {
    DOSAGE_RE.is_match(line) || INSTRUCTION_RE.is_match(line)
}

/// Drop every line that mentions dosing; surviving lines keep their order.
pub fn strip_dosing_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !mentions_dosing(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Scrub each item line by line and drop items left empty.
pub fn scrub_dosing_items(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| strip_dosing_lines(&item))
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_with_steps(steps: &[&str]) -> AssistantPayload {
        AssistantPayload {
            recommended_next_steps: steps.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    // ── disclaimer ────────────────────────────────────────────

    #[test]
    fn missing_disclaimer_gets_standard_notice() {
        let mut payload = AssistantPayload::default();
        ensure_disclaimer(&mut payload);
        assert_eq!(payload.disclaimer.as_deref(), Some(STANDARD_DISCLAIMER));
    }

    #[test]
    fn existing_disclaimer_text_preserved_before_notice() {
        let mut payload = AssistantPayload {
            disclaimer: Some("For information only.".into()),
            ..Default::default()
        };
        ensure_disclaimer(&mut payload);
        assert_eq!(
            payload.disclaimer.as_deref(),
            Some("For information only. Demo only. This is not a medical diagnosis or a substitute for professional care.")
        );
    }

    #[test]
    fn disclaimer_check_is_case_insensitive() {
        let mut payload = AssistantPayload {
            disclaimer: Some("This is NOT A MEDICAL opinion.".into()),
            ..Default::default()
        };
        ensure_disclaimer(&mut payload);
        assert_eq!(payload.disclaimer.as_deref(), Some("This is NOT A MEDICAL opinion."));
    }

    #[test]
    fn disclaimer_not_duplicated_on_second_pass() {
        let mut payload = AssistantPayload::default();
        ensure_disclaimer(&mut payload);
        ensure_disclaimer(&mut payload);
        let disclaimer = payload.disclaimer.unwrap();
        assert_eq!(disclaimer.matches(STANDARD_DISCLAIMER).count(), 1);
    }

    #[test]
    fn fallback_disclaimer_already_compliant() {
        assert!(FALLBACK_DISCLAIMER.to_lowercase().contains(DISCLAIMER_MARKER));
        assert!(STANDARD_DISCLAIMER.to_lowercase().contains(DISCLAIMER_MARKER));
    }

    // ── dosing scrub ──────────────────────────────────────────

    #[test]
    fn dosing_step_removed_entirely() {
        let mut payload = payload_with_steps(&[
            "Rest and drink fluids.",
            "Take 500 mg every 6 hours",
            "See a GP if not better in 3 days.",
        ]);
        scrub_dosing(&mut payload);
        assert_eq!(
            payload.recommended_next_steps,
            vec!["Rest and drink fluids.", "See a GP if not better in 3 days."]
        );
    }

    #[test]
    fn unit_variants_detected() {
        for line in ["200mg twice", "5 ml syrup", "100 mcg", "2g daily", "1 MG"] {
            assert!(mentions_dosing(line), "should flag: {line}");
        }
    }

    #[test]
    fn instruction_variants_detected() {
        for line in [
            "take it with food",
            "the usual dose is fine",
            "check the dosage on the box",
            "repeat every 4 hrs",
            "every 8 h as needed",
        ] {
            assert!(mentions_dosing(line), "should flag: {line}");
        }
    }

    #[test]
    fn safe_lines_not_flagged() {
        for line in [
            "Rest, fluids, and monitor your temperature.",
            "Seek care if symptoms last more than 3 days.",
            "A pharmacist can explain over-the-counter options.",
        ] {
            assert!(!mentions_dosing(line), "false positive: {line}");
        }
    }

    #[test]
    fn summary_scrubbed_line_by_line() {
        let mut payload = AssistantPayload {
            summary: Some("You reported a sore throat.\nIbuprofen 400mg may help.\nNo fever.".into()),
            ..Default::default()
        };
        scrub_dosing(&mut payload);
        assert_eq!(
            payload.summary.as_deref(),
            Some("You reported a sore throat.\nNo fever.")
        );
    }

    #[test]
    fn multi_line_step_keeps_safe_lines() {
        let steps = scrub_dosing_items(vec!["Stay hydrated.\nTake 2 tablets.".into()]);
        assert_eq!(steps, vec!["Stay hydrated."]);
    }

    #[test]
    fn what_to_do_now_scrubbed() {
        let mut payload = AssistantPayload {
            what_to_do_now: Some("Dose: 10 ml at night".into()),
            ..Default::default()
        };
        scrub_dosing(&mut payload);
        assert_eq!(payload.what_to_do_now.as_deref(), Some(""));
    }

    #[test]
    fn when_to_seek_care_left_untouched() {
        let mut payload = AssistantPayload {
            when_to_seek_care: vec!["If you took more than 4 g in a day".into()],
            ..Default::default()
        };
        scrub_dosing(&mut payload);
        assert_eq!(payload.when_to_seek_care.len(), 1);
    }

    #[test]
    fn unrecognized_keys_scrubbed_before_echo() {
        let mut payload = AssistantPayload::default();
        payload.extra.insert("advice".into(), json!("Take 500 mg every 6 hours"));
        payload.extra.insert(
            "home_care".into(),
            json!(["Rest.", "Ibuprofen 400mg", {"note": "Keep warm.\nDose: 5 ml"}]),
        );
        payload.extra.insert("follow_up_days".into(), json!(3));

        scrub_dosing(&mut payload);
        assert_eq!(payload.extra["advice"], json!(""));
        assert_eq!(
            payload.extra["home_care"],
            json!(["Rest.", {"note": "Keep warm."}])
        );
        assert_eq!(payload.extra["follow_up_days"], json!(3));
    }

    // ── urgency floor ─────────────────────────────────────────

    #[test]
    fn emergency_forces_level_and_prepends_steps() {
        let mut payload = AssistantPayload {
            triage_level: Some(UrgencyTier::Routine),
            recommended_next_steps: vec!["Rest.".into()],
            ..Default::default()
        };
        apply_urgency_floor(&mut payload, UrgencyTier::Emergency);
        assert_eq!(payload.triage_level, Some(UrgencyTier::Emergency));
        assert_eq!(payload.recommended_next_steps[0], EMERGENCY_STEPS[0]);
        assert_eq!(payload.recommended_next_steps[1], EMERGENCY_STEPS[1]);
        assert_eq!(payload.recommended_next_steps[2], "Rest.");
    }

    #[test]
    fn lower_model_tier_raised_to_rule_tier() {
        let mut payload = AssistantPayload {
            triage_level: Some(UrgencyTier::Soon),
            ..Default::default()
        };
        apply_urgency_floor(&mut payload, UrgencyTier::Urgent);
        assert_eq!(payload.triage_level, Some(UrgencyTier::Urgent));
        assert!(payload.recommended_next_steps.is_empty());
    }

    #[test]
    fn higher_model_tier_kept() {
        let mut payload = AssistantPayload {
            triage_level: Some(UrgencyTier::Urgent),
            ..Default::default()
        };
        apply_urgency_floor(&mut payload, UrgencyTier::Routine);
        assert_eq!(payload.triage_level, Some(UrgencyTier::Urgent));
    }

    #[test]
    fn missing_model_tier_filled_from_rules() {
        let mut payload = AssistantPayload::default();
        apply_urgency_floor(&mut payload, UrgencyTier::Soon);
        assert_eq!(payload.triage_level, Some(UrgencyTier::Soon));
    }

    #[test]
    fn emergency_steps_survive_dosing_scrub() {
        let payload = enforce_guardrails(
            payload_with_steps(&["Take 1000 mg paracetamol every 6 hours"]),
            UrgencyTier::Emergency,
        );
        assert_eq!(
            payload.recommended_next_steps,
            EMERGENCY_STEPS.iter().map(|s| s.to_string()).collect::<Vec<_>>()
        );
        assert!(payload.disclaimer.is_some());
    }
}
