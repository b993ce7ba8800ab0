//! Rule-based urgency screen.
//!
//! Runs on the latest user message before the model is called. Tables are
//! ordered and data-driven: emergency rules dominate urgent rules, which
//! dominate the worsening heuristic. Not medically reviewed triage logic.

use std::sync::LazyLock;

use regex::Regex;

use super::types::{TriggeredPattern, UrgencyAssessment, UrgencyTier};

/// A compiled red-flag rule with its audit label.
struct UrgencyPattern {
    label: &'static str,
    regex: Regex,
}

static EMERGENCY_PATTERNS: LazyLock<Vec<UrgencyPattern>> = LazyLock::new(|| {
    vec![
        pattern(
            "chest_pain",
            r"\b(?:chest pain|pressure in (?:my )?chest|crushing chest|heart attack)\b",
        ),
        pattern(
            "breathing_difficulty",
            r"\b(?:short(?:ness)? of breath|can(?:'|’)?t breathe|cannot breathe|difficulty breathing)\b",
        ),
        pattern(
            "stroke_signs",
            r"\b(?:stroke|face droop|arm weakness|slurred speech)\b",
        ),
        pattern("seizure", r"\b(?:seizure|convulsion)\b"),
        pattern(
            "loss_of_consciousness",
            r"\b(?:passed out|faint(?:ed)?|unconscious)\b",
        ),
        pattern(
            "uncontrolled_bleeding",
            r"\b(?:severe bleeding|bleeding won(?:'|’)?t stop)\b",
        ),
        pattern(
            "suicidal_ideation",
            r"\b(?:suicid(?:al|e)?|kill myself|self-harm)\b",
        ),
        pattern(
            "anaphylaxis",
            r"\b(?:anaphylaxis|throat closing|swelling of (?:lips|tongue)|hives with breathing)\b",
        ),
        pattern("severe_allergic_reaction", r"\bsevere allergic\b"),
    ]
});

static URGENT_PATTERNS: LazyLock<Vec<UrgencyPattern>> = LazyLock::new(|| {
    vec![
        pattern("high_fever", r"\b(?:high fever|fever over)\b"),
        pattern("severe_pain", r"\b(?:severe pain|worst pain)\b"),
        pattern("vomiting_blood", r"\b(?:vomiting blood|blood in vomit)\b"),
        pattern("blood_in_stool", r"\b(?:blood in stool|black tarry stools?)\b"),
        pattern("severe_dehydration", r"\b(?:severe dehydration|not urinating)\b"),
        pattern(
            "pregnancy_complication",
            r"\bpregnan(?:t|cy)\b.*\b(?:bleeding|severe pain)\b",
        ),
    ]
});

static WORSENING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:worsening rapidly|getting much worse|sudden onset)\b")
        .expect("valid regex")
});

/// Label reported when only the worsening heuristic fires.
pub const WORSENING_HEURISTIC: &str = "worsening_heuristic";

fn pattern(label: &'static str, regex_str: &str) -> UrgencyPattern {
    UrgencyPattern {
        label,
        regex: Regex::new(&format!("(?i){regex_str}")).expect("Invalid urgency regex pattern"),
    }
}

fn matching_labels(patterns: &[UrgencyPattern], text: &str) -> Vec<TriggeredPattern> {
    patterns
        .iter()
        .filter(|p| p.regex.is_match(text))
        .map(|p| TriggeredPattern::from(p.label))
        .collect()
}

/// Classify free text into an urgency tier.
///
/// Every matching rule of the winning tier is reported, not just the first.
pub fn classify_urgency(text: &str) -> UrgencyAssessment {
    if text.trim().is_empty() {
        return UrgencyAssessment::routine();
    }

    let triggered = matching_labels(&EMERGENCY_PATTERNS, text);
    if !triggered.is_empty() {
        return UrgencyAssessment {
            tier: UrgencyTier::Emergency,
            triggered,
        };
    }

    let triggered = matching_labels(&URGENT_PATTERNS, text);
    if !triggered.is_empty() {
        return UrgencyAssessment {
            tier: UrgencyTier::Urgent,
            triggered,
        };
    }

    if WORSENING_PATTERN.is_match(text) {
        return UrgencyAssessment {
            tier: UrgencyTier::Soon,
            triggered: vec![TriggeredPattern::from(WORSENING_HEURISTIC)],
        };
    }

    UrgencyAssessment::routine()
}
