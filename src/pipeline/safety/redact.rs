//! Basic PII redaction applied to every message before it leaves the process.
//!
//! Best-effort demo filter, NOT a compliance control: it masks email-like
//! strings, long phone-like digit runs and simple street addresses, nothing
//! more. Names, dates of birth, record numbers and free-form addresses pass
//! through untouched.
//!
//! Placeholders contain no digits and no `@`, so re-redacting already
//! redacted text is a no-op.

use std::sync::LazyLock;

use regex::Regex;

pub const EMAIL_PLACEHOLDER: &str = "[REDACTED_EMAIL]";
pub const PHONE_PLACEHOLDER: &str = "[REDACTED_PHONE]";
pub const ADDRESS_PLACEHOLDER: &str = "[REDACTED_ADDRESS]";

/// A redaction rule: every match is replaced by `placeholder`.
struct RedactionRule {
    regex: Regex,
    placeholder: &'static str,
}

/// Applied in order: emails first so their digits never reach the phone rule.
static REDACTION_RULES: LazyLock<Vec<RedactionRule>> = LazyLock::new(|| {
    vec![
        rule(r"[\w.-]+@[\w.-]+\.\w+", EMAIL_PLACEHOLDER),
        // 8+ digits, optional leading +, spaces or hyphens in between
        rule(r"\+?\b\d(?:[\s-]*\d){7,}\b", PHONE_PLACEHOLDER),
        rule(
            r"(?i)\b\d{1,5}\s+\w+(?:\s+\w+){1,5}\s+(?:st|street|rd|road|ave|avenue|blvd|boulevard|dr|drive|ln|lane|ct|court)\b",
            ADDRESS_PLACEHOLDER,
        ),
    ]
});

fn rule(regex_str: &str, placeholder: &'static str) -> RedactionRule {
    RedactionRule {
        regex: Regex::new(regex_str).expect("Invalid redaction regex pattern"),
        placeholder,
    }
}

/// Mask emails, phone numbers and street addresses in `text`.
pub fn redact_pii(text: &str) -> String {
    let mut redacted = text.to_string();
    for rule in REDACTION_RULES.iter() {
        redacted = rule
            .regex
            .replace_all(&redacted, rule.placeholder)
            .into_owned();
    }
    redacted
}
