use std::fmt;

use serde::{Deserialize, Serialize};

/// How quickly care should be sought. Variant order is severity order,
/// so `Ord` compares `Routine < Soon < Urgent < Emergency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyTier {
    Routine,
    Soon,
    Urgent,
    Emergency,
}

impl UrgencyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routine => "routine",
            Self::Soon => "soon",
            Self::Urgent => "urgent",
            Self::Emergency => "emergency",
        }
    }

    /// Parse a model-supplied tier. Unknown values yield `None`.
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "routine" => Some(Self::Routine),
            "soon" => Some(Self::Soon),
            "urgent" => Some(Self::Urgent),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }
}

impl fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label of a rule that fired during urgency screening (a red flag).
/// Observability only, never shown to the end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggeredPattern(pub String);

impl TriggeredPattern {
    pub fn label(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TriggeredPattern {
    fn from(label: &'static str) -> Self {
        Self(label.to_string())
    }
}

/// Outcome of the rule-based urgency screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrgencyAssessment {
    pub tier: UrgencyTier,
    pub triggered: Vec<TriggeredPattern>,
}

impl UrgencyAssessment {
    pub fn routine() -> Self {
        Self {
            tier: UrgencyTier::Routine,
            triggered: Vec::new(),
        }
    }

    pub fn is_emergency(&self) -> bool {
        self.tier == UrgencyTier::Emergency
    }

    /// Read-only summary attached to the final response.
    pub fn report(&self) -> SafetyReport {
        SafetyReport {
            rule_based_urgency: self.tier,
            red_flags: self.triggered.clone(),
        }
    }
}

/// Summary of the rule-based screen, attached to every triage response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub rule_based_urgency: UrgencyTier,
    pub red_flags: Vec<TriggeredPattern>,
}
