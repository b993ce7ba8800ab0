use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use subtle::ConstantTimeEq;

use super::parser::extract_json_object;
use super::prompt::{build_triage_messages, response_schema};
use super::types::{AssistantPayload, ChatMessage, Role, TriageResponse};
use super::TriageError;
use crate::config::AppConfig;
use crate::pipeline::llm::{model_from_config, ChatModel};
use crate::pipeline::safety::guardrails::{enforce_guardrails, FALLBACK_DISCLAIMER};
use crate::pipeline::safety::redact::redact_pii;
use crate::pipeline::safety::types::UrgencyAssessment;
use crate::pipeline::safety::urgency::classify_urgency;

/// Messages included in the opt-in diagnostic log.
const DIAGNOSTIC_TAIL: usize = 3;

const NO_RESPONSE_MARKER: &str = "No response";

/// Triage pipeline orchestrator.
///
/// Coordinates: authorize → redact → classify → prompt → generate →
/// extract → guardrail → respond.
///
/// Holds only startup configuration; every request is handled on
/// request-local data, so one instance is shared across all requests.
pub struct TriagePipeline {
    model: Arc<dyn ChatModel>,
    demo_password: Option<String>,
    allow_logging: bool,
    llm_timeout: Duration,
}

impl TriagePipeline {
    pub fn new(model: Arc<dyn ChatModel>, config: &AppConfig) -> Self {
        Self {
            model,
            demo_password: config.demo_password.clone(),
            allow_logging: config.allow_logging,
            llm_timeout: config.llm_timeout,
        }
    }

    /// Pipeline backed by the provider named in `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(model_from_config(config), config)
    }

    pub fn require_password(&self) -> bool {
        self.demo_password.is_some()
    }

    /// Check the caller's shared secret. Always passes when none is configured.
    pub fn authorize(&self, supplied: Option<&str>) -> Result<(), TriageError> {
        let Some(expected) = self.demo_password.as_deref() else {
            return Ok(());
        };
        let supplied = supplied.unwrap_or_default();
        if supplied.as_bytes().ct_eq(expected.as_bytes()).unwrap_u8() == 0 {
            tracing::warn!("Triage request rejected: shared secret missing or wrong");
            return Err(TriageError::Unauthorized);
        }
        Ok(())
    }

    /// Triage a conversation, bounded by the configured model timeout.
    pub async fn handle(
        &self,
        messages: &[ChatMessage],
        secret: Option<&str>,
    ) -> Result<TriageResponse, TriageError> {
        self.handle_with_cancel(messages, secret, tokio::time::sleep(self.llm_timeout))
            .await
    }

    /// Triage a conversation; `cancel` completing aborts the model call.
    pub async fn handle_with_cancel<C>(
        &self,
        messages: &[ChatMessage],
        secret: Option<&str>,
        cancel: C,
    ) -> Result<TriageResponse, TriageError>
    where
        C: Future<Output = ()>,
    {
        self.authorize(secret)?;

        let redacted: Vec<ChatMessage> = messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: redact_pii(&m.content),
            })
            .collect();

        // Screen the caller's own words: redaction only masks contact details
        let assessment = classify_urgency(latest_user_text(messages));

        tracing::info!(
            messages = messages.len(),
            model = self.model.name(),
            rule_tier = %assessment.tier,
            red_flags = assessment.triggered.len(),
            "Triage request"
        );
        if self.allow_logging {
            let tail = &redacted[redacted.len().saturating_sub(DIAGNOSTIC_TAIL)..];
            tracing::info!(
                rule_tier = %assessment.tier,
                last_messages = ?tail,
                "Triage diagnostic (redacted)"
            );
        }

        let outbound = build_triage_messages(&redacted, &assessment);
        let schema = response_schema();

        let raw = tokio::select! {
            result = self.model.complete(&outbound, &schema) => result.map_err(|e| {
                tracing::error!(error = %e, "Model call failed");
                TriageError::from(e)
            })?,
            _ = cancel => {
                tracing::warn!(model = self.model.name(), "Model call cancelled or timed out");
                return Err(TriageError::UpstreamUnavailable(
                    "Model call cancelled or timed out".to_string(),
                ));
            }
        };

        let response = assemble_response(&raw, &assessment);
        tracing::info!(
            triage_level = %response.triage_level,
            fallback = response.raw_text.is_some(),
            "Triage response ready"
        );
        Ok(response)
    }
}

/// Content of the most recent user message, or `""` when there is none.
pub fn latest_user_text(messages: &[ChatMessage]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

/// Turn raw model text into the final guardrailed response.
///
/// A reply with no usable JSON object is replaced by a locally built
/// payload; `raw_text` is set only in that case.
pub fn assemble_response(raw: &str, assessment: &UrgencyAssessment) -> TriageResponse {
    let (payload, raw_text) = match extract_json_object(raw) {
        Ok(map) if !map.is_empty() => (AssistantPayload::from_json_object(map), None),
        Ok(_) => (fallback_payload(raw, assessment), Some(raw.to_string())),
        Err(e) => {
            tracing::warn!(error = %e, "No structured reply, using fallback payload");
            (fallback_payload(raw, assessment), Some(raw.to_string()))
        }
    };

    let assistant = enforce_guardrails(payload, assessment.tier);
    TriageResponse {
        ok: true,
        triage_level: assistant.triage_level.unwrap_or(assessment.tier),
        assistant,
        raw_text,
        safety: assessment.report(),
    }
}

fn fallback_payload(raw: &str, assessment: &UrgencyAssessment) -> AssistantPayload {
    let summary = if raw.trim().is_empty() {
        NO_RESPONSE_MARKER.to_string()
    } else {
        raw.to_string()
    };
    AssistantPayload {
        triage_level: Some(assessment.tier),
        summary: Some(summary),
        disclaimer: Some(FALLBACK_DISCLAIMER.to_string()),
        ..Default::default()
    }
}
