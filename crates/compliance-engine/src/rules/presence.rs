// Mandatory keyword presence in the evidence text
use super::{required_field, Rule, RuleOutcome, RulePayload};
use shared_types::ComplianceError;

pub const CONFIDENCE_PASSED: f64 = 0.92;
pub const CONFIDENCE_FAILED: f64 = 0.78;

/// Passes when every keyword of `required_keywords` (comma-separated) occurs
/// in `evidence_text`, ignoring case
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceRule;

/// Split a comma-separated keyword list into trimmed, lowercased keywords
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

impl Rule for PresenceRule {
    fn rule_type(&self) -> &'static str {
        "presence"
    }

    fn evaluate(&self, payload: &RulePayload) -> Result<RuleOutcome, ComplianceError> {
        let evidence_text = required_field(payload, "evidence_text")?;
        // An empty list has nothing missing and passes
        let keywords = parse_keywords(required_field(payload, "required_keywords")?);

        let haystack = evidence_text.to_lowercase();
        let missing: Vec<&str> = keywords
            .iter()
            .filter(|k| !haystack.contains(k.as_str()))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(RuleOutcome::new(
                true,
                "All mandatory keywords found.",
                CONFIDENCE_PASSED,
            ))
        } else {
            Ok(RuleOutcome::new(
                false,
                format!("Mandatory keywords missing: {}.", missing.join(", ")),
                CONFIDENCE_FAILED,
            ))
        }
    }
}
