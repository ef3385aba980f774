// Linkage between figures reported in different statements
use super::{Rule, RuleOutcome, RulePayload};
use shared_types::ComplianceError;

pub const CONFIDENCE_PASSED: f64 = 0.90;
pub const CONFIDENCE_FAILED: f64 = 0.72;

/// Passes when `mapping_ok` equals `"true"` ignoring case. Anything else,
/// including an absent field, fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossStatementRule;

impl Rule for CrossStatementRule {
    fn rule_type(&self) -> &'static str {
        "cross_statement"
    }

    fn evaluate(&self, payload: &RulePayload) -> Result<RuleOutcome, ComplianceError> {
        let mapping_ok = payload
            .get("mapping_ok")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        if mapping_ok {
            Ok(RuleOutcome::new(
                true,
                "Cross-statement linkage validated.",
                CONFIDENCE_PASSED,
            ))
        } else {
            Ok(RuleOutcome::new(
                false,
                "Cross-statement linkage failed.",
                CONFIDENCE_FAILED,
            ))
        }
    }
}
