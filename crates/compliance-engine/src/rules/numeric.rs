// Numeric consistency between two reported figures
use super::{parse_number, required_field, Rule, RuleOutcome, RulePayload};
use shared_types::ComplianceError;

pub const CONFIDENCE_PASSED: f64 = 0.95;
pub const CONFIDENCE_FAILED: f64 = 0.85;

/// Passes when `|lhs - rhs| <= tolerance`; tolerance defaults to zero
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericConsistencyRule;

impl Rule for NumericConsistencyRule {
    fn rule_type(&self) -> &'static str {
        "numeric_consistency"
    }

    fn evaluate(&self, payload: &RulePayload) -> Result<RuleOutcome, ComplianceError> {
        let lhs = parse_number("lhs", required_field(payload, "lhs")?)?;
        let rhs = parse_number("rhs", required_field(payload, "rhs")?)?;
        let tolerance = parse_number(
            "tolerance",
            payload.get("tolerance").map(String::as_str).unwrap_or("0"),
        )?;

        let diff = (lhs - rhs).abs();
        if diff <= tolerance {
            Ok(RuleOutcome::new(
                true,
                format!("|{} - {}| <= {}", lhs, rhs, tolerance),
                CONFIDENCE_PASSED,
            ))
        } else {
            Ok(RuleOutcome::new(
                false,
                format!("Difference {} exceeds tolerance ({}).", diff, tolerance),
                CONFIDENCE_FAILED,
            ))
        }
    }
}
