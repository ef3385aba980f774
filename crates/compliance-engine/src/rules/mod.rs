//! Clause rules and the registry that dispatches to them by tag
//!
//! Rule payloads arrive as raw string maps. Each rule parses the fields it
//! needs into typed values and reports parse failures as `MalformedPayload`.

pub mod cross_statement;
pub mod numeric;
pub mod presence;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared_types::ComplianceError;

pub use cross_statement::CrossStatementRule;
pub use numeric::NumericConsistencyRule;
pub use presence::PresenceRule;

/// Raw rule payload as authored: string keys to string values
pub type RulePayload = BTreeMap<String, String>;

/// Verdict of a single rule evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub passed: bool,
    pub reasoning: String,
    pub confidence: f64,
}

impl RuleOutcome {
    pub fn new(passed: bool, reasoning: impl Into<String>, confidence: f64) -> Self {
        Self {
            passed,
            reasoning: reasoning.into(),
            confidence,
        }
    }
}

/// A clause rule. Implementations must be pure: same payload, same outcome.
pub trait Rule: Send + Sync {
    /// Tag this rule is registered under, e.g. `"presence"`
    fn rule_type(&self) -> &'static str;

    fn evaluate(&self, payload: &RulePayload) -> Result<RuleOutcome, ComplianceError>;
}

/// Clause logic as it travels on the wire: `{"type": "...", ...fields}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleLogic {
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(flatten)]
    pub payload: RulePayload,
}

impl RuleLogic {
    pub fn new(rule_type: &str, payload: RulePayload) -> Self {
        Self {
            rule_type: rule_type.to_string(),
            payload,
        }
    }
}

/// Open registry of rules keyed by tag
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<String, Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Empty registry with no rule types
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `presence`, `numeric_consistency` and
    /// `cross_statement` rules
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PresenceRule);
        registry.register(NumericConsistencyRule);
        registry.register(CrossStatementRule);
        registry
    }

    /// Register a rule under its own tag, replacing any previous one
    pub fn register<R: Rule + 'static>(&mut self, rule: R) -> &mut Self {
        self.rules.insert(rule.rule_type().to_string(), Arc::new(rule));
        self
    }

    pub fn supports(&self, rule_type: &str) -> bool {
        self.rules.contains_key(rule_type)
    }

    /// Registered tags, sorted
    pub fn rule_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn evaluate(
        &self,
        rule_type: &str,
        payload: &RulePayload,
    ) -> Result<RuleOutcome, ComplianceError> {
        let rule = self
            .rules
            .get(rule_type)
            .ok_or_else(|| ComplianceError::UnsupportedRuleType(rule_type.to_string()))?;
        let outcome = rule.evaluate(payload)?;
        tracing::debug!(
            "Rule {} -> passed={} confidence={}",
            rule_type,
            outcome.passed,
            outcome.confidence
        );
        Ok(outcome)
    }

    pub fn evaluate_logic(&self, logic: &RuleLogic) -> Result<RuleOutcome, ComplianceError> {
        self.evaluate(&logic.rule_type, &logic.payload)
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rule_types", &self.rule_types())
            .finish()
    }
}

/// Fetch a payload field that must be present
pub(crate) fn required_field<'a>(
    payload: &'a RulePayload,
    field: &str,
) -> Result<&'a str, ComplianceError> {
    payload
        .get(field)
        .map(String::as_str)
        .ok_or_else(|| ComplianceError::malformed(field, "missing field"))
}

/// Parse a payload field as a finite float
pub(crate) fn parse_number(field: &str, raw: &str) -> Result<f64, ComplianceError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ComplianceError::malformed(field, format!("'{}' is not numeric", raw)))?;
    if !value.is_finite() {
        return Err(ComplianceError::malformed(
            field,
            format!("'{}' is not a finite number", raw),
        ));
    }
    Ok(value)
}

#[cfg(test)]
pub(crate) fn payload(pairs: &[(&str, &str)]) -> RulePayload {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysPass;

    impl Rule for AlwaysPass {
        fn rule_type(&self) -> &'static str {
            "always_pass"
        }

        fn evaluate(&self, _payload: &RulePayload) -> Result<RuleOutcome, ComplianceError> {
            Ok(RuleOutcome::new(true, "ok", 1.0))
        }
    }

    #[test]
    fn test_unknown_rule_type_rejected() {
        let registry = RuleRegistry::with_defaults();
        assert_eq!(
            registry.evaluate("materiality", &payload(&[])),
            Err(ComplianceError::UnsupportedRuleType("materiality".to_string()))
        );
    }

    #[test]
    fn test_new_rule_types_register_without_touching_dispatch() {
        let mut registry = RuleRegistry::with_defaults();
        registry.register(AlwaysPass);
        assert!(registry.supports("always_pass"));
        assert_eq!(
            registry.rule_types(),
            vec!["always_pass", "cross_statement", "numeric_consistency", "presence"]
        );
        assert!(registry.evaluate("always_pass", &payload(&[])).unwrap().passed);
    }

    #[test]
    fn test_rule_logic_wire_format() {
        let logic: RuleLogic = serde_json::from_str(
            r#"{"type": "numeric_consistency", "lhs": "100", "rhs": "100.4", "tolerance": "0.5"}"#,
        )
        .unwrap();
        assert_eq!(logic.rule_type, "numeric_consistency");
        assert_eq!(logic.payload.get("lhs").map(String::as_str), Some("100"));
        assert!(!logic.payload.contains_key("type"));
        assert_eq!(
            logic,
            RuleLogic::new(
                "numeric_consistency",
                payload(&[("lhs", "100"), ("rhs", "100.4"), ("tolerance", "0.5")])
            )
        );

        let outcome = RuleRegistry::with_defaults().evaluate_logic(&logic).unwrap();
        assert!(outcome.passed);
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert!(parse_number("lhs", "12.5").is_ok());
        assert!(parse_number("lhs", " 7 ").is_ok());
        assert!(parse_number("lhs", "NaN").is_err());
        assert!(parse_number("lhs", "inf").is_err());
        assert!(parse_number("lhs", "ten").is_err());
    }
}
