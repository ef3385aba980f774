//! Audit-firm risk scoring from violation history
//!
//! Three saturating components, weighted and clamped to [0, 1]:
//! - volume: recent violations, saturating at 30
//! - severity: repeated high-severity violations, saturating at 10
//! - spread: audited entities, saturating at 20

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use shared_types::{ComplianceDecision, Severity};

pub const VOLUME_SATURATION: f64 = 30.0;
pub const SEVERITY_SATURATION: f64 = 10.0;
pub const SPREAD_SATURATION: f64 = 20.0;

const VOLUME_WEIGHT: f64 = 0.5;
const SEVERITY_WEIGHT: f64 = 0.35;
const SPREAD_WEIGHT: f64 = 0.15;

/// Risk score in [0, 1], rounded to 4 decimal places
pub fn compute_audit_firm_risk(
    recent_violations: u32,
    repeat_high_severity: u32,
    entity_count: usize,
) -> f64 {
    let volume = (f64::from(recent_violations) / VOLUME_SATURATION).min(1.0);
    let severity = (f64::from(repeat_high_severity) / SEVERITY_SATURATION).min(1.0);
    let spread = (entity_count as f64 / SPREAD_SATURATION).min(1.0);

    let score =
        VOLUME_WEIGHT * volume + SEVERITY_WEIGHT * severity + SPREAD_WEIGHT * spread;
    round4(score.clamp(0.0, 1.0))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Clauses violated more than once, with their counts
pub fn detect_repeated_clause_violations<S: AsRef<str>>(
    clause_history: &[S],
) -> BTreeMap<String, usize> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for clause in clause_history {
        *counts.entry(clause.as_ref().to_string()).or_insert(0) += 1;
    }
    counts.retain(|_, count| *count > 1);
    counts
}

/// Aggregator inputs for one audit firm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub audit_firm: String,
    pub entity_ids: BTreeSet<String>,
    pub recent_violations: u32,
    pub repeat_high_severity: u32,
}

impl RiskProfile {
    /// Fold `(entity_id, decision)` history into aggregator inputs.
    ///
    /// Every HIGH decision counts as a recent violation; HIGH decisions whose
    /// clause fails more than once count as repeat high severity.
    pub fn from_history<'a, I>(audit_firm: &str, history: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a ComplianceDecision)>,
    {
        let mut entity_ids = BTreeSet::new();
        let mut failed_clauses: Vec<&str> = Vec::new();

        for (entity_id, decision) in history {
            entity_ids.insert(entity_id.to_string());
            if decision.severity() == Severity::High {
                failed_clauses.push(decision.clause());
            }
        }

        let repeated: usize = detect_repeated_clause_violations(&failed_clauses)
            .values()
            .sum();

        Self {
            audit_firm: audit_firm.to_string(),
            entity_ids,
            recent_violations: saturating_u32(failed_clauses.len()),
            repeat_high_severity: saturating_u32(repeated),
        }
    }

    pub fn risk_score(&self) -> f64 {
        compute_audit_firm_risk(
            self.recent_violations,
            self.repeat_high_severity,
            self.entity_ids.len(),
        )
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::{BoundingBox, Confidence, DecisionDraft, DocumentReference};

    fn decision(id: &str, clause: &str, passed: bool) -> ComplianceDecision {
        ComplianceDecision::new(
            id.to_string(),
            DecisionDraft {
                regulation: "Companies Act 2013".to_string(),
                clause: clause.to_string(),
                document_reference: DocumentReference::new(
                    "DOC-1",
                    1,
                    BoundingBox::new(0.0, 0.0, 1.0, 1.0),
                ),
                evidence_text: String::new(),
                reasoning: String::new(),
                passed,
                confidence: Confidence::new(0.9).unwrap(),
            },
        )
    }

    #[test]
    fn test_saturation_and_zero_point() {
        assert_eq!(compute_audit_firm_risk(30, 10, 20), 1.0);
        assert_eq!(compute_audit_firm_risk(300, 100, 200), 1.0);
        assert_eq!(compute_audit_firm_risk(0, 0, 0), 0.0);
    }

    #[test]
    fn test_weighted_components() {
        assert_eq!(compute_audit_firm_risk(15, 0, 0), 0.25);
        assert_eq!(compute_audit_firm_risk(0, 5, 0), 0.175);
        assert_eq!(compute_audit_firm_risk(0, 0, 10), 0.075);
        // 0.5 * 7/30 = 0.116666...
        assert_eq!(compute_audit_firm_risk(7, 0, 0), 0.1167);
    }

    #[test]
    fn test_detect_repeated_clause_violations() {
        let repeated = detect_repeated_clause_violations(&["A", "B", "A", "C", "A"]);
        assert_eq!(repeated, BTreeMap::from([("A".to_string(), 3)]));
        assert!(detect_repeated_clause_violations::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_profile_from_history() {
        let history = [
            ("ENT-1", decision("VIO-1", "17(1)", false)),
            ("ENT-1", decision("VIO-2", "17(1)", false)),
            ("ENT-2", decision("VIO-3", "23", false)),
            ("ENT-3", decision("VIO-4", "17(1)", true)),
        ];
        let profile = RiskProfile::from_history(
            "Firm & Co",
            history.iter().map(|(e, d)| (*e, d)),
        );

        assert_eq!(profile.recent_violations, 3);
        assert_eq!(profile.repeat_high_severity, 2);
        assert_eq!(profile.entity_ids.len(), 3);
        assert_eq!(
            profile.risk_score(),
            compute_audit_firm_risk(3, 2, 3)
        );
    }
}
