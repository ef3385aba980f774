pub mod extractors;
pub mod ids;
pub mod navigation;
pub mod patterns;
pub mod risk;
pub mod rules;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared_types::{
    AuditEvent, AuditLedger, BoundingBox, Caller, ComplianceDecision, ComplianceError, Confidence,
    DecisionDraft, DocumentReference, EvidenceSnippet, MemoryStore, RecordStore,
};

pub use extractors::{AnchorExtractor, Extractor};
pub use ids::{IdGenerator, IdKind, SequentialIdGenerator, UuidIdGenerator};
pub use navigation::{build_navigation_payload, select_neighbors, NavigationPayload};
pub use risk::{compute_audit_firm_risk, detect_repeated_clause_violations, RiskProfile};
pub use rules::{Rule, RuleLogic, RuleOutcome, RulePayload, RuleRegistry};

/// Audit action recorded when a clause evaluation produces a decision
pub const ACTION_EVALUATE: &str = "EVALUATE";
pub const OBJECT_DECISION: &str = "decision";

/// Fresh ids drawn for one decision before a collision is reported
const MAX_ID_ATTEMPTS: usize = 5;

/// One clause to evaluate against one document excerpt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClauseEvaluation {
    pub document_id: String,
    pub regulation: String,
    pub clause: String,
    pub clause_logic: RuleLogic,
    pub evidence_text: String,
    pub page: u32,
    pub bbox: Option<BoundingBox>,
}

/// ComplianceEngine entry point
pub struct ComplianceEngine {
    registry: RuleRegistry,
    ids: Arc<dyn IdGenerator>,
    decisions: Arc<dyn RecordStore<ComplianceDecision>>,
}

impl ComplianceEngine {
    pub fn new(
        registry: RuleRegistry,
        ids: Arc<dyn IdGenerator>,
        decisions: Arc<dyn RecordStore<ComplianceDecision>>,
    ) -> Self {
        Self {
            registry,
            ids,
            decisions,
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Pure rule evaluation; nothing is recorded
    pub fn evaluate(
        &self,
        rule_type: &str,
        payload: &RulePayload,
    ) -> Result<RuleOutcome, ComplianceError> {
        self.registry.evaluate(rule_type, payload)
    }

    /// Evaluate a clause and store the resulting decision.
    ///
    /// The clause's evidence text is offered to the rule as `evidence_text`
    /// unless the clause logic already carries one.
    pub fn evaluate_clause(
        &self,
        input: &ClauseEvaluation,
    ) -> Result<ComplianceDecision, ComplianceError> {
        let mut payload = input.clause_logic.payload.clone();
        payload
            .entry("evidence_text".to_string())
            .or_insert_with(|| input.evidence_text.clone());

        let outcome = self
            .registry
            .evaluate(&input.clause_logic.rule_type, &payload)?;

        let draft = DecisionDraft {
            regulation: input.regulation.clone(),
            clause: input.clause.clone(),
            document_reference: DocumentReference {
                file_id: input.document_id.clone(),
                page: input.page,
                bounding_box: input.bbox,
            },
            evidence_text: input.evidence_text.clone(),
            reasoning: outcome.reasoning,
            passed: outcome.passed,
            confidence: Confidence::new(outcome.confidence)?,
        };
        let decision = self.store_decision(draft)?;

        tracing::info!(
            "Decision {} for {} {}: {}",
            decision.violation_id(),
            decision.regulation(),
            decision.clause(),
            decision.severity()
        );
        Ok(decision)
    }

    /// Store a new decision under a fresh id, drawing again when a
    /// generated id is already taken
    fn store_decision(&self, draft: DecisionDraft) -> Result<ComplianceDecision, ComplianceError> {
        let mut attempt = 1;
        loop {
            let violation_id = self.ids.next_id(IdKind::Decision);
            let decision = ComplianceDecision::new(violation_id, draft.clone());
            match self.decisions.put(decision.violation_id(), decision.clone()) {
                Ok(()) => return Ok(decision),
                Err(ComplianceError::DuplicateRecord(id)) if attempt < MAX_ID_ATTEMPTS => {
                    tracing::warn!("Decision id {} already taken, drawing another", id);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Evaluate, store and append the decision to the audit ledger.
    ///
    /// The caller's write permission is checked before anything is evaluated
    /// so a rejected caller leaves no decision behind.
    pub fn evaluate_and_record(
        &self,
        caller: &Caller,
        ledger: &AuditLedger,
        input: &ClauseEvaluation,
    ) -> Result<(ComplianceDecision, AuditEvent), ComplianceError> {
        caller.require(&ledger.policy().ledger_writer_role)?;
        let decision = self.evaluate_clause(input)?;
        let purpose = format!("{} {}", decision.regulation(), decision.clause());
        let event = ledger.append_event(
            caller,
            ACTION_EVALUATE,
            OBJECT_DECISION,
            decision.violation_id(),
            Some(purpose.as_str()),
        )?;
        Ok((decision, event))
    }

    pub fn decision(&self, violation_id: &str) -> Option<ComplianceDecision> {
        self.decisions.get(violation_id)
    }

    /// Navigation payload for a stored decision
    pub fn navigate(
        &self,
        violation_id: &str,
        neighbors: Vec<EvidenceSnippet>,
    ) -> Result<NavigationPayload, ComplianceError> {
        let decision = self
            .decision(violation_id)
            .ok_or_else(|| ComplianceError::NotFound(violation_id.to_string()))?;
        build_navigation_payload(&decision, neighbors)
    }
}

impl Default for ComplianceEngine {
    fn default() -> Self {
        Self::new(
            RuleRegistry::with_defaults(),
            Arc::new(UuidIdGenerator),
            Arc::new(MemoryStore::new()),
        )
    }
}
