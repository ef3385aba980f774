//! API handlers for the compliance service
//!
//! Provides REST endpoints for:
//! - Document ingestion and extraction
//! - Clause evaluation and evidence navigation
//! - Audit-firm risk intelligence
//! - Audit ledger reads and verification
//!
//! The caller is identified by the `x-actor-id` header and authorised by the
//! comma-separated `x-roles` header.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use compliance_engine::{
    detect_repeated_clause_violations, select_neighbors, ClauseEvaluation, IdGenerator, IdKind,
    RiskProfile, UuidIdGenerator,
};
use shared_types::{
    redact_record, Caller, ComplianceDecision, ComplianceError, EvidenceSnippet, RecordStore,
    Section, VerifyResult,
};

use crate::error::ServerError;
use crate::state::{AppState, DocumentRecord};

pub const ACTOR_HEADER: &str = "x-actor-id";
pub const ROLES_HEADER: &str = "x-roles";
const ANONYMOUS: &str = "anonymous";

const OBJECT_DOCUMENT: &str = "document";
const OBJECT_DECISION: &str = "decision";

pub type SharedState = Arc<AppState>;

/// Identify the caller from request headers. Missing headers yield an
/// anonymous caller with no roles.
pub fn caller_from_headers(headers: &HeaderMap) -> Caller {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let actor_id = header(ACTOR_HEADER)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(ANONYMOUS);
    Caller::from_role_list(actor_id, header(ROLES_HEADER).unwrap_or(""))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub rule_types: Vec<String>,
}

/// Handler: GET /health
pub async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "compliance-api",
        version: env!("CARGO_PKG_VERSION"),
        rule_types: state
            .engine
            .registry()
            .rule_types()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// Query parameters for document ingestion
#[derive(Deserialize)]
pub struct IngestParams {
    pub file_name: String,
    pub entity_id: String,
    pub filing_type: String,
}

/// Handler: POST /v1/documents/ingest
pub async fn handle_ingest_document(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<IngestParams>,
) -> Result<Json<DocumentRecord>, ServerError> {
    let caller = caller_from_headers(&headers);
    caller.require(&state.config.access.ledger_writer_role)?;
    if params.file_name.trim().is_empty() || params.entity_id.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "file_name and entity_id must not be empty".to_string(),
        ));
    }

    let record = DocumentRecord {
        document_id: UuidIdGenerator.next_id(IdKind::Document),
        file_name: params.file_name,
        entity_id: params.entity_id,
        filing_type: params.filing_type,
        status: "INGESTED".to_string(),
        ingested_at: chrono::Utc::now().to_rfc3339(),
    };
    state.documents.put(&record.document_id, record.clone())?;
    state.ledger.append_event(
        &caller,
        "INGEST",
        OBJECT_DOCUMENT,
        &record.document_id,
        Some(record.filing_type.as_str()),
    )?;

    info!(
        "Ingested {} as {} for entity {}",
        record.file_name, record.document_id, record.entity_id
    );
    Ok(Json(record))
}

/// Extraction request body
#[derive(Deserialize)]
pub struct ExtractRequest {
    pub raw_text: String,
}

/// Extraction response
#[derive(Serialize, Deserialize)]
pub struct ExtractResponse {
    pub document_id: String,
    pub sections: Vec<Section>,
    pub evidence: Vec<EvidenceSnippet>,
}

/// Handler: POST /v1/documents/:document_id/extract
pub async fn handle_extract_document(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(document_id): Path<String>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ServerError> {
    let caller = caller_from_headers(&headers);
    caller.require(&state.config.access.ledger_writer_role)?;
    if state.documents.get(&document_id).is_none() {
        return Err(ComplianceError::NotFound(document_id).into());
    }

    let sections = state.extractor.extract_sections(&req.raw_text);
    let evidence = state.extractor.extract_evidence(&req.raw_text);
    state.evidence.put(&document_id, evidence.clone())?;
    state
        .ledger
        .append_event(&caller, "EXTRACT", OBJECT_DOCUMENT, &document_id, None)?;

    debug!(
        "Extracted {} sections and {} snippets from {}",
        sections.len(),
        evidence.len(),
        document_id
    );
    Ok(Json(ExtractResponse {
        document_id,
        sections,
        evidence,
    }))
}

/// Handler: POST /v1/compliance/evaluate
pub async fn handle_evaluate_clause(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(input): Json<ClauseEvaluation>,
) -> Result<Json<ComplianceDecision>, ServerError> {
    let caller = caller_from_headers(&headers);
    let (decision, _event) = state
        .engine
        .evaluate_and_record(&caller, &state.ledger, &input)?;
    Ok(Json(decision))
}

/// Handler: GET /v1/violations/:violation_id/evidence
///
/// Callers holding the unredacted reader role get the full payload; everyone
/// else gets the configured projection. Every access is logged.
pub async fn handle_violation_evidence(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(violation_id): Path<String>,
) -> Result<Json<Map<String, Value>>, ServerError> {
    let caller = caller_from_headers(&headers);
    let decision = state
        .engine
        .decision(&violation_id)
        .ok_or_else(|| ComplianceError::NotFound(violation_id.clone()))?;

    let reference = decision.document_reference();
    let candidates = state.evidence.get(&reference.file_id).unwrap_or_default();
    let neighbors = select_neighbors(
        reference,
        &candidates,
        state.config.navigation.neighbor_limit,
    );
    let payload = state.engine.navigate(&violation_id, neighbors)?;

    let unredacted = state.config.access.can_read_unredacted(&caller);
    let view = if unredacted { "unredacted" } else { "redacted" };
    let purpose = format!("{} view by {}", view, caller.actor_id);
    state.ledger.append_event(
        &state.service_caller(),
        "VIEW_EVIDENCE",
        OBJECT_DECISION,
        &violation_id,
        Some(purpose.as_str()),
    )?;

    let allowed = &state.config.access.redacted_navigation_fields;
    let body = if unredacted {
        redact_record(&payload, NAVIGATION_FIELDS.iter().copied())
    } else {
        redact_record(&payload, allowed.iter().map(String::as_str))
    };
    Ok(Json(body.map_err(|e| ServerError::Internal(e.to_string()))?))
}

const NAVIGATION_FIELDS: &[&str] = &[
    "violation_id",
    "document_id",
    "target_page",
    "highlight_bbox",
    "clause",
    "reasoning",
    "evidence_text",
    "neighbors",
];

/// Audit-firm risk request body
#[derive(Deserialize)]
pub struct AuditFirmRiskRequest {
    pub audit_firm: String,
    pub entity_ids: Vec<String>,
    pub recent_violations: u32,
    pub repeat_high_severity: u32,
}

/// Audit-firm risk response
#[derive(Serialize, Deserialize)]
pub struct AuditFirmRiskResponse {
    pub audit_firm: String,
    pub risk_score: f64,
}

/// Handler: POST /v1/intelligence/audit-firm-risk
pub async fn handle_audit_firm_risk(
    Json(req): Json<AuditFirmRiskRequest>,
) -> Json<AuditFirmRiskResponse> {
    let profile = RiskProfile {
        audit_firm: req.audit_firm,
        entity_ids: req.entity_ids.into_iter().collect::<BTreeSet<_>>(),
        recent_violations: req.recent_violations,
        repeat_high_severity: req.repeat_high_severity,
    };
    let risk_score = profile.risk_score();
    Json(AuditFirmRiskResponse {
        audit_firm: profile.audit_firm,
        risk_score,
    })
}

/// Decision-history risk request body
#[derive(Deserialize)]
pub struct DecisionRiskRequest {
    pub audit_firm: String,
    pub violation_ids: Vec<String>,
}

/// Handler: POST /v1/intelligence/audit-firm-risk/decisions
///
/// Folds stored decisions into a risk profile. Each decision is attributed to
/// the entity of the document it was evaluated against.
pub async fn handle_decision_risk(
    State(state): State<SharedState>,
    Json(req): Json<DecisionRiskRequest>,
) -> Result<Json<AuditFirmRiskResponse>, ServerError> {
    let mut history = Vec::with_capacity(req.violation_ids.len());
    for violation_id in &req.violation_ids {
        let decision = state
            .engine
            .decision(violation_id)
            .ok_or_else(|| ComplianceError::NotFound(violation_id.clone()))?;
        let file_id = &decision.document_reference().file_id;
        let document = state
            .documents
            .get(file_id)
            .ok_or_else(|| ComplianceError::NotFound(file_id.clone()))?;
        history.push((document.entity_id, decision));
    }

    let profile = RiskProfile::from_history(
        &req.audit_firm,
        history.iter().map(|(entity, decision)| (entity.as_str(), decision)),
    );
    debug!(
        "Folded {} decisions into risk profile for {}",
        history.len(),
        profile.audit_firm
    );
    Ok(Json(AuditFirmRiskResponse {
        risk_score: profile.risk_score(),
        audit_firm: profile.audit_firm,
    }))
}

/// Repeated-violation request body
#[derive(Deserialize)]
pub struct RepeatViolationsRequest {
    pub clause_history: Vec<String>,
}

/// Repeated-violation response
#[derive(Serialize, Deserialize)]
pub struct RepeatViolationsResponse {
    pub repeated: BTreeMap<String, usize>,
}

/// Handler: POST /v1/intelligence/repeat-violations
pub async fn handle_repeat_violations(
    Json(req): Json<RepeatViolationsRequest>,
) -> Json<RepeatViolationsResponse> {
    Json(RepeatViolationsResponse {
        repeated: detect_repeated_clause_violations(&req.clause_history),
    })
}

/// Audit event listing
#[derive(Serialize)]
pub struct AuditEventsResponse {
    pub redacted: bool,
    pub count: usize,
    pub events: Vec<Map<String, Value>>,
}

/// Handler: GET /v1/audit/events
pub async fn handle_audit_events(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<AuditEventsResponse>, ServerError> {
    let caller = caller_from_headers(&headers);
    let events = state.ledger.events_for(&caller)?;
    Ok(Json(AuditEventsResponse {
        redacted: !state.config.access.can_read_unredacted(&caller),
        count: events.len(),
        events,
    }))
}

/// Handler: GET /v1/audit/verify
pub async fn handle_verify_chain(State(state): State<SharedState>) -> Json<VerifyResult> {
    Json(state.ledger.verify())
}
