//! Evidence navigation payloads for the document viewer

use serde::{Deserialize, Serialize};
use shared_types::{
    BoundingBox, ComplianceDecision, ComplianceError, DocumentReference, EvidenceSnippet,
};

/// Everything a viewer needs to jump to a decision's evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationPayload {
    pub violation_id: String,
    pub document_id: String,
    pub target_page: u32,
    pub highlight_bbox: BoundingBox,
    pub clause: String,
    pub reasoning: String,
    pub evidence_text: String,
    pub neighbors: Vec<EvidenceSnippet>,
}

/// Build the payload for `decision`. Neighbors are passed through verbatim.
pub fn build_navigation_payload(
    decision: &ComplianceDecision,
    neighboring_evidence: Vec<EvidenceSnippet>,
) -> Result<NavigationPayload, ComplianceError> {
    let reference = decision.document_reference();
    let resolved = reference
        .resolve()
        .ok_or_else(|| ComplianceError::MissingReference {
            violation_id: decision.violation_id().to_string(),
            field: reference
                .unresolved_field()
                .unwrap_or("document_reference")
                .to_string(),
        })?;

    Ok(NavigationPayload {
        violation_id: decision.violation_id().to_string(),
        document_id: resolved.file_id.to_string(),
        target_page: resolved.page,
        highlight_bbox: resolved.bounding_box,
        clause: decision.clause().to_string(),
        reasoning: decision.reasoning().to_string(),
        evidence_text: decision.evidence_text().to_string(),
        neighbors: neighboring_evidence,
    })
}

/// Pick up to `limit` extracted snippets on the same page as `reference`,
/// skipping the decision's own highlight, in extraction order
pub fn select_neighbors(
    reference: &DocumentReference,
    candidates: &[EvidenceSnippet],
    limit: usize,
) -> Vec<EvidenceSnippet> {
    candidates
        .iter()
        .filter(|s| s.page == reference.page)
        .filter(|s| reference.bounding_box != Some(s.bbox))
        .take(limit)
        .cloned()
        .collect()
}
