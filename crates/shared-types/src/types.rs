use std::fmt;

use crate::error::ComplianceError;

/// Highlight rectangle on a page, in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Finite coordinates with a non-inverted extent
    pub fn is_well_formed(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite())
            && self.x2 >= self.x1
            && self.y2 >= self.y1
    }
}

/// Where in a filing a decision's evidence sits
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentReference {
    pub file_id: String,
    pub page: u32, // 1-based; 0 means not yet located
    pub bounding_box: Option<BoundingBox>,
}

/// A document reference with every part present
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReference<'a> {
    pub file_id: &'a str,
    pub page: u32,
    pub bounding_box: BoundingBox,
}

impl DocumentReference {
    pub fn new(file_id: &str, page: u32, bounding_box: BoundingBox) -> Self {
        Self {
            file_id: file_id.to_string(),
            page,
            bounding_box: Some(bounding_box),
        }
    }

    /// Returns the name of the first unresolved part, if any
    pub fn unresolved_field(&self) -> Option<&'static str> {
        if self.file_id.trim().is_empty() {
            return Some("file_id");
        }
        if self.page == 0 {
            return Some("page");
        }
        match self.bounding_box {
            Some(bbox) if bbox.is_well_formed() => None,
            _ => Some("bounding_box"),
        }
    }

    pub fn resolve(&self) -> Option<ResolvedReference<'_>> {
        if self.unresolved_field().is_some() {
            return None;
        }
        Some(ResolvedReference {
            file_id: &self.file_id,
            page: self.page,
            bounding_box: self.bounding_box?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    High,
}

impl Severity {
    /// Passing clauses are LOW, failing clauses HIGH
    pub fn from_outcome(passed: bool) -> Self {
        if passed {
            Severity::Low
        } else {
            Severity::High
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// Heuristic certainty attached to a decision, always within [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Result<Self, ComplianceError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ComplianceError::malformed(
                "confidence",
                format!("{} is outside [0, 1]", value),
            ))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = ComplianceError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Confidence::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(confidence: Confidence) -> Self {
        confidence.0
    }
}

/// Verdict for one clause evaluated against one document excerpt.
///
/// Decisions are built once and never mutated; fields are read-only from
/// outside this crate.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComplianceDecision {
    violation_id: String,
    regulation: String,
    clause: String,
    document_reference: DocumentReference,
    evidence_text: String,
    reasoning: String,
    severity: Severity,
    confidence: Confidence,
}

/// Everything needed to create a decision apart from its identifier
#[derive(Debug, Clone)]
pub struct DecisionDraft {
    pub regulation: String,
    pub clause: String,
    pub document_reference: DocumentReference,
    pub evidence_text: String,
    pub reasoning: String,
    pub passed: bool,
    pub confidence: Confidence,
}

impl ComplianceDecision {
    pub fn new(violation_id: String, draft: DecisionDraft) -> Self {
        Self {
            violation_id,
            regulation: draft.regulation,
            clause: draft.clause,
            document_reference: draft.document_reference,
            evidence_text: draft.evidence_text,
            reasoning: draft.reasoning,
            severity: Severity::from_outcome(draft.passed),
            confidence: draft.confidence,
        }
    }

    pub fn violation_id(&self) -> &str {
        &self.violation_id
    }

    pub fn regulation(&self) -> &str {
        &self.regulation
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn document_reference(&self) -> &DocumentReference {
        &self.document_reference
    }

    pub fn evidence_text(&self) -> &str {
        &self.evidence_text
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn confidence(&self) -> Confidence {
        self.confidence
    }

    pub fn passed(&self) -> bool {
        self.severity == Severity::Low
    }
}

/// Snippet of filing text with its location, as produced by extraction
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EvidenceSnippet {
    pub evidence_text: String,
    pub page: u32,
    pub bbox: BoundingBox,
    pub source: String,
}

/// Named section detected in a filing
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Section {
    pub section_title: String,
    pub start_page: u32,
    pub end_page: u32,
    pub confidence: f64,
}
