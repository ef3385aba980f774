pub mod access;
pub mod audit;
pub mod error;
pub mod store;
pub mod types;

pub use access::{assert_role, redact, redact_record, AccessPolicy, Caller};
pub use audit::{verify_chain, AuditEvent, AuditLedger, VerifyResult, GENESIS_HASH};
pub use error::ComplianceError;
pub use store::{MemoryStore, RecordStore};
pub use types::{
    BoundingBox, ComplianceDecision, Confidence, DecisionDraft, DocumentReference,
    EvidenceSnippet, ResolvedReference, Section, Severity,
};
