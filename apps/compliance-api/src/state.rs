//! Application state for the compliance API

use serde::{Deserialize, Serialize};
use shared_types::{AuditLedger, Caller, EvidenceSnippet, MemoryStore};

use compliance_engine::{AnchorExtractor, ComplianceEngine, Extractor};

use crate::config::ServiceConfig;

/// Actor recorded on access events written by the service
pub const SERVICE_ACTOR: &str = "compliance-api";

/// A filing registered for extraction and evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document_id: String,
    pub file_name: String,
    pub entity_id: String,
    pub filing_type: String,
    pub status: String,
    pub ingested_at: String,
}

pub struct AppState {
    pub config: ServiceConfig,
    pub engine: ComplianceEngine,
    pub ledger: AuditLedger,
    pub documents: MemoryStore<DocumentRecord>,
    /// Extracted evidence per document id
    pub evidence: MemoryStore<Vec<EvidenceSnippet>>,
    pub extractor: Box<dyn Extractor>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let ledger = AuditLedger::new(config.access.clone());
        Self {
            config,
            engine: ComplianceEngine::default(),
            ledger,
            documents: MemoryStore::new(),
            evidence: MemoryStore::new(),
            extractor: Box::new(AnchorExtractor),
        }
    }

    /// The service's own ledger identity, used to log reads made by callers
    /// who cannot write to the ledger themselves
    pub fn service_caller(&self) -> Caller {
        Caller::new(
            SERVICE_ACTOR,
            [self.config.access.ledger_writer_role.as_str()],
        )
    }
}
