use thiserror::Error;

/// Errors raised by rule evaluation, the audit ledger and evidence navigation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComplianceError {
    #[error("Unsupported rule type: {0}")]
    UnsupportedRuleType(String),

    #[error("Malformed payload field '{field}': {reason}")]
    MalformedPayload { field: String, reason: String },

    #[error("Required role missing: {required_role}")]
    PermissionDenied { required_role: String },

    #[error("Audit chain broken at event {index}: {reason}")]
    ChainIntegrityViolation { index: usize, reason: String },

    #[error("Decision {violation_id} has no resolved document reference ({field})")]
    MissingReference { violation_id: String, field: String },

    #[error("Record already exists: {0}")]
    DuplicateRecord(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}

impl ComplianceError {
    pub fn malformed(field: &str, reason: impl Into<String>) -> Self {
        ComplianceError::MalformedPayload {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
