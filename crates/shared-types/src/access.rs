//! Role checks and field-level redaction
//!
//! Every ledger write and every unredacted read goes through `assert_role`.
//! Callers without the reader role only ever see a `redact`ed projection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ComplianceError;

pub const ROLE_COMPLIANCE_OFFICER: &str = "compliance_officer";
pub const ROLE_AUDITOR: &str = "auditor";

/// Identity and roles of whoever is calling into the core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub actor_id: String,
    pub roles: BTreeSet<String>,
}

impl Caller {
    pub fn new<I, S>(actor_id: &str, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actor_id: actor_id.to_string(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated role list such as `"auditor, compliance_officer"`
    pub fn from_role_list(actor_id: &str, roles: &str) -> Self {
        Self::new(
            actor_id,
            roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty()),
        )
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn require(&self, role: &str) -> Result<(), ComplianceError> {
        assert_role(self.roles.iter().map(String::as_str), role)
    }
}

/// Fails with `PermissionDenied` unless `required_role` is among `caller_roles`
pub fn assert_role<'a, I>(caller_roles: I, required_role: &str) -> Result<(), ComplianceError>
where
    I: IntoIterator<Item = &'a str>,
{
    if caller_roles.into_iter().any(|r| r == required_role) {
        Ok(())
    } else {
        tracing::warn!("Permission denied: missing role {}", required_role);
        Err(ComplianceError::PermissionDenied {
            required_role: required_role.to_string(),
        })
    }
}

/// Keep only the allowed top-level fields of a payload
pub fn redact<'a, I>(payload: &Map<String, Value>, allowed_fields: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a str>,
{
    let allow: BTreeSet<&str> = allowed_fields.into_iter().collect();
    payload
        .iter()
        .filter(|(k, _)| allow.contains(k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Serialize a record and project it onto the allowed fields.
///
/// Records that do not serialize to a JSON object redact to an empty map.
pub fn redact_record<'a, T, I>(
    record: &T,
    allowed_fields: I,
) -> Result<Map<String, Value>, serde_json::Error>
where
    T: Serialize,
    I: IntoIterator<Item = &'a str>,
{
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(redact(&map, allowed_fields)),
        _ => Ok(Map::new()),
    }
}

/// Which role gates what, and which fields a non-privileged caller may see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessPolicy {
    /// Role required to append to the audit ledger
    pub ledger_writer_role: String,
    /// Role required to read events or evidence without redaction
    pub unredacted_reader_role: String,
    /// Audit event fields visible to everyone else
    pub redacted_event_fields: Vec<String>,
    /// Navigation payload fields visible to everyone else
    pub redacted_navigation_fields: Vec<String>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            ledger_writer_role: ROLE_COMPLIANCE_OFFICER.to_string(),
            unredacted_reader_role: ROLE_AUDITOR.to_string(),
            redacted_event_fields: ["action", "object_type", "object_id", "hash"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            redacted_navigation_fields: [
                "violation_id",
                "document_id",
                "target_page",
                "highlight_bbox",
                "clause",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl AccessPolicy {
    pub fn can_read_unredacted(&self, caller: &Caller) -> bool {
        caller.has_role(&self.unredacted_reader_role)
    }
}
