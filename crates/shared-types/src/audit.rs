//! Tamper-evident audit ledger for decisions and access events
//!
//! Each event stores the hash of its predecessor and its own digest, forming a
//! single linear chain rooted at [`GENESIS_HASH`]. Appends are serialized
//! behind a write lock so two writers can never fork the chain from the same
//! tail; readers work on a cloned snapshot.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::access::{redact, AccessPolicy, Caller};
use crate::error::ComplianceError;

/// Predecessor hash of the first event in every chain
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

const HASH_DOMAIN: &[u8] = b"compliance-audit-event/v1";

/// A single audit log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub actor_id: String,
    pub action: String,
    pub object_type: String,
    pub object_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    pub prev_hash: String,
    pub hash: String,
}

impl AuditEvent {
    /// Build an event linked to `prev_hash`, with its digest filled in
    pub fn chained(
        prev_hash: String,
        actor_id: &str,
        action: &str,
        object_type: &str,
        object_id: &str,
        purpose: Option<&str>,
    ) -> Self {
        let hash = event_digest(&prev_hash, actor_id, action, object_type, object_id, purpose);
        Self {
            actor_id: actor_id.to_string(),
            action: action.to_string(),
            object_type: object_type.to_string(),
            object_id: object_id.to_string(),
            purpose: purpose.map(str::to_string),
            prev_hash,
            hash,
        }
    }

    /// Recompute the digest from the stored fields
    pub fn compute_hash(&self) -> String {
        event_digest(
            &self.prev_hash,
            &self.actor_id,
            &self.action,
            &self.object_type,
            &self.object_id,
            self.purpose.as_deref(),
        )
    }

    /// The event as a flat field map, for redaction
    pub fn fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("actor_id".into(), Value::from(self.actor_id.as_str()));
        map.insert("action".into(), Value::from(self.action.as_str()));
        map.insert("object_type".into(), Value::from(self.object_type.as_str()));
        map.insert("object_id".into(), Value::from(self.object_id.as_str()));
        if let Some(ref purpose) = self.purpose {
            map.insert("purpose".into(), Value::from(purpose.as_str()));
        }
        map.insert("prev_hash".into(), Value::from(self.prev_hash.as_str()));
        map.insert("hash".into(), Value::from(self.hash.as_str()));
        map
    }
}

/// SHA-256 over length-prefixed fields.
///
/// Every field is written as a big-endian u64 byte length followed by its
/// bytes, so no choice of field contents can collide with a different split.
/// The optional purpose carries a presence tag.
pub fn event_digest(
    prev_hash: &str,
    actor_id: &str,
    action: &str,
    object_type: &str,
    object_id: &str,
    purpose: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(HASH_DOMAIN);
    for field in [prev_hash, actor_id, action, object_type, object_id] {
        update_field(&mut hasher, field.as_bytes());
    }
    match purpose {
        Some(p) => {
            hasher.update([1u8]);
            update_field(&mut hasher, p.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    hex::encode(hasher.finalize())
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// Outcome of walking a chain from genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyResult {
    Intact { events: usize },
    Broken { index: usize, reason: String },
}

impl VerifyResult {
    pub fn is_intact(&self) -> bool {
        matches!(self, VerifyResult::Intact { .. })
    }

    /// Index of the first bad event, if any
    pub fn first_bad_index(&self) -> Option<usize> {
        match self {
            VerifyResult::Intact { .. } => None,
            VerifyResult::Broken { index, .. } => Some(*index),
        }
    }

    pub fn into_result(self) -> Result<usize, ComplianceError> {
        match self {
            VerifyResult::Intact { events } => Ok(events),
            VerifyResult::Broken { index, reason } => {
                Err(ComplianceError::ChainIntegrityViolation { index, reason })
            }
        }
    }
}

/// Recompute the chain from genesis, stopping at the first mismatch
pub fn verify_chain(events: &[AuditEvent]) -> VerifyResult {
    let mut expected_prev: &str = GENESIS_HASH;

    for (i, event) in events.iter().enumerate() {
        if event.prev_hash != expected_prev {
            return VerifyResult::Broken {
                index: i,
                reason: format!(
                    "expected prev {}, got {}",
                    expected_prev, event.prev_hash
                ),
            };
        }
        if event.hash != event.compute_hash() {
            return VerifyResult::Broken {
                index: i,
                reason: "stored hash does not match recomputed digest".to_string(),
            };
        }
        expected_prev = &event.hash;
    }

    VerifyResult::Intact {
        events: events.len(),
    }
}

/// Append-only, role-guarded audit chain
#[derive(Debug, Default)]
pub struct AuditLedger {
    events: RwLock<Vec<AuditEvent>>,
    policy: AccessPolicy,
}

impl AuditLedger {
    pub fn new(policy: AccessPolicy) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            policy,
        }
    }

    /// Rebuild a ledger from persisted events; the chain must verify.
    pub fn restore(
        policy: AccessPolicy,
        caller: &Caller,
        events: Vec<AuditEvent>,
    ) -> Result<Self, ComplianceError> {
        caller.require(&policy.ledger_writer_role)?;
        let count = verify_chain(&events).into_result()?;
        tracing::info!("Restored audit ledger with {} events", count);
        Ok(Self {
            events: RwLock::new(events),
            policy,
        })
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Append an event for `caller`, linked to the current tail
    pub fn append_event(
        &self,
        caller: &Caller,
        action: &str,
        object_type: &str,
        object_id: &str,
        purpose: Option<&str>,
    ) -> Result<AuditEvent, ComplianceError> {
        caller.require(&self.policy.ledger_writer_role)?;

        // Tail read and push happen under one write guard.
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        let prev_hash = events
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let event = AuditEvent::chained(
            prev_hash,
            &caller.actor_id,
            action,
            object_type,
            object_id,
            purpose,
        );
        events.push(event.clone());

        tracing::debug!(
            "Audit event #{}: {} {} {}/{}",
            events.len() - 1,
            event.actor_id,
            event.action,
            event.object_type,
            event.object_id
        );
        Ok(event)
    }

    /// Full events; requires the unredacted reader role and an intact chain
    pub fn events(&self, caller: &Caller) -> Result<Vec<AuditEvent>, ComplianceError> {
        caller.require(&self.policy.unredacted_reader_role)?;
        self.verified_snapshot()
    }

    /// Events projected onto the policy's public fields
    pub fn redacted_events(&self) -> Result<Vec<Map<String, Value>>, ComplianceError> {
        let allowed = &self.policy.redacted_event_fields;
        Ok(self
            .verified_snapshot()?
            .iter()
            .map(|e| redact(&e.fields(), allowed.iter().map(String::as_str)))
            .collect())
    }

    /// Full events for privileged callers, redacted ones for everyone else
    pub fn events_for(&self, caller: &Caller) -> Result<Vec<Map<String, Value>>, ComplianceError> {
        if self.policy.can_read_unredacted(caller) {
            Ok(self.events(caller)?.iter().map(AuditEvent::fields).collect())
        } else {
            self.redacted_events()
        }
    }

    pub fn verify(&self) -> VerifyResult {
        let result = verify_chain(&self.snapshot());
        if let VerifyResult::Broken { index, ref reason } = result {
            tracing::error!("Audit chain integrity violation at {}: {}", index, reason);
        }
        result
    }

    pub fn tail_hash(&self) -> String {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|e| e.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string())
    }

    pub fn len(&self) -> usize {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<AuditEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn verified_snapshot(&self) -> Result<Vec<AuditEvent>, ComplianceError> {
        let snapshot = self.snapshot();
        verify_chain(&snapshot).into_result()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{ROLE_AUDITOR, ROLE_COMPLIANCE_OFFICER};
    use std::sync::Arc;

    fn officer() -> Caller {
        Caller::new("officer-1", [ROLE_COMPLIANCE_OFFICER])
    }

    fn auditor() -> Caller {
        Caller::new("auditor-1", [ROLE_AUDITOR])
    }

    fn ledger_with(count: usize) -> AuditLedger {
        let ledger = AuditLedger::default();
        for i in 0..count {
            ledger
                .append_event(&officer(), "EVALUATE", "decision", &format!("VIO-{}", i), None)
                .unwrap();
        }
        ledger
    }

    #[test]
    fn test_chain_integrity() {
        let ledger = ledger_with(3);
        assert_eq!(ledger.verify(), VerifyResult::Intact { events: 3 });

        let events = ledger.events(&auditor()).unwrap();
        assert_eq!(events[0].prev_hash, GENESIS_HASH);
        assert_eq!(events[1].prev_hash, events[0].hash);
        assert_eq!(events[2].prev_hash, events[1].hash);
        assert_eq!(ledger.tail_hash(), events[2].hash);
    }

    #[test]
    fn test_empty_chain_verifies() {
        assert_eq!(verify_chain(&[]), VerifyResult::Intact { events: 0 });
        assert_eq!(AuditLedger::default().tail_hash(), GENESIS_HASH);
    }

    #[test]
    fn test_chain_tamper_detection_reports_index() {
        let mut events = ledger_with(4).events(&auditor()).unwrap();
        events[2].actor_id = "mallory".to_string();

        let result = verify_chain(&events);
        assert_eq!(result.first_bad_index(), Some(2));
        assert!(matches!(
            result.into_result(),
            Err(ComplianceError::ChainIntegrityViolation { index: 2, .. })
        ));
    }

    #[test]
    fn test_purpose_tamper_detected() {
        let ledger = AuditLedger::default();
        ledger
            .append_event(&officer(), "VIEW_EVIDENCE", "decision", "VIO-1", Some("review"))
            .unwrap();
        let mut events = ledger.events(&auditor()).unwrap();
        events[0].purpose = None;
        assert_eq!(verify_chain(&events).first_bad_index(), Some(0));
    }

    #[test]
    fn test_reorder_detected() {
        let mut events = ledger_with(3).events(&auditor()).unwrap();
        events.swap(0, 1);
        assert_eq!(verify_chain(&events).first_bad_index(), Some(0));
    }

    #[test]
    fn test_delimiter_ambiguity_does_not_collide() {
        let a = event_digest(GENESIS_HASH, "alice|EVALUATE", "x", "decision", "VIO-1", None);
        let b = event_digest(GENESIS_HASH, "alice", "EVALUATE|x", "decision", "VIO-1", None);
        assert_ne!(a, b);

        let none = event_digest(GENESIS_HASH, "a", "b", "c", "d", None);
        let empty = event_digest(GENESIS_HASH, "a", "b", "c", "d", Some(""));
        assert_ne!(none, empty);
    }

    #[test]
    fn test_append_requires_writer_role() {
        let ledger = AuditLedger::default();
        let err = ledger
            .append_event(&auditor(), "EVALUATE", "decision", "VIO-1", None)
            .unwrap_err();
        assert_eq!(
            err,
            ComplianceError::PermissionDenied {
                required_role: ROLE_COMPLIANCE_OFFICER.to_string()
            }
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_unredacted_read_requires_reader_role() {
        let ledger = ledger_with(1);
        assert!(matches!(
            ledger.events(&officer()),
            Err(ComplianceError::PermissionDenied { .. })
        ));

        let redacted = ledger.events_for(&officer()).unwrap();
        assert!(redacted[0].get("actor_id").is_none());
        assert_eq!(redacted[0]["object_id"], "VIO-0");

        let full = ledger.events_for(&auditor()).unwrap();
        assert_eq!(full[0]["actor_id"], "officer-1");
    }

    #[test]
    fn test_restore_rejects_tampered_events() {
        let mut events = ledger_with(3).events(&auditor()).unwrap();
        events[1].object_id = "VIO-999".to_string();

        let err = AuditLedger::restore(AccessPolicy::default(), &officer(), events).unwrap_err();
        assert!(matches!(
            err,
            ComplianceError::ChainIntegrityViolation { index: 1, .. }
        ));
    }

    #[test]
    fn test_restore_then_append_continues_chain() {
        let events = ledger_with(2).events(&auditor()).unwrap();
        let tail = events[1].hash.clone();
        let ledger = AuditLedger::restore(AccessPolicy::default(), &officer(), events).unwrap();
        let next = ledger
            .append_event(&officer(), "EVALUATE", "decision", "VIO-2", None)
            .unwrap();
        assert_eq!(next.prev_hash, tail);
        assert!(ledger.verify().is_intact());
    }

    #[test]
    fn test_concurrent_appends_keep_single_chain() {
        let ledger = Arc::new(AuditLedger::default());
        std::thread::scope(|scope| {
            for t in 0..8 {
                let ledger = Arc::clone(&ledger);
                scope.spawn(move || {
                    for i in 0..25 {
                        ledger
                            .append_event(
                                &officer(),
                                "EVALUATE",
                                "decision",
                                &format!("VIO-{}-{}", t, i),
                                None,
                            )
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(ledger.len(), 200);
        assert_eq!(ledger.verify(), VerifyResult::Intact { events: 200 });
    }

    #[test]
    fn test_event_json_omits_missing_purpose() {
        let event = AuditEvent::chained(
            GENESIS_HASH.to_string(),
            "a",
            "EVALUATE",
            "decision",
            "VIO-1",
            None,
        );
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("purpose").is_none());
        let back: AuditEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
