// Opaque identifiers for decisions and documents
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Kinds of record that receive generated identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Decision,
    Document,
}

impl IdKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdKind::Decision => "VIO",
            IdKind::Document => "DOC",
        }
    }

    fn hex_len(&self) -> usize {
        match self {
            IdKind::Decision => 8,
            IdKind::Document => 10,
        }
    }
}

pub trait IdGenerator: Send + Sync {
    fn next_id(&self, kind: IdKind) -> String;
}

/// Random ids such as `VIO-3f9a0c21`, taken from a v4 UUID
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self, kind: IdKind) -> String {
        let hex = Uuid::new_v4().simple().to_string();
        format!("{}-{}", kind.prefix(), &hex[..kind.hex_len()])
    }
}

/// Deterministic ids such as `VIO-00000001`
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self, kind: IdKind) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{:0width$}", kind.prefix(), n, width = kind.hex_len())
    }
}
