//! Keyed record storage passed explicitly to the components that need it

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::error::ComplianceError;

/// Minimal write-once store: records are put once and read by id
pub trait RecordStore<V>: Send + Sync {
    fn get(&self, id: &str) -> Option<V>;

    /// Fails with `DuplicateRecord` if `id` is already present
    fn put(&self, id: &str, value: V) -> Result<(), ComplianceError>;
}

/// In-process store backed by a `HashMap`
#[derive(Debug)]
pub struct MemoryStore<V> {
    records: RwLock<HashMap<String, V>>,
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> RecordStore<V> for MemoryStore<V> {
    fn get(&self, id: &str) -> Option<V> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn put(&self, id: &str, value: V) -> Result<(), ComplianceError> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(id) {
            return Err(ComplianceError::DuplicateRecord(id.to_string()));
        }
        records.insert(id.to_string(), value);
        Ok(())
    }
}
