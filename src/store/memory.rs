//! In-process store.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::RecordStore;
use crate::error::StoreError;
use crate::index::BlindIndexValue;
use crate::record::VerificationRecord;

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<VerificationRecord>,
    by_index: HashMap<BlindIndexValue, usize>,
}

/// A `RecordStore` held in memory.
///
/// The uniqueness check and the insert happen under one write lock, so two
/// racing inserts for the same index cannot both succeed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    /// Returns true if no rows are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn insert(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.by_index.contains_key(&record.blind_index) {
            return Err(StoreError::UniqueViolation);
        }
        if inner.rows.iter().any(|row| row.id == record.id) {
            return Err(StoreError::Backend(format!("duplicate primary key {}", record.id)));
        }
        let position = inner.rows.len();
        inner.rows.push(record.clone());
        inner.by_index.insert(record.blind_index.clone(), position);
        Ok(())
    }

    fn find_by_index(
        &self,
        index: &BlindIndexValue,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        let inner = self.inner.read();
        Ok(inner.by_index.get(index).map(|&position| inner.rows[position].clone()))
    }

    fn scan_all(&self) -> Result<Vec<VerificationRecord>, StoreError> {
        Ok(self.inner.read().rows.clone())
    }
}
