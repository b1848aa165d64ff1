//! The persistence collaborator.
//!
//! The orchestrator never checks for an existing row before inserting. It
//! relies on the store rejecting a second row with the same blind index
//! atomically, which stays correct with several service instances writing
//! to one database.

use crate::error::StoreError;
use crate::index::BlindIndexValue;
use crate::record::VerificationRecord;

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A store for encrypted verification records.
///
/// Implementations must be safe to share across threads and must enforce
/// blind-index uniqueness inside `insert` itself.
pub trait RecordStore: Send + Sync {
    /// Insert a row. Returns [`StoreError::UniqueViolation`] when a row with
    /// the same blind index exists.
    fn insert(&self, record: &VerificationRecord) -> Result<(), StoreError>;

    /// Equality lookup on the blind index.
    fn find_by_index(
        &self,
        index: &BlindIndexValue,
    ) -> Result<Option<VerificationRecord>, StoreError>;

    /// Every row, in insertion order.
    fn scan_all(&self) -> Result<Vec<VerificationRecord>, StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    fn insert(&self, record: &VerificationRecord) -> Result<(), StoreError> {
        (**self).insert(record)
    }

    fn find_by_index(
        &self,
        index: &BlindIndexValue,
    ) -> Result<Option<VerificationRecord>, StoreError> {
        (**self).find_by_index(index)
    }

    fn scan_all(&self) -> Result<Vec<VerificationRecord>, StoreError> {
        (**self).scan_all()
    }
}
