//! Record creation, lookup and listing.
//!
//! The orchestrator is the only place plaintext fields meet the store. On
//! the way in every sensitive field is sealed before a row is built; on the
//! way out only the aggregate blob is opened.

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{StoreError, VerifyError};
use crate::index::{normalize_identifier, BlindIndexer};
use crate::keys::Secrets;
use crate::record::{
    RecordPayload, RecordView, VerificationRecord, MAX_IDENTIFIER_LEN, MAX_NAME_LEN,
};
use crate::storage::StorageCipher;
use crate::store::RecordStore;

/// Composes the blind indexer and storage cipher with a [`RecordStore`].
pub struct RecordOrchestrator<S> {
    indexer: BlindIndexer,
    cipher: StorageCipher,
    store: S,
}

impl<S: RecordStore> RecordOrchestrator<S> {
    /// Build the indexer and cipher from the secrets and take ownership of the store.
    pub fn new(secrets: &Secrets, store: S) -> Self {
        Self {
            indexer: BlindIndexer::new(&secrets.hmac),
            cipher: StorageCipher::new(&secrets.storage),
            store,
        }
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a record and return its id.
    ///
    /// The identifier is normalised, then the identifier and name are each
    /// sealed on their own and the full payload is sealed as one aggregate.
    /// Uniqueness is left to the store's constraint: of two concurrent creates
    /// for the same identifier exactly one succeeds and the other returns
    /// [`VerifyError::DuplicateRecord`].
    pub fn create_record(
        &self,
        identifier: &str,
        name: &str,
        extra: Option<Value>,
    ) -> Result<String, VerifyError> {
        let identifier = normalize_identifier(identifier)?;
        if identifier.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(VerifyError::InvalidRecord("identifier too long"));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(VerifyError::InvalidRecord("name is empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(VerifyError::InvalidRecord("name too long"));
        }
        let extra = match extra {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(Value::Object(map)),
            Some(_) => return Err(VerifyError::InvalidRecord("extra must be an object")),
        };

        let payload = RecordPayload {
            identifier,
            name: name.to_string(),
            extra,
        };
        let aggregate =
            serde_json::to_string(&payload).map_err(|_| VerifyError::EncryptionFailure)?;

        let now = Utc::now();
        let record = VerificationRecord {
            id: Uuid::new_v4().to_string(),
            encrypted_identifier: self.cipher.encrypt(&payload.identifier)?,
            encrypted_name: self.cipher.encrypt(&payload.name)?,
            encrypted_aggregate: self.cipher.encrypt(&aggregate)?,
            blind_index: self.indexer.index_normalized(&payload.identifier),
            created_at: now,
            updated_at: now,
        };

        match self.store.insert(&record) {
            Ok(()) => {
                tracing::info!(record_id = %record.id, "record created");
                Ok(record.id)
            }
            Err(StoreError::UniqueViolation) => {
                tracing::debug!("create rejected: record already exists");
                Err(VerifyError::DuplicateRecord)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Look a record up by identifier. A miss is `Ok(None)`.
    pub fn find_by_identifier(&self, identifier: &str) -> Result<Option<RecordView>, VerifyError> {
        let index = self.indexer.index(identifier)?;
        match self.store.find_by_index(&index)? {
            Some(record) => self.decrypt_record(&record).map(Some),
            None => {
                tracing::debug!("search miss");
                Ok(None)
            }
        }
    }

    /// Decrypt every stored record.
    ///
    /// This is a full O(n) sweep meant for small administrative listings. The
    /// first row that fails to decrypt aborts the listing.
    pub fn list_all(&self) -> Result<Vec<RecordView>, VerifyError> {
        self.store
            .scan_all()?
            .iter()
            .map(|record| self.decrypt_record(record))
            .collect()
    }

    fn decrypt_record(&self, record: &VerificationRecord) -> Result<RecordView, VerifyError> {
        let aggregate = self.cipher.decrypt(&record.encrypted_aggregate).inspect_err(|_| {
            tracing::warn!(record_id = %record.id, "stored aggregate failed to decrypt");
        })?;
        let payload: RecordPayload =
            serde_json::from_str(&aggregate).map_err(|_| VerifyError::StorageDecrypt)?;

        Ok(RecordView {
            id: record.id.clone(),
            identifier: payload.identifier,
            name: payload.name,
            extra: payload.extra,
            created_at: record.created_at,
        })
    }
}

impl<S> std::fmt::Debug for RecordOrchestrator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordOrchestrator").finish_non_exhaustive()
    }
}
