//! The outward-facing facade used by the API layer.

use std::sync::Arc;

use serde_json::Value;

use crate::config::Settings;
use crate::envelope::{EncryptedEnvelope, EnvelopeDecryptor, JsonObject};
use crate::error::VerifyError;
use crate::keys::{KeyManager, PublicKeyResponse, Secrets};
use crate::orchestrator::RecordOrchestrator;
use crate::record::{IngressData, IngressReceipt, RecordListing, RecordView, SearchResponse};
use crate::store::{RecordStore, SqliteStore};

/// Owns the key pair, the envelope decryptor and the record orchestrator.
///
/// Every component inside is immutable after construction, so a single
/// service can be shared across request handlers behind an `Arc`.
#[derive(Debug)]
pub struct VerificationService<S> {
    keys: Arc<KeyManager>,
    decryptor: EnvelopeDecryptor,
    records: RecordOrchestrator<S>,
}

impl VerificationService<SqliteStore> {
    /// Build a service from settings: load the private key, decode the
    /// secrets and open the SQLite database. Any misconfiguration fails here.
    pub fn from_settings(settings: &Settings) -> Result<Self, VerifyError> {
        let keys = KeyManager::load(&settings.keys.private_key_path)?;
        let secrets = settings.secrets()?;
        let store = SqliteStore::open(&settings.database.path)?;
        Ok(Self::new(keys, &secrets, store))
    }
}

impl<S: RecordStore> VerificationService<S> {
    /// Assemble a service from a loaded key pair, the secrets and a store.
    pub fn new(keys: KeyManager, secrets: &Secrets, store: S) -> Self {
        let keys = Arc::new(keys);
        let service = Self {
            decryptor: EnvelopeDecryptor::new(Arc::clone(&keys)),
            records: RecordOrchestrator::new(secrets, store),
            keys,
        };
        tracing::info!(rsa_bits = service.keys.bits(), "verification service ready");
        service
    }

    /// SPKI PEM clients seal envelopes to.
    pub fn public_key_pem(&self) -> &str {
        self.keys.public_key_pem()
    }

    /// The public-key endpoint body.
    pub fn public_key_response(&self) -> PublicKeyResponse {
        self.keys.public_key_response()
    }

    /// Open an envelope without storing anything.
    pub fn open(&self, envelope: &EncryptedEnvelope) -> Result<JsonObject, VerifyError> {
        self.decryptor.open_envelope(envelope).inspect_err(|err| {
            tracing::warn!(error = %err, "envelope rejected");
        })
    }

    /// The full ingress flow: open the envelope, check the required fields,
    /// and store the record.
    pub fn ingest(&self, envelope: &EncryptedEnvelope) -> Result<IngressReceipt, VerifyError> {
        let object = self.open(envelope)?;
        let data: IngressData = serde_json::from_value(Value::Object(object))
            .map_err(|_| VerifyError::MalformedPayload)?;
        let record_id = self.create_record(&data.identifier, &data.name, data.extra)?;
        Ok(IngressReceipt::stored(record_id))
    }

    /// Store a record from already-decrypted fields. See
    /// [`RecordOrchestrator::create_record`].
    pub fn create_record(
        &self,
        identifier: &str,
        name: &str,
        extra: Option<Value>,
    ) -> Result<String, VerifyError> {
        self.records.create_record(identifier, name, extra)
    }

    /// Exact-match lookup by identifier. A miss is `Ok(None)`.
    pub fn find_by_identifier(&self, identifier: &str) -> Result<Option<RecordView>, VerifyError> {
        self.records.find_by_identifier(identifier)
    }

    /// Decrypt every stored record.
    pub fn list_all(&self) -> Result<Vec<RecordView>, VerifyError> {
        self.records.list_all()
    }

    /// Search shaped as the search endpoint's response body.
    pub fn search(&self, identifier: &str) -> Result<SearchResponse, VerifyError> {
        self.find_by_identifier(identifier).map(SearchResponse::from)
    }

    /// Listing shaped as the records endpoint's response body.
    pub fn records(&self) -> Result<RecordListing, VerifyError> {
        self.list_all().map(RecordListing::from)
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        self.records.store()
    }
}
