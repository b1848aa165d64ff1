//! # blindvault
//!
//! Hybrid-encryption ingress and blind-indexed encrypted record storage.
//!
//! Clients wrap a one-time AES-256 session key under the service's RSA
//! public key and encrypt their JSON payload under that key. The service
//! opens the envelope, re-encrypts each sensitive field with a fresh nonce
//! for storage, and derives an HMAC-SHA256 blind index from the identifier
//! so records can be found by exact match without decrypting the store.
//!
//! ## Public API
//!
//! [`VerificationService`] is the facade the API layer talks to. The
//! building blocks ([`keys::KeyManager`], [`index::BlindIndexer`],
//! [`storage::StorageCipher`], [`envelope::EnvelopeDecryptor`],
//! [`orchestrator::RecordOrchestrator`]) are public for callers that wire
//! their own store or transport. The AEAD primitive layer is `pub(crate)`.

pub(crate) mod crypto;

pub mod config;
pub mod envelope;
pub mod error;
pub mod index;
pub mod keys;
pub mod orchestrator;
pub mod record;
pub mod service;
pub mod storage;
pub mod store;

pub use config::Settings;
pub use envelope::{EncryptedEnvelope, EnvelopeDecryptor, EnvelopeSealer};
pub use error::{StoreError, VerifyError};
pub use index::{BlindIndexValue, BlindIndexer};
pub use keys::{KeyManager, PublicKeyResponse, Secrets, SymmetricSecret};
pub use orchestrator::RecordOrchestrator;
pub use record::{RecordView, VerificationRecord};
pub use service::VerificationService;
pub use storage::{StorageCipher, StorageCiphertext};
pub use store::{MemoryStore, RecordStore, SqliteStore};
