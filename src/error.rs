//! Error types for blindvault.
//!
//! Every variant is a distinct failure category. Messages are intentionally
//! minimal: they signal *what* failed without revealing *why* in ways that
//! could leak key material, plaintext, or library internals. Callers that
//! sit at a trust boundary forward the category and nothing else.

use thiserror::Error;

/// Why a private key could not be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLoadReason {
    /// The key file does not exist.
    Missing,
    /// The key file exists but could not be read.
    Unreadable,
    /// The contents are not a PKCS#8 or PKCS#1 PEM-encoded RSA private key.
    InvalidEncoding,
    /// The modulus is smaller than the minimum accepted size.
    TooSmall,
    /// The public half could not be re-encoded as PEM.
    PublicEncoding,
}

impl std::fmt::Display for KeyLoadReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::Missing => "key file missing",
            Self::Unreadable => "key file unreadable",
            Self::InvalidEncoding => "not a valid RSA private key encoding",
            Self::TooSmall => "RSA modulus too small",
            Self::PublicEncoding => "public key encoding failed",
        };
        f.write_str(reason)
    }
}

/// The single error type for all blindvault operations.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The private key could not be loaded. Fatal at startup.
    #[error("key load failed: {0}")]
    KeyLoad(KeyLoadReason),

    /// A configured symmetric secret is malformed or mis-sized.
    #[error("invalid secret: {0}")]
    InvalidSecret(&'static str),

    /// Settings could not be assembled from file and environment.
    #[error("configuration error: {0}")]
    Config(String),

    /// The wrapped session key could not be recovered: wrong length,
    /// wrong public key, tampering, or an unexpected recovered key size.
    #[error("session key unwrap failed")]
    KeyUnwrap,

    /// The envelope payload failed authentication under the session key.
    #[error("payload decryption failed")]
    PayloadDecrypt,

    /// The envelope decrypted but is not a UTF-8 JSON object of the expected
    /// shape, or its fields were not valid base64.
    #[error("malformed payload")]
    MalformedPayload,

    /// A stored ciphertext failed authentication or is not well formed.
    #[error("stored ciphertext could not be decrypted")]
    StorageDecrypt,

    /// A record for this identifier already exists.
    #[error("record already exists")]
    DuplicateRecord,

    /// Record fields failed validation.
    #[error("invalid record: {0}")]
    InvalidRecord(&'static str),

    /// Encryption failed. The underlying `ring` operation returned an error.
    #[error("encryption failed")]
    EncryptionFailure,

    /// The system's random number generator failed to produce bytes.
    #[error("randomness source failed")]
    RandomnessFailure,

    /// The persistence collaborator failed for a reason other than uniqueness.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Failures reported by a [`crate::store::RecordStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The blind-index uniqueness constraint rejected the insert.
    #[error("unique constraint violated")]
    UniqueViolation,

    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<StoreError> for VerifyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation => VerifyError::DuplicateRecord,
            StoreError::Backend(msg) => VerifyError::Storage(msg),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = VerifyError> = std::result::Result<T, E>;
