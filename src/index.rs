//! Blind indexing.
//!
//! A blind index is `hex(HMAC-SHA256(hmac_secret, normalize(identifier)))`.
//! It is deterministic, so it can back a UNIQUE column and an equality
//! lookup, and it is one-way without the secret.
//!
//! Determinism is the point and also the cost: an observer of the raw store
//! learns which rows share an identifier. Only exact-match equality is
//! derivable from the digest; there is no ordering, prefix or fuzzy structure.

use std::fmt;

use ring::hmac;
use serde::{Deserialize, Serialize};

use crate::error::VerifyError;
use crate::keys::SymmetricSecret;

/// Length of the raw digest in bytes.
pub const INDEX_LEN: usize = 32;

/// Normalise an identifier before it is indexed or encrypted.
///
/// Rule: trim surrounding whitespace, then ASCII-uppercase. Leading zeros are
/// significant and kept. Internal whitespace is kept. Changing this function
/// orphans every index already written, so it must never change silently.
pub fn normalize_identifier(identifier: &str) -> Result<String, VerifyError> {
    let normalized = identifier.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(VerifyError::InvalidRecord("identifier is empty"));
    }
    Ok(normalized)
}

/// A blind index value: 64 lowercase hex characters.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlindIndexValue(String);

impl BlindIndexValue {
    /// Wrap a stored hex digest. Used by store backends reading rows back.
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlindIndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for BlindIndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlindIndexValue({})", self.0)
    }
}

/// Computes blind indexes under one HMAC secret.
pub struct BlindIndexer {
    key: hmac::Key,
}

impl BlindIndexer {
    /// Key an indexer with the HMAC secret.
    pub fn new(secret: &SymmetricSecret) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
        }
    }

    /// Index an identifier. The identifier is normalised first; see
    /// [`normalize_identifier`].
    pub fn index(&self, identifier: &str) -> Result<BlindIndexValue, VerifyError> {
        let normalized = normalize_identifier(identifier)?;
        Ok(self.index_normalized(&normalized))
    }

    /// Index a value that has already been through [`normalize_identifier`].
    pub(crate) fn index_normalized(&self, normalized: &str) -> BlindIndexValue {
        let tag = hmac::sign(&self.key, normalized.as_bytes());
        BlindIndexValue(hex::encode(tag.as_ref()))
    }
}

impl fmt::Debug for BlindIndexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlindIndexer { .. }")
    }
}
