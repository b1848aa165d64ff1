//! Field-level storage encryption.
//!
//! Each field is sealed independently with a fresh nonce, so identical
//! plaintexts never produce identical stored strings. The stored form is
//! `base64(nonce ‖ ciphertext ‖ tag)`.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::crypto::{self, KEY_LEN};
use crate::error::VerifyError;
use crate::keys::SymmetricSecret;

/// An opaque stored ciphertext.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageCiphertext(String);

impl StorageCiphertext {
    /// Wrap a value read back from storage. No validation happens until decrypt.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The base64 text as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StorageCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageCiphertext({} chars)", self.0.len())
    }
}

/// Randomised authenticated encryption under the storage secret.
pub struct StorageCipher {
    key: [u8; KEY_LEN],
}

impl StorageCipher {
    /// Key a cipher with the storage secret.
    pub fn new(secret: &SymmetricSecret) -> Self {
        Self {
            key: *secret.as_bytes(),
        }
    }

    /// Encrypt one field.
    pub fn encrypt(&self, plaintext: &str) -> Result<StorageCiphertext, VerifyError> {
        let sealed = crypto::seal(&self.key, plaintext.as_bytes())?;
        Ok(StorageCiphertext(STANDARD.encode(sealed)))
    }

    /// Decrypt one field.
    ///
    /// Fails closed with [`VerifyError::StorageDecrypt`] on malformed base64,
    /// truncated input, a failed tag check, or non-UTF-8 plaintext.
    pub fn decrypt(&self, ciphertext: &StorageCiphertext) -> Result<String, VerifyError> {
        let sealed = STANDARD
            .decode(ciphertext.as_str())
            .map_err(|_| VerifyError::StorageDecrypt)?;
        let plaintext = crypto::open(&self.key, &sealed).ok_or(VerifyError::StorageDecrypt)?;
        String::from_utf8(plaintext.to_vec()).map_err(|_| VerifyError::StorageDecrypt)
    }
}

impl Drop for StorageCipher {
    fn drop(&mut self) {
        zeroize::Zeroize::zeroize(&mut self.key);
    }
}

impl fmt::Debug for StorageCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StorageCipher { .. }")
    }
}
