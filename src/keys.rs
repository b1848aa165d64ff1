//! Key material ownership.
//!
//! This module owns two responsibilities:
//! 1. Holding the service's RSA key pair ([`KeyManager`]), loaded once at
//!    startup and read-only afterwards.
//! 2. Holding the two long-lived symmetric secrets ([`SymmetricSecret`]) in
//!    types that are opaque, non-cloneable, and zeroised on drop.
//!
//! Neither type ever serialises private material. The only outward-facing
//! encoding is the public key PEM.

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::KEY_LEN;
use crate::error::{KeyLoadReason, VerifyError};

/// Smallest RSA modulus accepted, in bits.
pub const MIN_RSA_BITS: usize = 2048;

// ---------------------------------------------------------------------------
// Symmetric secrets
// ---------------------------------------------------------------------------

/// A 256-bit symmetric secret configured at startup.
///
/// - Not `Clone`. Cannot be duplicated without explicit conversion.
/// - Zeroised on drop.
/// - `Debug` prints a placeholder, never the bytes.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SymmetricSecret {
    bytes: [u8; KEY_LEN],
}

impl SymmetricSecret {
    /// Construct a secret from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Decode a secret from standard base64 text. The decoded value must be
    /// exactly 32 bytes; anything else is rejected here rather than at first use.
    pub fn from_base64(encoded: &str) -> Result<Self, VerifyError> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|_| VerifyError::InvalidSecret("secret is not valid base64"))?,
        );
        let bytes: [u8; KEY_LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| VerifyError::InvalidSecret("secret must decode to 32 bytes"))?;
        Ok(Self { bytes })
    }

    /// Generate a fresh random secret.
    pub fn generate() -> Result<Self, VerifyError> {
        let key = crate::crypto::generate_random_key()?;
        Ok(Self { bytes: *key })
    }

    /// `pub(crate)` — raw bytes never leave the crate.
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for SymmetricSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricSecret([redacted])")
    }
}

/// The immutable secret bundle injected into every symmetric component.
#[derive(Debug)]
pub struct Secrets {
    /// Keys the blind index HMAC.
    pub hmac: SymmetricSecret,
    /// Keys the storage cipher.
    pub storage: SymmetricSecret,
}

impl Secrets {
    /// Bundle two secrets. They must differ: reusing one key for both the
    /// HMAC and the cipher couples two unrelated primitives.
    pub fn new(hmac: SymmetricSecret, storage: SymmetricSecret) -> Result<Self, VerifyError> {
        if hmac.as_bytes() == storage.as_bytes() {
            return Err(VerifyError::InvalidSecret("hmac and storage secrets must differ"));
        }
        Ok(Self { hmac, storage })
    }

    /// Generate both secrets at random.
    pub fn generate() -> Result<Self, VerifyError> {
        Self::new(SymmetricSecret::generate()?, SymmetricSecret::generate()?)
    }
}

// ---------------------------------------------------------------------------
// Asymmetric key pair
// ---------------------------------------------------------------------------

/// Response body for the public-key endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyResponse {
    pub public_key: String,
    pub format: String,
}

/// The service's RSA key pair.
///
/// The private half is only ever used inside [`KeyManager::unwrap_session_key`].
/// The public half is pre-encoded once so every caller sees byte-identical PEM.
pub struct KeyManager {
    private: RsaPrivateKey,
    public_pem: String,
}

impl KeyManager {
    /// Load a PEM-encoded RSA private key from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VerifyError> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path).map_err(|err| {
            let reason = match err.kind() {
                std::io::ErrorKind::NotFound => KeyLoadReason::Missing,
                _ => KeyLoadReason::Unreadable,
            };
            VerifyError::KeyLoad(reason)
        })?;
        let pem = Zeroizing::new(pem);
        let manager = Self::from_pem(&pem)?;
        tracing::info!(path = %path.display(), bits = manager.bits(), "loaded RSA private key");
        Ok(manager)
    }

    /// Parse a PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1 (`BEGIN RSA PRIVATE KEY`) PEM.
    pub fn from_pem(pem: &str) -> Result<Self, VerifyError> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|_| VerifyError::KeyLoad(KeyLoadReason::InvalidEncoding))?;
        Self::from_private_key(private)
    }

    /// Wrap an already-parsed private key, applying the same validation as [`Self::load`].
    pub fn from_private_key(private: RsaPrivateKey) -> Result<Self, VerifyError> {
        private
            .validate()
            .map_err(|_| VerifyError::KeyLoad(KeyLoadReason::InvalidEncoding))?;
        if private.size() * 8 < MIN_RSA_BITS {
            return Err(VerifyError::KeyLoad(KeyLoadReason::TooSmall));
        }

        let public_pem = RsaPublicKey::from(&private)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|_| VerifyError::KeyLoad(KeyLoadReason::PublicEncoding))?;

        Ok(Self { private, public_pem })
    }

    /// Generate a fresh key pair. Intended for provisioning and tests;
    /// production keys are loaded from a file with [`Self::load`].
    pub fn generate(bits: usize) -> Result<Self, VerifyError> {
        let private = RsaPrivateKey::new(&mut rand::rngs::OsRng, bits)
            .map_err(|_| VerifyError::RandomnessFailure)?;
        Self::from_private_key(private)
    }

    /// SPKI PEM of the public half. Safe to publish.
    pub fn public_key_pem(&self) -> &str {
        &self.public_pem
    }

    /// The public-key endpoint body.
    pub fn public_key_response(&self) -> PublicKeyResponse {
        PublicKeyResponse {
            public_key: self.public_pem.clone(),
            format: "PEM".to_string(),
        }
    }

    /// Length in bytes of every RSA ciphertext under this key.
    pub fn ciphertext_len(&self) -> usize {
        self.private.size()
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.private.size() * 8
    }

    /// RSA-OAEP(SHA-256) decrypt a wrapped session key.
    ///
    /// Blinding is applied. The recovered bytes are returned in a buffer that
    /// is wiped when dropped.
    pub(crate) fn unwrap_session_key(
        &self,
        wrapped: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, VerifyError> {
        if wrapped.len() != self.ciphertext_len() {
            return Err(VerifyError::KeyUnwrap);
        }
        self.private
            .decrypt_blinded(&mut rand::rngs::OsRng, Oaep::new::<Sha256>(), wrapped)
            .map(Zeroizing::new)
            .map_err(|_| VerifyError::KeyUnwrap)
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("bits", &self.bits())
            .field("private", &"[redacted]")
            .finish()
    }
}
