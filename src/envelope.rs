//! Hybrid (envelope) encryption at the ingress boundary.
//!
//! A client generates a one-time 256-bit session key, encrypts its JSON
//! payload under it with AES-256-GCM, and wraps the session key under the
//! service's RSA public key with OAEP(SHA-256):
//!
//! ```text
//! wrapped_session_key = RSA-OAEP-SHA256(public_key, session_key)
//! wrapped_payload     = nonce (12) ‖ AES-256-GCM(session_key, json) ‖ tag (16)
//! ```
//!
//! [`EnvelopeDecryptor::open`] reverses this. The recovered session key lives
//! in a zeroising buffer scoped to that one call.

use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::Sha256;

use crate::crypto::{self, KEY_LEN};
use crate::error::VerifyError;
use crate::keys::KeyManager;

/// A JSON object recovered from an envelope.
pub type JsonObject = Map<String, Value>;

/// Ingress wire body. Both fields are standard base64.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    #[serde(alias = "encrypted_symmetric_key")]
    pub wrapped_session_key: String,
    #[serde(alias = "encrypted_data")]
    pub wrapped_payload: String,
}

impl fmt::Debug for EncryptedEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedEnvelope")
            .field("wrapped_session_key_len", &self.wrapped_session_key.len())
            .field("wrapped_payload_len", &self.wrapped_payload.len())
            .finish()
    }
}

/// Opens envelopes addressed to the service key pair.
#[derive(Debug, Clone)]
pub struct EnvelopeDecryptor {
    keys: Arc<KeyManager>,
}

impl EnvelopeDecryptor {
    /// Build a decryptor over the service key pair.
    pub fn new(keys: Arc<KeyManager>) -> Self {
        Self { keys }
    }

    /// Decode the base64 wire fields and open the envelope.
    pub fn open_envelope(&self, envelope: &EncryptedEnvelope) -> Result<JsonObject, VerifyError> {
        let wrapped_key = STANDARD
            .decode(envelope.wrapped_session_key.trim())
            .map_err(|_| VerifyError::MalformedPayload)?;
        let wrapped_payload = STANDARD
            .decode(envelope.wrapped_payload.trim())
            .map_err(|_| VerifyError::MalformedPayload)?;
        self.open(&wrapped_key, &wrapped_payload)
    }

    /// Recover the JSON object carried by an envelope.
    ///
    /// - wrong wrapped-key length, RSA failure, or a recovered key that is not
    ///   32 bytes: [`VerifyError::KeyUnwrap`]
    /// - payload tag mismatch or truncation: [`VerifyError::PayloadDecrypt`]
    /// - not UTF-8, not JSON, or not a JSON object: [`VerifyError::MalformedPayload`]
    pub fn open(
        &self,
        wrapped_session_key: &[u8],
        wrapped_payload: &[u8],
    ) -> Result<JsonObject, VerifyError> {
        let session_key = self.keys.unwrap_session_key(wrapped_session_key)?;
        let session_key: &[u8; KEY_LEN] = session_key
            .as_slice()
            .try_into()
            .map_err(|_| VerifyError::KeyUnwrap)?;

        let plaintext =
            crypto::open(session_key, wrapped_payload).ok_or(VerifyError::PayloadDecrypt)?;

        let text = std::str::from_utf8(&plaintext).map_err(|_| VerifyError::MalformedPayload)?;
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(object)) => Ok(object),
            _ => Err(VerifyError::MalformedPayload),
        }
    }
}

/// Client-side counterpart of [`EnvelopeDecryptor`], built from the
/// published public key PEM.
pub struct EnvelopeSealer {
    public: RsaPublicKey,
}

impl EnvelopeSealer {
    /// Parse the SPKI PEM served by the public-key endpoint.
    pub fn from_public_key_pem(pem: &str) -> Result<Self, VerifyError> {
        let public = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|_| VerifyError::KeyLoad(crate::error::KeyLoadReason::InvalidEncoding))?;
        Ok(Self { public })
    }

    /// Seal a JSON value under a fresh session key.
    pub fn seal(&self, payload: &Value) -> Result<EncryptedEnvelope, VerifyError> {
        let bytes = serde_json::to_vec(payload).map_err(|_| VerifyError::EncryptionFailure)?;
        self.seal_bytes(&bytes)
    }

    /// Seal arbitrary bytes under a fresh session key.
    pub fn seal_bytes(&self, payload: &[u8]) -> Result<EncryptedEnvelope, VerifyError> {
        let session_key = crypto::generate_random_key()?;
        let wrapped_payload = crypto::seal(&session_key, payload)?;
        let wrapped_key = self
            .public
            .encrypt(&mut rand::rngs::OsRng, Oaep::new::<Sha256>(), &session_key[..])
            .map_err(|_| VerifyError::EncryptionFailure)?;

        Ok(EncryptedEnvelope {
            wrapped_session_key: STANDARD.encode(wrapped_key),
            wrapped_payload: STANDARD.encode(wrapped_payload),
        })
    }
}

impl fmt::Debug for EnvelopeSealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EnvelopeSealer { .. }")
    }
}
