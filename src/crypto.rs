//! Low-level symmetric primitives.
//!
//! This module and `index` are the only places in the crate that import
//! `ring` directly. Both the storage cipher and the envelope decryptor seal
//! and open through the functions exposed here, so there is exactly one
//! AEAD framing in the crate.
//!
//! Primitive choices:
//! - **Cipher**: AES-256-GCM (authenticated encryption)
//! - **Nonce**: 96-bit (12 bytes), generated fresh per operation via `SystemRandom`
//! - **Key size**: 256 bits (32 bytes)

use ring::aead::{self, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

use crate::error::VerifyError;

/// The AEAD algorithm used for both storage and envelope payloads.
const ALGORITHM: &aead::Algorithm = &AES_256_GCM;

/// Size of the nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Size of a symmetric key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// A nonce generated for a single encryption operation.
/// Newtype to prevent accidental reuse — each `Nonce` is consumed on use.
struct OwnedNonce(Nonce);

fn generate_nonce() -> Result<OwnedNonce, VerifyError> {
    let rng = SystemRandom::new();
    let mut buf = [0u8; NONCE_LEN];
    rng.fill(&mut buf).map_err(|_| VerifyError::RandomnessFailure)?;
    Ok(OwnedNonce(Nonce::assume_unique_for_key(buf)))
}

fn bind_key(key_bytes: &[u8; KEY_LEN]) -> Result<LessSafeKey, VerifyError> {
    let unbound =
        UnboundKey::new(ALGORITHM, key_bytes).map_err(|_| VerifyError::EncryptionFailure)?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt a plaintext payload using AES-256-GCM.
///
/// # Layout of returned bytes
/// ```text
/// [ nonce (12 bytes) ][ ciphertext ][ GCM tag (16 bytes) ]
/// ```
pub fn seal(key_bytes: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, VerifyError> {
    let key = bind_key(key_bytes)?;
    let nonce = generate_nonce()?;

    let mut output = Vec::with_capacity(NONCE_LEN + plaintext.len() + TAG_LEN);
    output.extend_from_slice(nonce.0.as_ref());
    output.extend_from_slice(plaintext);

    // Encrypts `output[NONCE_LEN..]` in place; the tag is appended after it.
    let tag = key
        .seal_in_place_separate_tag(nonce.0, aead::Aad::empty(), &mut output[NONCE_LEN..])
        .map_err(|_| VerifyError::EncryptionFailure)?;
    output.extend_from_slice(tag.as_ref());

    Ok(output)
}

/// Decrypt bytes in the layout produced by [`seal`].
///
/// Returns `None` on any failure: input shorter than nonce + tag, wrong key,
/// or a tampered nonce, ciphertext or tag. Callers map `None` to the error
/// category that fits their layer. No partial plaintext is ever returned.
pub fn open(key_bytes: &[u8; KEY_LEN], sealed: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
    if sealed.len() < NONCE_LEN + TAG_LEN {
        return None;
    }

    let nonce_bytes: [u8; NONCE_LEN] = sealed[..NONCE_LEN].try_into().ok()?;
    let nonce = Nonce::assume_unique_for_key(nonce_bytes);
    let key = bind_key(key_bytes).ok()?;

    let mut payload = Zeroizing::new(sealed[NONCE_LEN..].to_vec());
    let plaintext_len = key
        .open_in_place(nonce, aead::Aad::empty(), &mut payload[..])
        .ok()?
        .len();
    payload.truncate(plaintext_len);

    Some(payload)
}

/// Generate a cryptographically secure random 256-bit key.
pub fn generate_random_key() -> Result<Zeroizing<[u8; KEY_LEN]>, VerifyError> {
    let rng = SystemRandom::new();
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    rng.fill(&mut key[..]).map_err(|_| VerifyError::RandomnessFailure)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_layout() {
        let key = [7u8; KEY_LEN];
        let sealed = seal(&key, b"abc").unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + 3 + TAG_LEN);
        assert_eq!(&open(&key, &sealed).unwrap()[..], b"abc");
    }

    #[test]
    fn test_seal_places_tag_last() {
        // The body is ciphertext, not plaintext, and a flipped tag byte fails.
        let key = [4u8; KEY_LEN];
        let plaintext = b"field value";
        let sealed = seal(&key, plaintext).unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + plaintext.len() + TAG_LEN);
        assert_ne!(&sealed[NONCE_LEN..NONCE_LEN + plaintext.len()], &plaintext[..]);

        let mut tampered = sealed.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x80;
        assert!(open(&key, &tampered).is_none());
        assert_eq!(&open(&key, &sealed).unwrap()[..], plaintext);
    }

    #[test]
    fn test_open_rejects_short_input() {
        let key = [7u8; KEY_LEN];
        assert!(open(&key, &[0u8; NONCE_LEN + TAG_LEN - 1]).is_none());
    }

    #[test]
    fn test_open_rejects_wrong_key() {
        let sealed = seal(&[1u8; KEY_LEN], b"payload").unwrap();
        assert!(open(&[2u8; KEY_LEN], &sealed).is_none());
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let key = [9u8; KEY_LEN];
        let sealed = seal(&key, b"").unwrap();
        assert!(open(&key, &sealed).unwrap().is_empty());
    }
}
