//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::OnceLock;

use blindvault::{KeyManager, MemoryStore, Secrets, SymmetricSecret, VerificationService};
use rsa::RsaPrivateKey;

/// One RSA-2048 key per test binary; generation is the slow part.
pub fn private_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).unwrap())
}

pub fn key_manager() -> KeyManager {
    KeyManager::from_private_key(private_key().clone()).unwrap()
}

pub fn secrets() -> Secrets {
    Secrets::new(
        SymmetricSecret::from_bytes([0x11; 32]),
        SymmetricSecret::from_bytes([0x22; 32]),
    )
    .unwrap()
}

pub fn memory_service() -> VerificationService<MemoryStore> {
    VerificationService::new(key_manager(), &secrets(), MemoryStore::new())
}
