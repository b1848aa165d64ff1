//! Minimal example: one ingest, one search, one listing.
//!
//! Run with: `cargo run --example ingress_demo`
//!
//! Walks the whole path a real deployment takes:
//! - the client fetches the public key and seals a payload
//! - the service opens it, encrypts the fields and stores a blind index
//! - a search by identifier finds the row without scanning ciphertext

use blindvault::{EnvelopeSealer, KeyManager, Secrets, SqliteStore, VerificationService};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // 1. Setup. In production the key comes from `KeyManager::load` and the
    //    secrets from `Settings::load`.
    let db_path = std::env::temp_dir().join("blindvault_demo.db");
    let _ = std::fs::remove_file(&db_path);
    let service = VerificationService::new(
        KeyManager::generate(2048)?,
        &Secrets::generate()?,
        SqliteStore::open(&db_path)?,
    );

    // 2. Client side: seal under the published public key.
    let public = service.public_key_response();
    let sealer = EnvelopeSealer::from_public_key_pem(&public.public_key)?;
    let envelope = sealer.seal(&json!({
        "identifier": "A123",
        "name": "Alice",
        "extra": {"note": "x"}
    }))?;
    println!("Envelope: {}", serde_json::to_string(&envelope)?);

    // 3. Service side: ingest.
    let receipt = service.ingest(&envelope)?;
    println!("Stored record {:?}", receipt.record_id);

    // 4. A second ingest for the same identifier is a conflict.
    let again = sealer.seal(&json!({"identifier": " a123 ", "name": "Mallory"}))?;
    match service.ingest(&again) {
        Err(err) => println!("Second ingest rejected: {err}"),
        Ok(_) => println!("Second ingest unexpectedly stored"),
    }

    // 5. Search and list.
    println!("Search: {}", serde_json::to_string(&service.search("A123")?)?);
    println!("Records: {}", serde_json::to_string(&service.records()?)?);
    println!("Database written to: {}", db_path.display());

    Ok(())
}
