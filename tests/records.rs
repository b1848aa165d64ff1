mod support;

use std::sync::{Arc, Barrier};
use std::thread;

use blindvault::{EnvelopeSealer, MemoryStore, RecordOrchestrator, RecordStore, VerifyError};
use serde_json::json;

fn orchestrator() -> RecordOrchestrator<MemoryStore> {
    RecordOrchestrator::new(&support::secrets(), MemoryStore::new())
}

#[test]
fn test_duplicate_identifier_rejected() {
    let orch = orchestrator();
    orch.create_record("123456", "Alice", None).unwrap();

    let second = orch.create_record("123456", "Bob", None);
    assert!(matches!(second, Err(VerifyError::DuplicateRecord)));
    assert_eq!(orch.store().len(), 1);

    let stored = orch.find_by_identifier("123456").unwrap().unwrap();
    assert_eq!(stored.name, "Alice");
}

#[test]
fn test_duplicate_after_normalization() {
    let orch = orchestrator();
    orch.create_record("a123", "Alice", None).unwrap();
    assert!(matches!(
        orch.create_record("  A123 ", "Alice again", None),
        Err(VerifyError::DuplicateRecord)
    ));
}

#[test]
fn test_miss_is_not_an_error() {
    let orch = orchestrator();
    assert!(orch.find_by_identifier("999999").unwrap().is_none());
}

#[test]
fn test_end_to_end_create_then_find() {
    let orch = orchestrator();
    let id = orch.create_record("A123", "Alice", Some(json!({"note": "x"}))).unwrap();

    let found = orch.find_by_identifier("A123").unwrap().unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.identifier, "A123");
    assert_eq!(found.name, "Alice");
    assert_eq!(found.extra, Some(json!({"note": "x"})));
}

#[test]
fn test_list_all_decrypts_every_row_in_order() {
    let orch = orchestrator();
    orch.create_record("1", "One", None).unwrap();
    orch.create_record("2", "Two", Some(json!({"k": true}))).unwrap();
    orch.create_record("3", "Three", None).unwrap();

    let names: Vec<String> = orch.list_all().unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, ["One", "Two", "Three"]);
}

#[test]
fn test_concurrent_duplicate_creates_race_safely() {
    // Exactly one of N racing creates for the same identifier wins.
    let orch = Arc::new(orchestrator());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|n| {
            let orch = Arc::clone(&orch);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                orch.create_record("RACE-1", &format!("Racer {n}"), None)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(VerifyError::DuplicateRecord)))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(orch.store().scan_all().unwrap().len(), 1);
}

#[test]
fn test_ingest_stores_record() {
    let service = support::memory_service();
    let sealer = EnvelopeSealer::from_public_key_pem(service.public_key_pem()).unwrap();

    let envelope = sealer
        .seal(&json!({"identifier": "A123", "name": "Alice", "extra": {"note": "x"}}))
        .unwrap();
    let receipt = service.ingest(&envelope).unwrap();
    assert!(receipt.success);

    let search = service.search("a123").unwrap();
    assert!(search.found);
    assert_eq!(search.name.as_deref(), Some("Alice"));
    assert_eq!(search.extra, Some(json!({"note": "x"})));

    let listing = service.records().unwrap();
    assert_eq!(listing.count, 1);
    assert_eq!(Some(listing.records[0].id.clone()), receipt.record_id);
}

#[test]
fn test_ingest_accepts_original_field_names() {
    let service = support::memory_service();
    let sealer = EnvelopeSealer::from_public_key_pem(service.public_key_pem()).unwrap();

    let envelope = sealer
        .seal(&json!({"national_id": "555", "name": "Carol", "additional_data": null}))
        .unwrap();
    service.ingest(&envelope).unwrap();
    assert!(service.search("555").unwrap().found);
}

#[test]
fn test_ingest_missing_fields_changes_nothing() {
    let service = support::memory_service();
    let sealer = EnvelopeSealer::from_public_key_pem(service.public_key_pem()).unwrap();

    let envelope = sealer.seal(&json!({"identifier": "A123"})).unwrap();
    assert!(matches!(service.ingest(&envelope), Err(VerifyError::MalformedPayload)));
    assert!(service.store().is_empty());
}

#[test]
fn test_ingest_duplicate_is_conflict() {
    let service = support::memory_service();
    let sealer = EnvelopeSealer::from_public_key_pem(service.public_key_pem()).unwrap();

    let first = sealer.seal(&json!({"identifier": "123456", "name": "Alice"})).unwrap();
    let second = sealer.seal(&json!({"identifier": "123456", "name": "Bob"})).unwrap();
    service.ingest(&first).unwrap();
    assert!(matches!(service.ingest(&second), Err(VerifyError::DuplicateRecord)));
    assert_eq!(service.list_all().unwrap().len(), 1);
}

#[test]
fn test_public_key_response_shape() {
    let service = support::memory_service();
    let response = service.public_key_response();
    assert_eq!(response.format, "PEM");
    assert!(response.public_key.starts_with("-----BEGIN PUBLIC KEY-----"));
    assert_eq!(response.public_key, service.public_key_pem());
}
