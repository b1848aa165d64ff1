mod support;

use std::sync::{Arc, Barrier};
use std::thread;

use blindvault::{RecordOrchestrator, RecordStore, SqliteStore, VerifyError};
use serde_json::json;

#[test]
fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("records.db");

    {
        let orch = RecordOrchestrator::new(&support::secrets(), SqliteStore::open(&path).unwrap());
        orch.create_record("A123", "Alice", Some(json!({"note": "x"}))).unwrap();
    }

    let orch = RecordOrchestrator::new(&support::secrets(), SqliteStore::open(&path).unwrap());
    let found = orch.find_by_identifier("A123").unwrap().unwrap();
    assert_eq!(found.name, "Alice");
    assert_eq!(found.extra, Some(json!({"note": "x"})));
    assert!(matches!(
        orch.create_record("A123", "Bob", None),
        Err(VerifyError::DuplicateRecord)
    ));
}

#[test]
fn test_separate_connections_race_to_one_winner() {
    // Each contender has its own connection to the same file: the UNIQUE
    // constraint, not an in-process lock, decides the winner.
    const CONTENDERS: usize = 4;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");

    let orchestrators: Vec<_> = (0..CONTENDERS)
        .map(|_| {
            let store = SqliteStore::open(&path).unwrap();
            Arc::new(RecordOrchestrator::new(&support::secrets(), store))
        })
        .collect();
    let barrier = Arc::new(Barrier::new(CONTENDERS));

    let handles: Vec<_> = orchestrators
        .iter()
        .enumerate()
        .map(|(i, orch)| {
            let orch = Arc::clone(orch);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                orch.create_record("123456", &format!("Contender {i}"), None)
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(VerifyError::DuplicateRecord)))
        .count();
    assert_eq!(winners, 1, "{results:?}");
    assert_eq!(duplicates, CONTENDERS - 1, "{results:?}");
    assert_eq!(orchestrators[0].store().scan_all().unwrap().len(), 1);
}

#[test]
fn test_rows_under_other_storage_key_fail_closed() {
    let store = SqliteStore::open_in_memory().unwrap();
    let orch = RecordOrchestrator::new(&support::secrets(), store);
    orch.create_record("A123", "Alice", None).unwrap();

    // A store opened with a different storage secret sees only ciphertext it cannot open.
    let rows = orch.store().scan_all().unwrap();
    let other_secrets = blindvault::Secrets::new(
        blindvault::SymmetricSecret::from_bytes([0x11; 32]),
        blindvault::SymmetricSecret::from_bytes([0x44; 32]),
    )
    .unwrap();
    let other = RecordOrchestrator::new(&other_secrets, blindvault::MemoryStore::new());
    for row in &rows {
        other.store().insert(row).unwrap();
    }
    assert!(matches!(other.find_by_identifier("A123"), Err(VerifyError::StorageDecrypt)));
    assert!(matches!(other.list_all(), Err(VerifyError::StorageDecrypt)));
}
