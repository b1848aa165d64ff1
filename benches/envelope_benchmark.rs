//! Ingress cost: opening an envelope versus the full ingest path.
//!
//! The RSA private-key operation dominates `open`; the AES-GCM payload
//! decrypt and JSON parse are noise next to it. `ingest` adds three storage
//! encryptions, one HMAC and an in-memory insert.
//!
//! Run with: `cargo bench --bench envelope_benchmark`

use blindvault::{EnvelopeSealer, KeyManager, MemoryStore, Secrets, VerificationService};
use criterion::{black_box, criterion_group, criterion_main, Criterion, SamplingMode};
use serde_json::json;

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(30);

    let keys = KeyManager::generate(2048).unwrap();
    let secrets = Secrets::generate().unwrap();
    let service = VerificationService::new(keys, &secrets, MemoryStore::new());
    let sealer = EnvelopeSealer::from_public_key_pem(service.public_key_pem()).unwrap();

    let envelope = sealer
        .seal(&json!({"identifier": "A123", "name": "Alice", "extra": {"note": "x"}}))
        .unwrap();

    group.bench_function("open_rsa2048", |b| {
        b.iter(|| service.open(black_box(&envelope)).unwrap());
    });

    group.bench_function("seal_rsa2048", |b| {
        b.iter(|| sealer.seal(black_box(&json!({"identifier": "A123", "name": "Alice"}))).unwrap());
    });

    let mut n = 0u64;
    group.bench_function("ingest_rsa2048", |b| {
        b.iter_batched(
            || {
                n += 1;
                sealer
                    .seal(&json!({"identifier": format!("ID{n}"), "name": "Alice"}))
                    .unwrap()
            },
            |envelope| service.ingest(black_box(&envelope)).unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_envelope);
criterion_main!(benches);
