//! Ledger performance benchmarks
//!
//! Appends, full-chain verification, and Merkle root construction are all
//! on or near the beat loop's critical path; these benches track them
//! across chain lengths.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use systole_common::Pulse;
use systole_ledger::{ImmutableLedger, LedgerPayload};

fn pulse_payload(sequence: u64) -> LedgerPayload {
    LedgerPayload::Pulse {
        pulse: Pulse {
            k: 4,
            p: 5,
            t1: 0.001,
            sequence,
            value: 0.004211,
            stable: true,
        },
    }
}

fn chain_of(length: u64) -> ImmutableLedger {
    let ledger = ImmutableLedger::new();
    for sequence in 0..length {
        ledger
            .append(&pulse_payload(sequence))
            .expect("append in bench setup");
    }
    ledger
}

fn bench_append(c: &mut Criterion) {
    c.bench_function("append", |b| {
        let ledger = ImmutableLedger::new();
        let mut sequence = 0u64;
        b.iter(|| {
            sequence += 1;
            ledger
                .append(black_box(&pulse_payload(sequence)))
                .expect("append")
        });
    });
}

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify");
    for length in [64u64, 256, 1024] {
        let ledger = chain_of(length);
        group.bench_with_input(BenchmarkId::from_parameter(length), &ledger, |b, ledger| {
            b.iter(|| black_box(ledger.verify()));
        });
    }
    group.finish();
}

fn bench_merkle_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("merkle_root");
    for length in [64u64, 256, 1024] {
        let ledger = chain_of(length);
        group.bench_with_input(BenchmarkId::from_parameter(length), &ledger, |b, ledger| {
            b.iter(|| black_box(ledger.merkle_root()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_append, bench_verify, bench_merkle_root);
criterion_main!(benches);
