// Ledger benchmarks for the star registry.
//
// Covers block digest computation, append (which revalidates the whole
// chain under the write lock), full-chain validation at several lengths,
// and challenge signature verification.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use star_registry::crypto::{sign_message, verify_message, StarKeypair};
use star_registry::registry::format_challenge;
use star_registry::storage::{compute_block_hash, BlockDraft, ChainStore};

fn filled_chain(len: u64) -> ChainStore {
    let chain = ChainStore::in_memory().unwrap();
    for i in 1..len {
        chain
            .append(BlockDraft::new(hex::encode(format!("star {i}"))))
            .unwrap();
    }
    chain
}

fn bench_block_hash(c: &mut Criterion) {
    let prev = "ab".repeat(32);
    let body = hex::encode(r#"{"address":"x","message":"x:1:starRegistry","star":{}}"#);

    c.bench_function("ledger/block_hash", |b| {
        b.iter(|| compute_block_hash(42, 1_700_000_000, Some(&prev), &body));
    });
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/append");

    for len in [10u64, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &n| {
            b.iter_with_setup(
                || filled_chain(n),
                |chain| {
                    chain.append(BlockDraft::new("00")).unwrap();
                },
            );
        });
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/validate");

    for len in [10u64, 100, 1_000] {
        let chain = filled_chain(len);
        group.throughput(Throughput::Elements(len));
        group.bench_with_input(BenchmarkId::from_parameter(len), &chain, |b, chain| {
            b.iter(|| chain.validate());
        });
    }

    group.finish();
}

fn bench_verify_challenge(c: &mut Criterion) {
    let keypair = StarKeypair::generate();
    let address = keypair.address();
    let message = format_challenge(&address, 1_700_000_000);
    let signature = sign_message(&keypair, &message);

    c.bench_function("ownership/verify_challenge", |b| {
        b.iter(|| verify_message(&message, &address, &signature).unwrap());
    });
}

criterion_group!(
    benches,
    bench_block_hash,
    bench_append,
    bench_validate,
    bench_verify_challenge,
);
criterion_main!(benches);
