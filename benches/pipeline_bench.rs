use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use rust_decimal_macros::dec;
use solana_sdk::signature::Keypair;
use spot_trading_engine::mint::MintRegistry;
use spot_trading_engine::swap::{Ed25519Signer, TransactionSigner};

/// Signing (spec §4.3 step 3) is the one swap-pipeline stage that's pure
/// CPU work reachable through the public API without a live RPC/aggregator
/// — everything upstream and downstream of it is network-bound and belongs
/// in an integration test, not a microbenchmark.
fn bench_sign_message(c: &mut Criterion) {
    let keypair = Keypair::new();
    let secret = bs58::encode(keypair.to_bytes()).into_string();
    let signer = Ed25519Signer::from_base58_secret(&secret).unwrap();
    let message = vec![7u8; 200]; // stand-in for a serialized versioned-transaction message

    c.bench_function("ed25519_sign_message", |b| {
        b.iter(|| signer.sign(black_box(&message)))
    });
}

fn bench_ui_raw_round_trip(c: &mut Criterion) {
    let registry = MintRegistry::solana_mainnet();

    c.bench_function("mint_ui_to_raw_round_trip", |b| {
        b.iter(|| {
            let raw = registry.ui_to_raw("So11111111111111111111111111111111111111112", black_box(dec!(1.23456789))).unwrap();
            black_box(registry.raw_to_ui("So11111111111111111111111111111111111111112", raw).unwrap())
        })
    });
}

criterion_group!(benches, bench_sign_message, bench_ui_raw_round_trip);
criterion_main!(benches);
