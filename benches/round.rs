use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use mk_ckks_secagg::{
    CryptoContext, EcdhKeyPair, PublicKeyDirectory, RnsPoly, generate_mask,
    masking::expand_to_ring_element,
    protocol::{RoundConfig, generate_data, run_round},
};

fn bench_ring(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring");
    let ctx = CryptoContext::builder().data_length(8192).build().unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(1);
    let a = RnsPoly::sample_uniform(ctx.basis().clone(), &mut rng);
    let b = RnsPoly::sample_uniform(ctx.basis().clone(), &mut rng);

    group.bench_function("ntt_round_trip_16384", |bench| {
        bench.iter(|| {
            let mut p = a.clone();
            p.to_coefficient();
            p.to_evaluation();
            black_box(p)
        })
    });
    group.bench_function("pointwise_mul_16384", |bench| {
        bench.iter(|| black_box(&a * &b))
    });
    group.bench_function("prg_expand_16384", |bench| {
        bench.iter(|| expand_to_ring_element(black_box(&[7u8; 48]), ctx.basis().clone()).unwrap())
    });
    group.finish();
}

fn bench_client(c: &mut Criterion) {
    let mut group = c.benchmark_group("client");
    let ctx = CryptoContext::builder().data_length(8192).build().unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(2);
    let crs = ctx.generate_crs(&mut rng);
    let keys = ctx.keygen(&crs, &mut rng).unwrap();
    let values = generate_data(8192, -999.0, 999.0, &mut rng);

    group.bench_function("encrypt_with_partial_decryption_8192", |bench| {
        bench.iter(|| {
            let pt = ctx.encode(black_box(&values)).unwrap();
            black_box(ctx.encrypt_with_partial_decryption(&keys, &pt, &mut rng).unwrap())
        })
    });

    for peers in [10usize, 50] {
        let pairs: Vec<EcdhKeyPair> = (0..peers)
            .map(|_| EcdhKeyPair::generate(&mut rng).unwrap())
            .collect();
        let mut directory = PublicKeyDirectory::new();
        for (id, pair) in pairs.iter().enumerate() {
            directory
                .insert(id as u64, pair.public_key_der().to_vec())
                .unwrap();
        }
        group.bench_function(format!("mask_gen_{peers}_clients"), |bench| {
            bench.iter(|| {
                generate_mask(0, &pairs[0], black_box(&directory), ctx.basis().clone()).unwrap()
            })
        });
    }
    group.finish();
}

fn bench_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("round");
    group.sample_size(10);
    for clients in [4usize, 16] {
        let config = RoundConfig::new(clients, 1024).with_seed(3);
        group.bench_function(format!("full_round_{clients}_clients_1024_values"), |bench| {
            bench.iter(|| black_box(run_round(&config).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ring, bench_client, bench_round);
criterion_main!(benches);
