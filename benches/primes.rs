use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use mk_ckks_secagg::math::{generate_ntt_primes, get_first_prime_down, is_prime};

fn bench_prime_checks(c: &mut Criterion) {
    let inputs = [2_147_483_647u64, 9_223_372_036_854_775_783u64];
    let mut group = c.benchmark_group("is_prime");

    for &n in &inputs {
        group.bench_with_input(BenchmarkId::new("miller_rabin", n), &n, |b, &n| {
            b.iter(|| black_box(is_prime(black_box(n))));
        });
    }

    group.finish();
}

fn bench_tower_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_ntt_primes");
    // The context picks one 60-bit and one 50-bit tower per ring dimension.
    let configs = [(60u32, 16384u64), (50, 16384), (60, 131072), (50, 131072)];

    for &(bits, degree) in &configs {
        let label = format!("{bits}b_deg{degree}");
        group.bench_with_input(
            BenchmarkId::from_parameter(label),
            &(bits, degree),
            |b, &(bits, degree)| {
                b.iter(|| black_box(generate_ntt_primes(bits, 1, degree)));
            },
        );
    }
    group.bench_function("first_prime_below_2^62_deg16384", |b| {
        b.iter(|| black_box(get_first_prime_down(black_box(1u64 << 62), 16384)));
    });

    group.finish();
}

criterion_group!(primes, bench_prime_checks, bench_tower_selection);
criterion_main!(primes);
