//! NTT-friendly prime search for the RNS towers.
//!
//! Primality is decided with Miller-Rabin over a fixed base set that is
//! deterministic for every `u64`. Candidates are only visited on the
//! progression `p = 1 (mod 2n)`, which guarantees `Z_p` has the primitive
//! `2n`-th root of unity the negacyclic NTT needs.

use super::modular::{mul_mod, pow_mod};

// Deterministic for all n < 3.3 * 10^24, which covers u64.
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Returns `(odd_part, power_of_two)` with `n = odd_part * 2^power_of_two`.
fn decompose(n: u64) -> (u64, u32) {
    let shift = n.trailing_zeros();
    (n >> shift, shift)
}

pub fn is_prime(n: u64) -> bool {
    match n {
        0 | 1 => return false,
        2 | 3 => return true,
        _ if n & 1 == 0 => return false,
        _ => {}
    }

    let (d, r) = decompose(n - 1);
    'bases: for &a in MILLER_RABIN_BASES.iter() {
        if a >= n {
            continue;
        }
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// `p` is prime and `p = 1 (mod 2n)`.
#[inline]
pub fn is_ntt_friendly_prime(p: u64, n: u64) -> bool {
    assert!(n > 0, "is_ntt_friendly_prime: n must be positive");
    let step = n
        .checked_mul(2)
        .expect("is_ntt_friendly_prime: 2 * n must fit in u64");
    is_prime(p) && p % step == 1
}

/// Returns the largest NTT-friendly prime `p < bound`, if any.
///
/// # Panics
///
/// Panics if `n == 0` or `2 * n` overflows `u64`.
pub fn get_first_prime_down(bound: u64, n: u64) -> Option<u64> {
    assert!(n > 0, "get_first_prime_down: n must be positive");
    let step = n
        .checked_mul(2)
        .expect("get_first_prime_down: 2 * n must fit in u64");
    if bound <= step {
        return None;
    }

    // Largest value below `bound` on the progression 1 (mod step).
    let top = bound - 1;
    let mut candidate = top - (top + step - 1) % step;

    while candidate > step {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate -= step;
    }
    None
}

/// Collects `count` distinct NTT-friendly primes strictly below `2^bits`,
/// largest first. Returns `None` when the progression runs out before
/// reaching `2^(bits - 1)`.
pub fn generate_ntt_primes(bits: u32, count: usize, n: u64) -> Option<Vec<u64>> {
    assert!(
        (2..=62).contains(&bits),
        "generate_ntt_primes: bits must be in 2..=62"
    );
    let lower = 1u64 << (bits - 1);
    let mut primes = Vec::with_capacity(count);
    let mut bound = 1u64 << bits;
    while primes.len() < count {
        let prime = get_first_prime_down(bound, n).filter(|&p| p >= lower)?;
        primes.push(prime);
        bound = prime;
    }
    Some(primes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_primes_and_composites() {
        for p in [2u64, 3, 5, 7, 11, 13, 17, 19, 97, 65537] {
            assert!(is_prime(p), "{p} should be prime");
        }
        for c in [0u64, 1, 4, 9, 15, 65536, 561, 1_105, 3_215_031_751] {
            assert!(!is_prime(c), "{c} should be composite");
        }
    }

    #[test]
    fn primes_near_u64_limit() {
        assert!(!is_prime(u64::MAX));
        assert!(is_prime(18_446_744_073_709_551_557));
    }

    #[test]
    fn ntt_friendly_condition() {
        assert!(is_ntt_friendly_prime(12289, 1024));
        assert!(!is_ntt_friendly_prime(2049, 1024));
        assert!(!is_ntt_friendly_prime(97, 1024));
    }

    #[test]
    fn first_prime_down_is_ntt_friendly_and_below_bound() {
        let n = 16384u64;
        let p = get_first_prime_down(1u64 << 50, n).unwrap();
        assert!(p < 1u64 << 50);
        assert!(is_ntt_friendly_prime(p, n));
    }

    #[test]
    fn first_prime_down_gives_up_on_tiny_bounds() {
        assert_eq!(get_first_prime_down(2, 1024), None);
        assert_eq!(get_first_prime_down(2048, 1024), None);
    }

    #[test]
    fn generated_primes_are_distinct_and_sized() {
        let n = 4096u64;
        let primes = generate_ntt_primes(40, 3, n).unwrap();
        assert_eq!(primes.len(), 3);
        for window in primes.windows(2) {
            assert!(window[0] > window[1]);
        }
        for &p in &primes {
            assert!(p >= 1u64 << 39 && p < 1u64 << 40);
            assert!(is_ntt_friendly_prime(p, n));
        }
    }

    #[test]
    fn generation_fails_when_range_is_exhausted() {
        assert_eq!(generate_ntt_primes(4, 10, 2), None);
    }
}
