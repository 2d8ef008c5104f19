//! Word-sized modular arithmetic shared by the prime search, the RNS basis
//! and the NTT kernels.
//!
//! All helpers assume operands are already reduced modulo `q` and that
//! `q < 2^63`, so `a + b` never overflows a `u64`.

#[inline]
pub fn add_mod(a: u64, b: u64, q: u64) -> u64 {
    let s = a + b;
    if s >= q { s - q } else { s }
}

#[inline]
pub fn sub_mod(a: u64, b: u64, q: u64) -> u64 {
    if a >= b { a - b } else { a + q - b }
}

#[inline]
pub fn neg_mod(a: u64, q: u64) -> u64 {
    if a == 0 { 0 } else { q - a }
}

#[inline]
pub fn mul_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

/// Computes `base^exponent mod q` by square-and-multiply.
pub fn pow_mod(mut base: u64, mut exponent: u64, q: u64) -> u64 {
    assert!(q > 0, "pow_mod: modulus must be positive");
    if q == 1 {
        return 0;
    }
    let mut acc = 1u64;
    base %= q;
    while exponent > 0 {
        if exponent & 1 == 1 {
            acc = mul_mod(acc, base, q);
        }
        base = mul_mod(base, base, q);
        exponent >>= 1;
    }
    acc
}

/// Modular inverse via the extended Euclidean algorithm.
///
/// # Panics
///
/// Panics if `value` and `q` are not coprime.
pub fn inv_mod(value: u64, q: u64) -> u64 {
    fn extended_gcd(a: i128, b: i128) -> (i128, i128, i128) {
        if a == 0 {
            (b, 0, 1)
        } else {
            let (gcd, x1, y1) = extended_gcd(b % a, a);
            (gcd, y1 - (b / a) * x1, x1)
        }
    }
    let (gcd, x, _) = extended_gcd((value % q) as i128, q as i128);
    assert_eq!(gcd, 1, "inv_mod: values must be coprime");
    x.rem_euclid(q as i128) as u64
}

/// Maps a signed integer into `[0, q)`.
#[inline]
pub fn reduce_signed(value: i128, q: u64) -> u64 {
    value.rem_euclid(q as i128) as u64
}
