//! Negacyclic number-theoretic transform over a single NTT-friendly prime.
//!
//! The forward transform evaluates `a(X) mod (X^N + 1)` at the odd powers
//! `psi^(2k+1)` of a primitive `2N`-th root of unity: coefficients are
//! twisted by `psi^i` and then pushed through an iterative radix-2
//! Cooley-Tukey transform over `omega = psi^2`. The inverse runs the same
//! butterfly network with `omega^-1` and folds `N^-1 * psi^-i` into a single
//! untwist pass.

use crate::math::{add_mod, inv_mod, mul_mod, pow_mod, sub_mod};

use super::errors::{RingError, RingResult};

/// Precomputed twiddles for one tower.
#[derive(Debug, Clone)]
pub struct NttTable {
    pub modulus: u64,
    pub degree: usize,
    /// `psi^i` for `i < N`.
    psi_powers: Vec<u64>,
    /// `N^-1 * psi^-i` for `i < N`.
    psi_inv_powers_scaled: Vec<u64>,
    /// `omega^j` for `j < N/2`, natural order.
    omega_powers: Vec<u64>,
    /// `omega^-j` for `j < N/2`, natural order.
    omega_inv_powers: Vec<u64>,
}

impl NttTable {
    pub fn new(modulus: u64, degree: usize) -> RingResult<Self> {
        if degree < 2 || !degree.is_power_of_two() {
            return Err(RingError::InvalidDegree { degree });
        }
        if modulus >= 1u64 << 62
            || !crate::math::is_ntt_friendly_prime(modulus, degree as u64)
        {
            return Err(RingError::NonNttFriendlyModulus { modulus, degree });
        }

        let psi = find_primitive_2n_root(modulus, degree);
        let psi_inv = inv_mod(psi, modulus);
        let omega = mul_mod(psi, psi, modulus);
        let omega_inv = mul_mod(psi_inv, psi_inv, modulus);
        let n_inv = inv_mod(degree as u64, modulus);

        Ok(Self {
            modulus,
            degree,
            psi_powers: powers(psi, 1, degree, modulus),
            psi_inv_powers_scaled: powers(psi_inv, n_inv, degree, modulus),
            omega_powers: powers(omega, 1, degree / 2, modulus),
            omega_inv_powers: powers(omega_inv, 1, degree / 2, modulus),
        })
    }

    /// The primitive `2N`-th root of unity this table is built on.
    pub fn psi(&self) -> u64 {
        self.psi_powers[1]
    }

    /// Coefficient form to evaluation form, in place.
    pub fn forward(&self, values: &mut [u64]) {
        debug_assert_eq!(values.len(), self.degree);
        let q = self.modulus;
        for (v, &twist) in values.iter_mut().zip(&self.psi_powers) {
            *v = mul_mod(*v, twist, q);
        }
        cyclic_transform(values, &self.omega_powers, q);
    }

    /// Evaluation form to coefficient form, in place.
    pub fn inverse(&self, values: &mut [u64]) {
        debug_assert_eq!(values.len(), self.degree);
        let q = self.modulus;
        cyclic_transform(values, &self.omega_inv_powers, q);
        for (v, &untwist) in values.iter_mut().zip(&self.psi_inv_powers_scaled) {
            *v = mul_mod(*v, untwist, q);
        }
    }
}

/// `[start * base^0, start * base^1, ..]`, `len` entries.
fn powers(base: u64, start: u64, len: usize, q: u64) -> Vec<u64> {
    let mut out = Vec::with_capacity(len);
    let mut acc = start % q;
    for _ in 0..len {
        out.push(acc);
        acc = mul_mod(acc, base, q);
    }
    out
}

/// Smallest-candidate primitive `2N`-th root of unity modulo `q`.
///
/// With `q = 1 (mod 2N)` and `2N` a power of two, `g^((q-1)/2N)` is
/// primitive exactly when its `N`-th power is `-1`.
fn find_primitive_2n_root(q: u64, degree: usize) -> u64 {
    let order = 2 * degree as u64;
    let exponent = (q - 1) / order;
    (2..q)
        .map(|g| pow_mod(g, exponent, q))
        .find(|&root| pow_mod(root, degree as u64, q) == q - 1)
        .unwrap_or_else(|| {
            panic!("find_primitive_2n_root: no root of order {order} modulo {q}")
        })
}

fn cyclic_transform(values: &mut [u64], twiddles: &[u64], q: u64) {
    let n = values.len();
    bit_reverse_permute(values);

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let step = n / len;
        for start in (0..n).step_by(len) {
            for k in 0..half {
                let left = start + k;
                let right = left + half;
                let t = mul_mod(values[right], twiddles[k * step], q);
                let u = values[left];
                values[left] = add_mod(u, t, q);
                values[right] = sub_mod(u, t, q);
            }
        }
        len *= 2;
    }
}

fn bit_reverse_permute(values: &mut [u64]) {
    let bits = values.len().trailing_zeros();
    if bits == 0 {
        return;
    }
    for i in 0..values.len() {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if i < j {
            values.swap(i, j);
        }
    }
}
