use std::collections::BTreeSet;

use crate::math::{inv_mod, mul_mod};

use super::{
    errors::{RingError, RingResult},
    ntt::NttTable,
};

/// RNS basis: ring degree `N` plus a set of NTT-friendly prime moduli with
/// precomputed NTT tables and CRT constants.
///
/// Invariants:
/// - `moduli.len() == ntt_tables.len() == crt.q_hat_inv.len()`
/// - `ntt_tables[i].modulus == moduli[i]`
/// - the product `Q` of all moduli is below `2^127`
#[derive(Debug, Clone)]
pub struct RnsBasis {
    degree: usize,
    moduli: Vec<u64>,
    ntt_tables: Vec<NttTable>,
    crt: CrtConstants,
}

#[derive(Debug, Clone)]
struct CrtConstants {
    /// `Q = q_0 * .. * q_{T-1}`.
    q: u128,
    /// `Q / q_i`.
    q_hat: Vec<u128>,
    /// `(Q / q_i)^-1 mod q_i`.
    q_hat_inv: Vec<u64>,
}

impl RnsBasis {
    pub fn new(degree: usize, moduli: Vec<u64>) -> RingResult<Self> {
        if degree < 2 || !degree.is_power_of_two() {
            return Err(RingError::InvalidDegree { degree });
        }
        if moduli.is_empty() {
            return Err(RingError::EmptyBasis);
        }
        let mut seen = BTreeSet::new();
        for &modulus in &moduli {
            if !seen.insert(modulus) {
                return Err(RingError::DuplicateModulus { modulus });
            }
        }

        let ntt_tables = moduli
            .iter()
            .map(|&modulus| NttTable::new(modulus, degree))
            .collect::<RingResult<Vec<_>>>()?;
        let crt = CrtConstants::new(&moduli)?;

        Ok(Self {
            degree,
            moduli,
            ntt_tables,
            crt,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn tower_count(&self) -> usize {
        self.moduli.len()
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    pub fn ntt_table(&self, tower: usize) -> &NttTable {
        &self.ntt_tables[tower]
    }

    /// The full modulus `Q`.
    pub fn modulus_product(&self) -> u128 {
        self.crt.q
    }

    /// Total bit size of `Q`.
    pub fn modulus_bits(&self) -> u32 {
        u128::BITS - self.crt.q.leading_zeros()
    }

    /// CRT-reconstructs a single coefficient and centers it in `(-Q/2, Q/2]`.
    ///
    /// Each term is computed as `((r_i * q_hat_inv_i) mod q_i) * q_hat_i`,
    /// which stays below `Q`, so the running sum never exceeds `2Q < 2^128`.
    pub fn reconstruct_centered(&self, residues: &[u64]) -> i128 {
        debug_assert_eq!(residues.len(), self.moduli.len());
        let q = self.crt.q;
        let mut acc = 0u128;
        for (i, (&r, &m)) in residues.iter().zip(&self.moduli).enumerate() {
            let t = mul_mod(r, self.crt.q_hat_inv[i], m);
            acc += t as u128 * self.crt.q_hat[i];
            if acc >= q {
                acc -= q;
            }
        }

        if acc > q / 2 {
            acc as i128 - q as i128
        } else {
            acc as i128
        }
    }
}

impl PartialEq for RnsBasis {
    fn eq(&self, other: &Self) -> bool {
        self.degree == other.degree && self.moduli == other.moduli
    }
}

impl Eq for RnsBasis {}

impl CrtConstants {
    fn new(moduli: &[u64]) -> RingResult<Self> {
        let q = moduli
            .iter()
            .try_fold(1u128, |acc, &m| acc.checked_mul(m as u128))
            .filter(|&q| q < 1u128 << 127)
            .ok_or(RingError::ModulusProductTooLarge)?;

        let q_hat: Vec<u128> = moduli.iter().map(|&m| q / m as u128).collect();
        let q_hat_inv = moduli
            .iter()
            .zip(&q_hat)
            .map(|(&m, &hat)| inv_mod((hat % m as u128) as u64, m))
            .collect();

        Ok(Self { q, q_hat, q_hat_inv })
    }
}
