use super::{
    basis::RnsBasis,
    errors::{RingError, RingResult},
};
use crate::math::{
    add_mod, gaussian_coefficients, mul_mod, neg_mod, reduce_signed, sub_mod,
    uniform_coefficients,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign},
    sync::Arc,
};

/// Which representation the towers of an [`RnsPoly`] currently hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// Plain coefficients of `a(X)`.
    Coefficient,
    /// NTT images; multiplication is pointwise.
    Evaluation,
}

/// A polynomial in `Z_{q_0} x .. x Z_{q_{T-1}}[X] / (X^N + 1)`.
///
/// Stores one `Vec<u64>` of length `N` per RNS tower. The `format` flag
/// tracks whether the towers hold coefficients or NTT evaluations.
///
/// # Invariants
/// - `towers.len() == basis.tower_count()`
/// - every `towers[t].len() == basis.degree()`
/// - every `towers[t][j] < basis.moduli()[t]`
#[derive(Clone, Debug)]
pub struct RnsPoly {
    towers: Vec<Vec<u64>>,
    basis: Arc<RnsBasis>,
    format: Format,
}

/// Serializable form of an [`RnsPoly`], detached from its basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RnsPolyWire {
    pub format: Format,
    pub towers: Vec<Vec<u64>>,
}

// ─── Constructors ─────────────────────────────────────────────────────────────

impl RnsPoly {
    /// Creates the zero polynomial in the requested format.
    pub fn zero(basis: Arc<RnsBasis>, format: Format) -> Self {
        let towers = vec![vec![0u64; basis.degree()]; basis.tower_count()];
        Self {
            towers,
            basis,
            format,
        }
    }

    /// Creates a coefficient-format polynomial from signed coefficients.
    ///
    /// Each coefficient is reduced into `[0, q_t)` per tower. Slices shorter
    /// than `N` are zero-padded.
    pub fn from_signed_coeffs<T: Copy + Into<i128>>(
        coeffs: &[T],
        basis: Arc<RnsBasis>,
    ) -> Self {
        assert!(
            coeffs.len() <= basis.degree(),
            "from_signed_coeffs: at most {} coefficients allowed, got {}",
            basis.degree(),
            coeffs.len()
        );
        let mut towers = vec![vec![0u64; basis.degree()]; basis.tower_count()];
        for (tower, &q) in towers.iter_mut().zip(basis.moduli()) {
            for (slot, &coeff) in tower.iter_mut().zip(coeffs) {
                *slot = reduce_signed(coeff.into(), q);
            }
        }
        Self {
            towers,
            basis,
            format: Format::Coefficient,
        }
    }

    /// Creates a polynomial from pre-built towers.
    ///
    /// Returns an error if the tower count or length doesn't match the basis,
    /// or if any value is not reduced modulo its tower's prime.
    pub fn from_towers(
        towers: Vec<Vec<u64>>,
        basis: Arc<RnsBasis>,
        format: Format,
    ) -> RingResult<Self> {
        let expected = basis.tower_count();
        if towers.len() != expected {
            return Err(RingError::TowerCountMismatch {
                expected,
                actual: towers.len(),
            });
        }
        for (t, (tower, &q)) in towers.iter().zip(basis.moduli()).enumerate() {
            if tower.len() != basis.degree() {
                return Err(RingError::TowerLengthMismatch {
                    tower: t,
                    expected: basis.degree(),
                    actual: tower.len(),
                });
            }
            if let Some(&coefficient) = tower.iter().find(|&&c| c >= q) {
                return Err(RingError::NonReducedCoefficient {
                    coefficient,
                    modulus: q,
                });
            }
        }
        Ok(Self {
            towers,
            basis,
            format,
        })
    }

    /// Rebuilds a polynomial from its wire form, validating it against `basis`.
    pub fn from_wire(wire: RnsPolyWire, basis: Arc<RnsBasis>) -> RingResult<Self> {
        Self::from_towers(wire.towers, basis, wire.format)
    }

    pub fn to_wire(&self) -> RnsPolyWire {
        RnsPolyWire {
            format: self.format,
            towers: self.towers.clone(),
        }
    }

    pub fn into_wire(self) -> RnsPolyWire {
        RnsPolyWire {
            format: self.format,
            towers: self.towers,
        }
    }
}

// ─── Sampling ─────────────────────────────────────────────────────────────────

impl RnsPoly {
    /// Samples a ring element uniformly at random, in evaluation format.
    ///
    /// The NTT is a bijection per tower, so uniform evaluations are uniform
    /// coefficients and no transform is needed.
    pub fn sample_uniform<R: Rng + ?Sized>(basis: Arc<RnsBasis>, rng: &mut R) -> Self {
        let towers = basis
            .moduli()
            .iter()
            .map(|&q| uniform_coefficients(basis.degree(), q, rng))
            .collect();
        Self {
            towers,
            basis,
            format: Format::Evaluation,
        }
    }

    /// Samples rounded `N(0, std_dev^2)` coefficients, returned in evaluation
    /// format. One draw per coefficient is shared by every tower.
    pub fn sample_gaussian<R: Rng + ?Sized>(
        std_dev: f64,
        basis: Arc<RnsBasis>,
        rng: &mut R,
    ) -> Self {
        let noise = gaussian_coefficients(basis.degree(), std_dev, rng);
        let mut poly = Self::from_signed_coeffs(&noise, basis);
        poly.to_evaluation();
        poly
    }
}

// ─── Accessors & format conversion ───────────────────────────────────────────

impl RnsPoly {
    pub fn towers(&self) -> &[Vec<u64>] {
        &self.towers
    }

    pub fn tower(&self, index: usize) -> &[u64] {
        &self.towers[index]
    }

    pub fn basis(&self) -> &Arc<RnsBasis> {
        &self.basis
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn degree(&self) -> usize {
        self.basis.degree()
    }

    pub fn tower_count(&self) -> usize {
        self.towers.len()
    }

    /// Converts to evaluation format in place (no-op if already there).
    pub fn to_evaluation(&mut self) {
        if self.format == Format::Evaluation {
            return;
        }
        for (t, tower) in self.towers.iter_mut().enumerate() {
            self.basis.ntt_table(t).forward(tower);
        }
        self.format = Format::Evaluation;
    }

    /// Converts to coefficient format in place (no-op if already there).
    pub fn to_coefficient(&mut self) {
        if self.format == Format::Coefficient {
            return;
        }
        for (t, tower) in self.towers.iter_mut().enumerate() {
            self.basis.ntt_table(t).inverse(tower);
        }
        self.format = Format::Coefficient;
    }

    /// Toggles between the two formats.
    pub fn switch_format(&mut self) {
        match self.format {
            Format::Coefficient => self.to_evaluation(),
            Format::Evaluation => self.to_coefficient(),
        }
    }

    pub fn into_format(mut self, format: Format) -> Self {
        match format {
            Format::Coefficient => self.to_coefficient(),
            Format::Evaluation => self.to_evaluation(),
        }
        self
    }

    /// CRT-reconstructs every coefficient, centered in `(-Q/2, Q/2]`.
    ///
    /// Evaluation-format polynomials are converted on a temporary copy;
    /// `self` is left untouched.
    pub fn to_centered_coeffs(&self) -> Vec<i128> {
        let tmp;
        let towers: &[Vec<u64>] = if self.format == Format::Evaluation {
            tmp = self.clone().into_format(Format::Coefficient);
            &tmp.towers
        } else {
            &self.towers
        };

        let mut residues = vec![0u64; towers.len()];
        (0..self.degree())
            .map(|i| {
                for (r, tower) in residues.iter_mut().zip(towers) {
                    *r = tower[i];
                }
                self.basis.reconstruct_centered(&residues)
            })
            .collect()
    }

    /// Largest absolute centered coefficient.
    pub fn infinity_norm(&self) -> u128 {
        self.to_centered_coeffs()
            .into_iter()
            .map(i128::unsigned_abs)
            .max()
            .unwrap_or(0)
    }

    /// True when every residue is zero. Format-independent.
    pub fn is_zero(&self) -> bool {
        self.towers.iter().all(|tower| tower.iter().all(|&c| c == 0))
    }

    /// Fallible compatibility check for operands that arrive from outside
    /// the current computation.
    pub fn check_compatible(&self, other: &RnsPoly) -> RingResult<()> {
        if !Arc::ptr_eq(&self.basis, &other.basis) && *self.basis != *other.basis {
            return Err(RingError::ParameterMismatch);
        }
        if self.format != other.format {
            return Err(RingError::FormatMismatch {
                expected: self.format,
                actual: other.format,
            });
        }
        Ok(())
    }

    fn assert_compatible(&self, other: &RnsPoly, op: &str) {
        if let Err(err) = self.check_compatible(other) {
            panic!("{op}: {err}");
        }
    }

    fn zip_towers_mut(&mut self, rhs: &RnsPoly, f: impl Fn(u64, u64, u64) -> u64) {
        for ((tower, rhs_tower), &q) in self
            .towers
            .iter_mut()
            .zip(&rhs.towers)
            .zip(self.basis.moduli())
        {
            for (a, &b) in tower.iter_mut().zip(rhs_tower) {
                *a = f(*a, b, q);
            }
        }
    }
}

impl PartialEq for RnsPoly {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format
            && self.towers == other.towers
            && (Arc::ptr_eq(&self.basis, &other.basis) || *self.basis == *other.basis)
    }
}

impl Eq for RnsPoly {}

// ─── Arithmetic ───────────────────────────────────────────────────────────────

impl AddAssign<&RnsPoly> for RnsPoly {
    /// Tower-wise addition. Works in both formats; operands must agree.
    fn add_assign(&mut self, rhs: &RnsPoly) {
        self.assert_compatible(rhs, "add_assign");
        self.zip_towers_mut(rhs, add_mod);
    }
}

impl SubAssign<&RnsPoly> for RnsPoly {
    fn sub_assign(&mut self, rhs: &RnsPoly) {
        self.assert_compatible(rhs, "sub_assign");
        self.zip_towers_mut(rhs, sub_mod);
    }
}

impl MulAssign<&RnsPoly> for RnsPoly {
    /// Pointwise product. Both operands must be in evaluation format.
    fn mul_assign(&mut self, rhs: &RnsPoly) {
        self.assert_compatible(rhs, "mul_assign");
        assert_eq!(
            self.format,
            Format::Evaluation,
            "mul_assign: requires evaluation format; call to_evaluation first"
        );
        self.zip_towers_mut(rhs, mul_mod);
    }
}

impl Add<&RnsPoly> for RnsPoly {
    type Output = RnsPoly;

    fn add(mut self, rhs: &RnsPoly) -> RnsPoly {
        self += rhs;
        self
    }
}

impl Sub<&RnsPoly> for RnsPoly {
    type Output = RnsPoly;

    fn sub(mut self, rhs: &RnsPoly) -> RnsPoly {
        self -= rhs;
        self
    }
}

impl Mul<&RnsPoly> for RnsPoly {
    type Output = RnsPoly;

    fn mul(mut self, rhs: &RnsPoly) -> RnsPoly {
        self *= rhs;
        self
    }
}

impl Mul<&RnsPoly> for &RnsPoly {
    type Output = RnsPoly;

    fn mul(self, rhs: &RnsPoly) -> RnsPoly {
        self.clone() * rhs
    }
}

impl Neg for RnsPoly {
    type Output = Self;

    /// Tower-wise negation. Works in both formats.
    fn neg(mut self) -> Self {
        for (tower, &q) in self.towers.iter_mut().zip(self.basis.moduli()) {
            for c in tower.iter_mut() {
                *c = neg_mod(*c, q);
            }
        }
        self
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn basis_17_97() -> Arc<RnsBasis> {
        Arc::new(RnsBasis::new(8, vec![17, 97]).unwrap())
    }

    // ── Construction ──────────────────────────────────────────────────────────

    #[test]
    fn zero_poly_is_all_zeros() {
        let poly = RnsPoly::zero(basis_17_97(), Format::Evaluation);
        assert!(poly.is_zero());
        assert_eq!(poly.format(), Format::Evaluation);
        assert_eq!(poly.infinity_norm(), 0);
    }

    #[test]
    fn from_signed_coeffs_reduces_and_pads() {
        let poly = RnsPoly::from_signed_coeffs(&[-1, 2, -3], basis_17_97());
        assert_eq!(poly.tower(0), &[16, 2, 14, 0, 0, 0, 0, 0]);
        assert_eq!(poly.tower(1)[0], 96);
        assert_eq!(poly.format(), Format::Coefficient);
    }

    #[test]
    #[should_panic(expected = "from_signed_coeffs: at most 8 coefficients allowed, got 9")]
    fn from_signed_coeffs_rejects_overlong_input() {
        let _ = RnsPoly::from_signed_coeffs(&[0; 9], basis_17_97());
    }

    #[test]
    fn from_towers_rejects_unreduced_coefficient() {
        let bad = vec![vec![17u64; 8], vec![0u64; 8]];
        assert!(matches!(
            RnsPoly::from_towers(bad, basis_17_97(), Format::Coefficient),
            Err(RingError::NonReducedCoefficient {
                coefficient: 17,
                modulus: 17
            })
        ));
    }

    #[test]
    fn from_towers_rejects_wrong_shape() {
        assert!(matches!(
            RnsPoly::from_towers(vec![vec![0u64; 8]], basis_17_97(), Format::Coefficient),
            Err(RingError::TowerCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            RnsPoly::from_towers(
                vec![vec![0u64; 8], vec![0u64; 4]],
                basis_17_97(),
                Format::Coefficient
            ),
            Err(RingError::TowerLengthMismatch { tower: 1, .. })
        ));
    }

    #[test]
    fn wire_form_rehydrates_against_equal_basis() {
        let poly = RnsPoly::from_signed_coeffs(&[1, -2, 3, -4], basis_17_97());
        let restored = RnsPoly::from_wire(poly.to_wire(), basis_17_97()).unwrap();
        assert_eq!(restored, poly);
    }

    // ── Format conversion ─────────────────────────────────────────────────────

    #[test]
    fn format_roundtrip_preserves_coefficients() {
        let mut poly =
            RnsPoly::from_signed_coeffs(&[1, -2, 3, 4, -5, 6, 7, -8], basis_17_97());
        let original = poly.towers().to_vec();

        poly.switch_format();
        assert_eq!(poly.format(), Format::Evaluation);
        poly.switch_format();
        assert_eq!(poly.format(), Format::Coefficient);

        assert_eq!(poly.towers(), original.as_slice());
    }

    #[test]
    fn to_evaluation_is_idempotent() {
        let mut poly = RnsPoly::from_signed_coeffs(&[1, 2, 3, 4, 5, 6, 7, 8], basis_17_97());
        poly.to_evaluation();
        let after_first = poly.towers().to_vec();
        poly.to_evaluation();
        assert_eq!(poly.towers(), after_first.as_slice());
    }

    #[test]
    fn centered_coeffs_work_from_evaluation_format() {
        let input = [1i64, -2, 3, -4, 5, -6, 7, -8];
        let poly = RnsPoly::from_signed_coeffs(&input, basis_17_97())
            .into_format(Format::Evaluation);
        let expected: Vec<i128> = input.iter().map(|&c| c as i128).collect();
        assert_eq!(poly.to_centered_coeffs(), expected);
        assert_eq!(poly.format(), Format::Evaluation);
        assert_eq!(poly.infinity_norm(), 8);
    }

    // ── Arithmetic ────────────────────────────────────────────────────────────

    #[test]
    fn add_and_sub_are_inverse() {
        let basis = basis_17_97();
        let a = RnsPoly::from_signed_coeffs(&[1, 2, 3, 4, 5, 6, 7, 8], basis.clone());
        let b = RnsPoly::from_signed_coeffs(&[8, 7, 6, 5, 4, 3, 2, 1], basis);
        let sum = a.clone() + &b;
        assert!(sum.to_centered_coeffs().iter().all(|&c| c == 9));
        assert_eq!(sum - &b, a);
    }

    #[test]
    fn neg_negates_coefficients() {
        let poly = RnsPoly::from_signed_coeffs(&[3], basis_17_97());
        let neg = -poly.clone();
        assert_eq!(neg.tower(0)[0], 14);
        assert_eq!(neg.tower(0)[1], 0);
        assert!((neg + &poly).is_zero());
    }

    #[test]
    fn mul_wraps_around_quotient() {
        // x^7 * x = x^8 = -1 in Z[x]/(x^8 + 1)
        let basis = basis_17_97();
        let a = RnsPoly::from_signed_coeffs(&[0, 0, 0, 0, 0, 0, 0, 1], basis.clone())
            .into_format(Format::Evaluation);
        let b = RnsPoly::from_signed_coeffs(&[0, 1], basis).into_format(Format::Evaluation);
        let coeffs = (&a * &b).to_centered_coeffs();
        assert_eq!(coeffs[0], -1);
        assert!(coeffs[1..].iter().all(|&c| c == 0));
    }

    #[test]
    fn mul_small_product() {
        // (1 + x)^2 = 1 + 2x + x^2
        let basis = basis_17_97();
        let a = RnsPoly::from_signed_coeffs(&[1, 1], basis).into_format(Format::Evaluation);
        let coeffs = (a.clone() * &a).to_centered_coeffs();
        assert_eq!(&coeffs[..4], &[1, 2, 1, 0]);
    }

    #[test]
    #[should_panic(expected = "mul_assign: requires evaluation format")]
    fn mul_in_coefficient_format_panics() {
        let a = RnsPoly::from_signed_coeffs(&[1, 1], basis_17_97());
        let _ = a.clone() * &a;
    }

    #[test]
    #[should_panic(expected = "add_assign: format mismatch")]
    fn add_across_formats_panics() {
        let a = RnsPoly::from_signed_coeffs(&[1], basis_17_97());
        let b = a.clone().into_format(Format::Evaluation);
        let _ = a + &b;
    }

    #[test]
    fn check_compatible_detects_foreign_basis() {
        let a = RnsPoly::zero(basis_17_97(), Format::Evaluation);
        let other = Arc::new(RnsBasis::new(8, vec![17, 113]).unwrap());
        let b = RnsPoly::zero(other, Format::Evaluation);
        assert_eq!(a.check_compatible(&b), Err(RingError::ParameterMismatch));
        let c = RnsPoly::zero(basis_17_97(), Format::Evaluation);
        assert_eq!(a.check_compatible(&c), Ok(()));
    }

    // ── Sampling ──────────────────────────────────────────────────────────────

    #[test]
    fn sample_uniform_stays_in_range() {
        let basis = basis_17_97();
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let poly = RnsPoly::sample_uniform(basis.clone(), &mut rng);
        assert_eq!(poly.format(), Format::Evaluation);
        for (tower, &q) in poly.towers().iter().zip(basis.moduli()) {
            assert!(tower.iter().all(|&c| c < q));
        }
    }

    #[test]
    fn sample_gaussian_is_small_in_coefficient_form() {
        let basis = Arc::new(RnsBasis::new(64, vec![257, 641]).unwrap());
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let poly = RnsPoly::sample_gaussian(3.19, basis, &mut rng);
        assert_eq!(poly.format(), Format::Evaluation);
        assert!(poly.infinity_norm() < 40);
    }
}
