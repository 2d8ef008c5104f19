//! CKKS packed encoder/decoder for `RnsPoly` plaintexts.
//!
//!   encode: slots -> `SpecialFft::inverse` -> scale by Δ -> round ->
//!           sparse layout (real at `i*gap`, imaginary at `N/2 + i*gap`) ->
//!           evaluation format
//!   decode: centered CRT lift -> read the sparse layout -> unscale ->
//!           `SpecialFft::forward` -> real parts
//!
//! Δ = 2^scale_bits. Decoding assumes the polynomial carries a single
//! factor of Δ, so it applies equally to a fresh plaintext and to the sum of
//! many plaintexts plus small noise.

use std::sync::Arc;

use num_complex::Complex64;
use tracing::{debug, instrument};

use crate::rings::{Format, RnsBasis, RnsPoly};

use super::{EncodingError, EncodingResult, special_fft::SpecialFft};

/// A plaintext polynomial produced by `CkksEncoder::encode`.
#[derive(Debug, Clone)]
pub struct Plaintext {
    /// The scaled, rounded polynomial in evaluation format.
    pub poly: RnsPoly,
    /// Number of bits in the scaling factor Δ = 2^scale_bits.
    pub scale_bits: u32,
    /// Number of packed slots (power of two).
    pub slots: usize,
}

#[derive(Debug, Clone)]
pub struct CkksEncoder {
    scale_bits: u32,
    fft: SpecialFft,
}

impl CkksEncoder {
    pub fn new(degree: usize, scale_bits: u32) -> EncodingResult<Self> {
        if degree < 4 || !degree.is_power_of_two() {
            return Err(EncodingError::InvalidRingDegree { degree });
        }
        assert!(
            (1..=62).contains(&scale_bits),
            "CkksEncoder: scale_bits must be in 1..=62"
        );
        Ok(Self {
            scale_bits,
            fft: SpecialFft::new(degree),
        })
    }

    pub fn scale_bits(&self) -> u32 {
        self.scale_bits
    }

    pub fn scale_factor(&self) -> f64 {
        2f64.powi(self.scale_bits as i32)
    }

    pub fn degree(&self) -> usize {
        self.fft.degree()
    }

    pub fn max_slots(&self) -> usize {
        self.fft.max_slots()
    }

    fn check_slots(&self, slots: usize) -> EncodingResult<()> {
        if slots == 0 || !slots.is_power_of_two() || slots > self.max_slots() {
            return Err(EncodingError::InvalidSlotCount {
                slots,
                max: self.max_slots(),
            });
        }
        Ok(())
    }

    fn check_basis(&self, basis: &RnsBasis) -> EncodingResult<()> {
        if basis.degree() != self.degree() {
            return Err(EncodingError::DegreeMismatch {
                encoder: self.degree(),
                basis: basis.degree(),
            });
        }
        Ok(())
    }

    // ── Encoding ─────────────────────────────────────────────────────────────

    /// Encodes up to `slots` real values; missing slots are zero.
    #[instrument(level = "debug", skip(self, values, basis), fields(len = values.len()))]
    pub fn encode(
        &self,
        values: &[f64],
        slots: usize,
        basis: Arc<RnsBasis>,
    ) -> EncodingResult<Plaintext> {
        self.check_slots(slots)?;
        self.check_basis(&basis)?;
        if values.len() > slots {
            return Err(EncodingError::InputTooLong {
                got: values.len(),
                max: slots,
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(EncodingError::NonFiniteValue { index });
        }

        let mut uvals = vec![Complex64::new(0.0, 0.0); slots];
        for (slot, &v) in uvals.iter_mut().zip(values) {
            slot.re = v;
        }
        self.fft.inverse(&mut uvals);

        // |coeff| < Q/4 so sums of a few plaintexts still lift correctly.
        let limit = 2f64.powi((basis.modulus_bits() - 2) as i32);
        let delta = self.scale_factor();
        let nh = self.max_slots();
        let gap = nh / slots;

        let mut coeffs = vec![0i128; self.degree()];
        for (i, val) in uvals.iter().enumerate() {
            coeffs[i * gap] = scale_to_integer(val.re, delta, limit)?;
            coeffs[nh + i * gap] = scale_to_integer(val.im, delta, limit)?;
        }
        debug!(slots, gap, "packed plaintext coefficients");

        let poly = RnsPoly::from_signed_coeffs(&coeffs, basis).into_format(Format::Evaluation);
        Ok(Plaintext {
            poly,
            scale_bits: self.scale_bits,
            slots,
        })
    }

    // ── Decoding ─────────────────────────────────────────────────────────────

    /// Decodes the first `len` slots of a polynomial packed with `slots`.
    ///
    /// Accepts either format; evaluation-format input is converted on a
    /// temporary copy.
    pub fn decode(&self, poly: &RnsPoly, slots: usize, len: usize) -> EncodingResult<Vec<f64>> {
        self.check_slots(slots)?;
        self.check_basis(poly.basis())?;
        if len > slots {
            return Err(EncodingError::InputTooLong {
                got: len,
                max: slots,
            });
        }

        let coeffs = poly.to_centered_coeffs();
        let delta = self.scale_factor();
        let nh = self.max_slots();
        let gap = nh / slots;

        let mut uvals: Vec<Complex64> = (0..slots)
            .map(|i| {
                let idx = i * gap;
                Complex64::new(coeffs[idx] as f64 / delta, coeffs[nh + idx] as f64 / delta)
            })
            .collect();
        self.fft.forward(&mut uvals);

        Ok(uvals.into_iter().take(len).map(|c| c.re).collect())
    }

    pub fn decode_plaintext(&self, pt: &Plaintext, len: usize) -> EncodingResult<Vec<f64>> {
        self.decode(&pt.poly, pt.slots, len)
    }
}

fn scale_to_integer(value: f64, delta: f64, limit: f64) -> EncodingResult<i128> {
    let scaled = (value * delta).round();
    if scaled.abs() >= limit {
        return Err(EncodingError::CoefficientOutOfRange { value: scaled });
    }
    Ok(scaled as i128)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
