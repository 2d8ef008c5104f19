//! HEAAN-style "special" FFT over the rotation group `{5^j mod 2N}`.
//!
//! `forward` evaluates a packed coefficient vector at the slot roots
//! `zeta^(5^j)`; `inverse` is its normalized inverse. Both operate on a
//! power-of-two number of slots `<= N/2`.

use std::f64::consts::PI;

use num_complex::Complex64;

#[derive(Debug, Clone)]
pub struct SpecialFft {
    degree: usize,
    /// `5^j mod 2N` for `j < N/2`.
    rot_group: Vec<u64>,
    /// `exp(2 pi i j / 2N)` for `j <= 2N`.
    ksi_pows: Vec<Complex64>,
}

impl SpecialFft {
    /// # Panics
    ///
    /// Panics if `degree` is not a power of two of at least 4.
    pub fn new(degree: usize) -> Self {
        assert!(
            degree >= 4 && degree.is_power_of_two(),
            "SpecialFft: degree must be a power of two >= 4, got {degree}"
        );
        let nh = degree / 2;
        let m = degree * 2;

        let mut rot_group = Vec::with_capacity(nh);
        let mut five_pows = 1u64;
        for _ in 0..nh {
            rot_group.push(five_pows);
            five_pows = (five_pows * 5) % m as u64;
        }

        let mut ksi_pows: Vec<Complex64> = (0..m)
            .map(|j| Complex64::from_polar(1.0, 2.0 * PI * j as f64 / m as f64))
            .collect();
        ksi_pows.push(ksi_pows[0]);

        Self {
            degree,
            rot_group,
            ksi_pows,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn max_slots(&self) -> usize {
        self.degree / 2
    }

    /// Slot values from packed coefficients (decoding direction).
    pub fn forward(&self, vals: &mut [Complex64]) {
        let size = vals.len();
        self.check_size(size);
        let m = (self.degree * 2) as u64;

        bit_reverse(vals);
        let mut len = 2;
        while len <= size {
            let lenh = len >> 1;
            let lenq = (len << 2) as u64;
            for i in (0..size).step_by(len) {
                for j in 0..lenh {
                    let idx = ((self.rot_group[j] % lenq) * m / lenq) as usize;
                    let u = vals[i + j];
                    let v = vals[i + j + lenh] * self.ksi_pows[idx];
                    vals[i + j] = u + v;
                    vals[i + j + lenh] = u - v;
                }
            }
            len <<= 1;
        }
    }

    /// Packed coefficients from slot values (encoding direction), normalized.
    pub fn inverse(&self, vals: &mut [Complex64]) {
        let size = vals.len();
        self.check_size(size);
        let m = (self.degree * 2) as u64;

        let mut len = size;
        while len >= 2 {
            let lenh = len >> 1;
            let lenq = (len << 2) as u64;
            for i in (0..size).step_by(len) {
                for j in 0..lenh {
                    let idx = ((lenq - (self.rot_group[j] % lenq)) * m / lenq) as usize;
                    let u = vals[i + j] + vals[i + j + lenh];
                    let v = (vals[i + j] - vals[i + j + lenh]) * self.ksi_pows[idx];
                    vals[i + j] = u;
                    vals[i + j + lenh] = v;
                }
            }
            len >>= 1;
        }
        bit_reverse(vals);

        let scale = size as f64;
        for val in vals.iter_mut() {
            *val /= scale;
        }
    }

    fn check_size(&self, size: usize) {
        assert!(
            size.is_power_of_two() && size <= self.max_slots(),
            "SpecialFft: slot count must be a power of two <= {}, got {size}",
            self.max_slots()
        );
    }
}

fn bit_reverse(vals: &mut [Complex64]) {
    let size = vals.len();
    let mut j = 0usize;
    for i in 1..size {
        let mut bit = size >> 1;
        while j >= bit {
            j -= bit;
            bit >>= 1;
        }
        j += bit;
        if i < j {
            vals.swap(i, j);
        }
    }
}
