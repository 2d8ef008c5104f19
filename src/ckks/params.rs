use std::sync::Arc;

use tracing::{debug, info};

use super::{CkksError, CkksResult};
use crate::{
    encoding::CkksEncoder,
    math::generate_ntt_primes,
    rings::RnsBasis,
};

/// Smallest ring dimension the context builder accepts.
pub const MIN_RING_DIM: usize = 16384;

pub const DEFAULT_FIRST_MOD_BITS: u32 = 60;
pub const DEFAULT_SCALING_MOD_BITS: u32 = 50;
pub const DEFAULT_ERROR_STD: f64 = 3.19;
pub const DEFAULT_SMUDGING_STD: f64 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct CkksParams {
    pub ring_dim: usize,
    pub batch_size: usize,
    pub first_mod_bits: u32,
    pub scaling_mod_bits: u32,
    pub error_std: f64,
    pub smudging_std: f64,
}

impl CkksParams {
    fn validate(&self) -> CkksResult<()> {
        let invalid = |message: String| Err(CkksError::InvalidParameter { message });

        if self.batch_size == 0 || !self.batch_size.is_power_of_two() {
            return invalid(format!(
                "batch size must be a non-zero power of two, got {}",
                self.batch_size
            ));
        }
        if !self.ring_dim.is_power_of_two() || self.ring_dim < MIN_RING_DIM {
            return invalid(format!(
                "ring dimension must be a power of two >= {MIN_RING_DIM}, got {}",
                self.ring_dim
            ));
        }
        if self.batch_size > self.ring_dim / 2 {
            return invalid(format!(
                "batch size {} exceeds half the ring dimension {}",
                self.batch_size, self.ring_dim
            ));
        }
        if !(20..=60).contains(&self.scaling_mod_bits) {
            return invalid(format!(
                "scaling modulus must be 20..=60 bits, got {}",
                self.scaling_mod_bits
            ));
        }
        if self.first_mod_bits <= self.scaling_mod_bits || self.first_mod_bits > 61 {
            return invalid(format!(
                "first modulus must be wider than the scaling modulus and at most 61 bits, got {}",
                self.first_mod_bits
            ));
        }
        if !(self.error_std.is_finite() && self.error_std > 0.0) {
            return invalid(format!(
                "error std must be finite and positive, got {}",
                self.error_std
            ));
        }
        if !(self.smudging_std.is_finite() && self.smudging_std > self.error_std) {
            return invalid(format!(
                "smudging std {} must be finite and strictly greater than error std {}",
                self.smudging_std, self.error_std
            ));
        }
        Ok(())
    }
}

/// Immutable, cheaply clonable crypto context shared by every party of a
/// round.
#[derive(Debug, Clone)]
pub struct CryptoContext {
    inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
    params: CkksParams,
    basis: Arc<RnsBasis>,
    encoder: CkksEncoder,
}

impl CryptoContext {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub fn params(&self) -> &CkksParams {
        &self.inner.params
    }

    pub fn basis(&self) -> &Arc<RnsBasis> {
        &self.inner.basis
    }

    pub fn encoder(&self) -> &CkksEncoder {
        &self.inner.encoder
    }

    pub fn ring_dim(&self) -> usize {
        self.inner.params.ring_dim
    }

    pub fn batch_size(&self) -> usize {
        self.inner.params.batch_size
    }

    pub fn tower_count(&self) -> usize {
        self.inner.basis.tower_count()
    }

    pub fn moduli(&self) -> &[u64] {
        self.inner.basis.moduli()
    }

    pub fn scale_bits(&self) -> u32 {
        self.inner.params.scaling_mod_bits
    }
}

pub struct ContextBuilder {
    data_length: Option<usize>,
    batch_size: Option<usize>,
    ring_dim: Option<usize>,
    first_mod_bits: Option<u32>,
    scaling_mod_bits: Option<u32>,
    error_std: Option<f64>,
    smudging_std: Option<f64>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            data_length: None,
            batch_size: None,
            ring_dim: None,
            first_mod_bits: None,
            scaling_mod_bits: None,
            error_std: None,
            smudging_std: None,
        }
    }

    /// Length of the client vectors; the batch size defaults to the next
    /// power of two at or above it.
    pub fn data_length(mut self, len: usize) -> Self {
        self.data_length = Some(len);
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn ring_dim(mut self, ring_dim: usize) -> Self {
        self.ring_dim = Some(ring_dim);
        self
    }

    pub fn first_mod_bits(mut self, bits: u32) -> Self {
        self.first_mod_bits = Some(bits);
        self
    }

    pub fn scaling_mod_bits(mut self, bits: u32) -> Self {
        self.scaling_mod_bits = Some(bits);
        self
    }

    pub fn error_std(mut self, std_dev: f64) -> Self {
        self.error_std = Some(std_dev);
        self
    }

    pub fn smudging_std(mut self, std_dev: f64) -> Self {
        self.smudging_std = Some(std_dev);
        self
    }

    fn resolve(&self) -> CkksParams {
        let batch_size = self.batch_size.unwrap_or_else(|| {
            self.data_length.unwrap_or(1).max(1).next_power_of_two()
        });
        let ring_dim = self
            .ring_dim
            .unwrap_or_else(|| MIN_RING_DIM.max(2 * batch_size));
        CkksParams {
            ring_dim,
            batch_size,
            first_mod_bits: self.first_mod_bits.unwrap_or(DEFAULT_FIRST_MOD_BITS),
            scaling_mod_bits: self.scaling_mod_bits.unwrap_or(DEFAULT_SCALING_MOD_BITS),
            error_std: self.error_std.unwrap_or(DEFAULT_ERROR_STD),
            smudging_std: self.smudging_std.unwrap_or(DEFAULT_SMUDGING_STD),
        }
    }

    pub fn build(self) -> CkksResult<CryptoContext> {
        let params = self.resolve();
        params.validate()?;
        if let Some(len) = self.data_length {
            if len > params.batch_size {
                return Err(CkksError::InvalidParameter {
                    message: format!(
                        "data length {len} exceeds batch size {}",
                        params.batch_size
                    ),
                });
            }
        }

        let n = params.ring_dim as u64;
        let mut moduli = Vec::with_capacity(2);
        for bits in [params.first_mod_bits, params.scaling_mod_bits] {
            let prime = generate_ntt_primes(bits, 1, n).ok_or(
                CkksError::PrimeSearchExhausted {
                    bits,
                    ring_dim: params.ring_dim,
                },
            )?;
            moduli.extend(prime);
        }
        debug!(?moduli, "selected RNS towers");

        let basis = Arc::new(RnsBasis::new(params.ring_dim, moduli)?);
        let encoder = CkksEncoder::new(params.ring_dim, params.scaling_mod_bits)?;
        info!(
            ring_dim = params.ring_dim,
            batch_size = params.batch_size,
            log_q = basis.modulus_bits(),
            "crypto context ready"
        );

        Ok(CryptoContext {
            inner: Arc::new(ContextInner {
                params,
                basis,
                encoder,
            }),
        })
    }
}
