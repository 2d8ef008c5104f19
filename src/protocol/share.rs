//! What a client uploads, and its byte encoding.
//!
//! The wire form is bincode (fixed-width little-endian integers) of `c0`
//! followed by `d_masked`, each as a format tag plus one `u64` vector per
//! tower. Framing is left to the transport.

use std::sync::Arc;

use bincode::Options;
use serde::{Deserialize, Serialize};

use super::errors::{AggregationError, AggregationResult};
use crate::{
    ckks::{CryptoContext, MkCiphertext},
    rings::{Format, RingError, RnsPoly, RnsPolyWire},
};

/// `(c0, d + r)` from one client. On its own `d_masked` is indistinguishable
/// from uniform; summed over all clients the masks cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientShare {
    pub c0: RnsPoly,
    pub d_masked: RnsPoly,
}

#[derive(Serialize, Deserialize)]
struct PolyPairWire {
    first: RnsPolyWire,
    second: RnsPolyWire,
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding()
}

/// Exact encoded size of two polynomials over `ctx`'s basis.
pub fn pair_wire_len(ctx: &CryptoContext) -> usize {
    // u32 format tag, u64 outer length, then per tower a u64 length and N words.
    let poly = 4 + 8 + ctx.tower_count() * (8 + ctx.ring_dim() * 8);
    2 * poly
}

fn encode_pair(first: &RnsPoly, second: &RnsPoly) -> AggregationResult<Vec<u8>> {
    let wire = PolyPairWire {
        first: first.to_wire(),
        second: second.to_wire(),
    };
    wire_options()
        .serialize(&wire)
        .map_err(|err| AggregationError::Serialization {
            message: err.to_string(),
        })
}

fn decode_pair(bytes: &[u8], ctx: &CryptoContext) -> AggregationResult<(RnsPoly, RnsPoly)> {
    let wire: PolyPairWire = wire_options()
        .with_limit(pair_wire_len(ctx) as u64)
        .deserialize(bytes)
        .map_err(|err| AggregationError::Deserialization {
            client_id: None,
            message: err.to_string(),
        })?;
    let first = RnsPoly::from_wire(wire.first, ctx.basis().clone())?;
    let second = RnsPoly::from_wire(wire.second, ctx.basis().clone())?;
    for poly in [&first, &second] {
        if poly.format() != Format::Evaluation {
            return Err(RingError::FormatMismatch {
                expected: Format::Evaluation,
                actual: poly.format(),
            }
            .into());
        }
    }
    Ok((first, second))
}

impl ClientShare {
    pub fn to_bytes(&self) -> AggregationResult<Vec<u8>> {
        encode_pair(&self.c0, &self.d_masked)
    }

    /// Rehydrates a share against `ctx`, rejecting anything whose tower
    /// layout, reducedness or format does not fit the context.
    pub fn from_bytes(bytes: &[u8], ctx: &CryptoContext) -> AggregationResult<Self> {
        let (c0, d_masked) = decode_pair(bytes, ctx)?;
        Ok(Self { c0, d_masked })
    }

    /// Fails with `ParameterMismatch` unless both components live in `ctx`'s
    /// ring in evaluation format.
    pub fn check_against(&self, ctx: &CryptoContext) -> AggregationResult<()> {
        for poly in [&self.c0, &self.d_masked] {
            if !Arc::ptr_eq(poly.basis(), ctx.basis()) && **poly.basis() != **ctx.basis() {
                return Err(AggregationError::ParameterMismatch);
            }
            if poly.format() != Format::Evaluation {
                return Err(AggregationError::ParameterMismatch);
            }
        }
        Ok(())
    }
}

/// Serialized `(c0, c1)`; only used to size the textbook ciphertext.
pub fn ciphertext_to_bytes(ciphertext: &MkCiphertext) -> AggregationResult<Vec<u8>> {
    encode_pair(&ciphertext.c0, &ciphertext.c1)
}

pub fn ciphertext_from_bytes(bytes: &[u8], ctx: &CryptoContext) -> AggregationResult<MkCiphertext> {
    let (c0, c1) = decode_pair(bytes, ctx)?;
    Ok(MkCiphertext { c0, c1 })
}
