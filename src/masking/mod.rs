//! Pairwise additive masking.
//!
//! Every pair of clients agrees on a P-384 ECDH secret, expands it into a
//! ring element `p_ij` and applies it with opposite signs, so the masks of
//! all clients sum to zero in the ring. No key derivation function sits
//! between the raw ECDH output and the ChaCha20 key.

pub mod ecdh;
pub mod errors;
pub mod mask;
pub mod prg;

/// Totally ordered client identifier; the ordering drives the mask sign rule.
pub type ClientId = u64;

pub use ecdh::{EcdhKeyPair, SharedSecret, decode_public_key};
pub use errors::{MaskingError, MaskingResult};
pub use mask::{PublicKeyDirectory, generate_mask};
pub use prg::expand_to_ring_element;
