//! Multi-key CKKS over the RNS ring: context, keys and the fused
//! encrypt/partial-decrypt path used by secure aggregation.

mod engine;
pub mod errors;
pub mod keys;
pub mod params;
pub mod types;

pub use errors::{CkksError, CkksResult};
pub use keys::{Crs, KeyPair, PublicKey, SecretKey};
pub use params::{CkksParams, ContextBuilder, CryptoContext, MIN_RING_DIM};
pub use types::{MkCiphertext, PartialShare};
