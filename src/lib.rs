pub mod ckks;
pub mod encoding;
pub mod masking;
pub mod math;
pub mod protocol;
pub mod rings;

pub use ckks::{CkksError, CkksParams, Crs, CryptoContext, KeyPair, MkCiphertext, PartialShare};
pub use encoding::{CkksEncoder, EncodingError, Plaintext};
pub use masking::{ClientId, EcdhKeyPair, MaskingError, PublicKeyDirectory, generate_mask};
pub use protocol::{
    AggregationError, AggregationResult, Client, ClientShare, RoundConfig, RoundReport, Server,
    run_round,
};
pub use rings::{Format, RingError, RnsBasis, RnsPoly};
