pub mod ckks_encoder;
pub mod special_fft;

pub use ckks_encoder::{CkksEncoder, Plaintext};
pub use special_fft::SpecialFft;
use thiserror::Error;

pub type EncodingResult<T> = Result<T, EncodingError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("Input too long: got {got}, max {max}")]
    InputTooLong { got: usize, max: usize },

    #[error("Slot count {slots} must be a power of two no larger than {max}")]
    InvalidSlotCount { slots: usize, max: usize },

    #[error("Ring degree {degree} not supported")]
    InvalidRingDegree { degree: usize },

    #[error("Value at index {index} is not finite")]
    NonFiniteValue { index: usize },

    #[error("Scaled value {value} does not fit below the ciphertext modulus")]
    CoefficientOutOfRange { value: f64 },

    #[error("Encoder built for degree {encoder}, basis has degree {basis}")]
    DegreeMismatch { encoder: usize, basis: usize },
}
