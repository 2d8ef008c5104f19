use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CkksError {
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Encoding failed: {source}")]
    EncodingError {
        #[from]
        source: crate::encoding::EncodingError,
    },

    #[error("Ring operation failed: {source}")]
    RingError {
        #[from]
        source: crate::rings::RingError,
    },

    #[error("No {bits}-bit NTT-friendly prime exists for ring dimension {ring_dim}")]
    PrimeSearchExhausted { bits: u32, ring_dim: usize },
}

pub type CkksResult<T> = Result<T, CkksError>;
