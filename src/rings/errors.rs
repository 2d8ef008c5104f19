use thiserror::Error;

use super::poly::Format;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RingError {
    #[error("ring degree must be a power of two and at least 2, got {degree}")]
    InvalidDegree { degree: usize },
    #[error("RNS basis must contain at least one modulus")]
    EmptyBasis,
    #[error("modulus {modulus} is not NTT-friendly for degree {degree}")]
    NonNttFriendlyModulus { modulus: u64, degree: usize },
    #[error("modulus {modulus} appears more than once in the basis")]
    DuplicateModulus { modulus: u64 },
    #[error("product of the RNS moduli does not fit in 127 bits")]
    ModulusProductTooLarge,
    #[error("tower count mismatch: expected {expected}, got {actual}")]
    TowerCountMismatch { expected: usize, actual: usize },
    #[error("tower {tower} has {actual} coefficients, expected {expected}")]
    TowerLengthMismatch {
        tower: usize,
        expected: usize,
        actual: usize,
    },
    #[error("coefficient {coefficient} is not reduced modulo {modulus}")]
    NonReducedCoefficient { coefficient: u64, modulus: u64 },
    #[error("ring parameters differ between operands")]
    ParameterMismatch,
    #[error("format mismatch: expected {expected:?}, got {actual:?}")]
    FormatMismatch { expected: Format, actual: Format },
}

pub type RingResult<T> = Result<T, RingError>;
