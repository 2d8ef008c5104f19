use thiserror::Error;

use crate::{
    ckks::CkksError,
    masking::{ClientId, MaskingError},
    rings::RingError,
};

/// Everything that can abort an aggregation round.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AggregationError {
    #[error("ring parameters of an operand do not match the crypto context")]
    ParameterMismatch,

    #[error("public key directory has no entry for client {client_id}")]
    MissingPeer { client_id: ClientId },

    #[error("{}: {message}", describe_origin(.client_id))]
    Deserialization {
        client_id: Option<ClientId>,
        message: String,
    },

    #[error("cannot finalize an aggregate without any shares")]
    EmptyAggregate,

    #[error("{context}: {message}")]
    CryptoPrimitiveFailure { context: String, message: String },

    #[error("client {client_id} appears more than once in the round")]
    DuplicateClient { client_id: ClientId },

    #[error("input of {got} values does not fit the batch of {max} slots")]
    DataTooLong { got: usize, max: usize },

    #[error("client {client_id} has no keys for this round; call generate_keys first")]
    MissingKeys { client_id: ClientId },

    #[error("share serialization failed: {message}")]
    Serialization { message: String },

    #[error("CKKS operation failed: {0}")]
    Ckks(CkksError),
}

fn describe_origin(client_id: &Option<ClientId>) -> String {
    match client_id {
        Some(id) => format!("data from client {id} could not be decoded"),
        None => "share could not be decoded".to_string(),
    }
}

pub type AggregationResult<T> = Result<T, AggregationError>;

impl From<RingError> for AggregationError {
    fn from(err: RingError) -> Self {
        match err {
            RingError::ParameterMismatch
            | RingError::FormatMismatch { .. }
            | RingError::TowerCountMismatch { .. }
            | RingError::TowerLengthMismatch { .. } => Self::ParameterMismatch,
            other => Self::Deserialization {
                client_id: None,
                message: other.to_string(),
            },
        }
    }
}

impl From<CkksError> for AggregationError {
    fn from(err: CkksError) -> Self {
        match err {
            CkksError::RingError { source } => source.into(),
            other => Self::Ckks(other),
        }
    }
}

impl From<MaskingError> for AggregationError {
    fn from(err: MaskingError) -> Self {
        match err {
            MaskingError::MissingPeer { client_id } => Self::MissingPeer { client_id },
            MaskingError::DuplicateClient { client_id } => Self::DuplicateClient { client_id },
            MaskingError::Deserialization { client_id, message } => Self::Deserialization {
                client_id: Some(client_id),
                message,
            },
            MaskingError::CryptoPrimitiveFailure { context, message } => {
                Self::CryptoPrimitiveFailure {
                    context: context.to_string(),
                    message,
                }
            }
            MaskingError::Ring(err) => err.into(),
        }
    }
}
