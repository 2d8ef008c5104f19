use thiserror::Error;

use super::ClientId;
use crate::rings::RingError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaskingError {
    #[error("public key directory has no entry for client {client_id}")]
    MissingPeer { client_id: ClientId },

    #[error("client {client_id} is already registered in the directory")]
    DuplicateClient { client_id: ClientId },

    #[error("public key of client {client_id} could not be decoded: {message}")]
    Deserialization { client_id: ClientId, message: String },

    #[error("{context}: {message}")]
    CryptoPrimitiveFailure {
        context: &'static str,
        message: String,
    },

    #[error(transparent)]
    Ring(#[from] RingError),
}

pub type MaskingResult<T> = Result<T, MaskingError>;
