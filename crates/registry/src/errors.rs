//! Error types for the credential registry

use certchain_types::{Address, GradeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Unauthorized: {caller} may not {action}")]
    Unauthorized { caller: Address, action: &'static str },

    #[error("Recipient already holds a credential: {recipient}")]
    DuplicateRecipient { recipient: Address },

    #[error("Registration number already in use: {registration_number}")]
    DuplicateRegistrationNumber { registration_number: String },

    #[error("Lookup token already in use: {lookup_token}")]
    DuplicateToken { lookup_token: String },

    #[error("Credential not found: {key}")]
    NotFound { key: String },

    #[error("Required field cannot be empty: {field}")]
    EmptyField { field: &'static str },

    #[error("Invalid grade score: {0}")]
    InvalidGradeScore(#[from] GradeError),

    #[error("Serial number space exhausted")]
    SerialOverflow,

    #[error("Corrupt registry snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;
