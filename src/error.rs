//! Error types for the groupsync reconciler

use thiserror::Error;

use crate::iam::IamError;

/// Main error type for groupsync operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// IAM API error
    #[error("iam error: {0}")]
    Iam(#[from] IamError),

    /// Validation error for membership records
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed import identifier
    #[error("unexpected format of import id ({0:?}), expected <group-name>")]
    ImportId(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an import-id error for the given raw identifier
    pub fn import_id(raw: impl Into<String>) -> Self {
        Self::ImportId(raw.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}
