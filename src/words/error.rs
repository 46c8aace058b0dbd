use thiserror::Error;

use super::entity::WordId;
use super::field::ValueKind;

pub use crate::database::StoreError;

/// Structural problems with a batch, detected before any storage call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid field: '{0}'")]
    InvalidField(String),

    #[error("Invalid value type for field '{field}': expected {expected}")]
    InvalidValueType { field: String, expected: ValueKind },

    #[error("Field '{0}' cannot be empty")]
    EmptyValue(String),

    #[error("No updates provided")]
    NoUpdatesProvided,
}

impl ValidationError {
    /// Field the error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::InvalidField(field) => Some(field),
            ValidationError::InvalidValueType { field, .. } => Some(field),
            ValidationError::EmptyValue(field) => Some(field),
            ValidationError::NoUpdatesProvided => None,
        }
    }
}

/// Errors surfaced by the word service
#[derive(Debug, Error)]
pub enum VocabError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The word is missing or owned by someone else. Both cases look the
    /// same to the caller.
    #[error("Not allowed to modify word {0}")]
    Forbidden(WordId),

    #[error("Failed to update word {word_id}: {source}")]
    UpdateFailed { word_id: WordId, source: StoreError },

    #[error("Failed to update learned status of word {word_id}: {source}")]
    StatusUpdateFailed { word_id: WordId, source: StoreError },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl VocabError {
    /// Underlying storage error, for the variants that carry one
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            VocabError::UpdateFailed { source, .. } => Some(source),
            VocabError::StatusUpdateFailed { source, .. } => Some(source),
            VocabError::Storage(source) => Some(source),
            _ => None,
        }
    }
}
