//! Error types for the program board
//!
//! Everything that reaches a board caller is one of four kinds:
//! - missing record (`NotFound`)
//! - racing or meaningless request (`InvalidTransition`)
//! - transient backend failure (`StoreUnavailable`)
//! - dialog dismissed without a choice (`ConfirmationAbandoned`)

use pathway_record::ProgramId;
use pathway_store::StoreError;

/// Board-level error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// Record absent from the expected collection
    #[error("program not found: {0}")]
    NotFound(ProgramId),

    /// Transition rejected before reaching the store
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Store or flag persistence failed transiently
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Confirmation dialog dismissed
    #[error("confirmation abandoned")]
    ConfirmationAbandoned,
}

impl BoardError {
    /// Check if the error is part of normal interaction and never shown
    #[inline]
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            Self::InvalidTransition(_) | Self::ConfirmationAbandoned
        )
    }

    /// Check if repeating the same gesture may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    #[inline]
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidTransition(reason.into())
    }
}

impl From<StoreError> for BoardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::AlreadyTarget(id) => {
                Self::InvalidTransition(format!("{id} is already a target"))
            }
            StoreError::AlreadySaved(id) => Self::InvalidTransition(format!("{id} is already saved")),
            StoreError::Unavailable(reason) | StoreError::Persistence(reason) => {
                Self::StoreUnavailable(reason)
            }
        }
    }
}

/// Transition guard errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// A confirmation dialog is already open
    #[error("a confirmation is already pending")]
    DialogOpen,

    /// Confirm/decline with no open dialog
    #[error("no confirmation is pending")]
    NoPendingConfirmation,

    /// Explanation flag could not be read or written
    #[error("explanation flag: {0}")]
    Flag(#[from] StoreError),
}

impl From<GuardError> for BoardError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::DialogOpen | GuardError::NoPendingConfirmation => {
                Self::InvalidTransition(err.to_string())
            }
            GuardError::Flag(inner) => Self::StoreUnavailable(inner.to_string()),
        }
    }
}
