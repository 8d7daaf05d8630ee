//! Store error types

use pathway_record::ProgramId;

/// Failures reported by collection and flag stores
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Record absent from the expected collection
    #[error("program not found: {0}")]
    NotFound(ProgramId),

    /// Conversion requested for a record already in Target
    #[error("program already targeted: {0}")]
    AlreadyTarget(ProgramId),

    /// Revert requested for a record already in Saved
    #[error("program already saved: {0}")]
    AlreadySaved(ProgramId),

    /// Transient backend failure (network, server)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Durable flag could not be read or written
    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl StoreError {
    /// Check if the failure is transient
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Persistence(_))
    }

    /// Check if the record is already where the caller wanted it
    #[inline]
    #[must_use]
    pub fn is_already_there(&self) -> bool {
        matches!(self, Self::AlreadyTarget(_) | Self::AlreadySaved(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}
