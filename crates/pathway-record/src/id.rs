//! Program identifiers

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Opaque, stable program identifier
///
/// Unique within one user's collections. Ids arriving from the backend are
/// kept verbatim; [`ProgramId::generate`] mints a ULID-backed id for records
/// created locally (fixtures, simulator).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(String);

impl ProgramId {
    /// Wrap an existing identifier
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh, sortable identifier
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProgramId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProgramId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ProgramId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProgramId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
