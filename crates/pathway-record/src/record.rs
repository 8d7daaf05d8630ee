//! Program records and collection membership

use crate::id::ProgramId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Which collection currently owns a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    /// Bookmarked program
    Saved,
    /// Program the user is actively applying to
    Target,
}

impl Membership {
    /// The other collection
    #[inline]
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Membership::Saved => Membership::Target,
            Membership::Target => Membership::Saved,
        }
    }

    /// Lowercase collection name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Membership::Saved => "saved",
            Membership::Target => "target",
        }
    }
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown collection name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection: {0}")]
pub struct ParseMembershipError(pub String);

impl FromStr for Membership {
    type Err = ParseMembershipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "saved" => Ok(Membership::Saved),
            "target" | "targets" => Ok(Membership::Target),
            other => Err(ParseMembershipError(other.to_string())),
        }
    }
}

/// Card payload carried by a record
///
/// The board never branches on these fields except the deadline (urgency
/// ordering of Target) and whatever a saved-collection filter names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceData {
    /// Program name
    pub name: String,
    /// School offering the program
    pub school: String,
    /// City/state display string
    #[serde(default)]
    pub location: String,
    /// Application deadline, if published
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// Requirement completion, 0-100
    #[serde(default)]
    pub progress: u8,
    /// Requirement tags ("GRE", "CASPA", ...)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Categorical attributes (program type, state, format)
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Numeric attributes (tuition, class size, minimum GPA)
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

impl ReferenceData {
    /// Create payload with name and school
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, school: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            school: school.into(),
            ..Self::default()
        }
    }

    /// With location
    #[inline]
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// With deadline
    #[inline]
    #[must_use]
    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// With progress, clamped to 100
    #[inline]
    #[must_use]
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self
    }

    /// With requirement tag
    #[inline]
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// With categorical attribute
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// With numeric attribute
    #[inline]
    #[must_use]
    pub fn with_metric(mut self, key: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(key.into(), value);
        self
    }
}

/// A program owned by exactly one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    /// Stable identifier
    pub id: ProgramId,
    /// Owning collection
    pub membership: Membership,
    /// Card payload
    #[serde(flatten)]
    pub reference: ReferenceData,
}

impl ProgramRecord {
    /// Create new record
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<ProgramId>, membership: Membership, reference: ReferenceData) -> Self {
        Self {
            id: id.into(),
            membership,
            reference,
        }
    }

    /// Create a saved record with a generated id
    #[inline]
    #[must_use]
    pub fn saved(reference: ReferenceData) -> Self {
        Self::new(ProgramId::generate(), Membership::Saved, reference)
    }

    /// Owned by Saved
    #[inline]
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.membership == Membership::Saved
    }

    /// Owned by Target
    #[inline]
    #[must_use]
    pub fn is_target(&self) -> bool {
        self.membership == Membership::Target
    }

    /// Deadline used for urgency ordering
    #[inline]
    #[must_use]
    pub fn deadline(&self) -> Option<NaiveDate> {
        self.reference.deadline
    }
}
