//! Pathway Records
//!
//! The unit the program board classifies and orders:
//! - [`ProgramId`]: opaque, stable identifier
//! - [`Membership`]: which collection (Saved or Target) owns a record
//! - [`ReferenceData`]: inert payload shown on cards (school, deadline, progress)
//! - [`ProgramRecord`]: id + membership + reference data
//!
//! # Example
//!
//! ```rust
//! use pathway_record::{Membership, ProgramRecord, ReferenceData};
//!
//! let record = ProgramRecord::new(
//!     "p1",
//!     Membership::Saved,
//!     ReferenceData::new("Physician Assistant MS", "Lakeside University"),
//! );
//! assert!(record.is_saved());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod id;
mod record;

pub use id::ProgramId;
pub use record::{Membership, ParseMembershipError, ProgramRecord, ReferenceData};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
