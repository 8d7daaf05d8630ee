//! Pathway Store Contracts
//!
//! External collaborators the program board consumes:
//! - [`CollectionStore`]: authoritative Saved/Target membership (async, fallible)
//! - [`FlagStore`]: durable booleans such as the target-explanation flag
//! - [`ProfileProvider`]: display name for the board header
//!
//! In-memory and file-backed implementations are provided for local use and
//! tests; production deployments plug in their own backend.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod collection;
mod error;
mod flags;
mod profile;

pub use collection::{CollectionStore, InMemoryCollectionStore};
pub use error::StoreError;
pub use flags::{FlagStore, InMemoryFlagStore, JsonFileFlagStore};
pub use profile::{ProfileProvider, StaticProfile};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
