//! Pathway Program Board
//!
//! Two-collection board for graduate program planning. A user drags program
//! cards between **Saved** and **Target** (or uses the card actions), and the
//! board turns those gestures into guarded store transitions.
//!
//! - [`drag`]: press / move / release state machine with activation distance
//! - [`zones`]: drop zone geometry and hit-testing
//! - [`guard`]: confirmation policy and the first-run explanation flag
//! - [`sort`]: pure ordering and narrowing of the two collections
//! - [`board`]: orchestrator owning the snapshot and the in-flight set
//! - [`simulator`]: seeded gesture simulator that checks board invariants
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pathway_board::{BoardConfig, ProgramBoard, SavedFilter};
//! use pathway_store::{InMemoryCollectionStore, InMemoryFlagStore};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), pathway_board::BoardError> {
//! let store = Arc::new(InMemoryCollectionStore::new());
//! let flags = Arc::new(InMemoryFlagStore::new());
//! let (board, _signals) = ProgramBoard::new(BoardConfig::default(), store, flags);
//!
//! board.load().await?;
//! println!("{}", board.view(&SavedFilter::new()).render_text());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod board;
pub mod config;
pub mod drag;
pub mod error;
pub mod guard;
pub mod signal;
pub mod simulator;
pub mod sort;
pub mod view;
pub mod zones;

pub use board::{GestureReport, ProgramBoard, TransitionReport};
pub use config::{BoardConfig, ConfigError};
pub use drag::{DragSession, DragState, DropResolved, GestureEnd};
pub use error::{BoardError, GuardError};
pub use guard::{ConfirmDialog, ConfirmationRequest, Outcome, TransitionGuard, TransitionKind};
pub use signal::{BoardSignal, FailureNotice, SignalReceiver};
pub use sort::{narrow_saved, order_targets, NumericField, Predicate, SavedFilter, SavedOrder};
pub use view::{BoardHeader, BoardView, CardView, DragPreview, ZoneView};
pub use zones::{Point, Rect, ZoneId, ZoneRegistry};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
