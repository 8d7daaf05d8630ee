//! Outbound signals for the surrounding layout

use crate::error::BoardError;
use crate::guard::{ConfirmationRequest, TransitionKind};
use pathway_record::ProgramId;
use tokio::sync::mpsc;

/// Receiver half handed to the layout
pub type SignalReceiver = mpsc::UnboundedReceiver<BoardSignal>;

/// User-facing failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    /// Transition that failed, if the failure came from one
    pub kind: Option<TransitionKind>,
    /// Record involved, if any
    pub subject: Option<ProgramId>,
    /// Message to show
    pub message: String,
    /// Whether repeating the gesture may succeed
    pub retryable: bool,
}

impl FailureNotice {
    pub(crate) fn from_error(
        err: &BoardError,
        kind: Option<TransitionKind>,
        subject: Option<ProgramId>,
    ) -> Self {
        let message = match err {
            BoardError::NotFound(_) => {
                "This program is no longer in your lists. Your board has been refreshed.".to_string()
            }
            BoardError::StoreUnavailable(_) => {
                "We couldn't save that change. Please try again.".to_string()
            }
            other => other.to_string(),
        };
        Self {
            kind,
            subject,
            message,
            retryable: err.is_retryable(),
        }
    }

    /// The store applied a change but the following re-read failed
    pub(crate) fn stale_board(kind: TransitionKind, subject: ProgramId) -> Self {
        Self {
            kind: Some(kind),
            subject: Some(subject),
            message: "Your change was saved, but the board could not be refreshed.".to_string(),
            retryable: false,
        }
    }
}

/// Signal emitted by the board
#[derive(Debug, Clone, PartialEq)]
pub enum BoardSignal {
    /// Leave the board to browse more programs
    NavigateToBrowse,
    /// Show a transient failure
    Failure(FailureNotice),
    /// Render the confirmation dialog
    DialogOpened(ConfirmationRequest),
    /// Remove the confirmation dialog
    DialogClosed,
}
