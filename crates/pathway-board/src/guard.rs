//! Transition guard and confirmation dialog
//!
//! Policy:
//! - `ConvertToTarget` is explained once; after the user confirms the first
//!   explanation the durable flag is set and later conversions auto-approve
//! - `RevertToSaved` and `Delete` always ask
//! - declining or dismissing never touches the flag
//!
//! The guard owns the dialog and the flag. It never calls the collection
//! store; the board does that once the guard has approved.

use crate::error::GuardError;
use parking_lot::Mutex;
use pathway_record::{Membership, ProgramId, ProgramRecord};
use pathway_store::FlagStore;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Requested membership change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Saved -> Target
    ConvertToTarget,
    /// Target -> Saved
    RevertToSaved,
    /// Remove from either collection
    Delete,
}

impl TransitionKind {
    /// Transition that moves a record from `origin` to `destination`
    #[inline]
    #[must_use]
    pub fn between(origin: Membership, destination: Membership) -> Option<Self> {
        match (origin, destination) {
            (Membership::Saved, Membership::Target) => Some(Self::ConvertToTarget),
            (Membership::Target, Membership::Saved) => Some(Self::RevertToSaved),
            _ => None,
        }
    }

    /// Membership a record must have for this transition
    #[inline]
    #[must_use]
    pub fn required_origin(self) -> Option<Membership> {
        match self {
            Self::ConvertToTarget => Some(Membership::Saved),
            Self::RevertToSaved => Some(Membership::Target),
            Self::Delete => None,
        }
    }

    /// Dialog heading
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::ConvertToTarget => "Make this a target program?",
            Self::RevertToSaved => "Move back to saved?",
            Self::Delete => "Remove this program?",
        }
    }

    /// Dialog body
    #[must_use]
    pub fn prompt(self) -> &'static str {
        match self {
            Self::ConvertToTarget => {
                "Target programs are the ones you are actively applying to. \
                 We will track their requirements and deadlines for you."
            }
            Self::RevertToSaved => {
                "Requirement tracking for this program will stop. \
                 You can make it a target again later."
            }
            Self::Delete => "This program will be removed from your lists.",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ConvertToTarget => "convert_to_target",
            Self::RevertToSaved => "revert_to_saved",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Transition waiting on the user
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationRequest {
    /// Requested change
    pub kind: TransitionKind,
    /// Record as it was when the dialog opened
    pub record: ProgramRecord,
}

impl ConfirmationRequest {
    /// Subject id
    #[inline]
    #[must_use]
    pub fn subject(&self) -> &ProgramId {
        &self.record.id
    }
}

/// Guard decision
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Invoke the store now
    AutoApproved,
    /// Dialog opened; invoke the store only after confirmation
    AwaitingConfirmation(ConfirmationRequest),
}

/// Confirmation dialog lifecycle: `Closed` or `Open(request)`
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ConfirmDialog {
    /// No dialog
    #[default]
    Closed,
    /// Dialog shown for a request
    Open(ConfirmationRequest),
}

impl ConfirmDialog {
    /// Open request, if any
    #[inline]
    #[must_use]
    pub fn request(&self) -> Option<&ConfirmationRequest> {
        match self {
            ConfirmDialog::Closed => None,
            ConfirmDialog::Open(request) => Some(request),
        }
    }

    /// Check if a dialog is shown
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, ConfirmDialog::Open(_))
    }

    fn open(&mut self, request: ConfirmationRequest) -> Result<(), GuardError> {
        if self.is_open() {
            return Err(GuardError::DialogOpen);
        }
        *self = ConfirmDialog::Open(request);
        Ok(())
    }

    fn close(&mut self) -> Option<ConfirmationRequest> {
        match std::mem::take(self) {
            ConfirmDialog::Closed => None,
            ConfirmDialog::Open(request) => Some(request),
        }
    }
}

/// Confirmation policy with a durable first-run flag
pub struct TransitionGuard {
    flags: Arc<dyn FlagStore>,
    flag_key: String,
    has_seen_explanation: AtomicBool,
    dialog: Mutex<ConfirmDialog>,
}

impl TransitionGuard {
    /// Create guard; call [`TransitionGuard::load`] before first use
    #[must_use]
    pub fn new(flags: Arc<dyn FlagStore>, flag_key: impl Into<String>) -> Self {
        Self {
            flags,
            flag_key: flag_key.into(),
            has_seen_explanation: AtomicBool::new(false),
            dialog: Mutex::new(ConfirmDialog::Closed),
        }
    }

    /// Read the durable flag
    ///
    /// # Errors
    /// - `GuardError::Flag` if the flag store fails; the guard then keeps
    ///   asking for confirmation
    pub async fn load(&self) -> Result<bool, GuardError> {
        let seen = self.flags.get(&self.flag_key).await?;
        self.has_seen_explanation.store(seen, Ordering::SeqCst);
        Ok(seen)
    }

    /// Whether the first-run Target explanation was confirmed
    #[inline]
    #[must_use]
    pub fn has_seen_explanation(&self) -> bool {
        self.has_seen_explanation.load(Ordering::SeqCst)
    }

    /// Current dialog state
    #[must_use]
    pub fn dialog(&self) -> ConfirmDialog {
        self.dialog.lock().clone()
    }

    /// Open request, if any
    #[must_use]
    pub fn pending(&self) -> Option<ConfirmationRequest> {
        self.dialog.lock().request().cloned()
    }

    /// Decide whether `kind` on `record` needs confirmation
    ///
    /// # Errors
    /// - `GuardError::DialogOpen` while another confirmation is pending
    pub fn request_transition(
        &self,
        kind: TransitionKind,
        record: &ProgramRecord,
    ) -> Result<Outcome, GuardError> {
        let mut dialog = self.dialog.lock();
        if dialog.is_open() {
            return Err(GuardError::DialogOpen);
        }

        let needs_confirmation = match kind {
            TransitionKind::ConvertToTarget => !self.has_seen_explanation(),
            TransitionKind::RevertToSaved | TransitionKind::Delete => true,
        };

        if !needs_confirmation {
            tracing::debug!(program = %record.id, %kind, "transition auto-approved");
            return Ok(Outcome::AutoApproved);
        }

        let request = ConfirmationRequest {
            kind,
            record: record.clone(),
        };
        dialog.open(request.clone())?;
        tracing::debug!(program = %record.id, %kind, "confirmation requested");
        Ok(Outcome::AwaitingConfirmation(request))
    }

    /// User confirmed the open dialog
    ///
    /// For the first `ConvertToTarget` the flag is persisted before the
    /// dialog closes; if that write fails the dialog stays open.
    ///
    /// # Errors
    /// - `GuardError::NoPendingConfirmation` if no dialog is open
    /// - `GuardError::Flag` if the flag could not be persisted
    pub async fn confirm(&self) -> Result<ConfirmationRequest, GuardError> {
        let request = self.pending().ok_or(GuardError::NoPendingConfirmation)?;

        if request.kind == TransitionKind::ConvertToTarget && !self.has_seen_explanation() {
            self.flags.set(&self.flag_key, true).await?;
            self.has_seen_explanation.store(true, Ordering::SeqCst);
            tracing::info!(key = %self.flag_key, "target explanation acknowledged");
        }

        let mut dialog = self.dialog.lock();
        if dialog.request() != Some(&request) {
            return Err(GuardError::NoPendingConfirmation);
        }
        dialog.close();
        Ok(request)
    }

    /// User declined or dismissed the open dialog
    ///
    /// Returns the request that was closed, if any.
    pub fn decline(&self) -> Option<ConfirmationRequest> {
        let closed = self.dialog.lock().close();
        if let Some(request) = &closed {
            tracing::debug!(program = %request.subject(), kind = %request.kind, "confirmation declined");
        }
        closed
    }
}

impl std::fmt::Debug for TransitionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionGuard")
            .field("flag_key", &self.flag_key)
            .field("has_seen_explanation", &self.has_seen_explanation())
            .field("dialog", &*self.dialog.lock())
            .finish_non_exhaustive()
    }
}
