//! Program board orchestrator
//!
//! Wires the drag session, the transition guard and the collection store:
//! - pointer input drives the single [`DragSession`]
//! - drops and explicit actions go through one guard path
//! - approved transitions call the store; the board then re-reads both
//!   collections instead of patching its own copy
//! - ids with a store call in flight are locked against a second transition
//!   until that call resolves; other ids are unaffected

use crate::config::BoardConfig;
use crate::drag::{DragSession, DragState, DropResolved, GestureEnd};
use crate::error::BoardError;
use crate::guard::{ConfirmDialog, ConfirmationRequest, Outcome, TransitionGuard, TransitionKind};
use crate::signal::{BoardSignal, FailureNotice, SignalReceiver};
use crate::sort::{self, SavedFilter};
use crate::view::{BoardHeader, BoardView, CardView, DragPreview, ZoneView};
use crate::zones::{Point, ZoneId, ZoneRegistry};
use dashmap::DashSet;
use parking_lot::Mutex;
use pathway_record::{Membership, ProgramId, ProgramRecord};
use pathway_store::{CollectionStore, FlagStore, ProfileProvider};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Re-reads attempted when the two lists disagree mid-refresh
const MAX_REFRESH_ATTEMPTS: usize = 3;

/// Result of a transition request or dialog response
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionReport {
    /// Store accepted the change and the snapshot was re-read
    Applied {
        /// Change applied
        kind: TransitionKind,
        /// Record changed
        id: ProgramId,
    },
    /// Dialog opened; nothing happens until the user answers
    AwaitingConfirmation(ConfirmationRequest),
    /// User declined the dialog
    Declined,
}

/// Result of a pointer release
#[derive(Debug, Clone, PartialEq)]
pub enum GestureReport {
    /// Released before activation
    Click(ProgramId),
    /// Released outside every zone
    Cancelled,
    /// Dropped onto its own zone
    Unchanged,
    /// No gesture was in progress
    Ignored,
    /// Drop requested a transition
    Transition(TransitionReport),
}

#[derive(Debug, Clone, Default)]
struct Snapshot {
    saved: Vec<ProgramRecord>,
    targets: Vec<ProgramRecord>,
    seq: u64,
}

impl Snapshot {
    fn find(&self, id: &ProgramId) -> Option<&ProgramRecord> {
        self.saved
            .iter()
            .chain(self.targets.iter())
            .find(|r| &r.id == id)
    }
}

/// Marks an id as in flight for as long as it lives
struct InFlight<'a> {
    set: &'a DashSet<ProgramId>,
    id: ProgramId,
}

impl<'a> InFlight<'a> {
    fn enter(set: &'a DashSet<ProgramId>, id: &ProgramId) -> Option<Self> {
        set.insert(id.clone()).then(|| Self {
            set,
            id: id.clone(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.id);
    }
}

/// Saved/Target program board
pub struct ProgramBoard {
    config: BoardConfig,
    zones: ZoneRegistry,
    store: Arc<dyn CollectionStore>,
    guard: TransitionGuard,
    profile: Option<Arc<dyn ProfileProvider>>,
    drag: Mutex<DragSession>,
    snapshot: Mutex<Snapshot>,
    refresh_seq: AtomicU64,
    in_flight: DashSet<ProgramId>,
    last_failure: Mutex<Option<(TransitionKind, ProgramId)>>,
    signals: mpsc::UnboundedSender<BoardSignal>,
}

impl ProgramBoard {
    /// Create board; call [`ProgramBoard::load`] before use
    #[must_use]
    pub fn new(
        config: BoardConfig,
        store: Arc<dyn CollectionStore>,
        flags: Arc<dyn FlagStore>,
    ) -> (Self, SignalReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let board = Self {
            zones: config.zones(),
            guard: TransitionGuard::new(flags, config.explanation_flag_key.clone()),
            drag: Mutex::new(DragSession::new(config.activation_distance_px)),
            config,
            store,
            profile: None,
            snapshot: Mutex::new(Snapshot::default()),
            refresh_seq: AtomicU64::new(0),
            in_flight: DashSet::new(),
            last_failure: Mutex::new(None),
            signals: tx,
        };
        (board, rx)
    }

    /// With profile provider for the header greeting
    #[inline]
    #[must_use]
    pub fn with_profile(mut self, profile: Arc<dyn ProfileProvider>) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Read the explanation flag and the first snapshot
    ///
    /// An unreadable flag is treated as unset.
    ///
    /// # Errors
    /// - `BoardError::StoreUnavailable` if the collections cannot be listed
    pub async fn load(&self) -> Result<(), BoardError> {
        if let Err(e) = self.guard.load().await {
            tracing::warn!(error = %e, "explanation flag unreadable, confirmations stay on");
        }
        self.refresh().await?;

        let snapshot = self.snapshot.lock();
        tracing::info!(
            saved = snapshot.saved.len(),
            targets = snapshot.targets.len(),
            seen_explanation = self.guard.has_seen_explanation(),
            "program board loaded"
        );
        Ok(())
    }

    /// Re-read both collections from the store
    ///
    /// A refresh that started earlier never overwrites one that started later.
    /// A record listed in both collections, or a known record missing from
    /// both with no call of ours in flight, means a move raced the two reads;
    /// the lists are read again. A record that stays missing across two reads
    /// is taken as removed.
    ///
    /// # Errors
    /// - `BoardError::StoreUnavailable` if listing fails or the lists keep
    ///   disagreeing
    pub async fn refresh(&self) -> Result<(), BoardError> {
        let seq = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let known: HashSet<ProgramId> = {
            let snapshot = self.snapshot.lock();
            snapshot
                .saved
                .iter()
                .chain(snapshot.targets.iter())
                .map(|r| r.id.clone())
                .collect()
        };
        let mut unconfirmed: Option<HashSet<ProgramId>> = None;

        for attempt in 1..=MAX_REFRESH_ATTEMPTS {
            let (mut saved, mut targets) =
                futures::try_join!(self.store.list_saved(), self.store.list_targets())?;

            let saved_ids: HashSet<&ProgramId> = saved.iter().map(|r| &r.id).collect();
            if targets.iter().any(|r| saved_ids.contains(&r.id)) {
                tracing::debug!(attempt, "collections changed during refresh, re-reading");
                continue;
            }

            let listed: HashSet<&ProgramId> =
                saved.iter().chain(targets.iter()).map(|r| &r.id).collect();
            let missing: HashSet<ProgramId> = known
                .iter()
                .filter(|id| !listed.contains(*id) && !self.in_flight.contains(*id))
                .cloned()
                .collect();
            if !missing.is_empty()
                && unconfirmed.as_ref() != Some(&missing)
                && attempt < MAX_REFRESH_ATTEMPTS
            {
                tracing::debug!(
                    attempt,
                    missing = missing.len(),
                    "programs absent from both lists, re-reading"
                );
                unconfirmed = Some(missing);
                continue;
            }

            for record in &mut saved {
                record.membership = Membership::Saved;
            }
            for record in &mut targets {
                record.membership = Membership::Target;
            }

            let mut snapshot = self.snapshot.lock();
            if seq > snapshot.seq {
                *snapshot = Snapshot {
                    saved,
                    targets,
                    seq,
                };
            }
            return Ok(());
        }

        Err(BoardError::StoreUnavailable(
            "collections changed during refresh".to_string(),
        ))
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Registered drop zones
    #[inline]
    #[must_use]
    pub fn zones(&self) -> &ZoneRegistry {
        &self.zones
    }

    /// Whether the first-run Target explanation was confirmed
    #[inline]
    #[must_use]
    pub fn has_seen_explanation(&self) -> bool {
        self.guard.has_seen_explanation()
    }

    /// Confirmation dialog state
    #[must_use]
    pub fn dialog(&self) -> ConfirmDialog {
        self.guard.dialog()
    }

    /// Drag state
    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.drag.lock().state().clone()
    }

    /// Check if a store call for `id` is in flight
    #[must_use]
    pub fn is_pending(&self, id: &ProgramId) -> bool {
        self.in_flight.contains(id)
    }

    /// Membership according to the last snapshot
    #[must_use]
    pub fn membership_of(&self, id: &ProgramId) -> Option<Membership> {
        self.snapshot.lock().find(id).map(|r| r.membership)
    }

    /// Records of one collection from the last snapshot, store order
    #[must_use]
    pub fn records(&self, membership: Membership) -> Vec<ProgramRecord> {
        let snapshot = self.snapshot.lock();
        match membership {
            Membership::Saved => snapshot.saved.clone(),
            Membership::Target => snapshot.targets.clone(),
        }
    }

    // ---- pointer input ----

    /// Pointer down on a card
    ///
    /// Returns `false` for unknown ids or while another gesture is active.
    pub fn press(&self, id: &ProgramId, at: Point) -> bool {
        let Some(origin) = self.membership_of(id) else {
            tracing::debug!(program = %id, "press on unknown program");
            return false;
        };
        self.drag.lock().press(id.clone(), origin, at)
    }

    /// Pointer moved
    pub fn pointer_move(&self, at: Point) -> DragState {
        let zone = self.zones.zone_at(at);
        self.drag.lock().pointer_move(at, zone).clone()
    }

    /// Escape or interrupted gesture
    pub fn cancel_drag(&self) -> bool {
        self.drag.lock().cancel()
    }

    /// Pointer released
    ///
    /// # Errors
    /// Whatever the requested transition reports; see [`ProgramBoard::request`].
    pub async fn release(&self) -> Result<GestureReport, BoardError> {
        let end = self.drag.lock().release();
        match end {
            GestureEnd::Drop(drop) => self.handle_drop(drop).await,
            GestureEnd::Click(id) => Ok(GestureReport::Click(id)),
            GestureEnd::Cancelled => Ok(GestureReport::Cancelled),
            GestureEnd::Ignored => Ok(GestureReport::Ignored),
        }
    }

    async fn handle_drop(&self, drop: DropResolved) -> Result<GestureReport, BoardError> {
        let Some(kind) = drop
            .destination()
            .and_then(|dest| TransitionKind::between(drop.origin, dest))
        else {
            tracing::debug!(program = %drop.id, "dropped on origin or outside zones");
            return Ok(GestureReport::Unchanged);
        };

        self.request(kind, &drop.id)
            .await
            .map(GestureReport::Transition)
    }

    // ---- explicit actions ----

    /// "Make target" on a saved card
    ///
    /// # Errors
    /// See [`ProgramBoard::request`].
    pub async fn make_target(&self, id: &ProgramId) -> Result<TransitionReport, BoardError> {
        self.request(TransitionKind::ConvertToTarget, id).await
    }

    /// "Move to saved" on a target card
    ///
    /// # Errors
    /// See [`ProgramBoard::request`].
    pub async fn move_to_saved(&self, id: &ProgramId) -> Result<TransitionReport, BoardError> {
        self.request(TransitionKind::RevertToSaved, id).await
    }

    /// "Remove" on either card
    ///
    /// # Errors
    /// See [`ProgramBoard::request`].
    pub async fn delete(&self, id: &ProgramId) -> Result<TransitionReport, BoardError> {
        self.request(TransitionKind::Delete, id).await
    }

    /// Request a transition through the guard
    ///
    /// # Errors
    /// - `BoardError::NotFound` if the id is not in the snapshot or the store
    /// - `BoardError::InvalidTransition` if the record is already there, a
    ///   dialog is open, or a call for the id is in flight
    /// - `BoardError::StoreUnavailable` if an auto-approved store call fails
    pub async fn request(
        &self,
        kind: TransitionKind,
        id: &ProgramId,
    ) -> Result<TransitionReport, BoardError> {
        match self.try_request(kind, id).await {
            Ok(report) => Ok(report),
            Err(err) => {
                self.settle_failure(&err, Some(kind), Some(id)).await;
                Err(err)
            }
        }
    }

    async fn try_request(
        &self,
        kind: TransitionKind,
        id: &ProgramId,
    ) -> Result<TransitionReport, BoardError> {
        let record = self
            .snapshot
            .lock()
            .find(id)
            .cloned()
            .ok_or_else(|| BoardError::NotFound(id.clone()))?;

        if let Some(required) = kind.required_origin() {
            if record.membership != required {
                return Err(BoardError::invalid(format!(
                    "{id} is {}, {kind} needs {required}",
                    record.membership
                )));
            }
        }

        if self.in_flight.contains(id) {
            return Err(BoardError::invalid(format!("{id} has a change in flight")));
        }

        match self.guard.request_transition(kind, &record)? {
            Outcome::AutoApproved => self.execute(kind, &record).await,
            Outcome::AwaitingConfirmation(request) => {
                self.emit(BoardSignal::DialogOpened(request.clone()));
                Ok(TransitionReport::AwaitingConfirmation(request))
            }
        }
    }

    // ---- dialog responses ----

    /// User confirmed the open dialog
    ///
    /// # Errors
    /// - `BoardError::InvalidTransition` if no dialog is open
    /// - `BoardError::StoreUnavailable` if the flag or the store write fails
    /// - `BoardError::NotFound` if the record vanished meanwhile
    pub async fn confirm(&self) -> Result<TransitionReport, BoardError> {
        let pending = self.guard.pending();
        let kind = pending.as_ref().map(|r| r.kind);
        let subject = pending.as_ref().map(|r| r.subject().clone());

        let result = match self.guard.confirm().await {
            Ok(request) => {
                self.emit(BoardSignal::DialogClosed);
                self.execute(request.kind, &request.record).await
            }
            Err(e) => Err(BoardError::from(e)),
        };

        if let Err(err) = &result {
            self.settle_failure(err, kind, subject.as_ref()).await;
        }
        result
    }

    /// User declined the open dialog
    ///
    /// # Errors
    /// - `BoardError::InvalidTransition` if no dialog is open
    pub fn decline(&self) -> Result<TransitionReport, BoardError> {
        match self.guard.decline() {
            Some(_) => {
                self.emit(BoardSignal::DialogClosed);
                Ok(TransitionReport::Declined)
            }
            None => Err(BoardError::invalid("no confirmation is pending")),
        }
    }

    /// User dismissed the open dialog without choosing
    ///
    /// Behaves as [`ProgramBoard::decline`] but reports the silent
    /// `ConfirmationAbandoned`.
    ///
    /// # Errors
    /// - `BoardError::ConfirmationAbandoned` when a dialog was closed
    /// - `BoardError::InvalidTransition` if no dialog is open
    pub fn dismiss(&self) -> Result<TransitionReport, BoardError> {
        self.decline()?;
        tracing::debug!("confirmation abandoned");
        Err(BoardError::ConfirmationAbandoned)
    }

    /// Repeat the last transition that failed transiently
    ///
    /// The retry goes through the guard again. A retry that is turned away
    /// or fails transiently keeps the failure remembered.
    ///
    /// # Errors
    /// - `BoardError::InvalidTransition` if nothing is waiting for a retry
    /// - anything [`ProgramBoard::request`] reports
    pub async fn retry_last_failure(&self) -> Result<TransitionReport, BoardError> {
        let last = self.last_failure.lock().clone();
        let Some((kind, id)) = last else {
            return Err(BoardError::invalid("nothing to retry"));
        };

        let result = self.request(kind, &id).await;
        let settled = match &result {
            Ok(_) | Err(BoardError::NotFound(_) | BoardError::ConfirmationAbandoned) => true,
            Err(BoardError::InvalidTransition(_) | BoardError::StoreUnavailable(_)) => false,
        };
        if settled {
            let mut last = self.last_failure.lock();
            if last.as_ref() == Some(&(kind, id)) {
                *last = None;
            }
        }
        result
    }

    /// Ask the layout to open the program browser
    pub fn browse_programs(&self) {
        self.emit(BoardSignal::NavigateToBrowse);
    }

    // ---- rendering ----

    /// Build the render model
    #[must_use]
    pub fn view(&self, filter: &SavedFilter) -> BoardView {
        let snapshot = self.snapshot.lock().clone();
        let drag = self.drag.lock().clone();
        let dragged = drag.state().dragged_id().cloned();
        let hover = drag.state().hover_zone();

        let preview = dragged
            .as_ref()
            .and_then(|id| snapshot.find(id))
            .map(|record| DragPreview {
                record: record.clone(),
                at: drag.pointer(),
            });

        let without_dragged = |records: &[ProgramRecord]| -> Vec<ProgramRecord> {
            records
                .iter()
                .filter(|r| Some(&r.id) != dragged.as_ref())
                .cloned()
                .collect()
        };

        let saved = sort::narrow_saved(
            &without_dragged(snapshot.saved.as_slice()),
            filter,
            self.config.default_saved_order,
        );
        let targets = sort::order_targets(&without_dragged(snapshot.targets.as_slice()));

        let zone_view = |zone: ZoneId, records: Vec<ProgramRecord>, total: usize| ZoneView {
            zone,
            cards: records
                .into_iter()
                .map(|record| CardView {
                    pending: self.in_flight.contains(&record.id),
                    record,
                })
                .collect(),
            is_empty: total == 0,
            highlighted: hover == Some(zone),
        };

        let display_name = self.profile.as_ref().and_then(|p| p.display_name());

        BoardView {
            header: BoardHeader::new(display_name, snapshot.saved.len(), snapshot.targets.len()),
            saved: zone_view(ZoneId::Saved, saved, snapshot.saved.len()),
            target: zone_view(ZoneId::Target, targets, snapshot.targets.len()),
            preview,
            dialog: self.guard.pending(),
        }
    }

    // ---- internals ----

    async fn execute(
        &self,
        kind: TransitionKind,
        record: &ProgramRecord,
    ) -> Result<TransitionReport, BoardError> {
        let id = &record.id;
        let _flight = InFlight::enter(&self.in_flight, id)
            .ok_or_else(|| BoardError::invalid(format!("{id} has a change in flight")))?;

        let result = match kind {
            TransitionKind::ConvertToTarget => self.store.convert_to_target(id).await,
            TransitionKind::RevertToSaved => self.store.revert_to_saved(id).await,
            TransitionKind::Delete => self.store.remove_program(id, record.is_target()).await,
        };

        match result {
            Ok(()) => {
                tracing::info!(program = %id, %kind, "transition applied");
                {
                    let mut last = self.last_failure.lock();
                    if last.as_ref().is_some_and(|(_, failed)| failed == id) {
                        *last = None;
                    }
                }
                if let Err(e) = self.refresh().await {
                    tracing::warn!(program = %id, error = %e, "refresh after transition failed");
                    self.emit(BoardSignal::Failure(FailureNotice::stale_board(
                        kind,
                        id.clone(),
                    )));
                }
                Ok(TransitionReport::Applied {
                    kind,
                    id: id.clone(),
                })
            }
            Err(e) if e.is_already_there() => {
                // the store is ahead of the snapshot
                tracing::debug!(program = %id, %kind, error = %e, "store already applied transition");
                if let Err(refresh) = self.refresh().await {
                    tracing::warn!(program = %id, error = %refresh, "refresh after conflict failed");
                }
                Err(BoardError::from(e))
            }
            Err(e) => {
                tracing::warn!(program = %id, %kind, error = %e, "store rejected transition");
                Err(BoardError::from(e))
            }
        }
    }

    async fn settle_failure(
        &self,
        err: &BoardError,
        kind: Option<TransitionKind>,
        subject: Option<&ProgramId>,
    ) {
        if err.is_silent() {
            tracing::debug!(error = %err, "transition ignored");
            return;
        }

        if matches!(err, BoardError::NotFound(_)) && self.config.refresh_on_not_found {
            if let Err(e) = self.refresh().await {
                tracing::warn!(error = %e, "refresh after missing program failed");
            }
        }

        // an open dialog is answered again rather than retried
        if err.is_retryable() && !self.guard.dialog().is_open() {
            if let (Some(kind), Some(id)) = (kind, subject) {
                *self.last_failure.lock() = Some((kind, id.clone()));
            }
        }

        self.emit(BoardSignal::Failure(FailureNotice::from_error(
            err,
            kind,
            subject.cloned(),
        )));
    }

    fn emit(&self, signal: BoardSignal) {
        if self.signals.send(signal).is_err() {
            tracing::trace!("signal receiver dropped");
        }
    }
}

impl std::fmt::Debug for ProgramBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.snapshot.lock();
        f.debug_struct("ProgramBoard")
            .field("config", &self.config)
            .field("guard", &self.guard)
            .field("drag", &*self.drag.lock())
            .field("saved", &snapshot.saved.len())
            .field("targets", &snapshot.targets.len())
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_record::ReferenceData;
    use pathway_store::{InMemoryCollectionStore, InMemoryFlagStore, StoreError};

    fn record(id: &str, membership: Membership) -> ProgramRecord {
        ProgramRecord::new(id, membership, ReferenceData::new(id, "School"))
    }

    async fn board(
        records: Vec<ProgramRecord>,
        seen: bool,
    ) -> (ProgramBoard, Arc<InMemoryCollectionStore>, SignalReceiver) {
        let store = Arc::new(InMemoryCollectionStore::with_records(records));
        let flags = Arc::new(InMemoryFlagStore::with_flag(
            crate::config::DEFAULT_FLAG_KEY,
            seen,
        ));
        let (board, rx) = ProgramBoard::new(BoardConfig::default(), store.clone(), flags);
        board.load().await.unwrap();
        (board, store, rx)
    }

    #[tokio::test]
    async fn load_reads_snapshot() {
        let (board, _, _) = board(
            vec![record("p1", Membership::Saved), record("p2", Membership::Target)],
            false,
        )
        .await;

        assert_eq!(board.membership_of(&"p1".into()), Some(Membership::Saved));
        assert_eq!(board.membership_of(&"p2".into()), Some(Membership::Target));
        assert!(!board.has_seen_explanation());
    }

    #[tokio::test]
    async fn wrong_origin_is_silent_invalid() {
        let (board, _, mut rx) = board(vec![record("p1", Membership::Target)], true).await;

        let result = board.make_target(&"p1".into()).await;
        assert!(matches!(result, Err(BoardError::InvalidTransition(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_id_reports_not_found() {
        let (board, _, mut rx) = board(vec![], true).await;

        let result = board.delete(&"ghost".into()).await;
        assert_eq!(result, Err(BoardError::NotFound("ghost".into())));
        assert!(matches!(rx.try_recv(), Ok(BoardSignal::Failure(_))));
    }

    #[tokio::test]
    async fn store_not_found_refreshes_snapshot() {
        let (board, store, mut rx) = board(vec![record("p1", Membership::Target)], true).await;

        // removed behind the board's back
        store.remove_program(&"p1".into(), true).await.unwrap();
        board.delete(&"p1".into()).await.unwrap();
        let _ = rx.try_recv();

        let result = board.confirm().await;
        assert_eq!(result, Err(BoardError::NotFound("p1".into())));
        assert_eq!(board.membership_of(&"p1".into()), None);
    }

    #[tokio::test]
    async fn outage_keeps_membership_and_allows_retry() {
        let (board, store, mut rx) = board(vec![record("p1", Membership::Saved)], true).await;
        store.set_unavailable("offline");

        let result = board.make_target(&"p1".into()).await;
        assert!(matches!(result, Err(BoardError::StoreUnavailable(_))));
        assert_eq!(board.membership_of(&"p1".into()), Some(Membership::Saved));
        match rx.try_recv() {
            Ok(BoardSignal::Failure(notice)) => assert!(notice.retryable),
            other => panic!("expected failure notice, got {other:?}"),
        }

        store.restore();
        let retried = board.retry_last_failure().await.unwrap();
        assert!(matches!(retried, TransitionReport::Applied { .. }));
        assert_eq!(board.membership_of(&"p1".into()), Some(Membership::Target));
        assert!(board.retry_last_failure().await.is_err());
    }

    #[tokio::test]
    async fn dismiss_is_abandoned_and_closes_dialog() {
        let (board, _, mut rx) = board(vec![record("p1", Membership::Target)], true).await;

        board.move_to_saved(&"p1".into()).await.unwrap();
        assert!(matches!(rx.try_recv(), Ok(BoardSignal::DialogOpened(_))));

        assert_eq!(board.dismiss(), Err(BoardError::ConfirmationAbandoned));
        assert!(matches!(rx.try_recv(), Ok(BoardSignal::DialogClosed)));
        assert!(!board.dialog().is_open());
        assert!(matches!(board.dismiss(), Err(BoardError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn view_hides_dragged_record_and_shows_preview() {
        let (board, _, _) = board(
            vec![record("p1", Membership::Saved), record("p2", Membership::Saved)],
            true,
        )
        .await;

        let start = board.zones().bounds(ZoneId::Saved).center();
        assert!(board.press(&"p1".into(), start));
        board.pointer_move(Point::new(start.x + 50.0, start.y));

        let view = board.view(&SavedFilter::new());
        assert!(!view.saved.contains(&"p1".into()));
        assert!(view.saved.contains(&"p2".into()));
        assert_eq!(view.preview.as_ref().map(|p| p.record.id.as_str()), Some("p1"));
        assert!(view.saved.highlighted);
        assert_eq!(view.header.saved_count, 2);
    }

    #[tokio::test]
    async fn empty_zone_and_browse_signal() {
        let (board, _, mut rx) = board(vec![record("p1", Membership::Saved)], true).await;

        let view = board.view(&SavedFilter::new());
        assert!(view.target.is_empty);
        assert!(!view.saved.is_empty);

        board.browse_programs();
        assert_eq!(rx.try_recv().ok(), Some(BoardSignal::NavigateToBrowse));
    }

    #[tokio::test]
    async fn in_flight_guard_releases_on_drop() {
        let set = DashSet::new();
        let id = ProgramId::from("p1");
        {
            let _held = InFlight::enter(&set, &id).unwrap();
            assert!(InFlight::enter(&set, &id).is_none());
        }
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn retry_survives_an_unrelated_dialog() {
        let (board, store, _rx) = board(
            vec![record("p1", Membership::Saved), record("p2", Membership::Saved)],
            true,
        )
        .await;

        store.set_unavailable("offline");
        assert!(board.make_target(&"p1".into()).await.is_err());
        store.restore();

        board.delete(&"p2".into()).await.unwrap();
        let blocked = board.retry_last_failure().await;
        assert!(matches!(blocked, Err(BoardError::InvalidTransition(_))));

        board.decline().unwrap();
        let retried = board.retry_last_failure().await.unwrap();
        assert_eq!(
            retried,
            TransitionReport::Applied {
                kind: TransitionKind::ConvertToTarget,
                id: "p1".into(),
            }
        );
        assert_eq!(board.membership_of(&"p1".into()), Some(Membership::Target));
        assert!(board.retry_last_failure().await.is_err());
    }

    #[tokio::test]
    async fn retry_during_second_outage_is_kept() {
        let (board, store, _rx) = board(vec![record("p1", Membership::Saved)], true).await;

        store.set_unavailable("offline");
        assert!(board.make_target(&"p1".into()).await.is_err());
        assert!(matches!(
            board.retry_last_failure().await,
            Err(BoardError::StoreUnavailable(_))
        ));

        store.restore();
        assert!(board.retry_last_failure().await.is_ok());
        assert_eq!(board.membership_of(&"p1".into()), Some(Membership::Target));
    }

    #[tokio::test]
    async fn removed_behind_the_board_settles_after_second_read() {
        let (board, store, _rx) = board(
            vec![record("p1", Membership::Saved), record("p2", Membership::Target)],
            true,
        )
        .await;

        store.remove_program(&"p1".into(), false).await.unwrap();
        board.refresh().await.unwrap();

        assert_eq!(board.membership_of(&"p1".into()), None);
        assert_eq!(board.membership_of(&"p2".into()), Some(Membership::Target));
    }

    #[test]
    fn store_error_mapping_is_used() {
        let err: BoardError = StoreError::AlreadySaved("p1".into()).into();
        assert!(err.is_silent());
    }
}
