//! Testing utilities for the Pathway workspace
//!
//! Fixtures, a call-recording store with an optional gate on mutations, and
//! helpers that drive a loaded board.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use pathway_board::{
    BoardConfig, BoardError, BoardSignal, GestureReport, Point, ProgramBoard, SignalReceiver,
    ZoneId,
};
use pathway_record::{Membership, ProgramId, ProgramRecord, ReferenceData};
use pathway_store::{CollectionStore, InMemoryCollectionStore, InMemoryFlagStore, StoreError};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const FLAG_KEY: &str = pathway_board::config::DEFAULT_FLAG_KEY;

// ---- fixtures ----

pub fn saved(id: &str, name: &str) -> ProgramRecord {
    ProgramRecord::new(id, Membership::Saved, ReferenceData::new(name, "Test University"))
}

pub fn target(id: &str, name: &str) -> ProgramRecord {
    ProgramRecord::new(id, Membership::Target, ReferenceData::new(name, "Test University"))
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn dated(id: &str, membership: Membership, deadline: Option<&str>) -> ProgramRecord {
    let mut data = ReferenceData::new(id.to_uppercase(), "Test University");
    if let Some(d) = deadline {
        data = data.with_deadline(date(d));
    }
    ProgramRecord::new(id, membership, data)
}

/// Three saved and two target programs
pub fn sample_records() -> Vec<ProgramRecord> {
    vec![
        saved("p1", "Physician Assistant MS"),
        saved("p2", "Doctor of Physical Therapy"),
        saved("p3", "Occupational Therapy MS"),
        dated("t1", Membership::Target, Some("2026-02-01")),
        dated("t2", Membership::Target, None),
    ]
}

// ---- recording store ----

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    ListSaved,
    ListTargets,
    Convert(ProgramId),
    Revert(ProgramId),
    Remove { id: ProgramId, was_target: bool },
}

impl StoreCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, StoreCall::ListSaved | StoreCall::ListTargets)
    }
}

/// In-memory store that records every call
///
/// When gated, mutating calls wait for a permit from [`RecordingStore::open_gate`].
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: InMemoryCollectionStore,
    calls: Mutex<Vec<StoreCall>>,
    gate: Option<Semaphore>,
}

impl RecordingStore {
    pub fn new(records: Vec<ProgramRecord>) -> Self {
        Self {
            inner: InMemoryCollectionStore::with_records(records),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Hold mutating calls until permits are released
    #[must_use]
    pub fn with_gate(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn open_gate(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn inner(&self) -> &InMemoryCollectionStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().clone()
    }

    pub fn mutations(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn membership(&self, id: &str) -> Option<Membership> {
        self.inner.get(&ProgramId::from(id)).map(|r| r.membership)
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().push(call);
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl CollectionStore for RecordingStore {
    async fn list_saved(&self) -> Result<Vec<ProgramRecord>, StoreError> {
        self.record(StoreCall::ListSaved);
        self.inner.list_saved().await
    }

    async fn list_targets(&self) -> Result<Vec<ProgramRecord>, StoreError> {
        self.record(StoreCall::ListTargets);
        self.inner.list_targets().await
    }

    async fn convert_to_target(&self, id: &ProgramId) -> Result<(), StoreError> {
        self.record(StoreCall::Convert(id.clone()));
        self.pass_gate().await;
        self.inner.convert_to_target(id).await
    }

    async fn revert_to_saved(&self, id: &ProgramId) -> Result<(), StoreError> {
        self.record(StoreCall::Revert(id.clone()));
        self.pass_gate().await;
        self.inner.revert_to_saved(id).await
    }

    async fn remove_program(&self, id: &ProgramId, was_target: bool) -> Result<(), StoreError> {
        self.record(StoreCall::Remove {
            id: id.clone(),
            was_target,
        });
        self.pass_gate().await;
        self.inner.remove_program(id, was_target).await
    }
}

// ---- board harness ----

pub struct TestBoard {
    pub board: ProgramBoard,
    pub store: Arc<RecordingStore>,
    pub flags: Arc<InMemoryFlagStore>,
    pub signals: SignalReceiver,
}

impl TestBoard {
    /// Signals emitted since the last drain
    pub fn drain_signals(&mut self) -> Vec<BoardSignal> {
        let mut out = Vec::new();
        while let Ok(signal) = self.signals.try_recv() {
            out.push(signal);
        }
        out
    }

    /// Failure notices emitted since the last drain
    pub fn failures(&mut self) -> usize {
        self.drain_signals()
            .iter()
            .filter(|s| matches!(s, BoardSignal::Failure(_)))
            .count()
    }

    /// Press on the card, move into `to` (or outside), release
    pub async fn drag(&self, id: &str, to: Option<ZoneId>) -> Result<GestureReport, BoardError> {
        let id = ProgramId::from(id);
        let origin = self
            .board
            .membership_of(&id)
            .map_or(ZoneId::Saved, ZoneId::for_membership);
        let start = self.board.zones().bounds(origin).center();
        self.board.press(&id, start);

        let end = match to {
            Some(zone) => {
                let c = self.board.zones().bounds(zone).center();
                Point::new(c.x + 30.0, c.y + 30.0)
            }
            None => Point::new(-50.0, -50.0),
        };
        self.board.pointer_move(end);
        self.board.release().await
    }

    /// Press and release a few pixels away
    pub async fn click(&self, id: &str) -> Result<GestureReport, BoardError> {
        let id = ProgramId::from(id);
        let start = self.board.zones().bounds(ZoneId::Saved).center();
        let start = self
            .board
            .membership_of(&id)
            .map_or(start, |m| self.board.zones().bounds(ZoneId::for_membership(m)).center());
        self.board.press(&id, start);
        self.board.pointer_move(Point::new(start.x + 3.0, start.y + 3.0));
        self.board.release().await
    }
}

pub async fn board_with(records: Vec<ProgramRecord>, seen_explanation: bool) -> TestBoard {
    board_with_store(RecordingStore::new(records), seen_explanation, BoardConfig::default()).await
}

pub async fn board_with_store(
    store: RecordingStore,
    seen_explanation: bool,
    config: BoardConfig,
) -> TestBoard {
    let store = Arc::new(store);
    let flags = Arc::new(InMemoryFlagStore::with_flag(FLAG_KEY, seen_explanation));
    let (board, signals) = ProgramBoard::new(config, store.clone(), flags.clone());
    board.load().await.unwrap();
    store.clear_calls();
    TestBoard {
        board,
        store,
        flags,
        signals,
    }
}
