//! Seeded gesture simulator
//!
//! Drives a [`ProgramBoard`] with random presses, moves, releases, explicit
//! actions, dialog answers and store outages, then checks after every step:
//! - no id is in both collections
//! - clicks, cancels and same-zone drops never mutate the store
//! - the first Saved-to-Target conversion, every revert and every delete
//!   wait for a confirmation
//! - the explanation flag is only set by a confirm
//! - a failed store call leaves membership untouched
//! - the board snapshot matches the store after each step

use crate::board::{GestureReport, ProgramBoard, TransitionReport};
use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::guard::TransitionKind;
use crate::signal::BoardSignal;
use crate::zones::{Point, ZoneId};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use pathway_record::{Membership, ProgramId, ProgramRecord, ReferenceData};
use pathway_store::{CollectionStore, InMemoryCollectionStore, InMemoryFlagStore, StoreError};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

const PROGRAMS: [&str; 6] = [
    "Physician Assistant MS",
    "Doctor of Physical Therapy",
    "Occupational Therapy MS",
    "Nursing DNP",
    "Public Health MPH",
    "Speech-Language Pathology MS",
];

const SCHOOLS: [&str; 5] = [
    "Lakeside University",
    "Hill College",
    "Madison Tech",
    "Northern State",
    "Coastal Institute",
];

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Operations to run
    pub steps: u64,
    /// Records seeded into the store
    pub records: usize,
    /// Chance per step that the store goes offline
    pub failure_rate: f64,
    /// Stop at the first violation
    pub stop_on_first_violation: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: 1000,
            records: 12,
            failure_rate: 0.05,
            stop_on_first_violation: true,
        }
    }
}

/// One simulated user or environment action
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedOperation {
    /// Press, move past the threshold, release over `to` (`None` = outside)
    Drag {
        /// Dragged record
        id: ProgramId,
        /// Release zone
        to: Option<ZoneId>,
    },
    /// Press and release without moving far
    Click(ProgramId),
    /// Press, move, then cancel
    Cancel(ProgramId),
    /// Button action on a card
    Action(TransitionKind, ProgramId),
    /// Confirm the dialog
    Confirm,
    /// Decline the dialog
    Decline,
    /// Dismiss the dialog
    Dismiss,
    /// Retry the last failure
    Retry,
    /// A new program saved from the browser
    Add(ProgramRecord),
    /// Store goes offline
    Outage,
    /// Store comes back
    Restore,
}

/// Invariant broken during a run
#[derive(Debug, Clone)]
pub enum Violation {
    /// Id listed in both collections
    OverlappingMembership {
        /// Offending id
        id: ProgramId,
    },
    /// Store mutated by a gesture that must not mutate
    UnexpectedMutation {
        /// Operation
        operation: SimulatedOperation,
        /// Mutations observed
        mutations: u64,
    },
    /// Transition applied without the required confirmation
    ConfirmationSkipped {
        /// Operation
        operation: SimulatedOperation,
        /// Transition applied
        kind: TransitionKind,
    },
    /// Explanation flag set by something other than a confirm
    FlagSetWithoutConfirm {
        /// Operation
        operation: SimulatedOperation,
    },
    /// Membership changed although the store call failed
    MembershipChangedOnFailure {
        /// Operation
        operation: SimulatedOperation,
    },
    /// Board snapshot and store disagree
    SnapshotOutOfSync {
        /// Operation after which the mismatch appeared
        operation: SimulatedOperation,
    },
    /// Error that a single user can never cause
    UnexpectedError {
        /// Operation
        operation: SimulatedOperation,
        /// Error text
        error: String,
    },
}

/// Counters for a run
#[derive(Debug, Clone, Default)]
pub struct SimulatorStats {
    /// Operations executed
    pub steps: u64,
    /// Drags released over a zone
    pub drags: u64,
    /// Clicks
    pub clicks: u64,
    /// Gestures cancelled or released outside every zone
    pub cancels: u64,
    /// Dialogs opened
    pub dialogs_opened: u64,
    /// Transitions the store applied
    pub transitions_applied: u64,
    /// Requests rejected silently
    pub silent_rejections: u64,
    /// Transitions failed on an unavailable store
    pub store_failures: u64,
    /// Failure notices emitted
    pub failure_notices: u64,
    /// Store mutations observed
    pub store_mutations: u64,
}

impl SimulatorStats {
    fn record_gesture(&mut self, operation: &SimulatedOperation, report: &GestureReport) {
        match (operation, report) {
            (SimulatedOperation::Cancel(_), _) | (_, GestureReport::Cancelled) => self.cancels += 1,
            (_, GestureReport::Click(_)) => self.clicks += 1,
            (_, GestureReport::Unchanged | GestureReport::Transition(_)) => self.drags += 1,
            (_, GestureReport::Ignored) => {}
        }
    }
}

/// Final report
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    /// Configuration used
    pub config: SimulatorConfig,
    /// Counters
    pub stats: SimulatorStats,
    /// Violations found
    pub violations: Vec<Violation>,
    /// Final (saved, target) sizes
    pub final_counts: (usize, usize),
}

impl SimulatorReport {
    /// Check if no invariant was broken
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Program Board Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Steps: {}\n", self.stats.steps));
        report.push_str(&format!("Drags: {}\n", self.stats.drags));
        report.push_str(&format!("Clicks: {}\n", self.stats.clicks));
        report.push_str(&format!("Cancels: {}\n", self.stats.cancels));
        report.push_str(&format!("Dialogs Opened: {}\n", self.stats.dialogs_opened));
        report.push_str(&format!("Transitions Applied: {}\n", self.stats.transitions_applied));
        report.push_str(&format!("Silent Rejections: {}\n", self.stats.silent_rejections));
        report.push_str(&format!("Store Failures: {}\n", self.stats.store_failures));
        report.push_str(&format!("Failure Notices: {}\n", self.stats.failure_notices));
        report.push_str(&format!("Store Mutations: {}\n", self.stats.store_mutations));
        report.push_str(&format!(
            "Final Collections: {} saved, {} target\n",
            self.final_counts.0, self.final_counts.1
        ));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));
        report
    }
}

/// In-memory store that counts successful mutations
#[derive(Debug)]
pub struct AuditedStore {
    inner: InMemoryCollectionStore,
    mutations: AtomicU64,
}

impl AuditedStore {
    /// Wrap a seeded store
    #[must_use]
    pub fn new(inner: InMemoryCollectionStore) -> Self {
        Self {
            inner,
            mutations: AtomicU64::new(0),
        }
    }

    /// Wrapped store
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &InMemoryCollectionStore {
        &self.inner
    }

    /// Successful mutations so far
    #[inline]
    #[must_use]
    pub fn mutations(&self) -> u64 {
        self.mutations.load(Ordering::SeqCst)
    }

    fn count(&self, result: Result<(), StoreError>) -> Result<(), StoreError> {
        if result.is_ok() {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        }
        result
    }
}

#[async_trait]
impl CollectionStore for AuditedStore {
    async fn list_saved(&self) -> Result<Vec<ProgramRecord>, StoreError> {
        self.inner.list_saved().await
    }

    async fn list_targets(&self) -> Result<Vec<ProgramRecord>, StoreError> {
        self.inner.list_targets().await
    }

    async fn convert_to_target(&self, id: &ProgramId) -> Result<(), StoreError> {
        let result = self.inner.convert_to_target(id).await;
        self.count(result)
    }

    async fn revert_to_saved(&self, id: &ProgramId) -> Result<(), StoreError> {
        let result = self.inner.revert_to_saved(id).await;
        self.count(result)
    }

    async fn remove_program(&self, id: &ProgramId, was_target: bool) -> Result<(), StoreError> {
        let result = self.inner.remove_program(id, was_target).await;
        self.count(result)
    }
}

#[derive(Debug)]
enum StepOutcome {
    Gesture(GestureReport),
    Transition(TransitionReport),
    Done,
}

/// Run the simulator
pub async fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let seeded: Vec<ProgramRecord> = (0..config.records)
        .map(|_| random_record(&mut rng, Membership::Saved))
        .collect();

    let store = Arc::new(AuditedStore::new(InMemoryCollectionStore::with_records(seeded)));
    let flags = Arc::new(InMemoryFlagStore::new());
    let (board, mut signals) = ProgramBoard::new(BoardConfig::default(), store.clone(), flags);

    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();
    let mut offline = false;

    if let Err(e) = board.load().await {
        violations.push(Violation::UnexpectedError {
            operation: SimulatedOperation::Restore,
            error: e.to_string(),
        });
    }

    for _ in 0..config.steps {
        if !violations.is_empty() && config.stop_on_first_violation {
            break;
        }

        let operation = generate_operation(&mut rng, &board, offline, config.failure_rate);
        stats.steps += 1;

        let before = memberships(&store.inner().records());
        let mutations_before = store.mutations();
        let seen_before = board.has_seen_explanation();

        let result = apply(&board, &store, &operation, &mut offline).await;

        while let Ok(signal) = signals.try_recv() {
            match signal {
                BoardSignal::Failure(_) => stats.failure_notices += 1,
                BoardSignal::DialogOpened(_) => stats.dialogs_opened += 1,
                BoardSignal::NavigateToBrowse | BoardSignal::DialogClosed => {}
            }
        }

        let after = memberships(&store.inner().records());
        let mutated = store.mutations() - mutations_before;

        match &result {
            Ok(StepOutcome::Gesture(report)) => {
                stats.record_gesture(&operation, report);
                if let GestureReport::Transition(t) = report {
                    check_request(&operation, t, seen_before, &mut violations);
                }
            }
            Ok(StepOutcome::Transition(t)) => {
                if !matches!(operation, SimulatedOperation::Confirm) {
                    check_request(&operation, t, seen_before, &mut violations);
                }
            }
            Ok(StepOutcome::Done) => {}
            Err(BoardError::StoreUnavailable(_)) if offline => {
                stats.store_failures += 1;
                if before != after {
                    violations.push(Violation::MembershipChangedOnFailure {
                        operation: operation.clone(),
                    });
                }
            }
            Err(e) if e.is_silent() => stats.silent_rejections += 1,
            Err(e) => violations.push(Violation::UnexpectedError {
                operation: operation.clone(),
                error: e.to_string(),
            }),
        }

        if let Ok(StepOutcome::Gesture(
            GestureReport::Click(_)
            | GestureReport::Cancelled
            | GestureReport::Unchanged
            | GestureReport::Ignored,
        )) = &result
        {
            if mutated > 0 {
                violations.push(Violation::UnexpectedMutation {
                    operation: operation.clone(),
                    mutations: mutated,
                });
            }
        }

        if matches!(
            &result,
            Ok(StepOutcome::Transition(TransitionReport::Applied { .. })
                | StepOutcome::Gesture(GestureReport::Transition(TransitionReport::Applied { .. })))
        ) {
            stats.transitions_applied += 1;
        }

        if !seen_before
            && board.has_seen_explanation()
            && !matches!(operation, SimulatedOperation::Confirm)
        {
            violations.push(Violation::FlagSetWithoutConfirm {
                operation: operation.clone(),
            });
        }

        let saved = board.records(Membership::Saved);
        let targets = board.records(Membership::Target);
        if let Some(id) = saved
            .iter()
            .find(|s| targets.iter().any(|t| t.id == s.id))
            .map(|r| r.id.clone())
        {
            violations.push(Violation::OverlappingMembership { id });
        }

        let snapshot = memberships(&saved.into_iter().chain(targets).collect::<Vec<_>>());
        if !offline && snapshot != after {
            violations.push(Violation::SnapshotOutOfSync { operation });
        }
    }

    stats.store_mutations = store.mutations();
    let final_counts = (
        board.records(Membership::Saved).len(),
        board.records(Membership::Target).len(),
    );
    tracing::info!(
        seed = config.seed,
        steps = stats.steps,
        violations = violations.len(),
        "simulation finished"
    );

    SimulatorReport {
        config,
        stats,
        violations,
        final_counts,
    }
}

fn check_request(
    operation: &SimulatedOperation,
    report: &TransitionReport,
    seen_before: bool,
    violations: &mut Vec<Violation>,
) {
    if let TransitionReport::Applied { kind, .. } = report {
        let needed_confirmation = match kind {
            TransitionKind::ConvertToTarget => !seen_before,
            TransitionKind::RevertToSaved | TransitionKind::Delete => true,
        };
        if needed_confirmation {
            violations.push(Violation::ConfirmationSkipped {
                operation: operation.clone(),
                kind: *kind,
            });
        }
    }
}

fn memberships(records: &[ProgramRecord]) -> BTreeMap<ProgramId, Membership> {
    records
        .iter()
        .map(|r| (r.id.clone(), r.membership))
        .collect()
}

fn generate_operation(
    rng: &mut StdRng,
    board: &ProgramBoard,
    offline: bool,
    failure_rate: f64,
) -> SimulatedOperation {
    if offline && rng.gen_bool(0.3) {
        return SimulatedOperation::Restore;
    }
    if !offline && rng.gen_bool(failure_rate.clamp(0.0, 1.0)) {
        return SimulatedOperation::Outage;
    }
    if board.dialog().is_open() && rng.gen_bool(0.7) {
        return match rng.gen_range(0..4) {
            0 | 1 => SimulatedOperation::Confirm,
            2 => SimulatedOperation::Decline,
            _ => SimulatedOperation::Dismiss,
        };
    }

    let mut records = board.records(Membership::Saved);
    records.extend(board.records(Membership::Target));
    if records.is_empty() || rng.gen_bool(0.05) {
        return SimulatedOperation::Add(random_record(rng, Membership::Saved));
    }

    let id = records[rng.gen_range(0..records.len())].id.clone();
    match rng.gen_range(0..10) {
        0..=3 => {
            let to = match rng.gen_range(0..5) {
                0 => None,
                1 | 2 => Some(ZoneId::Target),
                _ => Some(ZoneId::Saved),
            };
            SimulatedOperation::Drag { id, to }
        }
        4 => SimulatedOperation::Click(id),
        5 => SimulatedOperation::Cancel(id),
        6 => SimulatedOperation::Retry,
        _ => {
            let kind = match rng.gen_range(0..3) {
                0 => TransitionKind::ConvertToTarget,
                1 => TransitionKind::RevertToSaved,
                _ => TransitionKind::Delete,
            };
            SimulatedOperation::Action(kind, id)
        }
    }
}

async fn apply(
    board: &ProgramBoard,
    store: &AuditedStore,
    operation: &SimulatedOperation,
    offline: &mut bool,
) -> Result<StepOutcome, BoardError> {
    match operation {
        SimulatedOperation::Drag { id, to } => {
            let start = origin_point(board, id);
            board.press(id, start);
            let end = match to {
                Some(zone) => {
                    let c = board.zones().bounds(*zone).center();
                    // same-zone drops still need to clear the threshold
                    Point::new(c.x + 40.0, c.y + 40.0)
                }
                None => Point::new(-100.0, -100.0),
            };
            board.pointer_move(end);
            board.release().await.map(StepOutcome::Gesture)
        }
        SimulatedOperation::Click(id) => {
            let start = origin_point(board, id);
            board.press(id, start);
            board.pointer_move(Point::new(start.x + 2.0, start.y + 1.0));
            board.release().await.map(StepOutcome::Gesture)
        }
        SimulatedOperation::Cancel(id) => {
            let start = origin_point(board, id);
            board.press(id, start);
            board.pointer_move(Point::new(start.x + 60.0, start.y));
            board.cancel_drag();
            board.release().await.map(StepOutcome::Gesture)
        }
        SimulatedOperation::Action(kind, id) => {
            board.request(*kind, id).await.map(StepOutcome::Transition)
        }
        SimulatedOperation::Confirm => board.confirm().await.map(StepOutcome::Transition),
        SimulatedOperation::Decline => board.decline().map(StepOutcome::Transition),
        SimulatedOperation::Dismiss => board.dismiss().map(StepOutcome::Transition),
        SimulatedOperation::Retry => board
            .retry_last_failure()
            .await
            .map(StepOutcome::Transition),
        SimulatedOperation::Add(record) => {
            store.inner().insert(record.clone());
            if *offline {
                // picked up by the first refresh after the outage
                return Ok(StepOutcome::Done);
            }
            board.refresh().await.map(|()| StepOutcome::Done)
        }
        SimulatedOperation::Outage => {
            store.inner().set_unavailable("simulated outage");
            *offline = true;
            Ok(StepOutcome::Done)
        }
        SimulatedOperation::Restore => {
            store.inner().restore();
            *offline = false;
            board.refresh().await.map(|()| StepOutcome::Done)
        }
    }
}

fn origin_point(board: &ProgramBoard, id: &ProgramId) -> Point {
    let zone = board
        .membership_of(id)
        .map_or(ZoneId::Saved, ZoneId::for_membership);
    board.zones().bounds(zone).center()
}

fn random_record(rng: &mut StdRng, membership: Membership) -> ProgramRecord {
    let mut data = ReferenceData::new(
        PROGRAMS[rng.gen_range(0..PROGRAMS.len())],
        SCHOOLS[rng.gen_range(0..SCHOOLS.len())],
    )
    .with_progress(rng.gen_range(0..=100));

    if rng.gen_bool(0.7) {
        let deadline = NaiveDate::from_ymd_opt(2026, 1, 1)
            .and_then(|base| base.checked_add_days(Days::new(rng.gen_range(0..365))));
        if let Some(deadline) = deadline {
            data = data.with_deadline(deadline);
        }
    }

    let id = ProgramId::from(format!("sim-{:08x}", rng.gen::<u32>()));
    ProgramRecord::new(id, membership, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_run_passes() {
        let report = run_simulator(SimulatorConfig {
            steps: 300,
            ..SimulatorConfig::default()
        })
        .await;

        assert!(report.passed(), "{}", report.generate_text());
        assert_eq!(report.stats.steps, 300);
    }

    #[test]
    fn gestures_are_counted_by_what_happened() {
        let id = ProgramId::from("p1");
        let mut stats = SimulatorStats::default();

        stats.record_gesture(&SimulatedOperation::Cancel(id.clone()), &GestureReport::Ignored);
        stats.record_gesture(
            &SimulatedOperation::Drag {
                id: id.clone(),
                to: None,
            },
            &GestureReport::Cancelled,
        );
        stats.record_gesture(
            &SimulatedOperation::Drag {
                id: id.clone(),
                to: Some(ZoneId::Saved),
            },
            &GestureReport::Unchanged,
        );
        stats.record_gesture(&SimulatedOperation::Click(id.clone()), &GestureReport::Click(id));

        assert_eq!(stats.cancels, 2);
        assert_eq!(stats.drags, 1);
        assert_eq!(stats.clicks, 1);
    }

    #[tokio::test]
    async fn same_seed_same_report() {
        let config = SimulatorConfig {
            seed: 7,
            steps: 200,
            ..SimulatorConfig::default()
        };
        let a = run_simulator(config.clone()).await;
        let b = run_simulator(config).await;

        assert_eq!(a.final_counts, b.final_counts);
        assert_eq!(a.stats.store_mutations, b.stats.store_mutations);
    }

    #[tokio::test]
    async fn outages_are_survived() {
        let report = run_simulator(SimulatorConfig {
            seed: 3,
            steps: 400,
            failure_rate: 0.3,
            ..SimulatorConfig::default()
        })
        .await;

        assert!(report.passed(), "{}", report.generate_text());
        assert!(report.generate_text().contains("Result: PASS"));
    }
}
