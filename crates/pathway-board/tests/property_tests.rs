use pathway_board::{GestureReport, TransitionKind, TransitionReport, ZoneId};
use pathway_record::{Membership, ProgramId, ProgramRecord};
use pathway_test_utils::{board_with, dated, saved, TestBoard};
use proptest::prelude::*;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Drag(usize, Option<ZoneId>),
    Click(usize),
    Action(TransitionKind, usize),
    Confirm,
    Decline,
}

fn op() -> impl Strategy<Value = Op> {
    let zone = prop_oneof![
        Just(None),
        Just(Some(ZoneId::Saved)),
        Just(Some(ZoneId::Target)),
    ];
    let kind = prop_oneof![
        Just(TransitionKind::ConvertToTarget),
        Just(TransitionKind::RevertToSaved),
        Just(TransitionKind::Delete),
    ];
    prop_oneof![
        (0..5usize, zone).prop_map(|(i, z)| Op::Drag(i, z)),
        (0..5usize).prop_map(Op::Click),
        (kind, 0..5usize).prop_map(|(k, i)| Op::Action(k, i)),
        Just(Op::Confirm),
        Just(Op::Decline),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn records() -> Vec<ProgramRecord> {
    (0..5)
        .map(|i| {
            let membership = if i % 2 == 0 {
                Membership::Saved
            } else {
                Membership::Target
            };
            dated(&format!("p{i}"), membership, Some("2026-03-01"))
        })
        .collect()
}

async fn apply(t: &TestBoard, op: &Op) {
    match op {
        Op::Drag(i, zone) => {
            let _ = t.drag(&format!("p{i}"), *zone).await;
        }
        Op::Click(i) => {
            let _ = t.click(&format!("p{i}")).await;
        }
        Op::Action(kind, i) => {
            let _ = t.board.request(*kind, &ProgramId::from(format!("p{i}"))).await;
        }
        Op::Confirm => {
            let _ = t.board.confirm().await;
        }
        Op::Decline => {
            let _ = t.board.decline();
        }
    }
}

fn assert_consistent(t: &TestBoard) {
    let saved = t.board.records(Membership::Saved);
    let targets = t.board.records(Membership::Target);

    let saved_ids: HashSet<_> = saved.iter().map(|r| r.id.clone()).collect();
    assert!(targets.iter().all(|r| !saved_ids.contains(&r.id)));

    for record in saved.iter().chain(targets.iter()) {
        assert_eq!(
            t.store.inner().get(&record.id).map(|r| r.membership),
            Some(record.membership)
        );
    }
    assert_eq!(saved.len() + targets.len(), t.store.inner().len());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_membership_stays_exclusive_and_in_sync(
        ops in prop::collection::vec(op(), 1..40),
        seen in any::<bool>(),
    ) {
        runtime().block_on(async {
            let t = board_with(records(), seen).await;
            for op in &ops {
                apply(&t, op).await;
                assert_consistent(&t);
            }
        });
    }

    #[test]
    fn prop_non_drops_never_mutate(
        ops in prop::collection::vec(
            prop_oneof![
                (0..5usize).prop_map(|i| Op::Drag(i, None)),
                (0..5usize).prop_map(Op::Click),
                (0..5usize).prop_map(|i| {
                    let own = if i % 2 == 0 { ZoneId::Saved } else { ZoneId::Target };
                    Op::Drag(i, Some(own))
                }),
            ],
            1..30,
        ),
    ) {
        runtime().block_on(async {
            let t = board_with(records(), true).await;
            for op in &ops {
                apply(&t, op).await;
            }
            assert!(t.store.mutations().is_empty());
            assert!(!t.board.dialog().is_open());
        });
    }

    #[test]
    fn prop_unseen_conversion_always_asks(i in 0..5usize, by_drag in any::<bool>()) {
        runtime().block_on(async {
            let mut all = records();
            for r in &mut all {
                r.membership = Membership::Saved;
            }
            let t = board_with(all, false).await;
            let id = format!("p{i}");

            let report = if by_drag {
                match t.drag(&id, Some(ZoneId::Target)).await.unwrap() {
                    GestureReport::Transition(report) => report,
                    other => panic!("unexpected gesture result {other:?}"),
                }
            } else {
                t.board.make_target(&ProgramId::from(id.as_str())).await.unwrap()
            };

            assert!(matches!(report, TransitionReport::AwaitingConfirmation(_)));
            assert!(t.store.mutations().is_empty());
        });
    }

    #[test]
    fn prop_round_trip_restores_saved(name in "[A-Za-z ]{1,24}") {
        runtime().block_on(async {
            let t = board_with(vec![saved("p1", &name)], true).await;
            let before = t.board.records(Membership::Saved);
            let id = ProgramId::from("p1");

            t.board.make_target(&id).await.unwrap();
            t.board.move_to_saved(&id).await.unwrap();
            t.board.confirm().await.unwrap();

            assert_eq!(t.board.records(Membership::Saved), before);
        });
    }
}
