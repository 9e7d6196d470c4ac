//! Property-based tests for the plan store.
//!
//! These tests drive random operation sequences through the store and
//! verify the invariants hold after every committed or rejected mutation:
//! unique step ids, acyclic dependencies, version-per-event accounting,
//! and exact rollback on failure.

use proptest::prelude::*;

use planloom::core::plan::Plan;
use planloom::core::types::{PlanId, PlanMode, StepId, StepStatus};
use planloom::store::{NewStepSpec, PlanStore, UpdateFields};

fn pid() -> PlanId {
    PlanId::new("prop").unwrap()
}

/// One randomized operation; step references are indices resolved against
/// the current step list at application time.
#[derive(Debug, Clone)]
enum Op {
    Add { depends: Vec<usize>, after: Option<usize> },
    Update { step: usize, priority: i64 },
    DepAdd { step: usize, dep: usize },
    DepRemove { step: usize, dep: usize },
    Remove { step: usize },
    Mark { step: usize, status: u8 },
    Reorder { rotation: usize },
    Undo { steps: usize },
    Redo { steps: usize },
    Snapshot,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (prop::collection::vec(0..8usize, 0..3), prop::option::of(0..8usize))
            .prop_map(|(depends, after)| Op::Add { depends, after }),
        (0..8usize, -5..10i64).prop_map(|(step, priority)| Op::Update { step, priority }),
        (0..8usize, 0..8usize).prop_map(|(step, dep)| Op::DepAdd { step, dep }),
        (0..8usize, 0..8usize).prop_map(|(step, dep)| Op::DepRemove { step, dep }),
        (0..8usize).prop_map(|step| Op::Remove { step }),
        (0..8usize, 0..4u8).prop_map(|(step, status)| Op::Mark { step, status }),
        (0..8usize).prop_map(|rotation| Op::Reorder { rotation }),
        (1..3usize).prop_map(|steps| Op::Undo { steps }),
        (1..3usize).prop_map(|steps| Op::Redo { steps }),
        Just(Op::Snapshot),
    ]
}

fn step_at(plan: &Plan, index: usize) -> Option<StepId> {
    if plan.steps.is_empty() {
        None
    } else {
        Some(plan.steps[index % plan.steps.len()].id.clone())
    }
}

fn status_of(code: u8) -> StepStatus {
    match code {
        0 => StepStatus::Pending,
        1 => StepStatus::Running,
        2 => StepStatus::Done,
        _ => StepStatus::Blocked,
    }
}

/// Apply one op; returns whether the store reported success.
fn apply(store: &mut PlanStore, op: &Op) -> bool {
    let plan = store.plan(&pid()).unwrap().clone();
    let version = plan.version;
    match op {
        Op::Add { depends, after } => {
            let spec = NewStepSpec {
                title: "step".into(),
                depends: depends
                    .iter()
                    .filter_map(|d| step_at(&plan, *d))
                    .collect(),
                after: (*after).and_then(|a| step_at(&plan, a)),
                ..Default::default()
            };
            store.add_step(&pid(), version, spec).is_ok()
        }
        Op::Update { step, priority } => match step_at(&plan, *step) {
            Some(step) => store
                .update_step(
                    &pid(),
                    version,
                    &step,
                    UpdateFields {
                        priority: Some(*priority),
                        ..Default::default()
                    },
                )
                .is_ok(),
            None => false,
        },
        Op::DepAdd { step, dep } => match (step_at(&plan, *step), step_at(&plan, *dep)) {
            (Some(step), Some(dep)) => store
                .add_dependencies(&pid(), version, &step, &[dep])
                .is_ok(),
            _ => false,
        },
        Op::DepRemove { step, dep } => match (step_at(&plan, *step), step_at(&plan, *dep)) {
            (Some(step), Some(dep)) => store
                .remove_dependencies(&pid(), version, &step, &[dep])
                .is_ok(),
            _ => false,
        },
        Op::Remove { step } => match step_at(&plan, *step) {
            Some(step) => store.remove_steps(&pid(), version, &[step]).is_ok(),
            None => false,
        },
        Op::Mark { step, status } => match step_at(&plan, *step) {
            Some(step) => store
                .mark_step(&pid(), version, &step, status_of(*status), None, None)
                .is_ok(),
            None => false,
        },
        Op::Reorder { rotation } => {
            if plan.steps.is_empty() {
                return false;
            }
            let mut order: Vec<StepId> = plan.steps.iter().map(|s| s.id.clone()).collect();
            let len = order.len();
            order.rotate_left(rotation % len);
            store.reorder(&pid(), version, &order).is_ok()
        }
        Op::Undo { steps } => store.undo(&pid(), *steps).unwrap() > 0,
        Op::Redo { steps } => store.redo(&pid(), *steps).unwrap() > 0,
        Op::Snapshot => store.snapshot(&pid(), None).is_ok(),
    }
}

fn assert_invariants(store: &PlanStore) {
    let plan = store.plan(&pid()).unwrap();
    // Step ids are pairwise distinct.
    let mut ids: Vec<&str> = plan.steps.iter().map(|s| s.id.as_str()).collect();
    ids.sort_unstable();
    let len_before = ids.len();
    ids.dedup();
    assert_eq!(ids.len(), len_before, "duplicate step ids");
    // The dependency graph stays acyclic.
    assert!(!plan.has_dependency_cycle(), "reachable state has a cycle");
}

proptest! {
    /// Invariants hold after every operation in a random sequence.
    #[test]
    fn random_sequences_preserve_invariants(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut store = PlanStore::new();
        store.create_plan("prop goal", "", Some(pid()), PlanMode::Minimal).unwrap();

        for op in &ops {
            apply(&mut store, op);
            assert_invariants(&store);
        }
    }

    /// Committed structural mutations bump the version by exactly one and
    /// append exactly one event; rejected ones change neither.
    #[test]
    fn version_and_event_accounting(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut store = PlanStore::new();
        store.create_plan("prop goal", "", Some(pid()), PlanMode::Minimal).unwrap();

        for op in &ops {
            let before_version = store.plan(&pid()).unwrap().version;
            let before_events = store.record(&pid()).unwrap().events.len();
            let structural = !matches!(op, Op::Undo { .. } | Op::Redo { .. } | Op::Snapshot);

            let applied = apply(&mut store, op);

            let after_version = store.plan(&pid()).unwrap().version;
            let after_events = store.record(&pid()).unwrap().events.len();
            if structural && applied {
                prop_assert_eq!(after_version, before_version + 1);
                prop_assert_eq!(after_events, before_events + 1);
                let last = store.record(&pid()).unwrap().events.last().unwrap();
                prop_assert_eq!(last.version, after_version);
            } else if structural {
                prop_assert_eq!(after_version, before_version);
                prop_assert_eq!(after_events, before_events);
            } else {
                // Undo/redo/snapshot never log events.
                prop_assert_eq!(after_events, before_events);
            }
        }
    }

    /// Undo restores the exact pre-mutation plan value; redo reapplies it.
    #[test]
    fn undo_redo_round_trip(
        setup in prop::collection::vec(op_strategy(), 0..20),
        op in op_strategy(),
    ) {
        let mut store = PlanStore::new();
        store.create_plan("prop goal", "", Some(pid()), PlanMode::Minimal).unwrap();
        for setup_op in &setup {
            apply(&mut store, setup_op);
        }

        let structural = !matches!(op, Op::Undo { .. } | Op::Redo { .. } | Op::Snapshot);
        prop_assume!(structural);

        let before = store.plan(&pid()).unwrap().clone();
        if apply(&mut store, &op) {
            let after = store.plan(&pid()).unwrap().clone();
            prop_assert_eq!(store.undo(&pid(), 1).unwrap(), 1);
            prop_assert_eq!(store.plan(&pid()).unwrap(), &before);
            prop_assert_eq!(store.redo(&pid(), 1).unwrap(), 1);
            prop_assert_eq!(store.plan(&pid()).unwrap(), &after);
        } else {
            // A rejected mutation must leave the plan untouched.
            prop_assert_eq!(store.plan(&pid()).unwrap(), &before);
        }
    }
}
