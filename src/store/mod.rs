//! store
//!
//! The process-wide mutable state object and its sub-stores.
//!
//! # Architecture
//!
//! All state lives in one [`AgentState`] with a fixed set of sub-stores:
//! plans, context, budgets, timers, filesystem snapshots, the guard
//! evaluator, and the global log. Every command mutates exactly one
//! sub-store; operations are synchronous and atomic from the caller's
//! point of view, with no suspension points.
//!
//! # Concurrency
//!
//! The state is `Send`; a multi-threaded embedding wraps the whole object
//! in a single `Mutex` so that the version fence stays atomic with the
//! mutation it guards. Clients coordinate through `expected_version` only:
//! under contention the loser re-reads the plan and retries.

pub mod brief;
pub mod context;
pub mod error;
pub mod fs_snap;
pub mod guard;
pub mod ledgers;
pub mod plans;
pub mod report;

pub use brief::{brief, Brief, BriefParams};
pub use context::{CaptureSpec, ContextEntry, ContextStore, PackedContext, ScopeConfig};
pub use error::DomainError;
pub use fs_snap::{FsDiff, FsSnapshot, FsSnapshotStore};
pub use guard::{FsOp, GuardDecision, GuardEvaluator};
pub use ledgers::{BudgetLedger, BudgetRecord, ResourceCounts, TimerLedger, TimerRecord};
pub use plans::{
    ChecklistOp, MergeFields, NewStepSpec, PlanEvent, PlanRecord, PlanSnapshot, PlanStore,
    SignalRecord, UpdateFields, UNDO_DEPTH,
};
pub use report::{
    request_review, risk_assess, summary, GlobalLog, LogRecord, ReviewPackage, RiskLevel, StepRisk,
};

use crate::core::config::GuardConfig;

/// The whole orchestration state for one process.
#[derive(Debug, Default)]
pub struct AgentState {
    pub plans: PlanStore,
    pub context: ContextStore,
    pub budgets: BudgetLedger,
    pub timers: TimerLedger,
    pub fs_snapshots: FsSnapshotStore,
    pub guard: GuardEvaluator,
    pub log: GlobalLog,
}

impl AgentState {
    /// Create a fresh state with the given guard policy.
    pub fn new(guard_config: GuardConfig) -> Self {
        Self {
            guard: GuardEvaluator::new(guard_config),
            ..Default::default()
        }
    }
}
