//! store::ledgers
//!
//! Per-task budget counters and timer records.
//!
//! Budgets are advisory: going over a cap is reported in the returned
//! status, never enforced. Timers are records, not preemption; expiry is
//! observed by polling.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{random_id, StepId, TaskId, UtcTimestamp};

/// The three metered resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCounts {
    pub tokens: u64,
    pub time_ms: u64,
    pub requests: u64,
}

/// Per-counter over-budget flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverBudget {
    pub tokens: bool,
    pub time_ms: bool,
    pub requests: bool,
}

impl OverBudget {
    pub fn any(&self) -> bool {
        self.tokens || self.time_ms || self.requests
    }
}

/// Budget state for one task.
///
/// A cap of zero means uncapped for that counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetRecord {
    pub task: TaskId,
    pub caps: ResourceCounts,
    pub used: ResourceCounts,
}

impl BudgetRecord {
    /// Compute the over-budget flags.
    pub fn over_budget(&self) -> OverBudget {
        let over = |cap: u64, used: u64| cap > 0 && used > cap;
        OverBudget {
            tokens: over(self.caps.tokens, self.used.tokens),
            time_ms: over(self.caps.time_ms, self.used.time_ms),
            requests: over(self.caps.requests, self.used.requests),
        }
    }
}

/// The budget ledger.
#[derive(Debug, Default)]
pub struct BudgetLedger {
    budgets: HashMap<TaskId, BudgetRecord>,
}

impl BudgetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install caps for a task, keeping accumulated usage.
    pub fn set_budget(&mut self, task: TaskId, caps: ResourceCounts) -> &BudgetRecord {
        let record = self.budgets.entry(task.clone()).or_insert_with(|| BudgetRecord {
            task,
            caps: ResourceCounts::default(),
            used: ResourceCounts::default(),
        });
        record.caps = caps;
        record
    }

    /// Add usage for a task; the task is created on first meter.
    pub fn meter(&mut self, task: TaskId, delta: ResourceCounts) -> &BudgetRecord {
        let record = self.budgets.entry(task.clone()).or_insert_with(|| BudgetRecord {
            task,
            caps: ResourceCounts::default(),
            used: ResourceCounts::default(),
        });
        record.used.tokens += delta.tokens;
        record.used.time_ms += delta.time_ms;
        record.used.requests += delta.requests;
        record
    }

    /// Look up a task's budget.
    pub fn get(&self, task: &TaskId) -> Option<&BudgetRecord> {
        self.budgets.get(task)
    }
}

/// A timer record with an absolute deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerRecord {
    pub id: String,
    pub task: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<StepId>,
    pub timeout_s: u64,
    pub created_at: UtcTimestamp,
    pub deadline: UtcTimestamp,
}

impl TimerRecord {
    /// Whether the deadline has passed at `now`.
    pub fn expired_at(&self, now: &UtcTimestamp) -> bool {
        now > &self.deadline
    }
}

/// The timer ledger.
#[derive(Debug, Default)]
pub struct TimerLedger {
    timers: Vec<TimerRecord>,
}

impl TimerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a timer for a task (and optionally one of its steps).
    pub fn create(&mut self, task: TaskId, step: Option<StepId>, timeout_s: u64) -> &TimerRecord {
        let created_at = UtcTimestamp::now();
        let deadline = UtcTimestamp::from_datetime(
            *created_at.as_datetime() + chrono::Duration::seconds(timeout_s as i64),
        );
        self.timers.push(TimerRecord {
            id: random_id("timer-"),
            task,
            step,
            timeout_s,
            created_at,
            deadline,
        });
        self.timers.last().expect("just pushed")
    }

    /// All timers, in creation order.
    pub fn all(&self) -> &[TimerRecord] {
        &self.timers
    }

    /// Timers whose deadline has passed at `now`.
    pub fn expired(&self, now: &UtcTimestamp) -> Vec<&TimerRecord> {
        self.timers.iter().filter(|t| t.expired_at(now)).collect()
    }
}
