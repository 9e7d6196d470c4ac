//! store::report
//!
//! Derived views: risk assessment, review packages, the global log, and
//! plain-text plan summaries.
//!
//! Everything here is a pure derivation over plan data and the ledgers;
//! no guard is consulted and nothing mutates a plan.

use serde::Serialize;

use crate::core::plan::Plan;
use crate::core::types::{random_id, PlanId, StepId, UtcTimestamp};

use super::plans::PlanEvent;

/// Risk level derived from a step's priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Priority >= 3 is high, exactly 2 is medium, everything else low.
    pub fn from_priority(priority: i64) -> Self {
        if priority >= 3 {
            RiskLevel::High
        } else if priority == 2 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Per-step risk verdict.
#[derive(Debug, Clone, Serialize)]
pub struct StepRisk {
    pub step_id: StepId,
    pub risk: RiskLevel,
    pub need_review: bool,
}

/// Assess every step of a plan.
///
/// `need_review` is set for any non-low risk or explicitly blocked step.
pub fn risk_assess(plan: &Plan) -> Vec<StepRisk> {
    plan.steps
        .iter()
        .map(|step| {
            let risk = RiskLevel::from_priority(step.priority);
            StepRisk {
                step_id: step.id.clone(),
                risk,
                need_review: risk != RiskLevel::Low || step.blocked,
            }
        })
        .collect()
}

/// A self-contained review request over a plan.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewPackage {
    pub review_id: String,
    pub plan_id: PlanId,
    pub intent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<StepId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback: Option<String>,
    /// Steps currently needing review, from the same derivation as
    /// [`risk_assess`].
    pub steps_needing_review: Vec<StepId>,
    pub created_at: UtcTimestamp,
}

/// Build a review package for a plan.
pub fn request_review(
    plan: &Plan,
    intent: String,
    step_id: Option<StepId>,
    diff: Option<String>,
    rollback: Option<String>,
) -> ReviewPackage {
    ReviewPackage {
        review_id: random_id("review-"),
        plan_id: plan.id.clone(),
        intent,
        step_id,
        diff,
        rollback,
        steps_needing_review: risk_assess(plan)
            .into_iter()
            .filter(|r| r.need_review)
            .map(|r| r.step_id)
            .collect(),
        created_at: UtcTimestamp::now(),
    }
}

/// One entry in the global log, separate from per-plan events.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub event_id: String,
    pub plan_id: PlanId,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<StepId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    pub timestamp: UtcTimestamp,
}

/// The global append-only log.
#[derive(Debug, Default)]
pub struct GlobalLog {
    records: Vec<LogRecord>,
}

impl GlobalLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record; returns the stored copy.
    pub fn event(
        &mut self,
        plan_id: PlanId,
        event_type: String,
        step_id: Option<StepId>,
        message: Option<String>,
        version: Option<u64>,
    ) -> &LogRecord {
        self.records.push(LogRecord {
            event_id: random_id("evt-"),
            plan_id,
            event_type,
            step_id,
            message,
            version,
            timestamp: UtcTimestamp::now(),
        });
        self.records.last().expect("just pushed")
    }

    /// All records, in append order.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }
}

/// How many trailing events the summary shows.
const SUMMARY_EVENT_WINDOW: usize = 5;

/// Render a plain-text roll-up of a plan and its recent events.
pub fn summary(plan: &Plan, events: &[PlanEvent]) -> String {
    let mut text = String::new();
    if plan.title.is_empty() {
        text.push_str(&format!("Plan {} (v{})\n", plan.id, plan.version));
    } else {
        text.push_str(&format!("Plan {} - {} (v{})\n", plan.id, plan.title, plan.version));
    }
    text.push_str(&format!("Goal: {}\n", plan.goal));
    text.push_str(&format!("Steps: {}\n", plan.steps.len()));
    for step in &plan.steps {
        let mut line = format!("  [{}] {} {}", step.status, step.id, step.title);
        if !step.dependencies.is_empty() {
            let deps: Vec<&str> = step.dependencies.iter().map(|d| d.as_str()).collect();
            line.push_str(&format!(" (deps: {})", deps.join(",")));
        }
        if step.blocked {
            line.push_str(" [blocked]");
        }
        line.push('\n');
        text.push_str(&line);
    }
    text.push_str(&format!("Events: {}\n", events.len()));
    let tail = events.len().saturating_sub(SUMMARY_EVENT_WINDOW);
    for event in &events[tail..] {
        text.push_str(&format!(
            "  v{} {}: {}\n",
            event.version, event.event_type, event.detail
        ));
    }
    text
}
