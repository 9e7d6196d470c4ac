//! store::brief
//!
//! Deterministic plan summarization (the MIC brief).
//!
//! The brief is a pure function of a plan value. It names the step being
//! worked on, recent completions, what comes next, and current blockers,
//! inside a character budget of `token_cap * 4` (a ~4-chars-per-token
//! proxy).

use serde::Serialize;

use crate::core::plan::Plan;
use crate::core::types::{StepId, StepStatus};

/// Tuning knobs for [`brief`].
#[derive(Debug, Clone, Copy)]
pub struct BriefParams {
    /// Keep at most this many of the latest done steps.
    pub k_done: usize,
    /// Collect at most this many upcoming pending steps.
    pub k_next: usize,
    /// Token budget; the text is truncated to `token_cap * 4` characters.
    pub token_cap: usize,
}

impl Default for BriefParams {
    fn default() -> Self {
        Self {
            k_done: 3,
            k_next: 3,
            token_cap: 200,
        }
    }
}

/// The rendered brief.
#[derive(Debug, Clone, Serialize)]
pub struct Brief {
    pub mic_text: String,
    /// Empty string when no step is running or pending.
    pub now_step_id: String,
    pub done_step_ids: Vec<StepId>,
    pub next_step_ids: Vec<StepId>,
}

/// Build the brief for a plan.
///
/// Selection is deterministic:
/// - `now` is the first running step, else the first pending one
/// - `done` keeps the last `k_done` done steps in plan order
/// - `next` collects up to `k_next` pending steps after `now`
/// - blockers are steps with blocked status or an explicit blocked flag
pub fn brief(plan: &Plan, params: BriefParams) -> Brief {
    let blockers: Vec<&StepId> = plan
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Blocked || s.blocked)
        .map(|s| &s.id)
        .collect();

    let mut done: Vec<StepId> = plan
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Done)
        .map(|s| s.id.clone())
        .collect();
    if done.len() > params.k_done {
        done.drain(..done.len() - params.k_done);
    }

    let now_index = plan
        .steps
        .iter()
        .position(|s| s.status == StepStatus::Running)
        .or_else(|| plan.steps.iter().position(|s| s.status == StepStatus::Pending));

    let next: Vec<StepId> = match now_index {
        Some(idx) => plan.steps[idx + 1..]
            .iter()
            .filter(|s| s.status == StepStatus::Pending)
            .take(params.k_next)
            .map(|s| s.id.clone())
            .collect(),
        None => Vec::new(),
    };

    let now = now_index.map(|idx| &plan.steps[idx]);

    let mut text = format!("Goal: {}\n", plan.goal);
    match now {
        Some(step) => {
            text.push_str(&format!("Now: [{}] {}\n", step.id, step.title));
        }
        None => text.push_str("Now: <none>\n"),
    }
    text.push_str(&format!("Done: {}\n", join_ids(&done)));
    text.push_str(&format!("Next: {}\n", join_ids(&next)));
    text.push_str(&format!(
        "Blockers: {}\n",
        blockers
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    ));
    if let Some(step) = now {
        text.push_str(&format!("Acceptance: {}\n", step.acceptance));
    }

    truncate_chars(&mut text, params.token_cap * 4);

    Brief {
        mic_text: text,
        now_step_id: now.map(|s| s.id.to_string()).unwrap_or_default(),
        done_step_ids: done,
        next_step_ids: next,
    }
}

fn join_ids(ids: &[StepId]) -> String {
    ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(",")
}

/// Truncate a string to at most `limit` bytes on a char boundary.
pub fn truncate_chars(text: &mut String, limit: usize) {
    if text.len() <= limit {
        return;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}
