//! budget, timer, log, and report handlers

use serde_json::{json, Value};

use crate::cli::args::{BudgetCommand, LogCommand, ReportCommand};
use crate::store::{summary, AgentState, DomainError, ResourceCounts};

use super::{plan_id, step_id, task_id, to_value};

pub fn budget(state: &mut AgentState, command: BudgetCommand) -> Result<Value, DomainError> {
    match command {
        BudgetCommand::Set {
            task,
            tokens,
            time,
            requests,
        } => {
            let task = task_id(&task)?;
            let record = state
                .budgets
                .set_budget(
                    task,
                    ResourceCounts {
                        tokens,
                        time_ms: time,
                        requests,
                    },
                )
                .clone();
            Ok(json!({
                "budget": to_value(&record)?,
                "over_budget": to_value(&record.over_budget())?,
            }))
        }
        BudgetCommand::Meter {
            task,
            tokens,
            time,
            requests,
        } => {
            let task = task_id(&task)?;
            let record = state
                .budgets
                .meter(
                    task,
                    ResourceCounts {
                        tokens,
                        time_ms: time,
                        requests,
                    },
                )
                .clone();
            Ok(json!({
                "budget": to_value(&record)?,
                "over_budget": to_value(&record.over_budget())?,
            }))
        }
    }
}

pub fn timer(
    state: &mut AgentState,
    task: String,
    step: Option<String>,
    timeout: u64,
) -> Result<Value, DomainError> {
    let task = task_id(&task)?;
    let step = step.as_deref().map(|s| step_id("step", s)).transpose()?;
    let timer = state.timers.create(task, step, timeout).clone();
    Ok(json!({ "timer": to_value(&timer)? }))
}

pub fn log(state: &mut AgentState, command: LogCommand) -> Result<Value, DomainError> {
    match command {
        LogCommand::Event {
            plan,
            event_type,
            step,
            message,
            version,
        } => {
            let plan = plan_id(&plan)?;
            let step = step.as_deref().map(|s| step_id("step", s)).transpose()?;
            let record = state
                .log
                .event(plan, event_type, step, message, version)
                .clone();
            Ok(json!({ "event": to_value(&record)? }))
        }
    }
}

pub fn report(state: &mut AgentState, command: ReportCommand) -> Result<Value, DomainError> {
    match command {
        ReportCommand::Summary { plan } => {
            let id = plan_id(&plan)?;
            let record = state.plans.record(&id)?;
            Ok(json!({ "summary": summary(&record.plan, &record.events) }))
        }
    }
}
