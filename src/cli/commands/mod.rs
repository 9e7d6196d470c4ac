//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each handler:
//! 1. Converts parsed arguments into core types
//! 2. Calls the owning sub-store
//! 3. Shapes the success payload
//!
//! Handlers never mutate state directly; every change flows through a
//! sub-store method.

mod admin;
mod completion;
mod ctx_cmd;
mod fs_cmd;
mod guard_cmd;
mod plan_cmd;
mod risk_cmd;

use serde_json::Value;

use crate::cli::args::Command;
use crate::core::types::{PlanId, StepId, TaskId};
use crate::store::{AgentState, DomainError};

/// What a handler produced: envelope data, or raw text emitted verbatim.
#[derive(Debug)]
pub enum Output {
    Data(Value),
    Text(String),
}

/// Dispatch a command to its handler.
pub fn dispatch(state: &mut AgentState, command: Command) -> Result<Output, DomainError> {
    let data = match command {
        Command::Plan { command } => plan_cmd::handle(state, command)?,
        Command::Ctx { command } => ctx_cmd::handle(state, command)?,
        Command::Budget { command } => admin::budget(state, command)?,
        Command::Timer {
            task,
            step,
            timeout,
        } => admin::timer(state, task, step, timeout)?,
        Command::Fs { command } => fs_cmd::handle(state, command)?,
        Command::Guard { command } => guard_cmd::handle(state, command)?,
        Command::Risk { command } => risk_cmd::risk(state, command)?,
        Command::Request { command } => risk_cmd::request(state, command)?,
        Command::Log { command } => admin::log(state, command)?,
        Command::Report { command } => admin::report(state, command)?,
        Command::Completion { shell } => return Ok(Output::Text(completion::script(shell))),
    };
    Ok(Output::Data(data))
}

/// Parse a `--plan` value.
pub(crate) fn plan_id(value: &str) -> Result<PlanId, DomainError> {
    PlanId::new(value).map_err(|e| DomainError::InvalidArgument {
        name: "plan".into(),
        message: e.to_string(),
    })
}

/// Parse a step id from the named option.
pub(crate) fn step_id(name: &str, value: &str) -> Result<StepId, DomainError> {
    StepId::new(value).map_err(|e| DomainError::InvalidArgument {
        name: name.into(),
        message: e.to_string(),
    })
}

/// Parse a list of step ids from the named option.
pub(crate) fn step_ids(name: &str, values: &[String]) -> Result<Vec<StepId>, DomainError> {
    values.iter().map(|v| step_id(name, v)).collect()
}

/// Parse a `--task` value.
pub(crate) fn task_id(value: &str) -> Result<TaskId, DomainError> {
    TaskId::new(value).map_err(|e| DomainError::InvalidArgument {
        name: "task".into(),
        message: e.to_string(),
    })
}

/// Serialize a payload; internal serialization failures surface as `io`.
pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, DomainError> {
    serde_json::to_value(value).map_err(|e| DomainError::Io {
        message: e.to_string(),
    })
}
