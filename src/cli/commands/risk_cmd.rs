//! risk and review-request handlers

use serde_json::{json, Value};

use crate::cli::args::{RequestCommand, RiskCommand};
use crate::store::{request_review, risk_assess, AgentState, DomainError};

use super::{plan_id, step_id, to_value};

pub fn risk(state: &mut AgentState, command: RiskCommand) -> Result<Value, DomainError> {
    match command {
        RiskCommand::Assess { plan } => {
            let id = plan_id(&plan)?;
            let plan = state.plans.plan(&id)?;
            let steps = risk_assess(plan);
            Ok(json!({ "plan_id": plan.id, "steps": to_value(&steps)? }))
        }
    }
}

pub fn request(state: &mut AgentState, command: RequestCommand) -> Result<Value, DomainError> {
    match command {
        RequestCommand::Review {
            plan,
            intent,
            step,
            diff,
            rollback,
        } => {
            let id = plan_id(&plan)?;
            let step = step.as_deref().map(|s| step_id("step", s)).transpose()?;
            let plan = state.plans.plan(&id)?;
            if let Some(step) = &step {
                if plan.find_step(step).is_none() {
                    return Err(DomainError::not_found("step"));
                }
            }
            let package = request_review(plan, intent, step, diff, rollback);
            Ok(json!({ "review": to_value(&package)? }))
        }
    }
}
