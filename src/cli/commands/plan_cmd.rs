//! plan command handlers - the plan store surface

use serde_json::{json, Value};

use crate::cli::args::{DepCommand, PlanCommand};
use crate::core::types::{PlanId, PlanMode, SignalType, StepId, StepStatus};
use crate::store::{
    brief, AgentState, BriefParams, ChecklistOp, DomainError, MergeFields, NewStepSpec,
    UpdateFields,
};

use super::{plan_id, step_id, step_ids, to_value};

/// Payload `{plan}` for the current plan value.
fn plan_payload(state: &AgentState, id: &PlanId) -> Result<Value, DomainError> {
    Ok(json!({ "plan": to_value(state.plans.plan(id)?)? }))
}

/// Payload `{plan, step}` after a step-focused mutation.
fn plan_step_payload(
    state: &AgentState,
    id: &PlanId,
    step: &StepId,
) -> Result<Value, DomainError> {
    let plan = state.plans.plan(id)?;
    let step = plan
        .find_step(step)
        .ok_or_else(|| DomainError::not_found("step"))?;
    Ok(json!({ "plan": to_value(plan)?, "step": to_value(step)? }))
}

fn parse_mode(mode: Option<String>) -> Result<PlanMode, DomainError> {
    match mode {
        None => Ok(PlanMode::default()),
        Some(text) => text.parse().map_err(|_| DomainError::InvalidArgument {
            name: "mode".into(),
            message: format!("unknown mode '{}'", text),
        }),
    }
}

fn parse_status(status: &str) -> Result<StepStatus, DomainError> {
    status.parse().map_err(|_| DomainError::InvalidArgument {
        name: "status".into(),
        message: format!("unknown status '{}'", status),
    })
}

fn finite_estimate(estimate: Option<f64>) -> Result<Option<f64>, DomainError> {
    match estimate {
        Some(value) if !value.is_finite() => Err(DomainError::InvalidArgument {
            name: "estimate".into(),
            message: "estimate must be a finite number".into(),
        }),
        other => Ok(other),
    }
}

pub fn handle(state: &mut AgentState, command: PlanCommand) -> Result<Value, DomainError> {
    match command {
        PlanCommand::Create {
            goal,
            title,
            plan_id: supplied,
            mode,
        } => {
            let id = supplied.as_deref().map(plan_id).transpose()?;
            let mode = parse_mode(mode)?;
            let plan = state
                .plans
                .create_plan(goal, title.unwrap_or_default(), id, mode)?;
            Ok(json!({ "plan": to_value(plan)? }))
        }

        PlanCommand::View {
            plan,
            include_history,
        } => {
            let id = plan_id(&plan)?;
            let record = state.plans.record(&id)?;
            let mut data = json!({ "plan": to_value(&record.plan)? });
            if include_history {
                data["events"] = to_value(&record.events)?;
                data["snapshots"] = to_value(&record.snapshots)?;
                data["signals"] = to_value(&record.signals)?;
            }
            Ok(data)
        }

        PlanCommand::Update {
            plan,
            expected_version,
            step,
            title,
            description,
            priority,
            owner,
            acceptance,
            estimate,
            add_tags,
            remove_tags,
        } => {
            let id = plan_id(&plan)?;
            let step = step_id("step", &step)?;
            state.plans.update_step(
                &id,
                expected_version,
                &step,
                UpdateFields {
                    title,
                    description,
                    priority,
                    owner,
                    acceptance,
                    estimate_hours: finite_estimate(estimate)?,
                    add_tags,
                    remove_tags,
                },
            )?;
            plan_step_payload(state, &id, &step)
        }

        PlanCommand::Add {
            plan,
            expected_version,
            title,
            description,
            priority,
            status,
            owner,
            acceptance,
            estimate,
            depends,
            tags,
            after,
        } => {
            let id = plan_id(&plan)?;
            let spec = NewStepSpec {
                title,
                description,
                priority,
                status: status.as_deref().map(parse_status).transpose()?,
                owner,
                acceptance,
                estimate_hours: finite_estimate(estimate)?,
                depends: step_ids("depends", &depends)?,
                tags,
                after: after.as_deref().map(|a| step_id("after", a)).transpose()?,
            };
            let new_id = state.plans.add_step(&id, expected_version, spec)?;
            plan_step_payload(state, &id, &new_id)
        }

        PlanCommand::Remove {
            plan,
            expected_version,
            steps,
        } => {
            let id = plan_id(&plan)?;
            let steps = step_ids("step", &steps)?;
            state.plans.remove_steps(&id, expected_version, &steps)?;
            plan_payload(state, &id)
        }

        PlanCommand::Reorder {
            plan,
            expected_version,
            order,
        } => {
            let id = plan_id(&plan)?;
            let order = step_ids("order", &order)?;
            state.plans.reorder(&id, expected_version, &order)?;
            plan_payload(state, &id)
        }

        PlanCommand::Dep { command } => dep(state, command),

        PlanCommand::Split {
            plan,
            expected_version,
            step,
            children,
            keep_parent,
        } => {
            let id = plan_id(&plan)?;
            let step = step_id("step", &step)?;
            let child_ids =
                state
                    .plans
                    .split_step(&id, expected_version, &step, &children, keep_parent)?;
            let plan_value = state.plans.plan(&id)?;
            let children: Vec<Value> = child_ids
                .iter()
                .filter_map(|cid| plan_value.find_step(cid))
                .map(to_value)
                .collect::<Result<_, _>>()?;
            Ok(json!({ "plan": to_value(plan_value)?, "children": children }))
        }

        PlanCommand::Merge {
            plan,
            expected_version,
            steps,
            title,
            description,
            priority,
            owner,
            acceptance,
        } => {
            let id = plan_id(&plan)?;
            let steps = step_ids("steps", &steps)?;
            let merged = state.plans.merge_steps(
                &id,
                expected_version,
                &steps,
                MergeFields {
                    title,
                    description,
                    priority,
                    owner,
                    acceptance,
                },
            )?;
            plan_step_payload(state, &id, &merged)
        }

        PlanCommand::Mark {
            plan,
            expected_version,
            step,
            status,
            reason,
            artifact,
        } => {
            let id = plan_id(&plan)?;
            let step = step_id("step", &step)?;
            let status = parse_status(&status)?;
            state
                .plans
                .mark_step(&id, expected_version, &step, status, reason, artifact)?;
            plan_step_payload(state, &id, &step)
        }

        PlanCommand::Checklist {
            plan,
            expected_version,
            step,
            op,
            item,
            text,
        } => {
            let id = plan_id(&plan)?;
            let step = step_id("step", &step)?;
            let require_item = |item: Option<String>| {
                item.ok_or_else(|| DomainError::missing("item"))
            };
            let op = match op.as_str() {
                "add" => ChecklistOp::Add { text },
                "remove" => ChecklistOp::Remove {
                    item: require_item(item)?,
                },
                "toggle" => ChecklistOp::Toggle {
                    item: require_item(item)?,
                },
                "rename" => ChecklistOp::Rename {
                    item: require_item(item)?,
                    text,
                },
                other => return Err(DomainError::UnknownOp { op: other.into() }),
            };
            state.plans.checklist(&id, expected_version, &step, op)?;
            plan_step_payload(state, &id, &step)
        }

        PlanCommand::Annotate {
            plan,
            expected_version,
            step,
            note,
            artifacts_add,
            artifacts_remove,
            links_add,
        } => {
            let id = plan_id(&plan)?;
            let step = step_id("step", &step)?;
            let links = step_ids("links-add", &links_add)?;
            state.plans.annotate_step(
                &id,
                expected_version,
                &step,
                note,
                &artifacts_add,
                &artifacts_remove,
                &links,
            )?;
            plan_step_payload(state, &id, &step)
        }

        PlanCommand::Block {
            plan,
            expected_version,
            step,
            reason,
        } => {
            let id = plan_id(&plan)?;
            let step = step_id("step", &step)?;
            state
                .plans
                .set_blocked(&id, expected_version, &step, Some(reason), true)?;
            plan_step_payload(state, &id, &step)
        }

        PlanCommand::Unblock {
            plan,
            expected_version,
            step,
        } => {
            let id = plan_id(&plan)?;
            let step = step_id("step", &step)?;
            state
                .plans
                .set_blocked(&id, expected_version, &step, None, false)?;
            plan_step_payload(state, &id, &step)
        }

        PlanCommand::Snapshot { plan, reason } => {
            let id = plan_id(&plan)?;
            let snapshot = state.plans.snapshot(&id, reason)?;
            Ok(json!({ "snapshot": to_value(&snapshot)? }))
        }

        PlanCommand::History { plan, limit } => {
            let id = plan_id(&plan)?;
            let events = state.plans.history(&id, limit)?;
            Ok(json!({ "events": to_value(&events)? }))
        }

        PlanCommand::Undo { plan, steps } => {
            let id = plan_id(&plan)?;
            let applied = state.plans.undo(&id, steps)?;
            Ok(json!({
                "plan": to_value(state.plans.plan(&id)?)?,
                "applied": applied,
            }))
        }

        PlanCommand::Redo { plan, steps } => {
            let id = plan_id(&plan)?;
            let applied = state.plans.redo(&id, steps)?;
            Ok(json!({
                "plan": to_value(state.plans.plan(&id)?)?,
                "applied": applied,
            }))
        }

        PlanCommand::Brief {
            plan,
            k_done,
            k_next,
            token_cap,
        } => {
            let id = plan_id(&plan)?;
            let result = brief(
                state.plans.plan(&id)?,
                BriefParams {
                    k_done,
                    k_next,
                    token_cap,
                },
            );
            to_value(&result)
        }

        PlanCommand::Signal {
            plan,
            signal_type,
            step,
            note,
            artifact,
            reason,
        } => {
            let id = plan_id(&plan)?;
            let signal_type: SignalType =
                signal_type.parse().map_err(|_| DomainError::InvalidArgument {
                    name: "type".into(),
                    message: format!("unknown signal type '{}'", signal_type),
                })?;
            let step = step.as_deref().map(|s| step_id("step", s)).transpose()?;
            let signal = state
                .plans
                .signal(&id, signal_type, step, note, artifact, reason)?;
            Ok(json!({
                "plan": to_value(state.plans.plan(&id)?)?,
                "signal": to_value(&signal)?,
            }))
        }
    }
}

fn dep(state: &mut AgentState, command: DepCommand) -> Result<Value, DomainError> {
    match command {
        DepCommand::Set {
            plan,
            expected_version,
            step,
            deps,
        } => {
            let id = plan_id(&plan)?;
            let step = step_id("step", &step)?;
            let deps = step_ids("deps", &deps)?;
            state
                .plans
                .set_dependencies(&id, expected_version, &step, &deps)?;
            plan_step_payload(state, &id, &step)
        }
        DepCommand::Add {
            plan,
            expected_version,
            step,
            deps,
        } => {
            let id = plan_id(&plan)?;
            let step = step_id("step", &step)?;
            let deps = step_ids("deps", &deps)?;
            state
                .plans
                .add_dependencies(&id, expected_version, &step, &deps)?;
            plan_step_payload(state, &id, &step)
        }
        DepCommand::Remove {
            plan,
            expected_version,
            step,
            deps,
        } => {
            let id = plan_id(&plan)?;
            let step = step_id("step", &step)?;
            let deps = step_ids("deps", &deps)?;
            state
                .plans
                .remove_dependencies(&id, expected_version, &step, &deps)?;
            plan_step_payload(state, &id, &step)
        }
    }
}
