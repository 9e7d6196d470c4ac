//! ctx command handlers - context store surface

use serde_json::{json, Value};

use crate::cli::args::CtxCommand;
use crate::store::{AgentState, CaptureSpec, DomainError, ScopeConfig};

use super::{task_id, to_value};

pub fn handle(state: &mut AgentState, command: CtxCommand) -> Result<Value, DomainError> {
    match command {
        CtxCommand::Scope {
            task,
            allow,
            deny,
            types,
        } => {
            let task = task_id(&task)?;
            let scope = ScopeConfig { allow, deny, types };
            state.context.set_scope(task.clone(), scope.clone());
            Ok(json!({ "task": task, "scope": to_value(&scope)? }))
        }

        CtxCommand::Capture {
            task,
            entry_type,
            title,
            summary,
            paths,
            tags,
            keywords,
            source,
            payload_ref,
        } => {
            let task = task_id(&task)?;
            let id = state.context.capture(
                task,
                CaptureSpec {
                    entry_type,
                    title,
                    summary,
                    paths,
                    tags,
                    keywords,
                    source: source.unwrap_or_default(),
                    payload_ref: payload_ref.unwrap_or_default(),
                    pinned: false,
                },
            );
            Ok(json!({ "entry_id": id }))
        }

        CtxCommand::Pin { entries } => {
            let affected = state.context.pin(&entries, true);
            Ok(json!({ "affected": affected }))
        }

        CtxCommand::Unpin { entries } => {
            let affected = state.context.pin(&entries, false);
            Ok(json!({ "affected": affected }))
        }

        CtxCommand::PackForMic {
            task,
            token_cap,
            type_priority,
        } => {
            let task = task_id(&task)?;
            let packed = state.context.pack_for_mic(&task, token_cap, &type_priority);
            Ok(json!({ "text": packed.text, "used_ids": packed.used_ids }))
        }

        CtxCommand::InjectTodo {
            task,
            mic_text,
            side_text,
            priority,
            unpinned,
        } => {
            let task = task_id(&task)?;
            let mut tags = Vec::new();
            if let Some(priority) = priority {
                tags.push(format!("priority:{}", priority));
            }
            let mic_id = state.context.capture(
                task.clone(),
                CaptureSpec {
                    entry_type: "mic".into(),
                    title: "MIC".into(),
                    summary: mic_text,
                    tags: tags.clone(),
                    pinned: !unpinned,
                    ..Default::default()
                },
            );
            let side_id = side_text.map(|text| {
                state.context.capture(
                    task,
                    CaptureSpec {
                        entry_type: "side".into(),
                        title: "MIC side context".into(),
                        summary: text,
                        tags,
                        pinned: false,
                        ..Default::default()
                    },
                )
            });
            let mut data = json!({ "entry_id": mic_id });
            if let Some(side_id) = side_id {
                data["side_entry_id"] = json!(side_id);
            }
            Ok(data)
        }
    }
}
