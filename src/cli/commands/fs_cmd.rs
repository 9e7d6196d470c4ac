//! fs command handlers - snapshot and diff surface

use serde_json::{json, Value};

use crate::cli::args::FsCommand;
use crate::store::{AgentState, DomainError};

use super::to_value;

pub fn handle(state: &mut AgentState, command: FsCommand) -> Result<Value, DomainError> {
    match command {
        FsCommand::Snapshot { paths, reason } => {
            let snapshot = state.fs_snapshots.create(&paths, reason)?;
            Ok(json!({ "snapshot": to_value(snapshot)? }))
        }
        FsCommand::Diff { from, to } => {
            let diff = state.fs_snapshots.diff(&from, &to)?;
            Ok(json!({
                "added": diff.added,
                "removed": diff.removed,
                "changed": diff.changed,
            }))
        }
    }
}
