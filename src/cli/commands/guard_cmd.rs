//! guard command handlers - policy decision surface

use serde_json::Value;

use crate::cli::args::GuardCommand;
use crate::store::{AgentState, DomainError, FsOp};

use super::to_value;

pub fn handle(state: &mut AgentState, command: GuardCommand) -> Result<Value, DomainError> {
    let decision = match command {
        GuardCommand::Fs { op, path, size } => {
            let op: FsOp = op.parse().map_err(|message| DomainError::InvalidArgument {
                name: "op".into(),
                message,
            })?;
            state.guard.fs_guard(op, &path, size)
        }
        GuardCommand::Shell { command } => state.guard.shell_guard(&command),
        GuardCommand::Net { host } => state.guard.net_guard(&host),
    };
    to_value(&decision)
}
