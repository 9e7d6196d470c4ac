//! cli
//!
//! Command envelope layer.
//!
//! # Responsibilities
//!
//! - Parse token lists into the clap command tree
//! - Delegate to command handlers
//! - Shape the uniform envelope: `{"ok":true,"data":...}` on success,
//!   `{"ok":false,"error":{...}}` on domain failure
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0    | Success (JSON envelope, or plain text for help/completions) |
//! | 1    | Usage or parse error (plain text) |
//! | 2    | Domain failure (structured JSON) |

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use clap::error::ErrorKind;
use clap::Parser;
use serde_json::json;

use crate::core::config::GuardConfig;
use crate::store::AgentState;
use crate::ui::output;

/// The result of dispatching one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub exit_code: i32,
    pub output: String,
}

impl Outcome {
    fn usage(exit_code: i32, output: String) -> Self {
        Self { exit_code, output }
    }
}

/// Dispatch one token list against the state.
pub fn dispatch(state: &mut AgentState, tokens: &[String]) -> Outcome {
    let argv = std::iter::once("ploom".to_string()).chain(tokens.iter().cloned());
    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) => {
            let exit_code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            return Outcome::usage(exit_code, err.render().to_string());
        }
    };

    match commands::dispatch(state, cli.command) {
        Ok(commands::Output::Data(data)) => Outcome {
            exit_code: 0,
            output: json!({ "ok": true, "data": data }).to_string(),
        },
        Ok(commands::Output::Text(text)) => Outcome {
            exit_code: 0,
            output: text,
        },
        Err(err) => Outcome {
            exit_code: 2,
            output: json!({ "ok": false, "error": err.to_error_value() }).to_string(),
        },
    }
}

/// Run the CLI application.
///
/// With argv tokens: dispatch once and return that exit code. Without:
/// read token lines from stdin and dispatch each against the same state,
/// returning the last command's exit code. Blank lines and `#` comments
/// are skipped.
pub fn run(args: &[String]) -> i32 {
    let config = match GuardConfig::load(None) {
        Ok(config) => config,
        Err(err) => {
            output::error(err);
            return 1;
        }
    };
    let mut state = AgentState::new(config);

    if !args.is_empty() {
        let outcome = dispatch(&mut state, args);
        println!("{}", outcome.output);
        return outcome.exit_code;
    }

    let mut last_exit = 0;
    for line in std::io::stdin().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                output::error(err);
                return 1;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens = match shell_words::split(trimmed) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::error(format!("cannot tokenize line: {}", err));
                last_exit = 1;
                continue;
            }
        };
        let outcome = dispatch(&mut state, &tokens);
        println!("{}", outcome.output);
        last_exit = outcome.exit_code;
    }
    last_exit
}
