//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Conventions
//!
//! - Options use `--name value` form; boolean flags are valueless
//! - Repeated options accumulate (e.g. `--child`, `--entry`, `--path`)
//! - Comma-separated options split on `,` (e.g. `--depends a,b`)
//! - Closed vocabularies (`--status`, `--mode`, signal `--type`) are
//!   enforced at parse time and fail with a usage error
//!
//! Fenced mutations all carry `--plan` and `--expected-version`; read
//! operations carry `--plan` only.

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};

pub use clap_complete::Shell;

use crate::core::types::{SignalType, StepStatus};

/// planloom - in-process orchestration kernel for autonomous-agent tasks
#[derive(Parser, Debug)]
#[command(name = "ploom")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage orchestrator plans
    #[command(name = "plan")]
    Plan {
        #[command(subcommand)]
        command: PlanCommand,
    },

    /// Manage orchestrator context entries
    #[command(name = "ctx")]
    Ctx {
        #[command(subcommand)]
        command: CtxCommand,
    },

    /// Manage task budgets
    #[command(name = "budget")]
    Budget {
        #[command(subcommand)]
        command: BudgetCommand,
    },

    /// Start a timer
    #[command(name = "timer")]
    Timer {
        /// Task the timer belongs to
        #[arg(long)]
        task: String,

        /// Step the timer refers to
        #[arg(long)]
        step: Option<String>,

        /// Timeout in seconds
        #[arg(long)]
        timeout: u64,
    },

    /// Filesystem snapshot helpers
    #[command(name = "fs")]
    Fs {
        #[command(subcommand)]
        command: FsCommand,
    },

    /// Assess guarded operations
    #[command(name = "guard")]
    Guard {
        #[command(subcommand)]
        command: GuardCommand,
    },

    /// Evaluate plan risks
    #[command(name = "risk")]
    Risk {
        #[command(subcommand)]
        command: RiskCommand,
    },

    /// Manage guarded review requests
    #[command(name = "request")]
    Request {
        #[command(subcommand)]
        command: RequestCommand,
    },

    /// Record orchestration logs
    #[command(name = "log")]
    Log {
        #[command(subcommand)]
        command: LogCommand,
    },

    /// Generate orchestration reports
    #[command(name = "report")]
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },

    /// Generate shell completion scripts
    #[command(name = "completion")]
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Plan store operations.
#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    /// Create a plan
    Create {
        /// The goal the plan works toward
        #[arg(long)]
        goal: String,

        /// Optional plan title
        #[arg(long)]
        title: Option<String>,

        /// Supply the plan id instead of minting one
        #[arg(long)]
        plan_id: Option<String>,

        /// Plan generation mode
        #[arg(long, value_parser = PossibleValuesParser::new(["minimal", "full"]))]
        mode: Option<String>,
    },

    /// View the full plan
    View {
        #[arg(long)]
        plan: String,

        /// Also return events, snapshots, and signals
        #[arg(long)]
        include_history: bool,
    },

    /// Update metadata for a single step
    Update {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        #[arg(long)]
        step: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        priority: Option<i64>,

        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        acceptance: Option<String>,

        /// Estimated effort in hours
        #[arg(long)]
        estimate: Option<f64>,

        /// Tag to add (repeatable)
        #[arg(long = "add-tag")]
        add_tags: Vec<String>,

        /// Tag to remove (repeatable)
        #[arg(long = "remove-tag")]
        remove_tags: Vec<String>,
    },

    /// Insert a new plan step
    Add {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        #[arg(long)]
        title: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        priority: Option<i64>,

        #[arg(long, value_parser = PossibleValuesParser::new(StepStatus::NAMES))]
        status: Option<String>,

        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        acceptance: Option<String>,

        #[arg(long)]
        estimate: Option<f64>,

        /// Dependency step ids, comma-separated
        #[arg(long, value_delimiter = ',')]
        depends: Vec<String>,

        /// Tags, comma-separated
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Insert immediately after this step
        #[arg(long)]
        after: Option<String>,
    },

    /// Remove steps from the plan
    Remove {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        /// Step to remove (repeatable)
        #[arg(long = "step", required = true)]
        steps: Vec<String>,
    },

    /// Reorder plan steps
    Reorder {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        /// The complete new step order, comma-separated
        #[arg(long, value_delimiter = ',')]
        order: Vec<String>,
    },

    /// Manage step dependencies
    Dep {
        #[command(subcommand)]
        command: DepCommand,
    },

    /// Split a complex step into child steps
    Split {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        #[arg(long)]
        step: String,

        /// Child spec "title::description" (repeatable)
        #[arg(long = "child", required = true)]
        children: Vec<String>,

        /// Keep the original step as a grouping node
        #[arg(long)]
        keep_parent: bool,
    },

    /// Merge several steps into one
    Merge {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        /// Source step ids, comma-separated
        #[arg(long, value_delimiter = ',')]
        steps: Vec<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        priority: Option<i64>,

        #[arg(long)]
        owner: Option<String>,

        #[arg(long)]
        acceptance: Option<String>,
    },

    /// Change step status
    Mark {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        #[arg(long)]
        step: String,

        #[arg(long, value_parser = PossibleValuesParser::new(StepStatus::NAMES))]
        status: String,

        /// Recorded as a step note
        #[arg(long)]
        reason: Option<String>,

        /// Added to the step's artifacts
        #[arg(long)]
        artifact: Option<String>,
    },

    /// Manage checklist items for a step
    Checklist {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        #[arg(long)]
        step: String,

        /// One of add, remove, toggle, rename
        #[arg(long)]
        op: String,

        /// Checklist item id
        #[arg(long)]
        item: Option<String>,

        /// Item text for add/rename
        #[arg(long)]
        text: Option<String>,
    },

    /// Add annotations to a step
    Annotate {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        #[arg(long)]
        step: String,

        #[arg(long)]
        note: Option<String>,

        /// Artifact to add (repeatable)
        #[arg(long = "artifacts-add")]
        artifacts_add: Vec<String>,

        /// Artifact to remove (repeatable)
        #[arg(long = "artifacts-remove")]
        artifacts_remove: Vec<String>,

        /// Step link to add (repeatable)
        #[arg(long = "links-add")]
        links_add: Vec<String>,
    },

    /// Mark a step as explicitly blocked
    Block {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        #[arg(long)]
        step: String,

        #[arg(long)]
        reason: String,
    },

    /// Clear the blocked state of a step
    Unblock {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        #[arg(long)]
        step: String,
    },

    /// Create a plan snapshot
    Snapshot {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// List plan events, newest first
    History {
        #[arg(long)]
        plan: String,

        /// Maximum events to return (0 = all)
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },

    /// Undo plan operations
    Undo {
        #[arg(long)]
        plan: String,

        #[arg(long, default_value_t = 1)]
        steps: usize,
    },

    /// Redo plan operations
    Redo {
        #[arg(long)]
        plan: String,

        #[arg(long, default_value_t = 1)]
        steps: usize,
    },

    /// Generate a MIC summary
    Brief {
        #[arg(long)]
        plan: String,

        #[arg(long, default_value_t = 3)]
        k_done: usize,

        #[arg(long, default_value_t = 3)]
        k_next: usize,

        #[arg(long, default_value_t = 200)]
        token_cap: usize,
    },

    /// Record an orchestration signal
    Signal {
        #[arg(long)]
        plan: String,

        #[arg(long = "type", value_parser = PossibleValuesParser::new(SignalType::NAMES))]
        signal_type: String,

        #[arg(long)]
        step: Option<String>,

        #[arg(long)]
        note: Option<String>,

        #[arg(long)]
        artifact: Option<String>,

        #[arg(long)]
        reason: Option<String>,
    },
}

/// Dependency list operations.
#[derive(Subcommand, Debug)]
pub enum DepCommand {
    /// Replace the dependency list for a step
    Set {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        #[arg(long)]
        step: String,

        /// Dependency ids, comma-separated
        #[arg(long, value_delimiter = ',')]
        deps: Vec<String>,
    },

    /// Add dependencies to a step
    Add {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        #[arg(long)]
        step: String,

        #[arg(long, value_delimiter = ',')]
        deps: Vec<String>,
    },

    /// Remove dependencies from a step
    Remove {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        expected_version: u64,

        #[arg(long)]
        step: String,

        #[arg(long, value_delimiter = ',')]
        deps: Vec<String>,
    },
}

/// Context store operations.
#[derive(Subcommand, Debug)]
pub enum CtxCommand {
    /// Configure task scope
    Scope {
        #[arg(long)]
        task: String,

        /// Allowed path prefix (repeatable)
        #[arg(long = "allow")]
        allow: Vec<String>,

        /// Denied path prefix (repeatable)
        #[arg(long = "deny")]
        deny: Vec<String>,

        /// Admitted entry type (repeatable)
        #[arg(long = "type")]
        types: Vec<String>,
    },

    /// Capture a context entry
    Capture {
        #[arg(long)]
        task: String,

        /// Entry type (e.g. code, doc, note)
        #[arg(long = "type", default_value = "note")]
        entry_type: String,

        #[arg(long)]
        title: String,

        #[arg(long)]
        summary: String,

        /// Related path (repeatable)
        #[arg(long = "path")]
        paths: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,

        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        payload_ref: Option<String>,
    },

    /// Pin context entries
    Pin {
        /// Entry id (repeatable)
        #[arg(long = "entry", required = true)]
        entries: Vec<String>,
    },

    /// Unpin context entries
    Unpin {
        /// Entry id (repeatable)
        #[arg(long = "entry", required = true)]
        entries: Vec<String>,
    },

    /// Assemble side context within a token budget
    PackForMic {
        #[arg(long)]
        task: String,

        #[arg(long, default_value_t = 200)]
        token_cap: usize,

        /// Entry types in priority order, comma-separated
        #[arg(long, value_delimiter = ',')]
        type_priority: Vec<String>,
    },

    /// Inject MIC text as a pinned context entry
    InjectTodo {
        /// Task to attach the entry to
        #[arg(long, default_value = "mic")]
        task: String,

        #[arg(long)]
        mic_text: String,

        #[arg(long)]
        side_text: Option<String>,

        #[arg(long)]
        priority: Option<String>,

        /// Capture without pinning
        #[arg(long)]
        unpinned: bool,
    },
}

/// Budget ledger operations.
#[derive(Subcommand, Debug)]
pub enum BudgetCommand {
    /// Set task budget caps
    Set {
        #[arg(long)]
        task: String,

        #[arg(long, default_value_t = 0)]
        tokens: u64,

        /// Time cap in milliseconds
        #[arg(long, default_value_t = 0)]
        time: u64,

        #[arg(long, default_value_t = 0)]
        requests: u64,
    },

    /// Meter budget usage
    Meter {
        #[arg(long)]
        task: String,

        #[arg(long, default_value_t = 0)]
        tokens: u64,

        /// Time spent in milliseconds
        #[arg(long, default_value_t = 0)]
        time: u64,

        #[arg(long, default_value_t = 0)]
        requests: u64,
    },
}

/// Filesystem snapshot operations.
#[derive(Subcommand, Debug)]
pub enum FsCommand {
    /// Create a filesystem snapshot
    Snapshot {
        /// Path to include (repeatable)
        #[arg(long = "path", required = true)]
        paths: Vec<String>,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Compare two filesystem snapshots
    Diff {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,
    },
}

/// Guard checks.
#[derive(Subcommand, Debug)]
pub enum GuardCommand {
    /// Check a filesystem operation
    Fs {
        #[arg(long, value_parser = PossibleValuesParser::new(["read", "write"]))]
        op: String,

        #[arg(long)]
        path: String,

        /// Operation size in bytes
        #[arg(long, default_value_t = 0)]
        size: u64,
    },

    /// Check a shell command
    Shell {
        #[arg(long)]
        command: String,
    },

    /// Check a network request
    Net {
        #[arg(long)]
        host: String,
    },
}

/// Risk derivations.
#[derive(Subcommand, Debug)]
pub enum RiskCommand {
    /// Assess plan risk levels
    Assess {
        #[arg(long)]
        plan: String,
    },
}

/// Review requests.
#[derive(Subcommand, Debug)]
pub enum RequestCommand {
    /// Prepare a review package
    Review {
        #[arg(long)]
        plan: String,

        #[arg(long)]
        intent: String,

        #[arg(long)]
        step: Option<String>,

        #[arg(long)]
        diff: Option<String>,

        #[arg(long)]
        rollback: Option<String>,
    },
}

/// Global log operations.
#[derive(Subcommand, Debug)]
pub enum LogCommand {
    /// Record a log event
    Event {
        #[arg(long)]
        plan: String,

        #[arg(long = "type")]
        event_type: String,

        #[arg(long)]
        step: Option<String>,

        #[arg(long)]
        message: Option<String>,

        #[arg(long)]
        version: Option<u64>,
    },
}

/// Report generation.
#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Generate a plain-text plan summary
    Summary {
        #[arg(long)]
        plan: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tokens: &[&str]) -> Result<Cli, clap::Error> {
        let argv: Vec<&str> = std::iter::once("ploom").chain(tokens.iter().copied()).collect();
        Cli::try_parse_from(argv)
    }

    #[test]
    fn create_requires_goal() {
        assert!(parse(&["plan", "create"]).is_err());
        assert!(parse(&["plan", "create", "--goal", "ship"]).is_ok());
    }

    #[test]
    fn comma_options_split() {
        let cli = parse(&[
            "plan", "add", "--plan", "p", "--expected-version", "1", "--title", "t",
            "--depends", "a,b", "--tags", "x,y",
        ])
        .unwrap();
        match cli.command {
            Command::Plan {
                command: PlanCommand::Add { depends, tags, .. },
            } => {
                assert_eq!(depends, vec!["a", "b"]);
                assert_eq!(tags, vec!["x", "y"]);
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn repeated_child_accumulates() {
        let cli = parse(&[
            "plan", "split", "--plan", "p", "--expected-version", "1", "--step", "s1",
            "--child", "a::first", "--child", "b",
        ])
        .unwrap();
        match cli.command {
            Command::Plan {
                command: PlanCommand::Split { children, keep_parent, .. },
            } => {
                assert_eq!(children, vec!["a::first", "b"]);
                assert!(!keep_parent);
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn status_vocabulary_is_closed() {
        assert!(parse(&[
            "plan", "mark", "--plan", "p", "--expected-version", "1", "--step", "s1",
            "--status", "paused",
        ])
        .is_err());
        assert!(parse(&[
            "plan", "mark", "--plan", "p", "--expected-version", "1", "--step", "s1",
            "--status", "done",
        ])
        .is_ok());
    }

    #[test]
    fn signal_type_vocabulary_is_closed() {
        assert!(parse(&["plan", "signal", "--plan", "p", "--type", "NOPE"]).is_err());
        assert!(parse(&["plan", "signal", "--plan", "p", "--type", "REPLAN_REQUEST"]).is_ok());
    }

    #[test]
    fn expected_version_must_be_integer() {
        assert!(parse(&[
            "plan", "update", "--plan", "p", "--expected-version", "abc", "--step", "s1",
        ])
        .is_err());
    }

    #[test]
    fn brief_defaults() {
        let cli = parse(&["plan", "brief", "--plan", "p"]).unwrap();
        match cli.command {
            Command::Plan {
                command: PlanCommand::Brief { k_done, k_next, token_cap, .. },
            } => {
                assert_eq!(k_done, 3);
                assert_eq!(k_next, 3);
                assert_eq!(token_cap, 200);
            }
            other => panic!("unexpected parse: {:?}", other),
        }
    }

    #[test]
    fn dep_subcommands_parse() {
        assert!(parse(&[
            "plan", "dep", "set", "--plan", "p", "--expected-version", "1", "--step", "s1",
            "--deps", "a,b",
        ])
        .is_ok());
    }

    #[test]
    fn guard_op_vocabulary_is_closed() {
        assert!(parse(&["guard", "fs", "--op", "append", "--path", "/tmp/x"]).is_err());
        assert!(parse(&["guard", "fs", "--op", "write", "--path", "/tmp/x"]).is_ok());
    }
}
