//! planloom - the orchestration kernel of an autonomous-agent toolbox
//!
//! planloom keeps the living state of a task in one process: its plan (a
//! versioned graph of steps), its captured context, its budgets and timers,
//! its filesystem snapshots, and its guard policies. Every mutation goes
//! through a uniform command envelope fenced by optimistic-concurrency
//! versioning.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command envelope layer (parses token lists, shapes JSON)
//! - [`store`] - The process-wide state object and its sub-stores; the
//!   plan store is the heart
//! - [`core`] - Domain types, the plan model, graph checks, configuration
//! - [`ui`] - Diagnostic output utilities
//!
//! # Correctness Invariants
//!
//! 1. Step ids within a plan are pairwise distinct
//! 2. Dependency graphs are acyclic after every committed mutation
//! 3. Every committed mutation bumps the version by exactly one and
//!    appends exactly one event at that version
//! 4. A failed mutation leaves the plan byte-for-byte unchanged

pub mod cli;
pub mod core;
pub mod store;
pub mod ui;
