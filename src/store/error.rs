//! store::error
//!
//! Structured domain failures.
//!
//! # Taxonomy
//!
//! Every variant carries a stable `kind` string and a structured payload.
//! Domain failures surface as exit code 2 with
//! `{"ok":false,"error":{"kind":...}}`; usage errors never reach this type
//! (the argument parser reports them as plain text with exit code 1).
//!
//! Local recovery happens only for post-condition violations (a cycle after
//! a dependency mutation or an insert), where the store rolls the plan back
//! to its pre-image. Everything else is surfaced unchanged; nothing is
//! retried.

use serde_json::{json, Value};
use thiserror::Error;

use crate::core::types::{PlanId, StepId};

/// A domain failure with a stable kind and structured payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// A required argument was absent for the selected operation.
    #[error("missing required argument --{name}")]
    MissingArgument { name: String },

    /// An argument was present but malformed (e.g. an invalid identifier).
    #[error("invalid value for --{name}: {message}")]
    InvalidArgument { name: String, message: String },

    /// A plan, step, checklist item, or snapshot was not found.
    #[error("{what} not found")]
    NotFound { what: String },

    /// A plan id collided at creation time.
    #[error("plan '{plan_id}' already exists")]
    AlreadyExists { plan_id: PlanId },

    /// The optimistic-concurrency fence tripped.
    #[error("version mismatch: expected {expected_version}, current is {current_version}")]
    VersionMismatch {
        plan_id: PlanId,
        current_version: u64,
        expected_version: u64,
    },

    /// A dependency mutation would introduce a cycle.
    #[error("dependency cycle detected")]
    Cycle { cycle: Vec<StepId> },

    /// Removing the named steps would strand dependents.
    #[error("steps still depend on the removed set")]
    DependentSteps { dependent_steps: Vec<StepId> },

    /// A reorder violates a dependency ordering.
    #[error("order places step {conflict_step} before a dependency")]
    ConflictStep { conflict_step: StepId },

    /// Marking done while dependencies are unsatisfied.
    #[error("dependencies not satisfied")]
    BlockedBy { blocked_by: Vec<StepId> },

    /// A reorder sequence does not cover the step set.
    #[error("order length mismatch: expected {expected}, got {actual}")]
    OrderLengthMismatch { expected: usize, actual: usize },

    /// An unrecognized sub-operation name.
    #[error("unknown op: {op}")]
    UnknownOp { op: String },

    /// Merge requires at least two source steps.
    #[error("need at least two steps")]
    NeedAtLeastTwo,

    /// An I/O failure while walking snapshot paths.
    #[error("i/o error: {message}")]
    Io { message: String },
}

impl DomainError {
    /// Shorthand for a `not_found` over the given entity name.
    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound { what: what.into() }
    }

    /// Shorthand for a `missing_argument` over the given flag name.
    pub fn missing(name: impl Into<String>) -> Self {
        DomainError::MissingArgument { name: name.into() }
    }

    /// The stable kind string for the envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::MissingArgument { .. } => "missing_argument",
            DomainError::InvalidArgument { .. } => "invalid_argument",
            DomainError::NotFound { .. } => "not_found",
            DomainError::AlreadyExists { .. } => "already_exists",
            DomainError::VersionMismatch { .. } => "version_mismatch",
            DomainError::Cycle { .. } => "cycle",
            DomainError::DependentSteps { .. } => "dependent_steps",
            DomainError::ConflictStep { .. } => "conflict_step",
            DomainError::BlockedBy { .. } => "blocked_by",
            DomainError::OrderLengthMismatch { .. } => "order_length_mismatch",
            DomainError::UnknownOp { .. } => "unknown_op",
            DomainError::NeedAtLeastTwo => "need_at_least_two",
            DomainError::Io { .. } => "io",
        }
    }

    /// Render the structured error object for the envelope.
    pub fn to_error_value(&self) -> Value {
        let mut error = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        let fields = match self {
            DomainError::MissingArgument { name } => json!({ "name": name }),
            DomainError::InvalidArgument { name, .. } => json!({ "name": name }),
            DomainError::NotFound { what } => json!({ "what": what }),
            DomainError::AlreadyExists { plan_id } => json!({ "plan_id": plan_id }),
            DomainError::VersionMismatch {
                plan_id,
                current_version,
                expected_version,
            } => json!({
                "plan_id": plan_id,
                "current_version": current_version,
                "expected_version": expected_version,
            }),
            DomainError::Cycle { cycle } => json!({ "cycle": cycle }),
            DomainError::DependentSteps { dependent_steps } => {
                json!({ "dependent_steps": dependent_steps })
            }
            DomainError::ConflictStep { conflict_step } => {
                json!({ "conflict_step": conflict_step })
            }
            DomainError::BlockedBy { blocked_by } => json!({ "blocked_by": blocked_by }),
            DomainError::OrderLengthMismatch { expected, actual } => {
                json!({ "expected": expected, "actual": actual })
            }
            DomainError::UnknownOp { op } => json!({ "op": op }),
            DomainError::NeedAtLeastTwo => json!({}),
            DomainError::Io { message } => json!({ "message": message }),
        };
        if let (Some(target), Some(extra)) = (error.as_object_mut(), fields.as_object()) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> StepId {
        StepId::new(s).unwrap()
    }

    #[test]
    fn version_mismatch_payload() {
        let err = DomainError::VersionMismatch {
            plan_id: PlanId::new("p1").unwrap(),
            current_version: 2,
            expected_version: 1,
        };
        let value = err.to_error_value();
        assert_eq!(value["kind"], "version_mismatch");
        assert_eq!(value["plan_id"], "p1");
        assert_eq!(value["current_version"], 2);
        assert_eq!(value["expected_version"], 1);
    }

    #[test]
    fn cycle_payload_lists_ids() {
        let err = DomainError::Cycle {
            cycle: vec![sid("s3"), sid("s1"), sid("s2")],
        };
        let value = err.to_error_value();
        assert_eq!(value["kind"], "cycle");
        assert_eq!(value["cycle"], serde_json::json!(["s3", "s1", "s2"]));
    }

    #[test]
    fn every_variant_has_distinct_kind() {
        let kinds = [
            DomainError::missing("plan").kind(),
            DomainError::InvalidArgument {
                name: "step".into(),
                message: "bad".into(),
            }
            .kind(),
            DomainError::not_found("plan").kind(),
            DomainError::VersionMismatch {
                plan_id: PlanId::new("p").unwrap(),
                current_version: 2,
                expected_version: 1,
            }
            .kind(),
            DomainError::AlreadyExists {
                plan_id: PlanId::new("p").unwrap(),
            }
            .kind(),
            DomainError::Cycle { cycle: vec![] }.kind(),
            DomainError::DependentSteps {
                dependent_steps: vec![],
            }
            .kind(),
            DomainError::ConflictStep {
                conflict_step: sid("s1"),
            }
            .kind(),
            DomainError::BlockedBy { blocked_by: vec![] }.kind(),
            DomainError::OrderLengthMismatch {
                expected: 1,
                actual: 2,
            }
            .kind(),
            DomainError::UnknownOp { op: "zap".into() }.kind(),
            DomainError::NeedAtLeastTwo.kind(),
            DomainError::Io {
                message: "broken".into(),
            }
            .kind(),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }

    #[test]
    fn message_is_always_present() {
        let err = DomainError::NeedAtLeastTwo;
        let value = err.to_error_value();
        assert!(value["message"].as_str().is_some());
    }
}
