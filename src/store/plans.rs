//! store::plans
//!
//! The versioned, event-sourced plan store.
//!
//! # Architecture
//!
//! Each plan lives in a [`PlanRecord`] together with its append-only event
//! log, its snapshots, its signals, and two bounded rings of plan values for
//! undo/redo. Every read-modify-write operation is fenced by the caller's
//! `expected_version`; an unequal version fails with `version_mismatch` and
//! touches nothing.
//!
//! # Transaction protocol
//!
//! 1. Resolve the record and check the version fence
//! 2. Clone the pre-image
//! 3. Apply the mutation
//! 4. On failure, restore the plan from the pre-image; no event, no undo push
//! 5. On success, push the pre-image onto the undo ring, clear the redo
//!    ring, bump the version, stamp `updated_at`, append one event
//!
//! The pre-image clone makes rollback exact: a failed operation leaves the
//! plan byte-for-byte unchanged.
//!
//! # Invariants
//!
//! - Step ids within a plan are pairwise distinct
//! - The dependency graph is acyclic after every commit
//! - `version` increases by exactly one per committed mutation, with
//!   exactly one event at the new version
//! - Snapshots, events, and signals accumulate monotonically; undo never
//!   rewinds them

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::core::plan::{push_unique, ChecklistItem, Plan, Step, StepNote};
use crate::core::types::{
    random_id, PlanId, PlanMode, SignalType, StepId, StepStatus, UtcTimestamp,
};

use super::error::DomainError;

/// Maximum undo/redo depth per plan; the oldest entry is dropped first.
pub const UNDO_DEPTH: usize = 64;

/// One entry in a plan's append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEvent {
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub detail: String,
    pub timestamp: UtcTimestamp,
    /// Plan version after the mutation that produced this event.
    pub version: u64,
}

impl PlanEvent {
    fn new(event_type: &str, detail: String, version: u64) -> Self {
        Self {
            event_id: random_id("evt-"),
            event_type: event_type.to_string(),
            detail,
            timestamp: UtcTimestamp::now(),
            version,
        }
    }
}

/// An immutable deep copy of a plan at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub snapshot_id: String,
    pub reason: String,
    pub created_at: UtcTimestamp,
    pub plan: Plan,
}

/// An advisory orchestration signal appended to a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub timestamp: UtcTimestamp,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<StepId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A plan plus everything the store owns about it.
#[derive(Debug, Clone)]
pub struct PlanRecord {
    pub plan: Plan,
    pub events: Vec<PlanEvent>,
    pub snapshots: Vec<PlanSnapshot>,
    pub signals: Vec<SignalRecord>,
    undo_stack: VecDeque<Plan>,
    redo_stack: Vec<Plan>,
}

impl PlanRecord {
    fn new(plan: Plan) -> Self {
        Self {
            plan,
            events: Vec::new(),
            snapshots: Vec::new(),
            signals: Vec::new(),
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
        }
    }

    fn push_undo(&mut self, pre_image: Plan) {
        if self.undo_stack.len() == UNDO_DEPTH {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(pre_image);
    }

    /// Current undo depth (for tests and introspection).
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Current redo depth (for tests and introspection).
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}

/// Field updates for a single step; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub owner: Option<String>,
    pub acceptance: Option<String>,
    pub estimate_hours: Option<f64>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
}

/// Specification for a new step.
#[derive(Debug, Clone, Default)]
pub struct NewStepSpec {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub status: Option<StepStatus>,
    pub owner: Option<String>,
    pub acceptance: Option<String>,
    pub estimate_hours: Option<f64>,
    pub depends: Vec<StepId>,
    pub tags: Vec<String>,
    pub after: Option<StepId>,
}

/// Fields for the step produced by a merge.
#[derive(Debug, Clone, Default)]
pub struct MergeFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub owner: Option<String>,
    pub acceptance: Option<String>,
}

/// A checklist sub-operation.
#[derive(Debug, Clone)]
pub enum ChecklistOp {
    Add { text: Option<String> },
    Remove { item: String },
    Toggle { item: String },
    Rename { item: String, text: Option<String> },
}

/// The plan store.
///
/// Plans are created and never destroyed. All mutation flows through the
/// transaction protocol documented at module level; read operations never
/// touch versions, events, or the undo rings.
#[derive(Debug, Default)]
pub struct PlanStore {
    plans: HashMap<PlanId, PlanRecord>,
}

impl PlanStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a plan record.
    pub fn record(&self, plan_id: &PlanId) -> Result<&PlanRecord, DomainError> {
        self.plans
            .get(plan_id)
            .ok_or_else(|| DomainError::not_found("plan"))
    }

    /// Look up a plan.
    pub fn plan(&self, plan_id: &PlanId) -> Result<&Plan, DomainError> {
        Ok(&self.record(plan_id)?.plan)
    }

    /// Create a new plan.
    ///
    /// The id is taken from `plan_id` or minted; a colliding id is rejected
    /// because plans are never destroyed. Emits a `create` event. No fence.
    pub fn create_plan(
        &mut self,
        goal: impl Into<String>,
        title: impl Into<String>,
        plan_id: Option<PlanId>,
        mode: PlanMode,
    ) -> Result<&Plan, DomainError> {
        let id = plan_id.unwrap_or_else(PlanId::random);
        if self.plans.contains_key(&id) {
            return Err(DomainError::AlreadyExists { plan_id: id });
        }
        let plan = Plan::new(id.clone(), goal, title, mode);
        let mut record = PlanRecord::new(plan);
        record.events.push(PlanEvent::new(
            "create",
            format!("created plan {}", id),
            record.plan.version,
        ));
        Ok(&self.plans.entry(id).or_insert(record).plan)
    }

    /// Run one fenced mutation through the transaction protocol.
    ///
    /// `op` mutates the plan freely and reports the event detail; on `Err`
    /// the plan is restored from the pre-image and nothing is recorded.
    fn mutate<T>(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        event_type: &str,
        op: impl FnOnce(&mut Plan) -> Result<(T, String), DomainError>,
    ) -> Result<T, DomainError> {
        let record = self
            .plans
            .get_mut(plan_id)
            .ok_or_else(|| DomainError::not_found("plan"))?;
        if expected_version != record.plan.version {
            return Err(DomainError::VersionMismatch {
                plan_id: record.plan.id.clone(),
                current_version: record.plan.version,
                expected_version,
            });
        }

        let pre_image = record.plan.clone();
        match op(&mut record.plan) {
            Ok((output, detail)) => {
                record.push_undo(pre_image);
                record.redo_stack.clear();
                record.plan.version += 1;
                record.plan.updated_at = UtcTimestamp::now();
                record
                    .events
                    .push(PlanEvent::new(event_type, detail, record.plan.version));
                Ok(output)
            }
            Err(err) => {
                record.plan = pre_image;
                Err(err)
            }
        }
    }

    /// Update metadata on a single step.
    pub fn update_step(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_id: &StepId,
        fields: UpdateFields,
    ) -> Result<(), DomainError> {
        self.mutate(plan_id, expected_version, "update", |plan| {
            let step = plan
                .find_step_mut(step_id)
                .ok_or_else(|| DomainError::not_found("step"))?;
            if let Some(title) = fields.title {
                step.title = title;
            }
            if let Some(description) = fields.description {
                step.description = description;
            }
            if let Some(priority) = fields.priority {
                step.priority = priority;
            }
            if let Some(owner) = fields.owner {
                step.owner = owner;
            }
            if let Some(acceptance) = fields.acceptance {
                step.acceptance = acceptance;
            }
            if let Some(estimate) = fields.estimate_hours {
                step.estimate_hours = Some(estimate);
            }
            for tag in fields.add_tags {
                step.add_tag(tag);
            }
            for tag in &fields.remove_tags {
                step.remove_tag(tag);
            }
            Ok(((), format!("updated step {}", step_id)))
        })
    }

    /// Insert a new step, at the tail or immediately after `spec.after`.
    ///
    /// Post-check: the dependency graph must stay acyclic; a cycle rolls the
    /// insert back.
    pub fn add_step(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        spec: NewStepSpec,
    ) -> Result<StepId, DomainError> {
        self.mutate(plan_id, expected_version, "add", |plan| {
            let insert_at = match &spec.after {
                Some(after) => plan
                    .step_index(after)
                    .ok_or_else(|| DomainError::not_found("after step"))?
                    + 1,
                None => plan.steps.len(),
            };

            let id = plan.mint_step_id();
            let mut step = Step::new(id.clone(), spec.title);
            if let Some(description) = spec.description {
                step.description = description;
            }
            if let Some(priority) = spec.priority {
                step.priority = priority;
            }
            if let Some(status) = spec.status {
                step.status = status;
            }
            if let Some(owner) = spec.owner {
                step.owner = owner;
            }
            if let Some(acceptance) = spec.acceptance {
                step.acceptance = acceptance;
            }
            step.estimate_hours = spec.estimate_hours;
            for dep in spec.depends {
                push_unique(&mut step.dependencies, dep);
            }
            for tag in spec.tags {
                step.add_tag(tag);
            }
            plan.steps.insert(insert_at, step);

            if plan.has_dependency_cycle() {
                return Err(DomainError::Cycle {
                    cycle: plan.dependency_cycle(),
                });
            }
            Ok((id.clone(), format!("added step {}", id)))
        })
    }

    /// Remove steps, refusing while any remaining step depends on them.
    pub fn remove_steps(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_ids: &[StepId],
    ) -> Result<(), DomainError> {
        if step_ids.is_empty() {
            return Err(DomainError::missing("step"));
        }
        self.mutate(plan_id, expected_version, "remove", |plan| {
            let removed: HashSet<StepId> = step_ids.iter().cloned().collect();
            let mut dependents: Vec<StepId> = Vec::new();
            for step in &plan.steps {
                if removed.contains(&step.id) {
                    continue;
                }
                if step.dependencies.iter().any(|dep| removed.contains(dep)) {
                    push_unique(&mut dependents, step.id.clone());
                }
            }
            if !dependents.is_empty() {
                return Err(DomainError::DependentSteps {
                    dependent_steps: dependents,
                });
            }
            plan.steps.retain(|step| !removed.contains(&step.id));
            plan.scrub_dependencies(&removed);
            Ok(((), "removed steps".to_string()))
        })
    }

    /// Reorder the step sequence.
    ///
    /// `order` must be a permutation of the step id set, and every present
    /// dependency must come no later than its dependent.
    pub fn reorder(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        order: &[StepId],
    ) -> Result<(), DomainError> {
        self.mutate(plan_id, expected_version, "reorder", |plan| {
            if order.len() != plan.steps.len() {
                return Err(DomainError::OrderLengthMismatch {
                    expected: plan.steps.len(),
                    actual: order.len(),
                });
            }
            let positions: HashMap<&StepId, usize> =
                order.iter().enumerate().map(|(i, id)| (id, i)).collect();
            for step in &plan.steps {
                let own = match positions.get(&step.id) {
                    Some(pos) => *pos,
                    None => {
                        return Err(DomainError::ConflictStep {
                            conflict_step: step.id.clone(),
                        })
                    }
                };
                for dep in &step.dependencies {
                    if let Some(dep_pos) = positions.get(dep) {
                        if *dep_pos > own {
                            return Err(DomainError::ConflictStep {
                                conflict_step: step.id.clone(),
                            });
                        }
                    }
                }
            }

            let mut reordered = Vec::with_capacity(order.len());
            for id in order {
                let step = plan
                    .find_step(id)
                    .cloned()
                    .ok_or_else(|| DomainError::not_found("step"))?;
                reordered.push(step);
            }
            plan.steps = reordered;
            Ok(((), "reordered steps".to_string()))
        })
    }

    /// Replace a step's dependency list.
    pub fn set_dependencies(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_id: &StepId,
        deps: &[StepId],
    ) -> Result<(), DomainError> {
        self.apply_dependencies(plan_id, expected_version, step_id, deps, "dep.set", |step, deps| {
            step.dependencies.clear();
            for dep in deps {
                push_unique(&mut step.dependencies, dep.clone());
            }
        })
    }

    /// Append dependencies, preserving existing order and dropping duplicates.
    pub fn add_dependencies(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_id: &StepId,
        deps: &[StepId],
    ) -> Result<(), DomainError> {
        self.apply_dependencies(plan_id, expected_version, step_id, deps, "dep.add", |step, deps| {
            for dep in deps {
                push_unique(&mut step.dependencies, dep.clone());
            }
        })
    }

    /// Subtract dependencies; missing entries are a no-op.
    pub fn remove_dependencies(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_id: &StepId,
        deps: &[StepId],
    ) -> Result<(), DomainError> {
        let detail_id = step_id.clone();
        self.mutate(plan_id, expected_version, "dep.remove", move |plan| {
            let step = plan
                .find_step_mut(&detail_id)
                .ok_or_else(|| DomainError::not_found("step"))?;
            step.dependencies.retain(|dep| !deps.contains(dep));
            Ok(((), format!("removed dependencies for {}", detail_id)))
        })
    }

    /// Shared body of `dep.set` / `dep.add`: apply, then re-check acyclicity.
    ///
    /// Dangling targets are tolerated here; they surface later at reorder
    /// or mark-done. A cycle rolls everything back, undo push included.
    fn apply_dependencies(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_id: &StepId,
        deps: &[StepId],
        event_type: &'static str,
        apply: impl FnOnce(&mut Step, &[StepId]),
    ) -> Result<(), DomainError> {
        self.mutate(plan_id, expected_version, event_type, |plan| {
            let step = plan
                .find_step_mut(step_id)
                .ok_or_else(|| DomainError::not_found("step"))?;
            apply(step, deps);
            if plan.has_dependency_cycle() {
                return Err(DomainError::Cycle {
                    cycle: plan.dependency_cycle(),
                });
            }
            let verb = if event_type == "dep.set" { "reset" } else { "added" };
            Ok(((), format!("{} dependencies for {}", verb, step_id)))
        })
    }

    /// Split a step into child steps inserted at its position.
    ///
    /// Each child spec is `"title::description"` (description optional).
    /// With `keep_parent` the original becomes a pending grouping node;
    /// otherwise it is removed without dependency scrubbing. Children
    /// inherit no dependencies.
    pub fn split_step(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_id: &StepId,
        children: &[String],
        keep_parent: bool,
    ) -> Result<Vec<StepId>, DomainError> {
        if children.is_empty() {
            return Err(DomainError::missing("child"));
        }
        self.mutate(plan_id, expected_version, "split", |plan| {
            let index = plan
                .step_index(step_id)
                .ok_or_else(|| DomainError::not_found("step"))?;

            let mut new_steps = Vec::with_capacity(children.len());
            for spec in children {
                let (title, description) = match spec.split_once("::") {
                    Some((title, description)) => (title, description),
                    None => (spec.as_str(), ""),
                };
                let id = plan.mint_step_id();
                let mut child = Step::new(id, title);
                child.description = description.to_string();
                child.parent_id = Some(step_id.clone());
                new_steps.push(child);
            }
            let child_ids: Vec<StepId> = new_steps.iter().map(|s| s.id.clone()).collect();

            let insert_at = if keep_parent {
                let parent = plan
                    .find_step_mut(step_id)
                    .ok_or_else(|| DomainError::not_found("step"))?;
                parent.virtual_parent = true;
                parent.status = StepStatus::Pending;
                index + 1
            } else {
                plan.steps.remove(index);
                index
            };
            for (offset, child) in new_steps.into_iter().enumerate() {
                plan.steps.insert(insert_at + offset, child);
            }

            Ok((child_ids, format!("split step {}", step_id)))
        })
    }

    /// Merge two or more steps into a freshly minted one.
    ///
    /// Dependencies, tags, artifacts, and links are unioned (deduped,
    /// sorted); notes and checklists are not carried over. The merged step
    /// lands at the position of the first source.
    pub fn merge_steps(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_ids: &[StepId],
        fields: MergeFields,
    ) -> Result<StepId, DomainError> {
        if step_ids.len() < 2 {
            return Err(DomainError::NeedAtLeastTwo);
        }
        self.mutate(plan_id, expected_version, "merge", |plan| {
            let mut indices = Vec::with_capacity(step_ids.len());
            for id in step_ids {
                indices.push(
                    plan.step_index(id)
                        .ok_or_else(|| DomainError::not_found("step"))?,
                );
            }
            indices.sort_unstable();
            let insert_at = indices[0];

            let id = plan.mint_step_id();
            let mut merged = Step::new(id.clone(), fields.title.unwrap_or_else(|| "Merged step".into()));
            merged.description = fields.description.unwrap_or_default();
            merged.priority = fields.priority.unwrap_or(0);
            merged.owner = fields.owner.unwrap_or_default();
            merged.acceptance = fields.acceptance.unwrap_or_default();

            for idx in &indices {
                let source = &plan.steps[*idx];
                merged.dependencies.extend(source.dependencies.iter().cloned());
                merged.tags.extend(source.tags.iter().cloned());
                merged.artifacts.extend(source.artifacts.iter().cloned());
                merged.links.extend(source.links.iter().cloned());
            }
            for list in [&mut merged.dependencies, &mut merged.links] {
                list.sort();
                list.dedup();
            }
            for list in [&mut merged.tags, &mut merged.artifacts] {
                list.sort();
                list.dedup();
            }

            let sources: HashSet<StepId> = step_ids.iter().cloned().collect();
            plan.steps.retain(|step| !sources.contains(&step.id));
            plan.steps.insert(insert_at, merged);

            Ok((id.clone(), format!("merged steps into {}", id)))
        })
    }

    /// Change a step's status.
    ///
    /// Marking `done` requires every dependency satisfied; unsatisfied ids
    /// (not done, or naming no step) come back as `blocked_by`.
    pub fn mark_step(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_id: &StepId,
        status: StepStatus,
        reason: Option<String>,
        artifact: Option<String>,
    ) -> Result<(), DomainError> {
        self.mutate(plan_id, expected_version, "mark", |plan| {
            let step = plan
                .find_step(step_id)
                .ok_or_else(|| DomainError::not_found("step"))?;
            if status == StepStatus::Done {
                let blocked_by = plan.unsatisfied_dependencies(step);
                if !blocked_by.is_empty() {
                    return Err(DomainError::BlockedBy { blocked_by });
                }
            }
            let step = plan
                .find_step_mut(step_id)
                .ok_or_else(|| DomainError::not_found("step"))?;
            step.status = status;
            if let Some(reason) = reason {
                step.notes.push(StepNote::new(reason));
            }
            if let Some(artifact) = artifact {
                step.add_artifact(artifact);
            }
            Ok(((), format!("marked {} as {}", step_id, status)))
        })
    }

    /// Apply a checklist sub-operation to a step.
    pub fn checklist(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_id: &StepId,
        op: ChecklistOp,
    ) -> Result<(), DomainError> {
        self.mutate(plan_id, expected_version, "checklist", |plan| {
            let step = plan
                .find_step_mut(step_id)
                .ok_or_else(|| DomainError::not_found("step"))?;
            match op {
                ChecklistOp::Add { text } => {
                    step.checklist.push(ChecklistItem::new(text.unwrap_or_default()));
                }
                ChecklistOp::Remove { item } => {
                    step.checklist.retain(|entry| entry.id != item);
                }
                ChecklistOp::Toggle { item } => {
                    let entry = step
                        .checklist_item_mut(&item)
                        .ok_or_else(|| DomainError::not_found("checklist item"))?;
                    entry.done = !entry.done;
                    entry.updated_at = UtcTimestamp::now();
                }
                ChecklistOp::Rename { item, text } => {
                    let entry = step
                        .checklist_item_mut(&item)
                        .ok_or_else(|| DomainError::not_found("checklist item"))?;
                    if let Some(text) = text {
                        entry.text = text;
                    }
                    entry.updated_at = UtcTimestamp::now();
                }
            }
            Ok(((), format!("updated checklist of {}", step_id)))
        })
    }

    /// Append notes and adjust artifacts/links on a step.
    pub fn annotate_step(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_id: &StepId,
        note: Option<String>,
        artifacts_add: &[String],
        artifacts_remove: &[String],
        links_add: &[StepId],
    ) -> Result<(), DomainError> {
        self.mutate(plan_id, expected_version, "annotate", |plan| {
            let step = plan
                .find_step_mut(step_id)
                .ok_or_else(|| DomainError::not_found("step"))?;
            if let Some(note) = note {
                step.notes.push(StepNote::new(note));
            }
            for artifact in artifacts_add {
                step.add_artifact(artifact.clone());
            }
            for artifact in artifacts_remove {
                step.artifacts.retain(|a| a != artifact);
            }
            for link in links_add {
                step.add_link(link.clone());
            }
            Ok(((), format!("annotated {}", step_id)))
        })
    }

    /// Set or clear a step's explicit blocked flag. Status is untouched.
    pub fn set_blocked(
        &mut self,
        plan_id: &PlanId,
        expected_version: u64,
        step_id: &StepId,
        reason: Option<String>,
        blocked: bool,
    ) -> Result<(), DomainError> {
        let event_type = if blocked { "block" } else { "unblock" };
        self.mutate(plan_id, expected_version, event_type, |plan| {
            let step = plan
                .find_step_mut(step_id)
                .ok_or_else(|| DomainError::not_found("step"))?;
            step.blocked = blocked;
            step.block_reason = if blocked { reason } else { None };
            let verb = if blocked { "blocked" } else { "unblocked" };
            Ok(((), format!("{} {}", verb, step_id)))
        })
    }

    /// Deep-copy the plan into a new snapshot.
    ///
    /// No fence, no undo push, no version bump.
    pub fn snapshot(
        &mut self,
        plan_id: &PlanId,
        reason: Option<String>,
    ) -> Result<PlanSnapshot, DomainError> {
        let record = self
            .plans
            .get_mut(plan_id)
            .ok_or_else(|| DomainError::not_found("plan"))?;
        let snapshot = PlanSnapshot {
            snapshot_id: random_id("plan-snap-"),
            reason: reason.unwrap_or_default(),
            created_at: UtcTimestamp::now(),
            plan: record.plan.clone(),
        };
        record.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    /// Events in reverse chronological order, truncated to `limit`
    /// (0 means all).
    pub fn history(&self, plan_id: &PlanId, limit: usize) -> Result<Vec<PlanEvent>, DomainError> {
        let record = self.record(plan_id)?;
        let events = record.events.iter().rev().cloned();
        Ok(if limit == 0 {
            events.collect()
        } else {
            events.take(limit).collect()
        })
    }

    /// Undo up to `steps` mutations; returns how many were applied.
    ///
    /// Each applied step moves the current plan onto the redo ring and
    /// restores the most recent undo entry. Events, snapshots, and signals
    /// are unaffected, and no event is emitted.
    pub fn undo(&mut self, plan_id: &PlanId, steps: usize) -> Result<usize, DomainError> {
        let record = self
            .plans
            .get_mut(plan_id)
            .ok_or_else(|| DomainError::not_found("plan"))?;
        let mut applied = 0;
        for _ in 0..steps {
            let Some(previous) = record.undo_stack.pop_back() else {
                break;
            };
            record.redo_stack.push(std::mem::replace(&mut record.plan, previous));
            applied += 1;
        }
        Ok(applied)
    }

    /// Redo up to `steps` undone mutations; returns how many were applied.
    pub fn redo(&mut self, plan_id: &PlanId, steps: usize) -> Result<usize, DomainError> {
        let record = self
            .plans
            .get_mut(plan_id)
            .ok_or_else(|| DomainError::not_found("plan"))?;
        let mut applied = 0;
        for _ in 0..steps {
            let Some(next) = record.redo_stack.pop() else {
                break;
            };
            let current = std::mem::replace(&mut record.plan, next);
            record.push_undo(current);
            applied += 1;
        }
        Ok(applied)
    }

    /// Append an advisory signal. No version bump, no undo.
    pub fn signal(
        &mut self,
        plan_id: &PlanId,
        signal_type: SignalType,
        step_id: Option<StepId>,
        note: Option<String>,
        artifact: Option<String>,
        reason: Option<String>,
    ) -> Result<SignalRecord, DomainError> {
        let record = self
            .plans
            .get_mut(plan_id)
            .ok_or_else(|| DomainError::not_found("plan"))?;
        let signal = SignalRecord {
            timestamp: UtcTimestamp::now(),
            signal_type,
            step_id,
            note,
            artifact,
            reason,
        };
        record.signals.push(signal.clone());
        Ok(signal)
    }
}
