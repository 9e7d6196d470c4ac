//! core::plan
//!
//! Plan, step, and annotation entities.
//!
//! # Model
//!
//! A [`Plan`] is an ordered sequence of [`Step`]s toward a goal, carrying a
//! monotonically increasing version counter. Step order is semantically
//! significant: it is the default execution order and is user-editable.
//! Steps own their [`ChecklistItem`]s and append-only [`StepNote`]s.
//!
//! Value semantics are deliberate: undo entries and snapshots are plain
//! clones of the plan, independent of later mutations.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::graph::DepGraph;
use super::types::{random_id, PlanId, PlanMode, StepId, StepStatus, UtcTimestamp};

/// A single checklist item owned by a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub done: bool,
    pub created_at: UtcTimestamp,
    pub updated_at: UtcTimestamp,
}

impl ChecklistItem {
    /// Create a new unchecked item with a minted `chk-` id.
    pub fn new(text: impl Into<String>) -> Self {
        let now = UtcTimestamp::now();
        Self {
            id: random_id("chk-"),
            text: text.into(),
            done: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// An append-only note attached to a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepNote {
    pub id: String,
    pub text: String,
    pub timestamp: UtcTimestamp,
}

impl StepNote {
    /// Create a new note with a minted `note-` id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: random_id("note-"),
            text: text.into(),
            timestamp: UtcTimestamp::now(),
        }
    }
}

/// An atomic unit of planned work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: StepStatus,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub acceptance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate_hours: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<StepId>,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub links: Vec<StepId>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default)]
    pub notes: Vec<StepNote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<StepId>,
    #[serde(default)]
    pub virtual_parent: bool,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

impl Step {
    /// Create a pending step with the given id and title.
    pub fn new(id: StepId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            status: StepStatus::Pending,
            priority: 0,
            owner: String::new(),
            acceptance: String::new(),
            estimate_hours: None,
            tags: Vec::new(),
            dependencies: Vec::new(),
            artifacts: Vec::new(),
            links: Vec::new(),
            checklist: Vec::new(),
            notes: Vec::new(),
            parent_id: None,
            virtual_parent: false,
            blocked: false,
            block_reason: None,
        }
    }

    /// Add a tag unless already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        push_unique(&mut self.tags, tag.into());
    }

    /// Remove a tag; missing tags are a no-op.
    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    /// Add an artifact path unless already present.
    pub fn add_artifact(&mut self, artifact: impl Into<String>) {
        push_unique(&mut self.artifacts, artifact.into());
    }

    /// Add a link to another step unless already present.
    pub fn add_link(&mut self, link: StepId) {
        push_unique(&mut self.links, link);
    }

    /// Find a checklist item by id.
    pub fn checklist_item_mut(&mut self, item_id: &str) -> Option<&mut ChecklistItem> {
        self.checklist.iter_mut().find(|item| item.id == item_id)
    }
}

/// Append `value` to `list` unless an equal element is already present.
pub fn push_unique<T: PartialEq>(list: &mut Vec<T>, value: T) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// The root planning entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub title: String,
    pub goal: String,
    pub mode: PlanMode,
    pub created_at: UtcTimestamp,
    pub updated_at: UtcTimestamp,
    pub version: u64,
    pub steps: Vec<Step>,
    pub next_step_ordinal: u64,
}

impl Plan {
    /// Create an empty plan at version 1.
    pub fn new(id: PlanId, goal: impl Into<String>, title: impl Into<String>, mode: PlanMode) -> Self {
        let now = UtcTimestamp::now();
        Self {
            id,
            title: title.into(),
            goal: goal.into(),
            mode,
            created_at: now.clone(),
            updated_at: now,
            version: 1,
            steps: Vec::new(),
            next_step_ordinal: 1,
        }
    }

    /// Mint the next step id (`s{ordinal}`), skipping ordinals that would
    /// collide with an existing id.
    pub fn mint_step_id(&mut self) -> StepId {
        loop {
            let candidate = format!("s{}", self.next_step_ordinal);
            self.next_step_ordinal += 1;
            if !self.steps.iter().any(|s| s.id.as_str() == candidate) {
                // Candidate is validated by construction: "s" + digits.
                return StepId::new(candidate).expect("minted step id is valid");
            }
        }
    }

    /// Find a step by id.
    pub fn find_step(&self, id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|s| &s.id == id)
    }

    /// Find a step by id, mutably.
    pub fn find_step_mut(&mut self, id: &StepId) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| &s.id == id)
    }

    /// Position of a step in the execution order.
    pub fn step_index(&self, id: &StepId) -> Option<usize> {
        self.steps.iter().position(|s| &s.id == id)
    }

    /// Remove the given ids from every step's dependency list.
    pub fn scrub_dependencies(&mut self, removed: &HashSet<StepId>) {
        for step in &mut self.steps {
            step.dependencies.retain(|dep| !removed.contains(dep));
        }
    }

    /// Build the dependency graph over the current step set.
    pub fn dep_graph(&self) -> DepGraph {
        DepGraph::from_pairs(self.steps.iter().map(|s| (&s.id, s.dependencies.as_slice())))
    }

    /// Check the acyclicity invariant.
    pub fn has_dependency_cycle(&self) -> bool {
        self.dep_graph().has_cycle()
    }

    /// Extract one representative dependency cycle, if any.
    pub fn dependency_cycle(&self) -> Vec<StepId> {
        self.dep_graph().find_cycle()
    }

    /// Dependencies of `step` that are not satisfied for marking it done.
    ///
    /// A dependency is unsatisfied when it names a step that is not `done`,
    /// or when it names no existing step at all. Dangling references are
    /// tolerated elsewhere and reported here.
    pub fn unsatisfied_dependencies(&self, step: &Step) -> Vec<StepId> {
        step.dependencies
            .iter()
            .filter(|dep| {
                !matches!(
                    self.find_step(dep).map(|d| d.status),
                    Some(StepStatus::Done)
                )
            })
            .cloned()
            .collect()
    }
}
