//! store::context
//!
//! Captured context entries, task scopes, and MIC packing.
//!
//! # Model
//!
//! Entries are captured per task and carry a textual summary; pinning makes
//! an entry survive competition for the packing budget. A task's scope
//! restricts which entries are eligible: path allow/deny prefixes and an
//! optional type whitelist.
//!
//! Packing walks the eligible entries ordered by (type priority, pinned
//! first, recency) and appends summaries until the character budget is
//! exhausted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{random_id, TaskId, UtcTimestamp};

use super::brief::truncate_chars;

/// Path and type restrictions for a task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeConfig {
    pub allow: Vec<String>,
    pub deny: Vec<String>,
    pub types: Vec<String>,
}

impl ScopeConfig {
    /// Whether an entry with the given type and paths is in scope.
    fn admits(&self, entry_type: &str, paths: &[String]) -> bool {
        if !self.types.is_empty() && !self.types.iter().any(|t| t == entry_type) {
            return false;
        }
        if paths.iter().any(|p| self.deny.iter().any(|d| p.starts_with(d))) {
            return false;
        }
        if !self.allow.is_empty()
            && !paths.is_empty()
            && !paths.iter().any(|p| self.allow.iter().any(|a| p.starts_with(a)))
        {
            return false;
        }
        true
    }
}

/// A captured context entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub id: String,
    pub task: TaskId,
    #[serde(rename = "type")]
    pub entry_type: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub payload_ref: String,
    #[serde(default)]
    pub pinned: bool,
    pub captured_at: UtcTimestamp,
}

/// Specification for capturing a new entry.
#[derive(Debug, Clone, Default)]
pub struct CaptureSpec {
    pub entry_type: String,
    pub title: String,
    pub summary: String,
    pub paths: Vec<String>,
    pub tags: Vec<String>,
    pub keywords: Vec<String>,
    pub source: String,
    pub payload_ref: String,
    pub pinned: bool,
}

/// Result of packing context for the MIC.
#[derive(Debug, Clone, Serialize)]
pub struct PackedContext {
    pub text: String,
    pub used_ids: Vec<String>,
}

/// The context store.
#[derive(Debug, Default)]
pub struct ContextStore {
    scopes: HashMap<TaskId, ScopeConfig>,
    entries: Vec<ContextEntry>,
}

impl ContextStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (replace) the scope for a task.
    pub fn set_scope(&mut self, task: TaskId, scope: ScopeConfig) {
        self.scopes.insert(task, scope);
    }

    /// The scope for a task, if one was installed.
    pub fn scope(&self, task: &TaskId) -> Option<&ScopeConfig> {
        self.scopes.get(task)
    }

    /// Capture an entry; returns its minted id.
    pub fn capture(&mut self, task: TaskId, spec: CaptureSpec) -> String {
        let entry = ContextEntry {
            id: random_id("ctx-"),
            task,
            entry_type: spec.entry_type,
            title: spec.title,
            summary: spec.summary,
            paths: spec.paths,
            tags: spec.tags,
            keywords: spec.keywords,
            source: spec.source,
            payload_ref: spec.payload_ref,
            pinned: spec.pinned,
            captured_at: UtcTimestamp::now(),
        };
        let id = entry.id.clone();
        self.entries.push(entry);
        id
    }

    /// Look up an entry by id.
    pub fn entry(&self, id: &str) -> Option<&ContextEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Pin or unpin entries; returns the ids actually affected.
    ///
    /// Unknown ids are skipped rather than failing the whole batch.
    pub fn pin(&mut self, ids: &[String], pinned: bool) -> Vec<String> {
        let mut affected = Vec::new();
        for entry in &mut self.entries {
            if ids.contains(&entry.id) && entry.pinned != pinned {
                entry.pinned = pinned;
                affected.push(entry.id.clone());
            }
        }
        affected
    }

    /// Pack eligible entries into a bounded side-context text.
    ///
    /// `type_priority` ranks entry types; unlisted types come last in
    /// capture order. Within a type, pinned entries come first, newest
    /// first. Each admitted entry contributes one `[type] title: summary`
    /// line until the `token_cap * 4` character budget is spent.
    pub fn pack_for_mic(
        &self,
        task: &TaskId,
        token_cap: usize,
        type_priority: &[String],
    ) -> PackedContext {
        let scope = self.scopes.get(task).cloned().unwrap_or_default();

        let mut eligible: Vec<(usize, &ContextEntry)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| &e.task == task && scope.admits(&e.entry_type, &e.paths))
            .map(|(index, e)| (index, e))
            .collect();

        let rank = |entry: &ContextEntry| {
            type_priority
                .iter()
                .position(|t| t == &entry.entry_type)
                .unwrap_or(type_priority.len())
        };
        eligible.sort_by(|&(ai, a), &(bi, b)| {
            rank(a)
                .cmp(&rank(b))
                .then_with(|| b.pinned.cmp(&a.pinned))
                .then_with(|| b.captured_at.cmp(&a.captured_at))
                .then_with(|| bi.cmp(&ai))
        });

        let budget = token_cap * 4;
        let mut text = String::new();
        let mut used_ids = Vec::new();
        for (_, entry) in eligible {
            let mut line = format!("[{}] {}: {}\n", entry.entry_type, entry.title, entry.summary);
            if text.len() + line.len() > budget {
                let remaining = budget - text.len();
                truncate_chars(&mut line, remaining);
                if line.is_empty() {
                    break;
                }
                text.push_str(&line);
                used_ids.push(entry.id.clone());
                break;
            }
            text.push_str(&line);
            used_ids.push(entry.id.clone());
        }

        PackedContext { text, used_ids }
    }
}
