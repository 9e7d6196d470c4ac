//! core::graph
//!
//! Dependency-graph checks over a plan's step set.
//!
//! # Architecture
//!
//! The dependency graph is a DAG where:
//! - Nodes are steps
//! - Edges point from a step to each of its dependencies
//!
//! Edges whose target is not present in the plan are ignored here; dangling
//! references are reported by the store at the operations that care about
//! them, not by the graph walk.
//!
//! # Invariants
//!
//! - The graph must be acyclic after every committed mutation
//! - Checks are O(V+E) and never mutate

use super::types::StepId;
use std::collections::{HashMap, HashSet};

/// The dependency graph derived from a plan's steps.
///
/// This is an in-memory view computed from step dependency lists.
#[derive(Debug, Default)]
pub struct DepGraph {
    /// Node ids in plan order, for deterministic traversal.
    order: Vec<StepId>,
    /// Outgoing edges (step -> dependencies), restricted to present nodes.
    edges: HashMap<StepId, Vec<StepId>>,
}

/// DFS colors: absent from `visited` = white, in `path` = gray, in
/// `visited` but not `path` = black.
struct Walk<'a> {
    edges: &'a HashMap<StepId, Vec<StepId>>,
    visited: HashSet<StepId>,
    path: Vec<StepId>,
    on_path: HashSet<StepId>,
}

impl DepGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(id, dependencies)` pairs in plan order.
    ///
    /// Dependencies that do not name a node are dropped.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a StepId, &'a [StepId])> + Clone,
    {
        let present: HashSet<StepId> = pairs.clone().into_iter().map(|(id, _)| id.clone()).collect();
        let mut graph = Self::new();
        for (id, deps) in pairs {
            let kept: Vec<StepId> = deps.iter().filter(|d| present.contains(d)).cloned().collect();
            graph.order.push(id.clone());
            graph.edges.insert(id.clone(), kept);
        }
        graph
    }

    /// Check whether the graph contains any directed cycle.
    pub fn has_cycle(&self) -> bool {
        !self.find_cycle().is_empty()
    }

    /// Find one representative cycle.
    ///
    /// Returns the ids along the cycle in traversal order, or an empty
    /// vector when the graph is acyclic.
    ///
    /// # Example
    ///
    /// ```
    /// use planloom::core::graph::DepGraph;
    /// use planloom::core::types::StepId;
    ///
    /// let a = StepId::new("a").unwrap();
    /// let b = StepId::new("b").unwrap();
    /// let a_deps = [b.clone()];
    /// let b_deps = [a.clone()];
    /// let graph = DepGraph::from_pairs(vec![
    ///     (&a, &a_deps[..]),
    ///     (&b, &b_deps[..]),
    /// ]);
    ///
    /// let cycle = graph.find_cycle();
    /// assert_eq!(cycle.len(), 2);
    /// ```
    pub fn find_cycle(&self) -> Vec<StepId> {
        let mut walk = Walk {
            edges: &self.edges,
            visited: HashSet::new(),
            path: Vec::new(),
            on_path: HashSet::new(),
        };

        for id in &self.order {
            if let Some(cycle) = walk.visit(id) {
                return cycle;
            }
        }
        Vec::new()
    }
}

impl Walk<'_> {
    fn visit(&mut self, id: &StepId) -> Option<Vec<StepId>> {
        if self.on_path.contains(id) {
            // Gray node: the cycle is the path suffix starting at `id`.
            let start = self.path.iter().position(|p| p == id)?;
            return Some(self.path[start..].to_vec());
        }
        if self.visited.contains(id) {
            return None;
        }

        self.visited.insert(id.clone());
        self.on_path.insert(id.clone());
        self.path.push(id.clone());

        if let Some(deps) = self.edges.get(id) {
            for dep in deps {
                if let Some(cycle) = self.visit(dep) {
                    return Some(cycle);
                }
            }
        }

        self.path.pop();
        self.on_path.remove(id);
        None
    }
}
