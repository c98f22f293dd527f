//! Cycle detection over candidate routing batches.
//!
//! The detector is pure: it builds a directed graph from an explicit batch
//! of (source, destination) edges and looks for a cycle, direct or
//! transitive. It holds no state of its own; the `deadlock_count`
//! side-counter lives behind the queue's synchronization boundary (see
//! [`PatchQueue::check_deadlock`](crate::PatchQueue::check_deadlock)).

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::PatchbayError;
use crate::patch::Patch;

/// One directed routing edge in a candidate batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEdge {
    pub source: String,
    pub destination: String,
}

impl RouteEdge {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

impl From<&Patch> for RouteEdge {
    fn from(patch: &Patch) -> Self {
        Self::new(patch.source_node.clone(), patch.destination_node.clone())
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

/// Detects cyclic routing chains within a batch of edges.
pub struct DeadlockDetector;

impl DeadlockDetector {
    /// True iff the batch contains any cycle. Never raises.
    pub fn detect(edges: &[RouteEdge]) -> bool {
        Self::find_cycle(edges).is_some()
    }

    /// Like [`detect`](Self::detect), but raises with the discovered
    /// cyclic path when a cycle exists.
    pub fn detect_or_raise(edges: &[RouteEdge]) -> Result<(), PatchbayError> {
        match Self::find_cycle(edges) {
            Some(cycle) => Err(PatchbayError::DeadlockDetected { cycle }),
            None => Ok(()),
        }
    }

    /// Returns the first cycle found as a closed walk (`[a, b, a]`), or
    /// `None` for acyclic batches. Iterative DFS with tri-color marking;
    /// adjacency is ordered so the result is deterministic for a given
    /// batch.
    pub fn find_cycle(edges: &[RouteEdge]) -> Option<Vec<String>> {
        let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for edge in edges {
            adjacency
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.destination.as_str());
        }

        let mut visit: HashMap<&str, Visit> = HashMap::new();
        let roots: Vec<&str> = adjacency.keys().copied().collect();

        for root in roots {
            if visit.contains_key(root) {
                continue;
            }
            // Stack of (node, next child index) mirroring the DFS path.
            let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
            visit.insert(root, Visit::InProgress);

            while let Some(top) = stack.len().checked_sub(1) {
                let (node, child_idx) = stack[top];
                let next = adjacency
                    .get(node)
                    .and_then(|children| children.get(child_idx))
                    .copied();
                stack[top].1 += 1;

                match next {
                    Some(child) => match visit.get(child) {
                        Some(Visit::InProgress) => {
                            // Back-edge: the path from `child` to the stack
                            // top closes a cycle.
                            let start = stack
                                .iter()
                                .position(|(n, _)| *n == child)
                                .unwrap_or(0);
                            let mut cycle: Vec<String> = stack[start..]
                                .iter()
                                .map(|(n, _)| n.to_string())
                                .collect();
                            cycle.push(child.to_string());
                            return Some(cycle);
                        }
                        Some(Visit::Done) => {}
                        None => {
                            visit.insert(child, Visit::InProgress);
                            stack.push((child, 0));
                        }
                    },
                    None => {
                        visit.insert(node, Visit::Done);
                        stack.pop();
                    }
                }
            }
        }
        None
    }
}
