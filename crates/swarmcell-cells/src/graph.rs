//! Dependency-cycle rejection. Grounded on
//! `cortex-causal::graph::dag_enforcement`'s "would this edge close a cycle"
//! check, reimplemented over a `petgraph::graphmap::DiGraphMap` mirror of
//! the `blocks`/`blocked-by` edge set.

use std::collections::{HashMap, HashSet};

use petgraph::graphmap::DiGraphMap;
use petgraph::algo::has_path_connecting;

use swarmcell_core::model::{Dependency, DependencyKind};

/// A `DiGraphMap` of cell ids over the blocking edge set, rebuilt from
/// storage whenever the cell store opens and kept in sync by
/// `add_edge`/`remove_edge` inside the same transaction as the mutation.
pub struct BlockingGraph {
    graph: DiGraphMap<CellNode, ()>,
}

/// `DiGraphMap` node weights must be `Copy`; cell ids are interned as
/// indices into a side table so the graph itself stays cheap to clone.
type CellNode = u32;

pub struct BlockingGraphBuilder {
    ids: Vec<String>,
    index: HashMap<String, CellNode>,
}

impl BlockingGraphBuilder {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn intern(&mut self, id: &str) -> CellNode {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.ids.len() as CellNode;
        self.ids.push(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    pub fn build(mut self, edges: &[Dependency]) -> (BlockingGraph, HashMap<String, CellNode>) {
        let mut graph = DiGraphMap::new();
        for edge in edges {
            let (blocker, blocked) = blocker_and_blocked(edge.kind, &edge.cell_id, &edge.depends_on_id);
            let from = self.intern(blocker);
            let to = self.intern(blocked);
            graph.add_edge(from, to, ());
        }
        (BlockingGraph { graph }, self.index)
    }
}

/// `Blocks(cell_id, depends_on_id)` means `cell_id` blocks `depends_on_id`;
/// `BlockedBy(cell_id, depends_on_id)` means the reverse — `depends_on_id`
/// blocks `cell_id`. Both kinds must normalize to the same canonical
/// blocker-\>blocked edge direction or the graph mirror mixes two opposite
/// interpretations of the same real-world relationship.
pub fn blocker_and_blocked<'a>(kind: DependencyKind, cell_id: &'a str, depends_on_id: &'a str) -> (&'a str, &'a str) {
    if kind == DependencyKind::BlockedBy {
        (depends_on_id, cell_id)
    } else {
        (cell_id, depends_on_id)
    }
}

impl BlockingGraph {
    /// Would adding a `kind` edge between `cell_id` and `depends_on_id` close
    /// a cycle? True if the prospective blocked cell can already reach the
    /// prospective blocker.
    pub fn would_create_cycle(&self, ids: &HashMap<String, CellNode>, cell_id: &str, depends_on_id: &str, kind: DependencyKind) -> bool {
        if cell_id == depends_on_id {
            return true;
        }
        let (blocker, blocked) = blocker_and_blocked(kind, cell_id, depends_on_id);
        let (Some(&from), Some(&to)) = (ids.get(blocked), ids.get(blocker)) else {
            return false;
        };
        has_path_connecting(&self.graph, from, to, None)
    }
}

/// Standalone cycle detector over a plain adjacency list, exposed to the
/// doctor so it can run against data reconstructed from row scans without
/// the live `petgraph` mirror. Returns every cycle found, as ordered node
/// lists, including self-loops.
pub fn find_cycles(adjacency: &HashMap<String, Vec<String>>) -> Vec<Vec<String>> {
    let mut cycles = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();

    for start in adjacency.keys() {
        if visited.contains(start) {
            continue;
        }
        let mut stack: Vec<String> = Vec::new();
        let mut on_stack: HashSet<String> = HashSet::new();
        detect_from(start, adjacency, &mut stack, &mut on_stack, &mut visited, &mut cycles);
    }

    cycles
}

fn detect_from(
    node: &str,
    adjacency: &HashMap<String, Vec<String>>,
    stack: &mut Vec<String>,
    on_stack: &mut HashSet<String>,
    visited: &mut HashSet<String>,
    cycles: &mut Vec<Vec<String>>,
) {
    stack.push(node.to_string());
    on_stack.insert(node.to_string());

    if let Some(neighbors) = adjacency.get(node) {
        for next in neighbors {
            if next == node {
                cycles.push(vec![node.to_string(), node.to_string()]);
                continue;
            }
            if on_stack.contains(next) {
                let start = stack.iter().position(|n| n == next).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].to_vec();
                cycle.push(next.clone());
                cycles.push(cycle);
            } else if !visited.contains(next) {
                detect_from(next, adjacency, stack, on_stack, visited, cycles);
            }
        }
    }

    stack.pop();
    on_stack.remove(node);
    visited.insert(node.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adj(pairs: &[(&str, &str)]) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (from, to) in pairs {
            map.entry(from.to_string()).or_default().push(to.to_string());
        }
        map
    }

    #[test]
    fn finds_simple_cycle() {
        let adjacency = adj(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let cycles = find_cycles(&adjacency);
        assert!(!cycles.is_empty());
    }

    #[test]
    fn finds_self_loop() {
        let adjacency = adj(&[("a", "a")]);
        let cycles = find_cycles(&adjacency);
        assert_eq!(cycles, vec![vec!["a".to_string(), "a".to_string()]]);
    }

    #[test]
    fn acyclic_graph_reports_nothing() {
        let adjacency = adj(&[("a", "b"), ("b", "c")]);
        assert!(find_cycles(&adjacency).is_empty());
    }
}
