//! Class-reference graph and component-dependency metrics
//!
//! Nodes are class names (case-sensitive, stable across passes, unlike the
//! position-based construct keys in rawdata). The graph answers the
//! component-dependency questions: CCD, ACD and relative ACD.
//!
//! Every `ccd()` call walks the whole graph once per node, so a full
//! recomputation costs O(n·(n+e)) - a simplicity trade-off that holds up
//! for small-to-medium graphs; callers needing more should cache results.

use std::collections::{HashMap, HashSet};

/// Directed graph of class references.
///
/// Invariants: no self-loops, no duplicate edges; degenerate inserts are
/// silently absorbed. Traversals keep their visited set local, so read
/// queries are reentrant.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: HashMap<String, HashSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reference edge, creating both nodes as needed.
    ///
    /// Self-references and already-present edges are absorbed, not errors.
    pub fn add_reference(&mut self, from: &str, to: &str) {
        self.ensure_node(to);
        let children = self.ensure_node(from);
        if from != to {
            children.insert(to.to_string());
        }
    }

    fn ensure_node(&mut self, name: &str) -> &mut HashSet<String> {
        self.nodes.entry(name.to_string()).or_default()
    }

    /// Number of nodes reachable from `name`, including the node itself.
    ///
    /// Resolves-or-creates the node first, so the minimum result is 1.
    pub fn reachable_count(&mut self, name: &str) -> usize {
        self.ensure_node(name);
        self.reachable_from(name)
    }

    /// Reachable count for an existing node, `None` if the name is unknown.
    pub fn depends_upon(&self, name: &str) -> Option<usize> {
        if self.nodes.contains_key(name) {
            Some(self.reachable_from(name))
        } else {
            None
        }
    }

    // Iterative depth-first marking with a traversal-local visited set:
    // cycle-safe, reentrant, and bounded by heap rather than call stack.
    fn reachable_from(&self, start: &str) -> usize {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack = vec![start];
        while let Some(name) = stack.pop() {
            if !visited.insert(name) {
                continue;
            }
            if let Some(children) = self.nodes.get(name) {
                for child in children {
                    if !visited.contains(child.as_str()) {
                        stack.push(child.as_str());
                    }
                }
            }
        }
        visited.len()
    }

    /// Cumulative component dependency: the sum of reachable counts over
    /// every node in the graph.
    pub fn ccd(&self) -> usize {
        self.nodes.keys().map(|name| self.reachable_from(name)).sum()
    }

    /// Average component dependency: CCD / n, 0.0 for the empty graph.
    pub fn acd(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        self.ccd() as f64 / self.nodes.len() as f64
    }

    /// Relative ACD: ACD / n, a fraction in [0, 1]; 0.0 for the empty graph.
    ///
    /// This is the externally reported coupling indicator.
    pub fn relative_acd(&self) -> f64 {
        if self.nodes.is_empty() {
            return 0.0;
        }
        self.acd() / self.nodes.len() as f64
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Snapshot of all node names. Order unspecified.
    pub fn node_names(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(HashSet::len).sum()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_graph_metrics_are_zero() {
        let graph = DependencyGraph::new();
        assert_eq!(graph.ccd(), 0);
        assert_eq!(graph.acd(), 0.0);
        assert_eq!(graph.relative_acd(), 0.0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_add_reference_is_idempotent() {
        let mut graph = DependencyGraph::new();
        graph.add_reference("A", "B");
        graph.add_reference("A", "B");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_self_references_are_absorbed() {
        let mut graph = DependencyGraph::new();
        graph.add_reference("A", "A");
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.reachable_count("A"), 1);
    }

    #[test]
    fn test_isolated_nodes() {
        let mut graph = DependencyGraph::new();
        for name in ["A", "B", "C", "D"] {
            assert_eq!(graph.reachable_count(name), 1);
        }
        // CCD = n, ACD = 1, relative ACD = 1/n
        assert_eq!(graph.ccd(), 4);
        assert_eq!(graph.acd(), 1.0);
        assert_eq!(graph.relative_acd(), 0.25);
    }

    #[test]
    fn test_fully_connected_graph() {
        let names = ["A", "B", "C"];
        let mut graph = DependencyGraph::new();
        for from in names {
            for to in names {
                graph.add_reference(from, to);
            }
        }
        for name in names {
            assert_eq!(graph.reachable_count(name), 3);
        }
        assert_eq!(graph.ccd(), 9);
        assert_eq!(graph.acd(), 3.0);
        assert_eq!(graph.relative_acd(), 1.0);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut graph = DependencyGraph::new();
        graph.add_reference("A", "B");
        graph.add_reference("B", "A");
        assert_eq!(graph.reachable_count("A"), 2);
        assert_eq!(graph.reachable_count("B"), 2);
        assert_eq!(graph.ccd(), 4);
    }

    #[test]
    fn test_chain_reachability() {
        let mut graph = DependencyGraph::new();
        graph.add_reference("A", "B");
        graph.add_reference("B", "C");
        assert_eq!(graph.reachable_count("A"), 3);
        assert_eq!(graph.reachable_count("C"), 1);
        assert_eq!(graph.ccd(), 6);
        assert_eq!(graph.acd(), 2.0);
    }

    #[test]
    fn test_reachable_count_creates_unknown_node() {
        let mut graph = DependencyGraph::new();
        assert_eq!(graph.reachable_count("Lonely"), 1);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.depends_upon("Lonely"), Some(1));
        assert_eq!(graph.depends_upon("Unknown"), None);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut graph = DependencyGraph::new();
        graph.add_reference("A", "B");
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.ccd(), 0);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let mut graph = DependencyGraph::new();
        for i in 0..10_000u32 {
            graph.add_reference(&format!("n{i}"), &format!("n{}", i + 1));
        }
        assert_eq!(graph.reachable_count("n0"), 10_001);
    }
}
