//! Directed graph built from the edge list.
//!
//! The node set comes from edge endpoints only, in the order they first
//! appear (source before target). Nodes that exist in the node table but
//! have no edges are not part of the graph and are never drawn. Repeated
//! `(source, target)` rows collapse into a single edge.

use crate::network::{EdgeRecord, NodeId};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct RenderedGraph {
    digraph: DiGraph<NodeId, ()>,
    /// Maps node id to its petgraph index.
    index: HashMap<NodeId, NodeIndex>,
}

impl RenderedGraph {
    pub fn from_edges(edges: &[EdgeRecord]) -> Self {
        let mut graph = Self::default();
        for edge in edges {
            let s = graph.node(&edge.source);
            let t = graph.node(&edge.target);
            graph.digraph.update_edge(s, t, ());
        }
        graph
    }

    fn node(&mut self, id: &NodeId) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.digraph.add_node(id.clone());
        self.index.insert(id.clone(), idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.digraph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.digraph.edge_count()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Node ids in graph order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.digraph.node_indices().map(move |i| &self.digraph[i])
    }

    /// Edges as `(source, target)` id pairs, in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> {
        self.digraph
            .raw_edges()
            .iter()
            .map(move |e| (&self.digraph[e.source()], &self.digraph[e.target()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(graph: &RenderedGraph) -> Vec<&str> {
        graph.nodes().map(|n| n.0.as_str()).collect()
    }

    #[test]
    fn test_isolated_nodes_are_dropped() {
        let graph = RenderedGraph::from_edges(&[EdgeRecord::new("A", "B")]);
        assert_eq!(ids(&graph), vec!["A", "B"]);
        assert!(!graph.contains(&NodeId::from("C")));
    }

    #[test]
    fn test_first_appearance_order() {
        let graph = RenderedGraph::from_edges(&[
            EdgeRecord::new("3", "1"),
            EdgeRecord::new("2", "3"),
            EdgeRecord::new("1", "4"),
        ]);
        assert_eq!(ids(&graph), vec!["3", "1", "2", "4"]);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn test_repeated_rows_collapse() {
        let graph = RenderedGraph::from_edges(&[
            EdgeRecord::new("a", "b"),
            EdgeRecord::new("a", "b"),
            EdgeRecord::new("b", "a"),
        ]);
        assert_eq!(graph.edge_count(), 2);
        let pairs: Vec<(&str, &str)> = graph
            .edges()
            .map(|(s, t)| (s.0.as_str(), t.0.as_str()))
            .collect();
        assert_eq!(pairs, vec![("a", "b"), ("b", "a")]);
    }

    #[test]
    fn test_empty_edges() {
        let graph = RenderedGraph::from_edges(&[]);
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edges().count(), 0);
    }
}
