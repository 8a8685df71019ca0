//! Runtime logic graph built from a persisted [`GraphModel`].
//!
//! The graph wraps nodes and edges in a petgraph `DiGraph` for efficient
//! successor resolution during traversal. Unlike the persisted model it is
//! immutable after compilation; traversal never mutates nodes or edges.

use std::collections::HashMap;

use petgraph::{
    Direction,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};

use crate::{
    PageflowError, Result,
    graph::{
        edge::{Edge, EdgeSelect},
        node::{Node, NodeId, NodeKind},
    },
    model::GraphModel,
};

/// One compiled logic graph for a single logic owner.
pub struct Graph {
    graph: DiGraph<Node, Edge>,
    index: HashMap<NodeId, NodeIndex>,
}

impl Graph {
    /// get node by id
    pub fn get_node(
        &self,
        id: &NodeId,
    ) -> Option<&Node> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    /// Iterate all event nodes (traversal entry points).
    pub fn event_nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_indices().map(|idx| &self.graph[idx]).filter(|n| n.kind == NodeKind::Event)
    }

    /// Collect the ids of a node's successors along edges matching `select`.
    ///
    /// An unknown node id yields no successors; dangling edges are a
    /// validation concern upstream, not a traversal failure.
    pub fn successors(
        &self,
        nid: &NodeId,
        select: &EdgeSelect,
    ) -> Vec<NodeId> {
        let Some(src_idx) = self.index.get(nid) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(*src_idx, Direction::Outgoing)
            .filter(|edge_ref| match select {
                EdgeSelect::Any => true,
                EdgeSelect::Handle(handle) => edge_ref.weight().source_handle == *handle,
            })
            .map(|edge_ref| self.graph[edge_ref.target()].id.clone())
            .collect()
    }

    /// Output a human-readable representation of the graph for authoring
    /// diagnostics.
    pub fn schema(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Logic Graph ===".to_string());
        lines.push(format!("Nodes: {}, Edges: {}", self.graph.node_count(), self.graph.edge_count()));
        lines.push(String::new());

        lines.push("--- Nodes ---".to_string());
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            lines.push(format!("[{}] {}", node.id, node.kind.as_ref()));
        }
        lines.push(String::new());

        lines.push("--- Structure ---".to_string());
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let outgoing: Vec<String> = self
                .graph
                .edges_directed(idx, Direction::Outgoing)
                .map(|e| format!("{}({})", self.graph[e.target()].id, e.weight().source_handle.as_str()))
                .collect();

            if outgoing.is_empty() {
                lines.push(format!("{} -> (end)", node.id));
            } else {
                lines.push(format!("{} -> {}", node.id, outgoing.join(", ")));
            }
        }

        lines.join("\n")
    }
}

impl TryFrom<&GraphModel> for Graph {
    type Error = PageflowError;

    fn try_from(model: &GraphModel) -> Result<Self> {
        let mut graph: DiGraph<Node, Edge> = DiGraph::new();
        let mut index = HashMap::new();

        for node_model in model.nodes.iter() {
            if node_model.kind.parse::<NodeKind>().is_err() {
                // Unknown kinds stay out of the graph, so traversal halts
                // quietly at the preceding node instead of crashing the page.
                tracing::warn!(node = %node_model.id, kind = %node_model.kind, "no executor registered for node kind");
                continue;
            }
            let node = Node::new(node_model)?;
            if index.contains_key(&node.id) {
                return Err(PageflowError::Graph(format!("duplicate node id {}", node.id)));
            }
            let nid = node.id.clone();
            let node_idx = graph.add_node(node);
            index.insert(nid, node_idx);
        }

        for edge_model in model.edges.iter() {
            let edge = Edge::new(edge_model)?;
            // Edges referencing unknown nodes are dropped, matching the
            // silent-skip contract for dangling references.
            let (Some(source), Some(target)) = (index.get(&edge.source), index.get(&edge.target)) else {
                tracing::debug!(edge = %edge.id, "dropping edge with dangling endpoint");
                continue;
            };
            graph.add_edge(*source, *target, edge);
        }

        Ok(Self {
            graph,
            index,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        graph::edge::{FixedHandle, SourceHandle},
        model::{EdgeModel, NodeModel},
    };
    use serde_json::json;

    fn node(
        id: &str,
        kind: &str,
        data: serde_json::Value,
    ) -> NodeModel {
        NodeModel {
            id: id.to_string(),
            kind: kind.to_string(),
            data,
            position: Default::default(),
        }
    }

    fn edge(
        id: &str,
        source: &str,
        target: &str,
        handle: Option<&str>,
    ) -> EdgeModel {
        EdgeModel {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: handle.map(str::to_string),
        }
    }

    #[test]
    fn test_successors_by_handle() {
        let model = GraphModel {
            nodes: vec![
                node("ev", "eventNode", json!({"eventType": "click"})),
                node("if", "ifNode", json!({"conditionSource": "variable", "variableName": "x", "comparisonType": "number", "comparison": ">", "comparisonValue": 1})),
                node("a", "actionNode", json!({"targetItemId": "i1", "mode": "show"})),
                node("b", "actionNode", json!({"targetItemId": "i1", "mode": "hide"})),
            ],
            edges: vec![
                edge("e1", "ev", "if", None),
                edge("e2", "if", "a", Some("true")),
                edge("e3", "if", "b", Some("false")),
            ],
        };
        let graph = Graph::try_from(&model).unwrap();

        assert_eq!(graph.successors(&"ev".to_string(), &EdgeSelect::Any), vec!["if".to_string()]);
        assert_eq!(
            graph.successors(&"if".to_string(), &EdgeSelect::Handle(FixedHandle::True.into())),
            vec!["a".to_string()]
        );
        assert_eq!(
            graph.successors(&"if".to_string(), &EdgeSelect::Handle(FixedHandle::False.into())),
            vec!["b".to_string()]
        );
        // default-handle filter does not match labeled edges
        assert!(graph.successors(&"if".to_string(), &EdgeSelect::Handle(SourceHandle::default())).is_empty());
        // unknown node id yields nothing
        assert!(graph.successors(&"zzz".to_string(), &EdgeSelect::Any).is_empty());
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        let model = GraphModel {
            nodes: vec![node("n1", "mysteryNode", json!({}))],
            edges: vec![],
        };
        let graph = Graph::try_from(&model).unwrap();
        assert!(graph.get_node(&"n1".to_string()).is_none());
    }

    #[test]
    fn test_dangling_edge_is_dropped() {
        let model = GraphModel {
            nodes: vec![node("ev", "eventNode", json!({}))],
            edges: vec![edge("e1", "ev", "ghost", None)],
        };
        let graph = Graph::try_from(&model).unwrap();
        assert!(graph.successors(&"ev".to_string(), &EdgeSelect::Any).is_empty());
    }
}
