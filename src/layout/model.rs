use std::collections::HashMap;

use serde::Serialize;

use crate::ir::Graph;

use super::error::{LayoutError, Result};

/// Dense node index, in declaration order.
pub type NodeIdx = usize;

/// Position of an edge in the input edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EdgeId(pub usize);

#[derive(Debug, Clone)]
pub struct ModelEdge {
    pub from: NodeIdx,
    pub to: NodeIdx,
    pub dashed: bool,
    pub label: Option<String>,
}

/// Immutable adjacency view of a [`Graph`], built once per layout run and
/// shared read-only by every stage.
#[derive(Debug, Clone)]
pub struct GraphModel {
    ids: Vec<String>,
    labels: Vec<String>,
    index: HashMap<String, NodeIdx>,
    edges: Vec<ModelEdge>,
    out_edges: Vec<Vec<EdgeId>>,
    in_edges: Vec<Vec<EdgeId>>,
}

impl GraphModel {
    pub fn build(graph: &Graph) -> Result<Self> {
        let mut ids = Vec::with_capacity(graph.nodes.len());
        let mut labels = Vec::with_capacity(graph.nodes.len());
        let mut index = HashMap::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            if index.insert(node.id.clone(), ids.len()).is_some() {
                return Err(LayoutError::DuplicateNode {
                    id: node.id.clone(),
                });
            }
            ids.push(node.id.clone());
            labels.push(node.display_label().to_string());
        }

        let mut edges = Vec::with_capacity(graph.edges.len());
        let mut out_edges = vec![Vec::new(); ids.len()];
        let mut in_edges = vec![Vec::new(); ids.len()];
        for (idx, edge) in graph.edges.iter().enumerate() {
            let lookup = |id: &str| {
                index
                    .get(id)
                    .copied()
                    .ok_or_else(|| LayoutError::UnknownNode {
                        edge: idx,
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        missing: id.to_string(),
                    })
            };
            let from = lookup(&edge.from)?;
            let to = lookup(&edge.to)?;
            out_edges[from].push(EdgeId(idx));
            in_edges[to].push(EdgeId(idx));
            edges.push(ModelEdge {
                from,
                to,
                dashed: edge.dashed,
                label: edge.label.clone(),
            });
        }

        Ok(Self {
            ids,
            labels,
            index,
            edges,
            out_edges,
            in_edges,
        })
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn node_id(&self, node: NodeIdx) -> &str {
        &self.ids[node]
    }

    pub fn label(&self, node: NodeIdx) -> &str {
        &self.labels[node]
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIdx> {
        self.index.get(id).copied()
    }

    pub fn edge(&self, edge: EdgeId) -> &ModelEdge {
        &self.edges[edge.0]
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &ModelEdge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(idx, edge)| (EdgeId(idx), edge))
    }

    pub fn out_edges(&self, node: NodeIdx) -> &[EdgeId] {
        &self.out_edges[node]
    }

    pub fn in_edges(&self, node: NodeIdx) -> &[EdgeId] {
        &self.in_edges[node]
    }

    pub fn children(&self, node: NodeIdx) -> impl Iterator<Item = NodeIdx> + '_ {
        self.out_edges[node].iter().map(|id| self.edges[id.0].to)
    }

    pub fn parents(&self, node: NodeIdx) -> impl Iterator<Item = NodeIdx> + '_ {
        self.in_edges[node].iter().map(|id| self.edges[id.0].from)
    }

    pub fn in_degree(&self, node: NodeIdx) -> usize {
        self.in_edges[node].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Graph {
        let mut graph = Graph::new();
        for id in ["A", "B", "C", "D"] {
            graph.ensure_node(id, None);
        }
        graph.add_edge("A", "B");
        graph.add_edge("A", "C");
        graph.add_edge("B", "D");
        graph.add_edge("C", "D");
        graph
    }

    #[test]
    fn exposes_children_parents_and_in_degree() {
        let model = GraphModel::build(&diamond()).unwrap();
        let a = model.index_of("A").unwrap();
        let d = model.index_of("D").unwrap();
        let children: Vec<&str> = model.children(a).map(|n| model.node_id(n)).collect();
        assert_eq!(children, vec!["B", "C"]);
        let parents: Vec<&str> = model.parents(d).map(|n| model.node_id(n)).collect();
        assert_eq!(parents, vec!["B", "C"]);
        assert_eq!(model.in_degree(a), 0);
        assert_eq!(model.in_degree(d), 2);
    }

    #[test]
    fn rejects_unknown_endpoint() {
        let mut graph = diamond();
        graph.add_edge("D", "Z");
        let err = GraphModel::build(&graph).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownNode {
                edge: 4,
                from: "D".to_string(),
                to: "Z".to_string(),
                missing: "Z".to_string(),
            }
        );
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut graph = diamond();
        graph.nodes.push(graph.nodes[0].clone());
        assert!(matches!(
            GraphModel::build(&graph),
            Err(LayoutError::DuplicateNode { id }) if id == "A"
        ));
    }

    #[test]
    fn empty_graph_is_valid() {
        let model = GraphModel::build(&Graph::new()).unwrap();
        assert!(model.is_empty());
        assert_eq!(model.edge_count(), 0);
    }
}
