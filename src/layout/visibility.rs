use std::collections::{HashSet, VecDeque};

use crate::ir::Graph;

use super::cycles::resolve_back_edges;
use super::error::Result;
use super::model::GraphModel;

/// Answers whether a node currently takes part in layout.
pub trait Visibility {
    fn is_visible(&self, id: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AllVisible;

impl Visibility for AllVisible {
    fn is_visible(&self, _id: &str) -> bool {
        true
    }
}

/// Hides everything only reachable through a collapsed node.
///
/// Walks forward edges from the roots without expanding collapsed nodes.
/// Collapsed nodes themselves stay visible.
#[derive(Debug, Clone, Default)]
pub struct CollapseState {
    collapsed: HashSet<String>,
    visible: HashSet<String>,
}

impl CollapseState {
    pub fn new<I, S>(graph: &Graph, collapsed: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let collapsed: HashSet<String> = collapsed.into_iter().map(Into::into).collect();
        let model = GraphModel::build(graph)?;
        let back_edges = resolve_back_edges(&model);

        let mut seen = vec![false; model.node_count()];
        let mut queue = VecDeque::new();
        for node in 0..model.node_count() {
            let is_root = model
                .in_edges(node)
                .iter()
                .all(|edge| back_edges.contains(*edge));
            if is_root {
                seen[node] = true;
                queue.push_back(node);
            }
        }
        while let Some(node) = queue.pop_front() {
            if collapsed.contains(model.node_id(node)) {
                continue;
            }
            for &edge in model.out_edges(node) {
                if back_edges.contains(edge) {
                    continue;
                }
                let child = model.edge(edge).to;
                if !seen[child] {
                    seen[child] = true;
                    queue.push_back(child);
                }
            }
        }

        let visible = (0..model.node_count())
            .filter(|node| seen[*node])
            .map(|node| model.node_id(node).to_string())
            .collect();
        Ok(Self { collapsed, visible })
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.collapsed.contains(id)
    }
}

impl Visibility for CollapseState {
    fn is_visible(&self, id: &str) -> bool {
        self.visible.contains(id)
    }
}

impl Graph {
    /// Copy of the graph keeping visible nodes and the edges between them.
    pub fn visible_subgraph(&self, visibility: &dyn Visibility) -> Graph {
        Graph {
            nodes: self
                .nodes
                .iter()
                .filter(|node| visibility.is_visible(&node.id))
                .cloned()
                .collect(),
            edges: self
                .edges
                .iter()
                .filter(|edge| visibility.is_visible(&edge.from) && visibility.is_visible(&edge.to))
                .cloned()
                .collect(),
        }
    }
}
