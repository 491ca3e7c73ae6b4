use std::collections::VecDeque;

use super::model::{EdgeId, GraphModel, NodeIdx};

/// Edges excluded from forward traversal. Annotates the input edge list by
/// [`EdgeId`]; the edges themselves are never touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackEdgeSet {
    flags: Vec<bool>,
    count: usize,
}

impl BackEdgeSet {
    /// Builds a set directly from edge flags, one per input edge.
    pub fn from_flags(flags: Vec<bool>) -> Self {
        let count = flags.iter().filter(|flag| **flag).count();
        Self { flags, count }
    }

    pub fn contains(&self, edge: EdgeId) -> bool {
        self.flags.get(edge.0).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Back edges in input order.
    pub fn iter(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag)
            .map(|(idx, _)| EdgeId(idx))
    }
}

/// Classifies every edge as forward or back.
///
/// Dashed edges are back edges unconditionally. Any other edge `u -> v` is a
/// back edge iff `v` still reaches `u` over the non-dashed edges once the edge
/// itself is removed. Each edge is judged against the full non-dashed set, so
/// both edges of a 2-cycle come out as back edges and the result does not
/// depend on edge order.
pub fn resolve_back_edges(model: &GraphModel) -> BackEdgeSet {
    let mut search = Reachability::new(model.node_count());
    let flags: Vec<bool> = model
        .edges()
        .map(|(id, edge)| edge.dashed || search.reaches(model, edge.to, edge.from, id))
        .collect();
    let set = BackEdgeSet::from_flags(flags);
    tracing::debug!(
        edges = model.edge_count(),
        back_edges = set.len(),
        "classified back edges"
    );
    set
}

/// Breadth-first reachability with buffers reused across queries.
struct Reachability {
    visited: Vec<bool>,
    queue: VecDeque<NodeIdx>,
}

impl Reachability {
    fn new(node_count: usize) -> Self {
        Self {
            visited: vec![false; node_count],
            queue: VecDeque::with_capacity(node_count),
        }
    }

    fn reaches(
        &mut self,
        model: &GraphModel,
        start: NodeIdx,
        target: NodeIdx,
        excluded: EdgeId,
    ) -> bool {
        if start == target {
            return true;
        }
        self.visited.fill(false);
        self.queue.clear();
        self.visited[start] = true;
        self.queue.push_back(start);
        while let Some(node) = self.queue.pop_front() {
            for &edge_id in model.out_edges(node) {
                if edge_id == excluded {
                    continue;
                }
                let edge = model.edge(edge_id);
                if edge.dashed {
                    continue;
                }
                if edge.to == target {
                    return true;
                }
                if !self.visited[edge.to] {
                    self.visited[edge.to] = true;
                    self.queue.push_back(edge.to);
                }
            }
        }
        false
    }
}
