use std::cmp::Ordering;
use std::collections::VecDeque;

use super::cycles::BackEdgeSet;
use super::model::{GraphModel, NodeIdx};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelAssignment {
    levels: Vec<usize>,
    dequeues: usize,
    unsettled: Vec<NodeIdx>,
}

impl LevelAssignment {
    pub fn level(&self, node: NodeIdx) -> usize {
        self.levels[node]
    }

    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    /// Number of rows, i.e. the deepest level plus one.
    pub fn level_count(&self) -> usize {
        self.levels.iter().max().map_or(0, |max| max + 1)
    }

    pub fn converged(&self) -> bool {
        self.unsettled.is_empty()
    }

    pub fn dequeues(&self) -> usize {
        self.dequeues
    }

    /// Nodes still pending (or never reached) when relaxation stopped.
    pub fn unsettled(&self) -> &[NodeIdx] {
        &self.unsettled
    }

    /// Nodes grouped by level, each row in declaration order.
    pub fn rows(&self) -> Vec<Vec<NodeIdx>> {
        let mut rows = vec![Vec::new(); self.level_count()];
        for (node, level) in self.levels.iter().enumerate() {
            rows[*level].push(node);
        }
        rows
    }
}

/// Longest-path levels over the forward edges.
///
/// Roots (no incoming forward edge) sit at level 0. Children are relaxed to
/// `parent + 1` whenever that is deeper than what they have, and re-queued so
/// the increase propagates. Dequeues are capped at `|V|²`, which a DAG never
/// reaches; hitting the cap leaves the remaining levels as last computed.
pub fn assign_levels(model: &GraphModel, back_edges: &BackEdgeSet) -> LevelAssignment {
    let node_count = model.node_count();
    let mut levels: Vec<Option<usize>> = vec![None; node_count];
    let mut queue: VecDeque<NodeIdx> = VecDeque::new();

    for node in 0..node_count {
        let is_root = model
            .in_edges(node)
            .iter()
            .all(|edge| back_edges.contains(*edge));
        if is_root {
            levels[node] = Some(0);
            queue.push_back(node);
        }
    }

    let bound = node_count.saturating_mul(node_count);
    let mut dequeues = 0usize;
    while !queue.is_empty() && dequeues < bound {
        let Some(node) = queue.pop_front() else {
            break;
        };
        dequeues += 1;
        let candidate = levels[node].unwrap_or(0) + 1;
        for &edge_id in model.out_edges(node) {
            if back_edges.contains(edge_id) {
                continue;
            }
            let child = model.edge(edge_id).to;
            if levels[child].is_none_or(|current| candidate > current) {
                levels[child] = Some(candidate);
                queue.push_back(child);
            }
        }
    }

    let mut unsettled: Vec<NodeIdx> = queue.into_iter().collect();
    unsettled.extend((0..node_count).filter(|node| levels[*node].is_none()));
    unsettled.sort_unstable();
    unsettled.dedup();

    if !unsettled.is_empty() {
        tracing::warn!(
            dequeues,
            unsettled = unsettled.len(),
            "level relaxation did not converge; layout may be incomplete"
        );
    }

    let levels: Vec<usize> = levels.into_iter().map(|level| level.unwrap_or(0)).collect();
    tracing::debug!(
        nodes = node_count,
        rows = levels.iter().max().map_or(0, |max| max + 1),
        dequeues,
        "assigned levels"
    );

    LevelAssignment {
        levels,
        dequeues,
        unsettled,
    }
}

/// Median-heuristic sweeps over the rows to cut down crossings, using forward
/// edges only. Ties keep the current order.
pub fn order_rows(
    rows: &mut [Vec<NodeIdx>],
    model: &GraphModel,
    back_edges: &BackEdgeSet,
    passes: usize,
) {
    if rows.len() <= 1 || passes == 0 {
        return;
    }
    let mut incoming: Vec<Vec<NodeIdx>> = vec![Vec::new(); model.node_count()];
    let mut outgoing: Vec<Vec<NodeIdx>> = vec![Vec::new(); model.node_count()];
    for (id, edge) in model.edges() {
        if back_edges.contains(id) || edge.from == edge.to {
            continue;
        }
        outgoing[edge.from].push(edge.to);
        incoming[edge.to].push(edge.from);
    }

    let mut positions = vec![0usize; model.node_count()];
    update_positions(rows, &mut positions);

    for _ in 0..passes {
        for rank in 1..rows.len() {
            if rows[rank].len() <= 1 {
                continue;
            }
            sort_row(&mut rows[rank], &incoming, &positions);
            update_positions(rows, &mut positions);
        }
        for rank in (0..rows.len() - 1).rev() {
            if rows[rank].len() <= 1 {
                continue;
            }
            sort_row(&mut rows[rank], &outgoing, &positions);
            update_positions(rows, &mut positions);
        }
    }
}

fn update_positions(rows: &[Vec<NodeIdx>], positions: &mut [usize]) {
    for row in rows {
        for (idx, node) in row.iter().enumerate() {
            positions[*node] = idx;
        }
    }
}

fn sort_row(row: &mut Vec<NodeIdx>, neighbors: &[Vec<NodeIdx>], positions: &[usize]) {
    let mut keyed: Vec<(f32, usize, NodeIdx)> = row
        .iter()
        .enumerate()
        .map(|(current, node)| {
            (
                median_position(&neighbors[*node], current, positions),
                current,
                *node,
            )
        })
        .collect();
    keyed.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });
    *row = keyed.into_iter().map(|(_, _, node)| node).collect();
}

fn median_position(neighbors: &[NodeIdx], current: usize, positions: &[usize]) -> f32 {
    if neighbors.is_empty() {
        return current as f32;
    }
    let mut values: Vec<f32> = neighbors
        .iter()
        .map(|neighbor| positions[*neighbor] as f32)
        .collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Graph;
    use crate::layout::cycles::resolve_back_edges;

    fn model_of(nodes: &[&str], edges: &[(&str, &str)]) -> GraphModel {
        let mut graph = Graph::new();
        for id in nodes {
            graph.ensure_node(id, None);
        }
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        GraphModel::build(&graph).unwrap()
    }

    fn level_of(model: &GraphModel, levels: &LevelAssignment, id: &str) -> usize {
        levels.level(model.index_of(id).unwrap())
    }

    #[test]
    fn relaxes_to_the_deepest_parent() {
        let model = model_of(&["A", "B", "C"], &[("A", "C"), ("A", "B"), ("B", "C")]);
        let back = resolve_back_edges(&model);
        let levels = assign_levels(&model, &back);
        assert!(levels.converged());
        assert_eq!(level_of(&model, &levels, "A"), 0);
        assert_eq!(level_of(&model, &levels, "B"), 1);
        assert_eq!(level_of(&model, &levels, "C"), 2);
    }

    #[test]
    fn every_root_is_level_zero() {
        let model = model_of(&["A", "B", "C", "D"], &[("A", "C"), ("B", "C"), ("C", "D")]);
        let back = resolve_back_edges(&model);
        let levels = assign_levels(&model, &back);
        assert_eq!(level_of(&model, &levels, "A"), 0);
        assert_eq!(level_of(&model, &levels, "B"), 0);
        assert_eq!(level_of(&model, &levels, "D"), 2);
        assert_eq!(levels.level_count(), 3);
    }

    #[test]
    fn back_edges_do_not_push_levels() {
        let mut graph = Graph::new();
        for id in ["A", "B", "C"] {
            graph.ensure_node(id, None);
        }
        graph.add_edge("A", "B");
        graph.add_edge("B", "C");
        graph.add_dashed_edge("C", "A");
        let model = GraphModel::build(&graph).unwrap();
        let back = resolve_back_edges(&model);
        let levels = assign_levels(&model, &back);
        assert_eq!(levels.levels(), &[0, 1, 2]);
    }

    #[test]
    fn two_cycle_nodes_both_become_roots() {
        let model = model_of(&["A", "B"], &[("A", "B"), ("B", "A")]);
        let back = resolve_back_edges(&model);
        let levels = assign_levels(&model, &back);
        assert_eq!(levels.levels(), &[0, 0]);
        assert!(levels.converged());
    }

    #[test]
    fn residual_cycle_hits_the_bound_without_hanging() {
        let model = model_of(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "B")]);
        let levels = assign_levels(&model, &BackEdgeSet::default());
        assert!(!levels.converged());
        assert_eq!(levels.dequeues(), 9);
        assert_eq!(level_of(&model, &levels, "A"), 0);
    }

    #[test]
    fn rootless_cycle_is_reported_unsettled() {
        let model = model_of(&["A", "B"], &[("A", "B"), ("B", "A")]);
        let levels = assign_levels(&model, &BackEdgeSet::default());
        assert!(!levels.converged());
        assert_eq!(levels.unsettled(), &[0, 1]);
        assert_eq!(levels.levels(), &[0, 0]);
    }

    #[test]
    fn empty_model_yields_no_rows() {
        let model = model_of(&[], &[]);
        let levels = assign_levels(&model, &BackEdgeSet::default());
        assert!(levels.converged());
        assert!(levels.rows().is_empty());
    }

    #[test]
    fn ordering_uncrosses_simple_pair() {
        let model = model_of(&["A", "B", "D", "C"], &[("A", "C"), ("B", "D")]);
        let back = resolve_back_edges(&model);
        let levels = assign_levels(&model, &back);
        let mut rows = levels.rows();
        assert_eq!(rows[1], vec![2, 3]);
        order_rows(&mut rows, &model, &back, 2);
        let names: Vec<&str> = rows[1].iter().map(|n| model.node_id(*n)).collect();
        assert_eq!(names, vec!["C", "D"]);
        let top: Vec<&str> = rows[0].iter().map(|n| model.node_id(*n)).collect();
        assert_eq!(top, vec!["A", "B"]);
    }

    #[test]
    fn zero_passes_keeps_declaration_order() {
        let model = model_of(&["A", "B", "D", "C"], &[("A", "C"), ("B", "D")]);
        let back = resolve_back_edges(&model);
        let mut rows = assign_levels(&model, &back).rows();
        order_rows(&mut rows, &model, &back, 0);
        assert_eq!(rows[1], vec![2, 3]);
    }
}
