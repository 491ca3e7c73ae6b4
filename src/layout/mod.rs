mod collision;
mod cycles;
mod error;
mod label_placement;
mod model;
mod ranking;
mod routing;
mod spacing;
mod text;
pub(crate) mod types;
mod visibility;

pub use collision::{
    avoidance_offset, find_intersections, path_hits, rect_avoidance_offset, rects_overlap,
};
pub use cycles::{BackEdgeSet, resolve_back_edges};
pub use error::{LayoutError, LayoutWarning, Result};
pub use label_placement::LabelPlacer;
pub use model::{EdgeId, GraphModel, ModelEdge, NodeIdx};
pub use ranking::{LevelAssignment, assign_levels, order_rows};
pub use routing::{Approach, Channels, EdgeRouter, LabelSlot, Ports, smooth_corners};
pub use spacing::{layout_row, row_top};
pub use text::LabelCache;
pub use types::*;
pub use visibility::{AllVisible, CollapseState, Visibility};

use crate::config::LayoutConfig;
use crate::ir::Graph;
use crate::text_metrics::TextMeasure;
use crate::theme::Theme;

/// Runs the whole pipeline: model, back edges, levels, row placement and
/// edge routing. Fails only on structural problems with the input; a level
/// relaxation that hits its bound is reported in [`Layout::warnings`].
pub fn compute_layout(
    graph: &Graph,
    theme: &Theme,
    config: &LayoutConfig,
    measurer: &dyn TextMeasure,
) -> Result<Layout> {
    let model = GraphModel::build(graph)?;
    if model.is_empty() {
        tracing::debug!("empty graph, nothing to lay out");
        return Ok(Layout::default());
    }

    let back_edges = resolve_back_edges(&model);
    let levels = assign_levels(&model, &back_edges);
    let mut warnings = Vec::new();
    if !levels.converged() {
        warnings.push(LayoutWarning::LevelsUnconverged {
            dequeues: levels.dequeues(),
            unsettled: levels
                .unsettled()
                .iter()
                .map(|node| model.node_id(*node).to_string())
                .collect(),
        });
    }

    let mut rows = levels.rows();
    order_rows(&mut rows, &model, &back_edges, config.order_passes);

    let mut labels = LabelCache::new(measurer, theme, config);
    let sizes: Vec<(f32, f32)> = (0..model.node_count())
        .map(|node| labels.node_size(model.label(node)))
        .collect();
    // Channels keep the collision padding to the rows on both sides, and
    // each half gap must hold the tallest edge label with its padding.
    let tallest = sizes.iter().map(|(_, height)| *height).fold(0.0, f32::max);
    let tallest_label = model
        .edges()
        .filter_map(|(_, edge)| label_text(edge))
        .map(|text| labels.edge_label_size(text).1)
        .fold(0.0, f32::max);
    let gap = (config.node_padding * 2.0).max((tallest_label + config.label_padding * 2.0) * 2.0);
    let pitch = config.row_height.max(tallest + gap);

    let mut origins = vec![Point::default(); model.node_count()];
    let mut row_tops = Vec::with_capacity(rows.len());
    let mut row_bottoms = Vec::with_capacity(rows.len());
    for (level, row) in rows.iter().enumerate() {
        let top = row_top(level, config.top_margin, pitch);
        let widths: Vec<f32> = row.iter().map(|node| sizes[*node].0).collect();
        let xs = layout_row(
            &widths,
            config.container_width,
            config.left_margin,
            config.node_gap,
        );
        for (node, x) in row.iter().zip(xs) {
            origins[*node] = Point::new(x, top);
        }
        let bottom = row
            .iter()
            .map(|node| top + sizes[*node].1)
            .fold(top, f32::max);
        row_tops.push(top);
        row_bottoms.push(bottom);
    }

    let nodes: Vec<NodeLayout> = (0..model.node_count())
        .map(|node| NodeLayout {
            id: model.node_id(node).to_string(),
            x: origins[node].x,
            y: origins[node].y,
            width: sizes[node].0,
            height: sizes[node].1,
            level: levels.level(node),
            label: labels.measure(model.label(node)).clone(),
        })
        .collect();

    let channels = Channels::from_rows(&row_tops, &row_bottoms, pitch);
    let edges = route_edges(
        &model,
        &back_edges,
        &nodes,
        &channels,
        &mut labels,
        config,
    );

    let (width, height) = extent(&nodes, &edges, config);
    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        back_edges = back_edges.len(),
        rows = rows.len(),
        labels = labels.len(),
        width,
        height,
        "layout complete"
    );

    Ok(Layout {
        rows: rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|node| model.node_id(*node).to_string())
                    .collect()
            })
            .collect(),
        nodes: nodes
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect(),
        edges,
        back_edges: back_edges.iter().collect(),
        width,
        height,
        warnings,
    })
}

/// Lays out only the nodes `visibility` reports as visible, plus the edges
/// between them. The full graph is still validated first.
pub fn compute_layout_visible(
    graph: &Graph,
    visibility: &dyn Visibility,
    theme: &Theme,
    config: &LayoutConfig,
    measurer: &dyn TextMeasure,
) -> Result<Layout> {
    GraphModel::build(graph)?;
    let visible = graph.visible_subgraph(visibility);
    tracing::debug!(
        hidden = graph.nodes.len() - visible.nodes.len(),
        "filtered hidden nodes"
    );
    compute_layout(&visible, theme, config, measurer)
}

fn label_text(edge: &ModelEdge) -> Option<&str> {
    edge.label.as_deref().filter(|text| !text.trim().is_empty())
}

/// Routes edges in input order. Each labelled edge leaves its label box
/// behind as an obstacle for the lanes of the edges after it; the box itself
/// keeps clear of every anchor stub, every label before it and everything
/// routed so far.
fn route_edges(
    model: &GraphModel,
    back_edges: &BackEdgeSet,
    nodes: &[NodeLayout],
    channels: &Channels,
    labels: &mut LabelCache<'_>,
    config: &LayoutConfig,
) -> Vec<EdgeLayout> {
    let router = EdgeRouter::new(config, channels);
    let ports = Ports::assign(model, nodes);
    let node_rects: Vec<Rect> = nodes.iter().map(NodeLayout::rect).collect();
    let stubs: Vec<Rect> = model
        .edges()
        .filter(|(_, edge)| edge.from != edge.to)
        .flat_map(|(id, edge)| {
            router
                .approach(&nodes[edge.from], &nodes[edge.to], ports.start(id), ports.end(id))
                .stubs()
        })
        .map(|stub| stub.bounds())
        .collect();
    let mut placer = LabelPlacer::new(config.label_padding, stubs);
    let mut routed: Vec<Rect> = Vec::new();
    let mut edges = Vec::with_capacity(model.edge_count());

    for (id, edge) in model.edges() {
        let others: Vec<Rect> = node_rects
            .iter()
            .enumerate()
            .filter(|(node, _)| *node != edge.from && *node != edge.to)
            .map(|(_, rect)| *rect)
            .collect();
        let from = &nodes[edge.from];
        let segments = router.route_between(
            edge,
            from,
            &nodes[edge.to],
            ports.start(id),
            ports.end(id),
            &others,
            placer.placed(),
        );
        routed.extend(segments.iter().map(Segment::bounds));

        let (label, label_box) = match label_text(edge) {
            Some(text) => {
                let block = labels.measure(text).clone();
                let (width, height) = labels.edge_label_size(text);
                let slot = router.label_slot(&segments, from.level, edge.from == edge.to);
                let label_box = placer.place(slot, width, height, &routed);
                (Some(block), Some(label_box))
            }
            None => (None, None),
        };

        let path = smooth_corners(&segments, config.corner_radius);
        edges.push(EdgeLayout {
            id,
            from: model.node_id(edge.from).to_string(),
            to: model.node_id(edge.to).to_string(),
            label,
            label_box,
            dashed: edge.dashed,
            back_edge: back_edges.contains(id),
            segments,
            path,
        });
    }
    edges
}

fn extent(nodes: &[NodeLayout], edges: &[EdgeLayout], config: &LayoutConfig) -> (f32, f32) {
    let mut right = 0.0f32;
    let mut bottom = 0.0f32;
    for node in nodes {
        right = right.max(node.x + node.width);
        bottom = bottom.max(node.y + node.height);
    }
    for edge in edges {
        for segment in &edge.segments {
            right = right.max(segment.from.x.max(segment.to.x));
            bottom = bottom.max(segment.from.y.max(segment.to.y));
        }
        if let Some(label_box) = edge.label_box {
            right = right.max(label_box.right());
            bottom = bottom.max(label_box.bottom());
        }
    }
    (
        (right + config.left_margin).max(config.container_width),
        bottom + config.top_margin,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_metrics::HeuristicMeasurer;

    fn run(graph: &Graph) -> Layout {
        compute_layout(
            graph,
            &Theme::default(),
            &LayoutConfig::default(),
            &HeuristicMeasurer,
        )
        .unwrap()
    }

    fn interiors_overlap(a: &Rect, b: &Rect) -> bool {
        a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
    }

    fn chain(ids: &[&str]) -> Graph {
        let mut graph = Graph::new();
        for id in ids {
            graph.ensure_node(id, None);
        }
        for pair in ids.windows(2) {
            graph.add_edge(pair[0], pair[1]);
        }
        graph
    }

    #[test]
    fn empty_graph_gives_empty_layout() {
        let layout = run(&Graph::new());
        assert!(layout.nodes.is_empty());
        assert!(layout.edges.is_empty());
        assert!(layout.is_complete());
    }

    #[test]
    fn unknown_endpoint_fails_before_layout() {
        let mut graph = chain(&["A", "B"]);
        graph.add_edge("B", "Z");
        let err = compute_layout(
            &graph,
            &Theme::default(),
            &LayoutConfig::default(),
            &HeuristicMeasurer,
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::UnknownNode { edge: 1, .. }));
    }

    #[test]
    fn chain_steps_down_one_row_per_edge() {
        let layout = run(&chain(&["A", "B", "C"]));
        let a = layout.node("A").unwrap();
        let b = layout.node("B").unwrap();
        let c = layout.node("C").unwrap();
        assert_eq!((a.level, b.level, c.level), (0, 1, 2));
        assert_eq!(a.y, LayoutConfig::default().top_margin);
        assert_eq!(b.y - a.y, c.y - b.y);
        assert_eq!(layout.rows, vec![vec!["A"], vec!["B"], vec!["C"]]);
        assert!(layout.back_edges.is_empty());
    }

    #[test]
    fn lone_node_is_centred_in_the_container() {
        let layout = run(&chain(&["solo"]));
        let node = layout.node("solo").unwrap();
        let config = LayoutConfig::default();
        assert_eq!(node.x, (config.container_width - node.width) / 2.0);
    }

    #[test]
    fn two_cycle_flags_both_edges_and_still_converges() {
        let mut graph = chain(&["A", "B"]);
        graph.add_edge("B", "A");
        let layout = run(&graph);
        assert_eq!(layout.back_edges, vec![EdgeId(0), EdgeId(1)]);
        assert!(layout.edges.iter().all(|edge| edge.back_edge));
        assert_eq!(layout.node("A").unwrap().level, 0);
        assert_eq!(layout.node("B").unwrap().level, 0);
        assert!(layout.is_complete());
    }

    #[test]
    fn tall_labels_widen_the_row_pitch() {
        let mut graph = Graph::new();
        graph.ensure_node("top", Some("one\ntwo\nthree\nfour\nfive".to_string()));
        graph.ensure_node("bottom", None);
        graph.add_edge("top", "bottom");
        let config = LayoutConfig::default();
        let layout = run(&graph);
        let top = layout.node("top").unwrap();
        let bottom = layout.node("bottom").unwrap();
        assert!(top.height + config.node_padding * 2.0 > config.row_height);
        assert_eq!(bottom.y - top.y, top.height + config.node_padding * 2.0);
    }

    #[test]
    fn edge_labels_sit_beside_the_first_segment_inside_the_gap() {
        let mut graph = chain(&["A"]);
        graph.ensure_node("B", None);
        graph.add_labeled_edge("A", "B", "yes");
        let config = LayoutConfig::default();
        let layout = run(&graph);
        let edge = &layout.edges[0];
        let label_box = edge.label_box.unwrap();
        assert_eq!(label_box.x, edge.segments[0].from.x + config.label_padding);
        let (a, b) = (layout.node("A").unwrap(), layout.node("B").unwrap());
        assert!(label_box.y > a.y + a.height);
        assert!(label_box.bottom() < b.y);
        assert_eq!(edge.label.as_ref().unwrap().lines, vec!["yes"]);
    }

    #[test]
    fn multi_line_labels_widen_the_gap_instead_of_covering_nodes() {
        let mut graph = chain(&["A"]);
        graph.ensure_node("B", None);
        graph.add_labeled_edge("A", "B", "one\ntwo\nthree\nfour");
        let config = LayoutConfig::default();
        let layout = run(&graph);
        let (a, b) = (layout.node("A").unwrap(), layout.node("B").unwrap());
        let label_box = layout.edges[0].label_box.unwrap();
        assert!(b.y - a.y > config.row_height);
        assert!(label_box.y >= a.y + a.height + config.label_padding);
        assert!(label_box.bottom() + config.label_padding <= b.y);
    }

    #[test]
    fn sibling_edges_get_their_own_ports_and_keep_off_each_others_labels() {
        let mut graph = chain(&["A"]);
        graph.ensure_node("B", None);
        graph.ensure_node("C", None);
        graph.add_labeled_edge("A", "B", "yes");
        graph.add_labeled_edge("A", "C", "no");
        graph.add_edge("A", "C");
        let layout = run(&graph);
        let starts: Vec<Point> = layout.edges.iter().map(|e| e.segments[0].from).collect();
        assert_ne!(starts[0], starts[1]);
        assert_ne!(starts[1], starts[2]);
        assert_ne!(starts[0], starts[2]);

        let boxes: Vec<Rect> = layout.edges.iter().filter_map(|e| e.label_box).collect();
        assert_eq!(boxes.len(), 2);
        assert!(!interiors_overlap(&boxes[0], &boxes[1]));
        for label_box in &boxes {
            for node in layout.nodes.values() {
                assert!(!interiors_overlap(&node.rect(), label_box), "{}", node.id);
            }
            for edge in &layout.edges {
                for segment in &edge.segments {
                    assert!(
                        !interiors_overlap(&segment.bounds(), label_box),
                        "{} -> {} runs through {label_box:?}",
                        edge.from,
                        edge.to
                    );
                }
            }
        }
    }

    #[test]
    fn self_loops_never_cross_row_neighbours() {
        let mut graph = chain(&["L", "A", "R"]);
        graph.edges.clear();
        graph.add_edge("A", "A");
        let config = LayoutConfig {
            node_gap: 16.0,
            ..LayoutConfig::default()
        };
        let layout =
            compute_layout(&graph, &Theme::default(), &config, &HeuristicMeasurer).unwrap();
        assert_eq!(layout.rows, vec![vec!["L", "A", "R"]]);
        let looped = &layout.edges[0];
        assert_eq!(looped.segments.len(), 3);
        for id in ["L", "R"] {
            let neighbour = layout.node(id).unwrap().rect();
            for segment in &looped.segments {
                assert!(!interiors_overlap(&segment.bounds(), &neighbour), "crosses {id}");
            }
        }
    }

    #[test]
    fn two_cycle_edges_take_opposite_channels() {
        let mut graph = chain(&["A", "B"]);
        graph.add_edge("B", "A");
        let layout = run(&graph);
        let a = layout.node("A").unwrap();
        let (there, back) = (&layout.edges[0], &layout.edges[1]);
        assert_eq!(there.segments.len(), 3);
        assert_eq!(back.segments.len(), 3);
        assert!(there.segments[1].from.y < a.y);
        assert!(back.segments[1].from.y > a.y + a.height);
        for ours in &there.segments {
            for theirs in &back.segments {
                assert!(!interiors_overlap(&ours.bounds().inflate(0.5), &theirs.bounds()));
            }
        }
    }

    #[test]
    fn every_path_starts_with_move_and_ends_on_the_last_point() {
        let mut graph = chain(&["A", "B", "C", "D"]);
        graph.add_edge("A", "D");
        graph.add_dashed_edge("D", "A");
        let layout = run(&graph);
        for edge in &layout.edges {
            assert!(matches!(edge.path.first(), Some(PathCommand::MoveTo { .. })));
            let last = edge.segments.last().unwrap().to;
            assert_eq!(edge.path.last(), Some(&PathCommand::LineTo { to: last }));
        }
    }

    #[test]
    fn visible_layout_skips_collapsed_descendants() {
        let graph = chain(&["A", "B", "C"]);
        let state = CollapseState::new(&graph, ["B"]).unwrap();
        let layout = compute_layout_visible(
            &graph,
            &state,
            &Theme::default(),
            &LayoutConfig::default(),
            &HeuristicMeasurer,
        )
        .unwrap();
        assert!(layout.node("B").is_some());
        assert!(layout.node("C").is_none());
        assert_eq!(layout.edges.len(), 1);
    }
}
