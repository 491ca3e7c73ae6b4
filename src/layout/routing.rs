use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::LayoutConfig;

use super::collision::avoidance_offset;
use super::model::{EdgeId, GraphModel, ModelEdge, NodeIdx};
use super::types::{GEOM_EPS, NodeLayout, Orientation, PathCommand, Point, Rect, Segment};

/// Horizontal routing channels, one midway through the gap under each row
/// plus one above the first row.
#[derive(Debug, Clone, PartialEq)]
pub struct Channels {
    above_first: f32,
    below: Vec<f32>,
    tops: Vec<f32>,
    bottoms: Vec<f32>,
}

impl Channels {
    /// `row_tops[l]` is where row `l` starts, `row_bottoms[l]` the lowest node
    /// edge in it; `pitch` is the distance between row tops.
    pub fn from_rows(row_tops: &[f32], row_bottoms: &[f32], pitch: f32) -> Self {
        let above_first = match (row_tops.first(), row_bottoms.first()) {
            (Some(top), Some(bottom)) => top - (pitch - (bottom - top)).max(0.0) / 2.0,
            _ => 0.0,
        };
        let below = row_bottoms
            .iter()
            .enumerate()
            .map(|(level, bottom)| {
                let next_top = row_tops
                    .get(level + 1)
                    .copied()
                    .unwrap_or_else(|| row_tops[level] + pitch);
                (bottom + next_top) / 2.0
            })
            .collect();
        Self {
            above_first,
            below,
            tops: row_tops.to_vec(),
            bottoms: row_bottoms.to_vec(),
        }
    }

    pub fn above(&self, level: usize) -> f32 {
        match level {
            0 => self.above_first,
            _ => self.below(level - 1),
        }
    }

    pub fn below(&self, level: usize) -> f32 {
        self.below.get(level).copied().unwrap_or(self.above_first)
    }

    /// Half gap between the bottom of row `level` and the channel under it.
    pub fn band_below(&self, level: usize) -> (f32, f32) {
        let channel = self.below(level);
        let bottom = self.bottoms.get(level).copied().unwrap_or(channel);
        (bottom, channel)
    }

    /// Half gap between the channel over row `level` and its top.
    pub fn band_above(&self, level: usize) -> (f32, f32) {
        let channel = self.above(level);
        let top = self.tops.get(level).copied().unwrap_or(channel);
        (channel, top)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EdgeSide {
    Top,
    Bottom,
}

/// Same-row edges pointing left run under the row.
fn runs_leftward(from: &NodeLayout, to: &NodeLayout) -> bool {
    to.level == from.level && from.rect().center().x > to.rect().center().x
}

fn edge_sides(from: &NodeLayout, to: &NodeLayout) -> (EdgeSide, EdgeSide) {
    match to.level.cmp(&from.level) {
        Ordering::Greater => (EdgeSide::Bottom, EdgeSide::Top),
        Ordering::Less => (EdgeSide::Top, EdgeSide::Bottom),
        Ordering::Equal if runs_leftward(from, to) => (EdgeSide::Bottom, EdgeSide::Bottom),
        Ordering::Equal => (EdgeSide::Top, EdgeSide::Top),
    }
}

struct PortCandidate {
    edge: EdgeId,
    is_start: bool,
    other_pos: f32,
}

/// Attachment x for both ends of every edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Ports {
    start: Vec<f32>,
    end: Vec<f32>,
}

impl Ports {
    /// Edge ends sharing a node side are spread evenly across it, ordered by
    /// the x of the node at the other end so they leave without crossing.
    /// A lone end sits at the centre.
    pub fn assign(model: &GraphModel, nodes: &[NodeLayout]) -> Self {
        let mut start = vec![0.0; model.edge_count()];
        let mut end = vec![0.0; model.edge_count()];
        let mut port_candidates: BTreeMap<(NodeIdx, EdgeSide), Vec<PortCandidate>> =
            BTreeMap::new();
        for (id, edge) in model.edges() {
            let (from, to) = (&nodes[edge.from], &nodes[edge.to]);
            if edge.from == edge.to {
                start[id.0] = from.rect().right();
                end[id.0] = from.rect().right();
                continue;
            }
            let (start_side, end_side) = edge_sides(from, to);
            port_candidates
                .entry((edge.from, start_side))
                .or_default()
                .push(PortCandidate {
                    edge: id,
                    is_start: true,
                    other_pos: to.rect().center().x,
                });
            port_candidates
                .entry((edge.to, end_side))
                .or_default()
                .push(PortCandidate {
                    edge: id,
                    is_start: false,
                    other_pos: from.rect().center().x,
                });
        }
        for ((node, _), mut candidates) in port_candidates {
            candidates.sort_by(|a, b| {
                a.other_pos
                    .total_cmp(&b.other_pos)
                    .then(a.edge.cmp(&b.edge))
            });
            let rect = nodes[node].rect();
            let step = rect.width / (candidates.len() + 1) as f32;
            for (slot, candidate) in candidates.iter().enumerate() {
                let x = rect.x + step * (slot + 1) as f32;
                if candidate.is_start {
                    start[candidate.edge.0] = x;
                } else {
                    end[candidate.edge.0] = x;
                }
            }
        }
        Self { start, end }
    }

    pub fn start(&self, edge: EdgeId) -> f32 {
        self.start[edge.0]
    }

    pub fn end(&self, edge: EdgeId) -> f32 {
        self.end[edge.0]
    }
}

/// Anchors of a non-loop edge and the channels it runs through first and
/// last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Approach {
    pub start: Point,
    pub end: Point,
    pub first_channel: f32,
    pub last_channel: f32,
}

impl Approach {
    /// The vertical pieces between each anchor and its channel. They depend
    /// only on ports and rows, so they are known before anything is routed.
    pub fn stubs(&self) -> [Segment; 2] {
        [
            Segment::vertical(self.start.x, self.start.y, self.first_channel),
            Segment::vertical(self.end.x, self.last_channel, self.end.y),
        ]
    }
}

/// Where a label goes: the vertical band `top..bottom` of a half gap, and
/// the x it starts from before sliding right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelSlot {
    pub top: f32,
    pub bottom: f32,
    pub x: f32,
}

/// Builds orthogonal paths between node anchors and bends their interior
/// lanes around foreign nodes and edge labels.
pub struct EdgeRouter<'a> {
    config: &'a LayoutConfig,
    channels: &'a Channels,
}

impl<'a> EdgeRouter<'a> {
    pub fn new(config: &'a LayoutConfig, channels: &'a Channels) -> Self {
        Self { config, channels }
    }

    /// Ordered, endpoint-contiguous segments from `from` to `to`, anchored at
    /// the centre of the sides they use.
    ///
    /// Downward edges leave the bottom and enter the top; upward edges the
    /// reverse, anchored a quarter width right of centre so they do not sit on
    /// top of a forward edge between the same nodes. Edges inside one row
    /// loop through the channel above it when they point right and through
    /// the channel below it when they point left.
    pub fn route(
        &self,
        edge: &ModelEdge,
        from: &NodeLayout,
        to: &NodeLayout,
        other_nodes: &[Rect],
        other_labels: &[Rect],
    ) -> Vec<Segment> {
        let (start_x, end_x) = if to.level < from.level {
            (
                from.rect().center().x + from.width / 4.0,
                to.rect().center().x + to.width / 4.0,
            )
        } else {
            (from.rect().center().x, to.rect().center().x)
        };
        self.route_between(edge, from, to, start_x, end_x, other_nodes, other_labels)
    }

    /// Like [`EdgeRouter::route`], with the anchors pinned to `start_x` on the
    /// source and `end_x` on the target.
    #[allow(clippy::too_many_arguments)]
    pub fn route_between(
        &self,
        edge: &ModelEdge,
        from: &NodeLayout,
        to: &NodeLayout,
        start_x: f32,
        end_x: f32,
        other_nodes: &[Rect],
        other_labels: &[Rect],
    ) -> Vec<Segment> {
        if edge.from == edge.to {
            return self.self_loop(from.rect(), other_nodes);
        }
        let Approach {
            start,
            end,
            first_channel: y1,
            last_channel: y2,
        } = self.approach(from, to, start_x, end_x);

        let points = match to.level.cmp(&from.level) {
            Ordering::Greater => {
                self.lane_path(start, end, y1, y2, end.x, other_nodes, other_labels)
            }
            Ordering::Less => {
                let lane_x =
                    from.rect().right().max(to.rect().right()) + self.config.back_edge_offset;
                self.lane_path(start, end, y1, y2, lane_x, other_nodes, other_labels)
            }
            Ordering::Equal => vec![start, Point::new(start.x, y1), Point::new(end.x, y1), end],
        };
        segments_from_points(&points)
    }

    pub fn approach(
        &self,
        from: &NodeLayout,
        to: &NodeLayout,
        start_x: f32,
        end_x: f32,
    ) -> Approach {
        let (source, target) = (from.rect(), to.rect());
        let (start_side, end_side) = edge_sides(from, to);
        let (start_y, first_channel) = match start_side {
            EdgeSide::Bottom => (source.bottom(), self.channels.below(from.level)),
            EdgeSide::Top => (source.y, self.channels.above(from.level)),
        };
        let (end_y, last_channel) = match end_side {
            EdgeSide::Bottom => (target.bottom(), self.channels.below(to.level)),
            EdgeSide::Top => (target.y, self.channels.above(to.level)),
        };
        Approach {
            start: Point::new(start_x, start_y),
            end: Point::new(end_x, end_y),
            first_channel,
            last_channel,
        }
    }

    /// The half gap next to the source that the edge's first segment runs
    /// through. Self-loop labels go under their row, starting at the loop's
    /// outer side.
    pub fn label_slot(&self, segments: &[Segment], level: usize, self_loop: bool) -> LabelSlot {
        let (x, downward) = match segments.first() {
            None => (0.0, true),
            Some(first) if self_loop => {
                let outer = segments
                    .iter()
                    .find(|segment| segment.orientation == Orientation::Vertical)
                    .map_or(first.from.x, |segment| segment.from.x);
                (outer, true)
            }
            Some(first) => (first.from.x, first.to.y >= first.from.y),
        };
        let (top, bottom) = if downward {
            self.channels.band_below(level)
        } else {
            self.channels.band_above(level)
        };
        LabelSlot { top, bottom, x }
    }

    #[allow(clippy::too_many_arguments)]
    fn lane_path(
        &self,
        start: Point,
        end: Point,
        y1: f32,
        y2: f32,
        lane_x: f32,
        other_nodes: &[Rect],
        other_labels: &[Rect],
    ) -> Vec<Point> {
        if (y1 - y2).abs() <= GEOM_EPS {
            return vec![start, Point::new(start.x, y1), Point::new(end.x, y1), end];
        }
        let lane_x = self.clear_lane(lane_x, y1, y2, other_nodes, other_labels);
        vec![
            start,
            Point::new(start.x, y1),
            Point::new(lane_x, y1),
            Point::new(lane_x, y2),
            Point::new(end.x, y2),
            end,
        ]
    }

    /// Shifts the lane right until neither nodes nor labels ask for more room.
    /// Each shift passes at least one obstacle for good, so the loop is bounded
    /// by the obstacle count.
    fn clear_lane(
        &self,
        mut x: f32,
        y1: f32,
        y2: f32,
        other_nodes: &[Rect],
        other_labels: &[Rect],
    ) -> f32 {
        let max_steps = other_nodes.len() + other_labels.len() + 1;
        for _ in 0..max_steps {
            let lane = Segment::vertical(x, y1, y2);
            let node_shift = avoidance_offset(&lane, other_nodes, self.config.node_padding);
            if node_shift > GEOM_EPS {
                x += node_shift;
                continue;
            }
            let label_shift = avoidance_offset(&lane, other_labels, self.config.label_padding);
            if label_shift > GEOM_EPS {
                x += label_shift;
                continue;
            }
            break;
        }
        x
    }

    /// A loop off the right side, or off the left side when a row neighbour
    /// leaves too little room on the right. When neither side has room for
    /// `self_loop_size` plus `node_padding`, the loop shrinks to fit the
    /// roomier side.
    fn self_loop(&self, node: Rect, other_nodes: &[Rect]) -> Vec<Segment> {
        let center = node.center();
        let upper = center.y - node.height / 4.0;
        let lower = center.y + node.height / 4.0;

        let mut room_right = f32::INFINITY;
        let mut room_left = f32::INFINITY;
        for other in other_nodes
            .iter()
            .filter(|other| other.y < lower && upper < other.bottom())
        {
            if other.x >= node.right() {
                room_right = room_right.min(other.x - node.right());
            } else if other.right() <= node.x {
                room_left = room_left.min(node.x - other.right());
            }
        }
        let wanted = self.config.self_loop_size;
        let pad = self.config.node_padding;
        let fitted = |room: f32| wanted.min((room - pad).max(room / 2.0));
        let (side_x, dir, size) = if room_right - pad >= wanted {
            (node.right(), 1.0, wanted)
        } else if room_left - pad >= wanted {
            (node.x, -1.0, wanted)
        } else if room_right >= room_left {
            (node.right(), 1.0, fitted(room_right))
        } else {
            (node.x, -1.0, fitted(room_left))
        };

        let outer = side_x + dir * size;
        let points = [
            Point::new(side_x, upper),
            Point::new(outer, upper),
            Point::new(outer, lower),
            Point::new(side_x, lower),
        ];
        segments_from_points(&points)
    }
}

/// Drops repeated points and merges collinear runs.
pub(super) fn compress_path(points: &[Point]) -> Vec<Point> {
    let mut deduped: Vec<Point> = Vec::with_capacity(points.len());
    for point in points {
        if deduped.last().is_some_and(|last| last.approx_eq(*point)) {
            continue;
        }
        deduped.push(*point);
    }
    if deduped.len() <= 2 {
        return deduped;
    }
    let mut out: Vec<Point> = Vec::with_capacity(deduped.len());
    out.push(deduped[0]);
    for idx in 1..deduped.len() - 1 {
        let prev = out[out.len() - 1];
        let curr = deduped[idx];
        let next = deduped[idx + 1];
        let same_x = (prev.x - curr.x).abs() <= GEOM_EPS && (curr.x - next.x).abs() <= GEOM_EPS;
        let same_y = (prev.y - curr.y).abs() <= GEOM_EPS && (curr.y - next.y).abs() <= GEOM_EPS;
        if same_x || same_y {
            continue;
        }
        out.push(curr);
    }
    out.push(deduped[deduped.len() - 1]);
    out
}

pub(super) fn segments_from_points(points: &[Point]) -> Vec<Segment> {
    let compressed = compress_path(points);
    match compressed.as_slice() {
        [] => Vec::new(),
        [only] => vec![Segment::new(*only, *only)],
        _ => compressed
            .windows(2)
            .map(|pair| Segment::new(pair[0], pair[1]))
            .collect(),
    }
}

/// Drawing commands for `segments`. A joint between perpendicular segments
/// that are both longer than `2 * radius` becomes a quadratic curve starting
/// `radius` before the joint and ending `radius` after it; every other joint
/// stays a right angle. The path always ends with a straight line onto the
/// last point.
pub fn smooth_corners(segments: &[Segment], radius: f32) -> Vec<PathCommand> {
    let Some(first) = segments.first() else {
        return Vec::new();
    };
    let mut commands = Vec::with_capacity(segments.len() * 2 + 1);
    commands.push(PathCommand::MoveTo { to: first.from });
    for (idx, segment) in segments.iter().enumerate() {
        let next = segments.get(idx + 1);
        match next {
            Some(next) if curve_eligible(segment, next, radius) => {
                commands.push(PathCommand::LineTo {
                    to: segment.point_along(segment.length() - radius),
                });
                commands.push(PathCommand::QuadTo {
                    ctrl: segment.to,
                    to: next.point_along(radius),
                });
            }
            _ => commands.push(PathCommand::LineTo { to: segment.to }),
        }
    }
    commands
}

fn curve_eligible(current: &Segment, next: &Segment, radius: f32) -> bool {
    radius > 0.0
        && current.orientation != next.orientation
        && current.length() > radius * 2.0
        && next.length() > radius * 2.0
}
