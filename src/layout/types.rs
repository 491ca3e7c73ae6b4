use std::collections::BTreeMap;

use serde::Serialize;

use super::error::LayoutWarning;
use super::model::EdgeId;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn approx_eq(self, other: Point) -> bool {
        (self.x - other.x).abs() <= GEOM_EPS && (self.y - other.y).abs() <= GEOM_EPS
    }
}

/// Tolerance for coordinate comparisons.
pub const GEOM_EPS: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rect containing both points.
    pub fn spanning(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn inflate(&self, pad: f32) -> Self {
        Self::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// One straight, axis-aligned piece of a routed edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub orientation: Orientation,
}

impl Segment {
    /// Orientation follows the dominant axis; zero-length segments count as
    /// horizontal.
    pub fn new(from: Point, to: Point) -> Self {
        let orientation = if (to.y - from.y).abs() > (to.x - from.x).abs() {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        };
        Self {
            from,
            to,
            orientation,
        }
    }

    pub fn vertical(x: f32, y1: f32, y2: f32) -> Self {
        Self {
            from: Point::new(x, y1),
            to: Point::new(x, y2),
            orientation: Orientation::Vertical,
        }
    }

    pub fn length(&self) -> f32 {
        (self.to.x - self.from.x).abs() + (self.to.y - self.from.y).abs()
    }

    pub fn bounds(&self) -> Rect {
        Rect::spanning(self.from, self.to)
    }

    /// Point `distance` along the segment from `from` toward `to`.
    pub fn point_along(&self, distance: f32) -> Point {
        if self.length() <= GEOM_EPS {
            return self.from;
        }
        match self.orientation {
            Orientation::Horizontal => Point::new(
                self.from.x + (self.to.x - self.from.x).signum() * distance,
                self.from.y,
            ),
            Orientation::Vertical => Point::new(
                self.from.x,
                self.from.y + (self.to.y - self.from.y).signum() * distance,
            ),
        }
    }
}

/// Drawing instructions for a routed edge after corner smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PathCommand {
    MoveTo { to: Point },
    LineTo { to: Point },
    QuadTo { ctrl: Point, to: Point },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLayout {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub level: usize,
    pub label: TextBlock,
}

impl NodeLayout {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeLayout {
    pub id: EdgeId,
    pub from: String,
    pub to: String,
    pub label: Option<TextBlock>,
    pub label_box: Option<Rect>,
    pub dashed: bool,
    /// Styling hint: excluded from levels, drawn as a return connector.
    pub back_edge: bool,
    pub segments: Vec<Segment>,
    pub path: Vec<PathCommand>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub nodes: BTreeMap<String, NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub back_edges: Vec<EdgeId>,
    /// Node ids per level, left to right.
    pub rows: Vec<Vec<String>>,
    pub width: f32,
    pub height: f32,
    pub warnings: Vec<LayoutWarning>,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&NodeLayout> {
        self.nodes.get(id)
    }

    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}
