//! Stateless overlap tests shared by node and label avoidance.

use super::types::{GEOM_EPS, Orientation, Rect, Segment};

/// True unless the rects are strictly separated on either axis; touching
/// edges count as overlap.
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    !(a.right() < b.x || b.right() < a.x || a.bottom() < b.y || b.bottom() < a.y)
}

/// Objects overlapping the line's bounds grown by `padding` on every side.
pub fn find_intersections<'a>(line: &Segment, objects: &'a [Rect], padding: f32) -> Vec<&'a Rect> {
    let padded = line.bounds().inflate(padding);
    objects
        .iter()
        .filter(|object| rects_overlap(&padded, object))
        .collect()
}

/// Distance to move `line` so it clears every object it currently hits by
/// `padding`: the furthest far edge among hits, plus padding, minus the
/// line's own coordinate. Vertical lines move along x past right edges,
/// horizontal lines along y past bottom edges. Zero when nothing is hit.
pub fn avoidance_offset(line: &Segment, objects: &[Rect], padding: f32) -> f32 {
    let hits = find_intersections(line, objects, padding);
    if hits.is_empty() {
        return 0.0;
    }
    match line.orientation {
        Orientation::Vertical => {
            let far = hits.iter().map(|rect| rect.right()).fold(f32::MIN, f32::max);
            far + padding - line.from.x
        }
        Orientation::Horizontal => {
            let far = hits.iter().map(|rect| rect.bottom()).fold(f32::MIN, f32::max);
            far + padding - line.from.y
        }
    }
}

/// How far `rect` must move right to keep `padding` clear of every object.
/// Unlike the line checks, an object exactly `padding` away is not a hit, so
/// a rect that was just moved past its obstacles reports zero.
pub fn rect_avoidance_offset(rect: &Rect, objects: &[Rect], padding: f32) -> f32 {
    let padded = rect.inflate((padding - GEOM_EPS).max(0.0));
    objects
        .iter()
        .filter(|object| {
            padded.x < object.right()
                && object.x < padded.right()
                && padded.y < object.bottom()
                && object.y < padded.bottom()
        })
        .map(|object| object.right() + padding - rect.x)
        .fold(0.0, f32::max)
}

/// Number of (segment, object) pairs closer than `padding`.
pub fn path_hits(segments: &[Segment], objects: &[Rect], padding: f32) -> usize {
    segments
        .iter()
        .map(|segment| find_intersections(segment, objects, padding).len())
        .sum()
}
