// Edge label placement. Labels sit in the half gap the edge leaves its
// source through and slide right past anything already claiming that space.

use super::collision::rect_avoidance_offset;
use super::routing::LabelSlot;
use super::types::{GEOM_EPS, Rect};

/// Places label boxes one edge at a time, in input order.
///
/// `reserved` holds geometry known before routing starts (the anchor stubs of
/// every edge). Boxes already placed and the segments routed so far are the
/// other obstacles.
pub struct LabelPlacer {
    padding: f32,
    reserved: Vec<Rect>,
    placed: Vec<Rect>,
}

impl LabelPlacer {
    pub fn new(padding: f32, reserved: Vec<Rect>) -> Self {
        Self {
            padding,
            reserved,
            placed: Vec::new(),
        }
    }

    /// Centres a `width` x `height` box vertically in the slot's band, starts
    /// it `padding` right of the slot x, then shifts it right until every
    /// obstacle is at least `padding` away. Each shift passes at least one
    /// obstacle for good.
    pub fn place(&mut self, slot: LabelSlot, width: f32, height: f32, routed: &[Rect]) -> Rect {
        let top = (slot.top + slot.bottom) / 2.0 - height / 2.0;
        let mut rect = Rect::new(slot.x + self.padding, top, width, height);
        let max_steps = self.placed.len() + self.reserved.len() + routed.len() + 1;
        for _ in 0..max_steps {
            let shift = [&self.placed[..], &self.reserved[..], routed]
                .into_iter()
                .map(|objects| rect_avoidance_offset(&rect, objects, self.padding))
                .fold(0.0, f32::max);
            if shift <= GEOM_EPS {
                break;
            }
            rect.x += shift;
        }
        self.placed.push(rect);
        rect
    }

    pub fn placed(&self) -> &[Rect] {
        &self.placed
    }
}
