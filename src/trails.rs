//! Ring buffer of past particle frames.
//!
//! Each slot holds one rasterized particle frame and the [`Viewport`] it was
//! rendered under. Every tick the oldest slot is recycled as the newest, so
//! the ring never allocates after construction. Compositing walks the slots
//! oldest first, fading older frames and reprojecting each from its captured
//! viewport into the current one.

use crate::projection::{ScreenPoint, Viewport};

/// Default number of frames kept for trails.
pub const TRAIL_FRAMES: usize = 50;

/// One frame of trail history.
#[derive(Debug, Clone)]
pub struct TrailSlot<T> {
    pub payload: T,
    /// Viewport active when `payload` was rendered.
    pub viewport: Viewport,
}

/// Fixed-capacity ring of trail slots with a rotating head.
#[derive(Debug, Clone)]
pub struct TrailRing<T> {
    slots: Vec<TrailSlot<T>>,
    /// Index of the oldest slot, the next to be recycled.
    head: usize,
}

impl<T> TrailRing<T> {
    /// Build a ring of `capacity` slots, all tagged with `viewport`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, viewport: Viewport, mut make: impl FnMut(usize) -> T) -> Self {
        assert!(capacity > 0, "trail ring needs at least one slot");
        let slots = (0..capacity)
            .map(|i| TrailSlot {
                payload: make(i),
                viewport,
            })
            .collect();
        Self { slots, head: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Evict the oldest frame and claim its slot as the newest, tagged with
    /// `viewport`. Returns the slot index to render into.
    pub fn advance(&mut self, viewport: Viewport) -> usize {
        let index = self.head;
        self.slots[index].viewport = viewport;
        self.head = (self.head + 1) % self.slots.len();
        index
    }

    /// Index of the most recently claimed slot.
    pub fn newest(&self) -> usize {
        (self.head + self.slots.len() - 1) % self.slots.len()
    }

    pub fn slot(&self, index: usize) -> &TrailSlot<T> {
        &self.slots[index]
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut TrailSlot<T> {
        &mut self.slots[index]
    }

    /// Slots from oldest to newest with their blend alpha.
    ///
    /// Alpha is `(K - age_index) / K` where the newest frame has age index 0,
    /// so the newest is opaque and the oldest is `1/K`.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = (usize, &TrailSlot<T>, f32)> + '_ {
        let k = self.slots.len();
        (0..k).map(move |i| {
            let index = (self.head + i) % k;
            let age_index = k - 1 - i;
            let alpha = (k - age_index) as f32 / k as f32;
            (index, &self.slots[index], alpha)
        })
    }

    /// Retag every slot, e.g. after the history was cleared.
    pub fn reset(&mut self, viewport: Viewport) {
        for slot in &mut self.slots {
            slot.viewport = viewport;
        }
        self.head = 0;
    }

    pub fn payloads_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.slots.iter_mut().map(|s| &mut s.payload)
    }
}

/// Move a screen point rendered under `captured` to where the same
/// geographic location appears under `current`.
pub fn reproject(captured: &Viewport, current: &Viewport, point: ScreenPoint) -> ScreenPoint {
    current.project_wrapped(captured.transform_point(point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::Coord;
    use approx::assert_relative_eq;

    fn ring(k: usize) -> TrailRing<usize> {
        TrailRing::new(k, Viewport::new(800, 400), |i| i)
    }

    #[test]
    fn test_advance_recycles_oldest() {
        let mut ring = ring(3);
        assert_eq!(ring.advance(Viewport::new(800, 400)), 0);
        assert_eq!(ring.advance(Viewport::new(800, 400)), 1);
        assert_eq!(ring.advance(Viewport::new(800, 400)), 2);
        assert_eq!(ring.advance(Viewport::new(800, 400)), 0);
        assert_eq!(ring.newest(), 0);
    }

    #[test]
    fn test_newest_is_tagged() {
        let mut ring = ring(4);
        let moved = Viewport::new(800, 400).with_zoom(3.0);
        let index = ring.advance(moved);
        assert_eq!(ring.slot(index).viewport, moved);
        assert_eq!(ring.newest(), index);
    }

    #[test]
    fn test_alpha_oldest_first() {
        let mut ring = ring(TRAIL_FRAMES);
        for _ in 0..7 {
            ring.advance(Viewport::new(800, 400));
        }
        let order: Vec<_> = ring.iter_oldest_first().collect();
        assert_eq!(order.len(), TRAIL_FRAMES);
        assert_eq!(order.last().map(|(i, _, _)| *i), Some(ring.newest()));
        assert_relative_eq!(order[0].2, 1.0 / TRAIL_FRAMES as f32);
        assert_relative_eq!(order[TRAIL_FRAMES - 1].2, 1.0);
        for pair in order.windows(2) {
            assert!(pair[0].2 < pair[1].2);
        }
    }

    #[test]
    fn test_evicted_slot_not_returned_before_reuse() {
        let mut ring = ring(5);
        let first = ring.advance(Viewport::new(800, 400));
        for _ in 0..4 {
            assert_ne!(ring.advance(Viewport::new(800, 400)), first);
        }
        assert_eq!(ring.advance(Viewport::new(800, 400)), first);
    }

    #[test]
    fn test_reproject_identity() {
        let viewport = Viewport::new(800, 400).with_zoom(2.0);
        let p = ScreenPoint::new(123.0, 321.0);
        let q = reproject(&viewport, &viewport, p);
        assert_relative_eq!(q.x, p.x, epsilon = 1e-9);
        assert_relative_eq!(q.y, p.y, epsilon = 1e-9);
    }

    #[test]
    fn test_reproject_follows_pan() {
        let captured = Viewport::new(1000, 500);
        let mut current = captured;
        current.pan_by_pixels(40.0, -20.0);
        let coord = Coord::new(200.0, 10.0);
        let then = captured.transform_coord(coord);
        let now = reproject(&captured, &current, then);
        let expected = current.transform_coord(coord);
        assert_relative_eq!(now.x, expected.x, epsilon = 1e-9);
        assert_relative_eq!(now.y, expected.y, epsilon = 1e-9);
    }

    #[test]
    fn test_reproject_follows_zoom() {
        let captured = Viewport::new(800, 600);
        let current = captured.with_zoom(2.0);
        // The view center is a fixed point of zooming
        let center = ScreenPoint::new(400.0, 300.0);
        let q = reproject(&captured, &current, center);
        assert_relative_eq!(q.x, 400.0, epsilon = 1e-9);
        assert_relative_eq!(q.y, 300.0, epsilon = 1e-9);
    }
}
