//! Pinch Gesture Tracking
//!
//! Tracks active pointers (touch points) over the map and turns two-finger
//! spread/contract into zoom ratios. Single-pointer dragging is plain
//! scrolling and is left to the viewport.
//!
//! Key concepts:
//! - `PointerTable`: fixed-capacity pointer id -> last position table
//! - `GesturePhase`: Idle, Panning (one pointer) or Pinching (two engaged)
//! - `PinchStep`: zoom ratio + anchor produced by a pinch move

use super::coords::Point;
use super::rect::Rect;

pub type PointerId = u64;

/// Most simultaneous pointers tracked; extra touches are ignored
pub const MAX_POINTERS: usize = 10;

/// Default minimum relative distance change before a pinch zooms (1%)
pub const PINCH_THRESHOLD: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pointer {
    id: PointerId,
    pos: Point,
    /// Insertion order; the pinch pair is the two oldest pointers
    seq: u64,
}

/// Active pointers keyed by id
#[derive(Debug, Clone)]
pub struct PointerTable {
    slots: [Option<Pointer>; MAX_POINTERS],
    next_seq: u64,
}

impl Default for PointerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerTable {
    pub fn new() -> Self {
        Self {
            slots: [None; MAX_POINTERS],
            next_seq: 0,
        }
    }

    fn slot_of(&self, id: PointerId) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.map(|p| p.id == id).unwrap_or(false))
    }

    /// Add a pointer (or refresh its position if already tracked).
    /// Returns false when the table is full.
    pub fn insert(&mut self, id: PointerId, pos: Point) -> bool {
        if self.update(id, pos) {
            return true;
        }
        let Some(free) = self.slots.iter().position(|s| s.is_none()) else {
            return false;
        };
        self.slots[free] = Some(Pointer {
            id,
            pos,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        true
    }

    /// Move a tracked pointer. Returns false for unknown ids.
    pub fn update(&mut self, id: PointerId, pos: Point) -> bool {
        match self.slot_of(id).and_then(|i| self.slots[i].as_mut()) {
            Some(p) => {
                p.pos = pos;
                true
            }
            None => false,
        }
    }

    /// Returns whether the pointer was tracked
    pub fn remove(&mut self, id: PointerId) -> bool {
        match self.slot_of(id) {
            Some(i) => {
                self.slots[i] = None;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: PointerId) -> bool {
        self.slot_of(id).is_some()
    }

    pub fn position(&self, id: PointerId) -> Option<Point> {
        self.slot_of(id).and_then(|i| self.slots[i]).map(|p| p.pos)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    pub fn clear(&mut self) {
        self.slots = [None; MAX_POINTERS];
    }

    /// Ids of the two longest-held pointers
    pub fn pair_ids(&self) -> Option<(PointerId, PointerId)> {
        let mut active: Vec<&Pointer> = self.slots.iter().flatten().collect();
        if active.len() < 2 {
            return None;
        }
        active.sort_by_key(|p| p.seq);
        Some((active[0].id, active[1].id))
    }

    /// Last known positions of the two longest-held pointers
    pub fn pair(&self) -> Option<(Point, Point)> {
        let (a, b) = self.pair_ids()?;
        Some((self.position(a)?, self.position(b)?))
    }
}

/// What the pointers over the map are doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    /// One pointer down: native scroll/pan
    Panning,
    /// Two pointers engaged inside the viewport
    Pinching,
}

/// Raw pointer transition as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Down,
    Move,
    Up,
    Cancel,
}

impl PointerEvent {
    /// Ends a pointer's lifetime; must reach the tracker even when input is blocked
    pub fn is_release(self) -> bool {
        matches!(self, PointerEvent::Up | PointerEvent::Cancel)
    }
}

/// A zoom request produced by a pinch move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchStep {
    /// New distance / reference distance
    pub ratio: f64,
    /// Midpoint of the two pointers (screen coords)
    pub anchor: Point,
}

/// Two-pointer pinch recognizer
#[derive(Debug, Clone)]
pub struct PinchTracker {
    pointers: PointerTable,
    phase: GesturePhase,
    /// Pointer distance the next ratio is measured against
    reference: Option<f64>,
    /// The two pointers driving the current pinch
    engaged: Option<(PointerId, PointerId)>,
    threshold: f64,
}

impl Default for PinchTracker {
    fn default() -> Self {
        Self::new(PINCH_THRESHOLD)
    }
}

impl PinchTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            pointers: PointerTable::new(),
            phase: GesturePhase::Idle,
            reference: None,
            engaged: None,
            threshold,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn pointers(&self) -> &PointerTable {
        &self.pointers
    }

    pub fn reference_distance(&self) -> Option<f64> {
        self.reference
    }

    pub fn engaged_pair(&self) -> Option<(PointerId, PointerId)> {
        self.engaged
    }

    /// Pointer pressed. Returns true if this press engaged a pinch.
    pub fn pointer_down(&mut self, id: PointerId, pos: Point, bounds: &Rect) -> bool {
        if !self.pointers.insert(id, pos) {
            tracing::trace!(id, "pointer table full, ignoring pointer");
            return false;
        }
        if self.phase == GesturePhase::Pinching {
            return false;
        }
        if self.try_engage(bounds) {
            return true;
        }
        if self.pointers.len() == 1 {
            self.phase = GesturePhase::Panning;
        }
        false
    }

    /// Pointer moved. Produces a zoom step when an engaged pinch changed
    /// distance by more than the threshold.
    pub fn pointer_move(&mut self, id: PointerId, pos: Point, bounds: &Rect) -> Option<PinchStep> {
        if !self.pointers.update(id, pos) {
            return None;
        }
        let Some((ia, ib)) = self.engaged.filter(|_| self.phase == GesturePhase::Pinching) else {
            // Fingers that started outside may slide in; the step starts next move
            self.try_engage(bounds);
            return None;
        };
        let (a, b) = (self.pointers.position(ia)?, self.pointers.position(ib)?);

        let d = a.distance_to(b);
        let reference = match self.reference {
            Some(r) if r > 0.0 => r,
            _ => {
                self.reference = (d > 0.0).then_some(d);
                return None;
            }
        };

        let ratio = d / reference;
        if (ratio - 1.0).abs() <= self.threshold {
            return None;
        }
        self.reference = Some(d);
        tracing::trace!(ratio, "pinch step");
        Some(PinchStep {
            ratio,
            anchor: a.midpoint(b),
        })
    }

    /// Pointer lifted
    pub fn pointer_up(&mut self, id: PointerId) {
        self.release(id);
    }

    /// Pointer cancelled by the platform (palm rejection, focus loss, ...)
    pub fn pointer_cancel(&mut self, id: PointerId) {
        self.release(id);
    }

    /// Drop every pointer (window lost focus, map reloaded)
    pub fn reset(&mut self) {
        self.pointers.clear();
        self.end_pinch();
    }

    fn release(&mut self, id: PointerId) {
        self.pointers.remove(id);
        let was_engaged = self.engaged.is_some_and(|(a, b)| a == id || b == id);
        if was_engaged {
            self.end_pinch();
        } else if self.phase != GesturePhase::Pinching {
            self.phase = self.resting_phase();
        }
    }

    fn try_engage(&mut self, bounds: &Rect) -> bool {
        let Some((ia, ib)) = self.pointers.pair_ids() else {
            return false;
        };
        let (Some(a), Some(b)) = (self.pointers.position(ia), self.pointers.position(ib)) else {
            return false;
        };
        if !(bounds.contains(a.x, a.y) && bounds.contains(b.x, b.y)) {
            return false;
        }
        let d = a.distance_to(b);
        self.phase = GesturePhase::Pinching;
        self.engaged = Some((ia, ib));
        self.reference = (d > 0.0).then_some(d);
        tracing::debug!(distance = d, "pinch engaged");
        true
    }

    fn end_pinch(&mut self) {
        if self.phase == GesturePhase::Pinching {
            tracing::debug!("pinch released");
        }
        self.engaged = None;
        self.reference = None;
        self.phase = self.resting_phase();
    }

    /// Phase when no pinch is engaged
    fn resting_phase(&self) -> GesturePhase {
        if self.pointers.len() == 1 {
            GesturePhase::Panning
        } else {
            GesturePhase::Idle
        }
    }
}
