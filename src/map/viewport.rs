//! Map Viewport
//!
//! Owns the zoom level and scroll offset of the map canvas. The canvas is the
//! map image scaled to cover the container (`cover_scale0`) times the player's
//! zoom; the container shows a scrollable window onto it.

use super::coords::{cover_scale, to_pixel, MapPos, PixelOffset, Point, Size};
use super::pinch::{GesturePhase, PinchTracker, PointerEvent, PointerId, PINCH_THRESHOLD};
use super::rect::Rect;
use serde::{Deserialize, Serialize};

/// Zoom range for the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 0.5, max: 6.0 }
    }
}

impl ZoomLimits {
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

/// Scroll container over the scaled map image
#[derive(Debug, Clone)]
pub struct ViewportController {
    /// Container rect in screen coordinates
    bounds: Rect,
    image: Size,
    cover_scale0: f64,
    zoom: f64,
    scroll: PixelOffset,
    limits: ZoomLimits,
    pinch: PinchTracker,
}

impl ViewportController {
    pub fn new(bounds: Rect) -> Self {
        Self::with_limits(bounds, ZoomLimits::default(), PINCH_THRESHOLD)
    }

    pub fn with_limits(bounds: Rect, limits: ZoomLimits, pinch_threshold: f64) -> Self {
        Self {
            bounds,
            image: Size::default(),
            cover_scale0: 1.0,
            zoom: 1.0,
            scroll: PixelOffset::default(),
            limits,
            pinch: PinchTracker::new(pinch_threshold),
        }
    }

    // ------------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------------

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn container_size(&self) -> Size {
        Size::new(self.bounds.w, self.bounds.h)
    }

    pub fn image_size(&self) -> Size {
        self.image
    }

    pub fn cover_scale0(&self) -> f64 {
        self.cover_scale0
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn scroll(&self) -> PixelOffset {
        self.scroll
    }

    pub fn gesture_phase(&self) -> GesturePhase {
        self.pinch.phase()
    }

    pub fn pinch(&self) -> &PinchTracker {
        &self.pinch
    }

    /// Size of the scaled map canvas
    pub fn rendered_size(&self) -> Size {
        self.image.scaled(self.cover_scale0 * self.zoom)
    }

    /// Largest valid scroll offset on each axis
    pub fn max_scroll(&self) -> PixelOffset {
        let r = self.rendered_size();
        PixelOffset::new((r.w - self.bounds.w).max(0.0), (r.h - self.bounds.h).max(0.0))
    }

    // ------------------------------------------------------------------------
    // Content / resize
    // ------------------------------------------------------------------------

    /// A new map image arrived: zoom resets to 1 and the view recenters
    pub fn load_image(&mut self, image: Size) {
        self.image = image;
        self.zoom = 1.0;
        self.cover_scale0 = cover_scale(self.container_size(), image);
        self.pinch.reset();
        self.recenter();
        tracing::debug!(w = image.w, h = image.h, cover = self.cover_scale0, "map image loaded");
    }

    /// Container moved or resized: keep zoom, recompute cover scale, recenter
    pub fn resize(&mut self, bounds: Rect) {
        let resized = bounds.w != self.bounds.w || bounds.h != self.bounds.h;
        self.bounds = bounds;
        if resized {
            self.cover_scale0 = cover_scale(self.container_size(), self.image);
            self.recenter();
        }
    }

    /// Scroll so the middle of the canvas is in the middle of the container
    pub fn recenter(&mut self) {
        let r = self.rendered_size();
        self.set_scroll((r.w - self.bounds.w) / 2.0, (r.h - self.bounds.h) / 2.0);
    }

    // ------------------------------------------------------------------------
    // Scroll / zoom
    // ------------------------------------------------------------------------

    pub fn set_scroll(&mut self, left: f64, top: f64) {
        let max = self.max_scroll();
        self.scroll = PixelOffset::new(left.clamp(0.0, max.left), top.clamp(0.0, max.top));
    }

    /// Native single-pointer pan: dragging right reveals content to the left
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.set_scroll(self.scroll.left - dx, self.scroll.top - dy);
    }

    /// Zoom to `next_zoom` keeping the content under the screen point
    /// (`anchor_x`, `anchor_y`) fixed. Returns the applied (clamped) zoom.
    pub fn zoom_at(&mut self, next_zoom: f64, anchor_x: f64, anchor_y: f64) -> f64 {
        let view_x = anchor_x - self.bounds.x;
        let view_y = anchor_y - self.bounds.y;

        let old = self.rendered_size();
        let zoom = self.limits.clamp(next_zoom);

        if old.is_empty() {
            self.zoom = zoom;
            return zoom;
        }

        // Fraction of the canvas under the anchor before resizing
        let rx = (self.scroll.left + view_x) / old.w;
        let ry = (self.scroll.top + view_y) / old.h;

        self.zoom = zoom;
        let new = self.rendered_size();
        self.set_scroll(rx * new.w - view_x, ry * new.h - view_y);
        zoom
    }

    /// Multiply the zoom around an anchor (mouse wheel)
    pub fn zoom_by(&mut self, factor: f64, anchor_x: f64, anchor_y: f64) -> f64 {
        self.zoom_at(self.zoom * factor, anchor_x, anchor_y)
    }

    // ------------------------------------------------------------------------
    // Pointers
    // ------------------------------------------------------------------------

    pub fn pointer_down(&mut self, id: PointerId, x: f64, y: f64) -> bool {
        self.pinch.pointer_down(id, Point::new(x, y), &self.bounds)
    }

    /// Returns the new zoom when the move zoomed the map
    pub fn pointer_move(&mut self, id: PointerId, x: f64, y: f64) -> Option<f64> {
        let step = self.pinch.pointer_move(id, Point::new(x, y), &self.bounds)?;
        Some(self.zoom_at(self.zoom * step.ratio, step.anchor.x, step.anchor.y))
    }

    pub fn pointer_up(&mut self, id: PointerId) {
        self.pinch.pointer_up(id);
    }

    pub fn pointer_cancel(&mut self, id: PointerId) {
        self.pinch.pointer_cancel(id);
    }

    /// Route one pointer event. With `blocked` set (a modal owns the screen)
    /// presses and moves are dropped, but releases still clear the pointer.
    pub fn handle_pointer(&mut self, id: PointerId, event: PointerEvent, x: f64, y: f64, blocked: bool) -> Option<f64> {
        if blocked && !event.is_release() {
            return None;
        }
        match event {
            PointerEvent::Down => {
                self.pointer_down(id, x, y);
                None
            }
            PointerEvent::Move => self.pointer_move(id, x, y),
            PointerEvent::Up => {
                self.pointer_up(id);
                None
            }
            PointerEvent::Cancel => {
                self.pointer_cancel(id);
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Coordinate helpers
    // ------------------------------------------------------------------------

    /// Canvas offset of a pin
    pub fn pin_offset(&self, pos: MapPos) -> PixelOffset {
        to_pixel(pos, self.image, self.cover_scale0, self.zoom)
    }

    /// Canvas offset -> screen point
    pub fn canvas_to_screen(&self, offset: PixelOffset) -> Point {
        Point::new(
            self.bounds.x + offset.left - self.scroll.left,
            self.bounds.y + offset.top - self.scroll.top,
        )
    }

    /// Screen point -> canvas offset
    pub fn screen_to_canvas(&self, x: f64, y: f64) -> PixelOffset {
        PixelOffset::new(
            x - self.bounds.x + self.scroll.left,
            y - self.bounds.y + self.scroll.top,
        )
    }

    /// Screen position of a pin
    pub fn pin_screen(&self, pos: MapPos) -> Point {
        self.canvas_to_screen(self.pin_offset(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> ViewportController {
        let mut v = ViewportController::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        v.load_image(Size::new(1600.0, 1200.0));
        v
    }

    #[test]
    fn test_load_image_covers_container() {
        let v = viewport();
        assert_eq!(v.cover_scale0(), 0.5);
        assert_eq!(v.rendered_size(), Size::new(800.0, 600.0));
        assert_eq!(v.scroll(), PixelOffset::new(0.0, 0.0));
    }

    #[test]
    fn test_pin_center() {
        let v = viewport();
        let p = v.pin_screen(MapPos::Normalized { x: 0.5, y: 0.5 });
        assert!((p.x - 400.0).abs() < 1e-9);
        assert!((p.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut v = viewport();
        let anchor = (200.0, 150.0);
        let before = v.screen_to_canvas(anchor.0, anchor.1);
        let frac = (before.left / v.rendered_size().w, before.top / v.rendered_size().h);

        v.zoom_at(2.0, anchor.0, anchor.1);
        assert_eq!(v.zoom(), 2.0);

        let after = v.screen_to_canvas(anchor.0, anchor.1);
        assert!((after.left / v.rendered_size().w - frac.0).abs() < 1e-9);
        assert!((after.top / v.rendered_size().h - frac.1).abs() < 1e-9);
        assert!((v.scroll().left - 200.0).abs() < 1e-9);
        assert!((v.scroll().top - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_at_respects_container_offset() {
        let mut v = ViewportController::new(Rect::new(100.0, 50.0, 800.0, 600.0));
        v.load_image(Size::new(1600.0, 1200.0));
        v.zoom_at(2.0, 500.0, 350.0);
        // Anchor was the container center: canvas 1600x1200 -> scroll (400, 300)
        assert!((v.scroll().left - 400.0).abs() < 1e-9);
        assert!((v.scroll().top - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut v = viewport();
        assert_eq!(v.zoom_at(10.0, 0.0, 0.0), 6.0);
        assert_eq!(v.zoom_at(0.1, 0.0, 0.0), 0.5);
        // Zoomed out below the container: no scrolling possible
        assert_eq!(v.scroll(), PixelOffset::new(0.0, 0.0));
    }

    #[test]
    fn test_scroll_clamped_to_bounds() {
        let mut v = viewport();
        v.zoom_at(2.0, 0.0, 0.0);
        v.set_scroll(-50.0, 10_000.0);
        assert_eq!(v.scroll(), PixelOffset::new(0.0, 600.0));
        v.pan_by(-100.0, 0.0);
        assert_eq!(v.scroll().left, 100.0);
    }

    #[test]
    fn test_resize_recenters() {
        let mut v = viewport();
        v.zoom_at(3.0, 0.0, 0.0);
        v.resize(Rect::new(0.0, 0.0, 400.0, 600.0));
        // cover = max(400/1600, 600/1200) = 0.5, canvas 2400x1800 at zoom 3
        assert_eq!(v.cover_scale0(), 0.5);
        assert!((v.scroll().left - 1000.0).abs() < 1e-9);
        assert!((v.scroll().top - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_spread_zooms() {
        let mut v = viewport();
        v.pointer_down(1, 300.0, 300.0);
        assert!(v.pointer_down(2, 500.0, 300.0));
        assert_eq!(v.gesture_phase(), GesturePhase::Pinching);
        let z = v.pointer_move(2, 600.0, 300.0).unwrap();
        assert!((z - 1.5).abs() < 1e-9);
        assert!((v.zoom() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_clamped_at_max() {
        let mut v = viewport();
        v.zoom_at(5.0, 400.0, 300.0);
        v.pointer_down(1, 300.0, 300.0);
        v.pointer_down(2, 500.0, 300.0);
        let z = v.pointer_move(2, 600.0, 300.0).unwrap();
        assert_eq!(z, 6.0);
    }

    #[test]
    fn test_release_while_blocked_clears_pointers() {
        let mut v = viewport();
        v.handle_pointer(1, PointerEvent::Down, 300.0, 300.0, false);
        v.handle_pointer(2, PointerEvent::Down, 400.0, 300.0, false);
        assert_eq!(v.gesture_phase(), GesturePhase::Pinching);

        // A modal pops up mid-pinch; the fingers lift under it
        assert_eq!(v.handle_pointer(2, PointerEvent::Move, 450.0, 300.0, true), None);
        v.handle_pointer(1, PointerEvent::Up, 300.0, 300.0, true);
        v.handle_pointer(2, PointerEvent::Cancel, 400.0, 300.0, true);
        assert!(v.pinch().pointers().is_empty());
        assert_eq!(v.gesture_phase(), GesturePhase::Idle);

        // Presses under a modal are not tracked
        v.handle_pointer(5, PointerEvent::Down, 300.0, 300.0, true);
        assert!(v.pinch().pointers().is_empty());

        // A fresh pinch after the modal closes still zooms
        v.handle_pointer(3, PointerEvent::Down, 300.0, 300.0, false);
        v.handle_pointer(4, PointerEvent::Down, 400.0, 300.0, false);
        let z = v.handle_pointer(4, PointerEvent::Move, 600.0, 300.0, false).unwrap();
        assert!((z - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_without_image() {
        let mut v = ViewportController::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        assert_eq!(v.zoom_at(2.0, 10.0, 10.0), 2.0);
        assert_eq!(v.scroll(), PixelOffset::default());
    }
}
