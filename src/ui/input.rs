//! Input state for UI interaction

use questmap::map::Rect;

/// Mouse button state, sampled once per frame
#[derive(Debug, Clone, Copy, Default)]
pub struct MouseState {
    pub x: f64,
    pub y: f64,
    pub left_down: bool,
    pub left_pressed: bool,  // Just pressed this frame
    pub left_released: bool, // Just released this frame
    pub scroll: f64,         // Scroll wheel delta
}

impl MouseState {
    pub fn sample() -> Self {
        use macroquad::prelude::*;

        let (x, y) = mouse_position();
        Self {
            x: x as f64,
            y: y as f64,
            left_down: is_mouse_button_down(MouseButton::Left),
            left_pressed: is_mouse_button_pressed(MouseButton::Left),
            left_released: is_mouse_button_released(MouseButton::Left),
            scroll: mouse_wheel().1 as f64,
        }
    }

    /// Check if mouse is inside a rect
    pub fn inside(&self, rect: &Rect) -> bool {
        rect.contains(self.x, self.y)
    }

    /// Check if mouse is held down inside a rect
    pub fn clicking(&self, rect: &Rect) -> bool {
        self.left_down && rect.contains(self.x, self.y)
    }

    /// Check if mouse just clicked inside a rect
    pub fn clicked(&self, rect: &Rect) -> bool {
        self.left_pressed && rect.contains(self.x, self.y)
    }
}

/// UI context passed through the frame
#[derive(Debug, Default)]
pub struct UiContext {
    pub mouse: MouseState,
    /// Set when a widget handled this frame's click, so the map ignores it
    pub click_consumed: bool,
    /// A modal is open; everything outside it is inert
    pub modal_open: bool,
}

impl UiContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset at start of frame (call before UI code)
    pub fn begin_frame(&mut self, mouse: MouseState) {
        self.mouse = mouse;
        self.click_consumed = false;
        self.modal_open = false;
    }

    /// Click inside `rect` that no other widget took yet
    pub fn take_click(&mut self, rect: &Rect) -> bool {
        if !self.click_consumed && self.mouse.clicked(rect) {
            self.click_consumed = true;
            return true;
        }
        false
    }

    /// Mark the whole frame's pointer input as handled by the UI
    pub fn block_pointer(&mut self, rect: &Rect) {
        if self.mouse.inside(rect) && (self.mouse.left_pressed || self.mouse.left_down) {
            self.click_consumed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clicked_at(x: f64, y: f64) -> MouseState {
        MouseState {
            x,
            y,
            left_down: true,
            left_pressed: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_click_taken_once() {
        let mut ctx = UiContext::new();
        ctx.begin_frame(clicked_at(5.0, 5.0));
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(ctx.take_click(&r));
        assert!(!ctx.take_click(&r));
        ctx.begin_frame(clicked_at(5.0, 5.0));
        assert!(ctx.take_click(&r));
    }

    #[test]
    fn test_click_outside() {
        let mut ctx = UiContext::new();
        ctx.begin_frame(clicked_at(50.0, 5.0));
        assert!(!ctx.take_click(&Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(!ctx.click_consumed);
    }
}
