//! Single-line text field for answers and typed QR payloads

use macroquad::prelude::*;
use questmap::map::Rect;

use super::theme::{ACCENT_COLOR, TEXT_COLOR, TEXT_DIM};

/// What a frame of typing did to the field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEvent {
    None,
    Changed,
    /// Enter pressed
    Submitted,
}

#[derive(Debug, Clone, Default)]
pub struct TextField {
    pub text: String,
    /// Cursor position (byte index)
    pub cursor: usize,
    pub blink_timer: f32,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Take the text out, leaving the field empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    fn prev_boundary(&self) -> usize {
        self.text[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn next_boundary(&self) -> usize {
        self.text[self.cursor..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| self.cursor + i)
            .unwrap_or(self.text.len())
    }

    pub fn move_left(&mut self) {
        self.cursor = self.prev_boundary();
    }

    pub fn move_right(&mut self) {
        self.cursor = self.next_boundary();
    }

    pub fn insert_char(&mut self, ch: char) {
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.prev_boundary();
            self.text.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            let next = self.next_boundary();
            self.text.drain(self.cursor..next);
        }
    }

    /// Apply this frame's keyboard input
    pub fn handle_input(&mut self) -> FieldEvent {
        self.blink_timer += get_frame_time();
        let before = self.text.len();
        let mut changed = false;

        if is_key_pressed(KeyCode::Left) {
            self.move_left();
            self.blink_timer = 0.0;
        }
        if is_key_pressed(KeyCode::Right) {
            self.move_right();
            self.blink_timer = 0.0;
        }
        if is_key_pressed(KeyCode::Home) {
            self.cursor = 0;
        }
        if is_key_pressed(KeyCode::End) {
            self.cursor = self.text.len();
        }
        if is_key_pressed(KeyCode::Backspace) {
            self.backspace();
            changed = true;
        }
        if is_key_pressed(KeyCode::Delete) {
            self.delete();
            changed = true;
        }
        while let Some(ch) = get_char_pressed() {
            // Filter control characters
            if ch >= ' ' && ch != '\u{7f}' {
                self.insert_char(ch);
                changed = true;
            }
        }
        if is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter) {
            return FieldEvent::Submitted;
        }
        if changed || self.text.len() != before {
            self.blink_timer = 0.0;
            FieldEvent::Changed
        } else {
            FieldEvent::None
        }
    }
}

const INPUT_BG: Color = Color::new(0.12, 0.12, 0.14, 1.0);

/// Draw the field and apply keyboard input
pub fn draw_text_field(rect: Rect, field: &mut TextField, placeholder: &str, font_size: f32) -> FieldEvent {
    let (x, y, w, h) = (rect.x as f32, rect.y as f32, rect.w as f32, rect.h as f32);
    draw_rectangle(x, y, w, h, INPUT_BG);
    draw_rectangle_lines(x, y, w, h, 1.0, ACCENT_COLOR);

    let event = field.handle_input();

    let padding = 8.0;
    let text_x = x + padding;
    let text_y = y + (h + font_size * 0.7) / 2.0;
    if field.text.is_empty() {
        draw_text(placeholder, text_x, text_y, font_size, TEXT_DIM);
    } else {
        draw_text(&field.text, text_x, text_y, font_size, TEXT_COLOR);
    }

    if (field.blink_timer % 1.0) < 0.5 {
        let offset = measure_text(&field.text[..field.cursor], None, font_size as u16, 1.0).width;
        let cx = text_x + offset;
        draw_line(cx, y + 6.0, cx, y + h - 6.0, 1.5, TEXT_COLOR);
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_utf8() {
        let mut f = TextField::new();
        for ch in "café".chars() {
            f.insert_char(ch);
        }
        assert_eq!(f.cursor, f.text.len());
        f.backspace();
        assert_eq!(f.text, "caf");
        f.move_left();
        f.move_left();
        f.delete();
        assert_eq!(f.text, "cf");
        assert_eq!(f.cursor, 1);
    }

    #[test]
    fn test_take_empties() {
        let mut f = TextField::new();
        f.insert_char('x');
        assert_eq!(f.take(), "x");
        assert!(f.text.is_empty());
        assert_eq!(f.cursor, 0);
    }
}
