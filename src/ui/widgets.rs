//! Basic UI widgets

use macroquad::prelude::*;
use questmap::map::Rect;

use super::theme::*;
use super::UiContext;

/// Left-to-right toolbar layout
pub struct Toolbar {
    rect: Rect,
    cursor_x: f64,
    spacing: f64,
}

impl Toolbar {
    pub fn new(rect: Rect) -> Self {
        draw_rectangle(rect.x as f32, rect.y as f32, rect.w as f32, rect.h as f32, HEADER_COLOR);
        Self {
            rect,
            cursor_x: rect.x + 6.0,
            spacing: 6.0,
        }
    }

    pub fn label(&mut self, text: &str, color: Color) {
        let dims = measure_text(text, None, FONT_SIZE_CONTENT as u16, 1.0);
        let text_y = (self.rect.y as f32 + (self.rect.h as f32 + dims.height) * 0.5).round();
        draw_text(text, self.cursor_x.round() as f32, text_y, FONT_SIZE_CONTENT, color);
        self.cursor_x += dims.width as f64 + self.spacing;
    }

    /// Text button sized to its label; true when clicked
    pub fn button(&mut self, ctx: &mut UiContext, label: &str, active: bool) -> bool {
        let dims = measure_text(label, None, FONT_SIZE_CONTENT as u16, 1.0);
        let w = dims.width as f64 + 20.0;
        let r = Rect::new(self.cursor_x, self.rect.y + 4.0, w, self.rect.h - 8.0);
        self.cursor_x += w + self.spacing;
        text_button(ctx, r, label, active)
    }
}

/// Rounded button with a centered label; true when clicked
pub fn text_button(ctx: &mut UiContext, rect: Rect, label: &str, active: bool) -> bool {
    let hovered = ctx.mouse.inside(&rect);
    let bg = if active {
        ACCENT_COLOR
    } else if hovered {
        BUTTON_HOVER
    } else {
        BUTTON_BG
    };
    draw_rounded_rect(rect.x as f32, rect.y as f32, rect.w as f32, rect.h as f32, 4.0, bg);

    let dims = measure_text(label, None, FONT_SIZE_CONTENT as u16, 1.0);
    let tx = rect.center_x() as f32 - dims.width * 0.5;
    let ty = rect.center_y() as f32 + dims.height * 0.35;
    draw_text(label, tx.round(), ty.round(), FONT_SIZE_CONTENT, if active { WHITE } else { TEXT_COLOR });

    ctx.take_click(&rect)
}

/// Draw a rounded rectangle (simple approximation using overlapping rects)
pub fn draw_rounded_rect(x: f32, y: f32, w: f32, h: f32, r: f32, color: Color) {
    draw_rectangle(x + r, y, w - r * 2.0, h, color);
    draw_rectangle(x, y + r, w, h - r * 2.0, color);
    draw_circle(x + r, y + r, r, color);
    draw_circle(x + w - r, y + r, r, color);
    draw_circle(x + r, y + h - r, r, color);
    draw_circle(x + w - r, y + h - r, r, color);
}

/// Greedy word wrap by measured width
pub fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if !line.is_empty() && measure(&candidate) > max_width {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            } else {
                line = candidate;
            }
        }
        lines.push(line);
    }
    lines
}

/// Draw wrapped text starting at the top of `rect`; returns the height used
pub fn draw_wrapped(text: &str, rect: Rect, font_size: f32, color: Color) -> f64 {
    let line_h = font_size * 1.25;
    let lines = wrap_text(text, rect.w as f32, |s| measure_text(s, None, font_size as u16, 1.0).width);
    let mut y = rect.y as f32 + font_size;
    for line in &lines {
        draw_text(line, rect.x as f32, y, font_size, color);
        y += line_h;
    }
    (lines.len() as f32 * line_h) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_by_width() {
        // One unit per character
        let lines = wrap_text("the quick brown fox", 10.0, |s| s.len() as f32);
        assert_eq!(lines, vec!["the quick", "brown fox"]);
    }

    #[test]
    fn test_wrap_keeps_paragraphs_and_long_words() {
        let lines = wrap_text("a\nsupercalifragilistic b", 5.0, |s| s.len() as f32);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }
}
