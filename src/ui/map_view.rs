//! Map canvas and pin drawing

use macroquad::prelude::*;
use questmap::game::PinView;
use questmap::map::{PixelOffset, ViewportController};

use super::theme::*;

/// Draw the scaled map image clipped to the viewport bounds
pub fn draw_map(texture: Option<&Texture2D>, viewport: &ViewportController) {
    let bounds = viewport.bounds();
    draw_rectangle(bounds.x as f32, bounds.y as f32, bounds.w as f32, bounds.h as f32, BG_COLOR);

    let Some(texture) = texture else {
        let msg = "No map image";
        let dims = measure_text(msg, None, FONT_SIZE_CONTENT as u16, 1.0);
        draw_text(
            msg,
            bounds.center_x() as f32 - dims.width * 0.5,
            bounds.center_y() as f32,
            FONT_SIZE_CONTENT,
            TEXT_DIM,
        );
        return;
    };

    let rendered = viewport.rendered_size();
    let origin = viewport.canvas_to_screen(PixelOffset::new(0.0, 0.0));
    draw_texture_ex(
        texture,
        origin.x as f32,
        origin.y as f32,
        WHITE,
        DrawTextureParams {
            dest_size: Some(vec2(rendered.w as f32, rendered.h as f32)),
            ..Default::default()
        },
    );
}

/// Draw pins with their labels; pins outside the viewport are skipped
pub fn draw_pins(pins: &[PinView], viewport: &ViewportController) {
    let bounds = viewport.bounds();
    for pin in pins {
        if !bounds.contains(pin.screen.x, pin.screen.y) {
            continue;
        }
        let (x, y) = (pin.screen.x as f32, pin.screen.y as f32);
        let fill = if pin.unlocked { PIN_UNLOCKED } else { PIN_LOCKED };
        draw_circle(x, y, PIN_RADIUS + 2.0, PIN_OUTLINE);
        draw_circle(x, y, PIN_RADIUS, fill);

        let dims = measure_text(&pin.label, None, FONT_SIZE_SMALL as u16, 1.0);
        let lx = x - dims.width * 0.5;
        let ly = y - PIN_RADIUS - 6.0;
        draw_rectangle(lx - 3.0, ly - dims.height - 2.0, dims.width + 6.0, dims.height + 6.0, SCRIM_COLOR);
        draw_text(&pin.label, lx, ly, FONT_SIZE_SMALL, TEXT_COLOR);
    }
}
