//! UI Theme - Shared colors and sizes for the player

use macroquad::prelude::Color;

// =============================================================================
// Base colors
// =============================================================================

/// Behind the map when the image does not fill the window
pub const BG_COLOR: Color = Color::new(0.11, 0.11, 0.13, 1.0);

/// Toolbar background
pub const HEADER_COLOR: Color = Color::new(0.15, 0.15, 0.18, 0.92);

pub const TEXT_COLOR: Color = Color::new(0.85, 0.85, 0.9, 1.0);

pub const TEXT_DIM: Color = Color::new(0.5, 0.5, 0.55, 1.0);

/// Active toggles and primary buttons
pub const ACCENT_COLOR: Color = Color::new(0.0, 0.75, 0.9, 1.0);

/// Test mode badge
pub const WARNING_COLOR: Color = Color::new(0.95, 0.6, 0.1, 1.0);

// =============================================================================
// Font sizes
// =============================================================================

pub const FONT_SIZE_HEADER: f32 = 22.0;

pub const FONT_SIZE_CONTENT: f32 = 18.0;

pub const FONT_SIZE_SMALL: f32 = 14.0;

// =============================================================================
// Map pins
// =============================================================================

pub const PIN_RADIUS: f32 = 10.0;

pub const PIN_LOCKED: Color = Color::new(0.55, 0.55, 0.6, 1.0);

pub const PIN_UNLOCKED: Color = Color::new(0.2, 0.8, 0.4, 1.0);

pub const PIN_OUTLINE: Color = Color::new(0.05, 0.05, 0.07, 1.0);

// =============================================================================
// Modals and cards
// =============================================================================

/// Dimmed backdrop behind a modal
pub const SCRIM_COLOR: Color = Color::new(0.0, 0.0, 0.0, 0.55);

pub const MODAL_BG: Color = Color::new(0.176, 0.176, 0.196, 1.0);

pub const MODAL_BORDER: Color = Color::new(0.314, 0.314, 0.314, 1.0);

pub const BUTTON_BG: Color = Color::new(0.235, 0.235, 0.275, 1.0);

pub const BUTTON_HOVER: Color = Color::new(0.235, 0.314, 0.392, 1.0);
