//! Immediate-mode UI for the player
//!
//! - Map canvas with mission pins
//! - Toolbar (global QR, GPS watch toggle, test tools)
//! - Modals for notifications, mission cards, the scanner and AR viewer
//!
//! Everything is redrawn each frame from session state.

mod dialog;
mod input;
mod map_view;
mod text_input;
mod theme;
mod widgets;

pub use dialog::*;
pub use input::*;
pub use map_view::*;
pub use text_input::*;
pub use theme::*;
pub use widgets::*;
