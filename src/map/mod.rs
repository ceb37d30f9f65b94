//! Map Viewport Geometry
//!
//! Everything needed to place mission pins on the zoomable map:
//! - `coords`: normalized <-> pixel conversions, cover and contain-fit scales
//! - `viewport`: zoom level, scroll offset, anchor-preserving zoom
//! - `pinch`: two-pointer pinch recognition over a fixed pointer table
//! - `rect`: screen rectangles
//!
//! All geometry is `f64`; the player converts to `f32` only when drawing.

pub mod coords;
pub mod pinch;
mod rect;
pub mod viewport;

pub use coords::{
    contain_fit, cover_scale, to_normalized, to_pixel, to_pixel_on_contain_rect, ContainRect,
    MapPos, PixelOffset, Point, Size,
};
pub use pinch::{GesturePhase, PinchStep, PinchTracker, PointerEvent, PointerId, PointerTable};
pub use rect::Rect;
pub use viewport::{ViewportController, ZoomLimits};
