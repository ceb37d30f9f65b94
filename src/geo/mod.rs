//! Geographic helpers
//!
//! - `distance`: great-circle distance between two lat/lon points
//! - `source`: position source abstraction (continuous watch + one-shot fixes)
//! - `track`: a position source that replays a recorded track

mod distance;
pub mod source;
pub mod track;

pub use distance::{distance_meters, EARTH_RADIUS_M};
pub use source::{PositionError, PositionFix, PositionSource, PositionUpdate, WatchId, WatchOptions};
pub use track::{TrackPoint, TrackReplaySource};
