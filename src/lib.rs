//! QUESTMAP: a location-based scavenger-hunt player
//!
//! Players walk a game's missions and unlock each one by its trigger:
//! - QR: scanning a code whose payload matches exactly
//! - GPS: standing inside the mission's geofence
//! - AR: an image-target detector recognizing the mission's marker
//!
//! Missions are pinned on a zoomable, pannable map image with
//! anchor-preserving zoom and two-finger pinch.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod game;
pub mod geo;
pub mod map;
pub mod storage;

pub use config::{ConfigError, PlayerConfig, DEFAULT_API_BASE};
pub use game::{Game, GameSession, Mission, MissionUnlockState, ScanTarget, SessionOptions, TriggerEvaluator, TriggerOutcome};
pub use geo::{distance_meters, PositionSource, TrackReplaySource};
pub use map::{MapPos, ViewportController};
pub use storage::{GameRepository, LocalGameRepository, RepoError};
