//! Position Source
//!
//! The device geolocation collaborator. A source hands out watch ids for
//! continuous subscriptions and queues updates tagged with the id they were
//! produced for; the game session drains them once per frame.

use serde::{Deserialize, Serialize};

/// Identifier of one continuous position subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u32);

/// A single position reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub lat: f64,
    pub lon: f64,
    /// Horizontal accuracy in metres, when the source reports one
    pub accuracy_m: Option<f64>,
    /// Milliseconds on the source's own clock
    pub timestamp_ms: u64,
}

impl PositionFix {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            accuracy_m: None,
            timestamp_ms: 0,
        }
    }
}

/// Why a position could not be obtained
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    /// The device has no geolocation support at all
    #[error("geolocation is not supported on this device")]
    MissingCapability,
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("timed out waiting for a position")]
    Timeout,
}

impl PositionError {
    /// Permission/timeout/unavailable errors are transient: the player may retry.
    pub fn is_missing_capability(&self) -> bool {
        matches!(self, PositionError::MissingCapability)
    }
}

/// Options passed to the source when subscribing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    /// Accept cached positions up to this age
    pub maximum_age_ms: u64,
    pub timeout_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age_ms: 2000,
            timeout_ms: 10_000,
        }
    }
}

/// One queued event from a continuous subscription
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    pub watch: WatchId,
    pub result: Result<PositionFix, PositionError>,
}

/// Device geolocation, as seen by the game session.
///
/// Everything is poll based: nothing calls back into the session while it is
/// handling an event.
pub trait PositionSource {
    /// Whether the device can provide positions at all
    fn is_supported(&self) -> bool;

    /// Begin a continuous subscription
    fn watch_position(&mut self, options: &WatchOptions) -> Result<WatchId, PositionError>;

    /// Cancel a subscription. Unknown ids are ignored.
    fn clear_watch(&mut self, id: WatchId);

    /// One-shot position request
    fn current_position(&mut self, options: &WatchOptions) -> Result<PositionFix, PositionError>;

    /// Drain updates queued since the last poll
    fn poll_updates(&mut self) -> Vec<PositionUpdate>;
}
