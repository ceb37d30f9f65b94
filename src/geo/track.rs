//! Track Replay
//!
//! A `PositionSource` that replays a recorded walk. Used by the desktop
//! player (no GPS hardware) and by the session tests.
//!
//! Track files are RON lists:
//! ```ron
//! [
//!     Fix(at_ms: 0, lat: -41.2865, lon: 174.7762),
//!     Fix(at_ms: 5000, lat: -41.2866, lon: 174.7763),
//!     Timeout(at_ms: 9000),
//! ]
//! ```

use super::source::{PositionError, PositionFix, PositionSource, PositionUpdate, WatchId, WatchOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One recorded event, due `at_ms` after the replay started
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TrackPoint {
    Fix { at_ms: u64, lat: f64, lon: f64 },
    Denied { at_ms: u64 },
    Timeout { at_ms: u64 },
}

impl TrackPoint {
    pub fn at_ms(&self) -> u64 {
        match *self {
            TrackPoint::Fix { at_ms, .. } => at_ms,
            TrackPoint::Denied { at_ms } => at_ms,
            TrackPoint::Timeout { at_ms } => at_ms,
        }
    }
}

/// Error loading a track file
#[derive(Debug, thiserror::Error)]
pub enum TrackLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Replays track points against a virtual clock
#[derive(Debug, Clone)]
pub struct TrackReplaySource {
    points: Vec<TrackPoint>,
    /// Index of the next point not yet due
    cursor: usize,
    clock_ms: u64,
    supported: bool,
    active: Option<WatchId>,
    next_watch: u32,
    pending: Vec<PositionUpdate>,
    last_fix: Option<PositionFix>,
}

impl TrackReplaySource {
    pub fn new(mut points: Vec<TrackPoint>) -> Self {
        points.sort_by_key(|p| p.at_ms());
        Self {
            points,
            cursor: 0,
            clock_ms: 0,
            supported: true,
            active: None,
            next_watch: 1,
            pending: Vec::new(),
            last_fix: None,
        }
    }

    /// A source on a device without geolocation
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn from_ron_str(s: &str) -> Result<Self, TrackLoadError> {
        let points: Vec<TrackPoint> = ron::from_str(s)?;
        Ok(Self::new(points))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TrackLoadError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Currently active subscription, if any
    pub fn active_watch(&self) -> Option<WatchId> {
        self.active
    }

    /// Number of points not yet replayed
    pub fn remaining(&self) -> usize {
        self.points.len() - self.cursor
    }

    /// Advance the virtual clock, emitting every point that became due
    pub fn advance(&mut self, elapsed_ms: u64) {
        self.clock_ms = self.clock_ms.saturating_add(elapsed_ms);
        while let Some(point) = self.points.get(self.cursor).copied() {
            if point.at_ms() > self.clock_ms {
                break;
            }
            self.cursor += 1;
            self.emit(point);
        }
    }

    /// Inject a fix immediately (keyboard nudges, tests)
    pub fn push_fix(&mut self, lat: f64, lon: f64) {
        self.emit(TrackPoint::Fix {
            at_ms: self.clock_ms,
            lat,
            lon,
        });
    }

    fn emit(&mut self, point: TrackPoint) {
        let result = match point {
            TrackPoint::Fix { at_ms, lat, lon } => {
                let fix = PositionFix {
                    lat,
                    lon,
                    accuracy_m: None,
                    timestamp_ms: at_ms,
                };
                self.last_fix = Some(fix);
                Ok(fix)
            }
            TrackPoint::Denied { .. } => Err(PositionError::PermissionDenied),
            TrackPoint::Timeout { .. } => Err(PositionError::Timeout),
        };

        if let Some(watch) = self.active {
            self.pending.push(PositionUpdate { watch, result });
        }
    }
}

impl PositionSource for TrackReplaySource {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn watch_position(&mut self, _options: &WatchOptions) -> Result<WatchId, PositionError> {
        if !self.supported {
            return Err(PositionError::MissingCapability);
        }
        let id = WatchId(self.next_watch);
        self.next_watch += 1;
        self.active = Some(id);
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        if self.active == Some(id) {
            self.active = None;
        }
    }

    fn current_position(&mut self, options: &WatchOptions) -> Result<PositionFix, PositionError> {
        if !self.supported {
            return Err(PositionError::MissingCapability);
        }
        match self.last_fix {
            Some(fix) if self.clock_ms.saturating_sub(fix.timestamp_ms) <= options.timeout_ms => Ok(fix),
            Some(_) => Err(PositionError::Timeout),
            None => Err(PositionError::Unavailable("no fix recorded yet".into())),
        }
    }

    fn poll_updates(&mut self) -> Vec<PositionUpdate> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track() {
        let src = TrackReplaySource::from_ron_str(
            "[Fix(at_ms: 100, lat: 1.0, lon: 2.0), Timeout(at_ms: 50), Denied(at_ms: 200)]",
        )
        .unwrap();
        assert_eq!(src.remaining(), 3);
        // Sorted by time
        assert_eq!(src.points[0], TrackPoint::Timeout { at_ms: 50 });
    }

    #[test]
    fn test_updates_only_while_watching() {
        let mut src = TrackReplaySource::new(vec![
            TrackPoint::Fix { at_ms: 10, lat: 1.0, lon: 1.0 },
            TrackPoint::Fix { at_ms: 20, lat: 2.0, lon: 2.0 },
        ]);

        src.advance(10);
        assert!(src.poll_updates().is_empty());

        let id = src.watch_position(&WatchOptions::default()).unwrap();
        src.advance(10);
        let updates = src.poll_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].watch, id);
        assert_eq!(updates[0].result.as_ref().unwrap().lat, 2.0);
    }

    #[test]
    fn test_current_position_uses_last_fix() {
        let mut src = TrackReplaySource::new(vec![TrackPoint::Fix { at_ms: 0, lat: 5.0, lon: 6.0 }]);
        let opts = WatchOptions::default();
        assert!(matches!(src.current_position(&opts), Err(PositionError::Unavailable(_))));
        src.advance(0);
        assert_eq!(src.current_position(&opts).unwrap().lon, 6.0);
        src.advance(opts.timeout_ms + 1);
        assert_eq!(src.current_position(&opts), Err(PositionError::Timeout));
    }

    #[test]
    fn test_unsupported_device() {
        let mut src = TrackReplaySource::unsupported();
        assert!(!src.is_supported());
        assert_eq!(
            src.watch_position(&WatchOptions::default()),
            Err(PositionError::MissingCapability)
        );
    }

    #[test]
    fn test_clear_watch_stops_new_updates() {
        let mut src = TrackReplaySource::new(Vec::new());
        let id = src.watch_position(&WatchOptions::default()).unwrap();
        src.clear_watch(id);
        src.push_fix(1.0, 1.0);
        assert!(src.poll_updates().is_empty());
        assert_eq!(src.active_watch(), None);
    }
}
