//! Mission Unlock Engine
//!
//! Everything that happens during one play session of a game:
//! - Model: read-only snapshot of the game and its missions
//! - Unlock: per-mission lock/answer state and completion detection
//! - Trigger: QR, geofence and AR checks that drive unlocks
//! - Watch: the continuous position subscription
//! - Session: the controller tying them to collaborator events
//! - Event: queues of unlocks, completions and notification requests

pub mod event;
pub mod model;
pub mod session;
pub mod trigger;
pub mod unlock;
pub mod watch;

pub use event::{
    EventQueue, GameCompleteEvent, Notification, NotificationAction, NotificationKind, SessionEvents, UnlockCause,
    UnlockEvent,
};
pub use model::{Game, GameMap, Geofence, GpsFields, Hint, Mission, MissionContent, MissionType, TriggerMethod};
pub use session::{ArRequest, Card, GameSession, PinView, PlayerRole, SessionError, SessionOptions, PIN_HIT_RADIUS};
pub use trigger::{ScanTarget, TriggerError, TriggerEvaluator, TriggerOutcome};
pub use unlock::{normalize_answer, AnswerOutcome, AnswerState, LockState, MissionProgress, MissionUnlockState, UnlockOutcome};
pub use watch::{GeolocationWatchSession, WatchControl, WatchState};
