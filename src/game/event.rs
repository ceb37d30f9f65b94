//! Event System
//!
//! The session never calls into the UI. Instead it queues events that the
//! player drains once per frame:
//! 1. A trigger unlocks a mission -> `UnlockEvent` + "Congrats!" notification
//! 2. The last mission unlocks -> `GameCompleteEvent` + final notification
//! 3. A check fails (too far, wrong QR, no GPS) -> notification only
//!
//! Notifications are abstract dialog requests; how they look is up to the
//! front-end.

/// A queue for events of a single type.
/// Events are collected while handling input and drained by the front-end.
#[derive(Debug)]
pub struct EventQueue<T> {
    events: Vec<T>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Send an event (add to queue)
    pub fn send(&mut self, event: T) {
        self.events.push(event);
    }

    /// Iterate over events without clearing
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.events.iter()
    }

    /// Drain all events (returns iterator and clears queue)
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.events.drain(..)
    }

    /// Check if there are any events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Clear all events without processing
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Number of events in queue
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Container for all session events.
pub struct SessionEvents {
    /// Dialog requests for the front-end
    pub notifications: EventQueue<Notification>,

    /// Mission went from locked to unlocked
    pub unlocked: EventQueue<UnlockEvent>,

    /// Every mission is unlocked (sent once per session)
    pub game_complete: EventQueue<GameCompleteEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self {
            notifications: EventQueue::new(),
            unlocked: EventQueue::new(),
            game_complete: EventQueue::new(),
        }
    }

    /// Clear all event queues
    pub fn clear_all(&mut self) {
        self.notifications.clear();
        self.unlocked.clear();
        self.game_complete.clear();
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Event Types
// =============================================================================

/// What caused an unlock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockCause {
    Qr,
    Gps,
    Ar,
    /// Moderator skipped the mission
    Skip,
    /// Test mode "unlock all"
    TestMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockEvent {
    pub mission: usize,
    pub cause: UnlockCause,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameCompleteEvent {
    pub mission_count: usize,
}

/// What a notification is about (lets front-ends style them)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Unlocked,
    QrMismatch,
    NoMatch,
    TooFar,
    GpsMissing,
    LocationError,
    MissingCapability,
    AnswerCorrect,
    AnswerWrong,
    AllUnlocked,
    GameComplete,
}

/// What confirming a notification does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Dismiss,
    /// Close the dialog and open this mission's card
    OpenMission(usize),
}

/// Dialog request
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub on_confirm: NotificationAction,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            confirm_label: "OK".into(),
            on_confirm: NotificationAction::Dismiss,
        }
    }

    pub fn with_confirm(mut self, label: impl Into<String>, action: NotificationAction) -> Self {
        self.confirm_label = label.into();
        self.on_confirm = action;
        self
    }

    /// "Congrats!" with an Open button leading to the mission card
    pub fn unlocked(mission: usize, cause: UnlockCause) -> Self {
        let message = match cause {
            UnlockCause::Qr => "QR matched. You unlocked this mission.",
            UnlockCause::Gps => "Location confirmed! You've unlocked this mission.",
            UnlockCause::Ar => "You found the AR target.",
            UnlockCause::Skip | UnlockCause::TestMode => "Mission unlocked.",
        };
        Self::new(NotificationKind::Unlocked, "Congrats!", message)
            .with_confirm("Open", NotificationAction::OpenMission(mission))
    }

    pub fn qr_mismatch() -> Self {
        Self::new(
            NotificationKind::QrMismatch,
            "Oops",
            "That QR doesn't match this step. Try again.",
        )
    }

    pub fn no_match() -> Self {
        Self::new(NotificationKind::NoMatch, "No match", "No mission matches this QR code.")
    }

    pub fn too_far(distance_m: u64) -> Self {
        Self::new(
            NotificationKind::TooFar,
            "Too far",
            format!("You are {}m from the target. Move closer and try again.", distance_m),
        )
    }

    pub fn gps_missing() -> Self {
        Self::new(
            NotificationKind::GpsMissing,
            "GPS missing",
            "No valid GPS data for this mission.",
        )
    }

    pub fn location_error() -> Self {
        Self::new(
            NotificationKind::LocationError,
            "Geolocation",
            "Unable to retrieve your location.",
        )
    }

    pub fn missing_capability() -> Self {
        Self::new(
            NotificationKind::MissingCapability,
            "Geolocation",
            "Geolocation is not supported on this device.",
        )
    }

    pub fn answer_correct(message: &str) -> Self {
        let message = if message.is_empty() { "Nice work!" } else { message };
        Self::new(NotificationKind::AnswerCorrect, "Correct!", message).with_confirm("Close", NotificationAction::Dismiss)
    }

    pub fn answer_wrong(message: &str) -> Self {
        let message = if message.is_empty() {
            "That answer is not correct yet."
        } else {
            message
        };
        Self::new(NotificationKind::AnswerWrong, "Try again", message).with_confirm("Close", NotificationAction::Dismiss)
    }

    pub fn all_unlocked() -> Self {
        Self::new(
            NotificationKind::AllUnlocked,
            "All unlocked",
            "All missions unlocked for testing.",
        )
    }

    pub fn game_complete(final_message: &str) -> Self {
        let message = if final_message.trim().is_empty() {
            "You've completed the game. Thanks for playing!"
        } else {
            final_message
        };
        Self::new(NotificationKind::GameComplete, "You did it!", message)
            .with_confirm("Finish", NotificationAction::Dismiss)
    }
}
