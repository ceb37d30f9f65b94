//! Game Session
//!
//! One play-through of one game. The session owns the fetched snapshot, the
//! unlock state, the position watch, the open scanner/AR viewer/card and the
//! outgoing event queues. Collaborator events (decoded QR payloads, AR hits,
//! position updates, taps) come in through methods here; each is handled to
//! completion and turned into state changes plus notification requests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::event::{GameCompleteEvent, Notification, NotificationAction, SessionEvents, UnlockCause, UnlockEvent};
use super::model::Game;
use super::trigger::{ScanTarget, TriggerError, TriggerEvaluator, TriggerOutcome};
use super::unlock::{AnswerOutcome, MissionProgress, MissionUnlockState};
use super::watch::GeolocationWatchSession;
use crate::config::DEFAULT_API_BASE;
use crate::geo::{PositionError, PositionSource, WatchOptions};
use crate::map::{Point, ViewportController};

/// Screen distance within which a tap selects a pin
pub const PIN_HIT_RADIUS: f64 = 18.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Trigger(#[from] TriggerError),
    #[error(transparent)]
    Position(#[from] PositionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayerRole {
    #[default]
    Player,
    /// Moderators may skip missions
    Mod,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Enables "Reset locks" and "Unlock all"
    pub test_mode: bool,
    pub role: PlayerRole,
    pub watch: WatchOptions,
    /// Base URL for AR descriptor downloads
    pub api_base: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            test_mode: false,
            role: PlayerRole::Player,
            watch: WatchOptions::default(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// Card shown over the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Card {
    Intro,
    Mission(usize),
}

/// What the AR viewer needs to look for one mission's target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArRequest {
    pub mission: usize,
    pub target_index: u32,
    pub mind_file_url: String,
}

/// A mission pin, positioned for the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct PinView {
    pub mission: usize,
    /// Screen position of the pin's anchor
    pub screen: Point,
    pub unlocked: bool,
    /// "Title" or "Title (locked)"
    pub label: String,
}

pub struct GameSession {
    game: Game,
    unlocks: MissionUnlockState,
    watch: GeolocationWatchSession,
    events: SessionEvents,
    scanner: Option<ScanTarget>,
    ar_viewer: Option<ArRequest>,
    card: Option<Card>,
    options: SessionOptions,
}

impl GameSession {
    pub fn new(game: Game, options: SessionOptions) -> Self {
        let card = if game.intro.trim().is_empty() {
            None
        } else {
            Some(Card::Intro)
        };
        tracing::info!(
            game = game.id.as_deref().unwrap_or("local"),
            missions = game.mission_count(),
            test_mode = options.test_mode,
            "session started"
        );
        Self {
            unlocks: MissionUnlockState::new(game.mission_count()),
            watch: GeolocationWatchSession::new(options.watch),
            events: SessionEvents::new(),
            scanner: None,
            ar_viewer: None,
            card,
            game,
            options,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn unlocks(&self) -> &MissionUnlockState {
        &self.unlocks
    }

    pub fn progress(&self, mission: usize) -> Option<&MissionProgress> {
        self.unlocks.progress(mission)
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut SessionEvents {
        &mut self.events
    }

    pub fn is_watching(&self) -> bool {
        self.watch.is_watching()
    }

    pub fn scanner(&self) -> Option<ScanTarget> {
        self.scanner
    }

    pub fn ar_viewer(&self) -> Option<&ArRequest> {
        self.ar_viewer.as_ref()
    }

    pub fn card(&self) -> Option<Card> {
        self.card
    }

    /// Pending notifications, oldest first
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.events.notifications.drain().collect()
    }

    // ========================================================================
    // QR
    // ========================================================================

    pub fn open_scanner(&mut self, target: ScanTarget) {
        self.scanner = Some(target);
    }

    pub fn close_scanner(&mut self) {
        self.scanner = None;
    }

    /// Handle a decoded payload from the QR detector. A match closes the
    /// scanner; a mismatch leaves it open for another try.
    pub fn on_qr_detected(&mut self, target: ScanTarget, payload: &str) -> Result<TriggerOutcome, SessionError> {
        let outcome = TriggerEvaluator::new(&self.game, &mut self.unlocks).check_scan(target, payload)?;
        match outcome {
            TriggerOutcome::Unlocked { .. } | TriggerOutcome::AlreadyUnlocked { .. } => self.close_scanner(),
            TriggerOutcome::QrMismatch { .. } => self.events.notifications.send(Notification::qr_mismatch()),
            TriggerOutcome::NoMatch => self.events.notifications.send(Notification::no_match()),
            TriggerOutcome::TooFar { .. } => {}
        }
        record_outcome(&mut self.events, &self.game, outcome, UnlockCause::Qr);
        Ok(outcome)
    }

    // ========================================================================
    // AR
    // ========================================================================

    /// Open the AR viewer for a mission and describe what it should track
    pub fn open_ar(&mut self, mission: usize) -> Result<&ArRequest, SessionError> {
        let m = self.game.mission(mission).ok_or(TriggerError::UnknownMission(mission))?;
        let target_index = m.ar_target();
        let game_id = self.game.id.as_deref().unwrap_or("local");
        let mind_file_url = format!(
            "{}/ar/mindfile/{}/{}",
            self.options.api_base.trim_end_matches('/'),
            game_id,
            target_index
        );
        tracing::debug!(mission, target_index, url = %mind_file_url, "opening AR viewer");
        Ok(self.ar_viewer.insert(ArRequest {
            mission,
            target_index,
            mind_file_url,
        }))
    }

    pub fn close_ar(&mut self) {
        self.ar_viewer = None;
    }

    /// The AR detector recognized the mission's target
    pub fn on_ar_target_found(&mut self, mission: usize) -> Result<TriggerOutcome, SessionError> {
        let outcome = TriggerEvaluator::new(&self.game, &mut self.unlocks).check_ar(mission)?;
        if self.ar_viewer.as_ref().map(|r| r.mission) == Some(mission) {
            self.close_ar();
        }
        record_outcome(&mut self.events, &self.game, outcome, UnlockCause::Ar);
        Ok(outcome)
    }

    // ========================================================================
    // GPS
    // ========================================================================

    /// "Detect my location": a single fix checked against one mission
    pub fn detect_location(
        &mut self,
        mission: usize,
        source: &mut dyn PositionSource,
    ) -> Result<TriggerOutcome, SessionError> {
        let m = self.game.mission(mission).ok_or(TriggerError::UnknownMission(mission))?;
        if m.geofence().is_none() {
            self.events.notifications.send(Notification::gps_missing());
            return Err(TriggerError::InvalidTriggerData { mission }.into());
        }

        let fix = match source.current_position(self.watch.options()) {
            Ok(fix) => fix,
            Err(e) => {
                self.notify_position_error(&e);
                return Err(e.into());
            }
        };

        let outcome =
            TriggerEvaluator::new(&self.game, &mut self.unlocks).check_geofence(mission, fix.lat, fix.lon)?;
        if let TriggerOutcome::TooFar { distance_m, .. } = outcome {
            self.events.notifications.send(Notification::too_far(distance_m));
        }
        record_outcome(&mut self.events, &self.game, outcome, UnlockCause::Gps);
        Ok(outcome)
    }

    pub fn start_watch(&mut self, source: &mut dyn PositionSource) -> Result<(), SessionError> {
        self.watch.start(source).map_err(|e| {
            self.notify_position_error(&e);
            SessionError::from(e)
        })
    }

    pub fn stop_watch(&mut self, source: &mut dyn PositionSource) {
        self.watch.stop(source);
    }

    /// Toolbar GPS button. Returns whether the watch is now running.
    pub fn toggle_watch(&mut self, source: &mut dyn PositionSource) -> Result<bool, SessionError> {
        if self.watch.is_watching() {
            self.stop_watch(source);
        } else {
            self.start_watch(source)?;
        }
        Ok(self.watch.is_watching())
    }

    /// Feed pending watch updates through every GPS mission's geofence.
    /// Out-of-range checks are silent; errors become notifications and
    /// leave the watch running. Returns the number of updates handled.
    pub fn pump_positions(&mut self, source: &mut dyn PositionSource) -> usize {
        let Self {
            game,
            unlocks,
            watch,
            events,
            ..
        } = self;

        watch.dispatch(source, |result, _control| match result {
            Ok(fix) => {
                let outcomes = TriggerEvaluator::new(game, unlocks).check_all_geofences(fix.lat, fix.lon);
                for outcome in outcomes {
                    record_outcome(events, game, outcome, UnlockCause::Gps);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "position watch error");
                events.notifications.send(position_notification(e));
            }
        })
    }

    fn notify_position_error(&mut self, e: &PositionError) {
        tracing::warn!(error = %e, "position request failed");
        self.events.notifications.send(position_notification(e));
    }

    // ========================================================================
    // Answers
    // ========================================================================

    pub fn submit_answer(&mut self, mission: usize, raw_input: &str) -> Result<AnswerOutcome, SessionError> {
        let m = self.game.mission(mission).ok_or(TriggerError::UnknownMission(mission))?;
        let outcome = self.unlocks.submit_answer(mission, raw_input, &m.content)?;
        match outcome {
            AnswerOutcome::Correct => {
                let n = Notification::answer_correct(&m.content.correct_message);
                self.events.notifications.send(n);
            }
            AnswerOutcome::Wrong => {
                let n = Notification::answer_wrong(&m.content.wrong_message);
                self.events.notifications.send(n);
            }
            AnswerOutcome::AlreadySolved => {}
        }
        Ok(outcome)
    }

    // ========================================================================
    // Test mode and moderator tools
    // ========================================================================

    /// Relock every mission and re-arm completion
    pub fn reset_locks(&mut self) -> Result<(), SessionError> {
        if !self.options.test_mode {
            return Err(TriggerError::NotPermitted.into());
        }
        self.unlocks.reset_all();
        Ok(())
    }

    pub fn unlock_all(&mut self) -> Result<(), SessionError> {
        if !self.options.test_mode {
            return Err(TriggerError::NotPermitted.into());
        }
        let mut completed = false;
        for index in 0..self.game.mission_count() {
            let outcome = self.unlocks.unlock(index)?;
            if outcome.newly_unlocked {
                self.events.unlocked.send(UnlockEvent {
                    mission: index,
                    cause: UnlockCause::TestMode,
                });
            }
            completed |= outcome.game_completed;
        }
        self.events.notifications.send(Notification::all_unlocked());
        if completed {
            fire_game_complete(&mut self.events, &self.game);
        }
        Ok(())
    }

    /// Moderator shortcut past a mission's trigger
    pub fn skip_mission(&mut self, mission: usize) -> Result<TriggerOutcome, SessionError> {
        if self.options.role != PlayerRole::Mod {
            return Err(TriggerError::NotPermitted.into());
        }
        let outcome = TriggerEvaluator::new(&self.game, &mut self.unlocks).check_ar(mission)?;
        record_outcome(&mut self.events, &self.game, outcome, UnlockCause::Skip);
        Ok(outcome)
    }

    // ========================================================================
    // Cards and pins
    // ========================================================================

    pub fn open_card(&mut self, card: Card) {
        self.card = Some(card);
    }

    pub fn close_card(&mut self) {
        self.card = None;
    }

    /// Run a notification's confirm action
    pub fn confirm(&mut self, action: NotificationAction) {
        match action {
            NotificationAction::Dismiss => {}
            NotificationAction::OpenMission(index) => {
                if self.game.mission(index).is_some() {
                    self.card = Some(Card::Mission(index));
                }
            }
        }
    }

    /// Pins for every mission with a map position, in mission order
    pub fn pin_views(&self, viewport: &ViewportController) -> Vec<PinView> {
        self.game
            .missions
            .iter()
            .filter_map(|m| {
                let pos = m.map_pos?;
                let unlocked = self.unlocks.is_unlocked(m.index);
                let title = m.display_title();
                let label = if unlocked { title } else { format!("{} (locked)", title) };
                Some(PinView {
                    mission: m.index,
                    screen: viewport.pin_screen(pos),
                    unlocked,
                    label,
                })
            })
            .collect()
    }

    /// Nearest pin within `PIN_HIT_RADIUS` of a screen point
    pub fn pin_at(&self, viewport: &ViewportController, x: f64, y: f64) -> Option<usize> {
        let tap = Point::new(x, y);
        self.pin_views(viewport)
            .into_iter()
            .map(|pin| (pin.mission, pin.screen.distance_to(tap)))
            .filter(|(_, d)| *d <= PIN_HIT_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(mission, _)| mission)
    }

    /// Tap on the map: open the card of the pin under the finger
    pub fn tap_map(&mut self, viewport: &ViewportController, x: f64, y: f64) -> Option<usize> {
        let hit = self.pin_at(viewport, x, y)?;
        self.card = Some(Card::Mission(hit));
        Some(hit)
    }
}

/// Turn a fresh unlock into events and notifications; anything else is ignored
fn record_outcome(events: &mut SessionEvents, game: &Game, outcome: TriggerOutcome, cause: UnlockCause) {
    if let TriggerOutcome::Unlocked {
        mission,
        game_completed,
    } = outcome
    {
        events.unlocked.send(UnlockEvent { mission, cause });
        events.notifications.send(Notification::unlocked(mission, cause));
        if game_completed {
            fire_game_complete(events, game);
        }
    }
}

fn fire_game_complete(events: &mut SessionEvents, game: &Game) {
    events.game_complete.send(GameCompleteEvent {
        mission_count: game.mission_count(),
    });
    events.notifications.send(Notification::game_complete(&game.final_message));
}

fn position_notification(e: &PositionError) -> Notification {
    if e.is_missing_capability() {
        Notification::missing_capability()
    } else {
        Notification::location_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::event::NotificationKind;
    use crate::game::model::{GpsFields, Mission, MissionContent, TriggerMethod};
    use crate::geo::TrackReplaySource;
    use crate::map::{MapPos, Rect, Size};

    fn mission(index: usize) -> Mission {
        Mission {
            index,
            qr_code: format!("QR{}", index),
            ..Default::default()
        }
    }

    fn gps(index: usize) -> Mission {
        Mission {
            index,
            trigger_method: TriggerMethod::Gps,
            gps: Some(GpsFields {
                lat: Some(10.0),
                lon: Some(10.0),
                radius_m: Some(50.0),
            }),
            ..Default::default()
        }
    }

    fn session(missions: Vec<Mission>) -> GameSession {
        let game = Game {
            id: Some("g1".into()),
            missions,
            final_message: "Well done".into(),
            ..Default::default()
        };
        GameSession::new(game, SessionOptions::default())
    }

    fn kinds(s: &mut GameSession) -> Vec<NotificationKind> {
        s.drain_notifications().into_iter().map(|n| n.kind).collect()
    }

    #[test]
    fn test_intro_card_only_with_intro() {
        let s = session(vec![]);
        assert_eq!(s.card(), None);
        let game = Game {
            intro: "Welcome".into(),
            ..Default::default()
        };
        let s = GameSession::new(game, SessionOptions::default());
        assert_eq!(s.card(), Some(Card::Intro));
    }

    #[test]
    fn test_qr_match_closes_scanner() {
        let mut s = session(vec![mission(0), mission(1)]);
        s.open_scanner(ScanTarget::Mission(0));

        s.on_qr_detected(ScanTarget::Mission(0), "nope").unwrap();
        assert_eq!(s.scanner(), Some(ScanTarget::Mission(0)));
        assert_eq!(kinds(&mut s), vec![NotificationKind::QrMismatch]);

        s.on_qr_detected(ScanTarget::Mission(0), "QR0").unwrap();
        assert_eq!(s.scanner(), None);
        let notes = s.drain_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].confirm_label, "Open");
        s.confirm(notes[0].on_confirm);
        assert_eq!(s.card(), Some(Card::Mission(0)));
    }

    #[test]
    fn test_global_scan_no_match() {
        let mut s = session(vec![mission(0)]);
        let outcome = s.on_qr_detected(ScanTarget::Global, "zzz").unwrap();
        assert_eq!(outcome, TriggerOutcome::NoMatch);
        assert_eq!(kinds(&mut s), vec![NotificationKind::NoMatch]);
        assert!(!s.unlocks().is_unlocked(0));
    }

    #[test]
    fn test_unlock_notifies_once() {
        let mut s = session(vec![mission(0), mission(1)]);
        s.on_qr_detected(ScanTarget::Global, "QR0").unwrap();
        s.on_qr_detected(ScanTarget::Global, "QR0").unwrap();
        s.on_ar_target_found(0).unwrap();
        assert_eq!(kinds(&mut s), vec![NotificationKind::Unlocked]);
        assert_eq!(s.events().unlocked.len(), 1);
    }

    #[test]
    fn test_ar_request_url() {
        let mut s = session(vec![mission(0), Mission {
            index: 1,
            ar_target_index: Some(4),
            ..Default::default()
        }]);
        let req = s.open_ar(0).unwrap().clone();
        assert_eq!(req.target_index, 0);
        assert_eq!(req.mind_file_url, format!("{}/ar/mindfile/g1/0", DEFAULT_API_BASE));

        let req = s.open_ar(1).unwrap().clone();
        assert_eq!(req.target_index, 4);
        assert!(req.mind_file_url.ends_with("/ar/mindfile/g1/4"));

        s.on_ar_target_found(1).unwrap();
        assert!(s.ar_viewer().is_none());
        assert!(s.unlocks().is_unlocked(1));
    }

    #[test]
    fn test_detect_location_too_far() {
        let mut s = session(vec![gps(0)]);
        let mut src = TrackReplaySource::new(vec![]);
        src.push_fix(10.00054, 10.0);

        let outcome = s.detect_location(0, &mut src).unwrap();
        assert!(matches!(outcome, TriggerOutcome::TooFar { mission: 0, .. }));
        let notes = s.drain_notifications();
        assert_eq!(notes[0].kind, NotificationKind::TooFar);
        assert!(notes[0].message.starts_with("You are 6"));
    }

    #[test]
    fn test_detect_location_errors() {
        let mut s = session(vec![gps(0), mission(1)]);

        let mut src = TrackReplaySource::new(vec![]);
        assert!(s.detect_location(0, &mut src).is_err());
        assert_eq!(kinds(&mut s), vec![NotificationKind::LocationError]);

        assert_eq!(
            s.detect_location(1, &mut src),
            Err(SessionError::Trigger(TriggerError::InvalidTriggerData { mission: 1 }))
        );
        assert_eq!(kinds(&mut s), vec![NotificationKind::GpsMissing]);

        let mut none = TrackReplaySource::unsupported();
        assert_eq!(
            s.detect_location(0, &mut none),
            Err(SessionError::Position(PositionError::MissingCapability))
        );
        assert_eq!(kinds(&mut s), vec![NotificationKind::MissingCapability]);
    }

    #[test]
    fn test_watch_toggle_without_capability() {
        let mut s = session(vec![gps(0)]);
        let mut none = TrackReplaySource::unsupported();
        assert!(s.toggle_watch(&mut none).is_err());
        assert!(!s.is_watching());
        assert_eq!(kinds(&mut s), vec![NotificationKind::MissingCapability]);
    }

    #[test]
    fn test_watch_errors_keep_watching() {
        let mut s = session(vec![gps(0)]);
        let mut src = TrackReplaySource::new(vec![crate::geo::TrackPoint::Timeout { at_ms: 5 }]);
        assert!(s.toggle_watch(&mut src).unwrap());
        src.advance(10);
        assert_eq!(s.pump_positions(&mut src), 1);
        assert!(s.is_watching());
        assert_eq!(kinds(&mut s), vec![NotificationKind::LocationError]);
    }

    #[test]
    fn test_answers() {
        let mut m = mission(0);
        m.content = MissionContent {
            correct_answer: "Blue".into(),
            ..Default::default()
        };
        let mut s = session(vec![m]);
        assert!(s.submit_answer(0, "blue").is_err());

        s.on_qr_detected(ScanTarget::Global, "QR0").unwrap();
        s.drain_notifications();

        assert_eq!(s.submit_answer(0, "red").unwrap(), AnswerOutcome::Wrong);
        assert_eq!(s.submit_answer(0, " BLUE ").unwrap(), AnswerOutcome::Correct);
        let notes = s.drain_notifications();
        assert_eq!(notes[0].message, "That answer is not correct yet.");
        assert_eq!(notes[1].message, "Nice work!");
    }

    #[test]
    fn test_test_mode_tools() {
        let mut s = session(vec![mission(0), mission(1)]);
        assert_eq!(s.unlock_all(), Err(SessionError::Trigger(TriggerError::NotPermitted)));
        assert_eq!(s.reset_locks(), Err(SessionError::Trigger(TriggerError::NotPermitted)));

        let game = s.game().clone();
        let mut s = GameSession::new(
            game,
            SessionOptions {
                test_mode: true,
                ..Default::default()
            },
        );
        s.unlock_all().unwrap();
        assert_eq!(s.unlocks().unlocked_count(), 2);
        assert_eq!(
            kinds(&mut s),
            vec![NotificationKind::AllUnlocked, NotificationKind::GameComplete]
        );
        assert_eq!(s.events().game_complete.len(), 1);

        s.reset_locks().unwrap();
        assert_eq!(s.unlocks().unlocked_count(), 0);
        s.on_qr_detected(ScanTarget::Global, "QR0").unwrap();
        s.on_qr_detected(ScanTarget::Global, "QR1").unwrap();
        assert_eq!(s.events().game_complete.len(), 2);
    }

    #[test]
    fn test_mod_skip() {
        let mut s = session(vec![mission(0)]);
        assert!(s.skip_mission(0).is_err());

        let game = s.game().clone();
        let mut s = GameSession::new(
            game,
            SessionOptions {
                role: PlayerRole::Mod,
                ..Default::default()
            },
        );
        assert!(s.skip_mission(0).unwrap().is_unlock());
        assert_eq!(s.events().unlocked.iter().next().map(|e| e.cause), Some(UnlockCause::Skip));
    }

    #[test]
    fn test_pins_and_tap() {
        let mut a = mission(0);
        a.title = "Fountain".into();
        a.map_pos = Some(MapPos::Normalized { x: 0.5, y: 0.5 });
        let mut b = mission(1);
        b.map_pos = Some(MapPos::Normalized { x: 0.25, y: 0.25 });
        let c = mission(2);
        let mut s = session(vec![a, b, c]);

        let mut vp = ViewportController::new(Rect::new(0.0, 0.0, 800.0, 600.0));
        vp.load_image(Size::new(1600.0, 1200.0));

        let pins = s.pin_views(&vp);
        assert_eq!(pins.len(), 2);
        assert_eq!(pins[0].label, "Fountain (locked)");
        assert_eq!(pins[1].label, "Mission 2 (locked)");
        assert!((pins[0].screen.x - 400.0).abs() < 1e-9);
        assert!((pins[0].screen.y - 300.0).abs() < 1e-9);

        assert_eq!(s.tap_map(&vp, 405.0, 296.0), Some(0));
        assert_eq!(s.card(), Some(Card::Mission(0)));
        assert_eq!(s.tap_map(&vp, 600.0, 100.0), None);
    }
}
