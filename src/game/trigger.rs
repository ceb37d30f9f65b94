//! Trigger Evaluation
//!
//! The three ways a mission unlocks: a QR payload matching exactly, the
//! player standing inside a geofence, or an AR detector reporting its
//! target. Every check funnels into `MissionUnlockState::unlock`; checks on
//! a mission that is already unlocked are no-ops reported as
//! `AlreadyUnlocked`.

use thiserror::Error;

use super::model::Game;
use super::unlock::MissionUnlockState;

/// Local, recoverable failures of a trigger check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    #[error("mission {0} does not exist")]
    UnknownMission(usize),
    #[error("mission {mission} has incomplete gps data")]
    InvalidTriggerData { mission: usize },
    #[error("mission {0} is still locked")]
    MissionLocked(usize),
    #[error("operation not permitted in this session")]
    NotPermitted,
}

/// What a QR scan is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanTarget {
    /// Scanner opened from a mission card
    Mission(usize),
    /// Scanner opened from the toolbar; any mission may match
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Unlocked { mission: usize, game_completed: bool },
    AlreadyUnlocked { mission: usize },
    /// Targeted scan decoded some other payload
    QrMismatch { mission: usize },
    /// Global scan matched nothing
    NoMatch,
    /// Outside the geofence, distance rounded to whole meters
    TooFar { mission: usize, distance_m: u64 },
}

impl TriggerOutcome {
    pub fn is_unlock(&self) -> bool {
        matches!(self, TriggerOutcome::Unlocked { .. })
    }

    pub fn game_completed(&self) -> bool {
        matches!(
            self,
            TriggerOutcome::Unlocked {
                game_completed: true,
                ..
            }
        )
    }
}

/// Runs trigger checks of one game against its unlock state
pub struct TriggerEvaluator<'a> {
    game: &'a Game,
    unlocks: &'a mut MissionUnlockState,
}

impl<'a> TriggerEvaluator<'a> {
    pub fn new(game: &'a Game, unlocks: &'a mut MissionUnlockState) -> Self {
        Self { game, unlocks }
    }

    /// Resolve the mission and short-circuit if it is already unlocked
    fn locked_mission(&self, index: usize) -> Result<Option<TriggerOutcome>, TriggerError> {
        if self.game.mission(index).is_none() {
            return Err(TriggerError::UnknownMission(index));
        }
        if self.unlocks.is_unlocked(index) {
            return Ok(Some(TriggerOutcome::AlreadyUnlocked { mission: index }));
        }
        Ok(None)
    }

    fn unlock(&mut self, index: usize) -> Result<TriggerOutcome, TriggerError> {
        let outcome = self.unlocks.unlock(index)?;
        if outcome.newly_unlocked {
            Ok(TriggerOutcome::Unlocked {
                mission: index,
                game_completed: outcome.game_completed,
            })
        } else {
            Ok(TriggerOutcome::AlreadyUnlocked { mission: index })
        }
    }

    /// Exact string equality against the mission's code; no trimming or
    /// case folding.
    pub fn check_qr(&mut self, index: usize, payload: &str) -> Result<TriggerOutcome, TriggerError> {
        if let Some(done) = self.locked_mission(index)? {
            return Ok(done);
        }
        let mission = self
            .game
            .mission(index)
            .ok_or(TriggerError::UnknownMission(index))?;

        if payload == mission.qr_code {
            self.unlock(index)
        } else {
            tracing::debug!(mission = index, "qr payload mismatch");
            Ok(TriggerOutcome::QrMismatch { mission: index })
        }
    }

    /// Unlock the first mission whose code equals the payload
    pub fn scan_global(&mut self, payload: &str) -> Result<TriggerOutcome, TriggerError> {
        match self.game.find_by_qr(payload) {
            Some(index) => self.check_qr(index, payload),
            None => {
                tracing::debug!("global scan matched no mission");
                Ok(TriggerOutcome::NoMatch)
            }
        }
    }

    pub fn check_scan(&mut self, target: ScanTarget, payload: &str) -> Result<TriggerOutcome, TriggerError> {
        match target {
            ScanTarget::Mission(index) => self.check_qr(index, payload),
            ScanTarget::Global => self.scan_global(payload),
        }
    }

    /// Unlock iff the position lies within the mission's radius (inclusive)
    pub fn check_geofence(&mut self, index: usize, lat: f64, lon: f64) -> Result<TriggerOutcome, TriggerError> {
        if let Some(done) = self.locked_mission(index)? {
            return Ok(done);
        }
        let fence = self
            .game
            .mission(index)
            .and_then(|m| m.geofence())
            .ok_or(TriggerError::InvalidTriggerData { mission: index })?;

        let distance = fence.distance_from(lat, lon);
        if distance <= fence.radius_m {
            self.unlock(index)
        } else {
            let distance_m = distance.round() as u64;
            tracing::trace!(mission = index, distance_m, radius = fence.radius_m, "outside geofence");
            Ok(TriggerOutcome::TooFar {
                mission: index,
                distance_m,
            })
        }
    }

    /// The detector already recognized the target; just unlock
    pub fn check_ar(&mut self, index: usize) -> Result<TriggerOutcome, TriggerError> {
        if let Some(done) = self.locked_mission(index)? {
            return Ok(done);
        }
        self.unlock(index)
    }

    /// Check every GPS-triggered mission against one position update.
    /// Missions with incomplete gps data are skipped.
    pub fn check_all_geofences(&mut self, lat: f64, lon: f64) -> Vec<TriggerOutcome> {
        let game = self.game;
        let mut outcomes = Vec::new();
        for mission in game.gps_missions() {
            match self.check_geofence(mission.index, lat, lon) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::trace!(mission = mission.index, error = %e, "skipping geofence"),
            }
        }
        outcomes
    }
}
