//! Mission Unlock State
//!
//! Authoritative per-mission progress for one play session:
//!
//! ```text
//! Locked --(any successful trigger)--> Unlocked            (terminal)
//!                                       |
//!                     answerable: Unanswered --(correct)--> AnsweredCorrectly (terminal)
//! ```
//!
//! Wrong answers only replace the transient result message. Nothing here is
//! persisted; the state dies with the session.

use super::model::MissionContent;
use super::trigger::TriggerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockState {
    #[default]
    Locked,
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerState {
    #[default]
    Unanswered,
    AnsweredCorrectly,
}

/// Progress of a single mission
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MissionProgress {
    pub lock: LockState,
    pub answer: AnswerState,
    /// Last submitted input, as typed
    pub submitted_answer: String,
    /// Feedback for the last submission
    pub result_message: Option<String>,
}

impl MissionProgress {
    pub fn is_unlocked(&self) -> bool {
        self.lock == LockState::Unlocked
    }

    pub fn is_solved(&self) -> bool {
        self.answer == AnswerState::AnsweredCorrectly
    }
}

/// Result of `unlock`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockOutcome {
    /// This call moved the mission from Locked to Unlocked
    pub newly_unlocked: bool,
    /// This call unlocked the last locked mission (reported once)
    pub game_completed: bool,
}

/// Result of `submit_answer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Wrong,
    /// Already solved; nothing changed
    AlreadySolved,
}

/// Trim and lowercase, so "  Paris " matches "paris"
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, Default)]
pub struct MissionUnlockState {
    progress: Vec<MissionProgress>,
    unlocked_count: usize,
    completion_fired: bool,
}

impl MissionUnlockState {
    /// All missions locked
    pub fn new(mission_count: usize) -> Self {
        Self {
            progress: vec![MissionProgress::default(); mission_count],
            unlocked_count: 0,
            completion_fired: false,
        }
    }

    pub fn len(&self) -> usize {
        self.progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progress.is_empty()
    }

    pub fn progress(&self, index: usize) -> Option<&MissionProgress> {
        self.progress.get(index)
    }

    pub fn is_unlocked(&self, index: usize) -> bool {
        self.progress(index).map(|p| p.is_unlocked()).unwrap_or(false)
    }

    pub fn is_solved(&self, index: usize) -> bool {
        self.progress(index).map(|p| p.is_solved()).unwrap_or(false)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked_count
    }

    /// Every mission unlocked (never true for an empty game)
    pub fn is_complete(&self) -> bool {
        !self.progress.is_empty() && self.unlocked_count == self.progress.len()
    }

    /// Whether the completion event has been reported
    pub fn completion_fired(&self) -> bool {
        self.completion_fired
    }

    /// Unlock a mission. Idempotent: only the first call for a mission
    /// reports `newly_unlocked`, and only the call that completes the game
    /// reports `game_completed`.
    pub fn unlock(&mut self, index: usize) -> Result<UnlockOutcome, TriggerError> {
        let progress = self
            .progress
            .get_mut(index)
            .ok_or(TriggerError::UnknownMission(index))?;

        if progress.is_unlocked() {
            return Ok(UnlockOutcome {
                newly_unlocked: false,
                game_completed: false,
            });
        }

        progress.lock = LockState::Unlocked;
        self.unlocked_count += 1;
        tracing::debug!(mission = index, unlocked = self.unlocked_count, "mission unlocked");

        let game_completed = self.is_complete() && !self.completion_fired;
        if game_completed {
            self.completion_fired = true;
            tracing::info!(missions = self.progress.len(), "game complete");
        }

        Ok(UnlockOutcome {
            newly_unlocked: true,
            game_completed,
        })
    }

    /// Check an answer against the mission's correct answer.
    ///
    /// Both sides are trimmed and lowercased; an empty correct answer never
    /// matches. The result message is set to the mission's correct/wrong
    /// message either way.
    pub fn submit_answer(
        &mut self,
        index: usize,
        raw_input: &str,
        content: &MissionContent,
    ) -> Result<AnswerOutcome, TriggerError> {
        let progress = self
            .progress
            .get_mut(index)
            .ok_or(TriggerError::UnknownMission(index))?;

        if !progress.is_unlocked() {
            return Err(TriggerError::MissionLocked(index));
        }
        if progress.is_solved() {
            return Ok(AnswerOutcome::AlreadySolved);
        }

        let input = normalize_answer(raw_input);
        let correct = normalize_answer(&content.correct_answer);
        let is_correct = !correct.is_empty() && input == correct;

        progress.submitted_answer = raw_input.to_string();
        if is_correct {
            progress.answer = AnswerState::AnsweredCorrectly;
            progress.result_message = Some(content.correct_message.clone());
            Ok(AnswerOutcome::Correct)
        } else {
            progress.result_message = Some(content.wrong_message.clone());
            Ok(AnswerOutcome::Wrong)
        }
    }

    /// Relock everything and re-arm completion. Test/debug only.
    pub fn reset_all(&mut self) {
        let count = self.progress.len();
        *self = Self::new(count);
        tracing::debug!("all missions relocked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(correct: &str) -> MissionContent {
        MissionContent {
            correct_answer: correct.into(),
            correct_message: "Yes!".into(),
            wrong_message: "No.".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let mut s = MissionUnlockState::new(2);
        let first = s.unlock(0).unwrap();
        assert!(first.newly_unlocked);
        for _ in 0..5 {
            let again = s.unlock(0).unwrap();
            assert!(!again.newly_unlocked);
            assert!(!again.game_completed);
        }
        assert_eq!(s.unlocked_count(), 1);
        assert!(s.is_unlocked(0));
        assert!(!s.is_unlocked(1));
    }

    #[test]
    fn test_completion_fires_once() {
        let mut s = MissionUnlockState::new(3);
        assert!(!s.unlock(0).unwrap().game_completed);
        assert!(!s.unlock(2).unwrap().game_completed);
        assert!(s.unlock(1).unwrap().game_completed);
        assert!(s.completion_fired());
        for i in 0..3 {
            assert!(!s.unlock(i).unwrap().game_completed);
        }
    }

    #[test]
    fn test_empty_game_never_complete() {
        let s = MissionUnlockState::new(0);
        assert!(!s.is_complete());
    }

    #[test]
    fn test_unknown_mission() {
        let mut s = MissionUnlockState::new(1);
        assert_eq!(s.unlock(3), Err(TriggerError::UnknownMission(3)));
    }

    #[test]
    fn test_answer_normalized() {
        let mut s = MissionUnlockState::new(1);
        s.unlock(0).unwrap();
        let c = content("  Paris ");
        assert_eq!(s.submit_answer(0, "pARIS  ", &c).unwrap(), AnswerOutcome::Correct);
        assert!(s.is_solved(0));
        assert_eq!(s.progress(0).unwrap().result_message.as_deref(), Some("Yes!"));
        // Solved stays solved
        assert_eq!(s.submit_answer(0, "London", &c).unwrap(), AnswerOutcome::AlreadySolved);
        assert!(s.is_solved(0));
    }

    #[test]
    fn test_wrong_answer_only_sets_message() {
        let mut s = MissionUnlockState::new(1);
        s.unlock(0).unwrap();
        let c = content("paris");
        assert_eq!(s.submit_answer(0, "rome", &c).unwrap(), AnswerOutcome::Wrong);
        let p = s.progress(0).unwrap();
        assert_eq!(p.answer, AnswerState::Unanswered);
        assert_eq!(p.submitted_answer, "rome");
        assert_eq!(p.result_message.as_deref(), Some("No."));
    }

    #[test]
    fn test_empty_correct_answer_never_matches() {
        let mut s = MissionUnlockState::new(1);
        s.unlock(0).unwrap();
        let c = content("   ");
        assert_eq!(s.submit_answer(0, "", &c).unwrap(), AnswerOutcome::Wrong);
        assert_eq!(s.submit_answer(0, "   ", &c).unwrap(), AnswerOutcome::Wrong);
    }

    #[test]
    fn test_locked_mission_cannot_be_answered() {
        let mut s = MissionUnlockState::new(1);
        assert_eq!(
            s.submit_answer(0, "x", &content("x")),
            Err(TriggerError::MissionLocked(0))
        );
    }

    #[test]
    fn test_reset_all_rearms_completion() {
        let mut s = MissionUnlockState::new(1);
        assert!(s.unlock(0).unwrap().game_completed);
        s.reset_all();
        assert!(!s.is_unlocked(0));
        assert!(!s.completion_fired());
        assert!(s.unlock(0).unwrap().game_completed);
    }
}
