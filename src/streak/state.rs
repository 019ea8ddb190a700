//! Streak state machine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Whether today's challenge is still open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyPhase {
    Fresh,
    Completed,
}

/// Persisted streak profile.
///
/// Invariants: `best_streak >= current_streak`; `daily_completed` only holds
/// for `last_checked_date`; `total_completions` never decreases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_played_date: Option<NaiveDate>,
    pub last_checked_date: Option<NaiveDate>,
    pub daily_completed: bool,
    pub total_completions: u32,
}

impl StreakState {
    /// Reset the completion flag the first time a new day is observed.
    ///
    /// Returns whether anything changed; a second call on the same day is a
    /// no-op. The streak counters are left alone.
    pub fn check_day_rollover(&mut self, today: NaiveDate) -> bool {
        if self.last_checked_date == Some(today) {
            return false;
        }
        self.daily_completed = false;
        self.last_checked_date = Some(today);
        true
    }

    pub fn phase(&self, today: NaiveDate) -> DailyPhase {
        if self.daily_completed && self.last_checked_date == Some(today) {
            DailyPhase::Completed
        } else {
            DailyPhase::Fresh
        }
    }

    /// Apply a daily completion, returning the next state.
    ///
    /// `self` is untouched, so a failed persist leaves no partial update.
    /// A correct answer after a gap restarts at 1; an incorrect answer
    /// always drops the streak to 0.
    pub fn complete_daily_challenge(&self, is_correct: bool, today: NaiveDate) -> Result<Self> {
        if self.daily_completed {
            return Err(Error::DuplicateCompletionAttempt { date: today });
        }

        let mut next = self.clone();
        next.current_streak = if !is_correct {
            0
        } else {
            match self.last_played_date {
                Some(last) if last.succ_opt() == Some(today) => self.current_streak + 1,
                // first play, same-day resubmit, gap, or clock moved backwards
                _ => 1,
            }
        };
        next.best_streak = self.best_streak.max(next.current_streak);
        next.daily_completed = true;
        next.last_checked_date = Some(today);
        next.total_completions = self.total_completions + 1;
        next.last_played_date = Some(today);
        Ok(next)
    }
}
