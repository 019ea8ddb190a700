//! Per-player play statistics

use serde::{Deserialize, Serialize};

/// Mirror of the remote `user_stats` row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_plays: u32,
    pub correct_answers: u32,
    pub best_streak: u32,
}

impl PlayerStats {
    /// Fold one answered question into the counters
    pub fn record_play(&self, correct: bool, streak: u32) -> Self {
        Self {
            total_plays: self.total_plays + 1,
            correct_answers: self.correct_answers + u32::from(correct),
            best_streak: self.best_streak.max(streak),
        }
    }

    /// Apply the plays counted since `baseline` on top of `onto`.
    ///
    /// Used when counters written offline meet a remote row that may have
    /// moved on in the meantime. Best streak takes the larger of the two.
    pub fn rebase(&self, baseline: &Self, onto: &Self) -> Self {
        Self {
            total_plays: onto.total_plays + self.total_plays.saturating_sub(baseline.total_plays),
            correct_answers: onto.correct_answers
                + self.correct_answers.saturating_sub(baseline.correct_answers),
            best_streak: onto.best_streak.max(self.best_streak),
        }
    }

    /// Rounded percentage of correct answers, 0 when nothing was played
    pub fn accuracy_percent(&self) -> u32 {
        if self.total_plays == 0 {
            return 0;
        }
        (self.correct_answers as f64 / self.total_plays as f64 * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebase_replays_offline_plays() {
        let baseline = PlayerStats {
            total_plays: 4,
            correct_answers: 3,
            best_streak: 2,
        };
        let offline = baseline.record_play(true, 5).record_play(false, 0);
        let moved_on = PlayerStats {
            total_plays: 6,
            correct_answers: 4,
            best_streak: 3,
        };
        assert_eq!(
            offline.rebase(&baseline, &moved_on),
            PlayerStats {
                total_plays: 8,
                correct_answers: 5,
                best_streak: 5,
            }
        );
        assert_eq!(baseline.rebase(&baseline, &moved_on), moved_on);
    }

    #[test]
    fn test_accuracy_rounding() {
        let stats = PlayerStats {
            total_plays: 3,
            correct_answers: 2,
            best_streak: 2,
        };
        assert_eq!(stats.accuracy_percent(), 67);
        assert_eq!(PlayerStats::default().accuracy_percent(), 0);
    }

    #[test]
    fn test_record_play_keeps_best() {
        let stats = PlayerStats {
            total_plays: 10,
            correct_answers: 7,
            best_streak: 5,
        };
        let next = stats.record_play(false, 0);
        assert_eq!(next.total_plays, 11);
        assert_eq!(next.correct_answers, 7);
        assert_eq!(next.best_streak, 5);
    }
}
