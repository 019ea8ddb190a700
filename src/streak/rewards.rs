//! Milestone classification for a finished daily challenge

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakMilestone {
    /// Wrong answer, streak back to zero
    Reset,
    FirstDay,
    Weekly(u32),
    Monthly(u32),
    Ongoing(u32),
}

impl StreakMilestone {
    /// Classify a completion. Weekly is checked before monthly, so a streak
    /// divisible by both (e.g. 210) counts as weekly.
    pub fn for_completion(is_correct: bool, streak: u32) -> Self {
        if !is_correct {
            return Self::Reset;
        }
        match streak {
            1 => Self::FirstDay,
            n if n % 7 == 0 => Self::Weekly(n),
            n if n % 30 == 0 => Self::Monthly(n),
            n => Self::Ongoing(n),
        }
    }
}

impl fmt::Display for StreakMilestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reset => write!(f, "Wrong answer - streak reset to 0. Try again tomorrow!"),
            Self::FirstDay => write!(f, "First day of your streak!"),
            Self::Weekly(n) => write!(f, "{n} days in a row! Weekly reward unlocked!"),
            Self::Monthly(n) => write!(f, "{n} days in a row! Epic monthly reward!"),
            Self::Ongoing(n) => write!(f, "{n}-day streak!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestone_order() {
        assert_eq!(StreakMilestone::for_completion(false, 0), StreakMilestone::Reset);
        assert_eq!(StreakMilestone::for_completion(true, 1), StreakMilestone::FirstDay);
        assert_eq!(StreakMilestone::for_completion(true, 14), StreakMilestone::Weekly(14));
        assert_eq!(StreakMilestone::for_completion(true, 30), StreakMilestone::Monthly(30));
        assert_eq!(StreakMilestone::for_completion(true, 210), StreakMilestone::Weekly(210));
        assert_eq!(StreakMilestone::for_completion(true, 5), StreakMilestone::Ongoing(5));
    }
}
