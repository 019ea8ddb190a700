//! Daily streak tracking
//!
//! A streak counts consecutive calendar days with a correct daily answer.
//! State changes only through [`StreakState::check_day_rollover`] and
//! [`StreakState::complete_daily_challenge`].

mod rewards;
mod state;
mod store;

pub use rewards::StreakMilestone;
pub use state::{DailyPhase, StreakState};
pub use store::StreakStore;
