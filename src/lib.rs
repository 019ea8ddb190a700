//! Tunedle - daily music quiz engine
//!
//! Every player gets the same question of the day: a date-seeded generator
//! picks one track from the catalog and the player names the game it comes
//! from. Correct answers on consecutive days build a streak.
//!
//! ## Storage
//!
//! Guests play entirely against the local SQLite store. Signed-in players
//! read and write the remote store first and fall back to the local copy
//! whenever the remote is slow or unreachable.

pub mod catalog;
pub mod config;
pub mod daily;
pub mod domain;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod remote;
pub mod storage;
pub mod streak;

pub use domain::*;
pub use engine::{AnswerOutcome, AuthTransition, DailyStatus, Question, QuizEngine};
pub use error::{Error, Result};
