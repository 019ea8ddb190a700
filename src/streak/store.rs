//! Local-first persistence of streak profiles

use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use super::state::StreakState;
use crate::domain::Profile;
use crate::error::Result;
use crate::storage::db::{date_from_sql, date_to_sql, LocalDb};

/// Owns the durable streak profile of each local namespace.
///
/// Each transition loads, applies and writes back under one connection lock
/// and one transaction, so a failed write leaves the stored row untouched.
#[derive(Clone)]
pub struct StreakStore {
    db: LocalDb,
}

impl StreakStore {
    pub fn new(db: LocalDb) -> Self {
        Self { db }
    }

    /// Stored state, or zero-valued defaults on first use
    pub fn load(&self, profile: &Profile) -> Result<StreakState> {
        let conn = self.db.conn();
        Ok(Self::read(&conn, &profile.storage_key())?.unwrap_or_default())
    }

    pub fn check_day_rollover(&self, profile: &Profile, today: NaiveDate) -> Result<StreakState> {
        let key = profile.storage_key();
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;
        let existing = Self::read(&tx, &key)?;
        let mut state = existing.clone().unwrap_or_default();

        if state.check_day_rollover(today) || existing.is_none() {
            Self::write(&tx, &key, &state)?;
            tx.commit()?;
            debug!(profile = %key, %today, "daily challenge rolled over");
        }
        Ok(state)
    }

    /// Roll over if needed, then apply the completion and persist it
    pub fn complete_daily_challenge(
        &self,
        profile: &Profile,
        is_correct: bool,
        today: NaiveDate,
    ) -> Result<StreakState> {
        let key = profile.storage_key();
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;
        let mut state = Self::read(&tx, &key)?.unwrap_or_default();
        state.check_day_rollover(today);

        let next = state.complete_daily_challenge(is_correct, today)?;
        Self::write(&tx, &key, &next)?;
        tx.commit()?;

        info!(
            profile = %key,
            is_correct,
            current = next.current_streak,
            best = next.best_streak,
            "daily challenge completed"
        );
        Ok(next)
    }

    fn read(conn: &Connection, key: &str) -> Result<Option<StreakState>> {
        let state = conn
            .query_row(
                r#"SELECT current_streak, best_streak, last_played_date, last_checked_date,
                          daily_completed, total_completions
                   FROM streak_profile WHERE profile = ?1"#,
                [key],
                |r| {
                    Ok(StreakState {
                        current_streak: r.get(0)?,
                        best_streak: r.get(1)?,
                        last_played_date: date_from_sql(r.get(2)?, 2)?,
                        last_checked_date: date_from_sql(r.get(3)?, 3)?,
                        daily_completed: r.get::<_, i32>(4)? != 0,
                        total_completions: r.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    fn write(conn: &Connection, key: &str, state: &StreakState) -> Result<()> {
        conn.execute(
            r#"INSERT INTO streak_profile
               (profile, current_streak, best_streak, last_played_date, last_checked_date,
                daily_completed, total_completions, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
               ON CONFLICT(profile) DO UPDATE SET
                   current_streak = ?2, best_streak = ?3, last_played_date = ?4,
                   last_checked_date = ?5, daily_completed = ?6, total_completions = ?7,
                   updated_at = ?8"#,
            rusqlite::params![
                key,
                state.current_streak,
                state.best_streak,
                date_to_sql(state.last_played_date),
                date_to_sql(state.last_checked_date),
                state.daily_completed as i32,
                state.total_completions,
                Utc::now().timestamp_millis(),
            ],
        )?;
        Ok(())
    }
}
