//! Local durable backing of [`ProfileStore`]

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::OptionalExtension;

use super::db::LocalDb;
use super::ProfileStore;
use crate::domain::{CanonicalId, FavoriteRef, PlayerStats, Profile, UserIdentity};
use crate::error::Result;

/// Identity remembered between runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSession {
    pub user: UserIdentity,
    pub access_token: Option<String>,
}

/// Whether a local favorite row matches the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteSync {
    Synced,
    /// Added while the remote was unreachable
    PendingAdd,
    /// Removed while the remote was unreachable; hidden from listings
    PendingRemove,
}

impl FavoriteSync {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Synced => "synced",
            Self::PendingAdd => "pending_add",
            Self::PendingRemove => "pending_remove",
        }
    }

    fn parse(raw: &str) -> Self {
        match raw {
            "pending_add" => Self::PendingAdd,
            "pending_remove" => Self::PendingRemove,
            _ => Self::Synced,
        }
    }
}

#[derive(Clone)]
pub struct LocalProfileStore {
    db: LocalDb,
}

impl LocalProfileStore {
    pub fn new(db: LocalDb) -> Self {
        Self { db }
    }

    /// Listed favorites; tombstones are left out
    pub fn favorites(&self, profile: &Profile) -> Result<Vec<FavoriteRef>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            r#"SELECT category, title, canonical_id FROM favorites
               WHERE profile = ?1 AND sync_state != 'pending_remove'
               ORDER BY added_at, category, title"#,
        )?;
        let favorites = stmt
            .query_map([profile.storage_key()], favorite_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(favorites)
    }

    /// Rows still waiting to be pushed, oldest first
    pub fn pending_favorites(&self, profile: &Profile) -> Result<Vec<(FavoriteRef, FavoriteSync)>> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            r#"SELECT category, title, canonical_id, sync_state FROM favorites
               WHERE profile = ?1 AND sync_state != 'synced'
               ORDER BY added_at, category, title"#,
        )?;
        let pending = stmt
            .query_map([profile.storage_key()], |r| {
                Ok((favorite_from_row(r)?, FavoriteSync::parse(&r.get::<_, String>(3)?)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pending)
    }

    pub fn put_favorite(&self, profile: &Profile, favorite: &FavoriteRef) -> Result<()> {
        self.mark_favorite(profile, favorite, FavoriteSync::Synced)
    }

    /// Upsert a favorite row in the given sync state. A known id is never
    /// dropped by a write that carries none.
    pub fn mark_favorite(&self, profile: &Profile, favorite: &FavoriteRef, state: FavoriteSync) -> Result<()> {
        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO favorites (profile, category, title, canonical_id, sync_state, added_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(profile, category, title) DO UPDATE SET
                   canonical_id = COALESCE(?4, canonical_id),
                   sync_state = ?5"#,
            rusqlite::params![
                profile.storage_key(),
                favorite.category,
                favorite.title,
                favorite.canonical_id.as_ref().map(CanonicalId::as_str),
                state.as_str(),
                Utc::now().timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    pub fn delete_favorite(&self, profile: &Profile, favorite: &FavoriteRef) -> Result<bool> {
        let conn = self.db.conn();
        let removed = conn.execute(
            "DELETE FROM favorites WHERE profile = ?1 AND category = ?2 AND title = ?3",
            rusqlite::params![profile.storage_key(), favorite.category, favorite.title],
        )?;
        Ok(removed > 0)
    }

    /// Replace the profile's synced remote-backed favorites with `favorites`.
    ///
    /// Name-only entries cannot exist remotely and are kept, as are rows
    /// still pending. A remote favorite whose id is already stored locally
    /// keeps the local name pair, so a title typed by the player survives
    /// the canonical title coming back from the remote.
    pub fn replace_favorites(&self, profile: &Profile, favorites: &[FavoriteRef]) -> Result<()> {
        let key = profile.storage_key();
        let now = Utc::now().timestamp_millis();
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        let known: HashMap<String, (String, String, FavoriteSync)> = {
            let mut stmt = tx.prepare(
                r#"SELECT canonical_id, category, title, sync_state FROM favorites
                   WHERE profile = ?1 AND canonical_id IS NOT NULL"#,
            )?;
            let rows = stmt
                .query_map([&key], |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        (r.get(1)?, r.get(2)?, FavoriteSync::parse(&r.get::<_, String>(3)?)),
                    ))
                })?
                .collect::<rusqlite::Result<HashMap<_, _>>>()?;
            rows
        };

        tx.execute(
            "DELETE FROM favorites WHERE profile = ?1 AND canonical_id IS NOT NULL AND sync_state = 'synced'",
            [&key],
        )?;
        for (offset, favorite) in favorites.iter().enumerate() {
            let id = favorite.canonical_id.as_ref().map(CanonicalId::as_str);
            let (category, title) = match id.and_then(|id| known.get(id)) {
                Some((_, _, FavoriteSync::PendingAdd | FavoriteSync::PendingRemove)) => continue,
                Some((category, title, FavoriteSync::Synced)) => (category.as_str(), title.as_str()),
                None => (favorite.category.as_str(), favorite.title.as_str()),
            };
            tx.execute(
                r#"INSERT INTO favorites (profile, category, title, canonical_id, sync_state, added_at)
                   VALUES (?1, ?2, ?3, ?4, 'synced', ?5)
                   ON CONFLICT(profile, category, title) DO UPDATE SET canonical_id = ?4"#,
                rusqlite::params![key, category, title, id, now + offset as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Drop the profile's synced favorites (logout). Unsynced rows stay
    /// until a later sign-in replays them.
    pub fn clear_favorites(&self, profile: &Profile) -> Result<usize> {
        let conn = self.db.conn();
        Ok(conn.execute(
            "DELETE FROM favorites WHERE profile = ?1 AND sync_state = 'synced'",
            [profile.storage_key()],
        )?)
    }

    pub fn stats(&self, profile: &Profile) -> Result<PlayerStats> {
        Ok(self.stats_with_baseline(profile)?.0)
    }

    /// Local counters plus the remote counters they were last synced with
    pub fn stats_with_baseline(&self, profile: &Profile) -> Result<(PlayerStats, PlayerStats)> {
        let conn = self.db.conn();
        let row = conn
            .query_row(
                r#"SELECT total_plays, correct_answers, best_streak,
                          synced_plays, synced_correct, synced_best
                   FROM stats_snapshot WHERE profile = ?1"#,
                [profile.storage_key()],
                |r| {
                    Ok((
                        PlayerStats {
                            total_plays: r.get(0)?,
                            correct_answers: r.get(1)?,
                            best_streak: r.get(2)?,
                        },
                        PlayerStats {
                            total_plays: r.get(3)?,
                            correct_answers: r.get(4)?,
                            best_streak: r.get(5)?,
                        },
                    ))
                },
            )
            .optional()?;
        Ok(row.unwrap_or_default())
    }

    /// Local-only write; the synced baseline is left as it was
    pub fn put_stats(&self, profile: &Profile, stats: &PlayerStats) -> Result<()> {
        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO stats_snapshot (profile, total_plays, correct_answers, best_streak, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(profile) DO UPDATE SET
                   total_plays = ?2, correct_answers = ?3, best_streak = ?4, updated_at = ?5"#,
            rusqlite::params![
                profile.storage_key(),
                stats.total_plays,
                stats.correct_answers,
                stats.best_streak,
                Utc::now().timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    /// Write the local counters together with the remote counters they now
    /// match (or extend)
    pub fn put_stats_with_baseline(
        &self,
        profile: &Profile,
        stats: &PlayerStats,
        baseline: &PlayerStats,
    ) -> Result<()> {
        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO stats_snapshot (profile, total_plays, correct_answers, best_streak,
                                           synced_plays, synced_correct, synced_best, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
               ON CONFLICT(profile) DO UPDATE SET
                   total_plays = ?2, correct_answers = ?3, best_streak = ?4,
                   synced_plays = ?5, synced_correct = ?6, synced_best = ?7, updated_at = ?8"#,
            rusqlite::params![
                profile.storage_key(),
                stats.total_plays,
                stats.correct_answers,
                stats.best_streak,
                baseline.total_plays,
                baseline.correct_answers,
                baseline.best_streak,
                Utc::now().timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    pub fn save_session(&self, session: &SavedSession) -> Result<()> {
        let conn = self.db.conn();
        conn.execute(
            r#"INSERT INTO saved_session (id, user_id, email, access_token, saved_at)
               VALUES (1, ?1, ?2, ?3, ?4)
               ON CONFLICT(id) DO UPDATE SET
                   user_id = ?1, email = ?2, access_token = ?3, saved_at = ?4"#,
            rusqlite::params![
                session.user.id,
                session.user.email,
                session.access_token,
                Utc::now().timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    pub fn saved_session(&self) -> Result<Option<SavedSession>> {
        let conn = self.db.conn();
        let session = conn
            .query_row(
                "SELECT user_id, email, access_token FROM saved_session WHERE id = 1",
                [],
                |r| {
                    Ok(SavedSession {
                        user: UserIdentity {
                            id: r.get(0)?,
                            email: r.get(1)?,
                        },
                        access_token: r.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    pub fn clear_session(&self) -> Result<()> {
        let conn = self.db.conn();
        conn.execute("DELETE FROM saved_session", [])?;
        Ok(())
    }
}

fn favorite_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<FavoriteRef> {
    Ok(FavoriteRef {
        category: r.get(0)?,
        title: r.get(1)?,
        canonical_id: r.get::<_, Option<String>>(2)?.map(CanonicalId::new),
    })
}

#[async_trait]
impl ProfileStore for LocalProfileStore {
    async fn load_favorites(&self, profile: &Profile) -> Result<Vec<FavoriteRef>> {
        self.favorites(profile)
    }

    async fn add_favorite(&self, profile: &Profile, favorite: &FavoriteRef) -> Result<FavoriteRef> {
        self.put_favorite(profile, favorite)?;
        Ok(favorite.clone())
    }

    async fn remove_favorite(&self, profile: &Profile, favorite: &FavoriteRef) -> Result<()> {
        self.delete_favorite(profile, favorite)?;
        Ok(())
    }

    async fn load_stats(&self, profile: &Profile) -> Result<PlayerStats> {
        self.stats(profile)
    }

    async fn save_stats(&self, profile: &Profile, stats: &PlayerStats) -> Result<PlayerStats> {
        self.put_stats(profile, stats)?;
        Ok(*stats)
    }
}
