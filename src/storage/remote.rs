//! Remote backing of [`ProfileStore`]: `favorites` and `user_stats` tables

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::ProfileStore;
use crate::domain::{CanonicalId, FavoriteRef, PlayerStats, Profile, UserIdentity};
use crate::error::{Error, Result};
use crate::matcher::Matcher;
use crate::remote::{tables, Filter, Query, RemoteStore};

#[derive(Clone)]
pub struct RemoteProfileStore {
    remote: Arc<dyn RemoteStore>,
    matcher: Matcher,
}

impl RemoteProfileStore {
    pub fn new(remote: Arc<dyn RemoteStore>, matcher: Matcher) -> Self {
        Self { remote, matcher }
    }

    fn user(profile: &Profile) -> Result<&UserIdentity> {
        profile.user().ok_or(Error::NotAuthenticated)
    }

    /// Canonical id for a favorite: the one it carries, else a catalog lookup
    async fn canonical_id(&self, favorite: &FavoriteRef) -> Result<Option<CanonicalId>> {
        if let Some(id) = &favorite.canonical_id {
            return Ok(Some(id.clone()));
        }
        Ok(self
            .matcher
            .resolve(&favorite.title, &favorite.category)
            .await?
            .into_canonical_id())
    }

    fn favorite_query(user_id: &str, track_id: &CanonicalId) -> Query {
        Query::from(tables::FAVORITES)
            .eq(tables::USER_ID, user_id)
            .eq(tables::TRACK_ID, track_id.as_str())
    }

    fn stats_query(user_id: &str) -> Query {
        Query::from(tables::USER_STATS).eq(tables::USER_ID, user_id)
    }
}

#[async_trait]
impl ProfileStore for RemoteProfileStore {
    async fn load_favorites(&self, profile: &Profile) -> Result<Vec<FavoriteRef>> {
        let user = Self::user(profile)?;
        let rows = self
            .remote
            .select(&Query::from(tables::FAVORITES).eq(tables::USER_ID, user.id.as_str()))
            .await?;

        let track_ids: Vec<Filter> = rows
            .iter()
            .filter_map(|r| r.get(tables::TRACK_ID))
            .map(|id| Filter::Eq(tables::ID.to_string(), id.clone()))
            .collect();
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tracks = self
            .remote
            .select(&Query::from(tables::TRACKS).or(track_ids))
            .await?;
        let favorites: Vec<FavoriteRef> = tracks
            .iter()
            .filter_map(tables::track_from_row)
            .map(|item| FavoriteRef::from(&item))
            .collect();
        debug!(user = %user.id, count = favorites.len(), "loaded remote favorites");
        Ok(favorites)
    }

    /// Unresolvable tracks are not written remotely and come back name-only
    async fn add_favorite(&self, profile: &Profile, favorite: &FavoriteRef) -> Result<FavoriteRef> {
        let user = Self::user(profile)?;
        let Some(track_id) = self.canonical_id(favorite).await? else {
            info!(
                category = %favorite.category,
                title = %favorite.title,
                "track not in remote catalog, keeping favorite by name"
            );
            return Ok(FavoriteRef::by_name(&favorite.category, &favorite.title));
        };

        let existing = self
            .remote
            .select(&Self::favorite_query(&user.id, &track_id).limit(1))
            .await?;
        if existing.is_empty() {
            self.remote
                .insert(tables::FAVORITES, tables::favorite_row(&user.id, &track_id))
                .await?;
        }
        Ok(FavoriteRef::by_name(&favorite.category, &favorite.title).with_id(track_id))
    }

    /// Resolves the track the same way [`add_favorite`](Self::add_favorite)
    /// did when no id is known, so a fuzzily matched favorite can be removed
    async fn remove_favorite(&self, profile: &Profile, favorite: &FavoriteRef) -> Result<()> {
        let user = Self::user(profile)?;
        if let Some(track_id) = self.canonical_id(favorite).await? {
            let removed = self
                .remote
                .delete(&Self::favorite_query(&user.id, &track_id))
                .await?;
            debug!(user = %user.id, %track_id, removed, "removed remote favorite");
        }
        Ok(())
    }

    /// Reads the stats row, creating the initial zero row on first use
    async fn load_stats(&self, profile: &Profile) -> Result<PlayerStats> {
        let user = Self::user(profile)?;
        let rows = self
            .remote
            .select(&Self::stats_query(&user.id).limit(1))
            .await?;
        if let Some(row) = rows.first() {
            return Ok(tables::stats_from_row(row));
        }

        let initial = PlayerStats::default();
        let row = self
            .remote
            .insert(tables::USER_STATS, tables::stats_to_row(&user.id, &initial))
            .await?;
        info!(user = %user.id, "created initial stats row");
        Ok(tables::stats_from_row(&row))
    }

    async fn save_stats(&self, profile: &Profile, stats: &PlayerStats) -> Result<PlayerStats> {
        let user = Self::user(profile)?;
        let updated = self
            .remote
            .update(&Self::stats_query(&user.id), tables::stats_patch(stats))
            .await?;
        if let Some(row) = updated.first() {
            return Ok(tables::stats_from_row(row));
        }

        let row = self
            .remote
            .insert(tables::USER_STATS, tables::stats_to_row(&user.id, stats))
            .await?;
        Ok(tables::stats_from_row(&row))
    }
}
