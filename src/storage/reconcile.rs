//! Reconciling decorator over the remote and local profile stores
//!
//! Authenticated calls try the remote first under a deadline. A successful
//! remote call is mirrored into the local store before returning; a
//! recoverable remote failure is logged as degraded mode and served from the
//! local store instead. Guests never touch the remote.
//!
//! Writes served locally are not lost when the remote comes back: favorite
//! rows stay marked pending (or tombstoned) until replayed, and stats keep
//! the remote counters they were last synced with so offline plays can be
//! added on top of whatever the remote holds by then.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{FavoriteSync, LocalProfileStore, ProfileStore, RemoteProfileStore};
use crate::domain::{FavoriteRef, PlayerStats, Profile};
use crate::error::{Error, Result};

/// Which backing produced a reconciled value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSource {
    Remote,
    Local,
}

/// A value plus where it came from.
///
/// `degraded` is set when the remote was expected but could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled<T> {
    pub value: T,
    pub source: StoreSource,
    pub degraded: bool,
}

impl<T> Reconciled<T> {
    fn remote(value: T) -> Self {
        Self {
            value,
            source: StoreSource::Remote,
            degraded: false,
        }
    }

    fn local(value: T, degraded: bool) -> Self {
        Self {
            value,
            source: StoreSource::Local,
            degraded,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reconciled<U> {
        Reconciled {
            value: f(self.value),
            source: self.source,
            degraded: self.degraded,
        }
    }
}

/// Outcome of one remote attempt
enum Attempt<T> {
    /// Guest profile or no remote configured
    Skipped,
    Done(T),
    Degraded,
}

impl<T> Attempt<T> {
    fn degraded(&self) -> bool {
        matches!(self, Self::Degraded)
    }
}

#[derive(Clone)]
pub struct ReconcilingStore {
    local: LocalProfileStore,
    remote: Option<RemoteProfileStore>,
    timeout: Duration,
}

impl ReconcilingStore {
    pub fn new(local: LocalProfileStore, remote: Option<RemoteProfileStore>, timeout: Duration) -> Self {
        Self {
            local,
            remote,
            timeout,
        }
    }

    pub fn local_only(local: LocalProfileStore) -> Self {
        Self::new(local, None, Duration::ZERO)
    }

    pub fn local(&self) -> &LocalProfileStore {
        &self.local
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    fn remote_for(&self, profile: &Profile) -> Option<&RemoteProfileStore> {
        if profile.is_authenticated() {
            self.remote.as_ref()
        } else {
            None
        }
    }

    /// Await a remote call under the deadline, absorbing recoverable failures
    async fn attempt<T>(
        &self,
        operation: &'static str,
        profile: &Profile,
        call: impl Future<Output = Result<T>>,
    ) -> Result<Attempt<T>> {
        let outcome = match tokio::time::timeout(self.timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::RemoteUnavailable(format!(
                "{operation} timed out after {}ms",
                self.timeout.as_millis()
            ))),
        };
        match outcome {
            Ok(value) => Ok(Attempt::Done(value)),
            Err(e) if e.is_recoverable() => {
                warn!(
                    operation,
                    profile = %profile.storage_key(),
                    error = %e,
                    "remote store degraded, using local copy"
                );
                Ok(Attempt::Degraded)
            }
            Err(e) => Err(e),
        }
    }

    /// Push pending local favorite writes, oldest first. Returns `false`
    /// as soon as one push degrades; the rest stay pending.
    async fn replay_favorites(&self, profile: &Profile, remote: &RemoteProfileStore) -> Result<bool> {
        let pending = self.local.pending_favorites(profile)?;
        if pending.is_empty() {
            return Ok(true);
        }
        for (favorite, state) in &pending {
            match state {
                FavoriteSync::PendingAdd => {
                    let attempt = self
                        .attempt("replay_add_favorite", profile, remote.add_favorite(profile, favorite))
                        .await?;
                    let Attempt::Done(stored) = attempt else {
                        return Ok(false);
                    };
                    self.local.put_favorite(profile, &stored)?;
                }
                FavoriteSync::PendingRemove => {
                    let attempt = self
                        .attempt("replay_remove_favorite", profile, remote.remove_favorite(profile, favorite))
                        .await?;
                    let Attempt::Done(()) = attempt else {
                        return Ok(false);
                    };
                    self.local.delete_favorite(profile, favorite)?;
                }
                FavoriteSync::Synced => {}
            }
        }
        info!(profile = %profile.storage_key(), count = pending.len(), "replayed offline favorite changes");
        Ok(true)
    }

    /// Remote view merged into the local store. Offline changes are pushed
    /// first and are never overwritten by the remote copy.
    pub async fn load_favorites(&self, profile: &Profile) -> Result<Reconciled<Vec<FavoriteRef>>> {
        let attempt = match self.remote_for(profile) {
            Some(remote) => {
                if self.replay_favorites(profile, remote).await? {
                    self.attempt("load_favorites", profile, remote.load_favorites(profile))
                        .await?
                } else {
                    Attempt::Degraded
                }
            }
            None => Attempt::Skipped,
        };
        match attempt {
            Attempt::Done(remote_view) => {
                self.local.replace_favorites(profile, &remote_view)?;
                Ok(Reconciled::remote(self.local.favorites(profile)?))
            }
            other => Ok(Reconciled::local(self.local.favorites(profile)?, other.degraded())),
        }
    }

    /// The favorite is in the local store when this returns `Ok`, whatever
    /// happened remotely. A degraded add is kept pending for replay.
    pub async fn add_favorite(
        &self,
        profile: &Profile,
        favorite: &FavoriteRef,
    ) -> Result<Reconciled<FavoriteRef>> {
        let attempt = match self.remote_for(profile) {
            Some(remote) => {
                self.attempt("add_favorite", profile, remote.add_favorite(profile, favorite))
                    .await?
            }
            None => Attempt::Skipped,
        };
        match attempt {
            Attempt::Done(stored) => {
                self.local.put_favorite(profile, &stored)?;
                Ok(Reconciled::remote(stored))
            }
            Attempt::Degraded => {
                self.local
                    .mark_favorite(profile, favorite, FavoriteSync::PendingAdd)?;
                Ok(Reconciled::local(favorite.clone(), true))
            }
            Attempt::Skipped => {
                self.local.put_favorite(profile, favorite)?;
                Ok(Reconciled::local(favorite.clone(), false))
            }
        }
    }

    /// A degraded remove leaves a tombstone so the remote row is deleted on
    /// replay instead of coming back with the next load.
    pub async fn remove_favorite(&self, profile: &Profile, favorite: &FavoriteRef) -> Result<Reconciled<()>> {
        // reuse the id recorded locally so the remote delete needs no lookup
        let known = self
            .local
            .favorites(profile)?
            .into_iter()
            .find(|f| f.key() == favorite.key())
            .unwrap_or_else(|| favorite.clone());

        let attempt = match self.remote_for(profile) {
            Some(remote) => {
                self.attempt("remove_favorite", profile, remote.remove_favorite(profile, &known))
                    .await?
            }
            None => Attempt::Skipped,
        };
        match attempt {
            Attempt::Degraded => {
                self.local
                    .mark_favorite(profile, &known, FavoriteSync::PendingRemove)?;
                debug!(profile = %profile.storage_key(), key = %favorite.key(), "favorite removal pending");
                Ok(Reconciled::local((), true))
            }
            other => {
                let removed = self.local.delete_favorite(profile, favorite)?;
                debug!(profile = %profile.storage_key(), key = %favorite.key(), removed, "favorite removed locally");
                match other {
                    Attempt::Done(()) => Ok(Reconciled::remote(())),
                    _ => Ok(Reconciled::local((), false)),
                }
            }
        }
    }

    /// Remote stats, with any plays recorded locally since the last sync
    /// replayed on top and pushed back.
    pub async fn load_stats(&self, profile: &Profile) -> Result<Reconciled<PlayerStats>> {
        let Some(remote) = self.remote_for(profile) else {
            return Ok(Reconciled::local(self.local.stats(profile)?, false));
        };
        let Attempt::Done(remote_stats) = self
            .attempt("load_stats", profile, remote.load_stats(profile))
            .await?
        else {
            return Ok(Reconciled::local(self.local.stats(profile)?, true));
        };

        let (local, baseline) = self.local.stats_with_baseline(profile)?;
        if local == baseline {
            self.local
                .put_stats_with_baseline(profile, &remote_stats, &remote_stats)?;
            return Ok(Reconciled::remote(remote_stats));
        }

        let merged = local.rebase(&baseline, &remote_stats);
        match self
            .attempt("replay_stats", profile, remote.save_stats(profile, &merged))
            .await?
        {
            Attempt::Done(stored) => {
                self.local.put_stats_with_baseline(profile, &stored, &stored)?;
                info!(
                    profile = %profile.storage_key(),
                    plays = merged.total_plays - remote_stats.total_plays,
                    "replayed offline plays"
                );
                Ok(Reconciled::remote(stored))
            }
            _ => {
                self.local
                    .put_stats_with_baseline(profile, &merged, &remote_stats)?;
                Ok(Reconciled::local(merged, true))
            }
        }
    }

    /// Overwrite the counters. A degraded write stays local and counts as
    /// unsynced until the next [`load_stats`](Self::load_stats) reaches the remote.
    pub async fn save_stats(&self, profile: &Profile, stats: &PlayerStats) -> Result<Reconciled<PlayerStats>> {
        let attempt = match self.remote_for(profile) {
            Some(remote) => {
                self.attempt("save_stats", profile, remote.save_stats(profile, stats))
                    .await?
            }
            None => Attempt::Skipped,
        };
        match attempt {
            Attempt::Done(stored) => {
                self.local.put_stats_with_baseline(profile, &stored, &stored)?;
                Ok(Reconciled::remote(stored))
            }
            other => {
                self.local.put_stats(profile, stats)?;
                Ok(Reconciled::local(*stats, other.degraded()))
            }
        }
    }

    /// Fold one answered question into the stats row
    pub async fn record_play(
        &self,
        profile: &Profile,
        correct: bool,
        streak: u32,
    ) -> Result<Reconciled<PlayerStats>> {
        let current = self.load_stats(profile).await?;
        let saved = self
            .save_stats(profile, &current.value.record_play(correct, streak))
            .await?;
        Ok(Reconciled {
            degraded: saved.degraded || current.degraded,
            ..saved
        })
    }

    /// Drop the locally cached synced favorites of a profile (remote rows untouched)
    pub fn clear_favorites(&self, profile: &Profile) -> Result<usize> {
        self.local.clear_favorites(profile)
    }
}

#[async_trait]
impl ProfileStore for ReconcilingStore {
    async fn load_favorites(&self, profile: &Profile) -> Result<Vec<FavoriteRef>> {
        Ok(ReconcilingStore::load_favorites(self, profile).await?.value)
    }

    async fn add_favorite(&self, profile: &Profile, favorite: &FavoriteRef) -> Result<FavoriteRef> {
        Ok(ReconcilingStore::add_favorite(self, profile, favorite).await?.value)
    }

    async fn remove_favorite(&self, profile: &Profile, favorite: &FavoriteRef) -> Result<()> {
        ReconcilingStore::remove_favorite(self, profile, favorite).await?;
        Ok(())
    }

    async fn load_stats(&self, profile: &Profile) -> Result<PlayerStats> {
        Ok(ReconcilingStore::load_stats(self, profile).await?.value)
    }

    async fn save_stats(&self, profile: &Profile, stats: &PlayerStats) -> Result<PlayerStats> {
        Ok(ReconcilingStore::save_stats(self, profile, stats).await?.value)
    }
}
