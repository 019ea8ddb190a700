//! Daily Challenge Engine
//!
//! Facade the front end talks to. Every call takes a [`PlayContext`] (date
//! and profile) instead of reading the clock or a global user.

mod gate;
mod pins;
mod session;

pub use gate::{GateGuard, KeyedGate};
pub use pins::DailyPins;
pub use session::Session;

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::catalog::{Catalog, CatalogAccessor, CatalogSource};
use crate::config::Config;
use crate::daily::DailyPick;
use crate::domain::{CatalogItem, FavoriteKey, FavoriteRef, PlayContext, PlayerStats, Profile, UserIdentity};
use crate::error::{Error, Result};
use crate::matcher::Matcher;
use crate::remote::RemoteStore;
use crate::storage::{LocalDb, LocalProfileStore, Reconciled, ReconcilingStore, RemoteProfileStore};
use crate::streak::{DailyPhase, StreakMilestone, StreakState, StreakStore};

/// A question: the hidden item plus the category options to pick from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub item: CatalogItem,
    pub options: Vec<String>,
    pub source: CatalogSource,
}

impl Question {
    fn new(item: CatalogItem, catalog: &Catalog, source: CatalogSource) -> Self {
        Self {
            item,
            options: catalog.category_names(),
            source,
        }
    }

    pub fn is_correct(&self, guess: &str) -> bool {
        check_answer(&self.item, guess)
    }
}

/// A guess is correct iff it names the item's category exactly
pub fn check_answer(item: &CatalogItem, guess: &str) -> bool {
    item.category == guess
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyStatus {
    Completed { current_streak: u32, best_streak: u32 },
    Available { date: NaiveDate, question: Question },
}

/// Result of a submitted daily answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub item: CatalogItem,
    pub correct: bool,
    pub streak: StreakState,
    pub milestone: StreakMilestone,
    /// `None` if the stats row could not be written anywhere
    pub stats: Option<PlayerStats>,
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthTransition {
    SignedIn {
        profile: Profile,
        favorites: usize,
        stats: PlayerStats,
        degraded: bool,
    },
    SignedOut {
        cleared_favorites: usize,
    },
    Unchanged,
}

pub struct QuizEngine {
    catalog: CatalogAccessor,
    streaks: StreakStore,
    pins: DailyPins,
    store: ReconcilingStore,
    gate: KeyedGate,
    session: RwLock<Session>,
}

impl QuizEngine {
    /// Engine over an open database and an optional remote store
    pub fn new(db: LocalDb, remote: Option<Arc<dyn RemoteStore>>, timeout: Duration) -> Result<Self> {
        let catalog = CatalogAccessor::new(remote.clone(), timeout)?;
        Self::with_catalog(db, remote, timeout, catalog)
    }

    pub fn with_catalog(
        db: LocalDb,
        remote: Option<Arc<dyn RemoteStore>>,
        timeout: Duration,
        catalog: CatalogAccessor,
    ) -> Result<Self> {
        let local = LocalProfileStore::new(db.clone());
        let remote_profiles = remote.map(|remote| {
            let matcher = Matcher::new(Arc::clone(&remote), timeout);
            RemoteProfileStore::new(remote, matcher)
        });

        let mut session = Session::default();
        session.replace(Profile::Guest, &local.favorites(&Profile::Guest)?);

        Ok(Self {
            catalog,
            pins: DailyPins::new(db.clone()),
            streaks: StreakStore::new(db),
            store: ReconcilingStore::new(local, remote_profiles, timeout),
            gate: KeyedGate::new(),
            session: RwLock::new(session),
        })
    }

    /// Open the configured database; `remote` is used only if given
    pub fn from_config(config: &Config, remote: Option<Arc<dyn RemoteStore>>) -> Result<Self> {
        let db = LocalDb::open(&config.db_path())?;
        Self::new(db, remote, Duration::from_millis(config.remote.timeout_ms))
    }

    pub fn store(&self) -> &ReconcilingStore {
        &self.store
    }

    /// Profile of the in-memory session
    pub fn profile(&self) -> Profile {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .profile()
            .clone()
    }

    /// Context for the active profile on `today`
    pub fn context(&self, today: NaiveDate) -> PlayContext {
        PlayContext::new(today, self.profile())
    }

    pub async fn daily_status(&self, ctx: &PlayContext) -> Result<DailyStatus> {
        let state = self.streaks.check_day_rollover(&ctx.profile, ctx.today)?;
        if state.phase(ctx.today) == DailyPhase::Completed {
            return Ok(DailyStatus::Completed {
                current_streak: state.current_streak,
                best_streak: state.best_streak,
            });
        }
        let question = self.daily_question(ctx.today).await?;
        Ok(DailyStatus::Available {
            date: ctx.today,
            question,
        })
    }

    /// Today's question, regardless of completion.
    ///
    /// The first question shown for a day is pinned; later calls and the
    /// grading in [`submit_daily_answer`](Self::submit_daily_answer) reuse it
    /// even if the catalog source changes in between.
    pub async fn daily_question(&self, today: NaiveDate) -> Result<Question> {
        if let Some(question) = self.pins.get(today)? {
            return Ok(question);
        }
        let load = self.catalog.load().await?;
        let pick = DailyPick::for_date(today, &load.catalog)?;
        let item = pick.item(&load.catalog).ok_or(Error::EmptyCatalog)?;
        debug!(%today, category = pick.category_index, track = pick.track_index, source = ?load.source, "daily pick");
        self.pins
            .pin(today, &Question::new(item, &load.catalog, load.source))
    }

    /// Submit today's answer.
    ///
    /// A second submission for the same profile and day, concurrent or not,
    /// fails with `DuplicateCompletionAttempt` and changes nothing.
    pub async fn submit_daily_answer(&self, ctx: &PlayContext, guess: &str) -> Result<AnswerOutcome> {
        let duplicate = || Error::DuplicateCompletionAttempt { date: ctx.today };
        let _guard = self
            .gate
            .try_enter(format!("daily:{}:{}", ctx.profile.storage_key(), ctx.today))
            .ok_or_else(duplicate)?;

        let state = self.streaks.check_day_rollover(&ctx.profile, ctx.today)?;
        if state.phase(ctx.today) == DailyPhase::Completed {
            return Err(duplicate());
        }

        let question = self.daily_question(ctx.today).await?;
        let correct = question.is_correct(guess);
        let streak = self
            .streaks
            .complete_daily_challenge(&ctx.profile, correct, ctx.today)?;
        let milestone = StreakMilestone::for_completion(correct, streak.current_streak);

        let (stats, degraded) = match self
            .store
            .record_play(&ctx.profile, correct, streak.current_streak)
            .await
        {
            Ok(stats) => (Some(stats.value), stats.degraded),
            Err(e) => {
                error!(profile = %ctx.profile.storage_key(), error = %e, "failed to record stats");
                (None, true)
            }
        };

        Ok(AnswerOutcome {
            item: question.item,
            correct,
            streak,
            milestone,
            stats,
            degraded,
        })
    }

    /// Random question with no streak effect
    pub async fn practice_question(&self) -> Result<Question> {
        let load = self.catalog.load().await?;
        let category_index = random_index(load.catalog.categories.len())?;
        let track_index = random_index(load.catalog.categories[category_index].tracks.len())?;
        let item = load
            .catalog
            .item_at(category_index, track_index)
            .ok_or(Error::EmptyCatalog)?;
        Ok(Question::new(item, &load.catalog, load.source))
    }

    pub fn streak(&self, ctx: &PlayContext) -> Result<StreakState> {
        self.streaks.check_day_rollover(&ctx.profile, ctx.today)
    }

    pub async fn stats(&self, ctx: &PlayContext) -> Result<Reconciled<PlayerStats>> {
        self.store.load_stats(&ctx.profile).await
    }

    /// Add a favorite. Calls for the same profile and name pair run one at a time.
    pub async fn add_favorite(&self, ctx: &PlayContext, favorite: &FavoriteRef) -> Result<Reconciled<FavoriteRef>> {
        let _guard = self.gate.enter(favorite_gate_key(ctx, favorite)).await;
        let stored = self.store.add_favorite(&ctx.profile, favorite).await?;
        self.session_mut().insert(&ctx.profile, stored.value.key());
        Ok(stored)
    }

    pub async fn remove_favorite(&self, ctx: &PlayContext, favorite: &FavoriteRef) -> Result<Reconciled<()>> {
        let _guard = self.gate.enter(favorite_gate_key(ctx, favorite)).await;
        let removed = self.store.remove_favorite(&ctx.profile, favorite).await?;
        self.session_mut().remove(&ctx.profile, &favorite.key());
        Ok(removed)
    }

    pub fn is_favorite(&self, ctx: &PlayContext, key: &FavoriteKey) -> Result<bool> {
        let cached = self
            .session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&ctx.profile, key);
        match cached {
            Some(hit) => Ok(hit),
            None => Ok(self
                .store
                .local()
                .favorites(&ctx.profile)?
                .iter()
                .any(|f| &f.key() == key)),
        }
    }

    /// Favorites as currently known locally; never waits on the remote
    pub fn favorites(&self, ctx: &PlayContext) -> Result<Vec<FavoriteRef>> {
        self.store.local().favorites(&ctx.profile)
    }

    /// Favorites grouped by the generation tag of their category
    pub async fn favorites_by_generation(&self, ctx: &PlayContext) -> Result<BTreeMap<u32, Vec<FavoriteRef>>> {
        let catalog = self.catalog.load_catalog().await?;
        let mut groups: BTreeMap<u32, Vec<FavoriteRef>> = BTreeMap::new();
        for favorite in self.favorites(ctx)? {
            groups
                .entry(catalog.generation_of(&favorite.category))
                .or_default()
                .push(favorite);
        }
        Ok(groups)
    }

    /// Switch the session to a new identity.
    ///
    /// Login loads remote favorites and stats once and replaces the view.
    /// Logout drops the account's local favorites cache and the remembered
    /// session; remote rows are left alone.
    pub async fn on_auth_change(&self, user: Option<UserIdentity>) -> Result<AuthTransition> {
        let next = Profile::from_user(user);
        let previous = self.profile();
        if previous == next {
            return Ok(AuthTransition::Unchanged);
        }

        match &next {
            Profile::Account(user) => {
                let (favorites, stats) = futures::join!(
                    self.store.load_favorites(&next),
                    self.store.load_stats(&next)
                );
                let (favorites, stats) = (favorites?, stats?);
                self.session_mut().replace(next.clone(), &favorites.value);
                info!(user = %user.id, favorites = favorites.value.len(), "signed in");
                Ok(AuthTransition::SignedIn {
                    profile: next.clone(),
                    favorites: favorites.value.len(),
                    stats: stats.value,
                    degraded: favorites.degraded || stats.degraded,
                })
            }
            Profile::Guest => {
                let cleared = self.store.clear_favorites(&previous)?;
                self.store.local().clear_session()?;
                let guest_favorites = self.store.local().favorites(&Profile::Guest)?;
                self.session_mut().replace(Profile::Guest, &guest_favorites);
                info!(profile = %previous.storage_key(), cleared, "signed out");
                Ok(AuthTransition::SignedOut {
                    cleared_favorites: cleared,
                })
            }
        }
    }

    /// Apply identity changes published by the remote until the channel closes
    pub async fn follow_auth(self: Arc<Self>, mut changes: watch::Receiver<Option<UserIdentity>>) {
        while changes.changed().await.is_ok() {
            let user = changes.borrow_and_update().clone();
            if let Err(e) = self.on_auth_change(user).await {
                warn!(error = %e, "failed to apply identity change");
            }
        }
    }

    fn session_mut(&self) -> std::sync::RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn favorite_gate_key(ctx: &PlayContext, favorite: &FavoriteRef) -> String {
    format!(
        "fav:{}:{}/{}",
        ctx.profile.storage_key(),
        favorite.category,
        favorite.title
    )
}

/// Uniform index in `0..len` from OS randomness
fn random_index(len: usize) -> Result<usize> {
    if len == 0 {
        return Err(Error::EmptyCatalog);
    }
    let mut buf = [0u8; 8];
    getrandom::getrandom(&mut buf).map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
    Ok((u64::from_le_bytes(buf) % len as u64) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Track};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn single_item_engine() -> QuizEngine {
        let catalog = Catalog {
            categories: vec![Category {
                name: "Pokemon Emerald".into(),
                generation: 3,
                tracks: vec![Track {
                    title: "Littleroot Town".into(),
                    media_ref: "e/littleroot.mp3".into(),
                    canonical_id: None,
                }],
            }],
        };
        let accessor = CatalogAccessor::with_fallback(None, Duration::from_secs(1), catalog);
        QuizEngine::with_catalog(
            LocalDb::open_in_memory().unwrap(),
            None,
            Duration::from_secs(1),
            accessor,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_daily_flow_completes_once_per_day() {
        let engine = single_item_engine();
        let ctx = PlayContext::guest(date(2024, 3, 1));

        let DailyStatus::Available { question, .. } = engine.daily_status(&ctx).await.unwrap() else {
            panic!("expected an open challenge");
        };
        assert_eq!(question.options, vec!["Pokemon Emerald".to_string()]);

        let outcome = engine.submit_daily_answer(&ctx, "Pokemon Emerald").await.unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.milestone, StreakMilestone::FirstDay);
        assert_eq!(outcome.stats.unwrap().total_plays, 1);

        let again = engine.submit_daily_answer(&ctx, "Pokemon Emerald").await;
        assert!(matches!(again, Err(Error::DuplicateCompletionAttempt { .. })));
        assert_eq!(
            engine.daily_status(&ctx).await.unwrap(),
            DailyStatus::Completed {
                current_streak: 1,
                best_streak: 1
            }
        );
    }

    #[tokio::test]
    async fn test_next_day_reopens_challenge() {
        let engine = single_item_engine();
        engine
            .submit_daily_answer(&PlayContext::guest(date(2024, 3, 1)), "Pokemon Emerald")
            .await
            .unwrap();

        let tomorrow = PlayContext::guest(date(2024, 3, 2));
        assert!(matches!(
            engine.daily_status(&tomorrow).await.unwrap(),
            DailyStatus::Available { .. }
        ));
        let outcome = engine.submit_daily_answer(&tomorrow, "Pokemon Emerald").await.unwrap();
        assert_eq!(outcome.streak.current_streak, 2);
    }

    #[tokio::test]
    async fn test_practice_has_no_streak_effect() {
        let engine = single_item_engine();
        let ctx = PlayContext::guest(date(2024, 3, 1));
        let question = engine.practice_question().await.unwrap();
        assert!(question.is_correct("Pokemon Emerald"));
        assert!(!question.is_correct("pokemon emerald"));
        assert_eq!(engine.streak(&ctx).unwrap().total_completions, 0);
    }

    #[tokio::test]
    async fn test_guest_favorites_grouped_by_generation() {
        let engine = single_item_engine();
        let ctx = PlayContext::guest(date(2024, 3, 1));
        engine
            .add_favorite(&ctx, &FavoriteRef::by_name("Pokemon Emerald", "Littleroot Town"))
            .await
            .unwrap();
        engine
            .add_favorite(&ctx, &FavoriteRef::by_name("Homebrew", "Unknown Jam"))
            .await
            .unwrap();

        assert!(engine
            .is_favorite(&ctx, &FavoriteKey::new("Pokemon Emerald", "Littleroot Town"))
            .unwrap());
        let groups = engine.favorites_by_generation(&ctx).await.unwrap();
        assert_eq!(groups[&3].len(), 1);
        assert_eq!(groups[&1][0].title, "Unknown Jam");
    }
}
