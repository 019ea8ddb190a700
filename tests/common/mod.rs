//! Shared test utilities for engine integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tempfile::TempDir;

use tunedle::catalog::Catalog;
use tunedle::remote::{MemoryRemote, RemoteStore};
use tunedle::storage::LocalDb;
use tunedle::{CatalogItem, PlayContext, Profile, QuizEngine, UserIdentity};

/// Engine over a temporary SQLite file and an in-memory remote
pub struct Harness {
    pub engine: Arc<QuizEngine>,
    pub remote: Arc<MemoryRemote>,
    timeout: Duration,
    dir: TempDir,
}

impl Harness {
    pub fn guest(&self, day: NaiveDate) -> PlayContext {
        PlayContext::guest(day)
    }

    pub fn account(&self, day: NaiveDate, id: &str) -> PlayContext {
        PlayContext::new(day, Profile::Account(user(id)))
    }

    /// A second engine over the same database and remote, as the next CLI
    /// invocation would build it
    pub fn reopen(&self) -> Arc<QuizEngine> {
        let db = LocalDb::open(&self.dir.path().join("tunedle.db")).expect("Failed to reopen db");
        let store: Arc<dyn RemoteStore> = self.remote.clone();
        Arc::new(QuizEngine::new(db, Some(store), self.timeout).expect("Failed to build engine"))
    }

    /// The option that answers the daily challenge of `day` correctly
    pub async fn correct_answer(&self, day: NaiveDate) -> String {
        let question = self
            .engine
            .daily_question(day)
            .await
            .expect("daily question");
        question.item.category
    }

    /// Any option that is not the answer of `day`
    pub async fn wrong_answer(&self, day: NaiveDate) -> String {
        let question = self
            .engine
            .daily_question(day)
            .await
            .expect("daily question");
        question
            .options
            .into_iter()
            .find(|o| *o != question.item.category)
            .expect("catalog has more than one game")
    }
}

pub fn harness() -> Harness {
    harness_with_timeout(Duration::from_millis(500))
}

pub fn harness_with_timeout(timeout: Duration) -> Harness {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = LocalDb::open(&dir.path().join("tunedle.db")).expect("Failed to open db");
    let remote = Arc::new(MemoryRemote::with_catalog(&test_catalog()));
    let store: Arc<dyn RemoteStore> = remote.clone();
    let engine = QuizEngine::new(db, Some(store), timeout).expect("Failed to build engine");
    Harness {
        engine: Arc::new(engine),
        remote,
        timeout,
        dir,
    }
}

pub fn test_catalog() -> Catalog {
    let tracks = [
        ("Pokemon Red Blue", 1, "Route 1 Theme"),
        ("Pokemon Red Blue", 1, "Pallet Town"),
        ("Pokemon Red Blue", 1, "Lavender Town"),
        ("Pokemon Gold Silver", 2, "New Bark Town"),
        ("Pokemon Gold Silver", 2, "Ecruteak City"),
        ("Pokemon Ruby Sapphire", 3, "Littleroot Town"),
        ("Pokemon Ruby Sapphire", 3, "Route 113"),
        ("Pokemon Ruby Sapphire", 3, "Slateport City"),
    ];
    Catalog::from_items(tracks.iter().map(|(game, generation, title)| CatalogItem {
        category: game.to_string(),
        title: title.to_string(),
        media_ref: format!("{}.mp3", title.to_lowercase().replace(' ', "-")),
        generation: *generation,
        canonical_id: None,
    }))
}

pub fn user(id: &str) -> UserIdentity {
    UserIdentity {
        id: id.to_string(),
        email: format!("{id}@example.com"),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
