//! In-process remote store
//!
//! Behaves like the HTTP backend (default ordering is insertion order, every
//! inserted row gets an `id`) and can be switched offline or slowed down to
//! exercise the fallback paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::watch;
use tracing::debug;

use super::tables::{self, ID};
use super::{Query, RemoteStore, Row};
use crate::catalog::Catalog;
use crate::domain::UserIdentity;
use crate::error::{Error, Result};

pub struct MemoryRemote {
    tables: Mutex<BTreeMap<String, Vec<Row>>>,
    online: AtomicBool,
    latency: Mutex<Option<Duration>>,
    calls: AtomicUsize,
    auth: watch::Sender<Option<UserIdentity>>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        let (auth, _) = watch::channel(None);
        Self {
            tables: Mutex::new(BTreeMap::new()),
            online: AtomicBool::new(true),
            latency: Mutex::new(None),
            calls: AtomicUsize::new(0),
            auth,
        }
    }

    /// Store pre-populated with every track of `catalog`
    pub fn with_catalog(catalog: &Catalog) -> Self {
        let remote = Self::new();
        remote.seed_catalog(catalog);
        remote
    }

    pub fn seed_catalog(&self, catalog: &Catalog) {
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let rows = tables.entry(tables::TRACKS.to_string()).or_default();
        for item in catalog.items() {
            let mut row = tables::track_to_row(&item);
            row.entry(ID.to_string())
                .or_insert_with(|| json!(uuid::Uuid::new_v4().to_string()));
            rows.push(row);
        }
    }

    /// Simulate losing (or regaining) connectivity
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Delay every call by `latency` before answering
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    pub fn sign_in(&self, user: UserIdentity) {
        self.auth.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        self.auth.send_replace(None);
    }

    /// Snapshot of a table's rows
    pub fn rows(&self, table: &str) -> Vec<Row> {
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.get(table).cloned().unwrap_or_default()
    }

    /// Number of data operations attempted so far
    #[cfg(test)]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, op: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if !self.online.load(Ordering::SeqCst) {
            debug!(op, "memory remote offline");
            return Err(Error::RemoteUnavailable(format!("{op}: store offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn select(&self, query: &Query) -> Result<Vec<Row>> {
        self.enter("select").await?;
        let tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let rows = tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)))
            .into_iter()
            .flatten()
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row> {
        self.enter("insert").await?;
        row.entry(ID.to_string())
            .or_insert_with(|| json!(uuid::Uuid::new_v4().to_string()));
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, query: &Query, patch: Row) -> Result<Vec<Row>> {
        self.enter("update").await?;
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(&query.table) {
            for row in rows.iter_mut().filter(|r| query.matches(r)) {
                for (column, value) in &patch {
                    row.insert(column.clone(), value.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> Result<usize> {
        self.enter("delete").await?;
        let mut tables = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        let Some(rows) = tables.get_mut(&query.table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !query.matches(r));
        Ok(before - rows.len())
    }

    async fn current_user(&self) -> Result<Option<UserIdentity>> {
        Ok(self.auth.borrow().clone())
    }

    fn subscribe_auth(&self) -> watch::Receiver<Option<UserIdentity>> {
        self.auth.subscribe()
    }
}
