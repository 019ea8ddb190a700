//! Remote relational store contract
//!
//! The engine only needs table-scoped `select`/`insert`/`update`/`delete`
//! with equality, case-insensitive substring and `OR` filters, plus a
//! current-user primitive with change notification.
//!
//! Two backends ship with the crate:
//! - [`MemoryRemote`]: in-process tables, used offline and in tests
//! - [`RestRemote`]: PostgREST-style HTTP API with password sign-in

mod memory;
mod query;
mod rest;
pub mod tables;

pub use memory::MemoryRemote;
pub use query::{value_text, Filter, Query};
pub use rest::{RestRemote, RestSession};

use async_trait::async_trait;
use tokio::sync::watch;

use crate::domain::UserIdentity;
use crate::error::Result;

/// A single row, keyed by column name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Remote store operations consumed by the engine.
///
/// Every failure (transport, status, malformed body) is reported as
/// [`Error::RemoteUnavailable`](crate::Error::RemoteUnavailable).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Rows matching all filters, in the store's default ordering
    async fn select(&self, query: &Query) -> Result<Vec<Row>>;

    /// Insert a row and return it as stored (with its identifier)
    async fn insert(&self, table: &str, row: Row) -> Result<Row>;

    /// Apply `patch` to matching rows, returning the updated rows
    async fn update(&self, query: &Query, patch: Row) -> Result<Vec<Row>>;

    /// Delete matching rows, returning how many were removed
    async fn delete(&self, query: &Query) -> Result<usize>;

    /// Currently signed-in user, if any
    async fn current_user(&self) -> Result<Option<UserIdentity>>;

    /// Identity change notifications
    fn subscribe_auth(&self) -> watch::Receiver<Option<UserIdentity>>;
}
