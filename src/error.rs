//! Error taxonomy for the daily challenge engine

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the engine and its stores.
///
/// An unresolved catalog lookup is not an error; see
/// [`Resolution::Unresolved`](crate::matcher::Resolution::Unresolved).
#[derive(Error, Debug)]
pub enum Error {
    /// Neither the remote catalog nor the bundled fallback produced an item
    #[error("Catalog is empty")]
    EmptyCatalog,

    /// Remote store could not be reached or returned an unusable response
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// Daily challenge already completed (or being completed) for this date
    #[error("Daily challenge for {date} was already submitted")]
    DuplicateCompletionAttempt { date: NaiveDate },

    /// Remote operation that needs a signed-in user was called as guest
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Local durable store failure
    #[error("Local storage error: {0}")]
    LocalStorage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the failure can be absorbed by falling back to the local store
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_) | Self::NotAuthenticated)
    }
}
