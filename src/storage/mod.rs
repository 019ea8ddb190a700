//! Player state persistence
//!
//! One [`ProfileStore`] interface, two backings and a decorator:
//!
//! ```text
//!              ReconcilingStore
//!          (fallback + mirror policy)
//!             ┌────────┴────────┐
//!             ▼                 ▼
//!    RemoteProfileStore   LocalProfileStore
//!     (remote tables)     (~/.tunedle/tunedle.db)
//! ```

pub mod db;
mod local;
mod reconcile;
mod remote;

pub use db::LocalDb;
pub use local::{FavoriteSync, LocalProfileStore, SavedSession};
pub use reconcile::{Reconciled, ReconcilingStore, StoreSource};
pub use remote::RemoteProfileStore;

use async_trait::async_trait;

use crate::domain::{FavoriteRef, PlayerStats, Profile};
use crate::error::Result;

/// Favorites and stats of one profile
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_favorites(&self, profile: &Profile) -> Result<Vec<FavoriteRef>>;

    /// Store a favorite and return it as stored (possibly with a resolved id)
    async fn add_favorite(&self, profile: &Profile, favorite: &FavoriteRef) -> Result<FavoriteRef>;

    async fn remove_favorite(&self, profile: &Profile, favorite: &FavoriteRef) -> Result<()>;

    async fn load_stats(&self, profile: &Profile) -> Result<PlayerStats>;

    /// Overwrite the stats counters and return them as stored
    async fn save_stats(&self, profile: &Profile, stats: &PlayerStats) -> Result<PlayerStats>;
}
