//! Core domain types for tunedle

mod item;
mod profile;
mod stats;

pub use item::{CanonicalId, CatalogItem, FavoriteKey, FavoriteRef};
pub use profile::{PlayContext, Profile, UserIdentity};
pub use stats::PlayerStats;
