//! Catalog items and favorites

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable row identifier assigned by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(pub String);

impl CanonicalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A playable track together with the category (game) it belongs to.
///
/// Identity is the `(category, title)` pair. `canonical_id` is only known
/// once the item was loaded from the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub category: String,
    pub title: String,
    pub media_ref: String,
    #[serde(default = "default_generation")]
    pub generation: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<CanonicalId>,
}

fn default_generation() -> u32 {
    1
}

impl CatalogItem {
    pub fn key(&self) -> FavoriteKey {
        FavoriteKey::new(&self.category, &self.title)
    }
}

/// `(category, title)` pair used to key favorites
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FavoriteKey {
    pub category: String,
    pub title: String,
}

impl FavoriteKey {
    pub fn new(category: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for FavoriteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.title)
    }
}

/// A favorited track.
///
/// `canonical_id` is `None` when the track could not be resolved against the
/// catalog and is tracked by name pair only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRef {
    pub category: String,
    pub title: String,
    pub canonical_id: Option<CanonicalId>,
}

impl FavoriteRef {
    pub fn by_name(category: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            title: title.into(),
            canonical_id: None,
        }
    }

    pub fn with_id(mut self, id: CanonicalId) -> Self {
        self.canonical_id = Some(id);
        self
    }

    pub fn key(&self) -> FavoriteKey {
        FavoriteKey::new(&self.category, &self.title)
    }
}

impl From<&CatalogItem> for FavoriteRef {
    fn from(item: &CatalogItem) -> Self {
        Self {
            category: item.category.clone(),
            title: item.title.clone(),
            canonical_id: item.canonical_id.clone(),
        }
    }
}
