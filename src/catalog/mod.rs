//! Catalog of playable tracks grouped by game
//!
//! The daily pick indexes categories first and tracks second, so category
//! and track order are significant and preserved from the source.

mod accessor;
mod fallback;

pub use accessor::{CatalogAccessor, CatalogLoad, CatalogSource};
pub use fallback::{fallback_catalog, FALLBACK_CATALOG_TOML};

use serde::{Deserialize, Serialize};

use crate::domain::{CanonicalId, CatalogItem};

/// A single track within a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub title: String,
    pub media_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<CanonicalId>,
}

/// A game and its tracks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default = "default_generation")]
    pub generation: u32,
    #[serde(default, rename = "track")]
    pub tracks: Vec<Track>,
}

fn default_generation() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "category")]
    pub categories: Vec<Category>,
}

impl Catalog {
    /// Group flat items by category, in order of first appearance
    pub fn from_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let mut catalog = Catalog::default();
        for item in items {
            let track = Track {
                title: item.title,
                media_ref: item.media_ref,
                canonical_id: item.canonical_id,
            };
            match catalog
                .categories
                .iter_mut()
                .find(|c| c.name == item.category)
            {
                Some(category) => category.tracks.push(track),
                None => catalog.categories.push(Category {
                    name: item.category,
                    generation: item.generation,
                    tracks: vec![track],
                }),
            }
        }
        catalog
    }

    /// Drop empty categories; a catalog is playable iff this leaves something
    pub fn without_empty_categories(mut self) -> Self {
        self.categories.retain(|c| !c.tracks.is_empty());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|c| c.tracks.is_empty())
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.tracks.len()).sum()
    }

    pub fn item_at(&self, category_index: usize, track_index: usize) -> Option<CatalogItem> {
        let category = self.categories.get(category_index)?;
        let track = category.tracks.get(track_index)?;
        Some(CatalogItem {
            category: category.name.clone(),
            title: track.title.clone(),
            media_ref: track.media_ref.clone(),
            generation: category.generation,
            canonical_id: track.canonical_id.clone(),
        })
    }

    /// Flattened view, category-major
    pub fn items(&self) -> Vec<CatalogItem> {
        self.categories
            .iter()
            .enumerate()
            .flat_map(|(ci, category)| {
                (0..category.tracks.len()).filter_map(move |ti| self.item_at(ci, ti))
            })
            .collect()
    }

    /// Answer options shown to the player, in catalog order
    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    pub fn find(&self, category: &str, title: &str) -> Option<CatalogItem> {
        let ci = self.categories.iter().position(|c| c.name == category)?;
        let ti = self.categories[ci]
            .tracks
            .iter()
            .position(|t| t.title == title)?;
        self.item_at(ci, ti)
    }

    /// Generation tag of a category; unknown categories count as generation 1
    pub fn generation_of(&self, category: &str) -> u32 {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.generation)
            .unwrap_or(1)
    }
}
