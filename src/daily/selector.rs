//! Seeded selector
//!
//! Maps a calendar date to the same catalog position for every player.
//! The generator constants are part of the cross-implementation contract
//! and must not be tuned.

use chrono::{Datelike, NaiveDate};

use crate::catalog::Catalog;
use crate::domain::CatalogItem;
use crate::error::{Error, Result};

pub const MULTIPLIER: u64 = 9301;
pub const INCREMENT: u64 = 49297;
pub const MODULUS: u64 = 233_280;

/// Seed derived from the ISO date digits, e.g. 2024-03-01 -> 20240301
pub fn date_seed(date: NaiveDate) -> u64 {
    let year = date.year().max(0) as u64;
    year * 10_000 + u64::from(date.month()) * 100 + u64::from(date.day())
}

/// Linear congruential generator seeded from a date.
///
/// Each draw feeds the generator state forward, so the second draw of a day
/// depends on the first.
#[derive(Debug, Clone)]
pub struct DailyRng {
    state: u64,
}

impl DailyRng {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            state: date_seed(date),
        }
    }

    /// Advance the generator and return the new state in `0..MODULUS`
    pub fn next_state(&mut self) -> u64 {
        self.state = (self.state * MULTIPLIER + INCREMENT) % MODULUS;
        self.state
    }

    /// Draw an index in `0..len`.
    ///
    /// Scaling goes through `f64` (`state / MODULUS * len`, floored) so the
    /// result matches floating-point implementations exactly.
    pub fn next_index(&mut self, len: usize) -> Result<usize> {
        if len == 0 {
            return Err(Error::EmptyCatalog);
        }
        let fraction = self.next_state() as f64 / MODULUS as f64;
        let index = (fraction * len as f64).floor() as usize;
        Ok(index.min(len - 1))
    }
}

/// Single-draw selection: index into a catalog of `catalog_size` items
pub fn select(date: NaiveDate, catalog_size: usize) -> Result<usize> {
    DailyRng::for_date(date).next_index(catalog_size)
}

/// The two-dimensional pick of the day: category first, then track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPick {
    pub date: NaiveDate,
    pub category_index: usize,
    pub track_index: usize,
}

impl DailyPick {
    pub fn for_date(date: NaiveDate, catalog: &Catalog) -> Result<Self> {
        let mut rng = DailyRng::for_date(date);
        let category_index = rng.next_index(catalog.categories.len())?;
        let category = &catalog.categories[category_index];
        let track_index = rng.next_index(category.tracks.len())?;
        Ok(Self {
            date,
            category_index,
            track_index,
        })
    }

    /// Resolve the pick against the catalog it was computed from
    pub fn item(&self, catalog: &Catalog) -> Option<CatalogItem> {
        catalog.item_at(self.category_index, self.track_index)
    }
}
