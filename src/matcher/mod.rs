//! Resolves a human-entered `(title, category)` pair to a canonical catalog row
//!
//! Tiers are tried in order; the first tier whose query returns rows wins and
//! its first row (store default ordering) is the answer. Duplicate rows are
//! a data issue and simply resolve to the first one.

mod tiers;

pub use tiers::{strip_annotations, title_stem, CategoryTokenTier, ExactTier, FuzzyNameTier, MatchTier};

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::domain::CanonicalId;
use crate::error::{Error, Result};
use crate::remote::{tables, RemoteStore};

/// Outcome of a lookup. `Unresolved` is a valid result, not an error: the
/// caller tracks the item by name pair only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Canonical { id: CanonicalId, tier: &'static str },
    Unresolved,
}

impl Resolution {
    pub fn canonical_id(&self) -> Option<&CanonicalId> {
        match self {
            Self::Canonical { id, .. } => Some(id),
            Self::Unresolved => None,
        }
    }

    pub fn into_canonical_id(self) -> Option<CanonicalId> {
        match self {
            Self::Canonical { id, .. } => Some(id),
            Self::Unresolved => None,
        }
    }
}

/// Ordered chain of match tiers over the remote `tracks` table
#[derive(Clone)]
pub struct Matcher {
    remote: Arc<dyn RemoteStore>,
    tiers: Arc<Vec<Box<dyn MatchTier>>>,
    timeout: Duration,
}

impl Matcher {
    /// Matcher with the standard exact -> fuzzy-name -> category-token cascade
    pub fn new(remote: Arc<dyn RemoteStore>, timeout: Duration) -> Self {
        Self::with_tiers(
            remote,
            timeout,
            vec![
                Box::new(ExactTier),
                Box::new(FuzzyNameTier),
                Box::new(CategoryTokenTier),
            ],
        )
    }

    pub fn with_tiers(
        remote: Arc<dyn RemoteStore>,
        timeout: Duration,
        tiers: Vec<Box<dyn MatchTier>>,
    ) -> Self {
        Self {
            remote,
            tiers: Arc::new(tiers),
            timeout,
        }
    }

    /// Run the cascade. Remote failures propagate as `RemoteUnavailable`.
    pub async fn resolve(&self, title: &str, category: &str) -> Result<Resolution> {
        for tier in self.tiers.iter() {
            let Some(query) = tier.query(title, category) else {
                continue;
            };
            let rows = tokio::time::timeout(self.timeout, self.remote.select(&query))
                .await
                .map_err(|_| Error::RemoteUnavailable(format!("{} lookup timed out", tier.name())))??;

            if let Some(id) = rows.iter().find_map(tables::row_id) {
                debug!(title, category, tier = tier.name(), %id, "resolved track");
                return Ok(Resolution::Canonical {
                    id,
                    tier: tier.name(),
                });
            }
        }
        debug!(title, category, "track not found in catalog");
        Ok(Resolution::Unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::domain::CatalogItem;
    use crate::remote::MemoryRemote;

    fn item(category: &str, title: &str) -> CatalogItem {
        CatalogItem {
            category: category.into(),
            title: title.into(),
            media_ref: String::new(),
            generation: 1,
            canonical_id: None,
        }
    }

    fn matcher_over(items: Vec<CatalogItem>) -> (Matcher, Arc<MemoryRemote>) {
        let remote = Arc::new(MemoryRemote::with_catalog(&Catalog::from_items(items)));
        let store: Arc<dyn RemoteStore> = remote.clone();
        (Matcher::new(store, Duration::from_secs(1)), remote)
    }

    fn id_of(remote: &MemoryRemote, title: &str) -> CanonicalId {
        remote
            .rows(tables::TRACKS)
            .iter()
            .find(|r| r["name"] == title)
            .and_then(tables::row_id)
            .unwrap()
    }

    #[tokio::test]
    async fn test_exact_tier_wins_first() {
        let (matcher, remote) = matcher_over(vec![item("Pokemon Red Blue", "Route 1 Theme")]);
        let res = matcher.resolve("Route 1 Theme", "Pokemon Red Blue").await.unwrap();
        assert_eq!(
            res,
            Resolution::Canonical {
                id: id_of(&remote, "Route 1 Theme"),
                tier: "exact"
            }
        );
    }

    #[tokio::test]
    async fn test_annotated_title_resolves_via_fuzzy_name() {
        let (matcher, remote) = matcher_over(vec![item("Pokemon Red Blue", "Route 1 Theme")]);
        let res = matcher
            .resolve("Route 1 Theme (Remix)", "Pokemon Red Blue")
            .await
            .unwrap();
        assert_eq!(
            res,
            Resolution::Canonical {
                id: id_of(&remote, "Route 1 Theme"),
                tier: "fuzzy-name"
            }
        );
    }

    #[tokio::test]
    async fn test_category_token_tier_matches_partial_game_name() {
        let (matcher, remote) =
            matcher_over(vec![item("Pokemon Fire Red Leaf Green", "Lavender Town")]);
        let res = matcher
            .resolve("Lavender Town (Remastered)", "Pokemon Red Blue")
            .await
            .unwrap();
        assert_eq!(res.canonical_id(), Some(&id_of(&remote, "Lavender Town")));
        assert!(matches!(res, Resolution::Canonical { tier: "category-token", .. }));
    }

    #[tokio::test]
    async fn test_duplicates_resolve_to_first_row() {
        let (matcher, remote) = matcher_over(vec![
            item("Pokemon X Y", "Lumiose City"),
            item("Pokemon X Y", "Lumiose City"),
        ]);
        let first = tables::row_id(&remote.rows(tables::TRACKS)[0]).unwrap();
        let res = matcher.resolve("Lumiose City", "Pokemon X Y").await.unwrap();
        assert_eq!(res.canonical_id(), Some(&first));
    }

    #[tokio::test]
    async fn test_unknown_track_is_unresolved() {
        let (matcher, _) = matcher_over(vec![item("Pokemon X Y", "Lumiose City")]);
        let res = matcher.resolve("Snowbelle City", "Pokemon Sun Moon").await.unwrap();
        assert_eq!(res, Resolution::Unresolved);
    }

    #[tokio::test]
    async fn test_offline_remote_is_an_error_not_unresolved() {
        let (matcher, remote) = matcher_over(vec![item("Pokemon X Y", "Lumiose City")]);
        remote.set_online(false);
        let err = matcher.resolve("Lumiose City", "Pokemon X Y").await.unwrap_err();
        assert!(matches!(err, Error::RemoteUnavailable(_)));
    }
}
