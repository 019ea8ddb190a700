//! Catalog accessor: remote `tracks` table first, bundled catalog second

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{fallback_catalog, Catalog};
use crate::error::{Error, Result};
use crate::remote::{tables, Query, RemoteStore};

/// Where a loaded catalog came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Remote,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct CatalogLoad {
    pub catalog: Catalog,
    pub source: CatalogSource,
}

/// Resolves the playable catalog.
///
/// No caching: every call may hit the remote again.
#[derive(Clone)]
pub struct CatalogAccessor {
    remote: Option<Arc<dyn RemoteStore>>,
    timeout: Duration,
    fallback: Catalog,
}

impl CatalogAccessor {
    pub fn new(remote: Option<Arc<dyn RemoteStore>>, timeout: Duration) -> Result<Self> {
        Ok(Self::with_fallback(remote, timeout, fallback_catalog()?))
    }

    /// Accessor with a custom fallback catalog
    pub fn with_fallback(
        remote: Option<Arc<dyn RemoteStore>>,
        timeout: Duration,
        fallback: Catalog,
    ) -> Self {
        Self {
            remote,
            timeout,
            fallback: fallback.without_empty_categories(),
        }
    }

    /// Full playable catalog.
    ///
    /// Any remote failure (error, timeout, malformed or zero rows) falls back
    /// to the bundled catalog. `EmptyCatalog` means both sources are empty.
    pub async fn load(&self) -> Result<CatalogLoad> {
        match self.load_remote().await {
            Ok(catalog) if !catalog.is_empty() => {
                debug!(tracks = catalog.len(), "loaded remote catalog");
                return Ok(CatalogLoad {
                    catalog,
                    source: CatalogSource::Remote,
                });
            }
            Ok(_) => debug!("remote catalog empty, using bundled catalog"),
            Err(e) => warn!(error = %e, "remote catalog unavailable, using bundled catalog"),
        }

        if self.fallback.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        Ok(CatalogLoad {
            catalog: self.fallback.clone(),
            source: CatalogSource::Fallback,
        })
    }

    pub async fn load_catalog(&self) -> Result<Catalog> {
        Ok(self.load().await?.catalog)
    }

    async fn load_remote(&self) -> Result<Catalog> {
        let Some(remote) = &self.remote else {
            return Ok(Catalog::default());
        };
        let rows = tokio::time::timeout(self.timeout, remote.select(&Query::from(tables::TRACKS)))
            .await
            .map_err(|_| Error::RemoteUnavailable("catalog request timed out".to_string()))??;

        let items = rows.iter().filter_map(tables::track_from_row);
        Ok(Catalog::from_items(items).without_empty_categories())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Track};
    use crate::remote::MemoryRemote;

    fn small_catalog() -> Catalog {
        Catalog {
            categories: vec![Category {
                name: "Pokemon Red Blue".into(),
                generation: 1,
                tracks: vec![Track {
                    title: "Route 1 Theme".into(),
                    media_ref: "rb/route1.mp3".into(),
                    canonical_id: None,
                }],
            }],
        }
    }

    fn accessor_for(remote: Arc<MemoryRemote>, timeout_ms: u64) -> CatalogAccessor {
        let remote: Arc<dyn RemoteStore> = remote;
        CatalogAccessor::new(Some(remote), Duration::from_millis(timeout_ms)).unwrap()
    }

    #[tokio::test]
    async fn test_remote_catalog_preferred() {
        let remote = Arc::new(MemoryRemote::with_catalog(&small_catalog()));
        let accessor = accessor_for(remote, 1000);
        let load = accessor.load().await.unwrap();
        assert_eq!(load.source, CatalogSource::Remote);
        assert_eq!(load.catalog.category_names(), vec!["Pokemon Red Blue"]);
        assert!(load.catalog.categories[0].tracks[0].canonical_id.is_some());
    }

    #[tokio::test]
    async fn test_offline_remote_falls_back() {
        let remote = Arc::new(MemoryRemote::with_catalog(&small_catalog()));
        remote.set_online(false);
        let accessor = accessor_for(remote, 1000);
        let load = accessor.load().await.unwrap();
        assert_eq!(load.source, CatalogSource::Fallback);
        assert!(!load.catalog.is_empty());
    }

    #[tokio::test]
    async fn test_zero_rows_falls_back() {
        let remote = Arc::new(MemoryRemote::new());
        let accessor = accessor_for(remote, 1000);
        assert_eq!(accessor.load().await.unwrap().source, CatalogSource::Fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_remote_times_out_to_fallback() {
        let remote = Arc::new(MemoryRemote::with_catalog(&small_catalog()));
        remote.set_latency(Some(Duration::from_secs(30)));
        let accessor = accessor_for(remote, 200);
        assert_eq!(accessor.load().await.unwrap().source, CatalogSource::Fallback);
    }

    #[tokio::test]
    async fn test_both_sources_empty_is_error() {
        let accessor =
            CatalogAccessor::with_fallback(None, Duration::from_secs(1), Catalog::default());
        assert!(matches!(accessor.load().await, Err(Error::EmptyCatalog)));
    }
}
