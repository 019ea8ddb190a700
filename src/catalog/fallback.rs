//! Catalog bundled into the binary, used when the remote catalog is
//! unreachable or empty

use once_cell::sync::Lazy;

use super::Catalog;
use crate::error::{Error, Result};

/// Embedded fallback catalog (compile-time)
pub const FALLBACK_CATALOG_TOML: &str = include_str!("../../assets/catalog/fallback.toml");

static FALLBACK: Lazy<std::result::Result<Catalog, String>> = Lazy::new(|| {
    toml::from_str::<Catalog>(FALLBACK_CATALOG_TOML)
        .map(Catalog::without_empty_categories)
        .map_err(|e| e.to_string())
});

/// Parsed fallback catalog
pub fn fallback_catalog() -> Result<Catalog> {
    FALLBACK
        .as_ref()
        .map(Clone::clone)
        .map_err(|e| Error::Config(format!("bundled catalog is invalid: {e}")))
}
