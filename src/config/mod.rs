//! Configuration loading and management

mod io;
mod settings;

pub use settings::{DailySettings, DayBoundary, RemoteSettings, StorageSettings};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment override for the remote base URL
pub const ENV_REMOTE_URL: &str = "TUNEDLE_REMOTE_URL";
/// Environment override for the remote anonymous key
pub const ENV_REMOTE_KEY: &str = "TUNEDLE_REMOTE_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote store connection
    #[serde(default)]
    pub remote: RemoteSettings,

    /// Local durable store
    #[serde(default)]
    pub storage: StorageSettings,

    /// Daily challenge behaviour
    #[serde(default)]
    pub daily: DailySettings,
}

impl Config {
    /// Apply `TUNEDLE_REMOTE_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_REMOTE_URL).ok(),
            std::env::var(ENV_REMOTE_KEY).ok(),
        );
    }

    fn apply_overrides(&mut self, url: Option<String>, key: Option<String>) {
        if let Some(url) = url.filter(|v| !v.trim().is_empty()) {
            self.remote.url = url;
        }
        if let Some(key) = key.filter(|v| !v.trim().is_empty()) {
            self.remote.anon_key = key;
        }
    }

    /// Names of missing settings; an empty list means the remote is usable
    pub fn missing_remote_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.remote.url.trim().is_empty() {
            missing.push("remote.url");
        }
        if self.remote.anon_key.trim().is_empty() {
            missing.push("remote.anon_key");
        }
        missing
    }

    /// Whether the remote store should be used at all.
    ///
    /// Missing settings are reported and the engine runs local-only.
    pub fn validate(&self) -> bool {
        if !self.remote.enabled {
            return false;
        }
        let missing = self.missing_remote_settings();
        if !missing.is_empty() {
            warn!(?missing, "remote store not configured, running local-only");
            return false;
        }
        true
    }

    /// Path of the local SQLite database
    pub fn db_path(&self) -> PathBuf {
        self.storage
            .db_path
            .clone()
            .unwrap_or_else(|| Self::global_config_dir().join("tunedle.db"))
    }
}
