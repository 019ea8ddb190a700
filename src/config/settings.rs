//! Settings sections

use std::path::PathBuf;

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Remote store connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the remote store (e.g. `https://<project>.example.co`)
    #[serde(default)]
    pub url: String,

    /// Anonymous API key sent with every request
    #[serde(default)]
    pub anon_key: String,

    /// Upper bound on any single remote call before falling back to local
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Set to false to force local-only mode
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_timeout_ms() -> u64 {
    4000
}

fn default_enabled() -> bool {
    true
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            timeout_ms: default_timeout_ms(),
            enabled: default_enabled(),
        }
    }
}

/// Local durable store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Override for the SQLite file (default `~/.tunedle/tunedle.db`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

/// Which clock decides when a new challenge day starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    #[default]
    Utc,
    Local,
}

impl DayBoundary {
    pub fn today(&self) -> NaiveDate {
        match self {
            Self::Utc => Utc::now().date_naive(),
            Self::Local => Local::now().date_naive(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailySettings {
    #[serde(default)]
    pub day_boundary: DayBoundary,
}
