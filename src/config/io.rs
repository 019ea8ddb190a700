//! Configuration file I/O operations

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::{info, warn};

use super::Config;

impl Config {
    /// Get the global config directory path (~/.tunedle/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tunedle")
    }

    /// Get the global config file path (~/.tunedle/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Load configuration from a file and apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.apply_env();

        Ok(config)
    }

    /// Write the config to `path`.
    ///
    /// Writers are serialized through `<path>.lock`; readers only ever see
    /// the old file or the complete new one.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let body = toml::to_string_pretty(self).context("Failed to serialize config")?;
        let _lock = ConfigLock::acquire(&path.with_extension("toml.lock"))?;
        replace_file(path, &format!("{SAVED_HEADER}{body}"))
    }

    /// Load `path`, or the global config, creating it with defaults if absent
    pub fn load_or_init(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::global_config_path);

        if !path.exists() {
            info!(path = %path.display(), "creating default config");
            Self::default().save_to_file(&path)?;
        }

        Self::from_file(&path)
    }
}

/// First line of every config file written by the program
const SAVED_HEADER: &str = "# tunedle configuration; TUNEDLE_* environment variables override these\n\n";

/// Exclusive lock on the config lock file, released on drop
struct ConfigLock {
    file: File,
}

impl ConfigLock {
    fn acquire(lock_path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("Failed to lock {}", lock_path.display()))?;
        Ok(Self { file })
    }
}

impl Drop for ConfigLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "failed to release config lock");
        }
    }
}

/// Write `content` next to `path` and rename it into place. The partial
/// file is removed if any step fails.
fn replace_file(path: &Path, content: &str) -> Result<()> {
    let staged = path.with_extension("toml.tmp");
    let written = (|| -> Result<()> {
        let mut file = File::create(&staged)
            .with_context(|| format!("Failed to create {}", staged.display()))?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&staged, path)
            .with_context(|| format!("Failed to replace config file: {}", path.display()))
    })();
    if written.is_err() {
        let _ = std::fs::remove_file(&staged);
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.remote.timeout_ms = 1500;
        config.storage.db_path = Some(dir.path().join("quiz.db"));
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.remote.timeout_ms, 1500);
        assert_eq!(loaded.db_path(), dir.path().join("quiz.db"));
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_saved_file_has_header_and_replaces_previous() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.save_to_file(&path).unwrap();
        config.remote.timeout_ms = 900;
        config.save_to_file(&path).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("# tunedle configuration"));
        assert_eq!(saved.matches("timeout_ms").count(), 1);
        assert!(saved.contains("timeout_ms = 900"));
    }

    #[test]
    fn test_failed_save_leaves_no_staged_file() {
        let dir = tempdir().unwrap();
        // a directory where the file should go makes the final rename fail
        let path = dir.path().join("config.toml");
        std::fs::create_dir(&path).unwrap();

        assert!(Config::default().save_to_file(&path).is_err());
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_load_or_init_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::load_or_init(Some(&path)).unwrap();
        assert!(path.exists());
        assert!(config.remote.enabled);
    }
}
