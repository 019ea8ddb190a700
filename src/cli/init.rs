//! Init command implementation

use anyhow::{bail, Result};
use std::path::PathBuf;

use tunedle::config::Config;

/// Default configuration content for tunedle init
pub const DEFAULT_CONFIG: &str = r#"# Tunedle Configuration
# =====================
#
# Without [remote] credentials everything is stored locally in
# ~/.tunedle/tunedle.db and the bundled catalog is used.
# TUNEDLE_REMOTE_URL and TUNEDLE_REMOTE_KEY override the values below.

[remote]
url = ""
anon_key = ""
# Any remote call slower than this falls back to local storage
timeout_ms = 4000
enabled = true

[storage]
# db_path = "/path/to/tunedle.db"

[daily]
# "utc" or "local": which clock decides when a new challenge starts
day_boundary = "utc"
"#;

pub fn init_command(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Config::global_config_path);

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    println!("Created: {}", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.remote.timeout_ms, 4000);
        assert!(config.storage.db_path.is_none());
    }
}
