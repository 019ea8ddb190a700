//! CLI command implementations

pub mod daily;
pub mod favorite;
pub mod init;
pub mod session;
pub mod stats;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::debug;

use tunedle::config::Config;
use tunedle::remote::{RemoteStore, RestRemote, RestSession};
use tunedle::{PlayContext, QuizEngine};

/// Everything a command needs: config, engine and the HTTP backend if any
pub struct App {
    pub config: Config,
    pub engine: Arc<QuizEngine>,
    pub rest: Option<Arc<RestRemote>>,
}

impl App {
    /// Load config, open the engine and restore the remembered identity
    pub async fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_init(config_path)?;
        let rest = config
            .validate()
            .then(|| Arc::new(RestRemote::new(&config.remote)));
        let remote = rest.clone().map(|r| r as Arc<dyn RemoteStore>);

        let engine = QuizEngine::from_config(&config, remote)
            .with_context(|| format!("Failed to open database: {}", config.db_path().display()))?;

        if let Some(saved) = engine.store().local().saved_session()? {
            debug!(user = %saved.user.id, "restoring saved session");
            if let (Some(rest), Some(token)) = (&rest, saved.access_token) {
                rest.restore_session(RestSession {
                    user: saved.user.clone(),
                    access_token: token,
                });
            }
            engine.on_auth_change(Some(saved.user)).await?;
        }

        Ok(Self {
            config,
            engine: Arc::new(engine),
            rest,
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.config.daily.day_boundary.today()
    }

    pub fn context(&self) -> PlayContext {
        self.engine.context(self.today())
    }
}
