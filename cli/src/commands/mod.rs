use std::path::Path;

use anyhow::Result;
use sportcal_core::{AuthState, PreferencesStore, SqlitePreferences};

use crate::{app_config::AppConfig, db::open_prefs, web_client::WebClient};

pub mod config;
pub mod favourites;
pub mod filters;
pub mod init;
pub mod login;
pub mod lookup;
pub mod preset;
pub mod search;

/// What every networked command needs: resolved config, the local
/// preferences and a client carrying the stored token
pub struct Session {
    pub config: AppConfig,
    pub prefs: SqlitePreferences,
    pub client: WebClient,
}

impl Session {
    pub fn open(config: AppConfig) -> Result<Self> {
        let prefs = open_prefs(Path::new(&config.db_path))?;
        let token = prefs.read()?.auth_token;
        let client = WebClient::new(&config.api_base_url, token)?
            .with_notifications_url(&config.notifications_base_url);

        Ok(Session {
            config,
            prefs,
            client,
        })
    }

    /// Presets live on the server, so saving them needs a signed-in account
    pub fn require_account(&self) -> Result<()> {
        match self.prefs.read()?.auth_state() {
            AuthState::Authenticated => Ok(()),
            AuthState::Guest | AuthState::Anonymous => {
                anyhow::bail!("Sign in with `sportcal login` to save presets")
            }
        }
    }
}
