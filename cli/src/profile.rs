use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROFILE_NAME: &str = "default";

const APP_DIR: &str = "sportcal";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Profile {
    pub db_path: Option<String>,
    pub api_base_url: Option<String>,
    pub notifications_base_url: Option<String>,
    /// Sent as `maxCount` when the member slider is at its maximum
    pub member_count_open_end: Option<u32>,
    pub page_size: Option<u32>,
}

impl Profile {
    pub fn from_path(profile: &Path) -> anyhow::Result<Option<Self>> {
        if !profile.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(profile).context("Failed to read profile file")?;

        let profile: Self = toml::from_str(&contents).context("Failed to deserialize profile")?;

        Ok(Some(profile))
    }

    pub fn save(&self, profile_path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string(self).context("Failed to serialize profile")?;

        if let Some(parent) = profile_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        std::fs::write(profile_path, content).context("Failed to write profile")?;

        Ok(())
    }
}

/// Get the XDG config directory, respecting XDG_CONFIG_HOME
fn get_config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join(APP_DIR)
    } else {
        directories::ProjectDirs::from("org", APP_DIR, APP_DIR)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Get the XDG data directory, respecting XDG_DATA_HOME
fn get_data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join(APP_DIR)
    } else {
        directories::ProjectDirs::from("org", APP_DIR, APP_DIR)
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

pub fn profile_name(arg_profile: &Option<String>) -> String {
    arg_profile
        .clone()
        .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string())
}

/// Get path to a profile's config file
pub fn get_profile_config_path(profile_name: &str) -> PathBuf {
    get_config_dir()
        .join("profiles")
        .join(format!("{}.toml", profile_name))
}

/// Get path to a profile's preferences database
pub fn get_profile_db_path(profile_name: &str) -> PathBuf {
    get_data_dir()
        .join("profiles")
        .join(profile_name)
        .join("prefs.db")
}
