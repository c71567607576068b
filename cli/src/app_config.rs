use std::path::Path;

use serde::Serialize;
use sportcal_core::QueryOptions;

use crate::{
    args::ConfigArgs,
    profile::{self, Profile},
};

pub const DEFAULT_API_BASE_URL: &str = "http://90.156.208.88:8080/bryansk/api";
pub const DEFAULT_NOTIFICATIONS_BASE_URL: &str = "http://94.228.127.47:8084/api/v1";

#[derive(Debug, Serialize)]
pub struct AppConfig {
    pub profile_name: String,
    pub profile_path: String,
    pub db_path: String,
    pub api_base_url: String,
    pub notifications_base_url: String,
    pub member_count_open_end: u32,
    pub page_size: u32,
    pub profile_exists: bool,
}

impl AppConfig {
    pub fn from_args(args: ConfigArgs, profile_path: &Path, profile: Option<&Profile>) -> Self {
        let profile_name = profile::profile_name(&args.profile);
        let defaults = QueryOptions::default();

        let db_path = args
            .db_path
            .or_else(|| profile.and_then(|p| p.db_path.clone()))
            .unwrap_or_else(|| {
                profile::get_profile_db_path(&profile_name)
                    .to_string_lossy()
                    .into_owned()
            });

        let api_base_url = args
            .api_url
            .or_else(|| profile.and_then(|p| p.api_base_url.clone()))
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let notifications_base_url = args
            .notifications_url
            .or_else(|| profile.and_then(|p| p.notifications_base_url.clone()))
            .unwrap_or_else(|| DEFAULT_NOTIFICATIONS_BASE_URL.to_string());

        AppConfig {
            profile_exists: profile.is_some(),
            profile_path: profile_path.to_string_lossy().into_owned(),
            db_path,
            api_base_url,
            notifications_base_url,
            member_count_open_end: profile
                .and_then(|p| p.member_count_open_end)
                .unwrap_or(defaults.member_count_open_end),
            page_size: profile
                .and_then(|p| p.page_size)
                .unwrap_or(defaults.page_size),
            profile_name,
        }
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            page_size: self.page_size,
            member_count_open_end: self.member_count_open_end,
        }
    }

    /// The profile as `init` writes it: every resolved value made explicit
    pub fn to_profile(&self) -> Profile {
        Profile {
            db_path: Some(self.db_path.clone()),
            api_base_url: Some(self.api_base_url.clone()),
            notifications_base_url: Some(self.notifications_base_url.clone()),
            member_count_open_end: Some(self.member_count_open_end),
            page_size: Some(self.page_size),
        }
    }
}
