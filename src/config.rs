//! Runtime configuration read from the environment
//!
//! A `.env` file in the working directory is loaded first if present.

use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::data::upstream::{ScheduleClient, DEFAULT_TIMEOUT};
use crate::data::FetchError;
use crate::limiter::DEFAULT_COOLDOWN_SECS;

/// Errors in the runtime configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TIMETABLE_BASE_URL is not set (or pass --base-url)")]
    MissingBaseUrl,

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error(transparent)]
    Client(#[from] FetchError),
}

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Provider root; schedules live under `/schedule/lessons`
    pub base_url: Option<String>,
    /// Explicit directory endpoint, defaults to `{base_url}/schedule/names`
    pub directory_url: Option<String>,
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
    pub timeout: Duration,
    pub cooldown_secs: i64,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let dirs = ProjectDirs::from("", "", "timetable");

        let cache_dir = get("TIMETABLE_CACHE_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs.as_ref().map(|d| d.cache_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(".timetable/cache"));
        let data_dir = get("TIMETABLE_DATA_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs.as_ref().map(|d| d.data_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from(".timetable/data"));

        let timeout = match get("TIMETABLE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("TIMETABLE_TIMEOUT_SECS", &raw)?),
            None => DEFAULT_TIMEOUT,
        };
        let cooldown_secs = match get("TIMETABLE_COOLDOWN_SECS") {
            Some(raw) => parse_number("TIMETABLE_COOLDOWN_SECS", &raw)?,
            None => DEFAULT_COOLDOWN_SECS,
        };

        Ok(Self {
            base_url: get("TIMETABLE_BASE_URL"),
            directory_url: get("TIMETABLE_DIRECTORY_URL"),
            cache_dir,
            data_dir,
            timeout,
            cooldown_secs,
        })
    }

    /// Overrides the provider root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn base(&self) -> Result<&str, ConfigError> {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or(ConfigError::MissingBaseUrl)
    }

    pub fn lessons_url(&self) -> Result<String, ConfigError> {
        Ok(format!("{}/schedule/lessons", self.base()?))
    }

    pub fn directory_url(&self) -> Result<String, ConfigError> {
        match &self.directory_url {
            Some(url) => Ok(url.clone()),
            None => Ok(format!("{}/schedule/names", self.base()?)),
        }
    }

    pub fn selections_path(&self) -> PathBuf {
        self.data_dir.join("selections.json")
    }

    pub fn directory_path(&self) -> PathBuf {
        self.data_dir.join("directory.json")
    }

    /// HTTP client for the configured provider
    pub fn client(&self) -> Result<ScheduleClient, ConfigError> {
        Ok(ScheduleClient::new(
            &self.lessons_url()?,
            &self.directory_url()?,
            self.timeout,
        )?)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
    })
}
