//! Process configuration loaded from environment variables.
//!
//! # Responsibility
//! - Read `INKWELL_*` variables, after an optional `.env` file.
//! - Apply defaults and reject malformed values before anything starts.
//!
//! # Invariants
//! - The token secret is never empty and never logged.

use crate::auth::DEFAULT_TOKEN_TTL;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const DB_PATH_KEY: &str = "INKWELL_DB_PATH";
pub const LOG_LEVEL_KEY: &str = "INKWELL_LOG_LEVEL";
pub const LOG_DIR_KEY: &str = "INKWELL_LOG_DIR";
pub const TOKEN_SECRET_KEY: &str = "INKWELL_TOKEN_SECRET";
pub const TOKEN_TTL_MINUTES_KEY: &str = "INKWELL_TOKEN_TTL_MINUTES";
pub const MEDIA_ROOT_KEY: &str = "INKWELL_MEDIA_ROOT";
pub const MEDIA_BASE_URL_KEY: &str = "INKWELL_MEDIA_BASE_URL";

const DEFAULT_DB_PATH: &str = "inkwell.db";
const DEFAULT_MEDIA_ROOT: &str = "media";
const DEFAULT_MEDIA_BASE_URL: &str = "/media";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required setting `{key}`"),
            Self::Invalid { key, message } => write!(f, "invalid setting `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Settings shared by the library and the CLI.
#[derive(Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; `None` logs to stderr.
    pub log_dir: Option<String>,
    pub token_secret: String,
    pub token_ttl: Duration,
    pub media_root: PathBuf,
    pub media_base_url: String,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("db_path", &self.db_path)
            .field("log_level", &self.log_level)
            .field("log_dir", &self.log_dir)
            .field("token_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("media_root", &self.media_root)
            .field("media_base_url", &self.media_base_url)
            .finish()
    }
}

impl CoreConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let token_secret = read(TOKEN_SECRET_KEY).ok_or(ConfigError::Missing(TOKEN_SECRET_KEY))?;
        let token_ttl = match read(TOKEN_TTL_MINUTES_KEY) {
            Some(raw) => parse_ttl_minutes(&raw)?,
            None => DEFAULT_TOKEN_TTL,
        };

        Ok(Self {
            db_path: PathBuf::from(
                read(DB_PATH_KEY).unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            ),
            log_level: read(LOG_LEVEL_KEY)
                .unwrap_or_else(|| crate::logging::default_log_level().to_string()),
            log_dir: read(LOG_DIR_KEY),
            token_secret,
            token_ttl,
            media_root: PathBuf::from(
                read(MEDIA_ROOT_KEY).unwrap_or_else(|| DEFAULT_MEDIA_ROOT.to_string()),
            ),
            media_base_url: read(MEDIA_BASE_URL_KEY)
                .unwrap_or_else(|| DEFAULT_MEDIA_BASE_URL.to_string()),
        })
    }
}

fn parse_ttl_minutes(raw: &str) -> Result<Duration, ConfigError> {
    let minutes = raw.parse::<u64>().map_err(|err| ConfigError::Invalid {
        key: TOKEN_TTL_MINUTES_KEY,
        message: format!("`{raw}` is not a whole number of minutes: {err}"),
    })?;
    match minutes.checked_mul(60) {
        Some(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(ConfigError::Invalid {
            key: TOKEN_TTL_MINUTES_KEY,
            message: "must be a positive number of minutes".to_string(),
        }),
    }
}
