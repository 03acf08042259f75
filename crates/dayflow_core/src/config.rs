//! Runtime configuration read from environment variables.
//!
//! # Invariants
//! - Values are trimmed; empty values count as unset.
//! - Malformed numeric values are rejected instead of silently ignored.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "DAYFLOW_DB_PATH";
pub const ENV_LOG_DIR: &str = "DAYFLOW_LOG_DIR";
pub const ENV_LOG_LEVEL: &str = "DAYFLOW_LOG_LEVEL";
pub const ENV_STORAGE_QUOTA_BYTES: &str = "DAYFLOW_STORAGE_QUOTA_BYTES";
pub const ENV_GEMINI_API_KEY: &str = "DAYFLOW_GEMINI_API_KEY";
pub const ENV_GEMINI_API_KEY_FALLBACK: &str = "GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "DAYFLOW_GEMINI_MODEL";
pub const ENV_GENERATION_TIMEOUT_SECS: &str = "DAYFLOW_GENERATION_TIMEOUT_SECS";

const DB_FILE_NAME: &str = "dayflow.sqlite3";
/// Matches the usual 5 MiB browser storage allowance.
pub const DEFAULT_STORAGE_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { var: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { var, value } => {
                write!(f, "`{var}` must be a non-negative integer, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayflowConfig {
    pub db_path: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub log_level: String,
    /// `None` disables the byte quota.
    pub storage_quota_bytes: Option<u64>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub generation_timeout: Option<Duration>,
}

impl DayflowConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let storage_quota_bytes = match get(ENV_STORAGE_QUOTA_BYTES) {
            None => Some(DEFAULT_STORAGE_QUOTA_BYTES),
            Some(raw) => match parse_u64(ENV_STORAGE_QUOTA_BYTES, &raw)? {
                0 => None,
                bytes => Some(bytes),
            },
        };
        let generation_timeout = get(ENV_GENERATION_TIMEOUT_SECS)
            .map(|raw| parse_u64(ENV_GENERATION_TIMEOUT_SECS, &raw))
            .transpose()?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Ok(Self {
            db_path: get(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME)),
            log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            storage_quota_bytes,
            gemini_api_key: get(ENV_GEMINI_API_KEY).or_else(|| get(ENV_GEMINI_API_KEY_FALLBACK)),
            gemini_model: get(ENV_GEMINI_MODEL),
            generation_timeout,
        })
    }
}

fn parse_u64(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: raw.to_string(),
    })
}
