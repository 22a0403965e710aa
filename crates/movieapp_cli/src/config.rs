//! Environment-driven CLI configuration.
//!
//! # Invariants
//! - Unset variables fall back to documented defaults.
//! - Set but unparsable values are errors, never silently defaulted.

use movieapp_core::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "MOVIEAPP_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "MOVIEAPP_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MOVIEAPP_LOG_DIR";
pub const ENV_YEAR_MIN: &str = "MOVIEAPP_YEAR_MIN";
pub const ENV_COUNT_MIN: &str = "MOVIEAPP_COUNT_MIN";

const DEFAULT_DB_FILE_NAME: &str = "movieapp.sqlite3";

/// Resolved CLI settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<String>,
    /// Lower year bound of the per-year report.
    pub year_min: i16,
    /// Minimum movie count for a year to appear in the per-year report.
    pub count_min: i64,
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid value `{}` for {}", self.value, self.key)
    }
}

impl Error for ConfigError {}

impl CliConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            db_path: non_blank(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE_NAME)),
            log_level: non_blank(ENV_LOG_LEVEL)
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: non_blank(ENV_LOG_DIR),
            year_min: parse_or(ENV_YEAR_MIN, non_blank(ENV_YEAR_MIN), 0)?,
            count_min: parse_or(ENV_COUNT_MIN, non_blank(ENV_COUNT_MIN), 1)?,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError { key, value }),
    }
}
