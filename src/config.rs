use crate::error::{ArchiveError, Result};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DB_PATH_VAR: &str = "ARCHIVE_DB_PATH";
pub const ROOT_VAR: &str = "ARCHIVE_ROOT";
pub const SLIDE_TABLE_VAR: &str = "ARCHIVE_SLIDE_TABLE";
pub const TIMEOUT_VAR: &str = "ARCHIVE_EXTRACT_TIMEOUT_SECS";
pub const CONCURRENCY_VAR: &str = "ARCHIVE_MAX_CONCURRENCY";
pub const HISTORY_VAR: &str = "ARCHIVE_HISTORY_CAPACITY";

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveConfig {
    pub db_path: String,
    pub archive_root: PathBuf,
    pub slide_table: Option<PathBuf>,
    pub extract_timeout_secs: u64,
    pub max_concurrency: usize,
    pub history_capacity: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            db_path: "./db".to_string(),
            archive_root: dirs::document_dir().unwrap_or_else(|| PathBuf::from(".")),
            slide_table: None,
            extract_timeout_secs: 30,
            max_concurrency: 4,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl ArchiveConfig {
    /// Defaults overridden by `ARCHIVE_*` variables from the process
    /// environment and a `.env` file, if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = ArchiveConfig::default();

        if let Some(path) = get(DB_PATH_VAR) {
            config.db_path = path;
        }
        if let Some(root) = get(ROOT_VAR) {
            config.archive_root = PathBuf::from(root);
        }
        config.slide_table = get(SLIDE_TABLE_VAR).map(PathBuf::from);
        if let Some(value) = get(TIMEOUT_VAR) {
            config.extract_timeout_secs = parse_var(TIMEOUT_VAR, &value)?;
        }
        if let Some(value) = get(CONCURRENCY_VAR) {
            config.max_concurrency = parse_var(CONCURRENCY_VAR, &value)?;
        }
        if let Some(value) = get(HISTORY_VAR) {
            config.history_capacity = parse_var(HISTORY_VAR, &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.extract_timeout_secs == 0 {
            return Err(ArchiveError::Config(format!("{TIMEOUT_VAR} must be at least 1")));
        }
        if self.max_concurrency == 0 {
            return Err(ArchiveError::Config(format!("{CONCURRENCY_VAR} must be at least 1")));
        }
        Ok(())
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ArchiveError::Config(format!("{key} has an invalid value: {value:?}")))
}
