//! User defaults for the tracker.
//!
//! Read from `$MEALTRACK_CONFIG` if set, otherwise
//! `<config dir>/mealtrack/config.json`. Every field is optional:
//!
//! ```json
//! { "retention_days": 30, "recency_days": 14, "test": false, "file": "/home/me/food/diary" }
//! ```
//!
//! Command-line flags override these values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::cleaner::{RECENCY_DAYS, RETENTION_DAYS};

/// Environment variable overriding the config file location.
const CONFIG_ENV: &str = "MEALTRACK_CONFIG";

const CONFIG_DIR_NAME: &str = "mealtrack";
const CONFIG_FILE_NAME: &str = "config.json";

/// Largest accepted retention or recency window (about a century).
pub const MAX_WINDOW_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Days a ledger record survives before pruning.
    pub retention_days: i64,
    /// Days an eaten meal stays out of suggestions.
    pub recency_days: i64,
    /// Use the `test/` file root instead of `live/`.
    pub test: bool,
    /// Base path replacing the default `meals.json` naming.
    pub file: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            retention_days: RETENTION_DAYS,
            recency_days: RECENCY_DAYS,
            test: false,
            file: None,
        }
    }
}

impl TrackerConfig {
    /// Replace windows outside `1..=MAX_WINDOW_DAYS` with their defaults.
    pub fn validated(mut self) -> Self {
        let defaults = TrackerConfig::default();
        if !(1..=MAX_WINDOW_DAYS).contains(&self.retention_days) {
            warn!(days = self.retention_days, "retention_days out of range, using default");
            self.retention_days = defaults.retention_days;
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.recency_days) {
            warn!(days = self.recency_days, "recency_days out of range, using default");
            self.recency_days = defaults.recency_days;
        }
        self
    }
}

/// Location of the config file, if one can be determined.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the config, falling back to defaults if it is missing or unreadable.
pub fn load() -> TrackerConfig {
    match config_path() {
        Some(path) => load_from(&path),
        None => TrackerConfig::default(),
    }
}

pub fn load_from(path: &std::path::Path) -> TrackerConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            debug!(path = %path.display(), "no config file, using defaults");
            return TrackerConfig::default();
        }
    };

    match serde_json::from_str::<TrackerConfig>(&content) {
        Ok(config) => config.validated(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            TrackerConfig::default()
        }
    }
}
