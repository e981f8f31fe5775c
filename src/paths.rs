//! Data file path resolution.
//!
//! Without a base path the files live at `./live/meals.json` and
//! `./live/suggestion_meals.json` (or under `./test/`). A base path such as
//! `~/food/diary` puts them at `~/food/live/diary.json` and
//! `~/food/live/suggestion_diary.json`.
//!
//! Pure path computation, no I/O.

use std::path::{Path, PathBuf};

/// Default data file name when no base path is given.
pub const DEFAULT_DATA_FILE: &str = "meals.json";

/// Prefix distinguishing the suggestion file from its ledger.
pub const SUGGESTION_PREFIX: &str = "suggestion_";

/// Name of the sibling directory holding backups.
pub const BACKUP_DIR: &str = "backup";

/// Prefix of every backup file name.
pub const BACKUP_PREFIX: &str = "backup_";

/// Which file root the tracker reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Live,
    Test,
}

impl Environment {
    pub fn from_live_flag(is_live: bool) -> Self {
        if is_live {
            Environment::Live
        } else {
            Environment::Test
        }
    }

    pub fn dir_name(self) -> &'static str {
        match self {
            Environment::Live => "live",
            Environment::Test => "test",
        }
    }
}

/// The pair of files one invocation works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub ledger: PathBuf,
    pub suggestions: PathBuf,
}

impl DataPaths {
    pub fn resolve(env: Environment, base: Option<&Path>) -> Self {
        Self {
            ledger: data_file_path(env, base),
            suggestions: suggestion_file_path(env, base),
        }
    }
}

/// Path of the meal ledger file.
pub fn data_file_path(env: Environment, base: Option<&Path>) -> PathBuf {
    match base {
        None => Path::new(".").join(env.dir_name()).join(DEFAULT_DATA_FILE),
        Some(base) => {
            let (dir, name) = split_base(base);
            dir.join(env.dir_name()).join(format!("{name}.json"))
        }
    }
}

/// Path of the suggestion file belonging to the same ledger.
pub fn suggestion_file_path(env: Environment, base: Option<&Path>) -> PathBuf {
    match base {
        None => Path::new(".")
            .join(env.dir_name())
            .join(format!("{SUGGESTION_PREFIX}{DEFAULT_DATA_FILE}")),
        Some(base) => {
            let (dir, name) = split_base(base);
            dir.join(env.dir_name())
                .join(format!("{SUGGESTION_PREFIX}{name}.json"))
        }
    }
}

/// `<dir(path)>/backup/backup_<basename(path)>`.
pub fn backup_path(path: &Path) -> PathBuf {
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(BACKUP_DIR).join(format!("{BACKUP_PREFIX}{name}"))
}

fn split_base(base: &Path) -> (PathBuf, String) {
    let dir = base.parent().map(Path::to_path_buf).unwrap_or_default();
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, name)
}
