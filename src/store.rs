//! JSON list store with single-generation backups.
//!
//! Each data file is a pretty-printed JSON array. Before a file is
//! overwritten its previous bytes are copied to
//! `<dir>/backup/backup_<name>`, replacing the prior backup.
//!
//! Saves are best-effort: a failed backup or write is logged and returned
//! as a [`StoreWarning`] instead of failing the caller. Writes go straight
//! to the target file (no temp-file rename), so a failed write may leave
//! the file truncated.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{MealError, Result};
use crate::lock::LockGuard;
use crate::paths::{backup_path, BACKUP_DIR};

/// Number of attempts made to take a data file's lock.
const LOCK_RETRIES: u32 = 40;

/// Delay between lock attempts.
const LOCK_RETRY_MS: u64 = 50;

/// A non-fatal problem encountered while saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWarning {
    /// The previous contents could not be copied to the backup file.
    BackupFailed { backup: PathBuf, reason: String },
    /// The data file (or its directory) could not be written.
    WriteFailed { path: PathBuf, reason: String },
}

impl fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreWarning::BackupFailed { backup, reason } => {
                write!(f, "Warning could not create backup: {reason}, {}", backup.display())
            }
            StoreWarning::WriteFailed { path, reason } => {
                write!(f, "Error saving data to {}: {reason}", path.display())
            }
        }
    }
}

/// Outcome of a [`save`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub warnings: Vec<StoreWarning>,
}

impl SaveReport {
    /// True if the data file itself was written.
    pub fn written(&self) -> bool {
        !self
            .warnings
            .iter()
            .any(|w| matches!(w, StoreWarning::WriteFailed { .. }))
    }
}

/// Read a JSON array of records, returning an empty list if the file doesn't exist.
///
/// Returns [`MealError::Corrupted`] if the file exists but isn't a JSON
/// array of `T`. An empty file counts as corrupted.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "data file missing, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(MealError::io(path, e)),
    };

    let records: Vec<T> = serde_json::from_slice(&bytes).map_err(|source| MealError::Corrupted {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), count = records.len(), "loaded records");
    Ok(records)
}

/// Back up the current file, then overwrite it with `records`.
pub fn save<T: Serialize>(records: &[T], path: &Path) -> SaveReport {
    let mut report = SaveReport::default();

    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let backup_dir = dir.join(BACKUP_DIR);
    if let Err(e) = ensure_dir(&backup_dir) {
        let warning = StoreWarning::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        warn!("{warning}");
        report.warnings.push(warning);
        return report;
    }

    if path.exists() {
        let backup = backup_path(path);
        if let Err(e) = std::fs::copy(path, &backup) {
            let warning = StoreWarning::BackupFailed {
                backup,
                reason: e.to_string(),
            };
            warn!("{warning}");
            report.warnings.push(warning);
        } else {
            debug!(backup = %backup.display(), "backup written");
        }
    }

    if let Err(e) = write_pretty(path, records) {
        let warning = StoreWarning::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        warn!("{warning}");
        report.warnings.push(warning);
    } else {
        debug!(path = %path.display(), count = records.len(), "saved records");
    }

    report
}

/// Serialize as 2-space indented JSON and overwrite `path` directly.
pub fn write_pretty<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| MealError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    std::fs::write(path, json).map_err(|e| MealError::io(path, e))
}

/// Load-modify-save under the data file's lock.
///
/// 1. Acquires `<dir>/.<name>.lock`
/// 2. Loads the current records (aborting on corruption)
/// 3. Applies `f`, which decides whether anything needs saving
/// 4. Saves if `f` returned `Change::Save`, passing its value back
/// 5. Releases the lock (via RAII guard drop)
pub fn update<T, R, F>(path: &Path, f: F) -> Result<(R, Option<SaveReport>)>
where
    T: DeserializeOwned + Serialize,
    F: FnOnce(&mut Vec<T>) -> Result<Change<R>>,
{
    let _guard = lock(path)?;

    let mut records: Vec<T> = load(path)?;
    match f(&mut records)? {
        Change::Save(value) => {
            let report = save(&records, path);
            Ok((value, Some(report)))
        }
        Change::Keep(value) => Ok((value, None)),
    }
}

/// Take the advisory lock guarding `path` for one write cycle.
pub fn lock(path: &Path) -> Result<LockGuard> {
    crate::lock::acquire(&crate::lock::lock_path(path), LOCK_RETRIES, LOCK_RETRY_MS)
}

/// Whether an [`update`] closure modified the records.
#[derive(Debug)]
pub enum Change<R> {
    Save(R),
    Keep(R),
}

fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MealRecord, SuggestionRecord};

    #[test]
    fn test_load_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nonexistent.json");

        let records: Vec<MealRecord> = load(&path).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_load_corrupted_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("meals.json");
        std::fs::write(&path, "[{\"content\": ").unwrap();

        let err = load::<MealRecord>(&path).unwrap_err();
        assert!(matches!(err, MealError::Corrupted { .. }));
        assert!(err.is_corruption());

        std::fs::write(&path, "").unwrap();
        assert!(load::<MealRecord>(&path).is_err());

        std::fs::write(&path, "{\"content\": \"eggs\"}").unwrap();
        assert!(load::<MealRecord>(&path).is_err());
    }

    #[test]
    fn test_load_invalid_utf8_is_corrupted() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("meals.json");
        std::fs::write(&path, [b'[', 0xff, 0xfe, b']']).unwrap();

        let err = load::<MealRecord>(&path).unwrap_err();
        assert!(matches!(err, MealError::Corrupted { .. }));
    }

    #[test]
    fn test_save_creates_dirs_and_indents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("live").join("meals.json");

        let report = save(&[MealRecord::new("[2024-05-01]", "eggs")], &path);
        assert!(report.warnings.is_empty());
        assert!(report.written());
        assert!(tmp.path().join("live").join("backup").is_dir());
        // nothing to back up on first save
        assert!(!backup_path(&path).exists());

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "[\n  {\n    \"timestamp\": \"[2024-05-01]\",\n    \"content\": \"eggs\"\n  }\n]"
        );
    }

    #[test]
    fn test_save_backs_up_previous_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("suggestion_meals.json");
        let original = "[{\"content\":\"soup\"}]";
        std::fs::write(&path, original).unwrap();

        let report = save(&[SuggestionRecord::new("toast")], &path);
        assert!(report.warnings.is_empty());

        let backup = backup_path(&path);
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), original);

        // only one generation is kept
        let previous = std::fs::read_to_string(&path).unwrap();
        save(&[SuggestionRecord::new("jam")], &path);
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), previous);
    }

    #[test]
    fn test_save_twice_is_stable() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("meals.json");
        std::fs::write(
            &path,
            "[{\"date\":\"[2020-01-01]\",\"meal\":\"stew\"},{\"timestamp\":\"[2024-01-01]\",\"content\":\"rice\"}]",
        )
        .unwrap();

        let records: Vec<MealRecord> = load(&path).unwrap();
        save(&records, &path);
        let once = std::fs::read_to_string(&path).unwrap();

        let records: Vec<MealRecord> = load(&path).unwrap();
        save(&records, &path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), once);
    }

    #[cfg(unix)]
    #[test]
    fn test_backup_failure_is_a_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("meals.json");
        std::fs::write(&path, "[]").unwrap();
        // a directory where the backup file should go makes the copy fail
        std::fs::create_dir_all(backup_path(&path)).unwrap();

        let report = save(&[MealRecord::new("[2024-05-01]", "eggs")], &path);
        assert!(matches!(
            report.warnings.as_slice(),
            [StoreWarning::BackupFailed { .. }]
        ));
        assert!(report.written());
        let records: Vec<MealRecord> = load(&path).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_write_failure_is_a_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("meals.json");
        // a directory at the data path defeats both the backup copy and the write
        std::fs::create_dir_all(&path).unwrap();

        let report = save(&[MealRecord::new("[2024-05-01]", "eggs")], &path);
        assert!(!report.written());
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, StoreWarning::WriteFailed { path: p, .. } if p == &path)));
        assert!(path.is_dir());
    }

    #[test]
    fn test_update_saves_only_on_change() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.json");

        let (len, report) = update::<SuggestionRecord, _, _>(&path, |records| {
            records.push(SuggestionRecord::new("first"));
            Ok(Change::Save(records.len()))
        })
        .unwrap();
        assert_eq!(len, 1);
        assert!(report.is_some());

        let ((), report) = update::<SuggestionRecord, _, _>(&path, |_| Ok(Change::Keep(()))).unwrap();
        assert!(report.is_none());
        assert!(!backup_path(&path).exists());

        // lock released
        assert!(!crate::lock::lock_path(&path).exists());
    }

    #[test]
    fn test_update_aborts_on_corruption() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let result = update::<SuggestionRecord, _, _>(&path, |records| {
            records.clear();
            Ok(Change::Save(()))
        });
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
    }
}
