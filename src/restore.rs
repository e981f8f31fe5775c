//! Recovery of the ledger and suggestion files from their backups.
//!
//! Restore is all-or-nothing: both backups are read and parsed before
//! either live file is touched. The live files are rewritten directly,
//! without taking a new backup, so restoring twice is a no-op.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{MealError, Result};
use crate::paths::{backup_path, DataPaths};
use crate::record::{MealRecord, SuggestionRecord};
use crate::store;

/// A validated backup, kept as its original bytes.
struct Snapshot {
    target: PathBuf,
    bytes: Vec<u8>,
}

impl Snapshot {
    /// Read the backup of `target`, requiring a JSON array of `T`.
    fn read<T: DeserializeOwned>(target: &Path) -> Result<Self> {
        let backup = backup_path(target);
        let bytes = match std::fs::read(&backup) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MealError::RestoreUnavailable { path: backup });
            }
            Err(e) => return Err(MealError::io(backup, e)),
        };
        if let Err(source) = serde_json::from_slice::<Vec<T>>(&bytes) {
            return Err(MealError::Corrupted { path: backup, source });
        }
        Ok(Self {
            target: target.to_path_buf(),
            bytes,
        })
    }
}

/// Overwrite both live files with their backup contents.
pub fn restore(paths: &DataPaths) -> Result<()> {
    let _ledger_lock = store::lock(&paths.ledger)?;
    let _suggestion_lock = store::lock(&paths.suggestions)?;

    let snapshots = [
        Snapshot::read::<MealRecord>(&paths.ledger)?,
        Snapshot::read::<SuggestionRecord>(&paths.suggestions)?,
    ];
    for snapshot in &snapshots {
        std::fs::write(&snapshot.target, &snapshot.bytes)
            .map_err(|e| MealError::io(&snapshot.target, e))?;
        info!(path = %snapshot.target.display(), "restored from backup");
    }
    Ok(())
}
