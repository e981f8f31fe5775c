//! Error types for the meal tracker library.
//!
//! A missing data file is never an error (it loads as an empty list), and
//! backup/write problems during a save are reported as
//! [`StoreWarning`](crate::store::StoreWarning) values instead of failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MealError {
    /// The file exists but does not hold a JSON array of records.
    #[error("Corrupted file {}: {source}", path.display())]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored record's date stamp could not be parsed as `[YYYY-MM-DD]`.
    #[error("Malformed date stamp {value:?} in record {index}")]
    MalformedTimestamp { index: usize, value: String },

    /// A retention or recency window that is negative or too large.
    #[error("Invalid window of {days} days")]
    InvalidWindow { days: i64 },

    #[error("Not a valid date: '{0}'. Format must be YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("No meal content provided.")]
    EmptyContent,

    #[error("No file to restore from: {}", path.display())]
    RestoreUnavailable { path: PathBuf },

    #[error("Failed to lock {}: {reason}", path.display())]
    Lock { path: PathBuf, reason: String },
}

impl MealError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MealError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the corruption class: unparsable files or stored dates.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            MealError::Corrupted { .. } | MealError::MalformedTimestamp { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MealError>;
