//! Meal ledger operations: add, list, delete one, delete all.
//!
//! Every write is one locked load-modify-save cycle over the ledger file.
//! Adding a meal also prunes records past the retention window and mirrors
//! the meal name into the suggestion file.

use std::path::Path;
use tracing::{info, warn};

use crate::cleaner::{prune_older_than, RETENTION_DAYS};
use crate::clock::Clock;
use crate::error::{MealError, Result};
use crate::record::{MealEntry, MealRecord, MealRow};
use crate::store::{self, Change, SaveReport};
use crate::suggestions::{Insert, SuggestionBook};

pub struct MealLedger<'a, C: Clock> {
    path: &'a Path,
    suggestions: &'a Path,
    clock: &'a C,
    retention_days: i64,
}

/// Result of [`MealLedger::add_meal`].
#[derive(Debug)]
pub struct AddedMeal {
    pub entry: MealEntry,
    pub report: SaveReport,
    pub mirror: Mirror,
}

/// What happened to the suggestion file while adding a meal.
#[derive(Debug)]
pub enum Mirror {
    Added(SaveReport),
    AlreadyPresent,
    /// The suggestion file could not be updated; the meal itself was saved.
    Failed(String),
}

/// Result of [`MealLedger::delete_one`].
#[derive(Debug)]
pub enum DeleteOutcome {
    Removed {
        index: usize,
        content: String,
        report: SaveReport,
    },
    InvalidIndex {
        index: usize,
        len: usize,
    },
}

impl<'a, C: Clock> MealLedger<'a, C> {
    pub fn new(path: &'a Path, suggestions: &'a Path, clock: &'a C) -> Self {
        Self {
            path,
            suggestions,
            clock,
            retention_days: RETENTION_DAYS,
        }
    }

    pub fn with_retention_days(mut self, days: i64) -> Self {
        self.retention_days = days;
        self
    }

    /// Append a meal dated `date` (a `[YYYY-MM-DD]` stamp) or today.
    pub fn add_meal(&self, content: &str, date: Option<&str>) -> Result<AddedMeal> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MealError::EmptyContent);
        }

        let timestamp = date.map_or_else(|| self.clock.today_stamp(), str::to_string);
        let now = self.clock.now();
        let days = self.retention_days;

        let (entry, report) = store::update::<MealRecord, _, _>(self.path, |records| {
            *records = prune_older_than(std::mem::take(records), days, now)?;
            let record = MealRecord::new(timestamp, content);
            let entry = record.entry();
            records.push(record);
            Ok(Change::Save(entry))
        })?;
        info!(meal = %entry.content, date = %entry.timestamp, "meal added");

        let book = SuggestionBook::new(self.suggestions, self.clock);
        let mirror = match book.insert_if_absent(content) {
            Ok(Insert::Added(report)) => Mirror::Added(report),
            Ok(Insert::Exists) => Mirror::AlreadyPresent,
            Err(e) => {
                warn!(error = %e, "could not mirror meal into suggestions");
                Mirror::Failed(e.to_string())
            }
        };

        Ok(AddedMeal {
            entry,
            report: report.unwrap_or_default(),
            mirror,
        })
    }

    /// Numbered rows in ledger order, normalized for display.
    pub fn list(&self) -> Result<impl Iterator<Item = MealRow>> {
        let records: Vec<MealRecord> = store::load(self.path)?;
        Ok(records.into_iter().enumerate().map(|(i, record)| {
            let MealEntry { timestamp, content } = record.entry();
            MealRow {
                index: i + 1,
                timestamp,
                content,
            }
        }))
    }

    /// Remove the record at 1-based `index`.
    pub fn delete_one(&self, index: usize) -> Result<DeleteOutcome> {
        let (removed, report) = store::update::<MealRecord, _, _>(self.path, |records| {
            if index == 0 || index > records.len() {
                return Ok(Change::Keep(Err(records.len())));
            }
            Ok(Change::Save(Ok(records.remove(index - 1).entry().content)))
        })?;

        Ok(match removed {
            Ok(content) => {
                info!(index, meal = %content, "meal deleted");
                DeleteOutcome::Removed {
                    index,
                    content,
                    report: report.unwrap_or_default(),
                }
            }
            Err(len) => DeleteOutcome::InvalidIndex { index, len },
        })
    }

    /// Overwrite the ledger with an empty list. Does not read the old file.
    pub fn delete_all(&self) -> Result<SaveReport> {
        let _guard = store::lock(self.path)?;
        let report = store::save::<MealRecord>(&[], self.path);
        info!(path = %self.path.display(), "ledger cleared");
        Ok(report)
    }
}
