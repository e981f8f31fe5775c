//! Date-window filtering of ledger records.

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::clock::parse_stamp;
use crate::error::{MealError, Result};
use crate::record::MealRecord;

/// Days a ledger record is kept before pruning.
pub const RETENTION_DAYS: i64 = 30;

/// Lookback within which an eaten meal is not suggested again.
pub const RECENCY_DAYS: i64 = 14;

/// Parse a record's stamp, failing on a missing or malformed date.
pub fn record_time(index: usize, record: &MealRecord) -> Result<NaiveDateTime> {
    let value = record.stamp().unwrap_or_default();
    parse_stamp(value).ok_or_else(|| MealError::MalformedTimestamp {
        index: index + 1,
        value: value.to_string(),
    })
}

/// Start of a window reaching `days` back from `now`.
///
/// Fails for negative windows and for windows reaching past the earliest
/// representable date.
pub fn cutoff(now: NaiveDateTime, days: i64) -> Result<NaiveDateTime> {
    if days < 0 {
        return Err(MealError::InvalidWindow { days });
    }
    Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or(MealError::InvalidWindow { days })
}

/// True if `record` is dated at or after `cutoff`.
pub fn is_within(index: usize, record: &MealRecord, cutoff: NaiveDateTime) -> Result<bool> {
    Ok(record_time(index, record)? >= cutoff)
}

/// Keep only records dated within `days` of `now`.
///
/// A record is kept iff midnight of its date is at or after `now - days`.
/// Any unparsable date fails the whole call.
pub fn prune_older_than(records: Vec<MealRecord>, days: i64, now: NaiveDateTime) -> Result<Vec<MealRecord>> {
    let cutoff = cutoff(now, days)?;
    let before = records.len();
    let mut kept = Vec::with_capacity(before);
    for (index, record) in records.into_iter().enumerate() {
        if is_within(index, &record, cutoff)? {
            kept.push(record);
        }
    }
    if kept.len() != before {
        debug!(dropped = before - kept.len(), days, "pruned old meals");
    }
    Ok(kept)
}
