//! `mealtrack` — A personal meal ledger kept in local JSON files.
//!
//! Provides:
//! - `paths` — Resolve the ledger and suggestion files for the live/test root
//! - `store` — JSON list load/save with single-generation backups
//! - `lock` — PID lock file held for one load-modify-save cycle
//! - `cleaner` — Retention and recency windows over ledger dates
//! - `ledger` — Add, list, and delete eaten meals
//! - `suggestions` — Deduplicated suggestion list and random picks
//! - `restore` — Roll both files back to their backups
//! - `config` — User defaults from `config.json`
//! - `cli` — Command-line parsing and dispatch

pub mod cleaner;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod lock;
pub mod paths;
pub mod record;
pub mod restore;
pub mod store;
pub mod suggestions;

pub use error::{MealError, Result};
