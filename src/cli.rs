//! Command-line surface and dispatch.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::Rng;
use std::io::{IsTerminal, Read, Write};
use std::path::PathBuf;

use crate::clock::{parse_input_date, Clock};
use crate::config::TrackerConfig;
use crate::error::MealError;
use crate::ledger::{DeleteOutcome, MealLedger};
use crate::paths::{DataPaths, Environment};
use crate::restore;
use crate::suggestions::{Insert, Suggestion, SuggestionBook};

/// Meal Tracker CLI
#[derive(Debug, Parser)]
#[command(name = "meal", version, about)]
pub struct Cli {
    /// Base path of the meal file
    #[arg(short, long, global = true)]
    pub file: Option<PathBuf>,

    /// Date of consumption (YYYY-MM-DD)
    #[arg(short, long, global = true, value_parser = parse_date_arg)]
    pub date: Option<String>,

    /// Use the test files instead of the live ones
    #[arg(short, long, global = true)]
    pub test: bool,

    /// Log each load, save, and lock step to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a new meal
    Add {
        /// Meal name (or pipe it on stdin)
        meal: Vec<String>,
    },

    /// Add meal only to suggestions
    #[command(name = "addsuggest")]
    AddSuggest {
        /// Meal name (or pipe it on stdin)
        meal: Vec<String>,
    },

    /// List all meals
    List,

    /// Delete a meal by number
    Delete {
        /// Meal number to delete
        #[arg(allow_negative_numbers = true)]
        index: i64,
    },

    /// Delete all meals
    #[command(name = "deleteall")]
    DeleteAll,

    /// Restore from backup
    Restore,

    /// Suggest a meal not eaten in the last 2 weeks
    Suggest,

    /// List all suggested meals
    #[command(name = "listsuggest")]
    ListSuggest,
}

impl Commands {
    /// True for commands that read a meal name.
    pub fn takes_meal(&self) -> bool {
        matches!(self, Commands::Add { .. } | Commands::AddSuggest { .. })
    }
}

fn parse_date_arg(value: &str) -> Result<String, String> {
    parse_input_date(value).map_err(|e| e.to_string())
}

/// Read stdin when it is piped rather than a terminal.
pub fn piped_stdin() -> Option<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return None;
    }
    let mut buf = String::new();
    stdin.lock().read_to_string(&mut buf).ok()?;
    Some(buf)
}

/// Meal text from piped input if it has any, otherwise the trailing words.
pub fn meal_input(words: &[String], piped: Option<String>) -> Option<String> {
    piped
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| Some(words.join(" ").trim().to_string()))
        .filter(|s| !s.is_empty())
}

/// Run one command against the files selected by flags and config.
pub fn execute<C, R, W>(
    cli: Cli,
    config: &TrackerConfig,
    piped: Option<String>,
    clock: &C,
    rng: &mut R,
    out: &mut W,
) -> anyhow::Result<()>
where
    C: Clock,
    R: Rng + ?Sized,
    W: Write,
{
    let env = Environment::from_live_flag(!(cli.test || config.test));
    let base = cli.file.or_else(|| config.file.clone());
    let paths = DataPaths::resolve(env, base.as_deref());

    let ledger = MealLedger::new(&paths.ledger, &paths.suggestions, clock)
        .with_retention_days(config.retention_days);
    let book = SuggestionBook::new(&paths.suggestions, clock).with_recency_days(config.recency_days);

    match cli.command {
        Commands::Add { meal } => {
            let meal = meal_input(&meal, piped).ok_or(MealError::EmptyContent)?;
            let added = ledger
                .add_meal(&meal, cli.date.as_deref())
                .context("Abort adding meal")?;
            writeln!(out, "Meal added: {}", added.entry.content)?;
        }
        Commands::AddSuggest { meal } => {
            let meal = meal_input(&meal, piped).ok_or(MealError::EmptyContent)?;
            match book.add(&meal).context("Abort adding suggestion")? {
                Insert::Added(_) => writeln!(out, "Added suggestion: {meal}")?,
                Insert::Exists => writeln!(out, "Suggestion '{meal}' already exists.")?,
            }
        }
        Commands::List => {
            let mut rows = ledger.list().context("Abort loading")?.peekable();
            if rows.peek().is_none() {
                writeln!(out, "No meals found")?;
            }
            for row in rows {
                writeln!(out, "{}. {} - {}", row.index, row.timestamp, row.content)?;
            }
        }
        Commands::Delete { index } => {
            let index = usize::try_from(index).unwrap_or(0);
            match ledger.delete_one(index).context("Abort deleting")? {
                DeleteOutcome::Removed { index, content, .. } => {
                    writeln!(out, "Deleted meal {index}: {content}")?
                }
                DeleteOutcome::InvalidIndex { .. } => writeln!(out, "Invalid meal number")?,
            }
        }
        Commands::DeleteAll => {
            ledger.delete_all()?;
            writeln!(out, "Deleted all meals")?;
        }
        Commands::Restore => {
            restore::restore(&paths).context("Abort restoring")?;
            writeln!(out, "Successfully restored.")?;
        }
        Commands::Suggest => match book.suggest(&paths.ledger, rng).context("Abort suggesting")? {
            Suggestion::Pick(meal) => writeln!(out, "Suggested meal: {meal}")?,
            Suggestion::NoSuggestions => writeln!(out, "No suggestions available.")?,
            Suggestion::NothingEligible => writeln!(
                out,
                "No meal found that hasn't been eaten in the last {} days.",
                config.recency_days
            )?,
        },
        Commands::ListSuggest => {
            let mut rows = book.list().context("Abort loading")?.peekable();
            if rows.peek().is_none() {
                writeln!(out, "No suggestions found.")?;
            }
            for row in rows {
                writeln!(out, "{}. {}", row.index, row.content)?;
            }
        }
    }

    Ok(())
}
