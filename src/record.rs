//! Record shapes stored in the ledger and suggestion files.
//!
//! Ledger records come in two historical shapes:
//! - current: `{"timestamp": "[2024-05-01]", "content": "eggs"}`
//! - legacy: `{"date": "[2024-05-01]", "meal": "eggs"}`
//!
//! Records keep whatever keys they were read with so a re-save never
//! rewrites them; [`MealRecord::entry`] normalizes at read time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shown when a record carries neither `timestamp` nor `date`.
pub const UNKNOWN_DATE: &str = "unknown date";

/// Shown when a record carries neither `content` nor `meal`.
pub const UNKNOWN_MEAL: &str = "unknown meal";

/// Shown for a suggestion without `content`.
pub const UNKNOWN_SUGGESTION: &str = "unknown";

/// One ledger record as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Legacy name of `timestamp`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Legacy name of `content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Canonical view of a ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealEntry {
    pub timestamp: String,
    pub content: String,
}

impl MealRecord {
    pub fn new(timestamp: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            timestamp: Some(timestamp.into()),
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Build a record in the legacy `{date, meal}` shape.
    pub fn legacy(date: impl Into<String>, meal: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            meal: Some(meal.into()),
            ..Self::default()
        }
    }

    /// Date stamp, preferring `timestamp` over legacy `date`.
    pub fn stamp(&self) -> Option<&str> {
        first_present(&self.timestamp, &self.date)
    }

    /// Meal name, preferring `content` over legacy `meal`.
    pub fn meal_name(&self) -> Option<&str> {
        first_present(&self.content, &self.meal)
    }

    pub fn entry(&self) -> MealEntry {
        MealEntry {
            timestamp: self.stamp().unwrap_or(UNKNOWN_DATE).to_string(),
            content: self.meal_name().unwrap_or(UNKNOWN_MEAL).to_string(),
        }
    }
}

fn first_present<'a>(preferred: &'a Option<String>, fallback: &'a Option<String>) -> Option<&'a str> {
    preferred
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| fallback.as_deref().filter(|s| !s.is_empty()))
}

/// One suggestion as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SuggestionRecord {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            extra: Map::new(),
        }
    }

    /// Case-insensitive match against a meal name.
    pub fn matches(&self, meal: &str) -> bool {
        self.content
            .as_deref()
            .is_some_and(|c| c.to_lowercase() == meal.to_lowercase())
    }
}

/// A numbered line of `list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealRow {
    /// 1-based position in the ledger.
    pub index: usize,
    pub timestamp: String,
    pub content: String,
}

/// A numbered line of `listsuggest` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRow {
    pub index: usize,
    pub content: String,
}
