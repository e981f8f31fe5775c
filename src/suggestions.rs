//! Suggestion list: deduplicated meal names and recency-aware picks.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::cleaner::{cutoff, is_within, RECENCY_DAYS};
use crate::clock::Clock;
use crate::error::{MealError, Result};
use crate::record::{MealRecord, SuggestionRecord, SuggestionRow, UNKNOWN_SUGGESTION};
use crate::store::{self, Change, SaveReport};

pub struct SuggestionBook<'a, C: Clock> {
    path: &'a Path,
    clock: &'a C,
    recency_days: i64,
}

/// Result of inserting a suggestion.
#[derive(Debug)]
pub enum Insert {
    Added(SaveReport),
    /// A case-insensitive match was already present; nothing was written.
    Exists,
}

/// Result of [`SuggestionBook::suggest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    Pick(String),
    /// The suggestion file is missing or empty.
    NoSuggestions,
    /// Every suggestion was eaten within the recency window.
    NothingEligible,
}

impl<'a, C: Clock> SuggestionBook<'a, C> {
    pub fn new(path: &'a Path, clock: &'a C) -> Self {
        Self {
            path,
            clock,
            recency_days: RECENCY_DAYS,
        }
    }

    pub fn with_recency_days(mut self, days: i64) -> Self {
        self.recency_days = days;
        self
    }

    /// Add a suggestion unless one matches case-insensitively.
    pub fn add(&self, content: &str) -> Result<Insert> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MealError::EmptyContent);
        }
        let inserted = self.insert_if_absent(content)?;
        if matches!(inserted, Insert::Added(_)) {
            info!(suggestion = content, "suggestion added");
        }
        Ok(inserted)
    }

    pub(crate) fn insert_if_absent(&self, content: &str) -> Result<Insert> {
        let (added, report) = store::update::<SuggestionRecord, _, _>(self.path, |records| {
            if records.iter().any(|s| s.matches(content)) {
                return Ok(Change::Keep(false));
            }
            records.push(SuggestionRecord::new(content));
            Ok(Change::Save(true))
        })?;
        Ok(match report {
            Some(report) if added => Insert::Added(report),
            _ => Insert::Exists,
        })
    }

    pub fn list(&self) -> Result<impl Iterator<Item = SuggestionRow>> {
        let records: Vec<SuggestionRecord> = store::load(self.path)?;
        Ok(records.into_iter().enumerate().map(|(i, record)| SuggestionRow {
            index: i + 1,
            content: record
                .content
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| UNKNOWN_SUGGESTION.to_string()),
        }))
    }

    /// Suggestions whose name was not eaten within the recency window,
    /// in file order.
    pub fn eligible(&self, ledger: &Path) -> Result<Vec<String>> {
        let suggestions: Vec<SuggestionRecord> = store::load(self.path)?;
        self.filter_recent(suggestions, ledger)
    }

    /// Pick one eligible suggestion uniformly at random.
    pub fn suggest<R: Rng + ?Sized>(&self, ledger: &Path, rng: &mut R) -> Result<Suggestion> {
        let suggestions: Vec<SuggestionRecord> = store::load(self.path)?;
        if suggestions.is_empty() {
            return Ok(Suggestion::NoSuggestions);
        }

        let eligible = self.filter_recent(suggestions, ledger)?;
        debug!(eligible = eligible.len(), "suggestion candidates");
        Ok(match eligible.choose(rng) {
            Some(pick) => Suggestion::Pick(pick.clone()),
            None => Suggestion::NothingEligible,
        })
    }

    fn filter_recent(&self, suggestions: Vec<SuggestionRecord>, ledger: &Path) -> Result<Vec<String>> {
        let recent = self.recent_names(ledger)?;
        Ok(suggestions
            .into_iter()
            .filter_map(|s| s.content)
            .filter(|c| !c.is_empty() && !recent.contains(&c.to_lowercase()))
            .collect())
    }

    /// Lowercased names of meals eaten within the recency window.
    fn recent_names(&self, ledger: &Path) -> Result<HashSet<String>> {
        let records: Vec<MealRecord> = store::load(ledger)?;
        let cutoff = cutoff(self.clock.now(), self.recency_days)?;
        let mut names = HashSet::new();
        for (index, record) in records.iter().enumerate() {
            if is_within(index, record, cutoff)? {
                if let Some(name) = record.meal_name() {
                    names.insert(name.to_lowercase());
                }
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::PathBuf;

    fn clock() -> FixedClock {
        FixedClock::on(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
    }

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = tmp.path().join("meals.json");
        let suggestions = tmp.path().join("suggestion_meals.json");
        (tmp, ledger, suggestions)
    }

    #[test]
    fn test_add_is_idempotent_ignoring_case() {
        let (_tmp, _, path) = setup();
        let clock = clock();
        let book = SuggestionBook::new(&path, &clock);

        assert!(matches!(book.add("Pasta").unwrap(), Insert::Added(_)));
        let after_first = std::fs::read_to_string(&path).unwrap();
        assert!(matches!(book.add("pasta").unwrap(), Insert::Exists));
        assert!(matches!(book.add("PASTA").unwrap(), Insert::Exists));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), after_first);
        let rows: Vec<SuggestionRow> = book.list().unwrap().collect();
        assert_eq!(
            rows,
            vec![SuggestionRow {
                index: 1,
                content: "Pasta".to_string()
            }]
        );
    }

    #[test]
    fn test_existing_suggestion_is_not_rewritten() {
        let (_tmp, _, path) = setup();
        std::fs::write(&path, r#"[{"content":"Pasta"}]"#).unwrap();
        let clock = clock();
        let book = SuggestionBook::new(&path, &clock);

        assert!(matches!(book.add("pasta").unwrap(), Insert::Exists));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"[{"content":"Pasta"}]"#);
        assert!(!crate::paths::backup_path(&path).exists());
    }

    #[test]
    fn test_list_marks_missing_content() {
        let (_tmp, _, path) = setup();
        std::fs::write(&path, r#"[{"content":"soup"},{"name":"x"}]"#).unwrap();
        let clock = clock();
        let book = SuggestionBook::new(&path, &clock);

        let names: Vec<String> = book.list().unwrap().map(|r| r.content).collect();
        assert_eq!(names, vec!["soup", "unknown"]);
    }

    #[test]
    fn test_suggest_skips_recent_meals() {
        let (_tmp, ledger, path) = setup();
        std::fs::write(
            &ledger,
            r#"[{"timestamp":"[2024-06-15]","content":"a"},
                {"timestamp":"[2024-05-26]","content":"B"}]"#,
        )
        .unwrap();
        std::fs::write(&path, r#"[{"content":"A"},{"content":"B"},{"content":"C"}]"#).unwrap();
        let clock = clock();
        let book = SuggestionBook::new(&path, &clock);

        assert_eq!(book.eligible(&ledger).unwrap(), vec!["B", "C"]);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            match book.suggest(&ledger, &mut rng).unwrap() {
                Suggestion::Pick(pick) => assert!(pick == "B" || pick == "C", "picked {pick}"),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_suggest_uses_legacy_records_for_recency() {
        let (_tmp, ledger, path) = setup();
        std::fs::write(&ledger, r#"[{"date":"[2024-06-14]","meal":"stew"}]"#).unwrap();
        std::fs::write(&path, r#"[{"content":"Stew"},{"content":"rice"}]"#).unwrap();
        let clock = clock();
        let book = SuggestionBook::new(&path, &clock);

        assert_eq!(book.eligible(&ledger).unwrap(), vec!["rice"]);
    }

    #[test]
    fn test_suggest_without_suggestions() {
        let (_tmp, ledger, path) = setup();
        let clock = clock();
        let book = SuggestionBook::new(&path, &clock);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(book.suggest(&ledger, &mut rng).unwrap(), Suggestion::NoSuggestions);
        std::fs::write(&path, "[]").unwrap();
        assert_eq!(book.suggest(&ledger, &mut rng).unwrap(), Suggestion::NoSuggestions);
    }

    #[test]
    fn test_suggest_nothing_eligible() {
        let (_tmp, ledger, path) = setup();
        std::fs::write(&ledger, r#"[{"timestamp":"[2024-06-10]","content":"soup"}]"#).unwrap();
        std::fs::write(&path, r#"[{"content":"Soup"}]"#).unwrap();
        let clock = clock();
        let book = SuggestionBook::new(&path, &clock);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(book.suggest(&ledger, &mut rng).unwrap(), Suggestion::NothingEligible);

        let narrow = SuggestionBook::new(&path, &clock).with_recency_days(3);
        assert_eq!(
            narrow.suggest(&ledger, &mut rng).unwrap(),
            Suggestion::Pick("Soup".to_string())
        );
    }

    #[test]
    fn test_suggest_never_picks_empty_content() {
        let (_tmp, ledger, path) = setup();
        std::fs::write(&path, r#"[{"content":""},{"content":"rice"}]"#).unwrap();
        let clock = clock();
        let book = SuggestionBook::new(&path, &clock);

        assert_eq!(book.eligible(&ledger).unwrap(), vec!["rice"]);

        std::fs::write(&path, r#"[{"content":""}]"#).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(book.suggest(&ledger, &mut rng).unwrap(), Suggestion::NothingEligible);
    }

    #[test]
    fn test_suggest_with_oversized_window_is_an_error() {
        let (_tmp, ledger, path) = setup();
        std::fs::write(&ledger, r#"[{"timestamp":"[2024-06-15]","content":"eggs"}]"#).unwrap();
        std::fs::write(&path, r#"[{"content":"eggs"}]"#).unwrap();
        let clock = clock();
        let book = SuggestionBook::new(&path, &clock).with_recency_days(1_000_000_000);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(
            book.suggest(&ledger, &mut rng),
            Err(MealError::InvalidWindow { days: 1_000_000_000 })
        ));
    }

    #[test]
    fn test_suggest_reports_corruption() {
        let (_tmp, ledger, path) = setup();
        std::fs::write(&path, r#"[{"content":"soup"}]"#).unwrap();
        std::fs::write(&ledger, r#"[{"timestamp":"soon","content":"soup"}]"#).unwrap();
        let clock = clock();
        let book = SuggestionBook::new(&path, &clock);
        let mut rng = StdRng::seed_from_u64(1);

        let err = book.suggest(&ledger, &mut rng).unwrap_err();
        assert!(err.is_corruption());

        std::fs::write(&path, "[").unwrap();
        assert!(matches!(
            book.suggest(&ledger, &mut rng),
            Err(MealError::Corrupted { .. })
        ));
    }
}
