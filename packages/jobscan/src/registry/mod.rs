//! Selector registry.
//!
//! A read-only table of per-board extraction rules. The pipeline receives the
//! registry as a value, so tests and callers can swap in their own table.
//!
//! Lookup order for a `(board, field)` pair is: entries for that board by
//! ascending priority, then `generic` tier entries, then `heuristic` tier
//! entries, each group ordered by priority.

pub mod boards;
mod builtin;
pub mod health;

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::types::{ExtractionSource, FieldType, JobField};

pub use boards::{detect_application_form, detect_board, is_job_page};
pub use health::{HealthClass, HealthSummary, SelectorCheck, SelectorHealth, SelectorHealthRecord};

/// Board name shared by every cross-site entry.
pub const GENERIC_BOARD: &str = "generic";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Active,
    /// Still used, known to miss on some layouts
    Degraded,
    /// Kept for history, never used
    Deprecated,
}

/// Which pipeline layer consumes an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorTier {
    #[default]
    Board,
    Generic,
    Heuristic,
}

impl SelectorTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorTier::Board => "board",
            SelectorTier::Generic => "generic",
            SelectorTier::Heuristic => "heuristic",
        }
    }

    /// Provenance recorded for values found through this tier.
    pub fn source(&self) -> ExtractionSource {
        match self {
            SelectorTier::Board => ExtractionSource::BoardSelector,
            SelectorTier::Generic => ExtractionSource::GenericSelector,
            SelectorTier::Heuristic => ExtractionSource::Heuristic,
        }
    }
}

/// Whether an entry reads posting text, locates form inputs, or both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorMode {
    #[default]
    Read,
    Write,
    Both,
}

/// One extraction rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorEntry {
    /// Unique identifier, e.g. `li-title-unified`
    pub id: String,
    /// Board name as returned by [`detect_board`], or `generic`
    pub board: String,
    pub field: JobField,
    /// Tried in order; the first non-empty match wins
    pub selectors: Vec<String>,
    /// Lower is tried first
    pub priority: i32,
    pub status: EntryStatus,
    pub added: NaiveDate,
    #[serde(default)]
    pub tier: SelectorTier,
    #[serde(default)]
    pub mode: SelectorMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SelectorEntry {
    pub fn is_readable(&self) -> bool {
        self.status != EntryStatus::Deprecated && matches!(self.mode, SelectorMode::Read | SelectorMode::Both)
    }

    pub fn is_writable(&self) -> bool {
        self.status != EntryStatus::Deprecated && matches!(self.mode, SelectorMode::Write | SelectorMode::Both)
    }

    /// Form field type an input located by this entry holds.
    pub fn fill_type(&self) -> FieldType {
        match self.field {
            JobField::Title => FieldType::CurrentTitle,
            JobField::Company => FieldType::CurrentCompany,
            JobField::Description => FieldType::CoverLetterText,
            JobField::Location => FieldType::Location,
            JobField::Salary => FieldType::Salary,
            JobField::EmploymentType => FieldType::CustomQuestion,
        }
    }
}

/// Immutable, validated selector table.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorRegistry {
    entries: Vec<SelectorEntry>,
}

impl SelectorRegistry {
    /// Build a registry, rejecting tables that break the ordering rules.
    pub fn new(entries: Vec<SelectorEntry>) -> RegistryResult<Self> {
        let registry = Self { entries };
        registry.validate()?;
        Ok(registry)
    }

    /// The table shipped with the crate.
    pub fn builtin() -> Self {
        Self {
            entries: builtin::entries(),
        }
    }

    /// Load a replacement table from a JSON array of entries.
    pub fn from_json(json: &str) -> RegistryResult<Self> {
        let entries: Vec<SelectorEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    pub fn to_json(&self) -> RegistryResult<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    pub fn entries(&self) -> &[SelectorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SelectorEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Distinct board names, in table order.
    pub fn boards(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|e| e.board.as_str())
            .filter(|b| seen.insert(*b))
            .collect()
    }

    /// Check every table invariant.
    pub fn validate(&self) -> RegistryResult<()> {
        let mut ids = HashSet::new();
        let mut selectors: HashSet<(&str, JobField, &str)> = HashSet::new();
        let mut max_board_priority: HashMap<JobField, i32> = HashMap::new();

        for entry in &self.entries {
            if !ids.insert(entry.id.as_str()) {
                return Err(RegistryError::DuplicateId(entry.id.clone()));
            }

            let is_generic_board = entry.board == GENERIC_BOARD;
            if (entry.tier == SelectorTier::Board) == is_generic_board {
                return Err(RegistryError::TierMismatch {
                    id: entry.id.clone(),
                    tier: entry.tier.as_str().to_string(),
                    board: entry.board.clone(),
                });
            }

            for selector in &entry.selectors {
                if !selectors.insert((entry.board.as_str(), entry.field, selector.as_str())) {
                    return Err(RegistryError::DuplicateSelector {
                        board: entry.board.clone(),
                        field: entry.field,
                        selector: selector.clone(),
                    });
                }
                if Selector::parse(selector).is_err() {
                    return Err(RegistryError::InvalidSelector {
                        id: entry.id.clone(),
                        selector: selector.clone(),
                    });
                }
            }

            if entry.tier == SelectorTier::Board {
                let max = max_board_priority.entry(entry.field).or_insert(entry.priority);
                *max = (*max).max(entry.priority);
            }
        }

        for entry in self.entries.iter().filter(|e| e.tier != SelectorTier::Board) {
            if let Some(&max) = max_board_priority.get(&entry.field) {
                if entry.priority <= max {
                    return Err(RegistryError::PriorityOrder {
                        id: entry.id.clone(),
                        field: entry.field,
                        priority: entry.priority,
                        max_board_priority: max,
                    });
                }
            }
        }

        Ok(())
    }

    /// Readable entries of one tier for `field`, ordered by priority.
    ///
    /// `board` only filters the board tier; it is ignored for fallback tiers.
    pub fn tier_entries(&self, tier: SelectorTier, board: Option<&str>, field: JobField) -> Vec<&SelectorEntry> {
        let mut out: Vec<&SelectorEntry> = self
            .entries
            .iter()
            .filter(|e| e.tier == tier && e.field == field && e.is_readable())
            .filter(|e| match tier {
                SelectorTier::Board => board.is_some_and(|b| b != GENERIC_BOARD && e.board == b),
                _ => true,
            })
            .collect();
        out.sort_by_key(|e| e.priority);
        out
    }

    /// Full lookup: board entries, then generic, then heuristic.
    pub fn lookup(&self, board: Option<&str>, field: JobField) -> Vec<&SelectorEntry> {
        let mut out = self.tier_entries(SelectorTier::Board, board, field);
        out.extend(self.tier_entries(SelectorTier::Generic, board, field));
        out.extend(self.tier_entries(SelectorTier::Heuristic, board, field));
        debug!(board = ?board, field = %field, entries = out.len(), "registry lookup");
        out
    }

    /// Copy of the table with each tried entry's status set from `health`.
    ///
    /// Deprecated entries and entries never tried keep their status.
    pub fn with_health_status(&self, health: &SelectorHealth) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|entry| {
                let mut entry = entry.clone();
                if entry.status != EntryStatus::Deprecated {
                    if let Some(status) = health.suggested_status(&entry.id) {
                        entry.status = status;
                    }
                }
                entry
            })
            .collect();
        Self { entries }
    }

    /// Entries locating form inputs on `board`.
    pub fn write_entries(&self, board: &str) -> Vec<&SelectorEntry> {
        let mut out: Vec<&SelectorEntry> = self
            .entries
            .iter()
            .filter(|e| e.board == board && e.is_writable())
            .collect();
        out.sort_by_key(|e| e.priority);
        out
    }
}

impl Default for SelectorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, board: &str, field: JobField, selectors: &[&str], priority: i32, tier: SelectorTier) -> SelectorEntry {
        SelectorEntry {
            id: id.to_string(),
            board: board.to_string(),
            field,
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            priority,
            status: EntryStatus::Active,
            added: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(),
            tier,
            mode: SelectorMode::Read,
            notes: None,
        }
    }

    #[test]
    fn test_builtin_table_is_valid() {
        let registry = SelectorRegistry::builtin();
        registry.validate().unwrap();
        assert!(registry.len() > 30);
        assert!(registry.boards().contains(&"linkedin"));
    }

    #[test]
    fn test_lookup_orders_board_then_generic_then_heuristic() {
        let registry = SelectorRegistry::builtin();
        let ids: Vec<&str> = registry
            .lookup(Some("linkedin"), JobField::Title)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["li-title-unified", "li-title-detail", "generic-title", "heuristic-title"]);
    }

    #[test]
    fn test_unknown_board_gets_only_fallbacks() {
        let registry = SelectorRegistry::builtin();
        let entries = registry.lookup(None, JobField::Company);
        assert!(entries.iter().all(|e| e.board == GENERIC_BOARD));
        assert_eq!(entries[0].tier, SelectorTier::Generic);
        assert_eq!(entries.last().unwrap().tier, SelectorTier::Heuristic);
    }

    #[test]
    fn test_duplicate_selector_rejected() {
        let result = SelectorRegistry::new(vec![
            entry("a", "lever", JobField::Title, &["h2"], 1, SelectorTier::Board),
            entry("b", "lever", JobField::Title, &[".x", "h2"], 2, SelectorTier::Board),
        ]);
        assert!(matches!(result, Err(RegistryError::DuplicateSelector { .. })));
    }

    #[test]
    fn test_same_selector_allowed_across_fields() {
        SelectorRegistry::new(vec![
            entry("a", "lever", JobField::Title, &["h2"], 1, SelectorTier::Board),
            entry("b", "lever", JobField::Company, &["h2"], 1, SelectorTier::Board),
        ])
        .unwrap();
    }

    #[test]
    fn test_fallback_priority_must_exceed_board_priority() {
        let result = SelectorRegistry::new(vec![
            entry("a", "lever", JobField::Title, &["h2"], 10, SelectorTier::Board),
            entry("g", "generic", JobField::Title, &["h1"], 10, SelectorTier::Generic),
        ]);
        match result {
            Err(RegistryError::PriorityOrder {
                id, max_board_priority, ..
            }) => {
                assert_eq!(id, "g");
                assert_eq!(max_board_priority, 10);
            }
            other => panic!("expected priority error, got {other:?}"),
        }
    }

    #[test]
    fn test_tier_and_board_must_agree() {
        let result = SelectorRegistry::new(vec![entry(
            "h",
            "lever",
            JobField::Title,
            &["h2"],
            20,
            SelectorTier::Heuristic,
        )]);
        assert!(matches!(result, Err(RegistryError::TierMismatch { .. })));
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let result = SelectorRegistry::new(vec![entry(
            "a",
            "lever",
            JobField::Title,
            &["h2[["],
            1,
            SelectorTier::Board,
        )]);
        assert!(matches!(result, Err(RegistryError::InvalidSelector { .. })));
    }

    #[test]
    fn test_deprecated_and_write_only_entries_skipped() {
        let mut old = entry("old", "lever", JobField::Title, &[".old"], 1, SelectorTier::Board);
        old.status = EntryStatus::Deprecated;
        let mut form = entry("form", "lever", JobField::Title, &["input[name=title]"], 2, SelectorTier::Board);
        form.mode = SelectorMode::Write;
        let live = entry("live", "lever", JobField::Title, &["h2"], 3, SelectorTier::Board);
        let registry = SelectorRegistry::new(vec![old, form, live]).unwrap();

        let ids: Vec<&str> = registry
            .lookup(Some("lever"), JobField::Title)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["live"]);
        let write: Vec<&str> = registry.write_entries("lever").iter().map(|e| e.id.as_str()).collect();
        assert_eq!(write, vec!["form"]);
    }

    #[test]
    fn test_json_round_trip_defaults_tier_and_mode() {
        let json = r#"[{"id":"x","board":"lever","field":"title","selectors":["h2"],
                        "priority":1,"status":"active","added":"2026-02-10"}]"#;
        let registry = SelectorRegistry::from_json(json).unwrap();
        let e = &registry.entries()[0];
        assert_eq!(e.tier, SelectorTier::Board);
        assert_eq!(e.mode, SelectorMode::Read);

        let again = SelectorRegistry::from_json(&registry.to_json().unwrap()).unwrap();
        assert_eq!(again, registry);
    }

    #[test]
    fn test_health_status_marks_missing_entries_degraded() {
        let mut old = entry("old", "lever", JobField::Company, &[".old"], 1, SelectorTier::Board);
        old.status = EntryStatus::Deprecated;
        let registry = SelectorRegistry::new(vec![
            entry("hit", "lever", JobField::Title, &["h2"], 1, SelectorTier::Board),
            entry("miss", "lever", JobField::Title, &[".gone"], 2, SelectorTier::Board),
            old,
        ])
        .unwrap();

        let health = SelectorHealth::new();
        for (id, matched) in [("hit", true), ("miss", false), ("miss", false), ("old", true)] {
            health.record(&SelectorCheck {
                entry_id: id.to_string(),
                board: "lever".to_string(),
                field: JobField::Title,
                matched,
            });
        }

        let updated = registry.with_health_status(&health);
        assert_eq!(updated.get("hit").unwrap().status, EntryStatus::Active);
        assert_eq!(updated.get("miss").unwrap().status, EntryStatus::Degraded);
        assert_eq!(updated.get("old").unwrap().status, EntryStatus::Deprecated);
        assert_eq!(registry.get("miss").unwrap().status, EntryStatus::Active);
    }
}
