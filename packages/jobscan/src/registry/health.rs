//! Selector health tracking.
//!
//! The selector layers report every registry entry they try as matched or
//! missed. The tracker keeps running counts per entry across pipeline runs
//! and scores each entry by its match rate. Entries that keep missing are
//! suggested for repair and reported as degraded. State is in memory only.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::EntryStatus;
use crate::types::JobField;

/// Score at or above which an entry is healthy.
pub const HEALTHY_THRESHOLD: f64 = 0.7;

/// Score below which an entry counts as failed rather than degraded.
pub const FAILED_THRESHOLD: f64 = 0.3;

/// Score below which an entry is suggested for repair.
pub const REPAIR_THRESHOLD: f64 = 0.5;

/// Attempts needed before an entry can be suggested for repair.
pub const MIN_REPAIR_ATTEMPTS: u32 = 2;

/// One registry entry tried by a selector layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorCheck {
    pub entry_id: String,
    pub board: String,
    pub field: JobField,
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthClass {
    Healthy,
    Degraded,
    Failed,
}

/// Running counts for one registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorHealthRecord {
    pub entry_id: String,
    pub board: String,
    pub field: JobField,
    pub success_count: u32,
    pub fail_count: u32,
    pub total_attempts: u32,
    /// `success_count / total_attempts`, 1.0 before any attempt
    pub health_score: f64,
    pub last_verified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failed: Option<DateTime<Utc>>,
}

impl SelectorHealthRecord {
    fn new(check: &SelectorCheck, now: DateTime<Utc>) -> Self {
        Self {
            entry_id: check.entry_id.clone(),
            board: check.board.clone(),
            field: check.field,
            success_count: 0,
            fail_count: 0,
            total_attempts: 0,
            health_score: 1.0,
            last_verified: now,
            last_failed: None,
        }
    }

    pub fn class(&self) -> HealthClass {
        if self.health_score >= HEALTHY_THRESHOLD {
            HealthClass::Healthy
        } else if self.health_score >= FAILED_THRESHOLD {
            HealthClass::Degraded
        } else {
            HealthClass::Failed
        }
    }

    pub fn needs_repair(&self) -> bool {
        self.health_score < REPAIR_THRESHOLD && self.total_attempts >= MIN_REPAIR_ATTEMPTS
    }
}

/// Health of every tracked entry, optionally restricted to one board.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    /// Board the summary covers, `all` when unrestricted
    pub board: String,
    pub total_selectors: usize,
    pub healthy_count: usize,
    pub degraded_count: usize,
    pub failed_count: usize,
    pub overall_success_rate: f64,
    /// Entries that missed at least once, most recent miss first
    pub last_failed: Vec<SelectorHealthRecord>,
    /// Worst health first
    pub suggested_repairs: Vec<SelectorHealthRecord>,
}

/// In-memory health tracker, shared between pipeline runs.
#[derive(Debug, Default)]
pub struct SelectorHealth {
    records: RwLock<IndexMap<String, SelectorHealthRecord>>,
}

impl SelectorHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, check: &SelectorCheck) {
        self.record_at(check, Utc::now());
    }

    pub fn record_all<'a>(&self, checks: impl IntoIterator<Item = &'a SelectorCheck>) {
        let now = Utc::now();
        for check in checks {
            self.record_at(check, now);
        }
    }

    pub(crate) fn record_at(&self, check: &SelectorCheck, now: DateTime<Utc>) {
        let mut records = self.write();
        let record = records
            .entry(check.entry_id.clone())
            .or_insert_with(|| SelectorHealthRecord::new(check, now));

        record.total_attempts += 1;
        if check.matched {
            record.success_count += 1;
            record.last_verified = now;
        } else {
            record.fail_count += 1;
            record.last_failed = Some(now);
        }
        record.health_score = f64::from(record.success_count) / f64::from(record.total_attempts);
    }

    pub fn get(&self, entry_id: &str) -> Option<SelectorHealthRecord> {
        self.read().get(entry_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Entries below the repair threshold, worst first.
    pub fn suggested_repairs(&self) -> Vec<SelectorHealthRecord> {
        let mut repairs: Vec<_> = self.read().values().filter(|r| r.needs_repair()).cloned().collect();
        repairs.sort_by(|a, b| a.health_score.total_cmp(&b.health_score));
        repairs
    }

    /// Status the registry should carry for `entry_id`, if it was ever tried.
    pub fn suggested_status(&self, entry_id: &str) -> Option<EntryStatus> {
        self.read().get(entry_id).map(|record| match record.class() {
            HealthClass::Healthy => EntryStatus::Active,
            HealthClass::Degraded | HealthClass::Failed => EntryStatus::Degraded,
        })
    }

    pub fn summary(&self, board: Option<&str>) -> HealthSummary {
        let records = self.read();
        let filtered: Vec<&SelectorHealthRecord> = records
            .values()
            .filter(|r| board.map_or(true, |b| r.board == b))
            .collect();

        let count = |class: HealthClass| filtered.iter().filter(|r| r.class() == class).count();
        let successes: u32 = filtered.iter().map(|r| r.success_count).sum();
        let attempts: u32 = filtered.iter().map(|r| r.total_attempts).sum();

        let mut last_failed: Vec<SelectorHealthRecord> = filtered
            .iter()
            .filter(|r| r.last_failed.is_some())
            .map(|r| (*r).clone())
            .collect();
        last_failed.sort_by(|a, b| b.last_failed.cmp(&a.last_failed));

        let mut suggested_repairs: Vec<SelectorHealthRecord> =
            filtered.iter().filter(|r| r.needs_repair()).map(|r| (*r).clone()).collect();
        suggested_repairs.sort_by(|a, b| a.health_score.total_cmp(&b.health_score));

        HealthSummary {
            board: board.unwrap_or("all").to_string(),
            total_selectors: filtered.len(),
            healthy_count: count(HealthClass::Healthy),
            degraded_count: count(HealthClass::Degraded),
            failed_count: count(HealthClass::Failed),
            overall_success_rate: if attempts > 0 {
                f64::from(successes) / f64::from(attempts)
            } else {
                1.0
            },
            last_failed,
            suggested_repairs,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, SelectorHealthRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, SelectorHealthRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}
