//! Extraction validation.
//!
//! Pure functions over a finished field map: per-field confidence from the
//! provenance tier, completeness over the required fields, and advisory
//! issues. Nothing here fails; issues are for display.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::{ExtractionSource, FieldMap, JobField, Observation};

/// Values that stand in for missing data.
pub const PLACEHOLDER_VALUES: &[&str] = &[
    "n/a",
    "na",
    "unavailable",
    "tbd",
    "unknown",
    "not available",
    "not specified",
    "none",
    "-",
    "...",
];

/// Descriptions shorter than this are flagged.
pub const MIN_DESCRIPTION_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ValidationIssue {
    MissingTitle,
    MissingCompany,
    MissingDescription,
    ShortDescription,
    PlaceholderTitle,
    PlaceholderCompany,
    TitleMatchesCompany,
    /// Two tiers produced different values for the same field
    ConflictingValues { field: JobField },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingTitle => f.write_str("missing_title"),
            ValidationIssue::MissingCompany => f.write_str("missing_company"),
            ValidationIssue::MissingDescription => f.write_str("missing_description"),
            ValidationIssue::ShortDescription => f.write_str("short_description"),
            ValidationIssue::PlaceholderTitle => f.write_str("placeholder_title"),
            ValidationIssue::PlaceholderCompany => f.write_str("placeholder_company"),
            ValidationIssue::TitleMatchesCompany => f.write_str("title_matches_company"),
            ValidationIssue::ConflictingValues { field } => write!(f, "conflicting_values({field})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub completeness: f64,
    /// Confidence of every job field, 0 for fields never found.
    pub confidence: IndexMap<JobField, f64>,
}

pub fn is_placeholder(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    PLACEHOLDER_VALUES.contains(&lower.as_str())
}

/// Confidence of one value given the tier that produced it.
pub fn field_confidence(field: JobField, value: &str, source: ExtractionSource) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let mut confidence = source.weight();
    if is_placeholder(trimmed) {
        confidence *= 0.1;
    }
    if matches!(field, JobField::Title | JobField::Company) {
        let len = trimmed.chars().count();
        if len < 3 {
            confidence *= 0.5;
        } else if len > 200 {
            confidence *= 0.7;
        }
    }
    round2(confidence)
}

/// Fraction of required fields that are present with at least `min_confidence`.
pub fn completeness(fields: &FieldMap, min_confidence: f64) -> f64 {
    let complete = JobField::REQUIRED
        .iter()
        .filter(|field| {
            fields
                .get(*field)
                .is_some_and(|e| field_confidence(**field, &e.value, e.source) >= min_confidence && !e.value.trim().is_empty())
        })
        .count();
    round2(complete as f64 / JobField::REQUIRED.len() as f64)
}

/// Validate a finished extraction.
pub fn validate(fields: &FieldMap, observations: &[Observation], min_confidence: f64) -> ValidationReport {
    let mut confidence = IndexMap::new();
    for field in JobField::ALL {
        let score = fields
            .get(&field)
            .map(|e| field_confidence(field, &e.value, e.source))
            .unwrap_or(0.0);
        confidence.insert(field, score);
    }

    let value_of = |field: JobField| fields.get(&field).map(|e| e.value.trim()).unwrap_or_default();
    let title = value_of(JobField::Title);
    let company = value_of(JobField::Company);
    let description = value_of(JobField::Description);

    let mut issues = Vec::new();
    if !title.is_empty() && is_placeholder(title) {
        issues.push(ValidationIssue::PlaceholderTitle);
    }
    if !company.is_empty() && is_placeholder(company) {
        issues.push(ValidationIssue::PlaceholderCompany);
    }
    if title.is_empty() || confidence[&JobField::Title] == 0.0 {
        issues.push(ValidationIssue::MissingTitle);
    }
    if company.is_empty() || confidence[&JobField::Company] == 0.0 {
        issues.push(ValidationIssue::MissingCompany);
    }
    if description.is_empty() {
        issues.push(ValidationIssue::MissingDescription);
    } else if description.chars().count() < MIN_DESCRIPTION_LEN {
        issues.push(ValidationIssue::ShortDescription);
    }
    if !title.is_empty() && title.to_lowercase() == company.to_lowercase() {
        issues.push(ValidationIssue::TitleMatchesCompany);
    }
    for field in conflicting_fields(observations) {
        issues.push(ValidationIssue::ConflictingValues { field });
    }

    let is_valid = !issues.iter().any(|issue| {
        matches!(
            issue,
            ValidationIssue::MissingTitle
                | ValidationIssue::MissingCompany
                | ValidationIssue::PlaceholderTitle
                | ValidationIssue::PlaceholderCompany
        )
    });

    ValidationReport {
        is_valid,
        issues,
        completeness: completeness(fields, min_confidence),
        confidence,
    }
}

/// Fields where two trusted tiers disagree.
///
/// Repaired, heuristic and enrichment values are too noisy to count. Values that
/// differ only in case, or where one contains the other, agree.
fn conflicting_fields(observations: &[Observation]) -> Vec<JobField> {
    let trusted: Vec<(JobField, ExtractionSource, String)> = observations
        .iter()
        .filter(|o| o.source < ExtractionSource::HeuristicRepair)
        .map(|o| (o.field, o.source, o.value.trim().to_lowercase()))
        .filter(|(_, _, v)| !v.is_empty())
        .collect();

    let mut out: Vec<JobField> = Vec::new();
    for field in JobField::ALL {
        let values: Vec<&(JobField, ExtractionSource, String)> = trusted.iter().filter(|o| o.0 == field).collect();
        let disagree = values.iter().enumerate().any(|(i, a)| {
            values[i + 1..]
                .iter()
                .any(|b| a.1 != b.1 && !a.2.contains(b.2.as_str()) && !b.2.contains(a.2.as_str()))
        });
        if disagree {
            out.push(field);
        }
    }
    out
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
