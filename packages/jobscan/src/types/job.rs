//! Job posting fields and extraction provenance.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One logical field of a job posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobField {
    Title,
    Company,
    Description,
    Location,
    Salary,
    EmploymentType,
}

impl JobField {
    /// Every field, in extraction order.
    pub const ALL: [JobField; 6] = [
        JobField::Title,
        JobField::Company,
        JobField::Description,
        JobField::Location,
        JobField::Salary,
        JobField::EmploymentType,
    ];

    /// Fields that count toward completeness.
    pub const REQUIRED: [JobField; 3] = [JobField::Title, JobField::Company, JobField::Description];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobField::Title => "title",
            JobField::Company => "company",
            JobField::Description => "description",
            JobField::Location => "location",
            JobField::Salary => "salary",
            JobField::EmploymentType => "employmentType",
        }
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }
}

impl fmt::Display for JobField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provenance tier: which layer produced a value.
///
/// Declaration order is precedence order. The tier fixes the confidence
/// ceiling of a value regardless of what the value looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionSource {
    /// schema.org JobPosting structured data
    JsonLd,
    /// Open Graph meta tags
    MetaTag,
    /// Board-specific registry selector
    BoardSelector,
    /// Cross-site registry selector
    GenericSelector,
    /// Replacement selector found for a field the registry missed
    HeuristicRepair,
    /// Structural last-resort fallback
    Heuristic,
    /// External text-understanding collaborator
    Enrichment,
}

impl ExtractionSource {
    /// Base confidence for values from this tier.
    pub fn weight(&self) -> f64 {
        match self {
            ExtractionSource::JsonLd => 0.95,
            ExtractionSource::MetaTag => 0.90,
            ExtractionSource::BoardSelector => 0.85,
            ExtractionSource::GenericSelector => 0.60,
            ExtractionSource::HeuristicRepair => 0.40,
            ExtractionSource::Heuristic => 0.30,
            ExtractionSource::Enrichment => 0.20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionSource::JsonLd => "json-ld",
            ExtractionSource::MetaTag => "meta-tag",
            ExtractionSource::BoardSelector => "board-selector",
            ExtractionSource::GenericSelector => "generic-selector",
            ExtractionSource::HeuristicRepair => "heuristic-repair",
            ExtractionSource::Heuristic => "heuristic",
            ExtractionSource::Enrichment => "enrichment",
        }
    }
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved value plus the tier that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldExtraction {
    pub value: String,
    pub source: ExtractionSource,
}

impl FieldExtraction {
    pub fn new(value: impl Into<String>, source: ExtractionSource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }
}

/// Field map of one extraction run, in insertion order.
pub type FieldMap = IndexMap<JobField, FieldExtraction>;

/// A value some layer saw for a field, whether or not it was kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub field: JobField,
    pub value: String,
    pub source: ExtractionSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_weights_strictly_decrease() {
        let tiers = [
            ExtractionSource::JsonLd,
            ExtractionSource::MetaTag,
            ExtractionSource::BoardSelector,
            ExtractionSource::GenericSelector,
            ExtractionSource::HeuristicRepair,
            ExtractionSource::Heuristic,
            ExtractionSource::Enrichment,
        ];
        for pair in tiers.windows(2) {
            assert!(pair[0].weight() > pair[1].weight(), "{} vs {}", pair[0], pair[1]);
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_field_serializes_camel_case() {
        let json = serde_json::to_string(&JobField::EmploymentType).unwrap();
        assert_eq!(json, "\"employmentType\"");
        assert!(JobField::Description.is_required());
        assert!(!JobField::Salary.is_required());
    }
}
