//! Configuration types for extraction, detection and aggregation.

use serde::{Deserialize, Serialize};

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum per-field confidence for a required field to count as complete.
    ///
    /// Default: 0.20.
    pub min_field_confidence: f64,

    /// Completeness below which the enrichment collaborator is consulted.
    ///
    /// Default: 1.0 (enrich whenever any required field is missing or weak).
    /// Set to 0.0 to never enrich.
    pub enrichment_threshold: f64,

    /// Maximum characters of page text handed to the enrichment collaborator.
    pub enrichment_max_chars: usize,

    /// Heuristic descriptions shorter than this are ignored.
    pub heuristic_min_description_len: usize,

    /// Any value longer than this is truncated after normalization.
    pub max_description_len: usize,

    /// Search for replacement selectors when the heuristic layer leaves a
    /// field open. Default: false.
    #[serde(default)]
    pub heuristic_repair: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_field_confidence: 0.20,
            enrichment_threshold: 1.0,
            enrichment_max_chars: 12_000,
            heuristic_min_description_len: 50,
            max_description_len: 20_000,
            heuristic_repair: false,
        }
    }
}

impl PipelineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum confidence for completeness.
    pub fn with_min_field_confidence(mut self, confidence: f64) -> Self {
        self.min_field_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Set the enrichment threshold.
    pub fn with_enrichment_threshold(mut self, threshold: f64) -> Self {
        self.enrichment_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the text budget for enrichment.
    pub fn with_enrichment_max_chars(mut self, max_chars: usize) -> Self {
        self.enrichment_max_chars = max_chars;
        self
    }

    /// Set the minimum heuristic description length.
    pub fn with_heuristic_min_description_len(mut self, len: usize) -> Self {
        self.heuristic_min_description_len = len;
        self
    }

    /// Enable or disable selector repair in the heuristic layer.
    pub fn with_heuristic_repair(mut self, enabled: bool) -> Self {
        self.heuristic_repair = enabled;
        self
    }
}

/// Configuration for form field detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Maximum nesting depth of embedded roots to descend into. Default: 5.
    pub max_depth: usize,

    /// Maximum fields returned per detection. Default: 200.
    pub max_fields: usize,

    /// Attribute holding the stable identifier.
    pub id_attribute: String,

    /// Prefix of generated stable identifiers.
    pub id_prefix: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_fields: 200,
            id_attribute: "data-jf-opid".to_string(),
            id_prefix: "jf-field-".to_string(),
        }
    }
}

impl DetectorConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the traversal depth bound.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the field limit.
    pub fn with_max_fields(mut self, max: usize) -> Self {
        self.max_fields = max;
        self
    }

    /// Selector locating the element carrying `stable_id`.
    pub fn selector_for(&self, stable_id: &str) -> String {
        format!(
            "[{}=\"{}\"]",
            self.id_attribute,
            stable_id.replace('\\', "\\\\").replace('"', "\\\"")
        )
    }
}

/// Configuration for multi-context aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Primary context wins outright when its markup is longer than this.
    pub primary_min_markup_len: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            primary_min_markup_len: 500,
        }
    }
}

impl AggregatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary_min_markup_len(mut self, len: usize) -> Self {
        self.primary_min_markup_len = len;
        self
    }
}
