//! Execution trace of one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::SelectorCheck;
use crate::types::{ExtractionSource, JobField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerName {
    StructuredData,
    BoardSelector,
    GenericSelector,
    Heuristic,
    Enrichment,
    PostProcess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateAction {
    ShortCircuit,
    Continue,
}

/// Decision taken at a gate between layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDecision {
    /// Layer that ran just before the gate
    pub after: LayerName,
    pub completeness: f64,
    pub frozen_fields: usize,
    pub action: GateAction,
}

/// One value a layer offered for a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub layer: LayerName,
    pub field: JobField,
    pub source: ExtractionSource,
    /// Selector entry id, JSON-LD key or meta property that produced the value
    pub origin: String,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rejection {
    /// Nothing left after normalization
    EmptyValue,
    /// An earlier tier already set the field
    AlreadyFrozen,
    /// Below the layer's own quality bar
    TooShort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionTrace {
    pub run_id: Uuid,
    pub url: String,
    pub board: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub layers_executed: Vec<LayerName>,
    pub gate_decisions: Vec<GateDecision>,
    pub attempts: Vec<Attempt>,
    /// Every registry entry the selector layers tried, hit or miss
    #[serde(default)]
    pub selector_checks: Vec<SelectorCheck>,
    /// Free-form diagnostics, e.g. malformed structured data
    pub notes: Vec<String>,
    pub enrichment_triggered: bool,
    pub completeness: f64,
}

impl ExtractionTrace {
    pub fn new(url: impl Into<String>, board: Option<String>) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            url: url.into(),
            board,
            started_at: Utc::now(),
            finished_at: None,
            layers_executed: Vec::new(),
            gate_decisions: Vec::new(),
            attempts: Vec::new(),
            selector_checks: Vec::new(),
            notes: Vec::new(),
            enrichment_triggered: false,
            completeness: 0.0,
        }
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Accepted attempts, i.e. what each layer contributed.
    pub fn contributions(&self) -> impl Iterator<Item = &Attempt> {
        self.attempts.iter().filter(|a| a.accepted)
    }

    /// Accepted attempt that set `field`, if any.
    pub fn contribution_for(&self, field: JobField) -> Option<&Attempt> {
        self.contributions().find(|a| a.field == field)
    }

    pub fn ran(&self, layer: LayerName) -> bool {
        self.layers_executed.contains(&layer)
    }

    /// Wall-clock duration, once the run finished.
    pub fn elapsed_ms(&self) -> Option<i64> {
        self.finished_at.map(|end| (end - self.started_at).num_milliseconds())
    }
}
