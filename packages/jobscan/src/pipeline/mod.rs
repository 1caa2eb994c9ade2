//! Layered job posting extraction.
//!
//! A page passes through a fixed sequence of layers, strongest provenance
//! first:
//!
//! 1. structured data (JSON-LD `JobPosting`, then Open Graph tags)
//! 2. board-specific registry selectors
//! 3. generic registry selectors
//! 4. heuristics
//! 5. optional external enrichment
//!
//! A field freezes on its first non-empty value, so a later layer can never
//! overwrite an earlier one. A gate after each layer stops the run once every
//! field is frozen. Everything the run did is kept in an [`ExtractionTrace`].

mod context;
mod layers;
pub mod normalize;
pub mod trace;

use std::sync::Arc;

use scraper::Html;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::registry::{SelectorHealth, SelectorRegistry};
use crate::scoring::ValidationReport;
use crate::traits::enricher::Enricher;
use crate::types::{FieldMap, Observation, PipelineConfig, RawCollection};

pub use context::ExtractionContext;
pub use trace::{Attempt, ExtractionTrace, GateAction, GateDecision, LayerName, Rejection};

use layers::enrichment::EnrichmentInput;

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobExtraction {
    pub fields: FieldMap,
    pub observations: Vec<Observation>,
    pub validation: ValidationReport,
    pub trace: ExtractionTrace,
}

/// The extraction pipeline.
///
/// Cheap to clone; the registry and enricher are shared.
#[derive(Clone)]
pub struct Pipeline {
    registry: Arc<SelectorRegistry>,
    config: PipelineConfig,
    enricher: Option<Arc<dyn Enricher>>,
    health: Option<Arc<SelectorHealth>>,
}

impl Pipeline {
    pub fn new(registry: Arc<SelectorRegistry>) -> Self {
        Self {
            registry,
            config: PipelineConfig::default(),
            enricher: None,
            health: None,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn Enricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    /// Feed every run's selector checks into `health`.
    pub fn with_health(mut self, health: Arc<SelectorHealth>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn health(&self) -> Option<&SelectorHealth> {
        self.health.as_deref()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SelectorRegistry {
        &self.registry
    }

    /// Extract job fields from one collected context.
    ///
    /// `board` is the detected board, if any. Never fails: selector errors
    /// count as no match and enricher errors are recorded in the trace.
    pub async fn run(&self, collection: &RawCollection, board: Option<&str>) -> JobExtraction {
        let mut ctx = ExtractionContext::new(
            collection.url.clone(),
            board.map(str::to_string),
            self.config.max_description_len,
            self.config.min_field_confidence,
        );

        // The parsed document is not Send; it must be gone before any await.
        let (stopped, enrichment_input) = {
            let document = Html::parse_document(&collection.markup);
            let stopped = self.run_layers(&document, collection, &mut ctx);
            let input = match &self.enricher {
                Some(_) if !stopped => Some(EnrichmentInput::from_document(
                    &document,
                    self.config.enrichment_max_chars,
                )),
                _ => None,
            };
            (stopped, input)
        };

        if let (Some(enricher), Some(input)) = (&self.enricher, enrichment_input) {
            if layers::enrichment::should_run(&mut ctx, &self.config, true) {
                layers::enrichment::run(enricher.as_ref(), &input, &mut ctx).await;
                ctx.gate(LayerName::Enrichment);
            }
        }

        let validation = layers::post_process::run(&mut ctx, self.config.min_field_confidence);
        let (fields, observations, trace) = ctx.into_parts();
        if let Some(health) = &self.health {
            health.record_all(&trace.selector_checks);
        }

        info!(
            run_id = %trace.run_id,
            url = %trace.url,
            board = ?trace.board,
            fields = fields.len(),
            completeness = validation.completeness,
            short_circuit = stopped,
            enrichment = trace.enrichment_triggered,
            issues = validation.issues.len(),
            "extraction finished"
        );

        JobExtraction {
            fields,
            observations,
            validation,
            trace,
        }
    }

    /// Synchronous layers 1-4. Returns true when a gate stopped the run.
    fn run_layers(&self, document: &Html, collection: &RawCollection, ctx: &mut ExtractionContext) -> bool {
        layers::structured::run(document, collection, ctx);
        if ctx.gate(LayerName::StructuredData) {
            return true;
        }
        layers::selectors::run_board(document, &self.registry, ctx);
        if ctx.gate(LayerName::BoardSelector) {
            return true;
        }
        layers::selectors::run_generic(document, &self.registry, ctx);
        if ctx.gate(LayerName::GenericSelector) {
            return true;
        }
        layers::heuristic::run(document, &self.registry, &self.config, ctx);
        ctx.gate(LayerName::Heuristic)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("entries", &self.registry.len())
            .field("config", &self.config)
            .field("enricher", &self.enricher.is_some())
            .field("health", &self.health.is_some())
            .finish()
    }
}
