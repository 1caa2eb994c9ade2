//! Job Posting Extraction and Form Autofill Engine
//!
//! Turns semi-structured job posting pages into a normalized field set, and
//! detects, fills and un-fills the fields of job application forms.
//!
//! # Design Philosophy
//!
//! - Layered extraction: structured data first, heuristics last
//! - A field, once found by a stronger layer, is never overwritten
//! - Every guess carries provenance and a confidence
//! - Filling never overwrites operator input and can always be undone
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use jobscan::{collect, Pipeline, Scanner, SelectorRegistry};
//!
//! let registry = Arc::new(SelectorRegistry::builtin());
//! let scanner = Scanner::new(Pipeline::new(registry));
//!
//! let top = collect::collect(&html, "https://boards.greenhouse.io/acme/jobs/1", 0);
//! let report = scanner.scan(&[Some(top)], None).await?;
//! println!("{:?}", report.fields);
//! ```
//!
//! # Modules
//!
//! - [`registry`] - Selector tables and board detection
//! - [`collect`] - Per-context raw collection and aggregation
//! - [`pipeline`] - Layered job field extraction
//! - [`scoring`] - Signal voting and extraction validation
//! - [`dom`] - Live document model used by detection and fill
//! - [`detect`] - Form field detection and classification
//! - [`fill`] - Fill executor and undo
//! - [`engine`] - Per-context handlers returning wire responses
//! - [`scan`] - End-to-end scan orchestration
//! - [`testing`] - Mock collaborators and fixtures

pub mod collect;
pub mod detect;
pub mod dom;
pub mod engine;
pub mod error;
pub mod fill;
pub mod pipeline;
pub mod registry;
pub mod scan;
pub mod scoring;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use detect::FieldDetector;
pub use dom::Dom;
pub use engine::Engine;
pub use error::{DomError, EnrichmentError, FillError, JobscanError, RegistryError, Result};
pub use fill::{capture_undo_snapshot, FillExecutor, UndoManager};
pub use pipeline::{ExtractionTrace, JobExtraction, Pipeline};
pub use registry::{detect_application_form, detect_board, HealthSummary, SelectorCheck, SelectorHealth, SelectorRegistry};
pub use scan::{ScanReport, Scanner};
pub use scoring::{ValidationIssue, ValidationReport};
pub use traits::{
    accessor::{ClosedRootAccessor, DomShadowAccessor, NoClosedRootAccess},
    autofill::AutofillCore,
    enricher::{EnrichmentOutcome, Enricher},
};
pub use types::{
    AggregatorConfig, CollectResponse, DetectResponse, DetectedField, DetectorConfig, ExtractionSource,
    FieldExtraction, FieldType, FillInstruction, FillResponse, FillResult, InputKind, JobField, PipelineConfig,
    RawCollection, UndoEntry, UndoResponse, WireField,
};
