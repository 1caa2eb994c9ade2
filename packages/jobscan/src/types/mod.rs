//! Data types shared across modules.

pub mod collect;
pub mod config;
pub mod field;
pub mod fill;
pub mod job;

pub use collect::{CollectResponse, RawCollection};
pub use config::{AggregatorConfig, DetectorConfig, PipelineConfig};
pub use field::{
    DetectedField, FieldCategory, FieldType, InputKind, SignalEvaluation, SignalKind, WireField,
};
pub use fill::{DetectResponse, FillInstruction, FillResponse, FillResult, UndoEntry, UndoResponse};
pub use job::{ExtractionSource, FieldExtraction, FieldMap, JobField, Observation};
