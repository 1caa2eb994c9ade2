//! Confidence math for form signals and extracted job fields.

pub mod confidence;
pub mod validator;

pub use confidence::{diminishing_score, resolve_field_type, signal_confidence, TypeResolution};
pub use validator::{
    completeness, field_confidence, is_placeholder, validate, ValidationIssue, ValidationReport,
};
