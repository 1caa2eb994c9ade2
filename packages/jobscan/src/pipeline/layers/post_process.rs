//! Final validation pass.

use chrono::Utc;

use crate::pipeline::context::ExtractionContext;
use crate::pipeline::trace::LayerName;
use crate::scoring::{validate, ValidationReport};

pub(crate) fn run(ctx: &mut ExtractionContext, min_field_confidence: f64) -> ValidationReport {
    ctx.record_layer(LayerName::PostProcess);
    let report = validate(ctx.fields(), ctx.observations(), min_field_confidence);
    let trace = ctx.trace_mut();
    trace.completeness = report.completeness;
    trace.finished_at = Some(Utc::now());
    report
}
