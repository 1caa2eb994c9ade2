//! Per-run extraction state.

use tracing::debug;

use super::normalize::normalize_value;
use super::trace::{Attempt, ExtractionTrace, GateAction, GateDecision, LayerName, Rejection};
use crate::registry::{SelectorCheck, SelectorEntry};
use crate::scoring::completeness;
use crate::types::{ExtractionSource, FieldExtraction, FieldMap, JobField, Observation};

/// State owned by one pipeline invocation.
///
/// A field freezes on its first non-empty value; later offers are kept as
/// observations but never overwrite it.
#[derive(Debug)]
pub struct ExtractionContext {
    pub url: String,
    pub board: Option<String>,
    fields: FieldMap,
    observations: Vec<Observation>,
    trace: ExtractionTrace,
    max_value_len: usize,
    min_field_confidence: f64,
}

impl ExtractionContext {
    pub fn new(url: impl Into<String>, board: Option<String>, max_value_len: usize, min_field_confidence: f64) -> Self {
        let url = url.into();
        Self {
            trace: ExtractionTrace::new(url.clone(), board.clone()),
            url,
            board,
            fields: FieldMap::new(),
            observations: Vec::new(),
            max_value_len,
            min_field_confidence,
        }
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn trace(&self) -> &ExtractionTrace {
        &self.trace
    }

    pub fn trace_mut(&mut self) -> &mut ExtractionTrace {
        &mut self.trace
    }

    pub fn is_frozen(&self, field: JobField) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn all_frozen(&self) -> bool {
        JobField::ALL.iter().all(|f| self.is_frozen(*f))
    }

    /// Fields still open, in extraction order.
    pub fn pending_fields(&self) -> Vec<JobField> {
        JobField::ALL.into_iter().filter(|f| !self.is_frozen(*f)).collect()
    }

    pub fn completeness(&self) -> f64 {
        completeness(&self.fields, self.min_field_confidence)
    }

    pub fn record_layer(&mut self, layer: LayerName) {
        self.trace.layers_executed.push(layer);
    }

    /// Note whether a registry entry matched anything on this page.
    pub fn record_selector(&mut self, entry: &SelectorEntry, matched: bool) {
        self.trace.selector_checks.push(SelectorCheck {
            entry_id: entry.id.clone(),
            board: entry.board.clone(),
            field: entry.field,
            matched,
        });
    }

    /// Offer a raw value for `field`. Returns true when it froze the field.
    pub fn offer(
        &mut self,
        layer: LayerName,
        field: JobField,
        raw: &str,
        source: ExtractionSource,
        origin: &str,
    ) -> bool {
        let value = normalize_value(raw, self.max_value_len);
        if value.is_empty() {
            self.reject(layer, field, source, origin, Rejection::EmptyValue);
            return false;
        }

        self.observations.push(Observation {
            field,
            value: value.clone(),
            source,
        });

        if self.is_frozen(field) {
            self.reject(layer, field, source, origin, Rejection::AlreadyFrozen);
            return false;
        }

        debug!(field = %field, source = %source, origin, len = value.len(), "field frozen");
        self.fields.insert(field, FieldExtraction::new(value, source));
        self.trace.attempts.push(Attempt {
            layer,
            field,
            source,
            origin: origin.to_string(),
            accepted: true,
            rejection: None,
        });
        true
    }

    pub fn reject(
        &mut self,
        layer: LayerName,
        field: JobField,
        source: ExtractionSource,
        origin: &str,
        rejection: Rejection,
    ) {
        self.trace.attempts.push(Attempt {
            layer,
            field,
            source,
            origin: origin.to_string(),
            accepted: false,
            rejection: Some(rejection),
        });
    }

    /// Record the gate after `layer`. Returns true when the run may stop.
    pub fn gate(&mut self, after: LayerName) -> bool {
        let frozen_fields = JobField::ALL.iter().filter(|f| self.is_frozen(**f)).count();
        let action = if self.all_frozen() {
            GateAction::ShortCircuit
        } else {
            GateAction::Continue
        };
        let completeness = self.completeness();
        debug!(after = ?after, completeness, frozen_fields, action = ?action, "gate");
        self.trace.gate_decisions.push(GateDecision {
            after,
            completeness,
            frozen_fields,
            action,
        });
        action == GateAction::ShortCircuit
    }

    /// Hand the results over once the run is done.
    pub fn into_parts(self) -> (FieldMap, Vec<Observation>, ExtractionTrace) {
        (self.fields, self.observations, self.trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ExtractionContext {
        ExtractionContext::new("https://a.test", None, 1000, 0.2)
    }

    #[test]
    fn test_first_value_freezes_field() {
        let mut ctx = context();
        assert!(ctx.offer(LayerName::StructuredData, JobField::Title, " Rust  Engineer ", ExtractionSource::JsonLd, "title"));
        assert!(!ctx.offer(LayerName::BoardSelector, JobField::Title, "Other", ExtractionSource::BoardSelector, "x"));

        assert_eq!(ctx.fields()[&JobField::Title].value, "Rust Engineer");
        assert_eq!(ctx.fields()[&JobField::Title].source, ExtractionSource::JsonLd);
        assert_eq!(ctx.observations().len(), 2);
        let rejected = &ctx.trace().attempts[1];
        assert_eq!(rejected.rejection, Some(Rejection::AlreadyFrozen));
    }

    #[test]
    fn test_empty_value_does_not_freeze() {
        let mut ctx = context();
        assert!(!ctx.offer(LayerName::StructuredData, JobField::Company, "<b> </b>", ExtractionSource::JsonLd, "hiringOrganization"));
        assert!(!ctx.is_frozen(JobField::Company));
        assert!(ctx.observations().is_empty());
        assert!(ctx.offer(LayerName::GenericSelector, JobField::Company, "Acme", ExtractionSource::GenericSelector, "generic-company"));
    }

    #[test]
    fn test_gate_short_circuits_only_when_all_fields_frozen() {
        let mut ctx = context();
        for field in JobField::REQUIRED {
            ctx.offer(LayerName::StructuredData, field, "value here", ExtractionSource::JsonLd, "x");
        }
        assert!(!ctx.gate(LayerName::StructuredData));
        for field in [JobField::Location, JobField::Salary, JobField::EmploymentType] {
            ctx.offer(LayerName::BoardSelector, field, "value", ExtractionSource::BoardSelector, "y");
        }
        assert!(ctx.gate(LayerName::BoardSelector));
        let decisions = &ctx.trace().gate_decisions;
        assert_eq!(decisions[0].action, GateAction::Continue);
        assert_eq!(decisions[0].completeness, 1.0);
        assert_eq!(decisions[1].action, GateAction::ShortCircuit);
    }
}
