//! Form field detection and classification.
//!
//! Detection walks the document (and shadow roots, depth-bounded), marks
//! every new candidate with a stable id attribute, evaluates the twelve
//! signals and resolves a field type by weighted voting. Re-running it is
//! idempotent: marked elements keep their id and are only re-classified.

pub mod label;
pub mod signals;
pub mod traverse;

use std::sync::Arc;

use tracing::{debug, info};

use crate::dom::{Dom, NodeId};
use crate::registry::SelectorRegistry;
use crate::scoring::{resolve_field_type, TypeResolution};
use crate::traits::accessor::{ClosedRootAccessor, NoClosedRootAccess};
use crate::types::{DetectedField, DetectorConfig, FieldType, InputKind};

pub use signals::{evaluate_all, match_pattern, SignalContext, SignalSet};
pub use traverse::{collect_candidates, is_candidate, Candidate, Fidelity};

/// Detects and classifies fillable fields.
#[derive(Clone)]
pub struct FieldDetector {
    registry: Arc<SelectorRegistry>,
    config: DetectorConfig,
    accessor: Arc<dyn ClosedRootAccessor>,
}

impl FieldDetector {
    pub fn new(registry: Arc<SelectorRegistry>) -> Self {
        Self {
            registry,
            config: DetectorConfig::default(),
            accessor: Arc::new(NoClosedRootAccess),
        }
    }

    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_accessor(mut self, accessor: Arc<dyn ClosedRootAccessor>) -> Self {
        self.accessor = accessor;
        self
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect fields, assigning stable ids to elements seen for the first time.
    pub fn detect(&self, dom: &mut Dom, board: Option<&str>, context_id: u32) -> Vec<DetectedField> {
        let candidates = collect_candidates(dom, self.accessor.as_ref(), self.config.max_depth);
        let mut next_id = self.next_free_ordinal(dom);
        let mut assigned = 0usize;

        let mut stable_ids = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            let existing = dom
                .attr(candidate.element, &self.config.id_attribute)
                .filter(|v| !v.is_empty())
                .map(str::to_string);
            let stable_id = match existing {
                Some(id) => id,
                None => {
                    let id = format!("{}{}", self.config.id_prefix, next_id);
                    next_id += 1;
                    assigned += 1;
                    dom.set_attr(candidate.element, &self.config.id_attribute, &id);
                    id
                }
            };
            stable_ids.push(stable_id);
        }

        let dom: &Dom = dom;
        let ctx = SignalContext {
            dom,
            registry: &self.registry,
            board,
            id_attribute: &self.config.id_attribute,
        };
        let mut fields: Vec<DetectedField> = candidates
            .iter()
            .zip(stable_ids)
            .map(|(candidate, stable_id)| self.build_field(&ctx, *candidate, stable_id, context_id))
            .collect();

        if fields.len() > self.config.max_fields {
            debug!(found = fields.len(), max = self.config.max_fields, "trimming detected fields");
            // stable sort keeps document order within each class
            fields.sort_by_key(|f| (!f.is_visible, !f.is_required, f.is_disabled));
            fields.truncate(self.config.max_fields);
        }

        info!(
            board = ?board,
            context_id,
            fields = fields.len(),
            newly_marked = assigned,
            "detection finished"
        );
        fields
    }

    fn build_field(&self, ctx: &SignalContext<'_>, candidate: Candidate, stable_id: String, context_id: u32) -> DetectedField {
        let dom = ctx.dom;
        let el = candidate.element;

        let (label, resolution, signals, registry_entry_id) = match candidate.fidelity {
            Fidelity::Full => {
                let set = evaluate_all(ctx, el);
                let resolution = resolve_field_type(&set.evaluations);
                (label::resolve_label(dom, el), resolution, set.evaluations, set.registry_entry_id)
            }
            Fidelity::BestEffort => (label::best_effort_label(dom, el), TypeResolution::unknown(), Vec::new(), None),
        };

        DetectedField {
            element: el,
            selector: self.config.selector_for(&stable_id),
            stable_id,
            label,
            field_type: resolution.field_type,
            confidence: resolution.confidence,
            category: resolution.field_type.category(),
            signals,
            is_visible: label::is_visible(dom, el),
            is_disabled: label::is_disabled(dom, el),
            is_required: label::is_required(dom, el),
            current_value: current_value(dom, el),
            input_kind: input_kind(dom, el),
            registry_entry_id,
            board: ctx.board.map(str::to_string),
            context_id,
        }
    }

    /// First ordinal not used by any id already carrying our prefix.
    fn next_free_ordinal(&self, dom: &Dom) -> usize {
        dom.all_elements()
            .into_iter()
            .filter_map(|el| dom.attr(el, &self.config.id_attribute))
            .filter_map(|id| id.strip_prefix(self.config.id_prefix.as_str()))
            .filter_map(|n| n.parse::<usize>().ok())
            .map(|n| n + 1)
            .max()
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for FieldDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDetector")
            .field("entries", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Fill strategy selector for an element.
pub fn input_kind(dom: &Dom, el: NodeId) -> InputKind {
    match dom.element(el) {
        Some(e) if e.tag() == "textarea" => InputKind::Textarea,
        Some(e) if e.tag() == "select" => InputKind::Select,
        Some(e) if e.tag() == "input" => InputKind::from(e.input_type().as_str()),
        Some(e) if e.is_content_editable() => InputKind::ContentEditable,
        Some(e) => InputKind::Other(e.tag().to_string()),
        None => InputKind::Other(String::new()),
    }
}

/// Value as the undo snapshot records it; toggles report `true`/`false`.
pub fn current_value(dom: &Dom, el: NodeId) -> String {
    match input_kind(dom, el) {
        InputKind::Checkbox | InputKind::Radio => dom.checked(el).to_string(),
        _ => dom.value(el),
    }
}

/// Whether detection found the field's type at all.
pub fn is_classified(field: &DetectedField) -> bool {
    !matches!(field.field_type, FieldType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::accessor::DomShadowAccessor;
    use crate::types::FieldCategory;

    fn detector() -> FieldDetector {
        FieldDetector::new(Arc::new(SelectorRegistry::builtin()))
    }

    const FORM: &str = r#"<form>
        <label for="fn">First name</label><input id="fn" name="first_name" required>
        <input type="email" name="email" autocomplete="email">
        <textarea name="cover_letter"></textarea>
    </form>"#;

    #[test]
    fn test_detects_and_classifies() {
        let mut dom = Dom::parse(FORM, "https://a.test/apply");
        let fields = detector().detect(&mut dom, None, 0);

        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].stable_id, "jf-field-0");
        assert_eq!(fields[0].field_type, FieldType::FirstName);
        assert_eq!(fields[0].label, "First name");
        assert!(fields[0].is_required);
        assert_eq!(fields[1].field_type, FieldType::Email);
        assert_eq!(fields[1].category, FieldCategory::Personal);
        assert_eq!(fields[2].field_type, FieldType::CoverLetterText);
        assert_eq!(fields[2].input_kind, InputKind::Textarea);
        assert_eq!(dom.attr(fields[2].element, "data-jf-opid"), Some("jf-field-2"));
    }

    #[test]
    fn test_redetection_keeps_ids() {
        let mut dom = Dom::parse(FORM, "");
        let first = detector().detect(&mut dom, None, 0);
        let second = detector().detect(&mut dom, None, 0);
        let ids = |fields: &[DetectedField]| fields.iter().map(|f| f.stable_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first[1].confidence, second[1].confidence);
    }

    #[test]
    fn test_new_elements_get_fresh_ids() {
        let mut dom = Dom::parse(r#"<input data-jf-opid="jf-field-4"><input>"#, "");
        let fields = detector().detect(&mut dom, None, 0);
        assert_eq!(fields[0].stable_id, "jf-field-4");
        assert_eq!(fields[1].stable_id, "jf-field-5");
    }

    #[test]
    fn test_best_effort_fields_in_closed_roots() {
        let markup = r#"<x-widget><template shadowrootmode="closed"><input name="email" placeholder="Email"></template></x-widget>"#;
        let mut dom = Dom::parse(markup, "");
        assert!(detector().detect(&mut dom, None, 0).is_empty());

        let fields = detector()
            .with_accessor(Arc::new(DomShadowAccessor))
            .detect(&mut dom, None, 0);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].label, "Email");
        assert_eq!(fields[0].field_type, FieldType::Unknown);
        assert!(fields[0].signals.is_empty());
        assert!(!is_classified(&fields[0]));
    }

    #[test]
    fn test_trim_prefers_visible_required_enabled() {
        let markup = r#"<input name="a" hidden><input name="b" disabled><input name="c"><input name="d" required>"#;
        let mut dom = Dom::parse(markup, "");
        let fields = detector()
            .with_config(DetectorConfig::default().with_max_fields(2))
            .detect(&mut dom, None, 0);
        let names: Vec<_> = fields.iter().map(|f| dom.attr(f.element, "name").unwrap()).collect();
        assert_eq!(names, vec!["d", "c"]);
    }
}
