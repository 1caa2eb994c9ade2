//! Writing operator-approved values into live form fields.
//!
//! A batch is all or nothing at the preparation stage: the undo snapshot is
//! captured for every target before the first write, and a failed capture
//! reports the whole batch as failed without touching the document.

pub mod native_setter;
pub mod undo;

use tracing::{debug, info, warn};

pub use undo::{capture_undo_snapshot, UndoManager};

use self::native_setter::{
    default_option_index, set_checkbox, set_content_editable, set_radio, set_select_value, set_text_value,
};
use crate::detect::{current_value, input_kind};
use crate::dom::{Dom, NodeId};
use crate::types::{DetectorConfig, FillInstruction, FillResponse, FillResult, InputKind, UndoEntry, UndoResponse};

/// Runs fill batches and their undo against one document.
#[derive(Debug, Clone)]
pub struct FillExecutor {
    undo: UndoManager,
}

impl Default for FillExecutor {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}

impl FillExecutor {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            undo: UndoManager::new(config.id_attribute.clone()),
        }
    }

    /// Apply `instructions` in order. Results are 1:1 with instructions.
    pub fn fill(&self, dom: &mut Dom, instructions: &[FillInstruction]) -> FillResponse {
        let undo_entries = match capture_undo_snapshot(dom, instructions) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, count = instructions.len(), "fill batch aborted before any write");
                return FillResponse::aborted(instructions.len(), err.to_string());
            }
        };

        let results: Vec<FillResult> = instructions
            .iter()
            .map(|instruction| fill_one(dom, instruction))
            .collect();
        let filled = results.iter().filter(|r| r.success).count();
        let failed = results.len() - filled;
        info!(filled, failed, "fill batch finished");

        FillResponse {
            filled,
            failed,
            results,
            undo_entries,
            error: None,
        }
    }

    pub fn undo(&self, dom: &mut Dom, entries: &[UndoEntry]) -> UndoResponse {
        let response = self.undo.undo(dom, entries);
        info!(undone = response.undone, failed = response.failed, "undo finished");
        response
    }
}

fn fill_one(dom: &mut Dom, instruction: &FillInstruction) -> FillResult {
    let el = match dom.query_selector_deep(&instruction.selector) {
        Ok(Some(el)) => el,
        Ok(None) => return FillResult::failed(instruction, String::new(), "element not found"),
        Err(err) => return FillResult::failed(instruction, String::new(), err.to_string()),
    };
    let previous = current_value(dom, el);
    let kind = input_kind(dom, el);

    if holds_operator_value(dom, el, &kind) {
        debug!(stable_id = %instruction.stable_id, "keeping operator value");
        return FillResult::failed(instruction, previous, "field already holds a value");
    }

    match kind {
        InputKind::File => FillResult::failed(instruction, previous, "file inputs cannot be filled"),
        InputKind::Select => {
            if set_select_value(dom, el, &instruction.value) {
                FillResult::ok(instruction, previous)
            } else {
                FillResult::failed(instruction, previous, format!("no option matches {:?}", instruction.value))
            }
        }
        InputKind::Checkbox => {
            set_checkbox(dom, el, &instruction.value);
            FillResult::ok(instruction, previous)
        }
        InputKind::Radio => {
            if set_radio(dom, el, &instruction.value) {
                FillResult::ok(instruction, previous)
            } else {
                FillResult::failed(instruction, previous, format!("no radio matches {:?}", instruction.value))
            }
        }
        InputKind::ContentEditable => {
            set_content_editable(dom, el, &instruction.value);
            FillResult::ok(instruction, previous)
        }
        _ => {
            set_text_value(dom, el, &instruction.value);
            FillResult::ok(instruction, previous)
        }
    }
}

/// Whether the operator already entered something the fill would overwrite.
///
/// Toggles never count: their state is the value being chosen. A select
/// counts only once moved off its default option.
fn holds_operator_value(dom: &Dom, el: NodeId, kind: &InputKind) -> bool {
    match kind {
        InputKind::Checkbox | InputKind::Radio | InputKind::File => false,
        InputKind::Select => {
            !dom.value(el).is_empty() && dom.selected_index(el) != default_option_index(dom, el)
        }
        _ => !dom.value(el).trim().is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::EventKind;

    fn instruction(selector: &str, value: &str, kind: InputKind) -> FillInstruction {
        FillInstruction {
            selector: selector.to_string(),
            stable_id: selector.to_string(),
            value: value.to_string(),
            input_kind: kind,
        }
    }

    fn by_id(dom: &Dom, id: &str) -> NodeId {
        dom.element_by_id_in_scope(dom.document(), id).unwrap()
    }

    #[test]
    fn test_fill_mixed_batch() {
        let mut dom = Dom::parse(
            r#"<form>
                <input id="name">
                <textarea id="why"></textarea>
                <select id="country"><option value="">Pick</option><option value="US">United States</option></select>
                <input type="checkbox" id="terms">
                <div id="bio" contenteditable="true"></div>
            </form>"#,
            "",
        );
        let batch = vec![
            instruction("#name", "Ada", InputKind::Text),
            instruction("#why", "Because", InputKind::Textarea),
            instruction("#country", "united states", InputKind::Select),
            instruction("#terms", "yes", InputKind::Checkbox),
            instruction("#bio", "Engineer", InputKind::ContentEditable),
        ];

        let response = FillExecutor::default().fill(&mut dom, &batch);

        assert_eq!(response.filled, 5);
        assert_eq!(response.failed, 0);
        assert_eq!(response.undo_entries.len(), 5);
        assert_eq!(dom.value(by_id(&dom, "name")), "Ada");
        assert_eq!(dom.value(by_id(&dom, "country")), "US");
        assert!(dom.checked(by_id(&dom, "terms")));
        assert_eq!(dom.text_content(by_id(&dom, "bio")), "Engineer");
        assert_eq!(
            dom.events_for(by_id(&dom, "bio")),
            vec![EventKind::Input, EventKind::Change]
        );
    }

    #[test]
    fn test_operator_input_is_never_overwritten() {
        let mut dom = Dom::parse(
            r#"<input id="email" value="me@example.com"><select id="s"><option value="a">A</option><option value="b">B</option></select>"#,
            "",
        );
        let s = by_id(&dom, "s");
        dom.set_selected_index(s, 1);

        let response = FillExecutor::default().fill(
            &mut dom,
            &[
                instruction("#email", "bot@example.com", InputKind::Email),
                instruction("#s", "a", InputKind::Select),
            ],
        );

        assert_eq!(response.filled, 0);
        assert_eq!(response.failed, 2);
        assert_eq!(response.results[0].previous_value, "me@example.com");
        assert_eq!(response.results[0].error.as_deref(), Some("field already holds a value"));
        assert_eq!(dom.value(by_id(&dom, "email")), "me@example.com");
        assert_eq!(dom.value(s), "b");
    }

    #[test]
    fn test_unmatched_option_and_file_input_fail() {
        let mut dom = Dom::parse(
            r#"<select id="s"><option value="a">A</option></select><input type="file" id="cv">"#,
            "",
        );
        let response = FillExecutor::default().fill(
            &mut dom,
            &[
                instruction("#s", "zzz", InputKind::Select),
                instruction("#cv", "resume.pdf", InputKind::File),
                instruction("#missing", "x", InputKind::Text),
            ],
        );
        assert_eq!(response.filled, 0);
        assert_eq!(response.failed, 3);
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.results[2].error.as_deref(), Some("element not found"));
        assert_eq!(response.undo_entries.len(), 2);
    }

    #[test]
    fn test_snapshot_failure_aborts_batch() {
        let mut dom = Dom::parse(r#"<input id="a">"#, "");
        let response = FillExecutor::default().fill(
            &mut dom,
            &[instruction("#a", "x", InputKind::Text), instruction("[[", "y", InputKind::Text)],
        );

        assert_eq!(response.filled, 0);
        assert_eq!(response.failed, 2);
        assert!(response.results.is_empty());
        assert!(response.undo_entries.is_empty());
        assert!(response.error.is_some());
        assert_eq!(dom.value(by_id(&dom, "a")), "");
        assert!(dom.events().is_empty());
    }

    #[test]
    fn test_fill_targets_element_after_svg_style() {
        let mut dom = Dom::parse(
            "<body><svg><style>&lt;x&gt;</style></svg><input id=a><input id=b></body>",
            "",
        );
        let response = FillExecutor::default().fill(&mut dom, &[instruction("#a", "Ada", InputKind::Text)]);

        assert_eq!(response.filled, 1);
        assert_eq!(dom.value(by_id(&dom, "a")), "Ada");
        assert_eq!(dom.value(by_id(&dom, "b")), "");
        assert!(dom.events_for(by_id(&dom, "b")).is_empty());
    }

    #[test]
    fn test_undo_reverses_batch() {
        let markup = r#"<form><input id="n"><input type="checkbox" id="t"><select id="s"><option value="1">One</option><option value="2">Two</option></select></form>"#;
        let mut dom = Dom::parse(markup, "");
        let executor = FillExecutor::default();
        let fill = executor.fill(
            &mut dom,
            &[
                instruction("#n", "Grace", InputKind::Text),
                instruction("#t", "true", InputKind::Checkbox),
                instruction("#s", "2", InputKind::Select),
            ],
        );
        assert_eq!(fill.filled, 3);

        let undo = executor.undo(&mut dom, &fill.undo_entries);

        assert_eq!(undo.undone, 3);
        assert_eq!(dom.value(by_id(&dom, "n")), "");
        assert!(!dom.checked(by_id(&dom, "t")));
        assert_eq!(dom.value(by_id(&dom, "s")), "1");
    }
}
