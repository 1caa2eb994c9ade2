//! Pre-fill snapshots and their replay.

use tracing::{debug, warn};

use super::native_setter::{match_option, set_content_editable, set_text_value};
use crate::detect::{current_value, input_kind};
use crate::dom::{Dom, EventKind, NodeId};
use crate::error::FillError;
use crate::types::{FillInstruction, InputKind, UndoEntry, UndoResponse};

/// Capture the current state of every element a batch targets.
///
/// Must run before the first mutation of the batch. Instructions whose
/// element is absent get no entry; a selector that cannot be evaluated
/// fails the whole capture.
pub fn capture_undo_snapshot(dom: &Dom, instructions: &[FillInstruction]) -> Result<Vec<UndoEntry>, FillError> {
    let mut entries = Vec::with_capacity(instructions.len());
    for instruction in instructions {
        let found = dom
            .query_selector_deep(&instruction.selector)
            .map_err(|source| FillError::Snapshot {
                stable_id: instruction.stable_id.clone(),
                source,
            })?;
        let Some(el) = found else {
            debug!(stable_id = %instruction.stable_id, "no element to snapshot");
            continue;
        };
        let kind = input_kind(dom, el);
        // checking one radio clears its siblings, so the group is recorded
        let group_state = match kind {
            InputKind::Radio => dom.radio_group(el).into_iter().map(|radio| dom.checked(radio)).collect(),
            _ => Vec::new(),
        };
        entries.push(UndoEntry {
            stable_id: instruction.stable_id.clone(),
            selector: instruction.selector.clone(),
            previous_value: current_value(dom, el),
            input_kind: kind,
            group_state,
        });
    }
    Ok(entries)
}

/// Replays undo entries and clears the identifier attribute from each
/// restored element.
#[derive(Debug, Clone)]
pub struct UndoManager {
    id_attribute: String,
}

impl UndoManager {
    pub fn new(id_attribute: impl Into<String>) -> Self {
        Self {
            id_attribute: id_attribute.into(),
        }
    }

    pub fn undo(&self, dom: &mut Dom, entries: &[UndoEntry]) -> UndoResponse {
        let mut response = UndoResponse::default();
        for entry in entries {
            let el = match dom.query_selector_deep(&entry.selector) {
                Ok(Some(el)) => el,
                Ok(None) => {
                    debug!(stable_id = %entry.stable_id, "undo target missing");
                    response.failed += 1;
                    continue;
                }
                Err(err) => {
                    warn!(stable_id = %entry.stable_id, error = %err, "undo selector rejected");
                    response.failed += 1;
                    continue;
                }
            };
            if restore(dom, el, entry) {
                dom.remove_attr(el, &self.id_attribute);
                response.undone += 1;
            } else {
                response.failed += 1;
            }
        }
        response
    }
}

fn restore(dom: &mut Dom, el: NodeId, entry: &UndoEntry) -> bool {
    match &entry.input_kind {
        InputKind::Select => restore_select(dom, el, &entry.previous_value),
        InputKind::ContentEditable => {
            set_content_editable(dom, el, &entry.previous_value);
            true
        }
        InputKind::Radio => restore_radio_group(dom, el, entry),
        InputKind::Checkbox => {
            if dom.checked(el) != was_checked(entry) {
                dom.click(el);
            }
            true
        }
        InputKind::File => true,
        _ => {
            set_text_value(dom, el, &entry.previous_value);
            true
        }
    }
}

fn was_checked(entry: &UndoEntry) -> bool {
    matches!(entry.previous_value.as_str(), "true" | "on")
}

/// Put every member of the radio group back to its recorded state.
///
/// Entries without a usable group record restore the target alone.
fn restore_radio_group(dom: &mut Dom, el: NodeId, entry: &UndoEntry) -> bool {
    let group = dom.radio_group(el);
    let state: Vec<(NodeId, bool)> = if entry.group_state.len() == group.len() {
        group.into_iter().zip(entry.group_state.iter().copied()).collect()
    } else {
        if !entry.group_state.is_empty() {
            debug!(stable_id = %entry.stable_id, "radio group changed since capture");
        }
        vec![(el, was_checked(entry))]
    };

    // unchecks before checks
    for &(radio, checked) in &state {
        if !checked && dom.checked(radio) {
            uncheck_radio(dom, radio);
        }
    }
    for &(radio, checked) in &state {
        if checked && !dom.checked(radio) {
            dom.click(radio);
        }
    }
    true
}

/// A click never unchecks a radio.
fn uncheck_radio(dom: &mut Dom, radio: NodeId) {
    dom.set_checked(radio, false);
    dom.dispatch(radio, EventKind::Input);
    dom.dispatch(radio, EventKind::Change);
}

fn restore_select(dom: &mut Dom, el: NodeId, previous: &str) -> bool {
    let options = dom.options(el);
    if options.is_empty() {
        return previous.is_empty();
    }
    let index = options
        .iter()
        .position(|opt| dom.option_value(*opt) == previous)
        .or_else(|| match_option(dom, el, previous));
    match index {
        Some(index) => {
            dom.set_selected_index(el, index);
            dom.dispatch(el, EventKind::Change);
            true
        }
        None => false,
    }
}
