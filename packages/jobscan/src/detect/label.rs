//! Human-readable labels and element state.

use crate::dom::{Dom, NodeId};
use crate::pipeline::normalize::collapse_whitespace;

use super::signals::{associated_label, nearest_heading};

const MAX_SIBLING_LABEL_LEN: usize = 100;

fn text_of(dom: &Dom, id: NodeId) -> Option<String> {
    let text = collapse_whitespace(&dom.text_content(id));
    (!text.is_empty()).then_some(text)
}

fn attr_text(dom: &Dom, el: NodeId, name: &str) -> Option<String> {
    let value = dom.attr(el, name)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Label of a fully evaluated field.
///
/// `label[for]`, aria-label, aria-labelledby, placeholder, enclosing label,
/// label-like previous sibling, nearest heading, then name and id.
pub fn resolve_label(dom: &Dom, el: NodeId) -> String {
    associated_label(dom, el)
        .and_then(|label| text_of(dom, label))
        .or_else(|| attr_text(dom, el, "aria-label"))
        .or_else(|| labelled_by(dom, el))
        .or_else(|| attr_text(dom, el, "placeholder"))
        .or_else(|| dom.closest(el, &["label"]).and_then(|label| text_of(dom, label)))
        .or_else(|| sibling_label(dom, el))
        .or_else(|| nearest_heading(dom, el).and_then(|heading| text_of(dom, heading)))
        .or_else(|| attr_text(dom, el, "name"))
        .or_else(|| attr_text(dom, el, "id"))
        .unwrap_or_default()
}

/// Label of a field reached only through privileged access: aria-label,
/// `label[for]`, placeholder, then name.
pub fn best_effort_label(dom: &Dom, el: NodeId) -> String {
    attr_text(dom, el, "aria-label")
        .or_else(|| associated_label(dom, el).and_then(|label| text_of(dom, label)))
        .or_else(|| attr_text(dom, el, "placeholder"))
        .or_else(|| attr_text(dom, el, "name"))
        .unwrap_or_default()
}

fn labelled_by(dom: &Dom, el: NodeId) -> Option<String> {
    let ids = dom.attr(el, "aria-labelledby")?;
    let parts: Vec<String> = ids
        .split_whitespace()
        .filter_map(|id| dom.element_by_id_in_scope(el, id))
        .filter_map(|target| text_of(dom, target))
        .collect();
    (!parts.is_empty()).then(|| parts.join(" "))
}

fn sibling_label(dom: &Dom, el: NodeId) -> Option<String> {
    let prev = dom.previous_element_sibling(el)?;
    if !matches!(dom.tag(prev), Some("label" | "span" | "div")) {
        return None;
    }
    text_of(dom, prev).filter(|text| text.chars().count() < MAX_SIBLING_LABEL_LEN)
}

/// Visible unless hidden by attribute, inline style or input type.
pub fn is_visible(dom: &Dom, el: NodeId) -> bool {
    let Some(element) = dom.element(el) else {
        return false;
    };
    if element.has_attr("hidden") {
        return false;
    }
    if element.tag() == "input" && element.input_type() == "hidden" {
        return false;
    }
    !element.attr("style").is_some_and(hides_element)
}

/// Whether an inline style declares `display: none` or `visibility: hidden`.
fn hides_element(style: &str) -> bool {
    style.split(';').any(|declaration| {
        let Some((property, value)) = declaration.split_once(':') else {
            return false;
        };
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim().trim_end_matches("!important").trim().to_ascii_lowercase();
        (property == "display" && value == "none") || (property == "visibility" && value == "hidden")
    })
}

pub fn is_disabled(dom: &Dom, el: NodeId) -> bool {
    dom.has_attr(el, "disabled")
}

pub fn is_required(dom: &Dom, el: NodeId) -> bool {
    dom.has_attr(el, "required") || dom.attr(el, "aria-required") == Some("true")
}
