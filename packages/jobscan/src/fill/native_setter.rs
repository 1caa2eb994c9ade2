//! Value writes that UI frameworks observe.
//!
//! Text values go through the element's own value slot, never a
//! per-instance override a framework installed, followed by the full
//! keyboard-like event sequence. Toggles are driven by `click()`.

use lazy_static::lazy_static;
use regex::Regex;

use crate::detect::signals::associated_label;
use crate::dom::{Dom, EventKind, NodeId};

/// Events dispatched after a text write. The trailing `input` is for
/// frameworks that only react to a later event.
pub const TEXT_EVENT_SEQUENCE: [EventKind; 8] = [
    EventKind::Focus,
    EventKind::Input,
    EventKind::Change,
    EventKind::KeyDown,
    EventKind::KeyUp,
    EventKind::KeyPress,
    EventKind::Blur,
    EventKind::Input,
];

lazy_static! {
    static ref TRUTHY: Regex = Regex::new(r"(?i)^(true|1|yes|on|checked)$").unwrap();
}

pub fn is_truthy(value: &str) -> bool {
    TRUTHY.is_match(value.trim())
}

/// Input and textarea write.
pub fn set_text_value(dom: &mut Dom, el: NodeId, value: &str) {
    dom.set_native_value(el, value);
    for kind in TEXT_EVENT_SEQUENCE {
        dom.dispatch(el, kind);
    }
}

pub fn set_content_editable(dom: &mut Dom, el: NodeId, value: &str) {
    dom.set_text_content(el, value);
    dom.dispatch(el, EventKind::Input);
    dom.dispatch(el, EventKind::Change);
}

/// Index of the option matching `value`: exact value, case-insensitive
/// value, case-insensitive text, then substring of either.
pub fn match_option(dom: &Dom, select: NodeId, value: &str) -> Option<usize> {
    let options: Vec<(String, String)> = dom
        .options(select)
        .into_iter()
        .map(|opt| (dom.option_value(opt), dom.text_content(opt).trim().to_lowercase()))
        .collect();
    let lower = value.to_lowercase();

    options
        .iter()
        .position(|(v, _)| v == value)
        .or_else(|| options.iter().position(|(v, _)| v.to_lowercase() == lower))
        .or_else(|| options.iter().position(|(_, text)| *text == lower))
        .or_else(|| {
            options
                .iter()
                .position(|(v, text)| v.to_lowercase().contains(&lower) || text.contains(&lower))
        })
}

/// Select the matching option. Returns false when nothing matches.
pub fn set_select_value(dom: &mut Dom, select: NodeId, value: &str) -> bool {
    let Some(index) = match_option(dom, select, value) else {
        return false;
    };
    dom.set_selected_index(select, index);
    dom.dispatch(select, EventKind::Change);
    true
}

/// Option selected before any interaction.
pub fn default_option_index(dom: &Dom, select: NodeId) -> Option<usize> {
    let options = dom.options(select);
    options
        .iter()
        .position(|opt| dom.has_attr(*opt, "selected"))
        .or(if options.is_empty() { None } else { Some(0) })
}

pub fn set_checkbox(dom: &mut Dom, el: NodeId, value: &str) {
    if dom.checked(el) != is_truthy(value) {
        dom.click(el);
    }
}

/// Check the group member matching `value` by value or id, then by label
/// text. Returns false when no member matches.
pub fn set_radio(dom: &mut Dom, el: NodeId, value: &str) -> bool {
    if dom.attr(el, "name").is_none() {
        if !dom.checked(el) {
            dom.click(el);
        }
        return true;
    }
    let lower = value.trim().to_lowercase();
    let group = dom.radio_group(el);

    let by_value = group.iter().copied().find(|radio| {
        dom.value(*radio).to_lowercase() == lower
            || dom.attr(*radio, "id").is_some_and(|id| id.to_lowercase() == lower)
    });
    let target = by_value.or_else(|| {
        group.iter().copied().find(|radio| {
            associated_label(dom, *radio)
                .is_some_and(|label| dom.text_content(label).to_lowercase().contains(&lower))
        })
    });

    match target {
        Some(radio) => {
            if !dom.checked(radio) {
                dom.click(radio);
            }
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_id(dom: &Dom, id: &str) -> NodeId {
        dom.element_by_id_in_scope(dom.document(), id).unwrap()
    }

    #[test]
    fn test_text_write_reaches_tracking_framework() {
        let mut dom = Dom::parse(r#"<input id="a">"#, "");
        let a = by_id(&dom, "a");
        dom.install_value_tracker(a);

        set_text_value(&mut dom, a, "Ada Lovelace");

        assert_eq!(dom.value(a), "Ada Lovelace");
        assert_eq!(dom.framework_changes(a), 1);
        assert_eq!(dom.events_for(a), TEXT_EVENT_SEQUENCE.to_vec());
    }

    #[test]
    fn test_option_matching_order() {
        let dom = Dom::parse(
            r#"<select id="s"><option value="">Choose</option><option value="US">United States</option><option value="ca">Canada</option><option value="uk-eng">England</option></select>"#,
            "",
        );
        let s = by_id(&dom, "s");
        assert_eq!(match_option(&dom, s, "US"), Some(1));
        assert_eq!(match_option(&dom, s, "CA"), Some(2));
        assert_eq!(match_option(&dom, s, "united states"), Some(1));
        assert_eq!(match_option(&dom, s, "eng"), Some(3));
        assert_eq!(match_option(&dom, s, "Mars"), None);
        assert_eq!(default_option_index(&dom, s), Some(0));
    }

    #[test]
    fn test_checkbox_parses_truthy_values() {
        let mut dom = Dom::parse(r#"<input type="checkbox" id="c">"#, "");
        let c = by_id(&dom, "c");
        set_checkbox(&mut dom, c, "Yes");
        assert!(dom.checked(c));
        set_checkbox(&mut dom, c, "checked");
        assert!(dom.checked(c));
        set_checkbox(&mut dom, c, "no");
        assert!(!dom.checked(c));
        assert!(!is_truthy("maybe"));
    }

    #[test]
    fn test_radio_by_label_text() {
        let mut dom = Dom::parse(
            r#"<form><input type="radio" name="auth" id="r1" value="1"><label for="r1">Yes, I am authorized</label>
               <input type="radio" name="auth" id="r2" value="2"><label for="r2">No</label></form>"#,
            "",
        );
        let r1 = by_id(&dom, "r1");
        assert!(set_radio(&mut dom, r1, "authorized"));
        assert!(dom.checked(r1));
        assert!(set_radio(&mut dom, r1, "r2"));
        assert!(dom.checked(by_id(&dom, "r2")));
        assert!(!dom.checked(r1));
        assert!(!set_radio(&mut dom, r1, "maybe"));
    }
}
