//! Form control state and event dispatch.

use super::{Dom, NodeId, ValueTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Focus,
    Input,
    Change,
    KeyDown,
    KeyUp,
    KeyPress,
    Blur,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomEvent {
    pub target: NodeId,
    pub kind: EventKind,
}

impl Dom {
    /// Current value as a page script would read it.
    pub fn value(&self, id: NodeId) -> String {
        let Some(el) = self.element(id) else {
            return String::new();
        };
        match el.tag() {
            "input" | "textarea" => el.value.clone(),
            "select" => el
                .selected
                .and_then(|i| self.options(id).get(i).copied())
                .map(|opt| self.option_value(opt))
                .unwrap_or_default(),
            _ if el.is_content_editable() => self.text_content(id),
            _ => String::new(),
        }
    }

    /// Write through the element's own value slot.
    ///
    /// A framework override installed on the instance does not see this
    /// write, so its tracked value keeps the old content.
    pub fn set_native_value(&mut self, id: NodeId, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.value = value.to_string();
        }
    }

    /// Plain `el.value = x` assignment, routed through an installed framework override.
    pub fn set_value_via_instance(&mut self, id: NodeId, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.value = value.to_string();
            if let Some(tracker) = el.tracker.as_mut() {
                tracker.tracked = value.to_string();
            }
        }
    }

    /// Simulate a UI framework installing its per-instance value override.
    pub fn install_value_tracker(&mut self, id: NodeId) {
        let current = self.value(id);
        if let Some(el) = self.element_mut(id) {
            el.tracker = Some(ValueTracker {
                tracked: current,
                observed_changes: 0,
            });
        }
    }

    /// Number of value changes a tracking framework has observed on `id`.
    pub fn framework_changes(&self, id: NodeId) -> usize {
        self.element(id)
            .and_then(|el| el.tracker.as_ref())
            .map(|t| t.observed_changes)
            .unwrap_or(0)
    }

    /// Append an event to the journal.
    ///
    /// Tracking frameworks compare the live value with their tracked copy on
    /// input and change, and only report a change when they differ.
    pub fn dispatch(&mut self, id: NodeId, kind: EventKind) {
        self.events.push(DomEvent { target: id, kind });
        if !matches!(kind, EventKind::Input | EventKind::Change) {
            return;
        }
        let current = self.value(id);
        if let Some(tracker) = self.element_mut(id).and_then(|el| el.tracker.as_mut()) {
            if tracker.tracked != current {
                tracker.tracked = current;
                tracker.observed_changes += 1;
            }
        }
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.element(id).map(|el| el.checked).unwrap_or(false)
    }

    /// Set the checked flag without activation behaviour or events.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if let Some(el) = self.element_mut(id) {
            el.checked = checked;
        }
    }

    /// Activation behaviour of `click()`.
    ///
    /// Checkboxes toggle; radios become checked and clear the rest of their group.
    pub fn click(&mut self, id: NodeId) {
        let Some(el) = self.element(id) else {
            return;
        };
        let is_input = el.tag() == "input";
        let kind = el.input_type();
        let was_checked = el.checked;
        let mut toggled = false;
        if is_input && kind == "checkbox" {
            if let Some(el) = self.element_mut(id) {
                el.checked = !el.checked;
            }
            toggled = true;
        } else if is_input && kind == "radio" && !was_checked {
            for other in self.radio_group(id) {
                if let Some(member) = self.element_mut(other) {
                    member.checked = false;
                }
            }
            if let Some(el) = self.element_mut(id) {
                el.checked = true;
            }
            toggled = true;
        }
        self.dispatch(id, EventKind::Click);
        if toggled {
            self.dispatch(id, EventKind::Input);
            self.dispatch(id, EventKind::Change);
        }
    }

    /// Radios sharing `id`'s name within the same form (or tree when formless).
    pub fn radio_group(&self, id: NodeId) -> Vec<NodeId> {
        let Some(name) = self.attr(id, "name").map(str::to_string) else {
            return vec![id];
        };
        let scope = self
            .closest(id, &["form"])
            .unwrap_or_else(|| self.tree_root(id));
        self.descendant_elements(scope)
            .into_iter()
            .filter(|other| {
                self.element(*other).is_some_and(|el| {
                    el.tag() == "input" && el.input_type() == "radio" && el.attr("name") == Some(name.as_str())
                })
            })
            .collect()
    }

    /// `<option>` elements of a select, in order.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendant_elements(select)
            .into_iter()
            .filter(|id| self.tag(*id) == Some("option"))
            .collect()
    }

    /// Value of an option: its `value` attribute, else its text.
    pub fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_string(),
            None => self.text_content(option).trim().to_string(),
        }
    }

    pub fn selected_index(&self, select: NodeId) -> Option<usize> {
        self.element(select).and_then(|el| el.selected)
    }

    pub fn set_selected_index(&mut self, select: NodeId, index: usize) {
        if let Some(el) = self.element_mut(select) {
            el.selected = Some(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_id(dom: &Dom, id: &str) -> NodeId {
        dom.all_elements()
            .into_iter()
            .find(|n| dom.attr(*n, "id") == Some(id))
            .unwrap()
    }

    #[test]
    fn test_native_write_is_visible_to_tracker_on_input() {
        let mut dom = Dom::parse(r#"<input id="a" value="">"#, "");
        let a = by_id(&dom, "a");
        dom.install_value_tracker(a);

        dom.set_native_value(a, "Ada");
        dom.dispatch(a, EventKind::Input);
        assert_eq!(dom.framework_changes(a), 1);
    }

    #[test]
    fn test_instance_write_is_swallowed_by_tracker() {
        let mut dom = Dom::parse(r#"<input id="a" value="">"#, "");
        let a = by_id(&dom, "a");
        dom.install_value_tracker(a);

        dom.set_value_via_instance(a, "Ada");
        dom.dispatch(a, EventKind::Input);
        assert_eq!(dom.value(a), "Ada");
        assert_eq!(dom.framework_changes(a), 0);
    }

    #[test]
    fn test_radio_click_clears_group() {
        let mut dom = Dom::parse(
            r#"<form><input type="radio" name="g" id="y" value="yes" checked><input type="radio" name="g" id="n" value="no"></form>"#,
            "",
        );
        let y = by_id(&dom, "y");
        let n = by_id(&dom, "n");
        dom.click(n);
        assert!(dom.checked(n));
        assert!(!dom.checked(y));
        assert_eq!(dom.events_for(n), vec![EventKind::Click, EventKind::Input, EventKind::Change]);
    }

    #[test]
    fn test_select_value_uses_option_text_fallback() {
        let dom = Dom::parse(r#"<select id="s"><option>Red</option><option value="b">Blue</option></select>"#, "");
        let s = by_id(&dom, "s");
        assert_eq!(dom.value(s), "Red");
    }
}
