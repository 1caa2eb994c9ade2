//! Live document model.
//!
//! Parsed markup becomes a flat arena of nodes addressed by [`NodeId`].
//! Shadow roots are first-class nodes attached to their host, so traversal
//! code decides explicitly whether to cross a root boundary. Form state that
//! is not an attribute (native value slot, checked flag, selected option,
//! framework value tracker) lives on the element, and every dispatched event
//! lands in an append-only journal.

mod events;
mod query;
mod serialize;

use std::cell::RefCell;
use std::fmt;

use scraper::node::Node as SourceNode;
use scraper::{ElementRef, Html};

pub use events::{DomEvent, EventKind};

use query::Snapshot;

/// Arena index of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowMode {
    Open,
    Closed,
}

impl ShadowMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Some(ShadowMode::Open),
            "closed" => Some(ShadowMode::Closed),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ShadowMode::Open => "open",
            ShadowMode::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
    ShadowRoot { mode: ShadowMode, host: NodeId },
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Install state of a framework's per-instance value override.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValueTracker {
    pub(crate) tracked: String,
    pub(crate) observed_changes: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    pub(crate) value: String,
    pub(crate) checked: bool,
    pub(crate) selected: Option<usize>,
    pub(crate) tracker: Option<ValueTracker>,
    shadow_root: Option<NodeId>,
    foreign: bool,
}

impl ElementData {
    fn new(tag: &str, attrs: Vec<(String, String)>) -> Self {
        let mut data = Self {
            tag: tag.to_ascii_lowercase(),
            attrs,
            value: String::new(),
            checked: false,
            selected: None,
            tracker: None,
            shadow_root: None,
            foreign: false,
        };
        if data.tag == "input" {
            data.value = data.attr("value").unwrap_or_default().to_string();
            data.checked = data.has_attr("checked");
        }
        data
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Lowercased `type` attribute of an input, `text` when absent.
    pub fn input_type(&self) -> String {
        self.attr("type")
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "text".to_string())
    }

    pub fn is_content_editable(&self) -> bool {
        match self.attr("contenteditable") {
            Some(v) => !v.trim().eq_ignore_ascii_case("false"),
            None => false,
        }
    }

    pub fn shadow_root(&self) -> Option<NodeId> {
        self.shadow_root
    }

    /// Whether the element lives in SVG or MathML content.
    pub fn is_foreign(&self) -> bool {
        self.foreign
    }
}

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// A parsed, mutable document.
pub struct Dom {
    nodes: Vec<Node>,
    url: String,
    events: Vec<DomEvent>,
    snapshot: RefCell<Option<Snapshot>>,
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dom")
            .field("url", &self.url)
            .field("nodes", &self.nodes.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl Dom {
    /// Parse a full HTML document.
    ///
    /// `<template shadowrootmode="open|closed">` as the first such child of an
    /// element becomes that element's shadow root.
    pub fn parse(markup: &str, url: impl Into<String>) -> Self {
        let source = Html::parse_document(markup);
        let mut dom = Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            url: url.into(),
            events: Vec::new(),
            snapshot: RefCell::new(None),
        };
        let root = dom.document();
        dom.build_element(source.root_element(), root);
        dom.initialize_form_state();
        dom
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.kind(id) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(data)) => Some(data),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            match el.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some(slot) => slot.1 = value.to_string(),
                None => el.attrs.push((name.to_ascii_lowercase(), value.to_string())),
            }
            self.invalidate();
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            let before = el.attrs.len();
            el.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
            if el.attrs.len() != before {
                self.invalidate();
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Parent element, stopping at document and shadow-root boundaries.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|c| self.is_element(*c))
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|c| *c == id)?;
        siblings[..pos].iter().rev().copied().find(|c| self.is_element(*c))
    }

    /// Shadow root attached to `host`, regardless of mode.
    ///
    /// Callers enforce the open/closed policy.
    pub fn attached_shadow_root(&self, host: NodeId) -> Option<(NodeId, ShadowMode)> {
        let root = self.element(host)?.shadow_root?;
        match self.kind(root) {
            Some(NodeKind::ShadowRoot { mode, .. }) => Some((root, *mode)),
            _ => None,
        }
    }

    /// Shadow root of `host` if it is open.
    pub fn open_shadow_root(&self, host: NodeId) -> Option<NodeId> {
        match self.attached_shadow_root(host) {
            Some((root, ShadowMode::Open)) => Some(root),
            _ => None,
        }
    }

    /// Host element of a shadow root.
    pub fn shadow_host(&self, root: NodeId) -> Option<NodeId> {
        match self.kind(root) {
            Some(NodeKind::ShadowRoot { host, .. }) => Some(*host),
            _ => None,
        }
    }

    /// Document or shadow root that scopes `id`.
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    /// Pre-order descendants of `scope`, excluding `scope`, not entering shadow roots.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn descendant_elements(&self, scope: NodeId) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.is_element(*id))
            .collect()
    }

    /// Every element in the document including all shadow trees, in document order.
    pub fn all_elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_deep(self.document(), &mut out);
        out
    }

    fn collect_deep(&self, scope: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.children(scope) {
            if let Some(el) = self.element(child) {
                out.push(child);
                if let Some(root) = el.shadow_root {
                    self.collect_deep(root, out);
                }
            }
            self.collect_deep(child, out);
        }
    }

    /// Nearest inclusive ancestor element whose tag is in `tags`.
    pub fn closest(&self, id: NodeId, tags: &[&str]) -> Option<NodeId> {
        self.closest_by(id, |el| tags.contains(&el.tag()))
    }

    pub fn closest_by(&self, id: NodeId, pred: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            match self.element(node) {
                Some(el) if pred(el) => return Some(node),
                Some(_) => current = self.parent_element(node),
                None => return None,
            }
        }
        None
    }

    /// First descendant element (pre-order, same tree scope) matching `pred`.
    pub fn find_descendant(&self, scope: NodeId, pred: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.element(*id).is_some_and(&pred))
    }

    /// Element with `id` attribute equal to `value` inside `scope`'s tree.
    pub fn element_by_id_in_scope(&self, scope: NodeId, value: &str) -> Option<NodeId> {
        let root = self.tree_root(scope);
        self.find_descendant(root, |el| el.attr("id") == Some(value))
    }

    /// Concatenated text of `id` and its descendants (same tree scope).
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeKind::Text(t)) = self.kind(id) {
            out.push_str(t);
            return out;
        }
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(t)) = self.kind(node) {
                out.push_str(t);
            }
        }
        out
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if id.0 >= self.nodes.len() {
            return;
        }
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
        if !text.is_empty() {
            self.push(NodeKind::Text(text.to_string()), Some(id));
        }
        self.invalidate();
    }

    /// Journal of every event dispatched so far.
    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    /// Events dispatched on one element, in order.
    pub fn events_for(&self, id: NodeId) -> Vec<EventKind> {
        self.events.iter().filter(|e| e.target == id).map(|e| e.kind).collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn push(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn invalidate(&self) {
        self.snapshot.replace(None);
    }

    fn build_element(&mut self, source: ElementRef<'_>, parent: NodeId) -> NodeId {
        let el = source.value();
        let attrs = el.attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let mut data = ElementData::new(el.name(), attrs);
        data.foreign = &*el.name.ns != HTML_NAMESPACE;
        let id = self.push(NodeKind::Element(data), Some(parent));
        self.build_children(source, id);
        id
    }

    fn build_children(&mut self, source: ElementRef<'_>, parent: NodeId) {
        // template contents sit under a fragment node
        let mut children: Vec<_> = source.children().collect();
        let mut i = 0;
        while i < children.len() {
            if children[i].value().is_fragment() {
                let inner: Vec<_> = children[i].children().collect();
                children.splice(i..=i, inner);
            } else {
                i += 1;
            }
        }
        for child in children {
            if let Some(child_el) = ElementRef::wrap(child) {
                if let Some(mode) = self.declarative_shadow_mode(child_el, parent) {
                    let root = self.push(NodeKind::ShadowRoot { mode, host: parent }, None);
                    if let Some(host) = self.element_mut(parent) {
                        host.shadow_root = Some(root);
                    }
                    self.build_children(child_el, root);
                    continue;
                }
                self.build_element(child_el, parent);
            } else if let SourceNode::Text(text) = child.value() {
                let mut content = String::new();
                content.push_str(text);
                self.push(NodeKind::Text(content), Some(parent));
            }
        }
    }

    fn declarative_shadow_mode(&self, template: ElementRef<'_>, host: NodeId) -> Option<ShadowMode> {
        let el = template.value();
        if el.name() != "template" {
            return None;
        }
        let host_el = self.element(host)?;
        if host_el.shadow_root.is_some() {
            return None;
        }
        el.attr("shadowrootmode").and_then(ShadowMode::parse)
    }

    fn initialize_form_state(&mut self) {
        for id in self.all_elements() {
            match self.tag(id) {
                Some("textarea") => {
                    let text = self.text_content(id);
                    if let Some(el) = self.element_mut(id) {
                        el.value = text;
                    }
                }
                Some("select") => {
                    let options = self.options(id);
                    let selected = options
                        .iter()
                        .position(|o| self.has_attr(*o, "selected"))
                        .or(if options.is_empty() { None } else { Some(0) });
                    if let Some(el) = self.element_mut(id) {
                        el.selected = selected;
                    }
                }
                _ => {}
            }
        }
    }
}
