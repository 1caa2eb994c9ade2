//! CSS selector evaluation over the live tree.
//!
//! Selectors run against an HTML snapshot of the current tree, re-parsed by
//! `scraper`. Element start tags are emitted in pre-order, so the n-th element
//! of the snapshot is the n-th entry of the ordinal table. Every rebuild is
//! checked element by element against the arena (tag, parent, attribute
//! count); a snapshot that does not line up is refused. The snapshot is
//! dropped on every attribute or structure change.

use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::{Dom, NodeId, NodeKind};
use crate::error::{DomError, DomResult};

pub(super) struct Snapshot {
    html: Html,
    ordinals: Vec<Option<NodeId>>,
}

impl Snapshot {
    fn build(dom: &Dom) -> DomResult<Self> {
        let (markup, ordinals) = dom.to_html_with_ordinals();
        let snapshot = Self {
            html: Html::parse_document(&markup),
            ordinals,
        };
        snapshot.verify(dom)?;
        Ok(snapshot)
    }

    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html.root_element().descendants().filter_map(ElementRef::wrap)
    }

    /// Reject a snapshot whose element tree differs from the arena's.
    fn verify(&self, dom: &Dom) -> DomResult<()> {
        let parsed: Vec<ElementRef<'_>> = self.elements().collect();
        if parsed.len() != self.ordinals.len() {
            return Err(DomError::SnapshotMismatch(parsed.len().min(self.ordinals.len())));
        }

        let positions: HashMap<_, usize> = parsed.iter().enumerate().map(|(i, el)| (el.id(), i)).collect();
        let arena_positions: HashMap<NodeId, usize> = self
            .ordinals
            .iter()
            .enumerate()
            .filter_map(|(i, id)| id.map(|id| (id, i)))
            .collect();

        for (position, (el, ordinal)) in parsed.iter().zip(&self.ordinals).enumerate() {
            // template contents hang off a fragment below the template
            let parsed_parent = el
                .parent()
                .and_then(|p| if p.value().is_fragment() { p.parent() } else { Some(p) })
                .and_then(ElementRef::wrap)
                .and_then(|p| positions.get(&p.id()).copied());

            let (tag_matches, expected_parent, attrs_match) = match ordinal {
                Some(id) => {
                    let data = dom.element(*id).ok_or(DomError::NotAnElement(id.0))?;
                    let expected_parent = match dom.parent(*id).and_then(|p| dom.kind(p).map(|k| (p, k))) {
                        Some((p, NodeKind::Element(_))) => arena_positions.get(&p).copied(),
                        // host start tag is followed directly by its template wrapper
                        Some((_, NodeKind::ShadowRoot { host, .. })) => arena_positions.get(host).map(|h| h + 1),
                        _ => None,
                    };
                    (
                        el.value().name().eq_ignore_ascii_case(data.tag()),
                        expected_parent,
                        el.value().attrs().count() == data.attrs().count(),
                    )
                }
                None => (el.value().name() == "template", position.checked_sub(1), true),
            };

            if !tag_matches || parsed_parent != expected_parent || !attrs_match {
                return Err(DomError::SnapshotMismatch(position));
            }
        }
        Ok(())
    }

    /// Arena ids of every element matching `selector`, in deep document order.
    fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.elements()
            .enumerate()
            .filter(|(_, el)| selector.matches(el))
            .filter_map(|(ordinal, _)| self.ordinals.get(ordinal).copied().flatten())
            .collect()
    }
}

/// Parse a selector, mapping failures to [`DomError::InvalidSelector`].
pub fn parse_selector(selector: &str) -> DomResult<Selector> {
    Selector::parse(selector).map_err(|_| DomError::InvalidSelector(selector.to_string()))
}

impl Dom {
    fn with_snapshot<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> DomResult<R> {
        let missing = self.snapshot.borrow().is_none();
        if missing {
            let snapshot = Snapshot::build(self).inspect_err(|err| {
                warn!(url = %self.url, error = %err, "refusing misaligned query snapshot");
            })?;
            self.snapshot.replace(Some(snapshot));
        }
        let guard = self.snapshot.borrow();
        match guard.as_ref() {
            Some(snapshot) => Ok(f(snapshot)),
            None => Ok(f(&Snapshot::build(self)?)),
        }
    }

    /// Matching elements inside `scope`'s tree, not crossing shadow boundaries.
    pub fn query_selector_all(&self, scope: NodeId, selector: &str) -> DomResult<Vec<NodeId>> {
        let parsed = parse_selector(selector)?;
        let root = self.tree_root(scope);
        Ok(self
            .with_snapshot(|snapshot| snapshot.select(&parsed))?
            .into_iter()
            .filter(|id| self.tree_root(*id) == root && *id != scope && self.is_inclusive_ancestor(scope, *id))
            .collect())
    }

    pub fn query_selector(&self, scope: NodeId, selector: &str) -> DomResult<Option<NodeId>> {
        Ok(self.query_selector_all(scope, selector)?.into_iter().next())
    }

    /// First match anywhere in the document, shadow trees included.
    pub fn query_selector_deep(&self, selector: &str) -> DomResult<Option<NodeId>> {
        let parsed = parse_selector(selector)?;
        Ok(self.with_snapshot(|snapshot| snapshot.select(&parsed))?.into_iter().next())
    }

    /// Whether element `id` matches `selector`.
    pub fn matches(&self, id: NodeId, selector: &str) -> DomResult<bool> {
        let parsed = parse_selector(selector)?;
        Ok(self.with_snapshot(|snapshot| snapshot.select(&parsed))?.contains(&id))
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_reflects_attribute_mutations() {
        let mut dom = Dom::parse(r#"<body><input id="a"><input id="b"></body>"#, "");
        let b = dom.query_selector(dom.document(), "#b").unwrap().unwrap();
        assert!(dom.query_selector(dom.document(), "[data-jf-opid]").unwrap().is_none());

        dom.set_attr(b, "data-jf-opid", "jf-field-0");
        let found = dom
            .query_selector(dom.document(), r#"[data-jf-opid="jf-field-0"]"#)
            .unwrap();
        assert_eq!(found, Some(b));

        dom.remove_attr(b, "data-jf-opid");
        assert!(dom.query_selector(dom.document(), "[data-jf-opid]").unwrap().is_none());
    }

    #[test]
    fn test_document_query_does_not_pierce_shadow_roots() {
        let dom = Dom::parse(
            r#"<body><input name="outer"><x-a><template shadowrootmode="open"><input name="inner"></template></x-a></body>"#,
            "",
        );
        let scoped = dom.query_selector_all(dom.document(), "input").unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(dom.attr(scoped[0], "name"), Some("outer"));

        let deep = dom.query_selector_deep(r#"input[name="inner"]"#).unwrap().unwrap();
        let host = dom.query_selector(dom.document(), "x-a").unwrap().unwrap();
        let root = dom.open_shadow_root(host).unwrap();
        assert_eq!(dom.tree_root(deep), root);
        assert_eq!(dom.query_selector_all(root, "input").unwrap(), vec![deep]);
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let dom = Dom::parse("<body></body>", "");
        assert!(matches!(
            dom.query_selector(dom.document(), "[[nope"),
            Err(DomError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_foreign_raw_text_keeps_positions() {
        let dom = Dom::parse(
            "<body><svg><style>&lt;x&gt;</style></svg><input id=a><input id=b></body>",
            "",
        );
        let a = dom
            .all_elements()
            .into_iter()
            .find(|id| dom.attr(*id, "id") == Some("a"))
            .unwrap();
        assert_eq!(dom.query_selector(dom.document(), "#a").unwrap(), Some(a));
        assert_eq!(dom.query_selector_deep("#a").unwrap(), Some(a));
        assert!(dom.query_selector(dom.document(), "x").unwrap().is_none());
    }

    #[test]
    fn test_template_contents_are_queryable() {
        let dom = Dom::parse(r#"<body><template id="t"><input name="inner"></template></body>"#, "");
        let template = dom.query_selector(dom.document(), "#t").unwrap().unwrap();
        let inner = dom.query_selector_deep(r#"input[name="inner"]"#).unwrap().unwrap();
        assert_eq!(dom.parent(inner), Some(template));
    }

    #[test]
    fn test_matches_single_element() {
        let dom = Dom::parse(r#"<body><form id="f"><input class="email big"></form></body>"#, "");
        let input = dom.query_selector(dom.document(), "input").unwrap().unwrap();
        assert!(dom.matches(input, "#f .email").unwrap());
        assert!(!dom.matches(input, ".phone").unwrap());
    }
}
