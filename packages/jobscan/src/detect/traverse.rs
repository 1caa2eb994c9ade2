//! Depth-bounded candidate discovery across shadow roots.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::dom::{Dom, NodeId, ShadowMode};
use crate::traits::accessor::ClosedRootAccessor;

/// How much of a candidate's surroundings the detector may rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fidelity {
    /// Reached through the document or open shadow roots
    Full,
    /// Reached only through the privileged accessor
    BestEffort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub element: NodeId,
    pub fidelity: Fidelity,
}

/// Input types that never take operator data.
const EXCLUDED_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];

/// Whether `el` is a fillable control.
pub fn is_candidate(dom: &Dom, el: NodeId) -> bool {
    let Some(element) = dom.element(el) else {
        return false;
    };
    match element.tag() {
        "input" => !EXCLUDED_INPUT_TYPES.contains(&element.input_type().as_str()),
        "textarea" | "select" => true,
        _ => element.is_content_editable(),
    }
}

/// Every candidate in the document, each scope's own controls before the
/// controls of the shadow roots below it.
pub fn collect_candidates(dom: &Dom, accessor: &dyn ClosedRootAccessor, max_depth: usize) -> Vec<Candidate> {
    let mut walker = Walker {
        dom,
        accessor,
        max_depth,
        seen: HashSet::new(),
        unreachable_tags: HashSet::new(),
        lookups: 0,
        out: Vec::new(),
    };
    walker.walk(dom.document(), 0, Fidelity::Full);
    if walker.lookups > 0 {
        debug!(
            lookups = walker.lookups,
            unreachable_tags = walker.unreachable_tags.len(),
            "closed shadow root lookups finished"
        );
    }
    walker.out
}

struct Walker<'a> {
    dom: &'a Dom,
    accessor: &'a dyn ClosedRootAccessor,
    max_depth: usize,
    seen: HashSet<NodeId>,
    /// Host tags already reported as unreachable
    unreachable_tags: HashSet<String>,
    lookups: usize,
    out: Vec<Candidate>,
}

impl Walker<'_> {
    fn walk(&mut self, scope: NodeId, depth: usize, fidelity: Fidelity) {
        let dom = self.dom;
        let elements = dom.descendant_elements(scope);
        for &el in &elements {
            if is_candidate(dom, el) && self.seen.insert(el) {
                self.out.push(Candidate { element: el, fidelity });
            }
        }

        if depth >= self.max_depth {
            debug!(depth, "shadow depth bound reached");
            return;
        }

        for &host in &elements {
            match dom.attached_shadow_root(host) {
                Some((root, ShadowMode::Open)) => self.walk(root, depth + 1, fidelity),
                Some((_, ShadowMode::Closed)) => {
                    if let Some(root) = self.privileged_root(host) {
                        self.walk(root, depth + 1, Fidelity::BestEffort);
                    }
                }
                None if is_likely_closed_host(dom, host) => {
                    if let Some(root) = self.privileged_root(host) {
                        self.walk(root, depth + 1, Fidelity::BestEffort);
                    }
                }
                None => {}
            }
        }
    }

    /// Ask the accessor for a closed root; failures and panics skip the subtree.
    fn privileged_root(&mut self, host: NodeId) -> Option<NodeId> {
        if !self.accessor.has_access() {
            return None;
        }
        self.lookups += 1;
        let dom = self.dom;
        let accessor = self.accessor;
        let attempt = catch_unwind(AssertUnwindSafe(|| accessor.open_or_closed_shadow_root(dom, host)));
        match attempt {
            Ok(Ok(Some(root))) => Some(root),
            Ok(Ok(None)) => {
                let tag = dom.tag(host).unwrap_or_default();
                if self.unreachable_tags.insert(tag.to_string()) {
                    debug!(host = %host, tag, "closed shadow root not accessible");
                }
                None
            }
            Ok(Err(err)) => {
                warn!(host = %host, error = %err, "closed shadow root accessor failed");
                None
            }
            Err(_) => {
                warn!(host = %host, "closed shadow root accessor panicked");
                None
            }
        }
    }
}

/// Custom elements without a visible shadow root may have a closed one.
fn is_likely_closed_host(dom: &Dom, el: NodeId) -> bool {
    dom.tag(el).is_some_and(|tag| tag.contains('-'))
}
