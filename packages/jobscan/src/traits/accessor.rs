//! Privileged access to closed shadow roots.

use crate::dom::{Dom, NodeId};

/// Error type accessors report; any failure degrades that subtree.
pub type AccessorError = Box<dyn std::error::Error + Send + Sync>;

/// Capability to reach shadow roots the page closed to scripts.
///
/// Only some hosts have it. Without it, fields inside closed roots are not
/// seen at all.
pub trait ClosedRootAccessor: Send + Sync {
    /// Shadow root of `host`, open or closed, if the capability allows it.
    fn open_or_closed_shadow_root(&self, dom: &Dom, host: NodeId) -> Result<Option<NodeId>, AccessorError>;

    /// Whether the accessor can ever return a root. When false, detection
    /// does not ask for any host root.
    fn has_access(&self) -> bool {
        true
    }
}

/// Default accessor: no privileged access.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClosedRootAccess;

impl ClosedRootAccessor for NoClosedRootAccess {
    fn open_or_closed_shadow_root(&self, _dom: &Dom, _host: NodeId) -> Result<Option<NodeId>, AccessorError> {
        Ok(None)
    }

    fn has_access(&self) -> bool {
        false
    }
}

/// Accessor backed by full access to the document model.
///
/// Stands in for a host that can open closed roots, such as a browser
/// extension's privileged API.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomShadowAccessor;

impl ClosedRootAccessor for DomShadowAccessor {
    fn open_or_closed_shadow_root(&self, dom: &Dom, host: NodeId) -> Result<Option<NodeId>, AccessorError> {
        Ok(dom.attached_shadow_root(host).map(|(root, _)| root))
    }
}
