//! Synchronous core behind the engine handlers.

use crate::dom::Dom;
use crate::types::{DetectedField, FillInstruction, FillResponse, UndoEntry, UndoResponse};

/// Detection, fill and undo against one document.
///
/// The engine handlers wrap every call and turn faults into the response's
/// `error`, so implementations may panic.
pub trait AutofillCore: Send + Sync {
    fn detect(&self, dom: &mut Dom, board: Option<&str>, context_id: u32) -> Vec<DetectedField>;

    fn fill(&self, dom: &mut Dom, instructions: &[FillInstruction]) -> FillResponse;

    fn undo(&self, dom: &mut Dom, entries: &[UndoEntry]) -> UndoResponse;
}
