//! Per-context request handlers.
//!
//! Each handler always returns its response type. Faults inside the
//! synchronous core, panics included, become the response's `error`.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{error, info};

use crate::collect;
use crate::detect::FieldDetector;
use crate::dom::Dom;
use crate::fill::FillExecutor;
use crate::registry::SelectorRegistry;
use crate::traits::accessor::ClosedRootAccessor;
use crate::traits::autofill::AutofillCore;
use crate::types::{
    CollectResponse, DetectResponse, DetectedField, DetectorConfig, FillInstruction, FillResponse, UndoEntry,
    UndoResponse, WireField,
};

/// Handlers for one execution context.
///
/// The caller serializes `fill` and `undo` per document.
#[derive(Clone)]
pub struct Engine {
    detector: FieldDetector,
    executor: FillExecutor,
    core: Option<Arc<dyn AutofillCore>>,
    context_id: u32,
}

impl Engine {
    pub fn new(registry: Arc<SelectorRegistry>) -> Self {
        Self {
            detector: FieldDetector::new(registry),
            executor: FillExecutor::default(),
            core: None,
            context_id: 0,
        }
    }

    /// Run `core` instead of the built-in detector and fill executor.
    pub fn with_core(mut self, core: Arc<dyn AutofillCore>) -> Self {
        self.core = Some(core);
        self
    }

    pub fn with_detector_config(mut self, config: DetectorConfig) -> Self {
        self.executor = FillExecutor::new(&config);
        self.detector = self.detector.with_config(config);
        self
    }

    pub fn with_accessor(mut self, accessor: Arc<dyn ClosedRootAccessor>) -> Self {
        self.detector = self.detector.with_accessor(accessor);
        self
    }

    /// Context id reported in responses. The top-level document is 0.
    pub fn with_context_id(mut self, context_id: u32) -> Self {
        self.context_id = context_id;
        self
    }

    pub fn context_id(&self) -> u32 {
        self.context_id
    }

    pub async fn detect(&self, dom: &mut Dom, board: Option<&str>) -> DetectResponse {
        let url = dom.url().to_string();
        let outcome = catch_unwind(AssertUnwindSafe(|| self.core().detect(dom, board, self.context_id)));
        let board = board.map(str::to_string);
        match outcome {
            Ok(fields) => {
                info!(count = fields.len(), board = ?board, context_id = self.context_id, "detect handled");
                DetectResponse {
                    fields: fields.iter().map(WireField::from).collect(),
                    board,
                    url,
                    context_id: self.context_id,
                    error: None,
                }
            }
            Err(payload) => {
                let message = panic_message(payload);
                error!(error = %message, "detect failed");
                DetectResponse {
                    fields: Vec::new(),
                    board,
                    url,
                    context_id: self.context_id,
                    error: Some(message),
                }
            }
        }
    }

    pub async fn fill(&self, dom: &mut Dom, instructions: &[FillInstruction]) -> FillResponse {
        catch_unwind(AssertUnwindSafe(|| self.core().fill(dom, instructions))).unwrap_or_else(|payload| {
            let message = panic_message(payload);
            error!(error = %message, "fill failed");
            FillResponse::aborted(instructions.len(), message)
        })
    }

    pub async fn undo(&self, dom: &mut Dom, entries: &[UndoEntry]) -> UndoResponse {
        catch_unwind(AssertUnwindSafe(|| self.core().undo(dom, entries))).unwrap_or_else(|payload| {
            let message = panic_message(payload);
            error!(error = %message, "undo failed");
            UndoResponse {
                undone: 0,
                failed: entries.len(),
                error: Some(message),
            }
        })
    }

    fn core(&self) -> &dyn AutofillCore {
        match &self.core {
            Some(core) => core.as_ref(),
            None => self,
        }
    }

    /// Raw signals of this context, for the aggregator.
    pub async fn collect(&self, dom: &Dom) -> CollectResponse {
        let url = dom.url().to_string();
        catch_unwind(AssertUnwindSafe(|| collect::collect(&dom.to_html(), &url, self.context_id))).unwrap_or_else(
            |payload| {
                error!(error = %panic_message(payload), "collect failed");
                CollectResponse::new(String::new(), url.clone(), self.context_id)
            },
        )
    }
}

impl AutofillCore for Engine {
    fn detect(&self, dom: &mut Dom, board: Option<&str>, context_id: u32) -> Vec<DetectedField> {
        self.detector.detect(dom, board, context_id)
    }

    fn fill(&self, dom: &mut Dom, instructions: &[FillInstruction]) -> FillResponse {
        self.executor.fill(dom, instructions)
    }

    fn undo(&self, dom: &mut Dom, entries: &[UndoEntry]) -> UndoResponse {
        self.executor.undo(dom, entries)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("detector", &self.detector)
            .field("custom_core", &self.core.is_some())
            .field("context_id", &self.context_id)
            .finish()
    }
}

/// Panic payloads that are strings are reported verbatim.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
