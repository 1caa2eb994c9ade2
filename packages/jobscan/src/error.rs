//! Typed errors for the jobscan library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match on
//! the failure instead of parsing messages.

use thiserror::Error;

use crate::types::job::JobField;

/// Top-level error for library entry points that span several concerns.
#[derive(Debug, Error)]
pub enum JobscanError {
    /// Selector registry failed to load or validate
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Live document operation failed
    #[error("document error: {0}")]
    Dom(#[from] DomError),

    /// Fill batch could not be prepared
    #[error("fill error: {0}")]
    Fill(#[from] FillError),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Every context came back empty
    #[error("no context returned a collection")]
    NoContexts,
}

/// Errors raised while loading or validating a selector table.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two entries for the same board and field share a selector
    #[error("duplicate selector {selector:?} for {board}/{field}")]
    DuplicateSelector {
        board: String,
        field: JobField,
        selector: String,
    },

    /// A fallback entry does not rank below every board-specific entry
    #[error("entry {id} (priority {priority}) must rank below board entries for {field} (max board priority {max_board_priority})")]
    PriorityOrder {
        id: String,
        field: JobField,
        priority: i32,
        max_board_priority: i32,
    },

    /// Generic or heuristic entry bound to a concrete board
    #[error("entry {id} has tier {tier} but board {board:?}")]
    TierMismatch {
        id: String,
        tier: String,
        board: String,
    },

    /// Selector string does not parse
    #[error("entry {id} has invalid selector {selector:?}")]
    InvalidSelector { id: String, selector: String },

    /// Two entries share an id
    #[error("duplicate entry id: {0}")]
    DuplicateId(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Errors from the live document model.
#[derive(Debug, Error)]
pub enum DomError {
    /// CSS selector failed to parse
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// Node id does not refer to an element
    #[error("node {0} is not an element")]
    NotAnElement(usize),

    /// Re-parsed query snapshot diverged from the live tree
    #[error("query snapshot diverged from the live tree at element {0}")]
    SnapshotMismatch(usize),
}

/// Errors that abort a whole fill batch before any mutation.
#[derive(Debug, Error)]
pub enum FillError {
    /// Undo snapshot could not be captured
    #[error("snapshot capture failed for {stable_id}: {source}")]
    Snapshot {
        stable_id: String,
        #[source]
        source: DomError,
    },
}

/// Errors reported by an enrichment collaborator.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// Service unreachable or returned a failure
    #[error("enrichment service error: {0}")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Response could not be interpreted
    #[error("malformed enrichment response: {0}")]
    Malformed(String),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, JobscanError>;

/// Result type alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Result type alias for document operations.
pub type DomResult<T> = std::result::Result<T, DomError>;

/// Result type alias for enrichment calls.
pub type EnrichmentResult<T> = std::result::Result<T, EnrichmentError>;
