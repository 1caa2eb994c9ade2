//! Raw per-context collection output.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Unprocessed signals gathered from one execution context.
///
/// This is also the payload of the `collect` handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCollection {
    pub markup: String,
    pub url: String,
    #[serde(default)]
    pub structured_data_blocks: Vec<String>,
    #[serde(default)]
    pub meta_tags: IndexMap<String, String>,
    #[serde(default)]
    pub has_truncated_content: bool,
    #[serde(default)]
    pub context_id: u32,
}

impl RawCollection {
    pub fn new(markup: impl Into<String>, url: impl Into<String>, context_id: u32) -> Self {
        Self {
            markup: markup.into(),
            url: url.into(),
            context_id,
            ..Default::default()
        }
    }

    /// Length of the markup in characters.
    pub fn markup_len(&self) -> usize {
        self.markup.chars().count()
    }
}

/// Payload returned by the `collect` handler.
pub type CollectResponse = RawCollection;
