//! External enrichment collaborator.

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::error::EnrichmentResult;
use crate::types::JobField;

/// What an enrichment service made of the page text.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    /// Fields the service could read from the text. May be partial.
    Found(IndexMap<JobField, String>),
    /// The text does not look like a job posting.
    NotFound,
}

/// A text-understanding service consulted when the layered pipeline leaves
/// required fields missing or weak.
///
/// Values it returns are merged only into fields that are still empty, at
/// the lowest provenance tier.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Read job fields out of raw page text.
    ///
    /// `raw_text` is already capped to the configured budget.
    async fn enrich(&self, raw_text: &str, page_title: Option<&str>) -> EnrichmentResult<EnrichmentOutcome>;
}
