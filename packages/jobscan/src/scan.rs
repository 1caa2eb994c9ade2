//! End-to-end scan of a job posting across execution contexts.

use std::future::Future;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;
use url::Url;
use uuid::Uuid;

use crate::collect::aggregate;
use crate::error::{JobscanError, Result};
use crate::pipeline::{ExtractionTrace, Pipeline};
use crate::registry::detect_board;
use crate::scoring::ValidationIssue;
use crate::types::{AggregatorConfig, ExtractionSource, JobField, RawCollection};

/// Result of one scan, ready to display or serialize.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub scan_id: Uuid,
    pub scanned_at: DateTime<Utc>,
    pub url: String,
    pub host: Option<String>,
    pub board: Option<String>,
    pub fields: IndexMap<JobField, String>,
    pub sources: IndexMap<JobField, ExtractionSource>,
    pub confidence: IndexMap<JobField, f64>,
    pub completeness: f64,
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub has_truncated_content: bool,
    pub selected_context_id: u32,
    pub context_count: usize,
    pub trace: ExtractionTrace,
}

impl ScanReport {
    pub fn field(&self, field: JobField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }
}

/// Aggregates contexts and runs the pipeline over the winner.
#[derive(Debug, Clone)]
pub struct Scanner {
    pipeline: Pipeline,
    aggregator: AggregatorConfig,
}

impl Scanner {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            aggregator: AggregatorConfig::default(),
        }
    }

    pub fn with_aggregator_config(mut self, config: AggregatorConfig) -> Self {
        self.aggregator = config;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Scan already-gathered per-context results.
    ///
    /// `board` overrides detection from the selected context's URL.
    pub async fn scan(&self, collections: &[Option<RawCollection>], board: Option<&str>) -> Result<ScanReport> {
        let aggregated = aggregate(collections, &self.aggregator).ok_or(JobscanError::NoContexts)?;
        let selected = &aggregated.selected;

        let board = match board {
            Some(board) => Some(board.to_string()),
            None => detect_board(&selected.url),
        };
        let host = Url::parse(&selected.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string));

        let extraction = self.pipeline.run(selected, board.as_deref()).await;

        let report = ScanReport {
            scan_id: Uuid::now_v7(),
            scanned_at: Utc::now(),
            url: selected.url.clone(),
            host,
            board,
            fields: extraction
                .fields
                .iter()
                .map(|(field, extracted)| (*field, extracted.value.clone()))
                .collect(),
            sources: extraction
                .fields
                .iter()
                .map(|(field, extracted)| (*field, extracted.source))
                .collect(),
            confidence: extraction.validation.confidence,
            completeness: extraction.validation.completeness,
            is_valid: extraction.validation.is_valid,
            issues: extraction.validation.issues,
            has_truncated_content: aggregated.has_truncated_content,
            selected_context_id: selected.context_id,
            context_count: aggregated.context_count,
            trace: extraction.trace,
        };

        info!(
            scan_id = %report.scan_id,
            board = ?report.board,
            selected = report.selected_context_id,
            contexts = report.context_count,
            completeness = report.completeness,
            "scan finished"
        );
        Ok(report)
    }

    /// Await every context's collection, in any completion order, then scan.
    pub async fn scan_contexts<I, F>(&self, contexts: I, board: Option<&str>) -> Result<ScanReport>
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = Option<RawCollection>>,
    {
        let collections = gather(contexts).await;
        self.scan(&collections, board).await
    }
}

/// Run per-context collection futures concurrently.
pub async fn gather<I, F>(contexts: I) -> Vec<Option<RawCollection>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Option<RawCollection>>,
{
    join_all(contexts).await
}
