//! Test doubles and HTML fixtures.
//!
//! Useful for exercising the pipeline and the autofill handlers without a
//! real enrichment service or a browser.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::dom::{Dom, NodeId};
use crate::error::{EnrichmentError, EnrichmentResult};
use crate::traits::accessor::{AccessorError, ClosedRootAccessor};
use crate::traits::autofill::AutofillCore;
use crate::traits::enricher::{EnrichmentOutcome, Enricher};
use crate::types::{DetectedField, FillInstruction, FillResponse, JobField, UndoEntry, UndoResponse};

/// Enricher returning a configured outcome.
#[derive(Clone)]
pub struct MockEnricher {
    outcome: Arc<RwLock<EnrichmentOutcome>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockEnricherCall>>>,
}

/// Record of one call made to the mock enricher.
#[derive(Debug, Clone, PartialEq)]
pub struct MockEnricherCall {
    pub text_len: usize,
    pub page_title: Option<String>,
}

impl Default for MockEnricher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEnricher {
    /// A mock that answers `NotFound` until configured otherwise.
    pub fn new() -> Self {
        Self {
            outcome: Arc::new(RwLock::new(EnrichmentOutcome::NotFound)),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Answer with `value` for `field`, keeping fields set before.
    pub fn with_field(self, field: JobField, value: impl Into<String>) -> Self {
        {
            let mut outcome = self.outcome.write().unwrap();
            match &mut *outcome {
                EnrichmentOutcome::Found(fields) => {
                    fields.insert(field, value.into());
                }
                EnrichmentOutcome::NotFound => {
                    let mut fields = IndexMap::new();
                    fields.insert(field, value.into());
                    *outcome = EnrichmentOutcome::Found(fields);
                }
            }
        }
        self
    }

    pub fn calls(&self) -> Vec<MockEnricherCall> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }
}

#[async_trait]
impl Enricher for MockEnricher {
    async fn enrich(&self, raw_text: &str, page_title: Option<&str>) -> EnrichmentResult<EnrichmentOutcome> {
        self.calls.write().unwrap().push(MockEnricherCall {
            text_len: raw_text.chars().count(),
            page_title: page_title.map(str::to_string),
        });
        Ok(self.outcome.read().unwrap().clone())
    }
}

/// Enricher whose every call fails.
#[derive(Debug, Clone, Default)]
pub struct FailingEnricher {
    message: String,
}

impl FailingEnricher {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Enricher for FailingEnricher {
    async fn enrich(&self, _raw_text: &str, _page_title: Option<&str>) -> EnrichmentResult<EnrichmentOutcome> {
        Err(EnrichmentError::Service(self.message.clone().into()))
    }
}

/// Accessor that panics on use, standing in for a host API that throws.
#[derive(Debug, Clone)]
pub struct PanickingAccessor {
    message: String,
}

impl PanickingAccessor {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ClosedRootAccessor for PanickingAccessor {
    fn open_or_closed_shadow_root(&self, _dom: &Dom, _host: NodeId) -> Result<Option<NodeId>, AccessorError> {
        panic!("{}", self.message)
    }
}

/// Autofill core whose every operation panics with a plain string payload.
#[derive(Debug, Clone)]
pub struct PanickingCore {
    message: String,
}

impl PanickingCore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn raise(&self) -> ! {
        std::panic::panic_any(self.message.clone())
    }
}

impl AutofillCore for PanickingCore {
    fn detect(&self, _dom: &mut Dom, _board: Option<&str>, _context_id: u32) -> Vec<DetectedField> {
        self.raise()
    }

    fn fill(&self, _dom: &mut Dom, _instructions: &[FillInstruction]) -> FillResponse {
        self.raise()
    }

    fn undo(&self, _dom: &mut Dom, _entries: &[UndoEntry]) -> UndoResponse {
        self.raise()
    }
}

/// Builder for job posting pages.
#[derive(Debug, Clone, Default)]
pub struct JobPageFixture {
    title: Option<String>,
    head: Vec<String>,
    body: Vec<String>,
}

impl JobPageFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<title>` of the page.
    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// A JSON-LD `JobPosting` block.
    pub fn json_ld_posting(mut self, title: &str, company: &str, description: &str) -> Self {
        let posting = serde_json::json!({
            "@context": "https://schema.org",
            "@type": "JobPosting",
            "title": title,
            "hiringOrganization": { "@type": "Organization", "name": company },
            "description": description,
        });
        self.head.push(format!(r#"<script type="application/ld+json">{posting}</script>"#));
        self
    }

    /// A raw `application/ld+json` block, valid or not.
    pub fn json_ld_raw(mut self, raw: &str) -> Self {
        self.head.push(format!(r#"<script type="application/ld+json">{raw}</script>"#));
        self
    }

    pub fn og(mut self, property: &str, content: &str) -> Self {
        self.head
            .push(format!(r#"<meta property="{property}" content="{content}">"#));
        self
    }

    /// Append markup to the body.
    pub fn body(mut self, markup: &str) -> Self {
        self.body.push(markup.to_string());
        self
    }

    pub fn build(&self) -> String {
        let title = self
            .title
            .as_ref()
            .map(|t| format!("<title>{t}</title>"))
            .unwrap_or_default();
        format!(
            "<!DOCTYPE html><html><head>{title}{}</head><body>{}</body></html>",
            self.head.join(""),
            self.body.join("")
        )
    }
}

/// Builder for application forms.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFormFixture {
    controls: Vec<String>,
}

impl ApplicationFormFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labelled `<input>` of the given type; `attrs` is appended verbatim.
    pub fn input(mut self, id: &str, input_type: &str, label: &str, attrs: &str) -> Self {
        self.controls.push(format!(
            r#"<label for="{id}">{label}</label><input id="{id}" name="{id}" type="{input_type}" {attrs}>"#
        ));
        self
    }

    pub fn textarea(mut self, id: &str, label: &str) -> Self {
        self.controls
            .push(format!(r#"<label for="{id}">{label}</label><textarea id="{id}" name="{id}"></textarea>"#));
        self
    }

    /// Select with a leading empty placeholder option.
    pub fn select(mut self, id: &str, label: &str, options: &[(&str, &str)]) -> Self {
        let options: String = options
            .iter()
            .map(|(value, text)| format!(r#"<option value="{value}">{text}</option>"#))
            .collect();
        self.controls.push(format!(
            r#"<label for="{id}">{label}</label><select id="{id}" name="{id}"><option value="">Select...</option>{options}</select>"#
        ));
        self
    }

    pub fn checkbox(self, id: &str, label: &str) -> Self {
        self.input(id, "checkbox", label, "")
    }

    /// Arbitrary markup inside the form, e.g. a shadow host.
    pub fn raw(mut self, markup: &str) -> Self {
        self.controls.push(markup.to_string());
        self
    }

    pub fn build(&self) -> String {
        format!(
            r#"<!DOCTYPE html><html><body><form id="application">{}<button type="submit">Submit</button></form></body></html>"#,
            self.controls.join("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_enricher_tracks_calls() {
        let mock = MockEnricher::new().with_field(JobField::Company, "Acme");
        let outcome = mock.enrich("some text", Some("Title")).await.unwrap();

        assert!(matches!(outcome, EnrichmentOutcome::Found(ref f) if f.get(&JobField::Company).map(String::as_str) == Some("Acme")));
        assert_eq!(
            mock.calls(),
            vec![MockEnricherCall {
                text_len: 9,
                page_title: Some("Title".to_string())
            }]
        );
        mock.clear_calls();
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_fixture_builds_parseable_form() {
        let html = ApplicationFormFixture::new()
            .input("email", "email", "Email", "required")
            .select("country", "Country", &[("US", "United States")])
            .build();
        let dom = Dom::parse(&html, "");
        assert!(dom.query_selector(dom.document(), "#email[required]").unwrap().is_some());
        assert_eq!(dom.options(dom.query_selector(dom.document(), "#country").unwrap().unwrap()).len(), 2);
    }
}
