//! External enrichment, consulted last for fields still open.

use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::pipeline::context::ExtractionContext;
use crate::pipeline::normalize::{collapse_whitespace, element_text, truncate_chars};
use crate::pipeline::trace::LayerName;
use crate::traits::enricher::{EnrichmentOutcome, Enricher};
use crate::types::{ExtractionSource, PipelineConfig};

const LAYER: LayerName = LayerName::Enrichment;

/// Page text handed to the enricher, captured before the document is dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct EnrichmentInput {
    pub text: String,
    pub page_title: Option<String>,
}

impl EnrichmentInput {
    pub(crate) fn from_document(document: &Html, max_chars: usize) -> Self {
        let text = Selector::parse("body")
            .ok()
            .and_then(|body| document.select(&body).next())
            .map(element_text)
            .unwrap_or_default();
        Self {
            text: truncate_chars(&text, max_chars),
            page_title: page_title(document),
        }
    }
}

fn page_title(document: &Html) -> Option<String> {
    let from_title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| collapse_whitespace(&el.text().collect::<String>()));
    let from_meta = || {
        Selector::parse("meta[property=\"og:title\"]")
            .ok()
            .and_then(|sel| document.select(&sel).next())
            .and_then(|el| el.value().attr("content"))
            .map(collapse_whitespace)
    };
    from_title.filter(|t| !t.is_empty()).or_else(from_meta).filter(|t| !t.is_empty())
}

/// Whether the enricher should be consulted; records the decision either way.
pub(crate) fn should_run(ctx: &mut ExtractionContext, config: &PipelineConfig, has_enricher: bool) -> bool {
    if !has_enricher {
        return false;
    }
    if ctx.all_frozen() {
        ctx.trace_mut().note("enrichment skipped: every field frozen");
        return false;
    }
    let completeness = ctx.completeness();
    if completeness >= config.enrichment_threshold {
        ctx.trace_mut().note(format!(
            "enrichment skipped: completeness {completeness:.2} >= threshold {:.2}",
            config.enrichment_threshold
        ));
        return false;
    }
    true
}

pub(crate) async fn run(enricher: &dyn Enricher, input: &EnrichmentInput, ctx: &mut ExtractionContext) {
    ctx.record_layer(LAYER);
    ctx.trace_mut().enrichment_triggered = true;
    debug!(chars = input.text.chars().count(), pending = ctx.pending_fields().len(), "consulting enricher");

    match enricher.enrich(&input.text, input.page_title.as_deref()).await {
        Ok(EnrichmentOutcome::Found(values)) => {
            for (field, value) in values {
                ctx.offer(LAYER, field, &value, ExtractionSource::Enrichment, "enricher");
            }
        }
        Ok(EnrichmentOutcome::NotFound) => {
            ctx.trace_mut().note("enricher found no job posting");
        }
        Err(err) => {
            warn!(error = %err, "enrichment failed, keeping layered result");
            ctx.trace_mut().note(format!("enrichment failed: {err}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_skips_scripts_and_caps_length() {
        let document = Html::parse_document(
            "<html><head><title> Rust   Engineer | Acme </title></head><body><script>var x = 1;</script><p>Hello world, this is long.</p></body></html>",
        );
        let input = EnrichmentInput::from_document(&document, 11);
        assert_eq!(input.text, "Hello world");
        assert_eq!(input.page_title.as_deref(), Some("Rust Engineer | Acme"));
    }

    #[test]
    fn test_title_falls_back_to_og_title() {
        let document = Html::parse_document(
            r#"<html><head><meta property="og:title" content="Data Engineer"></head><body></body></html>"#,
        );
        let input = EnrichmentInput::from_document(&document, 100);
        assert_eq!(input.page_title.as_deref(), Some("Data Engineer"));
        assert_eq!(input.text, "");
    }

    #[test]
    fn test_threshold_gates_enrichment() {
        let mut ctx = ExtractionContext::new("https://a.test", None, 100, 0.2);
        let never = PipelineConfig::default().with_enrichment_threshold(0.0);
        assert!(!should_run(&mut ctx, &never, true));
        assert!(ctx.trace().notes[0].contains("threshold 0.00"));

        assert!(should_run(&mut ctx, &PipelineConfig::default(), true));
        assert!(!should_run(&mut ctx, &PipelineConfig::default(), false));
    }
}
