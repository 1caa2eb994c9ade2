//! Integration tests for the layered extraction pipeline and scan.
//!
//! Runs whole pages through the pipeline with mock enrichers and checks
//! provenance, gating and trace contents.

use std::sync::Arc;

use jobscan::collect::collect;
use jobscan::pipeline::{GateAction, LayerName};
use jobscan::testing::{FailingEnricher, JobPageFixture, MockEnricher};
use jobscan::{ExtractionSource, JobField, Pipeline, PipelineConfig, Scanner, SelectorRegistry, ValidationIssue};

const LONG_DESCRIPTION: &str = "You will design and operate the systems that schedule deliveries \
    for thousands of couriers, working closely with product and operations.";

fn registry() -> Arc<SelectorRegistry> {
    Arc::new(SelectorRegistry::builtin())
}

fn partial_page() -> String {
    JobPageFixture::new()
        .title("Backend Engineer")
        .og("og:title", "Backend Engineer")
        .body(&format!("<article>{LONG_DESCRIPTION}</article>"))
        .build()
}

// =============================================================================
// Enrichment
// =============================================================================

#[tokio::test]
async fn enrichment_fills_only_missing_fields() {
    let enricher = MockEnricher::new()
        .with_field(JobField::Title, "Some Other Title")
        .with_field(JobField::Company, "Courier Co");
    let pipeline = Pipeline::new(registry()).with_enricher(Arc::new(enricher.clone()));
    let collection = collect(&partial_page(), "https://example.com/careers/backend", 0);

    let result = pipeline.run(&collection, None).await;

    assert_eq!(enricher.call_count(), 1);
    assert_eq!(enricher.calls()[0].page_title.as_deref(), Some("Backend Engineer"));
    assert!(result.trace.enrichment_triggered);
    assert!(result.trace.ran(LayerName::Enrichment));

    let title = &result.fields[&JobField::Title];
    assert_eq!(title.value, "Backend Engineer");
    assert_eq!(title.source, ExtractionSource::MetaTag);

    let company = &result.fields[&JobField::Company];
    assert_eq!(company.value, "Courier Co");
    assert_eq!(company.source, ExtractionSource::Enrichment);

    // the enricher's title was seen but not taken
    assert!(result
        .observations
        .iter()
        .any(|o| o.field == JobField::Title && o.value == "Some Other Title"));
}

#[tokio::test]
async fn enrichment_failure_never_fails_the_run() {
    let pipeline = Pipeline::new(registry()).with_enricher(Arc::new(FailingEnricher::new("service down")));
    let collection = collect(&partial_page(), "https://example.com/careers/backend", 0);

    let result = pipeline.run(&collection, None).await;

    assert!(result.trace.enrichment_triggered);
    assert!(result.trace.notes.iter().any(|n| n.contains("enrichment failed")));
    assert!(result.trace.notes.iter().any(|n| n.contains("service down")));
    assert_eq!(result.fields[&JobField::Title].value, "Backend Engineer");
    assert!(!result.fields.contains_key(&JobField::Company));
    assert!(result.validation.issues.contains(&ValidationIssue::MissingCompany));
}

#[tokio::test]
async fn enrichment_respects_threshold() {
    let enricher = MockEnricher::new().with_field(JobField::Company, "Courier Co");
    let pipeline = Pipeline::new(registry())
        .with_config(PipelineConfig::new().with_enrichment_threshold(0.0))
        .with_enricher(Arc::new(enricher.clone()));
    let collection = collect(&partial_page(), "https://example.com/careers/backend", 0);

    let result = pipeline.run(&collection, None).await;

    assert_eq!(enricher.call_count(), 0);
    assert!(!result.trace.enrichment_triggered);
    assert!(result.trace.notes.iter().any(|n| n.starts_with("enrichment skipped")));
}

#[tokio::test]
async fn complete_structured_data_skips_enricher() {
    let page = JobPageFixture::new()
        .json_ld_raw(
            r#"{"@context":"https://schema.org","@graph":[{"@type":"Organization","name":"x"},
            {"@type":["JobPosting"],"title":"Nurse","hiringOrganization":"St. Mary",
             "description":"Care for patients on the night shift in the cardiac unit.",
             "jobLocation":[{"address":{"addressLocality":"Duluth","addressRegion":"MN"}}],
             "baseSalary":{"currency":"USD","value":{"value":40}},
             "employmentType":["FULL_TIME","NIGHT"]}]}"#,
        )
        .build();
    let enricher = MockEnricher::new().with_field(JobField::Company, "Wrong");
    let pipeline = Pipeline::new(registry()).with_enricher(Arc::new(enricher.clone()));

    let result = pipeline.run(&collect(&page, "https://example.com/jobs/9", 0), None).await;

    assert_eq!(enricher.call_count(), 0);
    assert_eq!(result.fields[&JobField::Company].value, "St. Mary");
    assert_eq!(result.fields[&JobField::Location].value, "Duluth, MN");
    assert_eq!(result.fields[&JobField::EmploymentType].value, "FULL_TIME, NIGHT");
    assert_eq!(result.trace.gate_decisions[0].action, GateAction::ShortCircuit);
    assert!(result.validation.is_valid);
}

// =============================================================================
// Structured data and board selectors
// =============================================================================

#[tokio::test]
async fn malformed_block_is_recorded_and_skipped() {
    let page = JobPageFixture::new()
        .json_ld_raw("{ not json")
        .json_ld_posting("Welder", "Forge Inc", LONG_DESCRIPTION)
        .build();
    let pipeline = Pipeline::new(registry());

    let result = pipeline.run(&collect(&page, "https://example.com/jobs/3", 0), None).await;

    assert!(result.trace.notes.iter().any(|n| n.starts_with("malformed structured data block 0")));
    assert_eq!(result.fields[&JobField::Title].value, "Welder");
    assert_eq!(result.fields[&JobField::Title].source, ExtractionSource::JsonLd);
}

#[tokio::test]
async fn board_selectors_beat_generic_fallbacks() {
    let page = JobPageFixture::new()
        .body(
            r#"<div id="app_body"><h1 class="app-title">Staff Designer</h1>
               <span class="company-name">Pixel Works</span>
               <div class="location">Remote, US</div>
               <div id="content">Lead design for the editor and own the component library end to end.</div></div>"#,
        )
        .build();
    let scanner = Scanner::new(Pipeline::new(registry()));
    let top = collect(&page, "https://boards.greenhouse.io/pixel/jobs/100", 0);

    let report = scanner.scan(&[Some(top)], None).await.unwrap();

    assert_eq!(report.board.as_deref(), Some("greenhouse"));
    assert_eq!(report.field(JobField::Title), Some("Staff Designer"));
    assert_eq!(report.sources[&JobField::Title], ExtractionSource::BoardSelector);
    assert_eq!(report.field(JobField::Company), Some("Pixel Works"));
    assert_eq!(report.field(JobField::Location), Some("Remote, US"));
    assert_eq!(report.confidence[&JobField::Title], 0.85);
    assert!(report.is_valid);
    assert!(report.trace.ran(LayerName::BoardSelector));
}

#[tokio::test]
async fn conflicting_dual_sourced_values_are_reported() {
    let page = JobPageFixture::new()
        .og("og:site_name", "Globex")
        .json_ld_posting("Analyst", "Acme Holdings", LONG_DESCRIPTION)
        .build();
    let pipeline = Pipeline::new(registry());

    let result = pipeline.run(&collect(&page, "https://example.com/jobs/4", 0), None).await;

    assert_eq!(result.fields[&JobField::Company].value, "Acme Holdings");
    assert!(result
        .validation
        .issues
        .contains(&ValidationIssue::ConflictingValues { field: JobField::Company }));
}
