//! Structural last-resort fallbacks.
//!
//! Runs the registry's heuristic entries first, then a fixed set of
//! structural checks: the first `h1`, labelled headings followed by their
//! value, and large content regions for the description. With repair
//! enabled, fields still open after that go through [`super::repair`].

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::repair;
use super::selectors::first_match;
use crate::pipeline::context::ExtractionContext;
use crate::pipeline::normalize::element_text;
use crate::pipeline::trace::{LayerName, Rejection};
use crate::registry::{SelectorRegistry, SelectorTier};
use crate::types::{ExtractionSource, JobField, PipelineConfig};

const LAYER: LayerName = LayerName::Heuristic;
const SOURCE: ExtractionSource = ExtractionSource::Heuristic;

const MAX_TITLE_LEN: usize = 300;
const MAX_HEADING_VALUE_LEN: usize = 500;
const MIN_DETAILS_LEN: usize = 100;

const DESCRIPTION_REGIONS: &[&str] = &[
    "main",
    "[role=\"main\"]",
    ".job-description",
    ".description",
    "#job-description",
    "article",
];

lazy_static! {
    static ref COMPANY_HEADING: Regex = Regex::new(r"(?i)company|employer|organization|hiring").unwrap();
    static ref LOCATION_HEADING: Regex = Regex::new(r"(?i)location|where|office|remote").unwrap();
}

pub(crate) fn run(document: &Html, registry: &SelectorRegistry, config: &PipelineConfig, ctx: &mut ExtractionContext) {
    ctx.record_layer(LAYER);

    for field in ctx.pending_fields() {
        for entry in registry.tier_entries(SelectorTier::Heuristic, None, field) {
            let text = first_match(document, entry);
            ctx.record_selector(entry, text.is_some());
            let Some(text) = text else {
                continue;
            };
            if field == JobField::Description && too_short(&text, config.heuristic_min_description_len) {
                ctx.reject(LAYER, field, SOURCE, &entry.id, Rejection::TooShort);
                continue;
            }
            if ctx.offer(LAYER, field, &text, SOURCE, &entry.id) {
                break;
            }
        }
    }

    if !ctx.is_frozen(JobField::Title) {
        if let Some(title) = first_h1(document) {
            ctx.offer(LAYER, JobField::Title, &title, SOURCE, "h1");
        }
    }
    if !ctx.is_frozen(JobField::Company) {
        if let Some(company) = heading_value(document, &COMPANY_HEADING) {
            ctx.offer(LAYER, JobField::Company, &company, SOURCE, "company-heading");
        }
    }
    if !ctx.is_frozen(JobField::Description) {
        if let Some((origin, text)) = description_region(document, config.heuristic_min_description_len) {
            ctx.offer(LAYER, JobField::Description, &text, SOURCE, origin);
        }
    }
    if !ctx.is_frozen(JobField::Location) {
        if let Some(location) = heading_value(document, &LOCATION_HEADING) {
            ctx.offer(LAYER, JobField::Location, &location, SOURCE, "location-heading");
        }
    }

    if config.heuristic_repair {
        repair::run(document, ctx);
    }
}

fn too_short(text: &str, min_len: usize) -> bool {
    text.chars().count() < min_len
}

fn select_all<'a>(document: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(parsed) => document.select(&parsed).collect(),
        Err(_) => Vec::new(),
    }
}

fn first_h1(document: &Html) -> Option<String> {
    let h1 = select_all(document, "h1").into_iter().next()?;
    let text = element_text(h1);
    (!text.is_empty() && text.chars().count() < MAX_TITLE_LEN).then_some(text)
}

/// Text of the element right after the first heading matching `pattern`.
fn heading_value(document: &Html, pattern: &Regex) -> Option<String> {
    select_all(document, "h1, h2, h3")
        .into_iter()
        .filter(|heading| pattern.is_match(&element_text(*heading)))
        .find_map(|heading| {
            let next = heading.next_siblings().find_map(ElementRef::wrap)?;
            let text = element_text(next);
            let len = text.chars().count();
            (len > 0 && len < MAX_HEADING_VALUE_LEN).then_some(text)
        })
}

fn description_region(document: &Html, min_len: usize) -> Option<(&'static str, String)> {
    for region in DESCRIPTION_REGIONS {
        if let Some(el) = select_all(document, region).into_iter().next() {
            let text = element_text(el);
            if text.chars().count() > min_len {
                return Some((*region, text));
            }
        }
    }
    select_all(document, "details")
        .into_iter()
        .map(element_text)
        .find(|text| text.chars().count() > MIN_DETAILS_LEN)
        .map(|text| ("details", text))
}
