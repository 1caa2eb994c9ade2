//! Selector repair for fields every registry tier missed.
//!
//! Three searches run in order, each keyed on a per-field keyword list:
//! headings inside known containers followed by their value, `data-*`,
//! `aria-label` and `itemprop` attributes, then class names within edit
//! distance 2 of a keyword. The first hit wins and the selector that found
//! it is recorded as the attempt's origin.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::pipeline::context::ExtractionContext;
use crate::pipeline::normalize::element_text;
use crate::pipeline::trace::LayerName;
use crate::types::{ExtractionSource, JobField};

const LAYER: LayerName = LayerName::Heuristic;
const SOURCE: ExtractionSource = ExtractionSource::HeuristicRepair;

const MAX_VALUE_LEN: usize = 2000;
const MAX_CLASS_DISTANCE: usize = 3;
const MIN_SEGMENT_LEN: usize = 3;

const CONTAINERS: &str =
    "section, article, div[class*='job'], div[class*='posting'], div[class*='details'], main";
const DATA_ATTRIBUTES: &[&str] = &["data-testid", "data-automation-id", "data-field", "data-qa"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RepairStrategy {
    SiblingTraversal,
    AttributeDiscovery,
    ClassFuzzyMatch,
}

impl RepairStrategy {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            RepairStrategy::SiblingTraversal => "sibling-parent-traversal",
            RepairStrategy::AttributeDiscovery => "attribute-discovery",
            RepairStrategy::ClassFuzzyMatch => "class-fuzzy-match",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Repair {
    pub value: String,
    pub selector: String,
    pub strategy: RepairStrategy,
}

fn keywords(field: JobField) -> &'static [&'static str] {
    match field {
        JobField::Title => &["title", "job-title", "jobtitle", "position", "role", "heading"],
        JobField::Company => &["company", "employer", "organization", "hiring", "org"],
        JobField::Description => &["description", "job-description", "details", "about", "overview"],
        JobField::Location => &["location", "address", "city", "where", "office", "remote"],
        JobField::Salary => &["salary", "compensation", "pay", "wage", "range"],
        JobField::EmploymentType => &["employment", "type", "contract", "full-time", "part-time"],
    }
}

/// Offer a repaired value for every field still open.
pub(crate) fn run(document: &Html, ctx: &mut ExtractionContext) {
    for field in ctx.pending_fields() {
        let Some(repair) = repair_field(document, field) else {
            continue;
        };
        if ctx.offer(LAYER, field, &repair.value, SOURCE, &repair.selector) {
            debug!(field = %field, selector = %repair.selector, strategy = repair.strategy.as_str(), "selector repaired");
            ctx.trace_mut()
                .note(format!("repaired {field} via {}", repair.strategy.as_str()));
        }
    }
}

pub(crate) fn repair_field(document: &Html, field: JobField) -> Option<Repair> {
    let keywords = keywords(field);
    sibling_traversal(document, keywords)
        .or_else(|| attribute_discovery(document, keywords))
        .or_else(|| class_fuzzy_match(document, keywords))
}

fn usable_text(element: ElementRef<'_>) -> Option<String> {
    let text = element_text(element);
    let len = text.chars().count();
    (len > 0 && len < MAX_VALUE_LEN).then_some(text)
}

fn parse(selector: &str) -> Option<Selector> {
    Selector::parse(selector).ok()
}

fn sibling_traversal(document: &Html, keywords: &[&str]) -> Option<Repair> {
    let containers = parse(CONTAINERS)?;
    let headings = parse("h1, h2, h3, h4")?;

    for container in document.select(&containers) {
        for heading in container.select(&headings) {
            let heading_text = element_text(heading).to_lowercase();
            if !keywords.iter().any(|kw| heading_text.contains(kw)) {
                continue;
            }
            let Some(sibling) = heading.next_siblings().find_map(ElementRef::wrap) else {
                continue;
            };
            if let Some(value) = usable_text(sibling) {
                return Some(Repair {
                    value,
                    selector: selector_for(sibling),
                    strategy: RepairStrategy::SiblingTraversal,
                });
            }
        }
    }
    None
}

/// `tag.class1.class2`, or the bare tag when the classes do not parse.
fn selector_for(element: ElementRef<'_>) -> String {
    let tag = element.value().name();
    let classes: Vec<&str> = element.value().classes().collect();
    if classes.is_empty() {
        return tag.to_string();
    }
    let selector = format!("{tag}.{}", classes.join("."));
    if parse(&selector).is_some() {
        selector
    } else {
        tag.to_string()
    }
}

fn attribute_discovery(document: &Html, keywords: &[&str]) -> Option<Repair> {
    for keyword in keywords {
        let candidates = DATA_ATTRIBUTES
            .iter()
            .map(|attr| format!("[{attr}*=\"{keyword}\"]"))
            .chain([
                format!("[aria-label*=\"{keyword}\" i]"),
                format!("[itemprop*=\"{keyword}\"]"),
            ]);

        for raw in candidates {
            let Some(selector) = parse(&raw) else {
                continue;
            };
            let Some(element) = document.select(&selector).next() else {
                continue;
            };
            if let Some(value) = usable_text(element) {
                return Some(Repair {
                    value,
                    selector: raw,
                    strategy: RepairStrategy::AttributeDiscovery,
                });
            }
        }
    }
    None
}

fn class_fuzzy_match(document: &Html, keywords: &[&str]) -> Option<Repair> {
    let classed = parse("[class]")?;

    for element in document.select(&classed) {
        for class in element.value().classes() {
            let lower = class.to_lowercase();
            let close = keywords.iter().any(|kw| {
                lower.contains(kw)
                    || lower
                        .split(['-', '_'])
                        .any(|seg| seg.chars().count() >= MIN_SEGMENT_LEN && levenshtein(seg, kw) < MAX_CLASS_DISTANCE)
            });
            if !close {
                continue;
            }
            if let Some(value) = usable_text(element) {
                return Some(Repair {
                    value,
                    selector: format!(".{class}"),
                    strategy: RepairStrategy::ClassFuzzyMatch,
                });
            }
        }
    }
    None
}

/// Edit distance over chars.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let cost = usize::from(ca != *cb);
            row[j + 1] = (above + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = above;
        }
    }
    row[b.len()]
}
