//! Structured data: schema.org `JobPosting` JSON-LD and Open Graph tags.

use indexmap::IndexMap;
use scraper::Html;
use serde_json::Value;
use tracing::{debug, warn};

use crate::collect;
use crate::pipeline::context::ExtractionContext;
use crate::pipeline::trace::LayerName;
use crate::types::{ExtractionSource, JobField, RawCollection};

const LAYER: LayerName = LayerName::StructuredData;

/// Meta properties read at the meta tier, in the order they are offered.
const META_FIELDS: &[(&str, JobField)] = &[
    ("og:title", JobField::Title),
    ("og:site_name", JobField::Company),
    ("og:description", JobField::Description),
];

pub(crate) fn run(document: &Html, collection: &RawCollection, ctx: &mut ExtractionContext) {
    ctx.record_layer(LAYER);

    let blocks = if collection.structured_data_blocks.is_empty() {
        collect::structured_data_blocks(document)
    } else {
        collection.structured_data_blocks.clone()
    };
    for (index, block) in blocks.iter().enumerate() {
        let parsed: Value = match serde_json::from_str(block.trim()) {
            Ok(value) => value,
            Err(err) => {
                warn!(block = index, error = %err, "skipping malformed structured data block");
                ctx.trace_mut()
                    .note(format!("malformed structured data block {index}: {err}"));
                continue;
            }
        };
        let postings = job_postings(&parsed);
        debug!(block = index, postings = postings.len(), "structured data block");
        for posting in postings {
            offer_posting(posting, ctx);
        }
    }

    let meta = if collection.meta_tags.is_empty() {
        collect::og_meta_tags(document)
    } else {
        collection.meta_tags.clone()
    };
    offer_meta(&meta, ctx);
}

fn offer_posting(posting: &Value, ctx: &mut ExtractionContext) {
    let fields = [
        (JobField::Title, title(posting), "title"),
        (JobField::Company, company(posting), "hiringOrganization"),
        (JobField::Description, scalar(posting.get("description")), "description"),
        (JobField::Location, location(posting), "jobLocation"),
        (JobField::Salary, salary(posting), "baseSalary"),
        (JobField::EmploymentType, employment_type(posting), "employmentType"),
    ];
    for (field, value, key) in fields {
        if let Some(value) = value {
            ctx.offer(LAYER, field, &value, ExtractionSource::JsonLd, key);
        }
    }
}

fn offer_meta(meta: &IndexMap<String, String>, ctx: &mut ExtractionContext) {
    for (property, field) in META_FIELDS {
        if let Some(content) = meta.get(*property) {
            ctx.offer(LAYER, *field, content, ExtractionSource::MetaTag, property);
        }
    }
}

/// Every `JobPosting` object in a block, searching arrays and `@graph`.
pub(crate) fn job_postings(value: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    collect_postings(value, &mut out);
    out
}

fn collect_postings<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_postings(item, out)),
        Value::Object(map) => {
            let is_posting = match map.get("@type") {
                Some(Value::String(t)) => t == "JobPosting",
                Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("JobPosting")),
                _ => false,
            };
            if is_posting {
                out.push(value);
            }
            if let Some(Value::Array(graph)) = map.get("@graph") {
                graph.iter().for_each(|item| collect_postings(item, out));
            }
        }
        _ => {}
    }
}

/// String or number as text.
fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn title(posting: &Value) -> Option<String> {
    scalar(posting.get("title")).or_else(|| scalar(posting.get("name")))
}

fn company(posting: &Value) -> Option<String> {
    match posting.get("hiringOrganization")? {
        Value::Object(org) => scalar(org.get("name")),
        other => scalar(Some(other)),
    }
}

fn location(posting: &Value) -> Option<String> {
    let locations = match posting.get("jobLocation")? {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        single => vec![single],
    };
    let parts: Vec<String> = locations
        .into_iter()
        .filter_map(|loc| match loc {
            Value::String(s) => Some(s.clone()),
            Value::Object(place) => match place.get("address")? {
                Value::String(s) => Some(s.clone()),
                Value::Object(address) => {
                    let locality = scalar(address.get("addressLocality"));
                    let region = scalar(address.get("addressRegion"));
                    match (locality, region) {
                        (Some(l), Some(r)) => Some(format!("{l}, {r}")),
                        (Some(l), None) => Some(l),
                        (None, Some(r)) => Some(r),
                        (None, None) => None,
                    }
                }
                _ => None,
            },
            _ => None,
        })
        .filter(|s| !s.trim().is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

/// `"USD 120000 - 150000"` for ranges, `"USD 120000"` for a single value.
fn salary(posting: &Value) -> Option<String> {
    let salary = posting
        .get("baseSalary")
        .or_else(|| posting.get("estimatedSalary"))
        .filter(|s| s.is_object())?;
    // MonetaryAmount usually nests a QuantitativeValue under `value`
    let amount = salary.get("value").filter(|v| v.is_object()).unwrap_or(salary);
    let low = scalar(amount.get("value")).or_else(|| scalar(amount.get("minValue")))?;
    let high = scalar(amount.get("maxValue"));
    let currency = salary
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let text = match high {
        Some(high) if high != low => format!("{currency} {low} - {high}"),
        _ => format!("{currency} {low}"),
    };
    Some(text.trim().to_string())
}

fn employment_type(posting: &Value) -> Option<String> {
    match posting.get("employmentType")? {
        Value::Array(items) => {
            let types: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if types.is_empty() {
                None
            } else {
                Some(types.join(", "))
            }
        }
        other => scalar(Some(other)),
    }
}
