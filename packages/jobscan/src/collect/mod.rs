//! Raw per-context collection.
//!
//! Read-only probing of one document: markup, JSON-LD blocks, Open Graph
//! tags, and whether the page hides part of its content behind an
//! "expand" control. Nothing here interacts with the page.

mod aggregate;

use indexmap::IndexMap;
use scraper::{Html, Selector};
use tracing::debug;

use crate::types::RawCollection;

pub use aggregate::{aggregate, Aggregated};

/// Controls that indicate collapsed posting content.
pub const TRUNCATION_SELECTORS: &[&str] = &[
    ".show-more-less-html__button--more",
    "button[aria-label=\"Show full description\"]",
    "[class*=\"show-more\"]",
    "[class*=\"showMore\"]",
    "[class*=\"read-more\"]",
    "[class*=\"readMore\"]",
    "details:not([open])",
];

/// Collect raw signals from one context's markup.
pub fn collect(markup: &str, url: &str, context_id: u32) -> RawCollection {
    let document = Html::parse_document(markup);
    let collection = RawCollection {
        markup: markup.to_string(),
        url: url.to_string(),
        structured_data_blocks: structured_data_blocks(&document),
        meta_tags: og_meta_tags(&document),
        has_truncated_content: has_truncated_content(&document),
        context_id,
    };
    debug!(
        context_id,
        markup_len = collection.markup.len(),
        json_ld_blocks = collection.structured_data_blocks.len(),
        meta_tags = collection.meta_tags.len(),
        truncated = collection.has_truncated_content,
        "collected context"
    );
    collection
}

/// Text of every `application/ld+json` script, in document order.
pub fn structured_data_blocks(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("script[type=\"application/ld+json\"]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .collect()
}

/// `og:*` meta properties; a later tag with the same property wins.
pub fn og_meta_tags(document: &Html) -> IndexMap<String, String> {
    let mut tags = IndexMap::new();
    let Ok(selector) = Selector::parse("meta[property^=\"og:\"]") else {
        return tags;
    };
    for el in document.select(&selector) {
        let property = el.value().attr("property").unwrap_or_default();
        let content = el.value().attr("content").unwrap_or_default();
        tags.insert(property.to_string(), content.to_string());
    }
    tags
}

pub fn has_truncated_content(document: &Html) -> bool {
    TRUNCATION_SELECTORS.iter().any(|s| match Selector::parse(s) {
        Ok(selector) => document.select(&selector).next().is_some(),
        Err(_) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_structured_data_and_meta() {
        let markup = r#"<html><head>
            <meta property="og:title" content="Rust Engineer">
            <meta property="og:site_name" content="Acme">
            <meta name="description" content="ignored">
            <script type="application/ld+json">{"@type":"JobPosting","title":"Rust Engineer"}</script>
            </head><body><p>hi</p></body></html>"#;
        let collection = collect(markup, "https://acme.test/jobs/1", 3);
        assert_eq!(collection.context_id, 3);
        assert_eq!(collection.structured_data_blocks.len(), 1);
        assert!(collection.structured_data_blocks[0].contains("JobPosting"));
        assert_eq!(collection.meta_tags.get("og:title").map(String::as_str), Some("Rust Engineer"));
        assert_eq!(collection.meta_tags.len(), 2);
        assert!(!collection.has_truncated_content);
    }

    #[test]
    fn test_truncation_indicators() {
        for markup in [
            r#"<button class="show-more-less-html__button--more">more</button>"#,
            r#"<button aria-label="Show full description">...</button>"#,
            r#"<div class="jobs-readMore-toggle"></div>"#,
            r#"<details><summary>Benefits</summary>x</details>"#,
        ] {
            let document = Html::parse_document(markup);
            assert!(has_truncated_content(&document), "{markup}");
        }
        let open = Html::parse_document("<details open><summary>x</summary></details>");
        assert!(!has_truncated_content(&open));
    }
}
