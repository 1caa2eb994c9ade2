//! Value cleanup applied before a value may freeze a field.

use scraper::node::Node;
use scraper::{ElementRef, Html};

const SKIPPED_TEXT_PARENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Visible text of an element, text nodes separated by spaces.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in element.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let skipped = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take_while(|ancestor| ancestor.id() != element.id())
            .any(|ancestor| SKIPPED_TEXT_PARENTS.contains(&ancestor.value().name()));
        if !skipped && !text.trim().is_empty() {
            parts.push(text);
        }
    }
    collapse_whitespace(&parts.join(" "))
}

/// Decode entities, strip markup, collapse whitespace and cap at `max_chars`.
///
/// Structured data often carries entity-escaped HTML, so a second pass runs
/// when the first one still leaves tags behind.
pub fn normalize_value(raw: &str, max_chars: usize) -> String {
    let mut text = strip_markup(raw);
    if looks_like_markup(&text) {
        text = strip_markup(&text);
    }
    truncate_chars(&collapse_whitespace(&text), max_chars)
}

fn strip_markup(raw: &str) -> String {
    if !raw.contains('<') && !raw.contains('&') {
        return raw.to_string();
    }
    let fragment = Html::parse_fragment(raw);
    element_text(fragment.root_element())
}

fn looks_like_markup(text: &str) -> bool {
    text.contains('<') && text.contains('>')
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_entities_and_strips_tags() {
        assert_eq!(normalize_value("Tom &amp; Jerry", 100), "Tom & Jerry");
        assert_eq!(normalize_value("<p>Build</p><p>things</p>", 100), "Build things");
        assert_eq!(
            normalize_value("&lt;p&gt;Escaped &lt;b&gt;markup&lt;/b&gt;&lt;/p&gt;", 100),
            "Escaped markup"
        );
        assert_eq!(normalize_value("  lots \n\t of   space ", 100), "lots of space");
    }

    #[test]
    fn test_caps_length_on_char_boundary() {
        assert_eq!(normalize_value("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_element_text_skips_scripts() {
        let html = Html::parse_fragment("<div>Role<script>var x = 1;</script> <span>details</span></div>");
        assert_eq!(element_text(html.root_element()), "Role details");
    }

    #[test]
    fn test_empty_after_cleaning() {
        assert_eq!(normalize_value("<br><br>", 100), "");
        assert_eq!(normalize_value("&nbsp;", 100), "");
    }
}
