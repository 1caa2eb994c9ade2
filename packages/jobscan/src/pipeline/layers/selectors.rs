//! Registry selector layers (board tier and generic tier).

use scraper::{Html, Selector};
use tracing::debug;

use crate::pipeline::context::ExtractionContext;
use crate::pipeline::normalize::element_text;
use crate::pipeline::trace::LayerName;
use crate::registry::{SelectorEntry, SelectorRegistry, SelectorTier, GENERIC_BOARD};

/// Board tier. Skipped when no specific board was detected.
pub(crate) fn run_board(document: &Html, registry: &SelectorRegistry, ctx: &mut ExtractionContext) {
    ctx.record_layer(LayerName::BoardSelector);
    let Some(board) = ctx.board.clone().filter(|b| b != GENERIC_BOARD) else {
        ctx.trace_mut().note("no board detected, board selectors skipped");
        return;
    };
    run_tier(document, registry, SelectorTier::Board, Some(&board), LayerName::BoardSelector, ctx);
}

/// Generic tier, for whatever the board tier left open.
pub(crate) fn run_generic(document: &Html, registry: &SelectorRegistry, ctx: &mut ExtractionContext) {
    ctx.record_layer(LayerName::GenericSelector);
    let board = ctx.board.clone();
    run_tier(
        document,
        registry,
        SelectorTier::Generic,
        board.as_deref(),
        LayerName::GenericSelector,
        ctx,
    );
}

fn run_tier(
    document: &Html,
    registry: &SelectorRegistry,
    tier: SelectorTier,
    board: Option<&str>,
    layer: LayerName,
    ctx: &mut ExtractionContext,
) {
    for field in ctx.pending_fields() {
        for entry in registry.tier_entries(tier, board, field) {
            let text = first_match(document, entry);
            ctx.record_selector(entry, text.is_some());
            if let Some(text) = text {
                if ctx.offer(layer, field, &text, tier.source(), &entry.id) {
                    break;
                }
            }
        }
    }
}

/// Text of the first element matched by the entry's first productive selector.
pub(crate) fn first_match(document: &Html, entry: &SelectorEntry) -> Option<String> {
    for raw in &entry.selectors {
        let selector = match Selector::parse(raw) {
            Ok(selector) => selector,
            Err(err) => {
                debug!(entry = %entry.id, selector = %raw, error = ?err, "selector failed to parse");
                continue;
            }
        };
        let Some(element) = document.select(&selector).next() else {
            continue;
        };
        let text = element_text(element);
        if !text.is_empty() {
            debug!(entry = %entry.id, selector = %raw, "selector matched");
            return Some(text);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExtractionSource, JobField};

    fn context(board: Option<&str>) -> ExtractionContext {
        ExtractionContext::new("https://a.test", board.map(str::to_string), 5000, 0.2)
    }

    #[test]
    fn test_board_tier_prefers_lowest_priority_entry() {
        let document = Html::parse_document(
            r#"<body>
                <div class="job-details-jobs-unified-top-card__job-title"><h1>Staff Engineer</h1></div>
                <h1 class="t-24">Older Layout Title</h1>
            </body>"#,
        );
        let registry = SelectorRegistry::builtin();
        let mut ctx = context(Some("linkedin"));

        run_board(&document, &registry, &mut ctx);

        let title = &ctx.fields()[&JobField::Title];
        assert_eq!(title.value, "Staff Engineer");
        assert_eq!(title.source, ExtractionSource::BoardSelector);
        assert_eq!(ctx.trace().contribution_for(JobField::Title).unwrap().origin, "li-title-unified");
    }

    #[test]
    fn test_board_tier_skipped_without_board() {
        let document = Html::parse_document("<body><h1>Engineer</h1></body>");
        let registry = SelectorRegistry::builtin();
        let mut ctx = context(None);

        run_board(&document, &registry, &mut ctx);
        assert!(ctx.fields().is_empty());
        assert_eq!(ctx.trace().notes.len(), 1);

        run_generic(&document, &registry, &mut ctx);
        assert_eq!(ctx.fields()[&JobField::Title].source, ExtractionSource::GenericSelector);
    }

    #[test]
    fn test_empty_match_falls_through_to_next_selector() {
        let document = Html::parse_document(
            r#"<body><span class="company-logo"></span><div class="employer-name">Initech</div></body>"#,
        );
        let registry = SelectorRegistry::builtin();
        let mut ctx = context(None);

        run_generic(&document, &registry, &mut ctx);

        assert_eq!(ctx.fields()[&JobField::Company].value, "Initech");
    }

    #[test]
    fn test_tried_entries_recorded_as_checks() {
        let document = Html::parse_document(
            r#"<body><div class="job-view-layout"><h1>Older Layout Title</h1></div></body>"#,
        );
        let registry = SelectorRegistry::builtin();
        let mut ctx = context(Some("linkedin"));

        run_board(&document, &registry, &mut ctx);

        let checks: Vec<(&str, bool)> = ctx
            .trace()
            .selector_checks
            .iter()
            .filter(|c| c.field == JobField::Title)
            .map(|c| (c.entry_id.as_str(), c.matched))
            .collect();
        assert_eq!(checks, vec![("li-title-unified", false), ("li-title-detail", true)]);
        assert!(ctx.trace().selector_checks.iter().all(|c| c.board == "linkedin"));
    }
}
