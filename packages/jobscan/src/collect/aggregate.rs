//! Reconciliation of collections gathered from several contexts.

use tracing::debug;

use crate::types::{AggregatorConfig, RawCollection};

/// The selected context plus flags unioned over every context.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated {
    pub selected: RawCollection,
    /// True when any context reported truncated content.
    pub has_truncated_content: bool,
    /// Number of contexts that returned a collection.
    pub context_count: usize,
}

/// Pick one context out of per-context results.
///
/// Absent results are dropped. The primary context (id 0) wins when its
/// markup is longer than the configured minimum; otherwise the longest
/// markup wins, ties going to the lowest context id. Selection depends only
/// on the values, never on their position in `results`.
pub fn aggregate(results: &[Option<RawCollection>], config: &AggregatorConfig) -> Option<Aggregated> {
    let present: Vec<&RawCollection> = results.iter().flatten().collect();
    let has_truncated_content = present.iter().any(|c| c.has_truncated_content);

    let selected = match present.as_slice() {
        [] => return None,
        [only] => *only,
        many => {
            let primary = many
                .iter()
                .filter(|c| c.context_id == 0)
                .max_by(|a, b| a.markup_len().cmp(&b.markup_len()).then_with(|| b.markup.cmp(&a.markup)))
                .filter(|c| c.markup_len() > config.primary_min_markup_len);
            match primary {
                Some(primary) => *primary,
                None => many.iter().copied().max_by(|a, b| rank(a, b)).unwrap_or(many[0]),
            }
        }
    };

    debug!(
        contexts = present.len(),
        selected = selected.context_id,
        markup_len = selected.markup_len(),
        truncated = has_truncated_content,
        "aggregated contexts"
    );

    Some(Aggregated {
        selected: selected.clone(),
        has_truncated_content,
        context_count: present.len(),
    })
}

// Longer markup first, then lower context id, then markup text so that
// duplicate ids still order deterministically.
fn rank(a: &RawCollection, b: &RawCollection) -> std::cmp::Ordering {
    a.markup_len()
        .cmp(&b.markup_len())
        .then_with(|| b.context_id.cmp(&a.context_id))
        .then_with(|| b.markup.cmp(&a.markup))
}
