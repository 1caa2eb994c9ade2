//! Signal confidence and weighted type voting.
//!
//! The strongest matched signal sets the base score. Every further matched
//! signal adds a bonus that halves with rank:
//!
//! ```text
//! confidence = w0 + Σ w_i · 0.1 · 0.5^(i-1)    (capped at 0.99)
//! ```
//!
//! so a pile of weak signals never reaches near-certainty on its own.

use std::collections::BTreeMap;

use crate::types::{FieldType, SignalEvaluation, SignalKind};

/// Upper bound of any combined confidence.
pub const MAX_CONFIDENCE: f64 = 0.99;

// Vote totals closer than this are treated as tied.
const VOTE_EPSILON: f64 = 1e-9;

/// Combine weights with diminishing returns. `weights` need not be sorted.
pub fn diminishing_score(weights: &[f64]) -> f64 {
    let mut sorted = weights.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let Some((&top, rest)) = sorted.split_first() else {
        return 0.0;
    };
    let bonus: f64 = rest
        .iter()
        .enumerate()
        .map(|(i, w)| w * 0.1 * 0.5_f64.powi(i as i32))
        .sum();
    (top + bonus).min(MAX_CONFIDENCE)
}

/// Confidence of a signal set; unmatched evaluations are ignored.
pub fn signal_confidence(signals: &[SignalEvaluation]) -> f64 {
    let weights: Vec<f64> = signals.iter().filter(|s| s.matched).map(|s| s.weight).collect();
    diminishing_score(&weights)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeResolution {
    pub field_type: FieldType,
    pub confidence: f64,
}

impl TypeResolution {
    pub fn unknown() -> Self {
        Self {
            field_type: FieldType::Unknown,
            confidence: 0.0,
        }
    }
}

#[derive(Default)]
struct Tally {
    total: f64,
    strongest: f64,
    earliest: Option<SignalKind>,
    weights: Vec<f64>,
}

/// Resolve a field type by weighted voting over matched signals.
///
/// Each matched signal adds its weight to the total of the type it suggests
/// and the highest total wins. Equal totals go to the type backed by the
/// single strongest signal, then to the type whose first supporting signal
/// comes earliest in evaluation order. Confidence is computed over the
/// winning type's signals only.
pub fn resolve_field_type(signals: &[SignalEvaluation]) -> TypeResolution {
    let matched: Vec<&SignalEvaluation> = signals.iter().filter(|s| s.matched).collect();
    match matched.as_slice() {
        [] => return TypeResolution::unknown(),
        [only] => {
            return TypeResolution {
                field_type: only.suggested_type,
                confidence: only.weight,
            }
        }
        _ => {}
    }

    let mut tallies: BTreeMap<FieldType, Tally> = BTreeMap::new();
    for signal in matched {
        let tally = tallies.entry(signal.suggested_type).or_default();
        tally.total += signal.weight;
        tally.strongest = tally.strongest.max(signal.weight);
        tally.earliest = Some(match tally.earliest {
            Some(existing) => existing.min(signal.signal),
            None => signal.signal,
        });
        tally.weights.push(signal.weight);
    }

    let winner = tallies.iter().reduce(|best, candidate| {
        if beats(candidate.1, best.1) {
            candidate
        } else {
            best
        }
    });

    match winner {
        Some((field_type, tally)) => TypeResolution {
            field_type: *field_type,
            confidence: diminishing_score(&tally.weights),
        },
        None => TypeResolution::unknown(),
    }
}

fn beats(candidate: &Tally, best: &Tally) -> bool {
    if (candidate.total - best.total).abs() > VOTE_EPSILON {
        return candidate.total > best.total;
    }
    if (candidate.strongest - best.strongest).abs() > VOTE_EPSILON {
        return candidate.strongest > best.strongest;
    }
    candidate.earliest < best.earliest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(signal: SignalKind, suggested: FieldType) -> SignalEvaluation {
        SignalEvaluation::matched(signal, "", suggested, String::new())
    }

    #[test]
    fn test_no_signals_is_zero() {
        assert_eq!(signal_confidence(&[]), 0.0);
        let miss = SignalEvaluation::unmatched(SignalKind::Placeholder, "Notes", FieldType::CustomQuestion, String::new());
        assert_eq!(signal_confidence(&[miss.clone()]), 0.0);
        assert_eq!(resolve_field_type(&[miss]), TypeResolution::unknown());
    }

    #[test]
    fn test_single_signal_adopts_weight() {
        let resolution = resolve_field_type(&[hit(SignalKind::Placeholder, FieldType::Phone)]);
        assert_eq!(resolution.field_type, FieldType::Phone);
        assert_eq!(resolution.confidence, 0.65);
    }

    #[test]
    fn test_diminishing_bonus() {
        let score = diminishing_score(&[0.75, 0.85, 0.65]);
        // 0.85 + 0.75*0.1 + 0.65*0.05
        assert!((score - 0.9575).abs() < 1e-9);
        assert_eq!(diminishing_score(&[0.95, 0.95, 0.95, 0.95]), MAX_CONFIDENCE);
    }

    #[test]
    fn test_corroborating_signals_outvote_single_strong_signal() {
        let signals = vec![
            hit(SignalKind::Autocomplete, FieldType::FirstName),
            hit(SignalKind::NameIdRegex, FieldType::FullName),
            hit(SignalKind::LabelFor, FieldType::FullName),
            hit(SignalKind::Placeholder, FieldType::FullName),
        ];
        let resolution = resolve_field_type(&signals);
        assert_eq!(resolution.field_type, FieldType::FullName);
        assert!((resolution.confidence - 0.9575).abs() < 1e-9);
    }

    #[test]
    fn test_tie_goes_to_strongest_single_signal() {
        // 0.85 + 0.40 == 0.75 + 0.50
        let signals = vec![
            hit(SignalKind::LabelFor, FieldType::City),
            hit(SignalKind::SiblingText, FieldType::City),
            hit(SignalKind::NameIdRegex, FieldType::State),
            hit(SignalKind::HeadingContext, FieldType::State),
        ];
        assert_eq!(resolve_field_type(&signals).field_type, FieldType::State);
    }

    #[test]
    fn test_full_tie_goes_to_earliest_evaluator() {
        let signals = vec![
            hit(SignalKind::AriaLabel, FieldType::Email),
            hit(SignalKind::LabelFor, FieldType::Phone),
        ];
        assert_eq!(resolve_field_type(&signals).field_type, FieldType::Phone);
    }
}
