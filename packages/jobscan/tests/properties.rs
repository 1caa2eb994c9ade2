//! Property tests for scoring, aggregation and fill reversibility.

use proptest::prelude::*;

use jobscan::collect::aggregate;
use jobscan::scoring::{diminishing_score, resolve_field_type, signal_confidence};
use jobscan::types::{FieldType, SignalEvaluation, SignalKind};
use jobscan::{AggregatorConfig, Dom, FillExecutor, FillInstruction, InputKind, RawCollection};

const KINDS: [SignalKind; 12] = [
    SignalKind::Autocomplete,
    SignalKind::NameIdRegex,
    SignalKind::InputType,
    SignalKind::LabelFor,
    SignalKind::AriaLabel,
    SignalKind::Placeholder,
    SignalKind::ParentLabel,
    SignalKind::SiblingText,
    SignalKind::CssDataAttr,
    SignalKind::HeadingContext,
    SignalKind::SectionContext,
    SignalKind::BoardSelector,
];

const TYPES: [FieldType; 4] = [FieldType::Email, FieldType::FullName, FieldType::Phone, FieldType::City];

fn signal() -> impl Strategy<Value = SignalEvaluation> {
    (0..KINDS.len(), 0..TYPES.len(), any::<bool>()).prop_map(|(k, t, matched)| {
        if matched {
            SignalEvaluation::matched(KINDS[k], "v", TYPES[t], String::new())
        } else {
            SignalEvaluation::unmatched(KINDS[k], "v", TYPES[t], String::new())
        }
    })
}

fn context() -> impl Strategy<Value = Option<RawCollection>> {
    (0u32..4, 0usize..1500, any::<bool>(), any::<bool>()).prop_map(|(id, len, truncated, present)| {
        present.then(|| {
            let mut c = RawCollection::new("x".repeat(len), format!("https://a.test/{id}"), id);
            c.has_truncated_content = truncated;
            c
        })
    })
}

proptest! {
    #[test]
    fn confidence_is_zero_iff_nothing_matched(signals in prop::collection::vec(signal(), 0..12)) {
        let any_matched = signals.iter().any(|s| s.matched);
        let confidence = signal_confidence(&signals);
        prop_assert_eq!(confidence == 0.0, !any_matched);
        prop_assert!(confidence <= 0.99);
    }

    #[test]
    fn corroboration_never_lowers_confidence(
        weights in prop::collection::vec(0.3f64..0.95, 0..10),
        extra in 0.3f64..0.95,
    ) {
        let before = diminishing_score(&weights);
        let mut more = weights.clone();
        more.push(extra);
        let after = diminishing_score(&more);
        prop_assert!(after >= before);
        prop_assert!(after <= 0.99);
    }

    #[test]
    fn single_signal_resolves_exactly(k in 0..KINDS.len(), t in 0..TYPES.len()) {
        let only = SignalEvaluation::matched(KINDS[k], "v", TYPES[t], String::new());
        let resolution = resolve_field_type(&[only]);
        prop_assert_eq!(resolution.field_type, TYPES[t]);
        prop_assert_eq!(resolution.confidence, KINDS[k].weight());
    }

    #[test]
    fn resolution_ignores_signal_order(signals in prop::collection::vec(signal(), 0..8).prop_shuffle()) {
        let mut reversed = signals.clone();
        reversed.reverse();
        let a = resolve_field_type(&signals);
        let b = resolve_field_type(&reversed);
        prop_assert_eq!(a.field_type, b.field_type);
        prop_assert!((a.confidence - b.confidence).abs() < 1e-12);
    }

    #[test]
    fn aggregation_is_order_independent(
        (original, shuffled) in prop::collection::vec(context(), 0..6)
            .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let config = AggregatorConfig::default();
        let a = aggregate(&original, &config);
        let b = aggregate(&shuffled, &config);
        prop_assert_eq!(
            a.as_ref().map(|x| x.selected.clone()),
            b.as_ref().map(|x| x.selected.clone())
        );
        prop_assert_eq!(a.map(|x| x.context_count), b.map(|x| x.context_count));
    }

    #[test]
    fn truncation_is_or_over_contexts(contexts in prop::collection::vec(context(), 1..6)) {
        let expected = contexts.iter().flatten().any(|c| c.has_truncated_content);
        match aggregate(&contexts, &AggregatorConfig::default()) {
            Some(aggregated) => prop_assert_eq!(aggregated.has_truncated_content, expected),
            None => prop_assert!(contexts.iter().all(Option::is_none)),
        }
    }

    #[test]
    fn undo_restores_pre_fill_document(
        initial in "[a-z ]{0,12}",
        value in "[a-z]{1,12}",
        checked in any::<bool>(),
        want in any::<bool>(),
        option in 0usize..3,
        prechecked in 0usize..3,
        pick in 1usize..4,
    ) {
        let checked_attr = if checked { " checked" } else { "" };
        let radios: String = (1..=3)
            .map(|n| {
                let on = if n == prechecked + 1 { " checked" } else { "" };
                format!(r#"<input type="radio" name="shift" id="r{n}" value="{n}"{on}>"#)
            })
            .collect();
        let markup = format!(
            r#"<form><input id="t" value="{initial}"><input type="checkbox" id="c"{checked_attr}>
               <select id="s"><option value="a">A</option><option value="b">B</option><option value="c">C</option></select>
               {radios}</form>"#
        );
        let mut dom = Dom::parse(&markup, "");
        let before = dom.to_html();
        let options = ["a", "b", "c"];
        let batch = vec![
            FillInstruction { selector: "#t".into(), stable_id: "t".into(), value, input_kind: InputKind::Text },
            FillInstruction { selector: "#c".into(), stable_id: "c".into(), value: want.to_string(), input_kind: InputKind::Checkbox },
            FillInstruction { selector: "#s".into(), stable_id: "s".into(), value: options[option].into(), input_kind: InputKind::Select },
            FillInstruction { selector: "#r1".into(), stable_id: "r".into(), value: pick.to_string(), input_kind: InputKind::Radio },
            FillInstruction { selector: "#missing".into(), stable_id: "m".into(), value: "x".into(), input_kind: InputKind::Text },
        ];

        let executor = FillExecutor::default();
        let filled = executor.fill(&mut dom, &batch);
        prop_assert_eq!(filled.results.len(), 5);
        let undone = executor.undo(&mut dom, &filled.undo_entries);

        prop_assert_eq!(undone.failed, 0);
        prop_assert_eq!(dom.to_html(), before);
        let t = dom.query_selector_deep("#t").unwrap().unwrap();
        let c = dom.query_selector_deep("#c").unwrap().unwrap();
        let s = dom.query_selector_deep("#s").unwrap().unwrap();
        prop_assert_eq!(dom.value(t), initial);
        prop_assert_eq!(dom.checked(c), checked);
        prop_assert_eq!(dom.value(s), "a");
        for n in 1..=3usize {
            let radio = dom.query_selector_deep(&format!("#r{n}")).unwrap().unwrap();
            prop_assert_eq!(dom.checked(radio), n == prechecked + 1);
        }
    }
}
