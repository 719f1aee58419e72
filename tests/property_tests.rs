//! Property-based tests - round trips across generated documents and options
//!
//! Every document the serializer accepts must parse back to an equal value,
//! under any combination of serializer options, and serializing the parsed
//! value again must reproduce the same text.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_sled::{
    from_str, parse, to_string, to_string_with_options, DecimalMark, ExponentPrefix,
    HexSeparator, IntMap, Layout, LineSeparator, QuoteMark, SerializeOptions, StringMap, Value,
};
use std::collections::BTreeMap;

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Nil),
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::Integer),
        any::<f64>().prop_map(Value::Float),
        prop::collection::vec(any::<u8>(), 0..40).prop_map(Value::Bytes),
        any::<String>().prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            prop::collection::vec((any::<String>(), inner.clone()), 0..6)
                .prop_map(|pairs| Value::StringMap(pairs.into_iter().collect())),
            // `{}` always reads back as a string-keyed map
            prop::collection::vec((any::<i64>(), inner), 1..6)
                .prop_map(|pairs| Value::IntMap(pairs.into_iter().collect::<IntMap>())),
        ]
    })
}

fn arb_document() -> impl Strategy<Value = Value> {
    prop::collection::vec((any::<String>(), arb_value()), 0..6)
        .prop_map(|pairs| Value::StringMap(pairs.into_iter().collect::<StringMap>()))
}

prop_compose! {
    fn arb_options()(
        minified in any::<bool>(),
        indent in prop_oneof![Just(" "), Just("  "), Just("\t"), Just(" \t")],
        braces in any::<bool>(),
        line_separator in prop_oneof![
            Just(LineSeparator::Lf),
            Just(LineSeparator::Cr),
            Just(LineSeparator::CrLf),
        ],
        always_quote in any::<bool>(),
        break_on_line_separator in any::<bool>(),
        ascii_only in any::<bool>(),
        single_quote in any::<bool>(),
        hex_upper_case in any::<bool>(),
        hex_separator in prop_oneof![
            Just(HexSeparator::None),
            Just(HexSeparator::Space),
            Just(HexSeparator::Tab),
            Just(HexSeparator::Underscore),
        ],
        hex_bytes_per_separator in -4i32..=4,
        hex_line_length in prop_oneof![Just(0usize), 8usize..40],
        comma in any::<bool>(),
        upper_exponent in any::<bool>(),
        thousands in any::<bool>(),
    ) -> SerializeOptions {
        SerializeOptions {
            layout: if minified { Layout::Minified } else { Layout::Canonical },
            indent: indent.to_string(),
            use_top_level_braces: braces,
            line_separator,
            always_quote,
            break_on_line_separator,
            ascii_only,
            quote_mark: if single_quote { QuoteMark::Single } else { QuoteMark::Double },
            hex_upper_case,
            hex_separator,
            hex_bytes_per_separator,
            hex_line_length,
            decimal_mark: if comma { DecimalMark::Comma } else { DecimalMark::Period },
            exponent_prefix: if upper_exponent { ExponentPrefix::Upper } else { ExponentPrefix::Lower },
            use_thousands_separator: thousands,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Record {
    id: i64,
    score: f64,
    label: String,
    enabled: bool,
    payload: Vec<u8>,
    parent: Option<i32>,
    lookup: BTreeMap<i64, String>,
}

prop_compose! {
    fn arb_record()(
        id in any::<i64>(),
        score in prop::num::f64::NORMAL | prop::num::f64::ZERO | prop::num::f64::INFINITE,
        label in any::<String>(),
        enabled in any::<bool>(),
        payload in prop::collection::vec(any::<u8>(), 0..16),
        parent in proptest::option::of(any::<i32>()),
        lookup in prop::collection::btree_map(any::<i64>(), "[a-z ]{0,8}", 0..4),
    ) -> Record {
        Record { id, score, label, enabled, payload, parent, lookup }
    }
}

proptest! {
    #[test]
    fn prop_document_roundtrip(doc in arb_document(), options in arb_options()) {
        let text = to_string_with_options(&doc, options).unwrap();
        let parsed = parse(&text);
        prop_assert!(parsed.is_ok(), "{:?}\n{}", parsed, text);
        prop_assert_eq!(Value::StringMap(parsed.unwrap()), doc);
    }

    #[test]
    fn prop_serialization_is_idempotent(doc in arb_document(), options in arb_options()) {
        let once = to_string_with_options(&doc, options.clone()).unwrap();
        let reparsed = Value::StringMap(parse(&once).unwrap());
        let twice = to_string_with_options(&reparsed, options).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_record_roundtrip(record in arb_record()) {
        let text = to_string(&record).unwrap();
        let back: Record = from_str(&text).unwrap();
        prop_assert_eq!(back, record);
    }

    #[test]
    fn prop_integer_text(n in any::<i64>()) {
        let doc = parse(&format!("n = {}", n)).unwrap();
        prop_assert_eq!(doc.get("n"), Some(&Value::Integer(n)));
    }

    #[test]
    fn prop_parser_never_panics(text in "[ -~\n\t]{0,64}") {
        let _ = parse(&text);
    }
}
