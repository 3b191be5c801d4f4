//! Property tests for the normalizer.

use formwire_normalize::{normalize, CollectingSink, Mapping, OpaqueValue};
use proptest::prelude::*;
use serde_json::Value;

fn scalar() -> impl Strategy<Value = OpaqueValue> {
    prop_oneof![
        Just(OpaqueValue::Null),
        any::<bool>().prop_map(OpaqueValue::from),
        any::<i64>().prop_map(OpaqueValue::from),
        (-1.0e9f64..1.0e9).prop_map(OpaqueValue::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(OpaqueValue::from),
    ]
}

fn opaque() -> impl Strategy<Value = OpaqueValue> {
    scalar().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(OpaqueValue::Sequence),
            prop::collection::vec(("[a-z]{1,6}", inner.clone()), 0..6)
                .prop_map(|entries| OpaqueValue::Mapping(entries.into_iter().collect())),
            inner
                .clone()
                .prop_map(|v| OpaqueValue::invocable(move || v.clone())),
            "[a-z]{0,8}".prop_map(|s| OpaqueValue::lazy_text(move || Ok(s.clone()))),
        ]
    })
}

fn run(value: &OpaqueValue) -> Value {
    normalize(value, &CollectingSink::new()).expect("generated values always normalize")
}

// ── Scalars ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn strings_are_unchanged(s in ".{0,32}") {
        prop_assert_eq!(run(&OpaqueValue::from(s.clone())), Value::String(s));
    }

    #[test]
    fn integers_are_unchanged(n in any::<i64>()) {
        prop_assert_eq!(run(&OpaqueValue::from(n)), serde_json::json!(n));
    }

    #[test]
    fn booleans_are_unchanged(b in any::<bool>()) {
        prop_assert_eq!(run(&OpaqueValue::from(b)), Value::Bool(b));
    }
}

// ── Containers ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn mapping_preserves_keys_order_and_values(
        entries in prop::collection::vec(("[a-z]{1,6}", opaque()), 0..8)
    ) {
        let map: Mapping = entries.into_iter().collect();
        let out = run(&OpaqueValue::Mapping(map.clone()));
        let obj = out.as_object().expect("mapping normalizes to an object");

        let expected_keys: Vec<&str> = map.keys().collect();
        let actual_keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        prop_assert_eq!(actual_keys, expected_keys);

        for (key, value) in map.iter() {
            prop_assert_eq!(&obj[key], &run(value));
        }
    }

    #[test]
    fn sequence_preserves_length_and_order(items in prop::collection::vec(opaque(), 0..8)) {
        let out = run(&OpaqueValue::Sequence(items.clone()));
        let arr = out.as_array().expect("sequence normalizes to an array");
        prop_assert_eq!(arr.len(), items.len());
        for (normalized, item) in arr.iter().zip(&items) {
            prop_assert_eq!(normalized, &run(item));
        }
    }

    #[test]
    fn normalization_is_idempotent(value in opaque()) {
        let once = run(&value);
        let twice = run(&OpaqueValue::from(once.clone()));
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn invocable_equals_its_result(value in opaque()) {
        let expected = run(&value);
        let thunk = OpaqueValue::invocable(move || value.clone());
        prop_assert_eq!(run(&thunk), expected);
    }
}
