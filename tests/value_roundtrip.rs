//! Edit-string round trip properties
//!
//! Every non-entity value rendered as editable text must parse back, with the
//! same project/namespace context, to a value equal to the original. Keys must
//! survive both the literal form and the URL token.

use chrono::{TimeZone, Utc};
use dsquery::value::wire::{value_from_wire, value_to_wire};
use dsquery::value::{
    from_edit_string, to_edit_string, GeoPoint, Key, KeyId, PathElement, PropertyValue,
};
use proptest::prelude::*;

const PROJECT: &str = "demo";

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn key_id_strategy() -> impl Strategy<Value = KeyId> {
    prop_oneof![
        (1i64..i64::MAX).prop_map(KeyId::Id),
        prop::string::string_regex("[a-zA-Z0-9 '\\\\,()]{0,12}")
            .unwrap()
            .prop_map(KeyId::Name),
    ]
}

fn kind_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[A-Z][a-zA-Z0-9_]{0,8}").unwrap(),
        prop::string::string_regex("[a-z]{1,4} [a-z`]{1,4}").unwrap(),
    ]
}

fn key_strategy() -> impl Strategy<Value = Key> {
    (
        prop_oneof![Just(PROJECT.to_string()), Just("other".to_string())],
        prop::option::of(prop::string::string_regex("[a-z]{1,6}").unwrap()),
        prop::collection::vec((kind_strategy(), key_id_strategy()), 1..4),
    )
        .prop_map(|(project, namespace, path)| {
            let path = path
                .into_iter()
                .map(|(kind, id)| PathElement::new(kind, id))
                .collect();
            Key::new(project, namespace, path).unwrap()
        })
}

/// Spans signed years on both sides of 0000-9999
fn timestamp_strategy() -> impl Strategy<Value = PropertyValue> {
    let seconds = prop_oneof![
        0i64..4_000_000_000,
        -8_000_000_000_000i64..8_000_000_000_000,
    ];
    (seconds, 0u32..1_000_000).prop_map(|(secs, micros)| {
        let ts = Utc.timestamp_opt(secs, micros * 1000).unwrap();
        PropertyValue::Timestamp(ts)
    })
}

fn scalar_strategy() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        Just(PropertyValue::Null),
        any::<bool>().prop_map(PropertyValue::Boolean),
        any::<i64>().prop_map(PropertyValue::Integer),
        (-1.0e15f64..1.0e15).prop_map(PropertyValue::Double),
        timestamp_strategy(),
        prop::string::string_regex("[a-zA-Z0-9 '\"\\\\,\\[\\]]{0,20}")
            .unwrap()
            .prop_map(PropertyValue::String),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(PropertyValue::Blob),
        (
            prop::option::of(-90.0f64..90.0),
            prop::option::of(-180.0f64..180.0)
        )
            .prop_map(|(latitude, longitude)| PropertyValue::GeoPoint(GeoPoint {
                latitude,
                longitude
            })),
        key_strategy().prop_map(PropertyValue::Key),
    ]
}

fn value_strategy() -> impl Strategy<Value = PropertyValue> {
    scalar_strategy().prop_recursive(2, 16, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(PropertyValue::Array)
    })
}

// =============================================================================
// EDIT STRING
// =============================================================================

proptest! {
    /// Decoding the edit string of a value restores the value
    #[test]
    fn edit_string_round_trips(
        value in value_strategy(),
        namespace in prop::option::of(prop::string::string_regex("[a-z]{1,6}").unwrap()),
    ) {
        let ns = namespace.as_deref();
        let text = to_edit_string(&value, PROJECT, ns);
        let parsed = from_edit_string(&text, value.value_type(), PROJECT, ns);
        prop_assert_eq!(parsed, Ok(value), "edit text was {:?}", text);
    }

    /// Key literals restore the key in the same context
    #[test]
    fn key_literal_round_trips(key in key_strategy()) {
        let literal = key.to_literal(PROJECT, None);
        prop_assert_eq!(Key::parse_literal(&literal, PROJECT, None), Ok(key));
    }

    /// URL tokens restore the key regardless of context
    #[test]
    fn url_token_round_trips(key in key_strategy()) {
        let token = key.to_url_token();
        prop_assert!(!token.contains('/') && !token.contains('+') && !token.contains('='));
        prop_assert_eq!(Key::from_url_token(&token), Ok(key));
    }

    /// Wire encoding is lossless for every non-entity value
    #[test]
    fn wire_round_trips(value in value_strategy()) {
        prop_assert_eq!(value_from_wire(&value_to_wire(&value)), Ok(value));
    }

    /// Distinct keys never share a canonical string
    #[test]
    fn canonical_strings_are_injective(a in key_strategy(), b in key_strategy()) {
        if a != b {
            prop_assert_ne!(a.canonical_string(PROJECT), b.canonical_string(PROJECT));
        } else {
            prop_assert_eq!(a.canonical_string(PROJECT), b.canonical_string(PROJECT));
        }
    }
}

// =============================================================================
// FIXED CASES
// =============================================================================

/// A string with quotes and backslashes is kept verbatim at the top level
#[test]
fn test_string_is_not_trimmed_or_escaped() {
    let value = PropertyValue::String("  O'Brien\\ ".to_string());
    let text = to_edit_string(&value, PROJECT, None);
    assert_eq!(text, "  O'Brien\\ ");
    assert_eq!(
        from_edit_string(&text, value.value_type(), PROJECT, None),
        Ok(value)
    );
}

/// Array elements carry their own type
#[test]
fn test_mixed_array() {
    let value = PropertyValue::Array(vec![
        PropertyValue::Integer(1),
        PropertyValue::Double(1.0),
        PropertyValue::String("1".to_string()),
        PropertyValue::Null,
    ]);
    let text = to_edit_string(&value, PROJECT, None);
    assert_eq!(text, "[1, 1.0, '1', NULL]");
    assert_eq!(
        from_edit_string(&text, value.value_type(), PROJECT, None),
        Ok(value)
    );
}

/// Keys outside the context project carry PROJECT(...)
#[test]
fn test_key_context() {
    let key = Key::root("other", "Org", "acme").child("Team", 7i64);
    assert_eq!(
        key.to_literal(PROJECT, None),
        "KEY(PROJECT('other'), Org, 'acme', Team, 7)"
    );
    assert_eq!(
        Key::root(PROJECT, "Org", "acme").to_literal(PROJECT, None),
        "KEY(Org, 'acme')"
    );
}

/// Years past 9999 keep their sign through the edit string
#[test]
fn test_timestamp_year_ten_thousand() {
    let value = PropertyValue::Timestamp(Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap());
    let text = to_edit_string(&value, PROJECT, None);
    assert_eq!(text, "+10000-01-01T00:00:00Z");
    assert_eq!(
        from_edit_string(&text, value.value_type(), PROJECT, None),
        Ok(value)
    );
}

/// Entities are not editable
#[test]
fn test_entity_rejected() {
    let text = "{name: 'x'}";
    let result = from_edit_string(text, dsquery::value::ValueType::Entity, PROJECT, None);
    assert!(result.is_err());
}
