//! Round-trip tests for the metadata wire encoding.
//!
//! Structured metadata (lists and maps) is stringified before transmission
//! and must decode back to an equal value.

use lodestone_core::models::Metadata;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn scalar_metadata() -> impl Strategy<Value = Metadata> {
    prop_oneof![
        any::<bool>().prop_map(Metadata::Bool),
        any::<i64>().prop_map(Metadata::Int),
        prop::num::f64::NORMAL.prop_map(Metadata::Float),
        "[a-zA-Z0-9 _.-]{0,16}".prop_map(Metadata::Str),
    ]
}

fn any_metadata() -> impl Strategy<Value = Metadata> {
    scalar_metadata().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Metadata::List),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..4).prop_map(Metadata::Map),
        ]
    })
}

/// Top-level mappings or sequences, possibly nested.
fn structured_metadata() -> impl Strategy<Value = Metadata> {
    prop_oneof![
        prop::collection::vec(any_metadata(), 0..5).prop_map(Metadata::List),
        prop::collection::btree_map("[a-z]{1,8}", any_metadata(), 0..5).prop_map(Metadata::Map),
    ]
}

proptest! {
    #[test]
    fn structured_metadata_round_trips(meta in structured_metadata()) {
        prop_assert!(meta.is_structured());

        let wire = meta.to_wire().unwrap();
        // Structured values travel as a JSON string
        prop_assert!(wire.is_string());

        let back = Metadata::from_wire(&wire).unwrap();
        prop_assert_eq!(back, meta);
    }

    #[test]
    fn scalar_metadata_is_not_stringified(meta in scalar_metadata()) {
        let wire = meta.to_wire().unwrap();
        match meta {
            Metadata::Str(_) => prop_assert!(wire.is_string()),
            Metadata::Bool(_) => prop_assert!(wire.is_boolean()),
            Metadata::Int(_) | Metadata::Float(_) => prop_assert!(wire.is_number()),
            _ => unreachable!(),
        }
    }
}

#[test]
fn nested_structure_round_trips() {
    let mut inner = BTreeMap::new();
    inner.insert("source".to_string(), Metadata::from("upload"));
    inner.insert("page".to_string(), Metadata::Int(12));

    let meta = Metadata::List(vec![
        Metadata::Map(inner),
        Metadata::from(vec![1i64, 2, 3]),
        Metadata::Bool(false),
    ]);

    let wire = meta.to_wire().unwrap();
    assert_eq!(Metadata::from_wire(&wire).unwrap(), meta);
}
