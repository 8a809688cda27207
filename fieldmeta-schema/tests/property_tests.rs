//! Property-based tests for the slot codec and reference normalization.

use fieldmeta_schema::{
    decode, decode_with, encode, normalize_value, FieldDefinition, FieldTypeRegistry, FilterRow,
    FilterTable, RefItem, RowColumn, SlotPayload,
};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Scalar slot values as the persistence API might return them.
fn loose_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        "[a-z0-9]{0,6}".prop_map(Value::from),
        (0i64..50).prop_map(Value::from),
        (0i64..50).prop_map(|n| json!(n as f64)),
        any::<bool>().prop_map(Value::from),
    ]
}

fn row_strategy() -> impl Strategy<Value = Value> {
    (
        prop::option::of("[a-z]{1,3}"),
        "[0-9]{0,2}",
        "[a-z]{0,3}",
        "[0-9]{0,2}",
    )
        .prop_map(|(id, source, text, dest)| {
            let mut row = json!({
                "SourceFieldRef": source,
                "Operator": "eq",
                "FilterText": text,
                "DestFieldRef": dest,
            });
            if let Some(id) = id {
                row["ID"] = json!(id);
            }
            row
        })
}

/// `metaType4` text: valid row arrays, value arrays, empty, or garbage.
fn array_blob() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(json!("[]")),
        Just(json!("[{broken")),
        prop::collection::vec(row_strategy(), 0..4)
            .prop_map(|rows| Value::String(Value::Array(rows).to_string())),
        prop::collection::vec(0i64..9, 0..4)
            .prop_map(|values| Value::String(json!(values).to_string())),
    ]
}

/// `metaTypeJson` text for any of the object shapes.
fn object_blob() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        Just(json!("{}")),
        Just(json!("not json")),
        ("[0-9]{0,2}", 0u8..4).prop_map(|(qty, action)| {
            Value::String(json!({"QuantityFieldRef": qty, "Action": action}).to_string())
        }),
        "[a-z]{0,5}".prop_map(|t| Value::String(json!({"Target": t, "Label": "x"}).to_string())),
        "[a-z]{1,5}".prop_map(|k| Value::String(format!(r#"{{"{k}":1}}"#))),
    ]
}

fn definition_strategy() -> impl Strategy<Value = FieldDefinition> {
    let codes: Vec<i32> = FieldTypeRegistry::builtin()
        .all()
        .iter()
        .map(|d| d.column_type)
        .collect();
    (
        prop::sample::select(codes),
        prop::collection::vec(loose_scalar(), 4),
        prop::option::of(0i32..5),
        any::<bool>(),
        array_blob(),
        object_blob(),
    )
        .prop_map(|(code, scalars, mode, flag, array, object)| {
            serde_json::from_value(json!({
                "ColumnType": code,
                "metaType1": scalars[0],
                "metaType2": scalars[1],
                "metaType3": scalars[2],
                "metaType5": scalars[3],
                "LookupMode": mode,
                "BoolMeta1": flag,
                "metaType4": array,
                "metaTypeJson": object,
            }))
            .unwrap()
        })
}

fn list_strategy() -> impl Strategy<Value = Vec<RefItem>> {
    prop::collection::btree_set(0u8..10, 0..4).prop_map(|ids| {
        ids.into_iter()
            .map(|id| RefItem::new(id.to_string(), format!("Field {id}")))
            .collect()
    })
}

proptest! {
    #[test]
    fn decode_encode_decode_is_stable(def in definition_strategy()) {
        let registry = FieldTypeRegistry::builtin();
        let first = decode(&def, &registry).unwrap();
        let descriptor = registry.resolve(first.view.column_type).unwrap();
        let payload = encode(&first.view, descriptor).unwrap();
        let second = decode_with(&payload, descriptor);

        prop_assert_eq!(&second.view, &first.view);
        let no_malformed_blob = second
            .warnings
            .iter()
            .all(|w| !matches!(w, fieldmeta_schema::DecodeWarning::MalformedBlob { .. }));
        prop_assert!(no_malformed_blob);
    }

    #[test]
    fn encoded_payload_is_a_fixed_point(def in definition_strategy()) {
        let registry = FieldTypeRegistry::builtin();
        let descriptor = registry.resolve(def.column_type.unwrap()).unwrap();
        let once = encode(&decode_with(&def.slots, descriptor).view, descriptor).unwrap();
        let twice = encode(&decode_with(&once, descriptor).view, descriptor).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn undeclared_slots_encode_neutral(def in definition_strategy()) {
        let registry = FieldTypeRegistry::builtin();
        let descriptor = registry.resolve(def.column_type.unwrap()).unwrap();
        let payload = encode(&decode_with(&def.slots, descriptor).view, descriptor).unwrap();
        let neutral = SlotPayload::neutral();
        if !descriptor.uses(fieldmeta_schema::SlotName::MetaType4) {
            prop_assert_eq!(&payload.meta_type4, &neutral.meta_type4);
        }
        if !descriptor.uses(fieldmeta_schema::SlotName::MetaTypeJson) {
            prop_assert_eq!(&payload.meta_type_json, &neutral.meta_type_json);
        }
        if !descriptor.uses(fieldmeta_schema::SlotName::LookupMode) {
            prop_assert_eq!(payload.lookup_mode, None);
        }
    }

    #[test]
    fn normalize_value_is_idempotent(current in "[0-9]{0,2}", list in list_strategy()) {
        let once = normalize_value(&current, &list).unwrap_or(current);
        prop_assert_eq!(normalize_value(&once, &list), None);
        prop_assert!(once.is_empty() || list.iter().any(|item| item.id == once));
    }

    #[test]
    fn row_normalization_converges(
        rows in prop::collection::vec(("[0-9]{0,1}", "[0-9]{0,1}"), 0..6),
        lists in prop::collection::vec(list_strategy(), 1..5),
        destination in list_strategy(),
    ) {
        let mut table = FilterTable::from_rows(
            rows.into_iter()
                .map(|(source, dest)| FilterRow {
                    source_field_ref: source,
                    dest_field_ref: dest,
                    ..Default::default()
                })
                .collect(),
        );
        table.normalize_against(RowColumn::Destination, &destination);

        // Any sequence of source-list changes leaves only valid references.
        for list in &lists {
            table.normalize_against(RowColumn::Source, list);
            prop_assert!(!table.normalize_against(RowColumn::Source, list));
            prop_assert!(table.is_consistent(RowColumn::Source, list));
            prop_assert!(table.is_consistent(RowColumn::Destination, &destination));
        }
    }
}
