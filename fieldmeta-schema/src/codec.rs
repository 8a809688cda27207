//! Slot Codec: raw slot payload ⇄ [`TypedView`].
//!
//! Decoding is total once the column code resolves. Blob JSON goes through a
//! single guarded parse that falls back to the type-correct empty default, and
//! slots the descriptor does not declare are read and written as neutral.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{DecodeWarning, Result, SchemaError};
use crate::filter_table::{FilterRow, FilterTable};
use crate::registry::{ArrayShape, FieldTypeDescriptor, FieldTypeRegistry, JsonShape};
use crate::slot::SlotName;
use crate::types::{
    FieldDefinition, HyperlinkMeta, InventoryMeta, LookupMode, SlotPayload, EMPTY_ARRAY_BLOB,
};
use crate::view::{ArrayBlob, JsonBlob, TypedView};

/// A decoded view plus the problems recovered from along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub view: TypedView,
    pub warnings: Vec<DecodeWarning>,
}

/// Decode a stored definition through the descriptor its column code selects.
pub fn decode(definition: &FieldDefinition, registry: &FieldTypeRegistry) -> Result<Decoded> {
    let column_type = definition
        .column_type
        .ok_or(SchemaError::MissingColumnType)?;
    let descriptor = registry.resolve(column_type)?;
    Ok(decode_with(&definition.slots, descriptor))
}

/// Decode a slot payload through a known descriptor.
pub fn decode_with(payload: &SlotPayload, descriptor: &FieldTypeDescriptor) -> Decoded {
    let mut warnings = Vec::new();
    let scalar = |slot: SlotName, value: &Option<String>| {
        if descriptor.uses(slot) {
            value.clone().unwrap_or_default()
        } else {
            String::new()
        }
    };

    let lookup_mode = match payload.lookup_mode {
        Some(code) if descriptor.uses(SlotName::LookupMode) => {
            let mode = LookupMode::from_code(code);
            if mode.is_none() {
                warn!(code, field_type = descriptor.key, "unknown lookup mode dropped");
                warnings.push(DecodeWarning::UnknownLookupMode { code });
            }
            mode
        }
        _ => None,
    };

    let array_text = Some(payload.meta_type4.as_str());
    let array = match descriptor.array_shape {
        ArrayShape::Unused => ArrayBlob::Unused,
        ArrayShape::FilterRows => {
            let rows: Vec<FilterRow> =
                parse_blob_or_default(SlotName::MetaType4, array_text, &mut warnings);
            ArrayBlob::Rows(FilterTable::from_rows(rows))
        }
        ArrayShape::Values => ArrayBlob::Values(parse_blob_or_default(
            SlotName::MetaType4,
            array_text,
            &mut warnings,
        )),
    };

    let json_text = payload.meta_type_json.as_deref();
    let json = match descriptor.json_shape {
        JsonShape::Unused => JsonBlob::Unused,
        JsonShape::Inventory => JsonBlob::Inventory(parse_blob_or_default::<InventoryMeta>(
            SlotName::MetaTypeJson,
            json_text,
            &mut warnings,
        )),
        JsonShape::Hyperlink => JsonBlob::Hyperlink(parse_blob_or_default::<HyperlinkMeta>(
            SlotName::MetaTypeJson,
            json_text,
            &mut warnings,
        )),
        JsonShape::Object => JsonBlob::Object(parse_blob_or_default::<Map<String, Value>>(
            SlotName::MetaTypeJson,
            json_text,
            &mut warnings,
        )),
    };

    let view = TypedView {
        column_type: descriptor.column_type,
        type_key: descriptor.key,
        meta_type1: scalar(SlotName::MetaType1, &payload.meta_type1),
        meta_type2: scalar(SlotName::MetaType2, &payload.meta_type2),
        meta_type3: scalar(SlotName::MetaType3, &payload.meta_type3),
        meta_type5: scalar(SlotName::MetaType5, &payload.meta_type5),
        lookup_mode,
        bool_meta1: descriptor.uses(SlotName::BoolMeta1) && payload.bool_meta1,
        array,
        json,
    };
    Decoded { view, warnings }
}

/// Encode a view back into slot columns. Slots `descriptor` does not declare
/// are written at their neutral default.
pub fn encode(view: &TypedView, descriptor: &FieldTypeDescriptor) -> Result<SlotPayload> {
    let scalar = |slot: SlotName, value: &str| {
        Some(if descriptor.uses(slot) {
            value.to_string()
        } else {
            String::new()
        })
    };

    let meta_type4 = if descriptor.uses(SlotName::MetaType4) {
        match &view.array {
            ArrayBlob::Unused => EMPTY_ARRAY_BLOB.to_string(),
            ArrayBlob::Rows(table) => serde_json::to_string(table)?,
            ArrayBlob::Values(values) => serde_json::to_string(values)?,
        }
    } else {
        EMPTY_ARRAY_BLOB.to_string()
    };

    let meta_type_json = if descriptor.uses(SlotName::MetaTypeJson) && !view.json.is_empty() {
        match &view.json {
            JsonBlob::Unused => None,
            JsonBlob::Inventory(meta) => Some(serde_json::to_string(meta)?),
            JsonBlob::Hyperlink(meta) => Some(serde_json::to_string(meta)?),
            JsonBlob::Object(map) => Some(serde_json::to_string(map)?),
        }
    } else {
        None
    };

    Ok(SlotPayload {
        meta_type1: scalar(SlotName::MetaType1, &view.meta_type1),
        meta_type2: scalar(SlotName::MetaType2, &view.meta_type2),
        meta_type3: scalar(SlotName::MetaType3, &view.meta_type3),
        meta_type5: scalar(SlotName::MetaType5, &view.meta_type5),
        lookup_mode: view
            .lookup_mode
            .filter(|_| descriptor.uses(SlotName::LookupMode))
            .map(LookupMode::code),
        bool_meta1: descriptor.uses(SlotName::BoolMeta1) && view.bool_meta1,
        meta_type4,
        meta_type_json,
    })
}

/// Parse a blob column, falling back to `T::default()` on absent or invalid
/// JSON. Invalid JSON is logged and recorded as a warning.
pub fn parse_blob_or_default<T>(
    slot: SlotName,
    text: Option<&str>,
    warnings: &mut Vec<DecodeWarning>,
) -> T
where
    T: DeserializeOwned + Default,
{
    let text = match text.map(str::trim) {
        None | Some("") | Some("null") => return T::default(),
        Some(text) => text,
    };
    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(%slot, error = %e, "malformed blob replaced by empty default");
            warnings.push(DecodeWarning::MalformedBlob {
                slot,
                message: e.to_string(),
            });
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InventoryAction;
    use serde_json::json;

    fn definition(value: Value) -> FieldDefinition {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn decode_lookup_definition() {
        let registry = FieldTypeRegistry::builtin();
        let def = definition(json!({
            "ColumnType": 18,
            "metaType1": 7,
            "metaType2": "2",
            "metaType3": 1.0,
            "LookupMode": 2,
            "BoolMeta1": true,
            "metaType4": r#"[{"ID":"r1","SourceFieldRef":2,"Operator":"eq","FilterText":"x","DestFieldRef":"3"}]"#
        }));
        let decoded = decode(&def, &registry).unwrap();
        assert!(decoded.warnings.is_empty());
        let view = decoded.view;
        assert_eq!(view.meta_type1, "7");
        assert_eq!(view.meta_type3, "1");
        assert_eq!(view.lookup_mode, Some(LookupMode::Popup));
        assert!(view.bool_meta1);
        let rows = view.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.get("r1").unwrap().source_field_ref, "2");
    }

    #[test]
    fn malformed_blob_degrades_with_warning() {
        let registry = FieldTypeRegistry::builtin();
        let def = definition(json!({"ColumnType": 18, "metaType4": "[{not json"}));
        let decoded = decode(&def, &registry).unwrap();
        assert!(decoded.view.rows().unwrap().is_empty());
        assert!(matches!(
            decoded.warnings.as_slice(),
            [DecodeWarning::MalformedBlob {
                slot: SlotName::MetaType4,
                ..
            }]
        ));
    }

    #[test]
    fn absent_json_blob_is_silent_default() {
        let registry = FieldTypeRegistry::builtin();
        let def = definition(json!({"ColumnType": 20}));
        let decoded = decode(&def, &registry).unwrap();
        assert!(decoded.warnings.is_empty());
        assert_eq!(decoded.view.json, JsonBlob::Inventory(InventoryMeta::default()));
    }

    #[test]
    fn inventory_blob_decodes() {
        let registry = FieldTypeRegistry::builtin();
        let def = definition(json!({
            "ColumnType": 20,
            "metaTypeJson": r#"{"QuantityFieldRef": 4, "Action": 2}"#
        }));
        let view = decode(&def, &registry).unwrap().view;
        match view.json {
            JsonBlob::Inventory(meta) => {
                assert_eq!(meta.quantity_field_ref, "4");
                assert_eq!(meta.action, InventoryAction::Decrease);
            }
            other => panic!("expected inventory blob, got {other:?}"),
        }
    }

    #[test]
    fn undeclared_slots_decode_neutral() {
        let registry = FieldTypeRegistry::builtin();
        let def = definition(json!({
            "ColumnType": 11,
            "metaType1": "leaked",
            "LookupMode": 1,
            "BoolMeta1": true,
            "metaType4": r#"[{"ID":"x"}]"#,
            "metaTypeJson": r#"{"a":1}"#
        }));
        let view = decode(&def, &registry).unwrap().view;
        assert_eq!(view.meta_type1, "");
        assert_eq!(view.lookup_mode, None);
        assert!(view.bool_meta1);
        assert_eq!(view.array, ArrayBlob::Unused);
        assert_eq!(view.json, JsonBlob::Unused);
    }

    #[test]
    fn unknown_lookup_mode_warns() {
        let registry = FieldTypeRegistry::builtin();
        let def = definition(json!({"ColumnType": 18, "LookupMode": 42}));
        let decoded = decode(&def, &registry).unwrap();
        assert_eq!(decoded.view.lookup_mode, None);
        assert_eq!(
            decoded.warnings,
            vec![DecodeWarning::UnknownLookupMode { code: 42 }]
        );
    }

    #[test]
    fn unknown_and_missing_codes_fail() {
        let registry = FieldTypeRegistry::builtin();
        let err = decode(&definition(json!({"ColumnType": 999})), &registry).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownFieldType { column_type: 999 }));
        let err = decode(&definition(json!({"DisplayName": "x"})), &registry).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumnType));
    }

    #[test]
    fn neutral_view_encodes_neutral_payload() {
        let registry = FieldTypeRegistry::builtin();
        for descriptor in registry.all() {
            let payload = encode(&TypedView::neutral(descriptor), descriptor).unwrap();
            assert_eq!(payload, SlotPayload::neutral(), "{}", descriptor.key);
        }
    }

    #[test]
    fn encode_drops_values_of_undeclared_slots() {
        let registry = FieldTypeRegistry::builtin();
        let checkbox = registry.by_key("checkbox").unwrap();
        let mut view = TypedView::neutral(checkbox);
        view.meta_type2 = "stale".into();
        view.lookup_mode = Some(LookupMode::DropDown);
        let payload = encode(&view, checkbox).unwrap();
        assert_eq!(payload.meta_type2.as_deref(), Some(""));
        assert_eq!(payload.lookup_mode, None);
    }

    #[test]
    fn round_trip_preserves_rows_and_values() {
        let registry = FieldTypeRegistry::builtin();
        let dropdown = registry.by_key("dropdown").unwrap();
        let mut view = TypedView::neutral(dropdown);
        view.array = ArrayBlob::Values(vec![json!({"label": "A", "value": 1})]);
        view.lookup_mode = Some(LookupMode::AutoComplete);
        let payload = encode(&view, dropdown).unwrap();
        assert_eq!(payload.lookup_mode, Some(3));
        assert_eq!(decode_with(&payload, dropdown).view, view);
    }
}
