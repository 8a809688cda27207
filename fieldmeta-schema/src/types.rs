//! Persisted field definition shape and the small typed values carried in it.
//!
//! Wire names (`ID`, `DisplayName`, `metaType1`, ...) are fixed and
//! case-sensitive; they must match previously stored definitions exactly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::slot::{
    canonical, de_blob_text, de_canonical, de_flag, de_optional_canonical, de_optional_code,
};

/// Text of an empty array blob.
pub const EMPTY_ARRAY_BLOB: &str = "[]";

/// A stored field definition as exchanged with the persistence API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(
        rename = "ID",
        default,
        deserialize_with = "de_optional_canonical",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(rename = "DisplayName", default, deserialize_with = "de_canonical")]
    pub display_name: String,
    #[serde(rename = "ColumnType", default, deserialize_with = "de_optional_code")]
    pub column_type: Option<i32>,
    #[serde(rename = "EntityTypeID", default, deserialize_with = "de_canonical")]
    pub entity_type_id: String,
    #[serde(flatten)]
    pub slots: SlotPayload,
}

/// The generic slot columns of a definition: what the codec reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotPayload {
    #[serde(rename = "metaType1", default, deserialize_with = "de_optional_canonical")]
    pub meta_type1: Option<String>,
    #[serde(rename = "metaType2", default, deserialize_with = "de_optional_canonical")]
    pub meta_type2: Option<String>,
    #[serde(rename = "metaType3", default, deserialize_with = "de_optional_canonical")]
    pub meta_type3: Option<String>,
    #[serde(rename = "metaType5", default, deserialize_with = "de_optional_canonical")]
    pub meta_type5: Option<String>,
    #[serde(rename = "LookupMode", default, deserialize_with = "de_optional_code")]
    pub lookup_mode: Option<i32>,
    #[serde(rename = "BoolMeta1", default, deserialize_with = "de_flag")]
    pub bool_meta1: bool,
    #[serde(
        rename = "metaType4",
        default = "empty_array_blob",
        deserialize_with = "de_array_blob"
    )]
    pub meta_type4: String,
    #[serde(rename = "metaTypeJson", default, deserialize_with = "de_blob_text")]
    pub meta_type_json: Option<String>,
}

impl SlotPayload {
    /// Type-neutral defaults: `""`, `null`, `false`, `"[]"`, `null`.
    pub fn neutral() -> Self {
        Self {
            meta_type1: Some(String::new()),
            meta_type2: Some(String::new()),
            meta_type3: Some(String::new()),
            meta_type5: Some(String::new()),
            lookup_mode: None,
            bool_meta1: false,
            meta_type4: empty_array_blob(),
            meta_type_json: None,
        }
    }
}

impl Default for SlotPayload {
    fn default() -> Self {
        Self::neutral()
    }
}

fn empty_array_blob() -> String {
    EMPTY_ARRAY_BLOB.to_string()
}

fn de_array_blob<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_blob_text(deserializer)?.unwrap_or_else(empty_array_blob))
}

/// How a lookup-family editor presents its options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupMode {
    DropDown,
    Popup,
    AutoComplete,
}

impl LookupMode {
    pub const ALL: [LookupMode; 3] = [
        LookupMode::DropDown,
        LookupMode::Popup,
        LookupMode::AutoComplete,
    ];

    /// Persisted integer code.
    pub const fn code(self) -> i32 {
        match self {
            LookupMode::DropDown => 1,
            LookupMode::Popup => 2,
            LookupMode::AutoComplete => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.code() == code)
    }
}

/// Tri-state stock action of an inventory field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InventoryAction {
    #[default]
    None,
    Increase,
    Decrease,
}

impl InventoryAction {
    pub const fn code(self) -> u8 {
        match self {
            InventoryAction::None => 0,
            InventoryAction::Increase => 1,
            InventoryAction::Decrease => 2,
        }
    }

    /// Unknown codes fall back to `None`.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => InventoryAction::Increase,
            "2" => InventoryAction::Decrease,
            _ => InventoryAction::None,
        }
    }
}

impl Serialize for InventoryAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for InventoryAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .map(|v| InventoryAction::from_code(&canonical(&v)))
            .unwrap_or_default())
    }
}

/// `metaTypeJson` schema of inventory fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryMeta {
    #[serde(rename = "QuantityFieldRef", default, deserialize_with = "de_canonical")]
    pub quantity_field_ref: String,
    #[serde(rename = "PriceFieldRef", default, deserialize_with = "de_canonical")]
    pub price_field_ref: String,
    #[serde(rename = "Action", default)]
    pub action: InventoryAction,
}

impl InventoryMeta {
    pub const QUANTITY_FIELD_REF: &'static str = "QuantityFieldRef";
    pub const PRICE_FIELD_REF: &'static str = "PriceFieldRef";
}

/// `metaTypeJson` schema of hyperlink fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperlinkMeta {
    #[serde(rename = "Target", default, deserialize_with = "de_canonical")]
    pub target: String,
    #[serde(rename = "Label", default, deserialize_with = "de_canonical")]
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn definition_reads_wire_names() {
        let def: FieldDefinition = serde_json::from_value(json!({
            "ID": 12,
            "DisplayName": "Customer",
            "ColumnType": 18,
            "EntityTypeID": "4",
            "metaType1": 7,
            "metaType2": "2",
            "metaType3": null,
            "LookupMode": "2",
            "BoolMeta1": 1,
            "metaType4": "[]",
            "metaTypeJson": null
        }))
        .unwrap();

        assert_eq!(def.id.as_deref(), Some("12"));
        assert_eq!(def.column_type, Some(18));
        assert_eq!(def.entity_type_id, "4");
        assert_eq!(def.slots.meta_type1.as_deref(), Some("7"));
        assert_eq!(def.slots.meta_type3, None);
        assert_eq!(def.slots.meta_type5, None);
        assert_eq!(def.slots.lookup_mode, Some(2));
        assert!(def.slots.bool_meta1);
        assert_eq!(def.slots.meta_type_json, None);
    }

    #[test]
    fn missing_blob_defaults_to_empty_array() {
        let def: FieldDefinition =
            serde_json::from_value(json!({"DisplayName": "x", "ColumnType": 1})).unwrap();
        assert_eq!(def.slots.meta_type4, "[]");
        assert!(!def.slots.bool_meta1);

        let def: FieldDefinition =
            serde_json::from_value(json!({"ColumnType": 1, "metaType4": null})).unwrap();
        assert_eq!(def.slots.meta_type4, "[]");
    }

    #[test]
    fn inflated_blobs_are_reserialized() {
        let def: FieldDefinition = serde_json::from_value(json!({
            "ColumnType": 20,
            "metaType4": [{"ID": "a"}],
            "metaTypeJson": {"Action": 1}
        }))
        .unwrap();
        assert_eq!(def.slots.meta_type4, r#"[{"ID":"a"}]"#);
        assert_eq!(def.slots.meta_type_json.as_deref(), Some(r#"{"Action":1}"#));
    }

    #[test]
    fn definition_writes_wire_names() {
        let def = FieldDefinition {
            id: None,
            display_name: "Qty".into(),
            column_type: Some(4),
            entity_type_id: "3".into(),
            slots: SlotPayload::neutral(),
        };
        let value = serde_json::to_value(&def).unwrap();
        assert!(value.get("ID").is_none());
        assert_eq!(value["ColumnType"], json!(4));
        assert_eq!(value["metaType1"], json!(""));
        assert_eq!(value["metaType4"], json!("[]"));
        assert_eq!(value["LookupMode"], json!(null));
        assert_eq!(value["BoolMeta1"], json!(false));
        assert_eq!(value["metaTypeJson"], json!(null));
    }

    #[test]
    fn lookup_mode_codes() {
        assert_eq!(LookupMode::from_code(1), Some(LookupMode::DropDown));
        assert_eq!(LookupMode::from_code(3), Some(LookupMode::AutoComplete));
        assert_eq!(LookupMode::from_code(9), None);
        for mode in LookupMode::ALL {
            assert_eq!(LookupMode::from_code(mode.code()), Some(mode));
        }
    }

    #[test]
    fn inventory_action_is_lenient() {
        let meta: InventoryMeta =
            serde_json::from_value(json!({"QuantityFieldRef": 5, "Action": "2"})).unwrap();
        assert_eq!(meta.quantity_field_ref, "5");
        assert_eq!(meta.price_field_ref, "");
        assert_eq!(meta.action, InventoryAction::Decrease);

        let meta: InventoryMeta = serde_json::from_value(json!({"Action": 7})).unwrap();
        assert_eq!(meta.action, InventoryAction::None);

        let written = serde_json::to_value(InventoryMeta {
            action: InventoryAction::Increase,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(written["Action"], json!(1));
    }
}
