//! Reference lists and the normalization rule shared by slots and filter rows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::slot::de_canonical;

/// One selectable option of a reference list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefItem {
    #[serde(rename = "ID", deserialize_with = "de_canonical")]
    pub id: String,
    #[serde(rename = "DisplayName", default, deserialize_with = "de_canonical")]
    pub display_name: String,
}

impl RefItem {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// The kind of list a slot or row column references.
///
/// `SourceFields` and `DestinationFields` are distinct kinds even
/// though both hold entity fields: the first follows `metaType1`, the second
/// is the owning form's own field collection supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ReferenceKind {
    /// All entity types (forms) known to the service.
    EntityTypes,
    /// Fields of the entity type selected in `metaType1`.
    SourceFields,
    /// Fields of the form that owns the definition being edited.
    DestinationFields,
    /// A named enum map from the service.
    Enum(&'static str),
}

impl ReferenceKind {
    /// Lists of this kind are pushed in by the caller, never fetched.
    pub fn is_caller_supplied(self) -> bool {
        matches!(self, ReferenceKind::DestinationFields)
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::EntityTypes => f.write_str("entity-types"),
            ReferenceKind::SourceFields => f.write_str("source-fields"),
            ReferenceKind::DestinationFields => f.write_str("destination-fields"),
            ReferenceKind::Enum(name) => write!(f, "enum({name})"),
        }
    }
}

/// Cache key of one concrete list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ListKey {
    EntityTypes,
    EntityFields(String),
    Enum(String),
    FormFields(String),
}

impl fmt::Display for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKey::EntityTypes => f.write_str("entityTypes"),
            ListKey::EntityFields(id) => write!(f, "entityFields:{id}"),
            ListKey::Enum(name) => write!(f, "enum:{name}"),
            ListKey::FormFields(id) => write!(f, "formFields:{id}"),
        }
    }
}

/// True when `id` is one of the list's item IDs.
pub fn contains(list: &[RefItem], id: &str) -> bool {
    list.iter().any(|item| item.id == id)
}

/// Correct a stored reference against its governing list.
///
/// Returns the replacement value, or `None` when the value is already valid:
/// empty values stay empty, members stay put, non-members fall back to the
/// first item, and everything is cleared when the list is empty.
pub fn normalize_value(current: &str, list: &[RefItem]) -> Option<String> {
    if current.is_empty() || contains(list, current) {
        return None;
    }
    Some(list.first().map(|item| item.id.clone()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> Vec<RefItem> {
        vec![RefItem::new("1", "Name"), RefItem::new("2", "Code")]
    }

    #[test]
    fn member_values_are_kept() {
        assert_eq!(normalize_value("2", &fields()), None);
    }

    #[test]
    fn empty_values_stay_empty() {
        assert_eq!(normalize_value("", &fields()), None);
        assert_eq!(normalize_value("", &[]), None);
    }

    #[test]
    fn non_members_fall_back_to_first_item() {
        assert_eq!(normalize_value("9", &fields()), Some("1".to_string()));
    }

    #[test]
    fn empty_list_clears() {
        assert_eq!(normalize_value("9", &[]), Some(String::new()));
    }

    #[test]
    fn normalization_is_idempotent() {
        let list = fields();
        let once = normalize_value("9", &list).unwrap();
        assert_eq!(normalize_value(&once, &list), None);
    }

    #[test]
    fn ref_item_accepts_numeric_ids() {
        let item: RefItem = serde_json::from_value(json!({"ID": 5, "DisplayName": "Title"})).unwrap();
        assert_eq!(item, RefItem::new("5", "Title"));
    }

    #[test]
    fn list_keys_render_with_dependency() {
        assert_eq!(ListKey::EntityFields("7".into()).to_string(), "entityFields:7");
        assert_eq!(ListKey::Enum("Currency".into()).to_string(), "enum:Currency");
        assert_eq!(ListKey::EntityTypes.to_string(), "entityTypes");
    }

    #[test]
    fn only_destination_fields_are_caller_supplied() {
        assert!(ReferenceKind::DestinationFields.is_caller_supplied());
        assert!(!ReferenceKind::SourceFields.is_caller_supplied());
        assert!(!ReferenceKind::Enum("Country").is_caller_supplied());
    }
}
