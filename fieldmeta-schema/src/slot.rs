//! Slot names and the canonical coercion applied to every scalar slot.
//!
//! The persistence API hands slots back as whatever JSON it stored: strings,
//! numbers, booleans or null. Normalization compares values by string
//! equality, so everything is coerced to one canonical string form on the way
//! in.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

/// One of the fixed persisted columns a field type can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SlotName {
    MetaType1,
    MetaType2,
    MetaType3,
    MetaType4,
    MetaType5,
    LookupMode,
    BoolMeta1,
    MetaTypeJson,
}

impl SlotName {
    /// The scalar string slots, in wire order.
    pub const SCALARS: [SlotName; 4] = [
        SlotName::MetaType1,
        SlotName::MetaType2,
        SlotName::MetaType3,
        SlotName::MetaType5,
    ];

    /// Column name at the storage boundary.
    pub const fn wire_name(self) -> &'static str {
        match self {
            SlotName::MetaType1 => "metaType1",
            SlotName::MetaType2 => "metaType2",
            SlotName::MetaType3 => "metaType3",
            SlotName::MetaType4 => "metaType4",
            SlotName::MetaType5 => "metaType5",
            SlotName::LookupMode => "LookupMode",
            SlotName::BoolMeta1 => "BoolMeta1",
            SlotName::MetaTypeJson => "metaTypeJson",
        }
    }

    /// True for the four free string slots.
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            SlotName::MetaType1 | SlotName::MetaType2 | SlotName::MetaType3 | SlotName::MetaType5
        )
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Where a reference value lives inside a typed view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RefTarget {
    /// A scalar slot such as `metaType2`.
    Slot(SlotName),
    /// A named key inside the `metaTypeJson` object.
    JsonKey(&'static str),
}

impl fmt::Display for RefTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefTarget::Slot(slot) => write!(f, "{slot}"),
            RefTarget::JsonKey(key) => write!(f, "metaTypeJson.{key}"),
        }
    }
}

/// Canonical string form of a loosely-typed JSON value.
///
/// `null` becomes `""`, whole floats lose their fraction (`7.0` → `"7"`),
/// booleans become `"true"`/`"false"`.
pub fn canonical(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => canonical_number(n),
        other => other.to_string(),
    }
}

fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Deserialize any scalar into its canonical string; null or absent is `""`.
pub fn de_canonical<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(canonical).unwrap_or_default())
}

/// Like [`de_canonical`] but keeps `null` distinguishable from `""`.
pub fn de_optional_canonical<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(canonical(&v)),
    })
}

/// Deserialize an integer code that may arrive as a number or numeric string.
pub fn de_optional_code<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_code))
}

/// Parse an integer code out of a loosely-typed value. Empty or non-numeric
/// input yields `None`.
pub fn parse_code(value: &Value) -> Option<i32> {
    let text = canonical(value);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<i32>().ok()
}

/// Deserialize a flag from a bool, `0`/`1`, or `"true"`/`"false"`.
pub fn de_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(v) => matches!(canonical(&v).trim().to_ascii_lowercase().as_str(), "true" | "1"),
        None => false,
    })
}

/// Deserialize a blob column. Blobs are stored as JSON text, but a service may
/// already have inflated them; inflated values are re-serialized so the codec
/// always sees text.
pub fn de_blob_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_coerces_scalars() {
        assert_eq!(canonical(&json!(null)), "");
        assert_eq!(canonical(&json!("abc")), "abc");
        assert_eq!(canonical(&json!(7)), "7");
        assert_eq!(canonical(&json!(7.0)), "7");
        assert_eq!(canonical(&json!(2.5)), "2.5");
        assert_eq!(canonical(&json!(-3)), "-3");
        assert_eq!(canonical(&json!(true)), "true");
    }

    #[test]
    fn parse_code_accepts_strings_and_numbers() {
        assert_eq!(parse_code(&json!(3)), Some(3));
        assert_eq!(parse_code(&json!("3")), Some(3));
        assert_eq!(parse_code(&json!(" 12 ")), Some(12));
        assert_eq!(parse_code(&json!("")), None);
        assert_eq!(parse_code(&json!("abc")), None);
        assert_eq!(parse_code(&json!(null)), None);
    }

    #[test]
    fn wire_names_are_case_sensitive() {
        assert_eq!(SlotName::MetaType1.wire_name(), "metaType1");
        assert_eq!(SlotName::LookupMode.wire_name(), "LookupMode");
        assert_eq!(SlotName::MetaTypeJson.to_string(), "metaTypeJson");
        assert_eq!(
            RefTarget::JsonKey("QuantityFieldRef").to_string(),
            "metaTypeJson.QuantityFieldRef"
        );
    }

    #[test]
    fn scalar_slots_exclude_blobs() {
        assert!(SlotName::MetaType5.is_scalar());
        assert!(!SlotName::MetaType4.is_scalar());
        assert!(!SlotName::LookupMode.is_scalar());
        assert_eq!(SlotName::SCALARS.len(), 4);
    }
}
