//! Typed view over the generic slots of one field definition.
//!
//! Everything outside the codec works on [`TypedView`]; the raw slot payload
//! is only read and written at the storage boundary.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::filter_table::FilterTable;
use crate::registry::{ArrayShape, FieldTypeDescriptor, JsonShape};
use crate::slot::{RefTarget, SlotName};
use crate::types::{HyperlinkMeta, InventoryMeta, LookupMode};

/// Decoded `metaType4`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "value", rename_all = "kebab-case")]
pub enum ArrayBlob {
    Unused,
    Rows(FilterTable),
    Values(Vec<Value>),
}

impl ArrayBlob {
    pub fn empty(shape: ArrayShape) -> Self {
        match shape {
            ArrayShape::Unused => ArrayBlob::Unused,
            ArrayShape::FilterRows => ArrayBlob::Rows(FilterTable::new()),
            ArrayShape::Values => ArrayBlob::Values(Vec::new()),
        }
    }
}

/// Decoded `metaTypeJson`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "value", rename_all = "kebab-case")]
pub enum JsonBlob {
    Unused,
    Inventory(InventoryMeta),
    Hyperlink(HyperlinkMeta),
    Object(Map<String, Value>),
}

impl JsonBlob {
    pub fn empty(shape: JsonShape) -> Self {
        match shape {
            JsonShape::Unused => JsonBlob::Unused,
            JsonShape::Inventory => JsonBlob::Inventory(InventoryMeta::default()),
            JsonShape::Hyperlink => JsonBlob::Hyperlink(HyperlinkMeta::default()),
            JsonShape::Object => JsonBlob::Object(Map::new()),
        }
    }

    /// True when the blob holds nothing but defaults; such blobs are stored as `null`.
    pub fn is_empty(&self) -> bool {
        match self {
            JsonBlob::Unused => true,
            JsonBlob::Inventory(meta) => *meta == InventoryMeta::default(),
            JsonBlob::Hyperlink(meta) => *meta == HyperlinkMeta::default(),
            JsonBlob::Object(map) => map.is_empty(),
        }
    }
}

/// Slot values interpreted through one field type's descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedView {
    pub column_type: i32,
    pub type_key: &'static str,
    pub meta_type1: String,
    pub meta_type2: String,
    pub meta_type3: String,
    pub meta_type5: String,
    pub lookup_mode: Option<LookupMode>,
    pub bool_meta1: bool,
    pub array: ArrayBlob,
    pub json: JsonBlob,
}

impl TypedView {
    /// The type-neutral view of `descriptor`: every slot at its default.
    pub fn neutral(descriptor: &FieldTypeDescriptor) -> Self {
        Self {
            column_type: descriptor.column_type,
            type_key: descriptor.key,
            meta_type1: String::new(),
            meta_type2: String::new(),
            meta_type3: String::new(),
            meta_type5: String::new(),
            lookup_mode: None,
            bool_meta1: false,
            array: ArrayBlob::empty(descriptor.array_shape),
            json: JsonBlob::empty(descriptor.json_shape),
        }
    }

    /// Value of a scalar slot. `None` for non-scalar slots.
    pub fn slot(&self, slot: SlotName) -> Option<&str> {
        match slot {
            SlotName::MetaType1 => Some(&self.meta_type1),
            SlotName::MetaType2 => Some(&self.meta_type2),
            SlotName::MetaType3 => Some(&self.meta_type3),
            SlotName::MetaType5 => Some(&self.meta_type5),
            _ => None,
        }
    }

    /// Mutable access to a scalar slot.
    pub fn slot_mut(&mut self, slot: SlotName) -> Option<&mut String> {
        match slot {
            SlotName::MetaType1 => Some(&mut self.meta_type1),
            SlotName::MetaType2 => Some(&mut self.meta_type2),
            SlotName::MetaType3 => Some(&mut self.meta_type3),
            SlotName::MetaType5 => Some(&mut self.meta_type5),
            _ => None,
        }
    }

    /// Current value at a reference target.
    pub fn reference(&self, target: RefTarget) -> Option<&str> {
        match target {
            RefTarget::Slot(slot) => self.slot(slot),
            RefTarget::JsonKey(key) => match &self.json {
                JsonBlob::Inventory(meta) if key == InventoryMeta::QUANTITY_FIELD_REF => {
                    Some(&meta.quantity_field_ref)
                }
                JsonBlob::Inventory(meta) if key == InventoryMeta::PRICE_FIELD_REF => {
                    Some(&meta.price_field_ref)
                }
                _ => None,
            },
        }
    }

    /// Overwrite a reference target. Returns false if the view has no such target.
    pub fn set_reference(&mut self, target: RefTarget, value: impl Into<String>) -> bool {
        let cell = match target {
            RefTarget::Slot(slot) => self.slot_mut(slot),
            RefTarget::JsonKey(key) => match &mut self.json {
                JsonBlob::Inventory(meta) if key == InventoryMeta::QUANTITY_FIELD_REF => {
                    Some(&mut meta.quantity_field_ref)
                }
                JsonBlob::Inventory(meta) if key == InventoryMeta::PRICE_FIELD_REF => {
                    Some(&mut meta.price_field_ref)
                }
                _ => None,
            },
        };
        match cell {
            Some(cell) => {
                *cell = value.into();
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> Option<&FilterTable> {
        match &self.array {
            ArrayBlob::Rows(table) => Some(table),
            _ => None,
        }
    }

    pub fn rows_mut(&mut self) -> Option<&mut FilterTable> {
        match &mut self.array {
            ArrayBlob::Rows(table) => Some(table),
            _ => None,
        }
    }
}
