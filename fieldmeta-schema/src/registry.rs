//! Field-Type Registry: the catalogue that gives each generic slot its meaning.
//!
//! A [`FieldTypeDescriptor`] says which slots a type occupies, how its two
//! blobs are shaped, whether it owns a Filter-Table, and which reference lists
//! its slots depend on. The rest of the engine is driven entirely by these
//! descriptors.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalogue;
use crate::error::{Result, SchemaError};
use crate::reference::ReferenceKind;
use crate::slot::{RefTarget, SlotName};

/// Shape of the `metaType4` array blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrayShape {
    Unused,
    /// Filter-Table rows.
    FilterRows,
    /// Free JSON values (choice options, column settings).
    Values,
}

/// Shape of the `metaTypeJson` object blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JsonShape {
    Unused,
    Inventory,
    Hyperlink,
    /// Free JSON object.
    Object,
}

/// A value that must stay a member of a reference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dependency {
    pub target: RefTarget,
    pub kind: ReferenceKind,
}

impl Dependency {
    pub const fn slot(slot: SlotName, kind: ReferenceKind) -> Self {
        Self {
            target: RefTarget::Slot(slot),
            kind,
        }
    }

    pub const fn json_key(key: &'static str, kind: ReferenceKind) -> Self {
        Self {
            target: RefTarget::JsonKey(key),
            kind,
        }
    }
}

/// Static catalogue entry for one field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldTypeDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub column_type: i32,
    pub slot_usage: &'static [SlotName],
    pub owns_filter_table: bool,
    pub array_shape: ArrayShape,
    pub json_shape: JsonShape,
    pub depends_on: &'static [Dependency],
}

impl FieldTypeDescriptor {
    /// True if this type gives `slot` a meaning.
    pub fn uses(&self, slot: SlotName) -> bool {
        self.slot_usage.contains(&slot)
    }

    /// Every list kind this type needs, entity types first, deduplicated.
    ///
    /// Filter-Table owners implicitly need both row lists.
    pub fn reference_kinds(&self) -> Vec<ReferenceKind> {
        let mut kinds: Vec<ReferenceKind> = Vec::new();
        let mut push = |kind: ReferenceKind| {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        };
        for dep in self.depends_on {
            push(dep.kind);
        }
        if self.owns_filter_table {
            push(ReferenceKind::SourceFields);
            push(ReferenceKind::DestinationFields);
        }
        kinds.sort_by_key(|kind| match kind {
            ReferenceKind::EntityTypes => 0,
            ReferenceKind::SourceFields => 1,
            ReferenceKind::DestinationFields => 2,
            ReferenceKind::Enum(_) => 3,
        });
        kinds
    }

    /// Targets whose values are governed by lists of `kind`.
    pub fn targets_of(&self, kind: ReferenceKind) -> impl Iterator<Item = RefTarget> + '_ {
        self.depends_on
            .iter()
            .filter(move |dep| dep.kind == kind)
            .map(|dep| dep.target)
    }

    /// The list kind governing `target`, if it is a reference at all.
    pub fn kind_of(&self, target: RefTarget) -> Option<ReferenceKind> {
        self.depends_on
            .iter()
            .find(|dep| dep.target == target)
            .map(|dep| dep.kind)
    }

    /// True if `metaType1` selects an entity type for this field.
    pub fn selects_entity_type(&self) -> bool {
        self.kind_of(RefTarget::Slot(SlotName::MetaType1)) == Some(ReferenceKind::EntityTypes)
    }

    fn check(&self) -> Result<()> {
        let fail = |message: String| {
            Err(SchemaError::invalid_catalogue(format!(
                "{} ({}): {message}",
                self.key, self.column_type
            )))
        };

        if self.owns_filter_table != (self.array_shape == ArrayShape::FilterRows) {
            return fail("filter-table ownership must match the array blob shape".into());
        }
        if (self.array_shape != ArrayShape::Unused) != self.uses(SlotName::MetaType4) {
            return fail("metaType4 usage must match the array blob shape".into());
        }
        if (self.json_shape != JsonShape::Unused) != self.uses(SlotName::MetaTypeJson) {
            return fail("metaTypeJson usage must match the object blob shape".into());
        }
        for dep in self.depends_on {
            match dep.target {
                RefTarget::Slot(slot) if !slot.is_scalar() => {
                    return fail(format!("{slot} cannot hold a reference"));
                }
                RefTarget::Slot(slot) if !self.uses(slot) => {
                    return fail(format!("dependency on undeclared slot {slot}"));
                }
                RefTarget::JsonKey(key) if self.json_shape != JsonShape::Inventory => {
                    return fail(format!("json reference {key} needs an inventory blob"));
                }
                RefTarget::JsonKey(key)
                    if key != crate::types::InventoryMeta::QUANTITY_FIELD_REF
                        && key != crate::types::InventoryMeta::PRICE_FIELD_REF =>
                {
                    return fail(format!("unknown inventory key {key}"));
                }
                _ => {}
            }
            if dep.kind.is_caller_supplied() {
                return fail(format!("{} cannot back a slot", dep.kind));
            }
        }
        let needs_source = self.owns_filter_table
            || self
                .depends_on
                .iter()
                .any(|dep| dep.kind == ReferenceKind::SourceFields);
        if needs_source && !self.selects_entity_type() {
            return fail("source-field references need metaType1 to select an entity type".into());
        }
        Ok(())
    }
}

/// Index over a validated set of descriptors.
#[derive(Debug, Clone)]
pub struct FieldTypeRegistry {
    descriptors: Vec<FieldTypeDescriptor>,
    code_index: HashMap<i32, usize>,
    key_index: HashMap<&'static str, usize>,
}

impl FieldTypeRegistry {
    /// Build a registry from descriptors, rejecting inconsistent catalogues.
    pub fn new(descriptors: Vec<FieldTypeDescriptor>) -> Result<Self> {
        let mut registry = Self {
            descriptors: Vec::with_capacity(descriptors.len()),
            code_index: HashMap::new(),
            key_index: HashMap::new(),
        };
        for descriptor in descriptors {
            descriptor.check()?;
            if registry.code_index.contains_key(&descriptor.column_type) {
                return Err(SchemaError::invalid_catalogue(format!(
                    "duplicate column code {}",
                    descriptor.column_type
                )));
            }
            if registry.key_index.contains_key(descriptor.key) {
                return Err(SchemaError::invalid_catalogue(format!(
                    "duplicate key {}",
                    descriptor.key
                )));
            }
            registry.insert(descriptor);
        }
        Ok(registry)
    }

    /// The built-in catalogue.
    pub fn builtin() -> Self {
        let mut registry = Self {
            descriptors: Vec::with_capacity(catalogue::BUILTIN.len()),
            code_index: HashMap::new(),
            key_index: HashMap::new(),
        };
        for descriptor in catalogue::BUILTIN {
            registry.insert(descriptor.clone());
        }
        registry
    }

    fn insert(&mut self, descriptor: FieldTypeDescriptor) {
        let idx = self.descriptors.len();
        self.code_index.insert(descriptor.column_type, idx);
        self.key_index.insert(descriptor.key, idx);
        self.descriptors.push(descriptor);
    }

    /// Descriptor for a persisted column code.
    pub fn resolve(&self, column_type: i32) -> Result<&FieldTypeDescriptor> {
        self.code_index
            .get(&column_type)
            .map(|&i| &self.descriptors[i])
            .ok_or(SchemaError::UnknownFieldType { column_type })
    }

    /// Descriptor for a UI-selected key.
    pub fn by_key(&self, key: &str) -> Result<&FieldTypeDescriptor> {
        self.key_index
            .get(key)
            .map(|&i| &self.descriptors[i])
            .ok_or_else(|| SchemaError::UnknownFieldKey {
                key: key.to_string(),
            })
    }

    /// All descriptors, ordered by column code.
    pub fn all(&self) -> Vec<&FieldTypeDescriptor> {
        let mut all: Vec<_> = self.descriptors.iter().collect();
        all.sort_by_key(|d| d.column_type);
        all
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for FieldTypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
