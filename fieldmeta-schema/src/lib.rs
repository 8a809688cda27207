//! Field-type registry and generic slot codec
//!
//! `fieldmeta-schema` is the pure-data half of fieldmeta. Every custom field
//! type is persisted through the same fixed shape: four scalar slots
//! (`metaType1`, `metaType2`, `metaType3`, `metaType5`), a lookup-mode code, a
//! boolean flag, an array blob (`metaType4`) and an object blob
//! (`metaTypeJson`). This crate knows what each slot *means* for each type.
//!
//! # Architecture
//!
//! - **Registry**: one [`FieldTypeDescriptor`] per field type, looked up by
//!   persisted column code or by key. Adding a type means adding a descriptor.
//! - **Codec**: [`codec::decode`] turns a raw [`FieldDefinition`] into a
//!   [`TypedView`]; [`codec::encode`] is its inverse. Blob parsing never fails
//!   the decode: malformed JSON degrades to the empty default plus a warning.
//! - **Filter table**: the editable grid stored in `metaType4`, whose two
//!   reference columns are normalized against two independent lists.
//! - **No I/O**: fetching reference lists and persisting definitions live in
//!   `fieldmeta-editor`.

pub mod catalogue;
pub mod codec;
pub mod error;
pub mod filter_table;
pub mod reference;
pub mod registry;
pub mod slot;
pub mod types;
pub mod view;

pub use codec::{decode, decode_with, encode, Decoded};
pub use error::{DecodeWarning, ErrorSeverity, Result, SchemaError, Severity};
pub use filter_table::{FilterCell, FilterRow, FilterTable, RowColumn};
pub use reference::{normalize_value, ListKey, RefItem, ReferenceKind};
pub use registry::{ArrayShape, Dependency, FieldTypeDescriptor, FieldTypeRegistry, JsonShape};
pub use slot::{RefTarget, SlotName};
pub use types::{
    FieldDefinition, HyperlinkMeta, InventoryAction, InventoryMeta, LookupMode, SlotPayload,
};
pub use view::{ArrayBlob, JsonBlob, TypedView};
