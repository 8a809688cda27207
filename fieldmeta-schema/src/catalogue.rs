//! The built-in field-type catalogue.
//!
//! Column codes are persisted and must never be renumbered.

use crate::reference::ReferenceKind::{self, EntityTypes, SourceFields};
use crate::registry::{ArrayShape, Dependency, FieldTypeDescriptor, JsonShape};
use crate::slot::SlotName::{
    BoolMeta1, LookupMode, MetaType1, MetaType2, MetaType3, MetaType4, MetaType5, MetaTypeJson,
};
use crate::types::InventoryMeta;

const BASE: FieldTypeDescriptor = FieldTypeDescriptor {
    key: "",
    label: "",
    column_type: 0,
    slot_usage: &[],
    owns_filter_table: false,
    array_shape: ArrayShape::Unused,
    json_shape: JsonShape::Unused,
    depends_on: &[],
};

const ENTITY_TYPE: Dependency = Dependency::slot(MetaType1, EntityTypes);
const DISPLAY_FIELD: Dependency = Dependency::slot(MetaType2, SourceFields);
const VALUE_FIELD: Dependency = Dependency::slot(MetaType3, SourceFields);

const fn enum_on(slot: crate::slot::SlotName, name: &'static str) -> Dependency {
    Dependency::slot(slot, ReferenceKind::Enum(name))
}

const LOOKUP_DEPS: &[Dependency] = &[ENTITY_TYPE, DISPLAY_FIELD, VALUE_FIELD];

pub const BUILTIN: &[FieldTypeDescriptor] = &[
    FieldTypeDescriptor {
        key: "text",
        label: "Text",
        column_type: 1,
        slot_usage: &[MetaType1, MetaType2],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "multiline-text",
        label: "Multi-line text",
        column_type: 2,
        slot_usage: &[MetaType1, MetaType2],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "rich-text",
        label: "Rich text",
        column_type: 3,
        slot_usage: &[MetaType1, BoolMeta1],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "number",
        label: "Number",
        column_type: 4,
        slot_usage: &[MetaType1, MetaType2],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "decimal",
        label: "Decimal",
        column_type: 5,
        slot_usage: &[MetaType1, MetaType2, MetaType3],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "currency",
        label: "Currency",
        column_type: 6,
        slot_usage: &[MetaType1, MetaType3],
        depends_on: &[enum_on(MetaType1, "Currency")],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "percent",
        label: "Percent",
        column_type: 7,
        slot_usage: &[MetaType3],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "date",
        label: "Date",
        column_type: 8,
        slot_usage: &[MetaType1],
        depends_on: &[enum_on(MetaType1, "DateFormat")],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "date-time",
        label: "Date and time",
        column_type: 9,
        slot_usage: &[MetaType1, BoolMeta1],
        depends_on: &[enum_on(MetaType1, "DateFormat")],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "time",
        label: "Time",
        column_type: 10,
        slot_usage: &[MetaType1],
        depends_on: &[enum_on(MetaType1, "TimeFormat")],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "checkbox",
        label: "Checkbox",
        column_type: 11,
        slot_usage: &[BoolMeta1],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "email",
        label: "Email",
        column_type: 12,
        slot_usage: &[BoolMeta1],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "phone",
        label: "Phone",
        column_type: 13,
        slot_usage: &[MetaType1],
        depends_on: &[enum_on(MetaType1, "Country")],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "hyperlink",
        label: "Hyperlink",
        column_type: 14,
        slot_usage: &[MetaTypeJson],
        json_shape: JsonShape::Hyperlink,
        ..BASE
    },
    FieldTypeDescriptor {
        key: "dropdown",
        label: "Dropdown",
        column_type: 15,
        slot_usage: &[MetaType4, LookupMode],
        array_shape: ArrayShape::Values,
        ..BASE
    },
    FieldTypeDescriptor {
        key: "radio",
        label: "Radio buttons",
        column_type: 16,
        slot_usage: &[MetaType4],
        array_shape: ArrayShape::Values,
        ..BASE
    },
    FieldTypeDescriptor {
        key: "multi-select",
        label: "Multi-select",
        column_type: 17,
        slot_usage: &[MetaType1, MetaType4],
        array_shape: ArrayShape::Values,
        ..BASE
    },
    FieldTypeDescriptor {
        key: "lookup",
        label: "Lookup",
        column_type: 18,
        slot_usage: &[MetaType1, MetaType2, MetaType3, MetaType4, LookupMode, BoolMeta1],
        owns_filter_table: true,
        array_shape: ArrayShape::FilterRows,
        depends_on: LOOKUP_DEPS,
        ..BASE
    },
    FieldTypeDescriptor {
        key: "advance-lookup-table",
        label: "Advance lookup table",
        column_type: 19,
        slot_usage: &[
            MetaType1, MetaType2, MetaType3, MetaType4, MetaType5, LookupMode, BoolMeta1,
        ],
        owns_filter_table: true,
        array_shape: ArrayShape::FilterRows,
        depends_on: LOOKUP_DEPS,
        ..BASE
    },
    FieldTypeDescriptor {
        key: "inventory",
        label: "Inventory",
        column_type: 20,
        slot_usage: &[MetaType1, MetaType2, MetaType4, MetaTypeJson],
        owns_filter_table: true,
        array_shape: ArrayShape::FilterRows,
        json_shape: JsonShape::Inventory,
        depends_on: &[
            ENTITY_TYPE,
            DISPLAY_FIELD,
            Dependency::json_key(InventoryMeta::QUANTITY_FIELD_REF, SourceFields),
            Dependency::json_key(InventoryMeta::PRICE_FIELD_REF, SourceFields),
        ],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "image-lookup",
        label: "Image lookup",
        column_type: 21,
        slot_usage: &[MetaType1, MetaType2, MetaType3, MetaType4, BoolMeta1],
        owns_filter_table: true,
        array_shape: ArrayShape::FilterRows,
        depends_on: LOOKUP_DEPS,
        ..BASE
    },
    FieldTypeDescriptor {
        key: "real-value-lookup",
        label: "Real value lookup",
        column_type: 22,
        slot_usage: &[MetaType1, MetaType2, MetaType3, MetaType4, LookupMode],
        owns_filter_table: true,
        array_shape: ArrayShape::FilterRows,
        depends_on: LOOKUP_DEPS,
        ..BASE
    },
    FieldTypeDescriptor {
        key: "table",
        label: "Table",
        column_type: 23,
        slot_usage: &[MetaType1, MetaType4, MetaTypeJson],
        array_shape: ArrayShape::Values,
        json_shape: JsonShape::Object,
        depends_on: &[ENTITY_TYPE],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "attachment",
        label: "Attachment",
        column_type: 24,
        slot_usage: &[MetaType1, BoolMeta1],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "image",
        label: "Image",
        column_type: 25,
        slot_usage: &[MetaType1, BoolMeta1],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "signature",
        label: "Signature",
        column_type: 26,
        ..BASE
    },
    FieldTypeDescriptor {
        key: "barcode",
        label: "Barcode",
        column_type: 27,
        slot_usage: &[MetaType1],
        depends_on: &[enum_on(MetaType1, "BarcodeFormat")],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "rating",
        label: "Rating",
        column_type: 28,
        slot_usage: &[MetaType1],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "slider",
        label: "Slider",
        column_type: 29,
        slot_usage: &[MetaType1, MetaType2, MetaType3],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "color",
        label: "Color",
        column_type: 30,
        ..BASE
    },
    FieldTypeDescriptor {
        key: "geo-location",
        label: "Geo location",
        column_type: 31,
        slot_usage: &[BoolMeta1],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "formula",
        label: "Formula",
        column_type: 32,
        slot_usage: &[MetaType1, MetaType2],
        depends_on: &[enum_on(MetaType2, "FormulaResultType")],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "auto-number",
        label: "Auto number",
        column_type: 33,
        slot_usage: &[MetaType1, MetaType2],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "user",
        label: "User",
        column_type: 34,
        slot_usage: &[BoolMeta1],
        ..BASE
    },
    FieldTypeDescriptor {
        key: "section-header",
        label: "Section header",
        column_type: 35,
        slot_usage: &[MetaType1],
        ..BASE
    },
];
