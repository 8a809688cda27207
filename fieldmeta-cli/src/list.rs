//! `fieldmeta types` - list the field-type catalogue.

use comfy_table::{presets::UTF8_FULL, Table};
use fieldmeta_schema::{FieldTypeDescriptor, FieldTypeRegistry};

/// Render the catalogue as a table, or as pretty JSON.
pub fn render_types(registry: &FieldTypeRegistry, json: bool) -> anyhow::Result<String> {
    let descriptors = registry.all();
    if json {
        return Ok(serde_json::to_string_pretty(&descriptors)?);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Code", "Key", "Label", "Slots", "References", "Filter"]);
    for descriptor in &descriptors {
        table.add_row(vec![
            descriptor.column_type.to_string(),
            descriptor.key.to_string(),
            descriptor.label.to_string(),
            slots(descriptor),
            references(descriptor),
            if descriptor.owns_filter_table { "yes" } else { "" }.to_string(),
        ]);
    }
    Ok(format!("{table}\n\n{} field type(s)", descriptors.len()))
}

fn slots(descriptor: &FieldTypeDescriptor) -> String {
    descriptor
        .slot_usage
        .iter()
        .map(|slot| slot.wire_name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn references(descriptor: &FieldTypeDescriptor) -> String {
    descriptor
        .depends_on
        .iter()
        .map(|dep| format!("{} <- {}", dep.target, dep.kind))
        .collect::<Vec<_>>()
        .join("\n")
}
