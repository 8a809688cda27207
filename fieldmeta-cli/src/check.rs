//! `fieldmeta check` - resolve a definition against fixture reference data.
//!
//! Opens an edit session on the definition, supplies the owning form's fields
//! as the destination list, settles every cascade and reports what
//! normalization had to change.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use comfy_table::{presets::UTF8_FULL, Table};
use fieldmeta_config::EngineConfig;
use fieldmeta_editor::{
    fetch_list, EditSession, EditorDriver, EditorWarning, ReferenceSource, SessionOptions,
    StaticReferenceSource,
};
use fieldmeta_schema::{
    codec, FieldDefinition, FieldTypeDescriptor, FieldTypeRegistry, ListKey, RefTarget, RowColumn,
    SlotName, TypedView,
};
use tracing::{info, warn};

use crate::input::{read_definition, render};

/// One value that normalization replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub location: String,
    pub before: String,
    pub after: String,
}

#[derive(Debug)]
pub struct CheckReport {
    pub definition: FieldDefinition,
    pub changes: Vec<Change>,
    pub warnings: Vec<EditorWarning>,
}

impl CheckReport {
    /// True when the definition was already consistent and nothing was recovered from.
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty() && self.warnings.is_empty()
    }

    /// The changes as a table, `None` if there are none.
    pub fn changes_table(&self) -> Option<Table> {
        if self.changes.is_empty() {
            return None;
        }
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Location", "Before", "After"]);
        for change in &self.changes {
            table.add_row(vec![&change.location, &change.before, &change.after]);
        }
        Some(table)
    }

    pub fn render(&self, yaml: bool) -> anyhow::Result<String> {
        render(&self.definition, yaml)
    }
}

pub async fn run_check(
    registry: Arc<FieldTypeRegistry>,
    config: &EngineConfig,
    file: &Path,
    references: &Path,
) -> anyhow::Result<CheckReport> {
    let definition = read_definition(file)?;
    let source = StaticReferenceSource::from_json_file(references)
        .with_context(|| format!("failed to load references from {}", references.display()))?;
    check_definition(registry, config, definition, Arc::new(source)).await
}

/// Settle `definition` against `source` and diff the result.
pub async fn check_definition(
    registry: Arc<FieldTypeRegistry>,
    config: &EngineConfig,
    definition: FieldDefinition,
    source: Arc<dyn ReferenceSource>,
) -> anyhow::Result<CheckReport> {
    let before = codec::decode(&definition, &registry)?.view;
    let mut session = EditSession::open(registry, definition, SessionOptions::from(config))?;
    let mut warnings = session.take_warnings();

    let form = session.entity_type_id().to_string();
    if !form.is_empty() {
        let key = ListKey::FormFields(form);
        match fetch_list(source.as_ref(), &key).await {
            Ok(items) => {
                session.set_destination_fields(items)?;
            }
            Err(e) => {
                warn!(%key, error = %e, "destination fields unavailable");
                warnings.push(EditorWarning::ReferenceFetchFailed {
                    key,
                    message: e.to_string(),
                });
            }
        }
    }

    let mut driver = EditorDriver::new(source);
    warnings.extend(driver.settle(&mut session).await);

    let (after, descriptor) = match (session.view(), session.descriptor()) {
        (Some(view), Some(descriptor)) => (view.clone(), descriptor.clone()),
        _ => anyhow::bail!("definition has no field type"),
    };
    let changes = diff(&descriptor, &before, &after);
    info!(
        changes = changes.len(),
        warnings = warnings.len(),
        "definition checked"
    );
    Ok(CheckReport {
        definition: session.definition()?,
        changes,
        warnings,
    })
}

fn diff(descriptor: &FieldTypeDescriptor, before: &TypedView, after: &TypedView) -> Vec<Change> {
    let mut changes = Vec::new();
    let mut push = |location: String, before: &str, after: &str| {
        if before != after {
            changes.push(Change {
                location,
                before: before.to_string(),
                after: after.to_string(),
            });
        }
    };

    for slot in SlotName::SCALARS {
        let target = RefTarget::Slot(slot);
        push(
            target.to_string(),
            before.reference(target).unwrap_or_default(),
            after.reference(target).unwrap_or_default(),
        );
    }
    for dep in descriptor.depends_on {
        if let RefTarget::JsonKey(_) = dep.target {
            push(
                dep.target.to_string(),
                before.reference(dep.target).unwrap_or_default(),
                after.reference(dep.target).unwrap_or_default(),
            );
        }
    }

    if let (Some(old), Some(new)) = (before.rows(), after.rows()) {
        for row in old.rows() {
            let Some(current) = new.get(&row.id) else {
                push(format!("row {}", row.id), "present", "removed");
                continue;
            };
            for (column, name) in [
                (RowColumn::Source, "SourceFieldRef"),
                (RowColumn::Destination, "DestFieldRef"),
            ] {
                push(
                    format!("row {}.{name}", row.id),
                    row.reference(column),
                    current.reference(column),
                );
            }
        }
    }
    changes
}
