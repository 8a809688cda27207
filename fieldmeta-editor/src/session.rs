//! Field Editor Shell.
//!
//! An [`EditSession`] owns one field definition while it is being edited. It
//! is sans-IO: every operation updates the typed view synchronously and
//! queues [`FetchTicket`]s for whatever reference lists the new state needs.
//! Something else (usually [`crate::EditorDriver`]) performs the fetches and
//! hands the answers back through [`EditSession::apply_fetch`].

use std::num::NonZeroUsize;
use std::sync::Arc;

use fieldmeta_config::{EngineConfig, DEFAULT_CACHE_CAPACITY};
use fieldmeta_schema::{
    codec, ArrayBlob, ArrayShape, FieldDefinition, FieldTypeDescriptor, FieldTypeRegistry,
    FilterCell, FilterRow, FilterTable, JsonBlob, LookupMode, RefItem, RefTarget, ReferenceKind,
    RowColumn, SchemaError, SlotName, TypedView,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::ReferenceListCache;
use crate::error::{EditorError, EditorWarning, Result, ServiceError};
use crate::generation::{Generation, GenerationTracker, Phase};
use crate::resolver::{ApplyOutcome, CascadingResolver, FetchTicket, ListState};
use crate::services::{FieldDefinitionStore, PersistedId};

/// Tunables of an edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub cache_capacity: NonZeroUsize,
    pub seed_new_rows: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            seed_new_rows: true,
        }
    }
}

impl From<&EngineConfig> for SessionOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            cache_capacity: config
                .cache_capacity()
                .unwrap_or(SessionOptions::default().cache_capacity),
            seed_new_rows: config.filter_table.seed_new_rows,
        }
    }
}

/// What happened to a fetch result handed to [`EditSession::apply_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDisposition {
    /// The list was applied; `changed` reports whether anything was normalized
    Applied { changed: bool },
    /// The dependency moved on before the answer arrived
    Stale,
    /// Issued under a previous field type
    OldGeneration,
    /// The session was saved or cancelled
    Closed,
}

#[derive(Debug, Clone)]
struct ActiveField {
    descriptor: FieldTypeDescriptor,
    view: TypedView,
}

/// One field definition being created or edited.
#[derive(Debug)]
pub struct EditSession {
    registry: Arc<FieldTypeRegistry>,
    options: SessionOptions,
    cache: ReferenceListCache,
    tracker: GenerationTracker,
    resolver: CascadingResolver,
    id: Option<String>,
    display_name: String,
    entity_type_id: String,
    active: Option<ActiveField>,
    tickets: Vec<FetchTicket>,
    warnings: Vec<EditorWarning>,
}

impl EditSession {
    /// Start a new definition on the form `entity_type_id`, with no field type yet.
    pub fn create(
        registry: Arc<FieldTypeRegistry>,
        entity_type_id: impl Into<String>,
        options: SessionOptions,
    ) -> Self {
        Self {
            registry,
            cache: ReferenceListCache::new(options.cache_capacity),
            options,
            tracker: GenerationTracker::new(),
            resolver: CascadingResolver::new(),
            id: None,
            display_name: String::new(),
            entity_type_id: entity_type_id.into(),
            active: None,
            tickets: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Open a stored definition. Fails if its column code is unknown.
    pub fn open(
        registry: Arc<FieldTypeRegistry>,
        definition: FieldDefinition,
        options: SessionOptions,
    ) -> Result<Self> {
        let decoded = codec::decode(&definition, &registry)?;
        let descriptor = registry.resolve(decoded.view.column_type)?.clone();

        let mut session = Self::create(registry, definition.entity_type_id, options);
        session.id = definition.id;
        session.display_name = definition.display_name;
        session
            .warnings
            .extend(decoded.warnings.into_iter().map(EditorWarning::from));
        session.active = Some(ActiveField {
            descriptor,
            view: decoded.view,
        });
        info!(
            id = ?session.id,
            field_type = session.active.as_ref().map(|a| a.descriptor.key),
            "edit session opened"
        );
        session.resolve();
        Ok(session)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn entity_type_id(&self) -> &str {
        &self.entity_type_id
    }

    pub fn generation(&self) -> Generation {
        self.tracker.current()
    }

    pub fn phase(&self) -> Phase {
        self.tracker.phase()
    }

    pub fn descriptor(&self) -> Option<&FieldTypeDescriptor> {
        self.active.as_ref().map(|active| &active.descriptor)
    }

    pub fn view(&self) -> Option<&TypedView> {
        self.active.as_ref().map(|active| &active.view)
    }

    pub fn registry(&self) -> &FieldTypeRegistry {
        &self.registry
    }

    /// Current list of `kind` as validation sees it.
    pub fn list_state(&self, kind: ReferenceKind) -> ListState<'_> {
        self.resolver.state(kind)
    }

    /// The loaded list of `kind`, for display.
    pub fn reference_list(&self, kind: ReferenceKind) -> Option<&[RefItem]> {
        self.resolver.loaded(kind)
    }

    /// True when no fetch is queued or in flight.
    pub fn is_settled(&self) -> bool {
        self.tickets.is_empty() && self.resolver.pending() == 0
    }

    /// Fetches requested since the last call.
    pub fn take_tickets(&mut self) -> Vec<FetchTicket> {
        std::mem::take(&mut self.tickets)
    }

    /// Warnings collected since the last call.
    pub fn take_warnings(&mut self) -> Vec<EditorWarning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.tracker.ensure_open()?;
        self.display_name = name.into();
        Ok(())
    }

    /// Switch to the field type with UI key `key`.
    pub fn select_type(&mut self, key: &str) -> Result<Generation> {
        self.tracker.ensure_open()?;
        let descriptor = self.registry.by_key(key)?.clone();
        self.switch_to(descriptor)
    }

    /// Switch to the field type with persisted code `column_type`.
    pub fn select_column_type(&mut self, column_type: i32) -> Result<Generation> {
        self.tracker.ensure_open()?;
        let descriptor = self.registry.resolve(column_type)?.clone();
        self.switch_to(descriptor)
    }

    fn switch_to(&mut self, descriptor: FieldTypeDescriptor) -> Result<Generation> {
        if self.descriptor().map(|d| d.column_type) == Some(descriptor.column_type) {
            return Ok(self.generation());
        }
        let generation = self.tracker.begin_switch()?;
        let dropped = self.tickets.len() + self.resolver.pending();
        self.tickets.clear();
        self.resolver.reset();
        self.active = Some(ActiveField {
            view: TypedView::neutral(&descriptor),
            descriptor,
        });
        self.tracker.finish_switch();
        info!(
            %generation,
            field_type = self.descriptor().map(|d| d.key),
            dropped_fetches = dropped,
            "field type switched"
        );
        self.resolve();
        Ok(generation)
    }

    /// Write a scalar slot. Reference slots only accept `""` or a member of
    /// their loaded list. While the list is loading the write is accepted and
    /// corrected on arrival; [`EditSession::validate`] refuses it until then.
    pub fn set_slot(&mut self, slot: SlotName, value: impl Into<String>) -> Result<()> {
        self.tracker.ensure_open()?;
        let value = value.into();
        let active = self.active_field()?;
        if !slot.is_scalar() || !active.descriptor.uses(slot) {
            return Err(EditorError::SlotNotUsed {
                slot,
                field_type: active.descriptor.key,
            });
        }
        self.check_reference(RefTarget::Slot(slot), &value)?;
        let active = self.active_field_mut()?;
        active.view.set_reference(RefTarget::Slot(slot), value);
        self.resolve();
        Ok(())
    }

    /// Write a reference held in the JSON blob, such as an inventory field ref.
    pub fn set_json_reference(&mut self, key: &'static str, value: impl Into<String>) -> Result<()> {
        self.tracker.ensure_open()?;
        let value = value.into();
        let target = RefTarget::JsonKey(key);
        let active = self.active_field()?;
        if active.view.reference(target).is_none() {
            return Err(EditorError::SlotNotUsed {
                slot: SlotName::MetaTypeJson,
                field_type: active.descriptor.key,
            });
        }
        self.check_reference(target, &value)?;
        self.active_field_mut()?.view.set_reference(target, value);
        Ok(())
    }

    pub fn set_lookup_mode(&mut self, mode: Option<LookupMode>) -> Result<()> {
        self.tracker.ensure_open()?;
        self.require_slot(SlotName::LookupMode)?.lookup_mode = mode;
        Ok(())
    }

    pub fn set_flag(&mut self, value: bool) -> Result<()> {
        self.tracker.ensure_open()?;
        self.require_slot(SlotName::BoolMeta1)?.bool_meta1 = value;
        Ok(())
    }

    /// Replace the `metaType4` values of a type whose array blob holds plain values.
    pub fn set_values(&mut self, values: Vec<Value>) -> Result<()> {
        self.tracker.ensure_open()?;
        let active = self.active_field()?;
        if active.descriptor.array_shape != ArrayShape::Values {
            return Err(EditorError::BlobShapeMismatch {
                slot: SlotName::MetaType4,
                field_type: active.descriptor.key,
            });
        }
        self.active_field_mut()?.view.array = ArrayBlob::Values(values);
        Ok(())
    }

    /// Replace the `metaTypeJson` blob. The blob must have the active type's
    /// shape, and any references it carries are validated like slot writes.
    pub fn set_json_blob(&mut self, blob: JsonBlob) -> Result<()> {
        self.tracker.ensure_open()?;
        let active = self.active_field()?;
        if std::mem::discriminant(&blob)
            != std::mem::discriminant(&JsonBlob::empty(active.descriptor.json_shape))
            || matches!(blob, JsonBlob::Unused)
        {
            return Err(EditorError::BlobShapeMismatch {
                slot: SlotName::MetaTypeJson,
                field_type: active.descriptor.key,
            });
        }

        let mut candidate = active.view.clone();
        candidate.json = blob;
        let json_targets: Vec<RefTarget> = active
            .descriptor
            .depends_on
            .iter()
            .map(|dep| dep.target)
            .filter(|target| matches!(target, RefTarget::JsonKey(_)))
            .collect();
        for target in json_targets {
            if let Some(value) = candidate.reference(target) {
                self.check_reference(target, value)?;
            }
        }
        self.active_field_mut()?.view = candidate;
        Ok(())
    }

    /// Append a filter row, seeded from the loaded lists when configured to.
    pub fn add_row(&mut self) -> Result<FilterRow> {
        self.tracker.ensure_open()?;
        self.require_filter_table()?;
        let source = self
            .resolver
            .loaded(ReferenceKind::SourceFields)
            .unwrap_or_default()
            .to_vec();
        let destination = self
            .resolver
            .loaded(ReferenceKind::DestinationFields)
            .unwrap_or_default()
            .to_vec();
        let seed = self.options.seed_new_rows;
        let rows = self.rows_mut()?;
        Ok(rows.add_row(&source, &destination, seed).clone())
    }

    /// Replace one cell of a filter row.
    pub fn update_cell(
        &mut self,
        row_id: &str,
        cell: FilterCell,
        value: impl Into<String>,
    ) -> Result<()> {
        self.tracker.ensure_open()?;
        self.require_filter_table()?;
        let list = cell
            .column()
            .map(|column| self.resolver.state(column.kind()))
            .and_then(ListState::for_validation)
            .map(<[RefItem]>::to_vec);
        let rows = self.rows_mut()?;
        rows.update_cell(row_id, cell, value, list.as_deref())?;
        Ok(())
    }

    pub fn remove_row(&mut self, row_id: &str) -> Result<FilterRow> {
        self.tracker.ensure_open()?;
        self.require_filter_table()?;
        Ok(self.rows_mut()?.remove_row(row_id)?)
    }

    /// Drop every filter row. Returns true if there were any.
    pub fn clear_rows(&mut self) -> Result<bool> {
        self.tracker.ensure_open()?;
        self.require_filter_table()?;
        Ok(self.rows_mut()?.clear())
    }

    /// Supply the owning form's own fields, which govern `DestFieldRef`.
    pub fn set_destination_fields(&mut self, items: Vec<RefItem>) -> Result<bool> {
        self.tracker.ensure_open()?;
        let view = self.active.as_mut().map(|active| &mut active.view);
        let changed = self.resolver.set_destination(items, view);
        if changed {
            debug!("destination references normalized");
        }
        Ok(changed)
    }

    /// Fetch the list of `kind` again, bypassing the cache. Any fetch still
    /// in flight for it becomes stale. Returns true if a fetch was queued.
    pub fn refresh_list(&mut self, kind: ReferenceKind) -> Result<bool> {
        self.tracker.ensure_open()?;
        self.active_field()?;
        if let Some(key) = self.resolver.unbind(kind) {
            self.cache.invalidate(&key);
            debug!(%key, "reference list refresh requested");
        }
        let queued = self.tickets.len();
        self.resolve();
        Ok(self.tickets.len() > queued)
    }

    /// Hand back the answer to a ticket.
    ///
    /// Answers from an earlier generation, or for a dependency that has moved
    /// on, are dropped. A failed fetch is applied as an empty list, recorded as
    /// a warning and never cached.
    pub fn apply_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: std::result::Result<Vec<RefItem>, ServiceError>,
    ) -> FetchDisposition {
        if self.tracker.is_closed() {
            debug!(key = %ticket.key, "fetch answer after close dropped");
            return FetchDisposition::Closed;
        }
        if !self.tracker.accepts(ticket.generation) {
            debug!(
                key = %ticket.key,
                ticket_generation = %ticket.generation,
                generation = %self.generation(),
                "fetch answer from previous generation dropped"
            );
            return FetchDisposition::OldGeneration;
        }

        let items: Arc<[RefItem]> = match result {
            Ok(items) => match self.cache.complete(&ticket.key, ticket.epoch, items.clone()) {
                Some(list) => list.items,
                None => items.into(),
            },
            Err(e) => {
                warn!(key = %ticket.key, error = %e, "reference list fetch failed");
                self.warnings.push(EditorWarning::ReferenceFetchFailed {
                    key: ticket.key.clone(),
                    message: e.to_string(),
                });
                Arc::from(Vec::new())
            }
        };

        let Some(active) = self.active.as_mut() else {
            return FetchDisposition::Stale;
        };
        match self
            .resolver
            .apply(ticket, items, &active.descriptor, &mut active.view)
        {
            ApplyOutcome::Stale => FetchDisposition::Stale,
            ApplyOutcome::Applied { changed } => {
                self.resolve();
                FetchDisposition::Applied { changed }
            }
        }
    }

    /// Check that the definition is complete enough to persist and that every
    /// stored reference is a member of its loaded list.
    pub fn validate(&self) -> Result<()> {
        if self.display_name.trim().is_empty() {
            return Err(EditorError::required("DisplayName"));
        }
        let active = self.active_field().map_err(|_| EditorError::required("ColumnType"))?;
        if self.entity_type_id.trim().is_empty() {
            return Err(EditorError::required("EntityTypeID"));
        }
        if active.descriptor.owns_filter_table && active.view.meta_type1.is_empty() {
            return Err(EditorError::required("metaType1"));
        }
        self.verify_references(active)
    }

    /// References written while their list was loading, or before the
    /// destination list was supplied, fail here until the list arrives.
    fn verify_references(&self, active: &ActiveField) -> Result<()> {
        for dependency in active.descriptor.depends_on {
            let Some(value) = active.view.reference(dependency.target) else {
                continue;
            };
            if !self.resolver.state(dependency.kind).verifies(value) {
                return Err(EditorError::invalid_reference(dependency.target, value));
            }
        }
        let Some(rows) = active.view.rows() else {
            return Ok(());
        };
        for row in rows.rows() {
            for column in [RowColumn::Source, RowColumn::Destination] {
                let value = row.reference(column);
                if !self.resolver.state(column.kind()).verifies(value) {
                    return Err(SchemaError::invalid_row_reference(&row.id, column, value).into());
                }
            }
        }
        Ok(())
    }

    /// The definition as it would be persisted now.
    pub fn definition(&self) -> Result<FieldDefinition> {
        let active = self.active_field()?;
        Ok(FieldDefinition {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            column_type: Some(active.descriptor.column_type),
            entity_type_id: self.entity_type_id.clone(),
            slots: codec::encode(&active.view, &active.descriptor)?,
        })
    }

    /// Validate, persist and close. The session stays open if persistence fails.
    pub async fn save(&mut self, store: &dyn FieldDefinitionStore) -> Result<PersistedId> {
        self.tracker.ensure_open()?;
        self.validate()?;
        if !self.is_settled() {
            debug!(
                pending = self.resolver.pending() + self.tickets.len(),
                "saving with reference fetches outstanding"
            );
        }
        let definition = self.definition()?;
        let persisted = match &self.id {
            Some(_) => store.update_field_definition(&definition).await?,
            None => store.insert_field_definition(&definition).await?,
        };
        info!(id = %persisted.id, "field definition saved");
        self.id = Some(persisted.id.clone());
        self.tracker.close();
        Ok(persisted)
    }

    /// Discard the session without saving.
    pub fn cancel(&mut self) {
        self.tickets.clear();
        self.tracker.close();
    }

    fn resolve(&mut self) {
        let generation = self.generation();
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let tickets = self.resolver.resolve(
            &active.descriptor,
            &mut active.view,
            &mut self.cache,
            generation,
        );
        self.tickets.extend(tickets);
    }

    fn check_reference(&self, target: RefTarget, value: &str) -> Result<()> {
        let Some(kind) = self.descriptor().and_then(|d| d.kind_of(target)) else {
            return Ok(());
        };
        if self.resolver.state(kind).admits(value) {
            Ok(())
        } else {
            Err(EditorError::invalid_reference(target, value))
        }
    }

    fn active_field(&self) -> Result<&ActiveField> {
        self.active.as_ref().ok_or(EditorError::NoFieldType)
    }

    fn active_field_mut(&mut self) -> Result<&mut ActiveField> {
        self.active.as_mut().ok_or(EditorError::NoFieldType)
    }

    fn require_slot(&mut self, slot: SlotName) -> Result<&mut TypedView> {
        let active = self.active_field_mut()?;
        if !active.descriptor.uses(slot) {
            return Err(EditorError::SlotNotUsed {
                slot,
                field_type: active.descriptor.key,
            });
        }
        Ok(&mut active.view)
    }

    fn require_filter_table(&self) -> Result<()> {
        let active = self.active_field()?;
        if active.descriptor.owns_filter_table {
            Ok(())
        } else {
            Err(EditorError::NoFilterTable {
                field_type: active.descriptor.key,
            })
        }
    }

    fn rows_mut(&mut self) -> Result<&mut FilterTable> {
        let active = self.active_field_mut()?;
        let field_type = active.descriptor.key;
        active
            .view
            .rows_mut()
            .ok_or(EditorError::NoFilterTable { field_type })
    }
}
