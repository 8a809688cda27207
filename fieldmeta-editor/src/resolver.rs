//! Cascading Reference Resolver.
//!
//! For every reference kind the active field type declares, the resolver
//! tracks the dependency key the current slot values imply, the fetch in
//! flight for that key, and the list that was last applied. Whenever a key
//! changes it either applies a cached list or issues a [`FetchTicket`], and
//! it normalizes every slot and row column governed by a list as soon as
//! that list arrives. Normalizing `metaType1` may change the source-field
//! key, so resolution repeats until nothing moves.

use std::collections::BTreeMap;
use std::sync::Arc;

use fieldmeta_schema::{
    normalize_value, FieldTypeDescriptor, ListKey, RefItem, ReferenceKind, RowColumn, TypedView,
};
use serde::Serialize;
use tracing::{debug, trace};

use crate::cache::ReferenceListCache;
use crate::generation::Generation;

/// A request to fetch one reference list, tagged so the answer can be
/// checked for staleness when it comes back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FetchTicket {
    pub key: ListKey,
    pub kind: ReferenceKind,
    pub epoch: u64,
    pub generation: Generation,
}

/// What a reference kind's list currently looks like to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState<'a> {
    Loaded(&'a [RefItem]),
    /// A fetch is in flight, or the caller has not supplied the list yet
    Loading,
    /// The dependency is empty; only `""` is a valid reference
    Absent,
}

impl<'a> ListState<'a> {
    /// The list to validate against, `None` while loading.
    pub fn for_validation(self) -> Option<&'a [RefItem]> {
        match self {
            ListState::Loaded(list) => Some(list),
            ListState::Loading => None,
            ListState::Absent => Some(&[]),
        }
    }

    /// True if `value` is known to be valid: empty, or a member of a loaded
    /// list. Nothing non-empty is verified while the list is loading.
    pub fn verifies(self, value: &str) -> bool {
        value.is_empty()
            || matches!(self, ListState::Loaded(list) if list.iter().any(|item| item.id == value))
    }

    /// True if `value` may be written now.
    pub fn admits(self, value: &str) -> bool {
        value.is_empty()
            || self
                .for_validation()
                .map_or(true, |list| list.iter().any(|item| item.id == value))
    }
}

/// Result of offering a completed fetch to the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The dependency moved on, or a newer fetch for the key is in flight
    Stale,
    Applied { changed: bool },
}

#[derive(Debug, Clone, Default)]
struct Binding {
    bound: bool,
    key: Option<ListKey>,
    pending: Option<u64>,
    list: Option<Arc<[RefItem]>>,
}

#[derive(Debug, Clone, Default)]
pub struct CascadingResolver {
    bindings: BTreeMap<ReferenceKind, Binding>,
    destination: Option<Arc<[RefItem]>>,
}

impl CascadingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all fetched-list state. The caller-supplied destination list
    /// belongs to the owning form and survives.
    pub fn reset(&mut self) {
        self.bindings.clear();
    }

    /// Forget the binding of `kind` so the next resolve fetches it again.
    /// Returns the key it was bound to.
    pub fn unbind(&mut self, kind: ReferenceKind) -> Option<ListKey> {
        self.bindings.remove(&kind).and_then(|binding| binding.key)
    }

    /// The key a kind's list is fetched under, given the current slot values.
    pub fn dependency_key(kind: ReferenceKind, view: &TypedView) -> Option<ListKey> {
        match kind {
            ReferenceKind::EntityTypes => Some(ListKey::EntityTypes),
            ReferenceKind::SourceFields if view.meta_type1.is_empty() => None,
            ReferenceKind::SourceFields => Some(ListKey::EntityFields(view.meta_type1.clone())),
            ReferenceKind::Enum(name) => Some(ListKey::Enum(name.to_string())),
            ReferenceKind::DestinationFields => None,
        }
    }

    /// Bring every binding in line with the current slot values and return
    /// the fetches that are now needed.
    pub fn resolve(
        &mut self,
        descriptor: &FieldTypeDescriptor,
        view: &mut TypedView,
        cache: &mut ReferenceListCache,
        generation: Generation,
    ) -> Vec<FetchTicket> {
        let kinds: Vec<ReferenceKind> = descriptor
            .reference_kinds()
            .into_iter()
            .filter(|kind| !kind.is_caller_supplied())
            .collect();
        let mut tickets = Vec::new();

        loop {
            let mut changed = false;
            for &kind in &kinds {
                let key = Self::dependency_key(kind, view);
                let binding = self.bindings.entry(kind).or_default();
                if binding.bound && binding.key == key {
                    continue;
                }
                trace!(%kind, from = ?binding.key, to = ?key, "dependency changed");
                *binding = Binding {
                    bound: true,
                    key: key.clone(),
                    pending: None,
                    list: None,
                };

                let Some(key) = key else {
                    changed |= discard(kind, descriptor, view);
                    continue;
                };
                match cache.get(&key) {
                    Some(list) => {
                        debug!(%key, %kind, "reference list served from cache");
                        changed |= normalize(kind, &list.items, descriptor, view);
                        binding.list = Some(list.items);
                    }
                    None => {
                        let epoch = cache.begin_fetch(&key);
                        binding.pending = Some(epoch);
                        tickets.push(FetchTicket {
                            key,
                            kind,
                            epoch,
                            generation,
                        });
                    }
                }
            }
            if !changed {
                break;
            }
        }
        tickets
    }

    /// Apply a fetched list if the ticket still matches its binding.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        items: Arc<[RefItem]>,
        descriptor: &FieldTypeDescriptor,
        view: &mut TypedView,
    ) -> ApplyOutcome {
        let Some(binding) = self.bindings.get_mut(&ticket.kind) else {
            return ApplyOutcome::Stale;
        };
        if binding.key.as_ref() != Some(&ticket.key) || binding.pending != Some(ticket.epoch) {
            debug!(
                key = %ticket.key,
                epoch = ticket.epoch,
                current = ?binding.key,
                "stale reference list discarded"
            );
            return ApplyOutcome::Stale;
        }
        binding.pending = None;
        let changed = normalize(ticket.kind, &items, descriptor, view);
        binding.list = Some(items);
        ApplyOutcome::Applied { changed }
    }

    /// Install the owning form's field list and normalize destination columns.
    pub fn set_destination(&mut self, items: Vec<RefItem>, view: Option<&mut TypedView>) -> bool {
        let items: Arc<[RefItem]> = items.into();
        let changed = match view.and_then(TypedView::rows_mut) {
            Some(rows) => rows.normalize_against(RowColumn::Destination, &items),
            None => false,
        };
        self.destination = Some(items);
        changed
    }

    /// Current list state of `kind`.
    pub fn state(&self, kind: ReferenceKind) -> ListState<'_> {
        if kind == ReferenceKind::DestinationFields {
            return match &self.destination {
                Some(list) => ListState::Loaded(&list[..]),
                None => ListState::Loading,
            };
        }
        match self.bindings.get(&kind) {
            Some(Binding {
                list: Some(list), ..
            }) => ListState::Loaded(&list[..]),
            Some(Binding {
                pending: Some(_), ..
            }) => ListState::Loading,
            Some(Binding { key: None, .. }) => ListState::Absent,
            _ => ListState::Loading,
        }
    }

    /// The loaded list of `kind`, if any.
    pub fn loaded(&self, kind: ReferenceKind) -> Option<&[RefItem]> {
        match self.state(kind) {
            ListState::Loaded(list) => Some(list),
            _ => None,
        }
    }

    /// Number of fetches whose answers are still awaited.
    pub fn pending(&self) -> usize {
        self.bindings
            .values()
            .filter(|binding| binding.pending.is_some())
            .count()
    }
}

/// Normalize everything governed by `kind` against `items`.
fn normalize(
    kind: ReferenceKind,
    items: &[RefItem],
    descriptor: &FieldTypeDescriptor,
    view: &mut TypedView,
) -> bool {
    let mut changed = false;
    for target in descriptor.targets_of(kind) {
        let replacement = view
            .reference(target)
            .and_then(|current| normalize_value(current, items));
        if let Some(value) = replacement {
            debug!(%target, to = %value, "reference normalized");
            view.set_reference(target, value);
            changed = true;
        }
    }
    if descriptor.owns_filter_table {
        if let (Some(column), Some(rows)) = (RowColumn::for_kind(kind), view.rows_mut()) {
            changed |= rows.normalize_against(column, items);
        }
    }
    changed
}

/// Clear everything governed by `kind` after its dependency became empty.
fn discard(kind: ReferenceKind, descriptor: &FieldTypeDescriptor, view: &mut TypedView) -> bool {
    let mut changed = false;
    for target in descriptor.targets_of(kind) {
        if view.reference(target).is_some_and(|value| !value.is_empty()) {
            view.set_reference(target, "");
            changed = true;
        }
    }
    if kind == ReferenceKind::SourceFields {
        if let Some(rows) = view.rows_mut() {
            if rows.clear() {
                debug!("filter rows cleared with their source list");
                changed = true;
            }
        }
    }
    changed
}
