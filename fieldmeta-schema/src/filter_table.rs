//! Filter-Table: the editable grid of filter rows stored in `metaType4`.
//!
//! Each row maps a field of the chosen external entity type (the *source*
//! column) through an operator and free text onto a field of the owning form
//! (the *destination* column). The two reference columns are governed by two
//! different lists and are normalized independently.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;
use ulid::Ulid;

use crate::error::{Result, SchemaError};
use crate::reference::{contains, normalize_value, RefItem, ReferenceKind};
use crate::slot::de_canonical;

/// One row of the filter grid. Field names are the storage names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRow {
    #[serde(rename = "ID", default, deserialize_with = "de_canonical")]
    pub id: String,
    #[serde(rename = "SourceFieldRef", default, deserialize_with = "de_canonical")]
    pub source_field_ref: String,
    #[serde(rename = "Operator", default, deserialize_with = "de_canonical")]
    pub operator: String,
    #[serde(rename = "FilterText", default, deserialize_with = "de_canonical")]
    pub filter_text: String,
    #[serde(rename = "DestFieldRef", default, deserialize_with = "de_canonical")]
    pub dest_field_ref: String,
}

impl FilterRow {
    /// Value of one of the two reference columns.
    pub fn reference(&self, column: RowColumn) -> &str {
        match column {
            RowColumn::Source => &self.source_field_ref,
            RowColumn::Destination => &self.dest_field_ref,
        }
    }

    fn reference_mut(&mut self, column: RowColumn) -> &mut String {
        match column {
            RowColumn::Source => &mut self.source_field_ref,
            RowColumn::Destination => &mut self.dest_field_ref,
        }
    }
}

/// The two reference columns of a filter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RowColumn {
    Source,
    Destination,
}

impl RowColumn {
    /// The list kind that governs this column.
    pub const fn kind(self) -> ReferenceKind {
        match self {
            RowColumn::Source => ReferenceKind::SourceFields,
            RowColumn::Destination => ReferenceKind::DestinationFields,
        }
    }

    /// The column governed by `kind`, if any.
    pub fn for_kind(kind: ReferenceKind) -> Option<Self> {
        match kind {
            ReferenceKind::SourceFields => Some(RowColumn::Source),
            ReferenceKind::DestinationFields => Some(RowColumn::Destination),
            _ => None,
        }
    }
}

impl fmt::Display for RowColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowColumn::Source => f.write_str("SourceFieldRef"),
            RowColumn::Destination => f.write_str("DestFieldRef"),
        }
    }
}

/// An editable cell of a filter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterCell {
    SourceFieldRef,
    Operator,
    FilterText,
    DestFieldRef,
}

impl FilterCell {
    /// The reference column behind this cell, for the two validated cells.
    pub const fn column(self) -> Option<RowColumn> {
        match self {
            FilterCell::SourceFieldRef => Some(RowColumn::Source),
            FilterCell::DestFieldRef => Some(RowColumn::Destination),
            FilterCell::Operator | FilterCell::FilterText => None,
        }
    }
}

/// The ordered rows of a filter grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterTable {
    rows: Vec<FilterRow>,
}

impl FilterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from decoded rows, giving ID-less or duplicate-ID rows a
    /// deterministic `legacy-<index>` ID so decoding stays a pure function.
    pub fn from_rows(mut rows: Vec<FilterRow>) -> Self {
        let mut seen = HashSet::new();
        for (index, row) in rows.iter_mut().enumerate() {
            if row.id.is_empty() || !seen.insert(row.id.clone()) {
                let mut id = format!("legacy-{index}");
                let mut attempt = 0;
                while seen.contains(&id) {
                    attempt += 1;
                    id = format!("legacy-{index}-{attempt}");
                }
                seen.insert(id.clone());
                row.id = id;
            }
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[FilterRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row_id: &str) -> Option<&FilterRow> {
        self.rows.iter().find(|row| row.id == row_id)
    }

    /// Append a row. When `seed` is set, each reference column starts at the
    /// first item of its list (or `""` when that list is empty).
    pub fn add_row(&mut self, source: &[RefItem], destination: &[RefItem], seed: bool) -> &FilterRow {
        let first = |list: &[RefItem]| {
            if seed {
                list.first().map(|item| item.id.clone()).unwrap_or_default()
            } else {
                String::new()
            }
        };
        let row = FilterRow {
            id: Ulid::new().to_string(),
            source_field_ref: first(source),
            operator: String::new(),
            filter_text: String::new(),
            dest_field_ref: first(destination),
        };
        debug!(row_id = %row.id, "filter row added");
        self.rows.push(row);
        &self.rows[self.rows.len() - 1]
    }

    /// Replace one cell of a row.
    ///
    /// Reference cells only accept `""` or a member of the column's list;
    /// anything else is rejected and the row is left untouched. Pass `None`
    /// while the governing list is still loading: the write is accepted and
    /// corrected when the list arrives.
    pub fn update_cell(
        &mut self,
        row_id: &str,
        cell: FilterCell,
        value: impl Into<String>,
        list: Option<&[RefItem]>,
    ) -> Result<()> {
        let value = value.into();
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.id == row_id)
            .ok_or_else(|| SchemaError::RowNotFound {
                row_id: row_id.to_string(),
            })?;

        if let (Some(column), Some(list)) = (cell.column(), list) {
            if !value.is_empty() && !contains(list, &value) {
                return Err(SchemaError::invalid_row_reference(row_id, column, value));
            }
        }

        let mut updated = row.clone();
        match cell {
            FilterCell::SourceFieldRef => updated.source_field_ref = value,
            FilterCell::Operator => updated.operator = value,
            FilterCell::FilterText => updated.filter_text = value,
            FilterCell::DestFieldRef => updated.dest_field_ref = value,
        }
        *row = updated;
        Ok(())
    }

    /// Remove a row by ID.
    pub fn remove_row(&mut self, row_id: &str) -> Result<FilterRow> {
        let index = self
            .rows
            .iter()
            .position(|row| row.id == row_id)
            .ok_or_else(|| SchemaError::RowNotFound {
                row_id: row_id.to_string(),
            })?;
        Ok(self.rows.remove(index))
    }

    /// Drop every row. Returns true if anything was removed.
    pub fn clear(&mut self) -> bool {
        let changed = !self.rows.is_empty();
        self.rows.clear();
        changed
    }

    /// Re-validate one reference column of every row against `list`.
    /// Returns true if any row changed.
    pub fn normalize_against(&mut self, column: RowColumn, list: &[RefItem]) -> bool {
        let mut changed = false;
        for row in &mut self.rows {
            if let Some(replacement) = normalize_value(row.reference(column), list) {
                debug!(
                    row_id = %row.id,
                    %column,
                    from = %row.reference(column),
                    to = %replacement,
                    "filter row reference normalized"
                );
                *row.reference_mut(column) = replacement;
                changed = true;
            }
        }
        changed
    }

    /// True when every non-empty reference in `column` is a member of `list`.
    pub fn is_consistent(&self, column: RowColumn, list: &[RefItem]) -> bool {
        self.rows.iter().all(|row| {
            let value = row.reference(column);
            value.is_empty() || contains(list, value)
        })
    }
}

/// Pure form of [`FilterTable::normalize_against`]: returns the normalized
/// rows and whether anything changed.
pub fn normalize_rows(
    rows: &[FilterRow],
    column: RowColumn,
    list: &[RefItem],
) -> (Vec<FilterRow>, bool) {
    let mut table = FilterTable {
        rows: rows.to_vec(),
    };
    let changed = table.normalize_against(column, list);
    (table.rows, changed)
}
