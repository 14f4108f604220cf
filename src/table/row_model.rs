// src/table/row_model.rs
// Ordered property rows with a visibility filter and change notifications

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PropertyTableError, Result};

pub type RowId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    /// Can never be hidden or removed by the user
    Required,
    Optional,
    /// Added ad hoc, may be soft-deleted
    UserDefined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRow {
    pub id: RowId,
    pub property: String,
    pub display_name: String,
    /// `None` is unset, `Some("")` is an explicit empty string.
    pub value: Option<String>,
    pub previous_value: Option<String>,
    pub kind: PropertyKind,
    /// Soft-delete marker, the row is kept until the form is saved or cleared.
    pub hidden: bool,
}

impl PropertyRow {
    pub fn is_dirty(&self) -> bool {
        self.value != self.previous_value
    }
}

/// A row before the model has given it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPropertyRow {
    pub property: String,
    pub display_name: String,
    pub value: Option<String>,
    pub previous_value: Option<String>,
    pub kind: PropertyKind,
    pub hidden: bool,
}

impl NewPropertyRow {
    /// Visible row whose current and previous values are both `value`.
    pub fn new(property: &str, display_name: &str, value: Option<String>, kind: PropertyKind) -> Self {
        Self {
            property: property.to_string(),
            display_name: display_name.to_string(),
            previous_value: value.clone(),
            value,
            kind,
            hidden: false,
        }
    }
}

/// Partial update merged by [`RowModel::update_item`]. Identity fields are not patchable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPatch {
    pub display_name: Option<String>,
    pub value: Option<Option<String>>,
    pub previous_value: Option<Option<String>>,
    pub kind: Option<PropertyKind>,
    pub hidden: Option<bool>,
}

impl RowPatch {
    pub fn value(mut self, value: Option<String>) -> Self {
        self.value = Some(value);
        self
    }

    pub fn previous_value(mut self, value: Option<String>) -> Self {
        self.previous_value = Some(value);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn display_name(mut self, display_name: &str) -> Self {
        self.display_name = Some(display_name.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowModelEvent {
    /// The number of visible rows changed
    RowCountChanged { previous: usize, current: usize },
    /// These rows changed content or visibility
    RowsChanged(Vec<RowId>),
}

#[derive(Debug, Default)]
pub struct RowModel {
    rows: Vec<PropertyRow>,
    by_key: HashMap<String, usize>,
    by_id: HashMap<RowId, usize>,
    next_id: RowId,
    visible_count: usize,
    events: Vec<RowModelEvent>,
}

impl RowModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every row. Ids keep counting up from the previous set. A
    /// repeated key rejects the whole set and leaves the model untouched.
    pub fn set_items(&mut self, rows: Vec<NewPropertyRow>) -> Result<()> {
        let mut keys = HashSet::with_capacity(rows.len());
        if let Some(duplicate) = rows.iter().find(|row| !keys.insert(row.property.as_str())) {
            return Err(PropertyTableError::DuplicateProperty {
                key: duplicate.property.clone(),
                hidden: duplicate.hidden,
            });
        }

        let previous = self.visible_count;

        self.rows.clear();
        self.by_key.clear();
        self.by_id.clear();
        self.visible_count = 0;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            ids.push(self.insert(row)?);
        }

        self.notify_count(previous);
        if !ids.is_empty() {
            self.events.push(RowModelEvent::RowsChanged(ids));
        }
        Ok(())
    }

    /// Append a row. Keys are unique across hidden and visible rows; callers
    /// check [`RowModel::find_by_key`] first and unhide instead.
    pub fn add_item(&mut self, row: NewPropertyRow) -> Result<RowId> {
        let previous = self.visible_count;
        let id = self.insert(row)?;
        self.notify_count(previous);
        self.events.push(RowModelEvent::RowsChanged(vec![id]));
        Ok(id)
    }

    fn insert(&mut self, row: NewPropertyRow) -> Result<RowId> {
        if let Some(&pos) = self.by_key.get(&row.property) {
            return Err(PropertyTableError::DuplicateProperty {
                key: row.property,
                hidden: self.rows[pos].hidden,
            });
        }

        let id = self.next_id;
        self.next_id += 1;

        let pos = self.rows.len();
        self.by_key.insert(row.property.clone(), pos);
        self.by_id.insert(id, pos);
        if !row.hidden {
            self.visible_count += 1;
        }

        self.rows.push(PropertyRow {
            id,
            property: row.property,
            display_name: row.display_name,
            value: row.value,
            previous_value: row.previous_value,
            kind: row.kind,
            hidden: row.hidden,
        });
        Ok(id)
    }

    pub fn update_item(&mut self, id: RowId, patch: RowPatch) -> Result<()> {
        let pos = *self.by_id.get(&id).ok_or(PropertyTableError::UnknownRow(id))?;
        let previous = self.visible_count;
        let row = &mut self.rows[pos];

        if let Some(display_name) = patch.display_name {
            row.display_name = display_name;
        }
        if let Some(value) = patch.value {
            row.value = value;
        }
        if let Some(previous_value) = patch.previous_value {
            row.previous_value = previous_value;
        }
        if let Some(kind) = patch.kind {
            row.kind = kind;
        }
        if let Some(hidden) = patch.hidden {
            if hidden != row.hidden {
                row.hidden = hidden;
                if hidden {
                    self.visible_count -= 1;
                } else {
                    self.visible_count += 1;
                }
            }
        }

        debug!(row = id, property = %self.rows[pos].property, "row updated");
        self.notify_count(previous);
        self.events.push(RowModelEvent::RowsChanged(vec![id]));
        Ok(())
    }

    pub fn clear(&mut self) {
        let previous = self.visible_count;
        self.rows.clear();
        self.by_key.clear();
        self.by_id.clear();
        self.visible_count = 0;
        self.notify_count(previous);
    }

    fn notify_count(&mut self, previous: usize) {
        if previous != self.visible_count {
            self.events.push(RowModelEvent::RowCountChanged {
                previous,
                current: self.visible_count,
            });
        }
    }

    pub fn find_by_key(&self, key: &str) -> Option<&PropertyRow> {
        self.by_key.get(key).map(|&pos| &self.rows[pos])
    }

    pub fn get_item_by_id(&self, id: RowId) -> Option<&PropertyRow> {
        self.by_id.get(&id).map(|&pos| &self.rows[pos])
    }

    /// Position of a row among the visible rows.
    pub fn row_index_of(&self, id: RowId) -> Option<usize> {
        self.visible().position(|row| row.id == id)
    }

    /// Every row, hidden ones included, in insertion order.
    pub fn items(&self) -> &[PropertyRow] {
        &self.rows
    }

    /// Rows passing the filter (`hidden == false`), in insertion order.
    pub fn visible(&self) -> impl Iterator<Item = &PropertyRow> {
        self.rows.iter().filter(|row| !row.hidden)
    }

    pub fn visible_len(&self) -> usize {
        self.visible_count
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drain pending notifications.
    pub fn take_events(&mut self) -> Vec<RowModelEvent> {
        std::mem::take(&mut self.events)
    }
}
