// src/table/grid.rs
// Render cache, visible row order, selection and scrolling

use std::collections::HashMap;

use ratatui::layout::Rect;

use crate::descriptor::DescriptorMap;

use super::format::{format_actions, format_name, format_value, ActionsMarkup, CellMarkup, FormatContext};
use super::row_model::{PropertyRow, RowId, RowModel, RowModelEvent};

const NAME_PERCENT: u16 = 35;
const MIN_NAME_WIDTH: u16 = 12;
pub const ACTIONS_WIDTH: u16 = 4;
const COLUMN_GAP: u16 = 1;
/// Header line above the rows and help line below them.
const CHROME_LINES: u16 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnWidths {
    pub name: u16,
    pub value: u16,
    pub actions: u16,
}

impl ColumnWidths {
    pub fn for_width(width: u16) -> Self {
        let actions = ACTIONS_WIDTH.min(width);
        let rest = width.saturating_sub(actions + 2 * COLUMN_GAP);
        let name = ((rest as u32 * NAME_PERCENT as u32 / 100) as u16).max(MIN_NAME_WIDTH).min(rest);
        Self {
            name,
            value: rest - name,
            actions,
        }
    }

    pub fn value_x(&self) -> u16 {
        self.name + COLUMN_GAP
    }

    pub fn actions_x(&self) -> u16 {
        self.value_x() + self.value + COLUMN_GAP
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedRow {
    pub name: CellMarkup,
    pub value: CellMarkup,
    pub actions: ActionsMarkup,
}

impl CachedRow {
    pub fn format(row: &PropertyRow, descriptors: &DescriptorMap, widths: ColumnWidths, ctx: FormatContext) -> Self {
        let descriptor = descriptors.get(&row.property);
        Self {
            name: format_name(row, descriptor, widths.name as usize),
            value: format_value(row, descriptor, widths.value as usize),
            actions: format_actions(row, descriptor, ctx),
        }
    }
}

/// Interior area of the bordered table.
pub fn inner_area(area: Rect) -> Rect {
    Rect::new(
        area.x.saturating_add(1),
        area.y.saturating_add(1),
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    )
}

#[derive(Debug, Default)]
pub struct GridView {
    area: Rect,
    widths: ColumnWidths,
    cache: HashMap<RowId, CachedRow>,
    order: Vec<RowId>,
    positions: HashMap<RowId, usize>,
    selected: usize,
    offset: usize,
    /// Rows re-formatted by the last sync, for inspection in tests.
    last_formatted: usize,
}

impl GridView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn widths(&self) -> ColumnWidths {
        self.widths
    }

    pub fn order(&self) -> &[RowId] {
        &self.order
    }

    pub fn cached(&self, id: RowId) -> Option<&CachedRow> {
        self.cache.get(&id)
    }

    pub fn last_formatted(&self) -> usize {
        self.last_formatted
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn selected_index(&self) -> Option<usize> {
        if self.order.is_empty() {
            None
        } else {
            Some(self.selected)
        }
    }

    pub fn selected_id(&self) -> Option<RowId> {
        self.order.get(self.selected).copied()
    }

    /// Rows that fit between the header and the help line.
    pub fn viewport_rows(&self) -> usize {
        inner_area(self.area).height.saturating_sub(CHROME_LINES) as usize
    }

    /// New container size: widths change, so every cached row is stale.
    pub fn resize(&mut self, area: Rect, model: &RowModel, descriptors: &DescriptorMap, ctx: FormatContext) {
        self.area = area;
        self.widths = ColumnWidths::for_width(inner_area(area).width);
        self.cache.clear();
        self.last_formatted = 0;
        for row in model.items() {
            self.cache.insert(row.id, CachedRow::format(row, descriptors, self.widths, ctx));
            self.last_formatted += 1;
        }
        self.scroll_to_selection();
    }

    /// Drain model notifications and re-format only the rows they name.
    pub fn sync(&mut self, model: &mut RowModel, descriptors: &DescriptorMap, ctx: FormatContext) {
        self.last_formatted = 0;
        let mut rebuild = false;

        for event in model.take_events() {
            match event {
                RowModelEvent::RowCountChanged { .. } => rebuild = true,
                RowModelEvent::RowsChanged(ids) => {
                    for id in ids {
                        match model.get_item_by_id(id) {
                            Some(row) => {
                                rebuild |= !row.hidden && !self.positions.contains_key(&id);
                                self.cache.insert(id, CachedRow::format(row, descriptors, self.widths, ctx));
                                self.last_formatted += 1;
                            }
                            None => {
                                self.cache.remove(&id);
                            }
                        }
                    }
                }
            }
        }

        if rebuild {
            let selected = self.selected_id();
            self.order = model.visible().map(|row| row.id).collect();
            self.positions = self.order.iter().enumerate().map(|(pos, &id)| (id, pos)).collect();
            self.cache.retain(|id, _| model.get_item_by_id(*id).is_some());
            match selected.and_then(|id| self.positions.get(&id).copied()) {
                Some(pos) => self.selected = pos,
                None => self.selected = self.selected.min(self.order.len().saturating_sub(1)),
            }
        }
        self.scroll_to_selection();
    }

    pub fn reset(&mut self) {
        self.cache.clear();
        self.order.clear();
        self.positions.clear();
        self.selected = 0;
        self.offset = 0;
    }

    pub fn select(&mut self, id: RowId) -> bool {
        match self.positions.get(&id).copied() {
            Some(pos) => {
                self.selected = pos;
                self.scroll_to_selection();
                true
            }
            None => false,
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.order.is_empty() {
            return;
        }
        let last = self.order.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, last) as usize;
        self.scroll_to_selection();
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_to_selection();
    }

    pub fn select_last(&mut self) {
        self.selected = self.order.len().saturating_sub(1);
        self.scroll_to_selection();
    }

    fn scroll_to_selection(&mut self) {
        let rows = self.viewport_rows().max(1);
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + rows {
            self.offset = self.selected + 1 - rows;
        }
        let max_offset = self.order.len().saturating_sub(rows);
        self.offset = self.offset.min(max_offset);
    }

    /// Visible slice of the row order, the only rows render draws.
    pub fn viewport(&self) -> &[RowId] {
        let end = (self.offset + self.viewport_rows()).min(self.order.len());
        &self.order[self.offset.min(end)..end]
    }

    /// Screen area of a row's value cell, when it is in the viewport.
    pub fn cell_area(&self, id: RowId) -> Option<Rect> {
        let index = *self.positions.get(&id)?;
        if index < self.offset || index >= self.offset + self.viewport_rows() {
            return None;
        }
        let inner = inner_area(self.area);
        Some(Rect::new(
            inner.x + self.widths.value_x(),
            inner.y + 1 + (index - self.offset) as u16,
            self.widths.value,
            1,
        ))
    }
}
