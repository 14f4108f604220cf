// src/table/add_property.rs
// Dialog and flow for adding a user-defined property

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    prelude::{Color, Style, Widget},
    widgets::{Block, Borders, Clear},
};
use tracing::{debug, warn};

use crate::editor::text::TextEditState;
use crate::editor::EditorInput;
use crate::request::TableRequest;

use super::row_model::RowPatch;
use super::{Dialog, Notice, Pending, PropertyTable};

pub const NAME_REQUIRED: &str = "Property name must be specified.";
pub const NAME_EXISTS: &str = "A property with this name already exists.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddPropertyAction {
    None,
    Changed,
    Confirm(String),
    Cancel,
}

#[derive(Debug, Clone)]
pub struct AddPropertyDialog {
    name: TextEditState,
}

impl Default for AddPropertyDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl AddPropertyDialog {
    pub fn new() -> Self {
        Self {
            name: TextEditState::load(None, false),
        }
    }

    pub fn name(&self) -> &str {
        self.name.text()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> AddPropertyAction {
        match key.code {
            KeyCode::Esc => AddPropertyAction::Cancel,
            KeyCode::Enter => AddPropertyAction::Confirm(self.name.text().to_string()),
            // single line, no tabs
            KeyCode::Tab => AddPropertyAction::None,
            _ => match self.name.handle_key(key) {
                EditorInput::Changed => AddPropertyAction::Changed,
                _ => AddPropertyAction::None,
            },
        }
    }

    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Add Property ");
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height < 2 {
            return;
        }

        let (before, after) = split_at_char(self.name.text(), self.name.cursor());
        let display = format!("Property Name: {}│{}", before, after);
        buf.set_string(inner.x + 1, inner.y, &display, Style::default().fg(Color::Green));

        buf.set_string(
            inner.x + 1,
            inner.bottom().saturating_sub(1),
            "Enter: Add | Esc: Cancel",
            Style::default().fg(Color::DarkGray),
        );
    }
}

fn split_at_char(text: &str, chars: usize) -> (&str, &str) {
    let at = text.char_indices().nth(chars).map_or(text.len(), |(idx, _)| idx);
    text.split_at(at)
}

impl PropertyTable {
    /// Needs an editable table with a dialog container. Any open edit is
    /// committed first.
    pub fn open_add_property_dialog(&mut self) -> bool {
        if self.config.read_only || self.config.dialog_container.is_none() {
            return false;
        }
        self.save_row();
        self.dialog = Some(Dialog::AddProperty(AddPropertyDialog::new()));
        true
    }

    /// Confirmed name from the add-property dialog.
    pub fn add_property(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            // dialog stays open for another try
            self.show_notice(Notice::info("Configuration Error", NAME_REQUIRED));
            return;
        }
        self.dialog = None;

        let existing = self.model.find_by_key(name).map(|row| (row.id, row.hidden));
        match existing {
            Some((id, false)) => {
                self.grid.select(id);
                self.show_notice(Notice::info("Property Exists", NAME_EXISTS));
            }
            Some((id, true)) => {
                debug!(property = name, "restoring deleted property");
                let patch = RowPatch::default().hidden(false).value(None).previous_value(None);
                if let Err(e) = self.model.update_item(id, patch) {
                    warn!("could not restore property: {}", e);
                    return;
                }
                self.sync_grid();
                self.grid.select(id);
                self.open_editor(id);
            }
            None => {
                let token = self.tokens.next();
                self.pending.insert(token, Pending::AddProperty { name: name.to_string() });
                self.requests.push(TableRequest::ResolveDescriptor {
                    token,
                    property: name.to_string(),
                });
            }
        }
    }
}
