// src/editor/mod.rs
// Cell editors: one lifecycle, three editing strategies

pub mod choice;
pub mod expression;
pub mod text;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;

use crate::descriptor::PropertyDescriptor;
use crate::table::row_model::{PropertyRow, RowId};

use choice::ChoiceEditState;
use text::TextEditState;

/// Shown instead of a sensitive value. Never written back as the value.
pub const SENSITIVE_PLACEHOLDER: &str = "Sensitive value set";

const MIN_SURFACE_WIDTH: u16 = 30;
const TEXT_LINES: u16 = 5;
const MAX_CHOICE_LINES: u16 = 10;

/// Which strategy a descriptor calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKindTag {
    Plain,
    Expression,
    Choice,
}

/// Allowable values win over everything; properties without a descriptor
/// yet (usually dynamic ones) get the expression editor.
pub fn select_kind(descriptor: Option<&PropertyDescriptor>) -> EditorKindTag {
    match descriptor {
        Some(d) if d.has_allowable_values() => EditorKindTag::Choice,
        None => EditorKindTag::Expression,
        Some(d) if d.supports_el => EditorKindTag::Expression,
        Some(_) => EditorKindTag::Plain,
    }
}

#[derive(Debug, Clone)]
pub enum EditorKind {
    Plain(TextEditState),
    Expression(TextEditState),
    Choice(ChoiceEditState),
}

/// What a keystroke asks of the hosting table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorInput {
    None,
    Changed,
    Commit,
    Cancel,
    /// The synthetic "create new service" option was chosen
    CreateService(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub message: Option<String>,
}

/// Result of [`CellEditor::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommit {
    pub value: Option<String>,
    pub dirty: bool,
}

/// Floating, movable surface anchored near the edited cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSurface {
    pub anchor: Rect,
    pub offset: (i32, i32),
    pub extra_height: u16,
}

impl EditorSurface {
    /// Screen area for a surface whose body needs `body_height` lines,
    /// clamped into `bounds`.
    pub fn area(&self, bounds: Rect, body_height: u16) -> Rect {
        let width = self.anchor.width.max(MIN_SURFACE_WIDTH).min(bounds.width);
        let height = (body_height + self.extra_height + 2).min(bounds.height);

        let max_x = (bounds.x + bounds.width).saturating_sub(width) as i32;
        let max_y = (bounds.y + bounds.height).saturating_sub(height) as i32;
        let x = (self.anchor.x as i32 + self.offset.0).clamp(bounds.x as i32, max_x.max(bounds.x as i32));
        let y = (self.anchor.y as i32 - 1 + self.offset.1).clamp(bounds.y as i32, max_y.max(bounds.y as i32));

        Rect::new(x as u16, y as u16, width, height)
    }
}

#[derive(Debug, Clone)]
pub struct CellEditor {
    row_id: RowId,
    property: String,
    display_name: String,
    descriptor: Option<PropertyDescriptor>,
    /// Value the row held when the editor opened.
    previous_value: Option<String>,
    surface: EditorSurface,
    kind: EditorKind,
    destroyed: bool,
}

impl CellEditor {
    /// Bind an editor to `row`, choosing the strategy from `descriptor`.
    pub fn open(row: &PropertyRow, descriptor: Option<&PropertyDescriptor>, anchor: Rect) -> Self {
        let value = row.value.as_deref();
        let sensitive = descriptor.map_or(false, |d| d.sensitive);

        let kind = match (select_kind(descriptor), descriptor) {
            (EditorKindTag::Choice, Some(d)) => {
                EditorKind::Choice(ChoiceEditState::load(d, value, row.previous_value.as_deref()))
            }
            (EditorKindTag::Plain, _) => EditorKind::Plain(TextEditState::load(value, sensitive)),
            _ => EditorKind::Expression(TextEditState::load(value, sensitive)),
        };

        Self {
            row_id: row.id,
            property: row.property.clone(),
            display_name: row.display_name.clone(),
            descriptor: descriptor.cloned(),
            previous_value: row.value.clone(),
            surface: EditorSurface { anchor, offset: (0, 0), extra_height: 0 },
            kind,
            destroyed: false,
        }
    }

    pub fn row_id(&self) -> RowId {
        self.row_id
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn descriptor(&self) -> Option<&PropertyDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn kind(&self) -> &EditorKind {
        &self.kind
    }

    pub fn kind_tag(&self) -> EditorKindTag {
        match self.kind {
            EditorKind::Plain(_) => EditorKindTag::Plain,
            EditorKind::Expression(_) => EditorKindTag::Expression,
            EditorKind::Choice(_) => EditorKindTag::Choice,
        }
    }

    pub fn surface(&self) -> &EditorSurface {
        &self.surface
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Lines the surface body needs (without borders).
    pub fn body_height(&self) -> u16 {
        match &self.kind {
            // text, checkbox, buttons
            EditorKind::Plain(_) | EditorKind::Expression(_) => TEXT_LINES + 2,
            // options, description, buttons
            EditorKind::Choice(state) => (state.options().len() as u16).min(MAX_CHOICE_LINES) + 3,
        }
    }

    pub fn serialize(&self) -> Option<String> {
        match &self.kind {
            EditorKind::Plain(state) | EditorKind::Expression(state) => {
                state.resolve(self.descriptor.as_ref(), self.previous_value.as_deref())
            }
            EditorKind::Choice(state) => state.selected_value(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        match &self.kind {
            EditorKind::Choice(state) => state.is_value_changed(),
            _ => self.serialize() != self.previous_value,
        }
    }

    /// Always valid. Properties are validated server-side on save.
    pub fn validate(&self) -> Validation {
        Validation { valid: true, message: None }
    }

    /// Resolve the value to write back. The caller applies it and destroys
    /// the editor.
    pub fn commit(&self) -> EditorCommit {
        EditorCommit {
            value: self.serialize(),
            dirty: self.is_dirty(),
        }
    }

    /// Restore the initial content. The row is never touched.
    pub fn cancel(&mut self) {
        match &mut self.kind {
            EditorKind::Plain(state) | EditorKind::Expression(state) => state.reset(),
            EditorKind::Choice(state) => state.reset(),
        }
    }

    /// Idempotent.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    /// Drag the surface.
    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.surface.offset.0 += dx;
        self.surface.offset.1 += dy;
    }

    /// Only the expression editor is resizable.
    pub fn resize_by(&mut self, dh: i32) {
        if let EditorKind::Expression(_) = self.kind {
            self.surface.extra_height = (self.surface.extra_height as i32 + dh).clamp(0, 20) as u16;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorInput {
        if self.destroyed {
            return EditorInput::None;
        }

        if key.modifiers.contains(KeyModifiers::ALT) {
            let moved = match key.code {
                KeyCode::Left => Some((-2, 0)),
                KeyCode::Right => Some((2, 0)),
                KeyCode::Up => Some((0, -1)),
                KeyCode::Down => Some((0, 1)),
                _ => None,
            };
            if let Some((dx, dy)) = moved {
                self.move_by(dx, dy);
                return EditorInput::Changed;
            }
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Down => {
                    self.resize_by(1);
                    return EditorInput::Changed;
                }
                KeyCode::Up => {
                    self.resize_by(-1);
                    return EditorInput::Changed;
                }
                _ => {}
            }
        }

        let service_type = self
            .descriptor
            .as_ref()
            .and_then(|d| d.identifies_controller_service.as_deref());

        match &mut self.kind {
            EditorKind::Plain(state) | EditorKind::Expression(state) => state.handle_key(key),
            EditorKind::Choice(state) => state.handle_key(key, service_type),
        }
    }
}
