// src/editor/text.rs
// Text buffer shared by the plain and expression editors

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::descriptor::PropertyDescriptor;

use super::{EditorInput, SENSITIVE_PLACEHOLDER};

#[derive(Debug, Clone)]
pub struct TextEditState {
    buffer: String,
    /// Cursor position in chars, not bytes.
    cursor: usize,
    initial: String,
    initial_empty_requested: bool,
    initial_placeholder_active: bool,
    /// "Set empty string" checkbox.
    pub empty_string_requested: bool,
    /// True until the first editing keystroke on a sensitive property.
    pub sensitive_placeholder_active: bool,
}

impl TextEditState {
    /// Seed the buffer from the row value. A set sensitive value is replaced
    /// by the placeholder and a non-sensitive `Some("")` pre-checks the
    /// empty-string box.
    pub fn load(value: Option<&str>, sensitive: bool) -> Self {
        let (initial, empty_requested) = match value {
            Some(_) if sensitive => (SENSITIVE_PLACEHOLDER.to_string(), false),
            Some(v) => (v.to_string(), v.is_empty()),
            None => (String::new(), false),
        };

        Self {
            cursor: initial.chars().count(),
            buffer: initial.clone(),
            initial,
            initial_empty_requested: empty_requested,
            empty_string_requested: empty_requested,
            initial_placeholder_active: sensitive,
            sensitive_placeholder_active: sensitive,
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Put the initial content back, as on cancel.
    pub fn reset(&mut self) {
        self.buffer = self.initial.clone();
        self.cursor = self.buffer.chars().count();
        self.empty_string_requested = self.initial_empty_requested;
        self.sensitive_placeholder_active = self.initial_placeholder_active;
    }

    /// Commit-time value resolution.
    ///
    /// `previous` is the value the row held when the editor opened.
    pub fn resolve(&self, descriptor: Option<&PropertyDescriptor>, previous: Option<&str>) -> Option<String> {
        if self.buffer.is_empty() {
            if self.empty_string_requested {
                return Some(String::new());
            }
            return match descriptor {
                Some(descriptor) if descriptor.required => descriptor
                    .non_blank_default()
                    .or(previous)
                    .map(str::to_string),
                _ => None,
            };
        }

        if self.sensitive_placeholder_active {
            // never persist the placeholder text as the secret
            return previous.map(str::to_string);
        }
        Some(self.buffer.clone())
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map_or(self.buffer.len(), |(idx, _)| idx)
    }

    /// First real keystroke into a sensitive field drops the placeholder.
    fn begin_edit(&mut self) {
        if self.sensitive_placeholder_active {
            self.sensitive_placeholder_active = false;
            if self.buffer == SENSITIVE_PLACEHOLDER {
                self.buffer.clear();
                self.cursor = 0;
            }
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.begin_edit();
        let at = self.byte_offset(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        self.begin_edit();
        let at = self.byte_offset(self.cursor);
        self.buffer.insert_str(at, s);
        self.cursor += s.chars().count();
    }

    pub fn backspace(&mut self) {
        self.begin_edit();
        if self.cursor > 0 {
            let at = self.byte_offset(self.cursor - 1);
            self.buffer.remove(at);
            self.cursor -= 1;
        }
    }

    pub fn delete(&mut self) {
        self.begin_edit();
        if self.cursor < self.buffer.chars().count() {
            let at = self.byte_offset(self.cursor);
            self.buffer.remove(at);
        }
    }

    pub fn clear(&mut self) {
        self.begin_edit();
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buffer.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.buffer.chars().count();
    }

    pub fn toggle_empty_string(&mut self) {
        self.empty_string_requested = !self.empty_string_requested;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorInput {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let newline = key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => EditorInput::Cancel,
            KeyCode::Enter if newline => {
                self.insert_char('\n');
                EditorInput::Changed
            }
            KeyCode::Enter => EditorInput::Commit,
            KeyCode::Char('e') if ctrl => {
                self.toggle_empty_string();
                EditorInput::Changed
            }
            KeyCode::Char('u') if ctrl => {
                self.clear();
                EditorInput::Changed
            }
            KeyCode::Char(c) if !ctrl => {
                self.insert_char(c);
                EditorInput::Changed
            }
            KeyCode::Tab => {
                self.insert_char('\t');
                EditorInput::Changed
            }
            KeyCode::Backspace => {
                self.backspace();
                EditorInput::Changed
            }
            KeyCode::Delete => {
                self.delete();
                EditorInput::Changed
            }
            KeyCode::Left => {
                self.move_left();
                EditorInput::Changed
            }
            KeyCode::Right => {
                self.move_right();
                EditorInput::Changed
            }
            KeyCode::Home => {
                self.move_home();
                EditorInput::Changed
            }
            KeyCode::End => {
                self.move_end();
                EditorInput::Changed
            }
            _ => EditorInput::None,
        }
    }
}
