// src/editor/choice.rs
// Enumerated-choice editor state

use crossterm::event::{KeyCode, KeyEvent};

use crate::descriptor::PropertyDescriptor;

use super::EditorInput;

pub const NO_VALUE: &str = "No value";
pub const CREATE_NEW_SERVICE: &str = "Create new service...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceValue {
    Value(Option<String>),
    /// Synthetic entry that starts the controller service creation flow
    CreateService,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub text: String,
    pub value: ChoiceValue,
    pub description: Option<String>,
    pub disabled: bool,
    /// Styled like "unset" entries (no value, create new)
    pub unset: bool,
}

#[derive(Debug, Clone)]
pub struct ChoiceEditState {
    options: Vec<ChoiceOption>,
    /// Last real value option chosen, what commit serializes.
    selected: usize,
    /// Cursor over the list, may rest on the synthetic entry.
    highlighted: usize,
    initial_value: Option<String>,
}

impl ChoiceEditState {
    /// `value` is the row's current value, `row_previous` its load-time value
    /// (an unreadable option stays selectable when it is that value).
    pub fn load(descriptor: &PropertyDescriptor, value: Option<&str>, row_previous: Option<&str>) -> Self {
        let options = build_options(descriptor, row_previous);

        let selected = options
            .iter()
            .position(|option| option.value == ChoiceValue::Value(value.map(str::to_string)))
            .unwrap_or(0);

        Self {
            options,
            selected,
            highlighted: selected,
            initial_value: value.map(str::to_string),
        }
    }

    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_value(&self) -> Option<String> {
        match self.options.get(self.selected).map(|option| &option.value) {
            Some(ChoiceValue::Value(value)) => value.clone(),
            _ => None,
        }
    }

    /// Selecting `""` where the editor opened on `None` is not a change.
    pub fn is_value_changed(&self) -> bool {
        let selected = self.selected_value();
        let empty_for_null = selected.as_deref() == Some("") && self.initial_value.is_none();
        !empty_for_null && selected != self.initial_value
    }

    /// Put the selection back where it was when the editor opened.
    pub fn reset(&mut self) {
        self.selected = self
            .options
            .iter()
            .position(|option| option.value == ChoiceValue::Value(self.initial_value.clone()))
            .unwrap_or(0);
        self.highlighted = self.selected;
    }

    /// Move the highlight, skipping disabled entries. Landing on a value
    /// option selects it.
    pub fn move_highlight(&mut self, forward: bool) {
        let len = self.options.len();
        if len == 0 {
            return;
        }
        let mut idx = self.highlighted;
        for _ in 0..len {
            idx = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
            if !self.options[idx].disabled {
                self.highlighted = idx;
                if matches!(self.options[idx].value, ChoiceValue::Value(_)) {
                    self.selected = idx;
                }
                return;
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, service_type: Option<&str>) -> EditorInput {
        match key.code {
            KeyCode::Esc => EditorInput::Cancel,
            KeyCode::Up | KeyCode::Left | KeyCode::BackTab => {
                self.move_highlight(false);
                EditorInput::Changed
            }
            KeyCode::Down | KeyCode::Right | KeyCode::Tab => {
                self.move_highlight(true);
                EditorInput::Changed
            }
            KeyCode::Enter => match (self.options.get(self.highlighted).map(|o| &o.value), service_type) {
                (Some(ChoiceValue::CreateService), Some(service_type)) => {
                    EditorInput::CreateService(service_type.to_string())
                }
                _ => EditorInput::Commit,
            },
            _ => EditorInput::None,
        }
    }
}

fn build_options(descriptor: &PropertyDescriptor, row_previous: Option<&str>) -> Vec<ChoiceOption> {
    let mut options = Vec::new();

    if !descriptor.required {
        options.push(unset_option(false));
    }

    for entity in descriptor.allowable_values() {
        let allowable = &entity.allowable_value;
        options.push(ChoiceOption {
            text: allowable.display_name.clone(),
            value: ChoiceValue::Value(Some(allowable.value.clone())),
            description: allowable.description.clone(),
            disabled: !entity.is_readable() && Some(allowable.value.as_str()) != row_previous,
            unset: false,
        });
    }

    if options.is_empty() {
        options.push(unset_option(true));
    }

    if descriptor.identifies_controller_service.is_some() {
        options.push(ChoiceOption {
            text: CREATE_NEW_SERVICE.to_string(),
            value: ChoiceValue::CreateService,
            description: None,
            disabled: false,
            unset: true,
        });
    }

    options
}

fn unset_option(disabled: bool) -> ChoiceOption {
    ChoiceOption {
        text: NO_VALUE.to_string(),
        value: ChoiceValue::Value(None),
        description: None,
        disabled,
        unset: true,
    }
}
