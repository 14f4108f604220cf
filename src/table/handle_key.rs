// src/table/handle_key.rs
use crossterm::event::{KeyCode, KeyEvent};
use tracing::debug;

use crate::editor::EditorInput;
use crate::request::TableRequest;
use crate::service::flow::FlowAction;
use crate::service::ServiceScope;

use super::add_property::AddPropertyAction;
use super::{Dialog, Pending, PropertyTable};

impl PropertyTable {
    /// Route a key to the notice, dialog, editor or grid, in that order.
    /// Returns false when the key was not for the table.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.destroyed {
            return false;
        }

        if self.notice.take().is_some() {
            return true;
        }

        if self.dialog.is_some() {
            self.handle_dialog_key(key);
            return true;
        }

        if self.editor.is_some() {
            self.handle_editor_key(key);
            return true;
        }

        match key.code {
            KeyCode::Up => self.grid.move_selection(-1),
            KeyCode::Down => self.grid.move_selection(1),
            KeyCode::PageUp => self.grid.move_selection(-(self.grid.viewport_rows().max(1) as isize)),
            KeyCode::PageDown => self.grid.move_selection(self.grid.viewport_rows().max(1) as isize),
            KeyCode::Home => self.grid.select_first(),
            KeyCode::End => self.grid.select_last(),
            KeyCode::Enter => self.activate_value_cell(),
            KeyCode::Char('a') | KeyCode::Char('+') => return self.open_add_property_dialog(),
            KeyCode::Delete | KeyCode::Char('d') => return self.delete_selected(),
            KeyCode::Char('g') => return self.go_to_service(),
            KeyCode::Char('?') | KeyCode::Char('i') => return self.show_tooltip(),
            _ => return false,
        }
        true
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };

        match editor.handle_key(key) {
            EditorInput::Commit => self.save_row(),
            EditorInput::Cancel => self.cancel_edit(),
            EditorInput::CreateService(service_type) => {
                let row_id = editor.row_id();
                let property = editor.property().to_string();
                debug!(%property, %service_type, "starting service creation");
                self.cancel_edit();
                self.start_service_flow(row_id, &property, &service_type);
            }
            EditorInput::Changed | EditorInput::None => {}
        }
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };

        match dialog {
            Dialog::AddProperty(add) => match add.handle_key(key) {
                AddPropertyAction::Confirm(name) => self.add_property(&name),
                AddPropertyAction::Cancel => self.dialog = None,
                AddPropertyAction::Changed | AddPropertyAction::None => {}
            },
            Dialog::CreateService(flow) => match flow.handle_key(key) {
                FlowAction::Create(service_type) => {
                    flow.creating();
                    let token = self.tokens.next();
                    self.pending.insert(token, Pending::CreateService);
                    self.requests.push(TableRequest::CreateService {
                        token,
                        scope: ServiceScope::from_group_id(self.group_id.as_deref()),
                        service_type,
                    });
                }
                FlowAction::Cancel => self.close_service_flow(),
                FlowAction::Changed | FlowAction::None => {}
            },
            Dialog::Detail(_) => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                    self.dialog = None;
                }
            }
            Dialog::Tooltip(_) => self.dialog = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{AllowableValueEntity, PropertyDescriptor};
    use crate::table::tests::{descriptor, editable, table};
    use crate::table::{Dialog, PropertyTable};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    fn with_service_property(table: &mut PropertyTable) {
        let service = PropertyDescriptor {
            identifies_controller_service: Some("org.example.CacheClient".into()),
            allowable_values: Some(vec![AllowableValueEntity::new("svc-1", "Primary Cache")]),
            ..descriptor("Cache")
        };
        let mut descriptors = table.descriptors().clone();
        descriptors.insert("Cache".into(), service);
        let mut values: Vec<_> = table
            .rows()
            .iter()
            .map(|r| (r.property.clone(), r.value.clone()))
            .collect();
        values.push(("Cache".into(), Some("svc-1".into())));
        table.load_properties(values, descriptors, Default::default()).unwrap();
    }

    #[test]
    fn test_grid_navigation() {
        let mut table = table(editable());
        assert_eq!(table.selected_row().unwrap().property, "Batch Size");
        assert!(table.handle_key(key(KeyCode::Down)));
        assert_eq!(table.selected_row().unwrap().property, "Comment");
        table.handle_key(key(KeyCode::End));
        assert_eq!(table.selected_row().unwrap().property, "extra");
        table.handle_key(key(KeyCode::Home));
        assert_eq!(table.selected_row().unwrap().property, "Batch Size");
        assert!(!table.handle_key(key(KeyCode::Char('q'))));
    }

    #[test]
    fn test_enter_opens_and_commits() {
        let mut table = table(editable());
        table.select_property("extra");
        table.handle_key(key(KeyCode::Enter));
        assert!(table.is_capturing_input());
        table.handle_key(key(KeyCode::Char('y')));
        table.handle_key(key(KeyCode::Enter));
        assert!(!table.is_capturing_input());
        assert_eq!(table.find_row("extra").unwrap().value.as_deref(), Some("xy"));
    }

    #[test]
    fn test_create_service_option_starts_flow() {
        let mut table = table(editable());
        with_service_property(&mut table);
        table.select_property("Cache");
        table.handle_key(key(KeyCode::Enter));

        // No value, Primary Cache, Create new service...
        table.handle_key(key(KeyCode::Down));
        table.handle_key(key(KeyCode::Enter));

        assert!(table.editor().is_none());
        assert!(matches!(table.dialog(), Some(Dialog::CreateService(_))));
        let requests = table.take_requests();
        assert!(matches!(
            requests.as_slice(),
            [TableRequest::ListServiceTypes { service_type, .. }] if service_type == "org.example.CacheClient"
        ));
        assert_eq!(table.find_row("Cache").unwrap().value.as_deref(), Some("svc-1"));

        table.handle_key(key(KeyCode::Esc));
        assert!(table.dialog().is_none());
        assert!(!table.has_pending());
    }

    #[test]
    fn test_go_to_service_request() {
        let mut table = table(editable());
        with_service_property(&mut table);
        table.select_property("Comment");
        assert!(!table.handle_key(key(KeyCode::Char('g'))));

        table.select_property("Cache");
        assert!(table.handle_key(key(KeyCode::Char('g'))));
        match table.take_requests().as_slice() {
            [TableRequest::GoToService { service_id, pending: Some(changes), .. }] => {
                assert_eq!(service_id, "svc-1");
                assert!(changes.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_notice_swallows_next_key() {
        let mut table = table(editable());
        table.open_add_property_dialog();
        table.handle_key(key(KeyCode::Enter));
        assert!(table.notice().is_some());

        assert!(table.handle_key(key(KeyCode::Down)));
        assert!(table.notice().is_none());
        assert_eq!(table.selected_row().unwrap().property, "Batch Size");
    }
}
