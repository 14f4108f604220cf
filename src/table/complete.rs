// src/table/complete.rs
use tracing::{debug, info, warn};

use crate::request::{TableRequest, TableResponse};

use super::add_property::NAME_EXISTS;
use super::row_model::{NewPropertyRow, PropertyKind, RowPatch};
use super::{Dialog, Notice, Pending, PropertyTable, TableEvent};

const NO_SERVICE_TYPES: &str = "No controller service types found that are applicable for this property.";

impl PropertyTable {
    /// Apply a response from the host. Responses whose request is no longer
    /// pending (cancelled, cleared, destroyed) are dropped.
    pub fn complete(&mut self, response: TableResponse) {
        let token = response.token();
        let Some(pending) = self.pending.remove(&token) else {
            debug!(?token, "discarding stale response");
            return;
        };

        match (pending, response) {
            (Pending::AddProperty { name }, TableResponse::Descriptor { result, .. }) => match result {
                Ok(descriptor) => self.property_added(&name, descriptor),
                Err(e) => {
                    warn!(property = %name, "descriptor lookup failed: {}", e);
                    self.show_notice(Notice::error(&e.to_string()));
                }
            },

            (Pending::ServiceTypes, TableResponse::ServiceTypes { result, .. }) => match result {
                Ok(types) if types.is_empty() => {
                    self.close_service_flow();
                    self.show_notice(Notice::info("Controller Service", NO_SERVICE_TYPES));
                }
                Ok(types) => {
                    if let Some(Dialog::CreateService(flow)) = self.dialog.as_mut() {
                        flow.types_loaded(types);
                    }
                }
                Err(e) => self.service_flow_failed(&e.to_string()),
            },

            (Pending::CreateService, TableResponse::ServiceCreated { result, .. }) => match result {
                Ok(entity) => {
                    let Some(Dialog::CreateService(flow)) = self.dialog.as_mut() else {
                        return;
                    };
                    flow.service_created(&entity.id);
                    let (row_id, property) = (flow.row_id(), flow.property().to_string());

                    // the new service has to show up among the allowable values
                    let token = self.tokens.next();
                    self.pending.insert(
                        token,
                        Pending::RefreshDescriptor {
                            row_id,
                            service_id: entity.id.clone(),
                        },
                    );
                    self.requests.push(TableRequest::ResolveDescriptor { token, property });
                }
                Err(e) => self.service_flow_failed(&e.to_string()),
            },

            (Pending::RefreshDescriptor { row_id, service_id }, TableResponse::Descriptor { result, .. }) => {
                match result {
                    Ok(descriptor) => {
                        self.close_service_flow();
                        let Some(row) = self.model.get_item_by_id(row_id) else {
                            debug!(row = row_id, "row gone before service creation finished");
                            return;
                        };
                        let property = row.property.clone();
                        self.descriptors.insert(property.clone(), descriptor);
                        if let Err(e) = self.model.update_item(row_id, RowPatch::default().value(Some(service_id))) {
                            warn!("could not set created service: {}", e);
                        }
                        info!(%property, "controller service assigned");
                        self.sync_grid();
                    }
                    Err(e) => self.service_flow_failed(&e.to_string()),
                }
            }

            (Pending::GoToService, TableResponse::ServiceLocated { result, .. }) => match result {
                Ok(Some(entity)) => {
                    info!(service = %entity.id, "navigating to controller service");
                    self.events.push(TableEvent::NavigateToService {
                        service_id: entity.id,
                        parent_group_id: entity.component.parent_group_id,
                    });
                }
                Ok(None) => debug!("navigation cancelled"),
                Err(e) => self.show_notice(Notice::error(&e.to_string())),
            },

            (pending, response) => {
                warn!(?pending, ?response, "response does not match its request");
            }
        }
    }

    fn property_added(&mut self, name: &str, descriptor: crate::descriptor::PropertyDescriptor) {
        self.descriptors.insert(name.to_string(), descriptor);

        // added meanwhile through another path
        if let Some(row) = self.model.find_by_key(name) {
            let id = row.id;
            self.grid.select(id);
            self.show_notice(Notice::info("Property Exists", NAME_EXISTS));
            return;
        }

        let row = NewPropertyRow::new(name, name, None, PropertyKind::UserDefined);
        match self.model.add_item(row) {
            Ok(id) => {
                self.sync_grid();
                self.grid.select(id);
                self.open_editor(id);
            }
            Err(e) => warn!("could not add property: {}", e),
        }
    }

    fn service_flow_failed(&mut self, detail: &str) {
        warn!("controller service creation failed: {}", detail);
        self.close_service_flow();
        self.show_notice(Notice::error(detail));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{AllowableValueEntity, DescriptorMap, HistoryMap, PropertyDescriptor};
    use crate::error::PropertyTableError;
    use crate::request::RequestToken;
    use crate::service::{ControllerServiceComponent, ControllerServiceEntity, DocumentedType, Revision, ServiceScope};
    use crate::table::tests::{descriptor, editable, table};
    use crate::table::Severity;
    use crossterm::event::{KeyCode, KeyEvent};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    fn service_descriptor(values: &[(&str, &str)]) -> PropertyDescriptor {
        PropertyDescriptor {
            identifies_controller_service: Some("org.example.CacheClient".into()),
            allowable_values: Some(values.iter().map(|(v, d)| AllowableValueEntity::new(v, d)).collect()),
            ..descriptor("Cache")
        }
    }

    fn entity(id: &str) -> ControllerServiceEntity {
        ControllerServiceEntity {
            id: id.to_string(),
            revision: Revision::default(),
            component: ControllerServiceComponent {
                id: id.to_string(),
                name: "Cache".into(),
                type_name: "org.example.LocalCache".into(),
                parent_group_id: Some("pg-7".into()),
            },
        }
    }

    fn documented(type_name: &str) -> DocumentedType {
        DocumentedType {
            type_name: type_name.into(),
            description: None,
            tags: vec![],
        }
    }

    fn service_table(value: Option<&str>) -> PropertyTable {
        let mut descriptors = DescriptorMap::new();
        descriptors.insert("Cache".into(), service_descriptor(&[("svc-1", "Primary")]));
        let mut table = PropertyTable::new(editable());
        table.reset_table_size(ratatui::layout::Rect::new(0, 0, 80, 20));
        table
            .load_properties(vec![("Cache".to_string(), value.map(str::to_string))], descriptors, HistoryMap::new())
            .unwrap();
        table
    }

    /// Open the unset Cache editor and pick "Create new service...".
    fn start_flow(table: &mut PropertyTable) -> RequestToken {
        table.select_property("Cache");
        table.activate_value_cell();
        // No value -> Primary -> Create new service...
        for _ in 0..2 {
            table.handle_key(key(KeyCode::Down));
        }
        table.handle_key(key(KeyCode::Enter));
        match table.take_requests().as_slice() {
            [TableRequest::ListServiceTypes { token, .. }] => *token,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_added_property_gets_row_and_editor() {
        let mut table = table(editable());
        table.add_property("dynamic one");
        let token = table.take_requests()[0].token();

        table.complete(TableResponse::Descriptor {
            token,
            result: Ok(PropertyDescriptor { dynamic: true, supports_el: true, ..descriptor("dynamic one") }),
        });

        let row = table.find_row("dynamic one").unwrap();
        assert_eq!(row.kind, PropertyKind::UserDefined);
        assert_eq!(row.display_name, "dynamic one");
        assert_eq!(row.value, None);
        assert_eq!(table.selected_row().unwrap().property, "dynamic one");
        assert_eq!(table.editor().map(|e| e.property()), Some("dynamic one"));
        assert!(table.descriptors().contains_key("dynamic one"));
        assert!(!table.has_pending());
    }

    #[test]
    fn test_descriptor_failure_shows_error() {
        let mut table = table(editable());
        table.add_property("broken");
        let token = table.take_requests()[0].token();
        table.complete(TableResponse::Descriptor {
            token,
            result: Err(PropertyTableError::BackendError { status: 500, message: "boom".into() }),
        });

        assert!(table.find_row("broken").is_none());
        let notice = table.notice().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.starts_with("Unable to complete the request"));
        assert!(matches!(table.take_events().as_slice(), [TableEvent::Notice(_)]));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut table = table(editable());
        table.add_property("late");
        let token = table.take_requests()[0].token();
        table.clear();

        table.complete(TableResponse::Descriptor { token, result: Ok(descriptor("late")) });
        assert!(table.find_row("late").is_none());
        assert!(table.editor().is_none());
        assert!(table.notice().is_none());
    }

    #[test]
    fn test_no_service_types_notice() {
        let mut table = service_table(None);
        let token = start_flow(&mut table);
        table.complete(TableResponse::ServiceTypes { token, result: Ok(vec![]) });

        assert!(table.dialog().is_none());
        let notice = table.notice().unwrap();
        assert_eq!(notice.severity, Severity::Info);
        assert_eq!(notice.message, NO_SERVICE_TYPES);
        assert_eq!(table.find_row("Cache").unwrap().value, None);
    }

    #[test]
    fn test_service_creation_end_to_end() {
        let mut table = service_table(None);
        table.set_group_id(Some("pg-7".into()));
        let token = start_flow(&mut table);
        table.complete(TableResponse::ServiceTypes {
            token,
            result: Ok(vec![documented("org.example.LocalCache")]),
        });

        // notice layer is empty, keys reach the flow
        table.handle_key(key(KeyCode::Enter));
        let token = match table.take_requests().as_slice() {
            [TableRequest::CreateService { token, scope, service_type }] => {
                assert_eq!(scope, &ServiceScope::ProcessGroup("pg-7".into()));
                assert_eq!(service_type, "org.example.LocalCache");
                *token
            }
            other => panic!("unexpected {:?}", other),
        };

        table.complete(TableResponse::ServiceCreated { token, result: Ok(entity("svc-2")) });
        let token = match table.take_requests().as_slice() {
            [TableRequest::ResolveDescriptor { token, property }] => {
                assert_eq!(property, "Cache");
                *token
            }
            other => panic!("unexpected {:?}", other),
        };

        table.complete(TableResponse::Descriptor {
            token,
            result: Ok(service_descriptor(&[("svc-1", "Primary"), ("svc-2", "LocalCache")])),
        });

        assert!(table.dialog().is_none());
        assert!(!table.has_pending());
        let row = table.find_row("Cache").unwrap();
        assert_eq!(row.value.as_deref(), Some("svc-2"));
        assert_eq!(table.descriptors()["Cache"].allowable_values().len(), 2);
        assert_eq!(table.marshal_properties()["Cache"].as_deref(), Some("svc-2"));
    }

    #[test]
    fn test_controller_scope_without_group() {
        let mut table = service_table(None);
        let token = start_flow(&mut table);
        table.complete(TableResponse::ServiceTypes {
            token,
            result: Ok(vec![documented("org.example.LocalCache")]),
        });
        table.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            table.take_requests().as_slice(),
            [TableRequest::CreateService { scope: ServiceScope::Controller, .. }]
        ));
    }

    #[test]
    fn test_creation_failure_leaves_row() {
        let mut table = service_table(None);
        let token = start_flow(&mut table);
        table.complete(TableResponse::ServiceTypes {
            token,
            result: Ok(vec![documented("org.example.LocalCache")]),
        });
        table.handle_key(key(KeyCode::Enter));
        let token = table.take_requests()[0].token();

        table.complete(TableResponse::ServiceCreated {
            token,
            result: Err(PropertyTableError::BackendError { status: 403, message: "denied".into() }),
        });
        assert!(table.dialog().is_none());
        assert_eq!(table.notice().unwrap().severity, Severity::Error);
        assert_eq!(table.find_row("Cache").unwrap().value, None);
    }

    #[test]
    fn test_cancelled_flow_drops_late_types() {
        let mut table = service_table(None);
        let token = start_flow(&mut table);
        table.handle_key(key(KeyCode::Esc));

        table.complete(TableResponse::ServiceTypes {
            token,
            result: Ok(vec![documented("org.example.LocalCache")]),
        });
        assert!(table.dialog().is_none());
    }

    #[test]
    fn test_navigation_event() {
        let mut table = service_table(Some("svc-1"));
        table.select_property("Cache");
        assert!(table.go_to_service());
        let token = table.take_requests()[0].token();

        table.complete(TableResponse::ServiceLocated { token, result: Ok(Some(entity("svc-1"))) });
        assert_eq!(
            table.take_events(),
            vec![TableEvent::NavigateToService {
                service_id: "svc-1".into(),
                parent_group_id: Some("pg-7".into()),
            }]
        );
    }

    #[test]
    fn test_navigation_cancelled_by_host() {
        let mut table = service_table(Some("svc-1"));
        table.select_property("Cache");
        table.go_to_service();
        let token = table.take_requests()[0].token();

        table.complete(TableResponse::ServiceLocated { token, result: Ok(None) });
        assert!(table.take_events().is_empty());
        assert!(table.notice().is_none());
    }

    #[test]
    fn test_type_lookup_failure_closes_flow() {
        let mut table = service_table(None);
        let token = start_flow(&mut table);
        table.complete(TableResponse::ServiceTypes {
            token,
            result: Err(PropertyTableError::BackendError { status: 500, message: "down".into() }),
        });

        assert!(table.dialog().is_none());
        assert!(!table.has_pending());
        let notice = table.notice().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.contains("down"));
        assert_eq!(table.find_row("Cache").unwrap().value, None);
    }

    #[test]
    fn test_descriptor_refresh_failure_leaves_row() {
        let mut table = service_table(None);
        let token = start_flow(&mut table);
        table.complete(TableResponse::ServiceTypes {
            token,
            result: Ok(vec![documented("org.example.LocalCache")]),
        });
        table.handle_key(key(KeyCode::Enter));
        let token = table.take_requests()[0].token();
        table.complete(TableResponse::ServiceCreated { token, result: Ok(entity("svc-2")) });
        let token = table.take_requests()[0].token();

        table.complete(TableResponse::Descriptor {
            token,
            result: Err(PropertyTableError::BackendError { status: 404, message: "gone".into() }),
        });

        assert!(table.dialog().is_none());
        assert!(!table.has_pending());
        assert_eq!(table.notice().unwrap().severity, Severity::Error);
        assert_eq!(table.find_row("Cache").unwrap().value, None);
        assert_eq!(table.descriptors()["Cache"].allowable_values().len(), 1);
        assert!(!table.is_save_required());
    }

    #[test]
    fn test_navigation_failure_shows_error() {
        let mut table = service_table(Some("svc-1"));
        table.select_property("Cache");
        table.go_to_service();
        let token = table.take_requests()[0].token();

        table.complete(TableResponse::ServiceLocated {
            token,
            result: Err(PropertyTableError::BackendError { status: 404, message: "missing".into() }),
        });

        assert_eq!(table.notice().unwrap().severity, Severity::Error);
        let events = table.take_events();
        assert!(matches!(events.as_slice(), [TableEvent::Notice(_)]));
        assert_eq!(table.find_row("Cache").unwrap().value.as_deref(), Some("svc-1"));
    }
}
