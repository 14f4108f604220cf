// src/service/mod.rs
// Controller service DTOs, the backend client and the creation dialog

pub mod client;
pub mod flow;

use serde::{Deserialize, Serialize};

use crate::util::string::StringUtils;

/// Where a new controller service is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceScope {
    /// Controller level, used when the table has no group id
    Controller,
    ProcessGroup(String),
}

impl ServiceScope {
    pub fn from_group_id(group_id: Option<&str>) -> Self {
        match group_id {
            Some(id) => ServiceScope::ProcessGroup(id.to_string()),
            None => ServiceScope::Controller,
        }
    }

    /// Collection path relative to the API root.
    pub fn path(&self) -> String {
        match self {
            ServiceScope::Controller => "controller/controller-services".to_string(),
            ServiceScope::ProcessGroup(id) => format!("process-groups/{}/controller-services", id),
        }
    }
}

/// One implementation offered for a controller service API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentedType {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DocumentedType {
    /// `org.example.StandardCache` -> `StandardCache`
    pub fn short_name(&self) -> &str {
        StringUtils::substring_after_last(&self.type_name, '.')
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerServiceTypesEntity {
    #[serde(default)]
    pub controller_service_types: Vec<DocumentedType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerServiceEntity {
    pub id: String,
    #[serde(default)]
    pub revision: Revision,
    pub component: ControllerServiceComponent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerServiceComponent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_name: String,
    #[serde(default)]
    pub parent_group_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_paths() {
        assert_eq!(ServiceScope::from_group_id(None).path(), "controller/controller-services");
        assert_eq!(
            ServiceScope::from_group_id(Some("pg-1")).path(),
            "process-groups/pg-1/controller-services"
        );
    }

    #[test]
    fn test_types_response_parses() {
        let body = r#"{
            "controllerServiceTypes": [
                {"type": "org.example.cache.StandardCache", "description": "Keeps things", "tags": ["cache", "map"]},
                {"type": "Bare"}
            ]
        }"#;
        let entity: ControllerServiceTypesEntity = serde_json::from_str(body).unwrap();
        let types = entity.controller_service_types;
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].short_name(), "StandardCache");
        assert_eq!(types[0].tags, vec!["cache", "map"]);
        assert_eq!(types[1].short_name(), "Bare");
        assert!(types[1].tags.is_empty());
    }

    #[test]
    fn test_service_entity_parses() {
        let body = r#"{
            "id": "svc-1",
            "revision": {"version": 3},
            "component": {"id": "svc-1", "name": "Cache", "type": "org.example.Cache", "parentGroupId": "pg-9"}
        }"#;
        let entity: ControllerServiceEntity = serde_json::from_str(body).unwrap();
        assert_eq!(entity.revision.version, 3);
        assert_eq!(entity.component.parent_group_id.as_deref(), Some("pg-9"));
    }
}
