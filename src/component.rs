// src/component.rs
// The configurable component whose properties the host binary edits

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::descriptor::{DescriptorMap, PropertyDescriptor};
use crate::error::{PropertyTableError, Result};
use crate::service::Revision;
use crate::table::change_tracker::PropertyChanges;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Processor,
    ReportingTask,
    ControllerService,
}

impl ComponentKind {
    /// REST collection the component lives under.
    pub fn path(&self) -> &'static str {
        match self {
            ComponentKind::Processor => "processors",
            ComponentKind::ReportingTask => "reporting-tasks",
            ComponentKind::ControllerService => "controller-services",
        }
    }

    /// Processors nest their properties one level deeper, under `config`.
    fn nests_config(&self) -> bool {
        matches!(self, ComponentKind::Processor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRef {
    pub kind: ComponentKind,
    pub id: String,
}

impl ComponentRef {
    pub fn new(kind: ComponentKind, id: &str) -> Self {
        Self { kind, id: id.to_string() }
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.kind.path(), self.id)
    }

    pub fn descriptors_path(&self) -> String {
        format!("{}/descriptors", self.path())
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// What the host needs from a fetched component entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSnapshot {
    pub component: ComponentRef,
    pub name: String,
    pub revision: Revision,
    pub parent_group_id: Option<String>,
    /// Property values in the order the backend listed them.
    pub properties: Vec<(String, Option<String>)>,
    pub descriptors: DescriptorMap,
}

impl ComponentSnapshot {
    pub fn from_value(kind: ComponentKind, entity: &Value) -> Result<Self> {
        let component = entity
            .get("component")
            .ok_or_else(|| PropertyTableError::ResponseError("entity has no component".to_string()))?;

        let id = component
            .get("id")
            .or_else(|| entity.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| PropertyTableError::ResponseError("component has no id".to_string()))?;

        let revision = match entity.get("revision") {
            Some(revision) => serde_json::from_value(revision.clone())?,
            None => Revision::default(),
        };

        let config = if kind.nests_config() {
            component.get("config").unwrap_or(&Value::Null)
        } else {
            component
        };

        let properties = config
            .get("properties")
            .and_then(Value::as_object)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), property_value(v))).collect())
            .unwrap_or_default();

        let mut descriptors = DescriptorMap::new();
        if let Some(map) = config.get("descriptors").and_then(Value::as_object) {
            for (name, value) in map {
                let descriptor: PropertyDescriptor = serde_json::from_value(value.clone())?;
                descriptors.insert(name.clone(), descriptor);
            }
        }

        Ok(Self {
            component: ComponentRef::new(kind, id),
            name: component.get("name").and_then(Value::as_str).unwrap_or(id).to_string(),
            revision,
            parent_group_id: component
                .get("parentGroupId")
                .and_then(Value::as_str)
                .map(str::to_string),
            properties,
            descriptors,
        })
    }

    /// PUT body carrying only the changed properties.
    pub fn to_update_body(&self, changes: &PropertyChanges, client_id: &str) -> Value {
        let properties: Map<String, Value> = changes
            .iter()
            .map(|(name, value)| (name.clone(), value.as_ref().map_or(Value::Null, |v| json!(v))))
            .collect();

        let component = if self.component.kind.nests_config() {
            json!({ "id": self.component.id, "config": { "properties": properties } })
        } else {
            json!({ "id": self.component.id, "properties": properties })
        };

        json!({
            "revision": { "clientId": client_id, "version": self.revision.version },
            "component": component,
        })
    }
}

fn property_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
