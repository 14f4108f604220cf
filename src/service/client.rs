// src/service/client.rs
// REST client for the flow console backend

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::component::{ComponentRef, ComponentSnapshot};
use crate::descriptor::{HistoryMap, PropertyDescriptor, PropertyDescriptorEntity};
use crate::error::{PropertyTableError, Result};
use crate::table::change_tracker::PropertyChanges;

use super::{ControllerServiceEntity, ControllerServiceTypesEntity, DocumentedType, ServiceScope};

/// Backend calls the property table issues on its own behalf.
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    /// Implementations of the controller service API `service_type`.
    async fn controller_service_types(&self, service_type: &str) -> Result<Vec<DocumentedType>>;

    async fn create_controller_service(&self, scope: &ServiceScope, service_type: &str) -> Result<ControllerServiceEntity>;

    async fn controller_service(&self, id: &str) -> Result<ControllerServiceEntity>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentHistoryEntity {
    component_history: ComponentHistory,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentHistory {
    #[serde(default)]
    property_history: HistoryMap,
}

#[derive(Debug, Clone)]
pub struct ConsoleClient {
    base_url: String,
    client: reqwest::Client,
    /// Sent with every revision so the backend can tell our edits apart.
    client_id: String,
}

impl ConsoleClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            client_id: Uuid::new_v4().to_string(),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turn any non-2xx response into a `BackendError` carrying the body.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(PropertyTableError::BackendError {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).query(query).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// Resolve one property's descriptor against the component.
    pub async fn property_descriptor(&self, component: &ComponentRef, name: &str) -> Result<PropertyDescriptor> {
        let entity: PropertyDescriptorEntity = self
            .get_json(&component.descriptors_path(), &[("propertyName", name)])
            .await?;
        Ok(entity.property_descriptor)
    }

    pub async fn component(&self, component: &ComponentRef) -> Result<ComponentSnapshot> {
        let entity: Value = self.get_json(&component.path(), &[]).await?;
        ComponentSnapshot::from_value(component.kind, &entity)
    }

    pub async fn history(&self, component_id: &str) -> Result<HistoryMap> {
        let entity: ComponentHistoryEntity = self
            .get_json(&format!("flow/history/components/{}", component_id), &[])
            .await?;
        Ok(entity.component_history.property_history)
    }

    /// Save the marshalled diff against the snapshot's revision.
    pub async fn update_properties(&self, snapshot: &ComponentSnapshot, changes: &PropertyChanges) -> Result<ComponentSnapshot> {
        let body = snapshot.to_update_body(changes, &self.client_id);
        let path = snapshot.component.path();

        debug!(path = %path, changed = changes.len(), "PUT");
        let response = self.client.put(self.url(&path)).json(&body).send().await?;
        let entity: Value = Self::check(response).await?.json().await?;

        info!(component = %snapshot.component, "properties saved");
        ComponentSnapshot::from_value(snapshot.component.kind, &entity)
    }
}

#[async_trait]
impl ConsoleApi for ConsoleClient {
    async fn controller_service_types(&self, service_type: &str) -> Result<Vec<DocumentedType>> {
        let entity: ControllerServiceTypesEntity = self
            .get_json("flow/controller-service-types", &[("serviceType", service_type)])
            .await?;
        Ok(entity.controller_service_types)
    }

    async fn create_controller_service(&self, scope: &ServiceScope, service_type: &str) -> Result<ControllerServiceEntity> {
        let body = json!({
            "revision": { "clientId": self.client_id, "version": 0 },
            "component": { "type": service_type },
        });
        let path = scope.path();

        debug!(path = %path, service_type, "POST");
        let response = self.client.post(self.url(&path)).json(&body).send().await?;
        let entity: ControllerServiceEntity = Self::check(response).await?.json().await?;

        info!(service = %entity.id, service_type, "controller service created");
        Ok(entity)
    }

    async fn controller_service(&self, id: &str) -> Result<ControllerServiceEntity> {
        self.get_json(&format!("controller-services/{}", id), &[]).await
    }
}
