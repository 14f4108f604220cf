// src/host.rs
// Collaborators the embedding application supplies to the property table

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::component::ComponentRef;
use crate::config::UnsavedChangesPolicy;
use crate::descriptor::PropertyDescriptor;
use crate::error::Result;
use crate::service::client::ConsoleClient;
use crate::table::change_tracker::PropertyChanges;

/// Answer of the confirm-then-continue hook that runs before navigating away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoToService {
    Proceed,
    Cancelled,
}

#[async_trait]
pub trait PropertyTableHost: Send + Sync {
    /// Resolve the descriptor of `name` on the edited component.
    async fn descriptor(&self, name: &str) -> Result<PropertyDescriptor>;

    /// Runs before navigating to a referenced service. `changes` are the
    /// table's unsaved changes, possibly empty.
    async fn before_go_to_service(&self, changes: &PropertyChanges) -> Result<GoToService> {
        let _ = changes;
        Ok(GoToService::Proceed)
    }
}

/// Host backed by the REST client, bound to one component.
#[derive(Debug, Clone)]
pub struct ConsoleHost {
    client: Arc<ConsoleClient>,
    component: ComponentRef,
    unsaved_changes: UnsavedChangesPolicy,
}

impl ConsoleHost {
    pub fn new(client: Arc<ConsoleClient>, component: ComponentRef, unsaved_changes: UnsavedChangesPolicy) -> Self {
        Self {
            client,
            component,
            unsaved_changes,
        }
    }

    pub fn component(&self) -> &ComponentRef {
        &self.component
    }
}

#[async_trait]
impl PropertyTableHost for ConsoleHost {
    async fn descriptor(&self, name: &str) -> Result<PropertyDescriptor> {
        self.client.property_descriptor(&self.component, name).await
    }

    async fn before_go_to_service(&self, changes: &PropertyChanges) -> Result<GoToService> {
        if changes.is_empty() {
            return Ok(GoToService::Proceed);
        }

        match self.unsaved_changes {
            UnsavedChangesPolicy::Discard => {
                warn!(component = %self.component, discarded = changes.len(), "leaving with unsaved changes");
                Ok(GoToService::Proceed)
            }
            UnsavedChangesPolicy::Cancel => Ok(GoToService::Cancelled),
            UnsavedChangesPolicy::Save => {
                // latest revision, the loaded one may be stale by now
                let snapshot = self.client.component(&self.component).await?;
                self.client.update_properties(&snapshot, changes).await?;
                info!(component = %self.component, "saved before navigating");
                Ok(GoToService::Proceed)
            }
        }
    }
}
