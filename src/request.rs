// src/request.rs
// Deferred backend work issued by the table and executed by the host

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::descriptor::PropertyDescriptor;
use crate::error::Result;
use crate::host::{GoToService, PropertyTableHost};
use crate::service::client::ConsoleApi;
use crate::service::{ControllerServiceEntity, DocumentedType, ServiceScope};
use crate::table::change_tracker::PropertyChanges;

/// Identifies one outstanding request. A response is only applied while its
/// token is still pending in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

#[derive(Debug, Default)]
pub struct TokenSource {
    next: u64,
}

impl TokenSource {
    pub fn next(&mut self) -> RequestToken {
        let token = RequestToken(self.next);
        self.next += 1;
        token
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableRequest {
    ResolveDescriptor {
        token: RequestToken,
        property: String,
    },
    ListServiceTypes {
        token: RequestToken,
        service_type: String,
    },
    CreateService {
        token: RequestToken,
        scope: ServiceScope,
        service_type: String,
    },
    /// Confirm with the host (when `pending` is set) then fetch the service.
    GoToService {
        token: RequestToken,
        service_id: String,
        pending: Option<PropertyChanges>,
    },
}

impl TableRequest {
    pub fn token(&self) -> RequestToken {
        match self {
            TableRequest::ResolveDescriptor { token, .. }
            | TableRequest::ListServiceTypes { token, .. }
            | TableRequest::CreateService { token, .. }
            | TableRequest::GoToService { token, .. } => *token,
        }
    }
}

#[derive(Debug)]
pub enum TableResponse {
    Descriptor {
        token: RequestToken,
        result: Result<PropertyDescriptor>,
    },
    ServiceTypes {
        token: RequestToken,
        result: Result<Vec<DocumentedType>>,
    },
    ServiceCreated {
        token: RequestToken,
        result: Result<ControllerServiceEntity>,
    },
    /// `Ok(None)` when the host cancelled the navigation.
    ServiceLocated {
        token: RequestToken,
        result: Result<Option<ControllerServiceEntity>>,
    },
}

impl TableResponse {
    pub fn token(&self) -> RequestToken {
        match self {
            TableResponse::Descriptor { token, .. }
            | TableResponse::ServiceTypes { token, .. }
            | TableResponse::ServiceCreated { token, .. }
            | TableResponse::ServiceLocated { token, .. } => *token,
        }
    }
}

/// Execute one request against the host and the backend.
pub async fn dispatch(request: TableRequest, host: &dyn PropertyTableHost, api: &dyn ConsoleApi) -> TableResponse {
    debug!(?request, "dispatching");

    match request {
        TableRequest::ResolveDescriptor { token, property } => TableResponse::Descriptor {
            token,
            result: host.descriptor(&property).await,
        },
        TableRequest::ListServiceTypes { token, service_type } => TableResponse::ServiceTypes {
            token,
            result: api.controller_service_types(&service_type).await,
        },
        TableRequest::CreateService { token, scope, service_type } => TableResponse::ServiceCreated {
            token,
            result: api.create_controller_service(&scope, &service_type).await,
        },
        TableRequest::GoToService { token, service_id, pending } => TableResponse::ServiceLocated {
            token,
            result: go_to_service(&service_id, pending.as_ref(), host, api).await,
        },
    }
}

async fn go_to_service(
    service_id: &str,
    pending: Option<&PropertyChanges>,
    host: &dyn PropertyTableHost,
    api: &dyn ConsoleApi,
) -> Result<Option<ControllerServiceEntity>> {
    if let Some(changes) = pending {
        if host.before_go_to_service(changes).await? == GoToService::Cancelled {
            debug!(service_id, "navigation cancelled by host");
            return Ok(None);
        }
    }
    Ok(Some(api.controller_service(service_id).await?))
}

/// Run `request` on a tokio task and hand the response to `deliver`.
pub fn spawn<F>(
    request: TableRequest,
    host: Arc<dyn PropertyTableHost>,
    api: Arc<dyn ConsoleApi>,
    deliver: F,
) -> JoinHandle<()>
where
    F: FnOnce(TableResponse) + Send + 'static,
{
    tokio::spawn(async move {
        let response = dispatch(request, host.as_ref(), api.as_ref()).await;
        if let TableResponse::Descriptor { result: Err(e), .. } = &response {
            warn!("descriptor lookup failed: {}", e);
        }
        deliver(response);
    })
}
