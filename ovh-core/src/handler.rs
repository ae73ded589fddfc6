//! Handler traits for resources and data sources
//!
//! A resource handler implements the create/read/update/delete lifecycle
//! against the OVH API; a data source handler only fetches. Handlers are
//! stateless: the per-session client is passed into every operation.

use std::future::Future;
use std::pin::Pin;

use ovh_client::{ClientError, OvhClient};

use crate::schema::ResourceSchema;
use crate::value::Attributes;

/// Error type for handler operations
#[derive(Debug)]
pub struct HandlerError {
    pub message: String,
    /// Public name of the resource the operation was acting on
    pub resource: Option<String>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref resource) = self.resource {
            write!(f, "[{}] {}", resource, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource: None,
            cause: None,
        }
    }

    /// A required configuration attribute was not supplied
    pub fn missing_attribute(name: &str) -> Self {
        Self::new(format!("Missing required attribute '{}'", name))
    }

    pub fn for_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl From<ClientError> for HandlerError {
    fn from(e: ClientError) -> Self {
        Self::new(e.to_string()).with_cause(e)
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;

/// Return type for async handler operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// State observed on the remote side for one resource
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteState {
    /// Remote identifier (record id, network id, ...)
    pub id: Option<String>,
    pub attributes: Attributes,
    /// Whether the resource exists remotely
    pub exists: bool,
}

impl RemoteState {
    pub fn not_found() -> Self {
        Self {
            id: None,
            attributes: Attributes::new(),
            exists: false,
        }
    }

    pub fn existing(attributes: Attributes) -> Self {
        Self {
            id: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The remote identifier, or an error when the state has none
    pub fn require_id(&self) -> HandlerResult<&str> {
        self.id
            .as_deref()
            .ok_or_else(|| HandlerError::new("Remote state has no identifier"))
    }
}

/// Lifecycle handler for one managed resource type
pub trait ResourceHandler: Send + Sync {
    /// Configuration and state schema for this resource type
    fn schema(&self) -> ResourceSchema;

    /// Create the resource and return its observed state
    fn create<'a>(
        &'a self,
        client: &'a OvhClient,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>>;

    /// Refresh the observed state; `exists` is false when the resource is gone
    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>>;

    /// Reconcile the remote resource toward the desired attributes
    fn update<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
        desired: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>>;

    /// Delete the resource
    fn delete<'a>(
        &'a self,
        client: &'a OvhClient,
        state: &'a RemoteState,
    ) -> BoxFuture<'a, HandlerResult<()>>;
}

/// Read-only handler for one data source type
pub trait DataSourceHandler: Send + Sync {
    /// Configuration and result schema for this data source
    fn schema(&self) -> ResourceSchema;

    /// Fetch the data source
    fn read<'a>(
        &'a self,
        client: &'a OvhClient,
        config: &'a Attributes,
    ) -> BoxFuture<'a, HandlerResult<RemoteState>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovh_client::ClientConfig;

    struct EchoHandler;

    impl ResourceHandler for EchoHandler {
        fn schema(&self) -> ResourceSchema {
            ResourceSchema::new()
        }

        fn create<'a>(
            &'a self,
            _client: &'a OvhClient,
            desired: &'a Attributes,
        ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
            Box::pin(async move { Ok(RemoteState::existing(desired.clone()).with_id("echo-1")) })
        }

        fn read<'a>(
            &'a self,
            _client: &'a OvhClient,
            state: &'a RemoteState,
        ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
            Box::pin(async move { Ok(state.clone()) })
        }

        fn update<'a>(
            &'a self,
            _client: &'a OvhClient,
            state: &'a RemoteState,
            desired: &'a Attributes,
        ) -> BoxFuture<'a, HandlerResult<RemoteState>> {
            let id = state.id.clone();
            Box::pin(async move {
                let mut updated = RemoteState::existing(desired.clone());
                updated.id = id;
                Ok(updated)
            })
        }

        fn delete<'a>(
            &'a self,
            _client: &'a OvhClient,
            _state: &'a RemoteState,
        ) -> BoxFuture<'a, HandlerResult<()>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn test_client() -> OvhClient {
        OvhClient::new(ClientConfig {
            endpoint: "ovh-eu".to_string(),
            application_key: "ak".to_string(),
            application_secret: "as".to_string(),
            consumer_key: "ck".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn echo_handler_round_trip() {
        let client = test_client();
        let handler = EchoHandler;
        let desired = Attributes::new().with("name", "value");

        let created = handler.create(&client, &desired).await.unwrap();
        assert!(created.exists);
        assert_eq!(created.id.as_deref(), Some("echo-1"));

        let read = handler.read(&client, &created).await.unwrap();
        assert_eq!(read, created);

        handler.delete(&client, &read).await.unwrap();
    }

    #[test]
    fn handler_error_display_includes_resource() {
        let error = HandlerError::new("boom").for_resource("ovh_domain_zone_record");
        assert_eq!(error.to_string(), "[ovh_domain_zone_record] boom");
    }

    #[test]
    fn require_id_on_fresh_state_fails() {
        let state = RemoteState::not_found();
        assert!(state.require_id().is_err());
    }
}
