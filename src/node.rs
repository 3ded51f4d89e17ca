use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ConnectorConfig;
use crate::credentials::{credential_definition, CredentialDefinition, MidiacodeCredentials};
use crate::error::ConnectorError;
use crate::request::RequestDescriptor;
use crate::router::{FieldValues, Router};
use crate::table::{routing_table, RoutingTable};
use crate::transport::{HttpTransport, Transport};

/// Everything a workflow host needs to render and register the node.
#[derive(Debug, Serialize)]
pub struct NodeDescription {
    #[serde(flatten)]
    pub table: &'static RoutingTable,
    pub credential: CredentialDefinition,
}

/// The Midiacode node: routes an operation, sends it, returns the JSON answer.
///
/// Holds no per-invocation state; one instance can serve any number of
/// concurrent executions.
pub struct MidiacodeNode {
    router: Router,
    credentials: MidiacodeCredentials,
    transport: Arc<dyn Transport>,
}

impl MidiacodeNode {
    /// Node against the public Midiacode hosts.
    pub fn new(credentials: MidiacodeCredentials) -> Result<Self, ConnectorError> {
        Self::from_config(&ConnectorConfig::default(), credentials)
    }

    pub fn from_config(
        config: &ConnectorConfig,
        credentials: MidiacodeCredentials,
    ) -> Result<Self, ConnectorError> {
        let transport = HttpTransport::new(&config.http)?;
        Ok(Self::with_transport(
            Router::with_api(config.api.clone()),
            credentials,
            Arc::new(transport),
        ))
    }

    /// Node with a host-provided transport.
    pub fn with_transport(
        router: Router,
        credentials: MidiacodeCredentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            router,
            credentials,
            transport,
        }
    }

    pub fn describe() -> NodeDescription {
        NodeDescription {
            table: routing_table(),
            credential: credential_definition(),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Builds the authenticated request without sending it.
    pub fn build(
        &self,
        resource: &str,
        operation: &str,
        values: &FieldValues,
    ) -> Result<RequestDescriptor, ConnectorError> {
        self.router
            .build_request(resource, operation, values, &self.credentials)
    }

    /// Runs one operation and returns the response body.
    ///
    /// A non-2xx answer is reported as [`ConnectorError::Api`].
    pub async fn execute(
        &self,
        resource: &str,
        operation: &str,
        values: &FieldValues,
    ) -> Result<Value, ConnectorError> {
        let request = self.build(resource, operation, values)?;
        let response = self.transport.send(&request).await?;

        if !response.is_success() {
            warn!(
                resource,
                operation,
                status = response.status,
                "Midiacode operation failed"
            );
            return Err(ConnectorError::Api {
                status: response.status,
                body: response.body,
            });
        }

        info!(resource, operation, status = response.status, "Midiacode operation completed");
        Ok(response.body)
    }

    /// Verifies the node's credentials against the API.
    pub async fn test_credentials(&self) -> Result<(), ConnectorError> {
        self.credentials
            .verify(self.router.api(), self.transport.as_ref())
            .await
    }
}
