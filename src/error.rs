use serde_json::Value;
use std::fmt;

/// Errors raised while routing, authenticating or sending a Midiacode request.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectorError {
    /// The (resource, operation) pair is not registered in the routing table
    UnknownOperation { resource: String, operation: String },
    /// A field referenced by the URL template is required but empty
    MissingPathParameter { field: String },
    /// A field value failed its presence, kind or range constraint
    InvalidParameter { field: String, reason: String },
    /// The credential check returned non-2xx or could not be reached
    CredentialInvalid { reason: String },
    /// Network-level failure while sending a request
    TransportFailure(String),
    /// The API answered with a non-2xx status
    Api { status: u16, body: Value },
}

impl ConnectorError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConnectorError::InvalidParameter {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorError::UnknownOperation { resource, operation } => {
                write!(f, "unknown operation '{}' for resource '{}'", operation, resource)
            }
            ConnectorError::MissingPathParameter { field } => {
                write!(f, "path parameter '{}' is required", field)
            }
            ConnectorError::InvalidParameter { field, reason } => {
                write!(f, "invalid parameter '{}': {}", field, reason)
            }
            ConnectorError::CredentialInvalid { reason } => {
                write!(f, "credential check failed: {}", reason)
            }
            ConnectorError::TransportFailure(msg) => write!(f, "transport failure: {}", msg),
            ConnectorError::Api { status, body } => {
                write!(f, "Midiacode API error {}: {}", status, body)
            }
        }
    }
}

impl std::error::Error for ConnectorError {}
