//! Midiacode API credentials.
//!
//! A credential is an API key bound to a workspace. The key travels in the
//! `X-API-Key` header of every request; validity is checked with a single
//! GET against the `check-api-key` endpoint for that workspace.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use tracing::{info, warn};

use crate::config::ApiConfig;
use crate::error::ConnectorError;
use crate::request::RequestDescriptor;
use crate::table::DEFAULT_HEADERS;
use crate::transport::Transport;
use crate::types::{BaseUrl, FieldDefinition, FieldKind, HttpMethod};

pub const CREDENTIAL_NAME: &str = "midiacodeApi";
pub const API_KEY_HEADER: &str = "X-API-Key";
pub const VERIFY_PATH: &str = "/public/check-api-key/";

pub const API_KEY_ENV: &str = "MIDIACODE_API_KEY";
pub const WORKSPACE_ID_ENV: &str = "MIDIACODE_WORKSPACE_ID";

/// Declarative description of the credential type, for hosts that render it.
#[derive(Clone, Debug, Serialize)]
pub struct CredentialDefinition {
    pub name: &'static str,
    pub display_name: &'static str,
    pub fields: Vec<FieldDefinition>,
    pub auth_header: &'static str,
    pub verify_path: &'static str,
}

pub fn credential_definition() -> CredentialDefinition {
    let field = |key: &'static str,
                 label: &'static str,
                 kind: FieldKind,
                 description: &'static str| FieldDefinition {
        key,
        label,
        description,
        kind,
        default: json!(""),
        required: true,
        range: None,
        visibility: Vec::new(),
        routing: None,
    };
    CredentialDefinition {
        name: CREDENTIAL_NAME,
        display_name: "Midiacode API",
        fields: vec![
            field("apiKey", "API Key", FieldKind::Password, ""),
            field(
                "workspaceId",
                "Workspace ID",
                FieldKind::String,
                "The ID of your workspace (required for API key validation)",
            ),
        ],
        auth_header: API_KEY_HEADER,
        verify_path: VERIFY_PATH,
    }
}

/// API key and the workspace it belongs to.
#[derive(Clone, PartialEq)]
pub struct MidiacodeCredentials {
    pub api_key: String,
    pub workspace_id: String,
}

impl fmt::Debug for MidiacodeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MidiacodeCredentials")
            .field("api_key", &"***")
            .field("workspace_id", &self.workspace_id)
            .finish()
    }
}

impl MidiacodeCredentials {
    pub fn new(api_key: impl Into<String>, workspace_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            workspace_id: workspace_id.into(),
        }
    }

    /// Load credentials from environment variables:
    /// - `MIDIACODE_API_KEY`
    /// - `MIDIACODE_WORKSPACE_ID`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).context("MIDIACODE_API_KEY not set")?;
        let workspace_id =
            std::env::var(WORKSPACE_ID_ENV).context("MIDIACODE_WORKSPACE_ID not set")?;
        Ok(Self::new(api_key, workspace_id))
    }

    /// Both fields are required.
    pub fn ensure_complete(&self) -> Result<(), ConnectorError> {
        if self.api_key.trim().is_empty() {
            return Err(ConnectorError::invalid("apiKey", "is required"));
        }
        if self.workspace_id.trim().is_empty() {
            return Err(ConnectorError::invalid("workspaceId", "is required"));
        }
        Ok(())
    }

    /// Attaches the API key header.
    pub fn authenticate(&self, request: &mut RequestDescriptor) {
        request
            .headers
            .insert(API_KEY_HEADER.to_string(), self.api_key.clone());
    }

    /// The credential check request: GET `/public/check-api-key/?workspace_id=<id>`.
    pub fn verification_request(&self, api: &ApiConfig) -> Result<RequestDescriptor, ConnectorError> {
        self.ensure_complete()?;
        let url = format!("{}{}", api.resolve(BaseUrl::Content), VERIFY_PATH);
        let mut request = RequestDescriptor::new(HttpMethod::Get, url);
        for (name, value) in DEFAULT_HEADERS {
            request.headers.insert(name.to_string(), value.to_string());
        }
        request
            .query
            .push(("workspace_id".to_string(), self.workspace_id.clone()));
        self.authenticate(&mut request);
        Ok(request)
    }

    /// Sends the credential check once. Any 2xx is a valid credential.
    pub async fn verify(
        &self,
        api: &ApiConfig,
        transport: &dyn Transport,
    ) -> Result<(), ConnectorError> {
        let request = self.verification_request(api)?;
        let response = transport
            .send(&request)
            .await
            .map_err(|e| ConnectorError::CredentialInvalid {
                reason: e.to_string(),
            })?;

        if response.is_success() {
            info!(workspace_id = %self.workspace_id, "Midiacode API key verified");
            Ok(())
        } else {
            warn!(
                workspace_id = %self.workspace_id,
                status = response.status,
                "Midiacode API key rejected"
            );
            Err(ConnectorError::CredentialInvalid {
                reason: format!("check-api-key returned status {}", response.status),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env-var tests share the process-wide environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_credential_definition() {
        let def = credential_definition();
        assert_eq!(def.name, "midiacodeApi");
        assert_eq!(def.auth_header, "X-API-Key");
        assert_eq!(def.fields.len(), 2);
        assert_eq!(def.fields[0].key, "apiKey");
        assert_eq!(def.fields[0].kind, FieldKind::Password);
        assert!(def.fields.iter().all(|f| f.required));
    }

    #[test]
    fn test_verification_request() {
        let creds = MidiacodeCredentials::new("key-123", "ws-42");
        let req = creds.verification_request(&ApiConfig::default()).unwrap();

        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.full_url(),
            "https://contentcore.midiacode.pt/public/check-api-key/?workspace_id=ws-42"
        );
        assert_eq!(req.header("X-API-Key"), Some("key-123"));
        assert_eq!(req.header("Accept"), Some("application/json"));
        assert!(req.body.is_none());
    }

    #[test]
    fn test_incomplete_credentials_rejected() {
        let creds = MidiacodeCredentials::new("", "ws-42");
        let err = creds.verification_request(&ApiConfig::default()).unwrap_err();
        assert_eq!(err, ConnectorError::invalid("apiKey", "is required"));

        let creds = MidiacodeCredentials::new("key", "  ");
        let err = creds.ensure_complete().unwrap_err();
        assert_eq!(err, ConnectorError::invalid("workspaceId", "is required"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let creds = MidiacodeCredentials::new("super-secret", "ws-1");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("ws-1"));
    }

    #[test]
    fn test_from_env_missing() {
        let _lock = ENV_LOCK.lock().unwrap();
        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var(WORKSPACE_ID_ENV);

        let result = MidiacodeCredentials::from_env();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("MIDIACODE_API_KEY"));
    }

    #[test]
    fn test_from_env_success() {
        let _lock = ENV_LOCK.lock().unwrap();
        std::env::set_var(API_KEY_ENV, "env-key");
        std::env::set_var(WORKSPACE_ID_ENV, "env-ws");

        let creds = MidiacodeCredentials::from_env().unwrap();
        assert_eq!(creds.api_key, "env-key");
        assert_eq!(creds.workspace_id, "env-ws");

        std::env::remove_var(API_KEY_ENV);
        std::env::remove_var(WORKSPACE_ID_ENV);
    }
}
