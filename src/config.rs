use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::BaseUrl;

pub const BASE_URL: &str = "https://contentcore.midiacode.pt";
pub const NOTIFICATION_BASE_URL: &str = "https://account.midiacode.pt";
pub const DOCUMENTATION_URL: &str = "https://contentcore.midiacode.pt/docs/";
pub const USER_AGENT: &str = concat!("midiacode-connector/", env!("CARGO_PKG_VERSION"));

/// Complete connector configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectorConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Midiacode API hosts
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Host serving push notifications
    #[serde(default = "default_notification_base_url")]
    pub notification_base_url: String,
}

fn default_base_url() -> String {
    BASE_URL.to_string()
}

fn default_notification_base_url() -> String {
    NOTIFICATION_BASE_URL.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            notification_base_url: default_notification_base_url(),
        }
    }
}

impl ApiConfig {
    /// Both hosts pointing at one URL (for testing with a mock server).
    pub fn single_host(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            base_url: url.clone(),
            notification_base_url: url,
        }
    }

    /// Resolves a template's host, without a trailing slash.
    pub fn resolve(&self, base: BaseUrl) -> &str {
        let url = match base {
            BaseUrl::Content => &self.base_url,
            BaseUrl::Account => &self.notification_base_url,
        };
        url.trim_end_matches('/')
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    USER_AGENT.to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<ConnectorConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: ConnectorConfig =
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ConnectorConfig::default();
        assert_eq!(config.api.base_url, "https://contentcore.midiacode.pt");
        assert_eq!(config.api.notification_base_url, "https://account.midiacode.pt");
        assert!(config.http.user_agent.starts_with("midiacode-connector/"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [api]
            base_url = "https://staging.example.com"
            notification_base_url = "https://accounts.staging.example.com"

            [http]
            user_agent = "workflow-host/2.0"
        "#;

        let config: ConnectorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "https://staging.example.com");
        assert_eq!(
            config.api.notification_base_url,
            "https://accounts.staging.example.com"
        );
        assert_eq!(config.http.user_agent, "workflow-host/2.0");
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [api]
            base_url = "http://localhost:8080"
        "#;

        let config: ConnectorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.notification_base_url, NOTIFICATION_BASE_URL); // Default
        assert_eq!(config.http.user_agent, USER_AGENT); // Default
    }

    #[test]
    fn test_resolve_strips_trailing_slash() {
        let api = ApiConfig::single_host("http://127.0.0.1:1234/");
        assert_eq!(api.resolve(BaseUrl::Content), "http://127.0.0.1:1234");
        assert_eq!(api.resolve(BaseUrl::Account), "http://127.0.0.1:1234");

        let api = ApiConfig::default();
        assert_eq!(api.resolve(BaseUrl::Account), NOTIFICATION_BASE_URL);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nnotification_base_url = \"http://notify.local\"").unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.api.base_url, BASE_URL);
        assert_eq!(config.api.notification_base_url, "http://notify.local");
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/midiacode.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
