use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::ConnectorError;
use crate::request::RequestDescriptor;
use crate::types::HttpMethod;

/// Raw answer from the Midiacode API.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON, the raw text as a JSON string if it is not JSON, or null if empty
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub(crate) fn from_text(status: u16, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        };
        Self { status, body }
    }
}

/// Sends routed requests. Hosts with their own HTTP stack implement this.
///
/// Implementations send exactly once: no retries, no partial requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, ConnectorError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ConnectorError::TransportFailure(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, ConnectorError> {
        debug!(method = request.method.as_str(), url = %request.url, "Sending Midiacode request");

        let mut builder = self
            .client
            .request(reqwest_method(request.method), &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ConnectorError::TransportFailure(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ConnectorError::TransportFailure(e.to_string()))?;

        debug!(status, "Midiacode response received");
        Ok(ApiResponse::from_text(status, &text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::{json, Map};

    fn transport() -> HttpTransport {
        HttpTransport::new(&HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_response_body_parsing() {
        assert_eq!(ApiResponse::from_text(200, r#"{"id": 1}"#).body, json!({"id": 1}));
        assert_eq!(ApiResponse::from_text(204, "").body, Value::Null);
        assert_eq!(
            ApiResponse::from_text(502, "Bad Gateway").body,
            json!("Bad Gateway")
        );
        assert!(ApiResponse::from_text(201, "").is_success());
        assert!(!ApiResponse::from_text(404, "").is_success());
    }

    #[tokio::test]
    async fn test_sends_query_headers_and_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/public/content/c-1/")
            .match_query(Matcher::UrlEncoded("trace".into(), "yes".into()))
            .match_header("x-api-key", "k")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"title": "New"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "c-1", "title": "New"}"#)
            .create_async()
            .await;

        let mut request = RequestDescriptor::new(
            HttpMethod::Patch,
            format!("{}/public/content/c-1/", server.url()),
        );
        request.query.push(("trace".to_string(), "yes".to_string()));
        request
            .headers
            .insert("X-API-Key".to_string(), "k".to_string());
        let mut body = Map::new();
        body.insert("title".to_string(), json!("New"));
        request.body = Some(body);

        let response = transport().send(&request).await.unwrap();
        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body["title"], "New");
    }

    #[tokio::test]
    async fn test_non_success_is_returned_not_raised() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/public/content/missing/")
            .with_status(404)
            .with_body(r#"{"detail": "Not found."}"#)
            .create_async()
            .await;

        let request = RequestDescriptor::new(
            HttpMethod::Get,
            format!("{}/public/content/missing/", server.url()),
        );
        let response = transport().send(&request).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.body, json!({"detail": "Not found."}));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_failure() {
        let request = RequestDescriptor::new(HttpMethod::Get, "http://127.0.0.1:1/".to_string());
        let err = transport().send(&request).await.unwrap_err();
        assert!(matches!(err, ConnectorError::TransportFailure(_)));
    }
}
