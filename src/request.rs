use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::types::HttpMethod;

/// A fully routed outbound request, ready for a transport.
///
/// Headers are kept sorted and the query keeps field order, so two builds
/// from the same inputs serialize identically.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// Base URL plus substituted path, without query string
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    /// JSON body; `None` for methods without a body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Map<String, Value>>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, url: String) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            query: Vec::new(),
            body: method.has_body().then(Map::new),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// URL including the encoded query string.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let encoded = serde_urlencoded::to_string(&self.query).unwrap_or_default();
        format!("{}?{}", self.url, encoded)
    }

    /// Copy with secret header values masked, safe to print or log.
    pub fn redacted(&self, secret_headers: &[&str]) -> Self {
        let mut copy = self.clone();
        for (name, value) in copy.headers.iter_mut() {
            if secret_headers.iter().any(|s| s.eq_ignore_ascii_case(name)) {
                *value = "***".to_string();
            }
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_has_no_body() {
        let req = RequestDescriptor::new(HttpMethod::Get, "https://x.test/a".to_string());
        assert!(req.body.is_none());

        let req = RequestDescriptor::new(HttpMethod::Patch, "https://x.test/a".to_string());
        assert_eq!(req.body, Some(Map::new()));
    }

    #[test]
    fn test_full_url_encodes_query() {
        let mut req = RequestDescriptor::new(
            HttpMethod::Get,
            "https://x.test/public/workspace/w1/content".to_string(),
        );
        assert_eq!(req.full_url(), "https://x.test/public/workspace/w1/content");

        req.query.push(("status".to_string(), String::new()));
        req.query.push(("searchTerm".to_string(), "café & co".to_string()));
        assert_eq!(
            req.full_url(),
            "https://x.test/public/workspace/w1/content?status=&searchTerm=caf%C3%A9+%26+co"
        );
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut req = RequestDescriptor::new(HttpMethod::Get, "https://x.test".to_string());
        req.headers
            .insert("X-API-Key".to_string(), "secret".to_string());
        assert_eq!(req.header("x-api-key"), Some("secret"));
        assert_eq!(req.header("Accept"), None);
    }

    #[test]
    fn test_redacted_masks_secret_headers() {
        let mut req = RequestDescriptor::new(HttpMethod::Get, "https://x.test".to_string());
        req.headers
            .insert("X-API-Key".to_string(), "secret".to_string());
        req.headers
            .insert("Accept".to_string(), "application/json".to_string());

        let redacted = req.redacted(&["x-api-key"]);
        assert_eq!(redacted.header("X-API-Key"), Some("***"));
        assert_eq!(redacted.header("Accept"), Some("application/json"));
        assert_eq!(req.header("X-API-Key"), Some("secret"));
    }
}
