//! Declarative building blocks of the routing table.
//!
//! Everything here is immutable data: fields, operations and the node
//! metadata are built once by [`crate::table`] and only read afterwards.

use serde::Serialize;
use serde_json::Value;

/// HTTP methods used by the Midiacode API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// Whether requests with this method carry a JSON body.
    pub fn has_body(&self) -> bool {
        !matches!(self, HttpMethod::Get)
    }
}

/// Which of the two Midiacode hosts an operation talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseUrl {
    /// Content API (`contentcore`)
    Content,
    /// Account API (`account`), used for push notifications
    Account,
}

/// A selectable value of an options field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OptionValue {
    pub name: &'static str,
    pub value: &'static str,
}

/// Value kind of a field.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    /// Secret string, never logged
    Password,
    Number,
    Boolean,
    Options {
        options: Vec<OptionValue>,
        /// Values outside `options` are passed through instead of rejected
        accepts_custom: bool,
    },
}

/// Inclusive numeric bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Range {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Where a routed value lands in the outbound request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Query,
    Body,
}

/// Wire transform applied to a field value before placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueTransform {
    /// `"a, b"` becomes `["a", "b"]`; an empty string becomes `[]`
    CommaSeparatedList,
}

impl ValueTransform {
    pub fn apply(&self, raw: &str) -> Value {
        match self {
            ValueTransform::CommaSeparatedList => Value::Array(
                raw.split(',')
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(|token| Value::String(token.to_string()))
                    .collect(),
            ),
        }
    }
}

/// Routing directive of a field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Routing {
    pub placement: Placement,
    /// Key used on the wire; `None` means the field key itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_key: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<ValueTransform>,
}

/// A (resource, operation) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct OperationKey {
    pub resource: &'static str,
    pub operation: &'static str,
}

/// A single user-facing parameter of the node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub default: Value,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    pub visibility: Vec<OperationKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<Routing>,
}

impl FieldDefinition {
    pub fn is_visible(&self, resource: &str, operation: &str) -> bool {
        self.visibility
            .iter()
            .any(|k| k.resource == resource && k.operation == operation)
    }

    /// Key the value is sent under, if the field is routed.
    pub fn remote_key(&self) -> Option<&'static str> {
        self.routing
            .as_ref()
            .map(|r| r.remote_key.unwrap_or(self.key))
    }
}

/// Method, host and path of an operation's base request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RequestTemplate {
    pub base: BaseUrl,
    pub method: HttpMethod,
    /// Path with `{fieldKey}` placeholders
    pub path: &'static str,
}

impl RequestTemplate {
    /// Field keys referenced by `{...}` placeholders, in order.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        let mut rest = self.path;
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    keys.push(&after[..end]);
                    rest = &after[end + 1..];
                }
                None => break,
            }
        }
        keys
    }
}

/// One operation of a resource together with its visible fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OperationDefinition {
    pub resource: &'static str,
    pub operation: &'static str,
    pub name: &'static str,
    pub action: &'static str,
    pub description: &'static str,
    pub request: RequestTemplate,
    pub fields: Vec<FieldDefinition>,
}

impl OperationDefinition {
    pub fn key(&self) -> OperationKey {
        OperationKey {
            resource: self.resource,
            operation: self.operation,
        }
    }

    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// A top-level resource offered by the node.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResourceDefinition {
    pub name: &'static str,
    pub value: &'static str,
}

/// Static metadata describing the node to a workflow host.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeMetadata {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub version: u32,
    pub group: &'static str,
    pub credential: &'static str,
    pub credential_required: bool,
    pub documentation_url: &'static str,
    /// `{operation}` and `{resource}` are filled in by the host
    pub subtitle: &'static str,
}

impl NodeMetadata {
    /// Subtitle shown under the node, e.g. `"search: content"`.
    pub fn render_subtitle(&self, resource: &str, operation: &str) -> String {
        self.subtitle
            .replace("{operation}", operation)
            .replace("{resource}", resource)
    }
}
