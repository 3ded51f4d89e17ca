//! Turns (resource, operation, field values) into one [`RequestDescriptor`].
//!
//! Building is pure: the same table, endpoints and inputs always produce the
//! same descriptor, and every parameter error is raised before anything is
//! sent.

use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::config::ApiConfig;
use crate::credentials::MidiacodeCredentials;
use crate::error::ConnectorError;
use crate::request::RequestDescriptor;
use crate::table::{routing_table, RoutingTable, DEFAULT_HEADERS};
use crate::types::{FieldDefinition, FieldKind, OperationDefinition, Placement};

/// Field key → user-supplied value. Missing keys fall back to field defaults.
pub type FieldValues = Map<String, Value>;

/// Request builder over the routing table.
#[derive(Clone, Debug)]
pub struct Router {
    table: &'static RoutingTable,
    api: ApiConfig,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Router targeting the public Midiacode hosts.
    pub fn new() -> Self {
        Self::with_api(ApiConfig::default())
    }

    /// Router with custom hosts (for testing with a mock server).
    pub fn with_api(api: ApiConfig) -> Self {
        Self {
            table: routing_table(),
            api,
        }
    }

    pub fn table(&self) -> &'static RoutingTable {
        self.table
    }

    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    /// Builds the authenticated request for an operation.
    pub fn build_request(
        &self,
        resource: &str,
        operation: &str,
        values: &FieldValues,
        credentials: &MidiacodeCredentials,
    ) -> Result<RequestDescriptor, ConnectorError> {
        let mut request = self.prepare(resource, operation, values)?;
        credentials.authenticate(&mut request);
        Ok(request)
    }

    /// Builds the request without the authentication header.
    pub fn prepare(
        &self,
        resource: &str,
        operation: &str,
        values: &FieldValues,
    ) -> Result<RequestDescriptor, ConnectorError> {
        let op = self.table.operation(resource, operation)?;
        let path = substitute_path(op, values)?;
        let url = format!("{}{}", self.api.resolve(op.request.base), path);
        let mut request = RequestDescriptor::new(op.request.method, url);

        for field in &op.fields {
            let Some(routing) = &field.routing else {
                continue;
            };
            let Some(value) = resolve_value(field, values)? else {
                continue;
            };
            let value = match (routing.transform, value) {
                (Some(transform), Value::String(raw)) => transform.apply(&raw),
                (_, value) => value,
            };
            let remote_key = routing.remote_key.unwrap_or(field.key);

            match routing.placement {
                Placement::Query => append_query(&mut request.query, remote_key, &value),
                Placement::Body => {
                    // GET operations never route into the body (see RoutingTable::validate)
                    if let Some(body) = request.body.as_mut() {
                        body.insert(remote_key.to_string(), value);
                    }
                }
            }
        }

        for (name, value) in DEFAULT_HEADERS {
            request.headers.insert(name.to_string(), value.to_string());
        }

        debug!(
            resource,
            operation,
            method = request.method.as_str(),
            url = %request.url,
            "Built Midiacode request"
        );
        Ok(request)
    }
}

/// Null or blank. Same rule as path parameters and credentials.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn substitute_path(op: &OperationDefinition, values: &FieldValues) -> Result<String, ConnectorError> {
    let mut path = op.request.path.to_string();
    for key in op.request.placeholders() {
        let missing = || ConnectorError::MissingPathParameter {
            field: key.to_string(),
        };
        let field = op.field(key).ok_or_else(missing)?;
        let value = values.get(key).unwrap_or(&field.default);
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        if text.is_empty() {
            return Err(missing());
        }
        path = path.replace(&format!("{{{}}}", key), &urlencoding::encode(&text));
    }
    Ok(path)
}

/// Resolves and validates a field's value. `None` means "omit".
fn resolve_value(
    field: &FieldDefinition,
    values: &FieldValues,
) -> Result<Option<Value>, ConnectorError> {
    let raw = values.get(field.key).unwrap_or(&field.default);

    if is_empty(raw) {
        if field.required {
            return Err(ConnectorError::invalid(field.key, "is required"));
        }
        if raw.is_null() {
            return Ok(None);
        }
    }

    let value = match &field.kind {
        FieldKind::String | FieldKind::Password => coerce_string(field, raw)?,
        FieldKind::Number => coerce_number(field, raw)?,
        FieldKind::Boolean => coerce_bool(field, raw)?,
        FieldKind::Options {
            options,
            accepts_custom,
        } => {
            let text = coerce_string(field, raw)?;
            let chosen = text.as_str().unwrap_or_default();
            if !accepts_custom && !options.iter().any(|o| o.value == chosen) {
                let allowed: Vec<String> =
                    options.iter().map(|o| format!("'{}'", o.value)).collect();
                return Err(ConnectorError::invalid(
                    field.key,
                    format!("must be one of {}", allowed.join(", ")),
                ));
            }
            text
        }
    };
    Ok(Some(value))
}

fn coerce_string(field: &FieldDefinition, raw: &Value) -> Result<Value, ConnectorError> {
    match raw {
        Value::String(_) => Ok(raw.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        _ => Err(ConnectorError::invalid(field.key, "must be a string")),
    }
}

fn coerce_number(field: &FieldDefinition, raw: &Value) -> Result<Value, ConnectorError> {
    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .ok_or_else(|| ConnectorError::invalid(field.key, "must be a number"))?;

    if let Some(range) = &field.range {
        if let Some(min) = range.min {
            if number < min {
                return Err(ConnectorError::invalid(
                    field.key,
                    format!("must be at least {}", min),
                ));
            }
        }
        if let Some(max) = range.max {
            if number > max {
                return Err(ConnectorError::invalid(
                    field.key,
                    format!("must be at most {}", max),
                ));
            }
        }
    }

    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        return Ok(Value::Number(Number::from(number as i64)));
    }
    Number::from_f64(number)
        .map(Value::Number)
        .ok_or_else(|| ConnectorError::invalid(field.key, "must be a number"))
}

fn coerce_bool(field: &FieldDefinition, raw: &Value) -> Result<Value, ConnectorError> {
    match raw {
        Value::Bool(_) => Ok(raw.clone()),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        _ => Err(ConnectorError::invalid(field.key, "must be a boolean")),
    }
}

fn append_query(query: &mut Vec<(String, String)>, key: &str, value: &Value) {
    match value {
        Value::String(s) => query.push((key.to_string(), s.clone())),
        Value::Array(items) => {
            for item in items {
                append_query(query, key, item);
            }
        }
        other => query.push((key.to_string(), other.to_string())),
    }
}
