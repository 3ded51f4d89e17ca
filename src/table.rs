//! The Midiacode routing table.
//!
//! Fields are declared once, in display order, each with the operations it
//! is visible for. Operations pick up their fields from that list when the
//! table is built. The table is built lazily on first use and never mutated.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::config::DOCUMENTATION_URL;
use crate::error::ConnectorError;
use crate::types::{
    BaseUrl, FieldDefinition, FieldKind, HttpMethod, NodeMetadata, OperationDefinition,
    OperationKey, OptionValue, Placement, Range, RequestTemplate, ResourceDefinition, Routing,
    ValueTransform,
};

pub const CONTENT: &str = "content";
pub const PUSH_NOTIFICATION: &str = "pushNotification";

/// Headers sent with every request.
pub const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("Accept", "application/json"),
    ("Content-Type", "application/json"),
];

pub const PAGE_SIZE_MIN: f64 = 1.0;
pub const PAGE_SIZE_MAX: f64 = 500.0;

static TABLE: OnceLock<RoutingTable> = OnceLock::new();

/// Returns the process-wide routing table.
pub fn routing_table() -> &'static RoutingTable {
    TABLE.get_or_init(RoutingTable::build)
}

/// Immutable set of resources, operations and fields exposed by the node.
#[derive(Debug, Serialize)]
pub struct RoutingTable {
    pub node: NodeMetadata,
    pub resources: Vec<ResourceDefinition>,
    pub operations: Vec<OperationDefinition>,
    /// Declaration-order field list the operations were built from
    #[serde(skip)]
    pub fields: Vec<FieldDefinition>,
}

impl RoutingTable {
    fn build() -> Self {
        let fields = declare_fields();
        let operations = declare_operations()
            .into_iter()
            .map(|(resource, operation, name, action, description, request)| {
                let visible = fields
                    .iter()
                    .filter(|f| f.is_visible(resource, operation))
                    .cloned()
                    .collect();
                OperationDefinition {
                    resource,
                    operation,
                    name,
                    action,
                    description,
                    request,
                    fields: visible,
                }
            })
            .collect();

        Self {
            node: NodeMetadata {
                name: "midiacode",
                display_name: "Midiacode",
                description: "Consume Midiacode API",
                version: 1,
                group: "transform",
                credential: "midiacodeApi",
                credential_required: true,
                documentation_url: DOCUMENTATION_URL,
                subtitle: "{operation}: {resource}",
            },
            resources: vec![
                ResourceDefinition {
                    name: "Content",
                    value: CONTENT,
                },
                ResourceDefinition {
                    name: "Push Notification",
                    value: PUSH_NOTIFICATION,
                },
            ],
            operations,
            fields,
        }
    }

    /// Looks up an operation.
    pub fn operation(
        &self,
        resource: &str,
        operation: &str,
    ) -> Result<&OperationDefinition, ConnectorError> {
        self.operations
            .iter()
            .find(|op| op.resource == resource && op.operation == operation)
            .ok_or_else(|| ConnectorError::UnknownOperation {
                resource: resource.to_string(),
                operation: operation.to_string(),
            })
    }

    /// Operations of one resource, in display order.
    pub fn operations_for<'a>(
        &'a self,
        resource: &'a str,
    ) -> impl Iterator<Item = &'a OperationDefinition> + 'a {
        self.operations.iter().filter(move |op| op.resource == resource)
    }

    /// First declared field with this key.
    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Checks the structural invariants of the table and lists every violation.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let declared: HashSet<OperationKey> = self.operations.iter().map(|op| op.key()).collect();
        let mut problems = Vec::new();

        for field in &self.fields {
            if field.visibility.is_empty() {
                problems.push(format!("field '{}' is not visible anywhere", field.key));
            }
            for key in &field.visibility {
                if !declared.contains(key) {
                    problems.push(format!(
                        "field '{}' is shown for undeclared operation {}.{}",
                        field.key, key.resource, key.operation
                    ));
                }
            }
            if field.range.is_some() && field.kind != FieldKind::Number {
                problems.push(format!("field '{}' has a range but is not numeric", field.key));
            }
            if let FieldKind::Options { options, .. } = &field.kind {
                let default_ok = field
                    .default
                    .as_str()
                    .map_or(false, |d| options.iter().any(|o| o.value == d));
                if !default_ok {
                    problems.push(format!("field '{}' default is not an option", field.key));
                }
            }
        }

        for op in &self.operations {
            let mut seen = HashSet::new();
            for field in &op.fields {
                if !seen.insert(field.key) {
                    problems.push(format!(
                        "{}.{} shows field '{}' twice",
                        op.resource, op.operation, field.key
                    ));
                }
                let body_routed = field
                    .routing
                    .as_ref()
                    .map_or(false, |r| r.placement == Placement::Body);
                if body_routed && !op.request.method.has_body() {
                    problems.push(format!(
                        "{}.{} has no body but routes '{}' into it",
                        op.resource, op.operation, field.key
                    ));
                }
            }
            for placeholder in op.request.placeholders() {
                match op.field(placeholder) {
                    Some(field) if field.routing.is_none() => {}
                    Some(_) => problems.push(format!(
                        "{}.{} path field '{}' must not also be routed",
                        op.resource, op.operation, placeholder
                    )),
                    None => problems.push(format!(
                        "{}.{} path references unknown field '{}'",
                        op.resource, op.operation, placeholder
                    )),
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

fn show(resource: &'static str, operations: &[&'static str]) -> Vec<OperationKey> {
    operations
        .iter()
        .map(|&operation| OperationKey {
            resource,
            operation,
        })
        .collect()
}

fn option_values(values: &[(&'static str, &'static str)]) -> Vec<OptionValue> {
    values
        .iter()
        .map(|&(name, value)| OptionValue { name, value })
        .collect()
}

fn options(values: &[(&'static str, &'static str)]) -> FieldKind {
    FieldKind::Options {
        options: option_values(values),
        accepts_custom: false,
    }
}

/// Suggested values only; anything else is forwarded to the API as-is.
fn open_options(values: &[(&'static str, &'static str)]) -> FieldKind {
    FieldKind::Options {
        options: option_values(values),
        accepts_custom: true,
    }
}

impl FieldDefinition {
    fn new(key: &'static str, label: &'static str, kind: FieldKind, default: Value) -> Self {
        Self {
            key,
            label,
            description: "",
            kind,
            default,
            required: false,
            range: None,
            visibility: Vec::new(),
            routing: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.range = Some(Range { min, max });
        self
    }

    fn show(mut self, visibility: Vec<OperationKey>) -> Self {
        self.visibility = visibility;
        self
    }

    fn send(mut self, placement: Placement, remote_key: Option<&'static str>) -> Self {
        self.routing = Some(Routing {
            placement,
            remote_key,
            transform: None,
        });
        self
    }

    fn query(self, remote_key: &'static str) -> Self {
        self.send(Placement::Query, Some(remote_key))
    }

    fn body(self, remote_key: &'static str) -> Self {
        self.send(Placement::Body, Some(remote_key))
    }

    fn transform(mut self, transform: ValueTransform) -> Self {
        if let Some(routing) = self.routing.as_mut() {
            routing.transform = Some(transform);
        }
        self
    }
}

type OperationDecl = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    RequestTemplate,
);

fn request(base: BaseUrl, method: HttpMethod, path: &'static str) -> RequestTemplate {
    RequestTemplate { base, method, path }
}

fn declare_operations() -> Vec<OperationDecl> {
    use BaseUrl::{Account, Content};
    use HttpMethod::{Get, Patch, Post};

    vec![
        (
            CONTENT,
            "search",
            "Search",
            "Search contents",
            "Search contents of a workspace",
            request(Content, Get, "/public/workspace/{workspaceId}/content"),
        ),
        (
            CONTENT,
            "create",
            "Create",
            "Create a content",
            "Create a new content",
            request(Content, Post, "/public/content/"),
        ),
        (
            CONTENT,
            "get",
            "Get",
            "Get a content",
            "Get a content by ID",
            request(Content, Get, "/public/content/{contentId}/"),
        ),
        (
            CONTENT,
            "update",
            "Update",
            "Update a content",
            "Update an existing content",
            request(Content, Patch, "/public/content/{contentId}/"),
        ),
        (
            CONTENT,
            "getLink",
            "Get Link",
            "Get a content link",
            "Get the link settings of a content",
            request(Content, Get, "/public/content/{contentId}/link/"),
        ),
        (
            CONTENT,
            "updateLink",
            "Update Link",
            "Update a content link",
            "Update the link settings of a content",
            request(Content, Patch, "/public/content/{contentId}/link/"),
        ),
        (
            CONTENT,
            "publish",
            "Publish",
            "Publish a content",
            "Change the publication status of a content",
            request(Content, Post, "/public/content/publish/"),
        ),
        (
            PUSH_NOTIFICATION,
            "send",
            "Send",
            "Send a push notification",
            "Send a push notification to app users",
            request(Account, Post, "/public/push-notification/"),
        ),
    ]
}

fn declare_fields() -> Vec<FieldDefinition> {
    use FieldKind::{Boolean, Number};

    let status_options = &[
        ("Draft", "dra"),
        ("Published", "pub"),
        ("Archived", "arc"),
    ];

    vec![
        // Search
        FieldDefinition::new("workspaceId", "Workspace ID", FieldKind::String, json!(""))
            .required()
            .describe("The ID of the workspace")
            .show(show(CONTENT, &["search"])),
        FieldDefinition::new(
            "status",
            "Status",
            options(&[
                ("All", ""),
                ("Draft", "dra"),
                ("Published", "pub"),
                ("Archived", "arc"),
            ]),
            json!("pub"),
        )
        .describe("Filter by content status (choose \"All\" to show all statuses)")
        .show(show(CONTENT, &["search"]))
        .query("status"),
        FieldDefinition::new("type", "Type", FieldKind::String, json!(""))
            .describe("Filter by content type")
            .show(show(CONTENT, &["search"]))
            .query("type"),
        FieldDefinition::new("searchTerm", "Search Term", FieldKind::String, json!(""))
            .describe("Search term to filter contents")
            .show(show(CONTENT, &["search"]))
            .query("searchTerm"),
        FieldDefinition::new("pageSize", "Page Size", Number, json!(25))
            .describe("Number of items per page (1-500)")
            .range(Some(PAGE_SIZE_MIN), Some(PAGE_SIZE_MAX))
            .show(show(CONTENT, &["search"]))
            .query("page_size"),
        FieldDefinition::new("page", "Page", Number, json!(1))
            .describe("Page number to retrieve")
            .range(Some(1.0), None)
            .show(show(CONTENT, &["search"]))
            .query("page"),
        // Content identifier used in paths
        FieldDefinition::new("contentId", "Content ID", FieldKind::String, json!(""))
            .required()
            .describe("The ID of the content")
            .show(show(CONTENT, &["get", "update", "getLink", "updateLink"])),
        FieldDefinition::new("workspaceIdQuery", "Workspace ID", FieldKind::String, json!(""))
            .required()
            .describe("The ID of the workspace the content belongs to")
            .show(show(CONTENT, &["get", "getLink"]))
            .query("workspace_id"),
        // Create / Update
        FieldDefinition::new("title", "Title", FieldKind::String, json!(""))
            .required()
            .describe("Title of the content")
            .show(show(CONTENT, &["create", "update"]))
            .body("title"),
        FieldDefinition::new(
            "contentTypeSlug",
            "Content Type",
            open_options(&[
                ("URL", "url"),
                ("Text", "text"),
                ("Image", "image"),
                ("Video", "video"),
                ("Audio", "audio"),
                ("Document", "document"),
            ]),
            json!("url"),
        )
        .required()
        .describe("Type of the content")
        .show(show(CONTENT, &["create", "update"]))
        .body("content_type_slug"),
        FieldDefinition::new("workspaceIdBody", "Workspace ID", FieldKind::String, json!(""))
            .required()
            .describe("The ID of the workspace")
            .show(show(CONTENT, &["create", "update", "updateLink", "publish"]))
            .body("workspace_id"),
        FieldDefinition::new("priority", "Priority", Number, json!(0))
            .describe("Display priority of the content")
            .show(show(CONTENT, &["create", "update"]))
            .body("priority"),
        FieldDefinition::new("gs1QrCodeEnabled", "GS1 QR Code Enabled", Boolean, json!(false))
            .describe("Whether to generate a GS1 Digital Link QR code")
            .show(show(CONTENT, &["create", "update"]))
            .body("gs1_qr_code_enabled"),
        FieldDefinition::new("gs1Ai", "GS1 Application Identifier", FieldKind::String, json!("01"))
            .describe("GS1 application identifier used in the QR code")
            .show(show(CONTENT, &["create", "update"]))
            .body("gs1_ai"),
        FieldDefinition::new("productEan13", "Product EAN-13", FieldKind::String, json!(""))
            .describe("EAN-13 barcode of the product")
            .show(show(CONTENT, &["create", "update"]))
            .body("product_ean13"),
        FieldDefinition::new("productVariant", "Product Variant", FieldKind::String, json!(""))
            .describe("Variant of the product")
            .show(show(CONTENT, &["create", "update"]))
            .body("product_variant"),
        // Update Link
        FieldDefinition::new("url", "URL", FieldKind::String, json!(""))
            .describe("Destination URL of the link")
            .show(show(CONTENT, &["updateLink"]))
            .body("link"),
        FieldDefinition::new("description", "Description", FieldKind::String, json!(""))
            .describe("Description of the link")
            .show(show(CONTENT, &["updateLink"]))
            .body("description"),
        FieldDefinition::new("collectible", "Collectible", Boolean, json!(true))
            .show(show(CONTENT, &["updateLink"]))
            .body("collectible"),
        FieldDefinition::new(
            "embeddedOnMobileApp",
            "Embedded on Mobile App",
            Boolean,
            json!(false),
        )
        .show(show(CONTENT, &["updateLink"]))
        .body("embedded_on_mobile_app"),
        FieldDefinition::new("private", "Private", Boolean, json!(false))
            .show(show(CONTENT, &["updateLink"]))
            .body("private"),
        FieldDefinition::new("recommended", "Recommended", Boolean, json!(false))
            .show(show(CONTENT, &["updateLink"]))
            .body("recommended"),
        FieldDefinition::new("shareable", "Shareable", Boolean, json!(true))
            .show(show(CONTENT, &["updateLink"]))
            .body("shareable"),
        FieldDefinition::new("skipContentCover", "Skip Content Cover", Boolean, json!(false))
            .show(show(CONTENT, &["updateLink"]))
            .body("skip_content_cover"),
        FieldDefinition::new("version", "Version", FieldKind::String, json!("1.0"))
            .describe("Version of the link")
            .show(show(CONTENT, &["updateLink"]))
            .body("version"),
        // Publish
        FieldDefinition::new("contentIdPublish", "Content ID", FieldKind::String, json!(""))
            .required()
            .describe("The ID of the content to publish")
            .show(show(CONTENT, &["publish"]))
            .body("content_id"),
        FieldDefinition::new("statusPublish", "Status", options(status_options), json!("pub"))
            .required()
            .describe("New status of the content")
            .show(show(CONTENT, &["publish"]))
            .body("status"),
        FieldDefinition::new("notification", "Send Notification", Boolean, json!(true))
            .describe("Whether to notify followers about the change")
            .show(show(CONTENT, &["publish"]))
            .body("notification"),
        FieldDefinition::new("changeMessage", "Change Message", FieldKind::String, json!(""))
            .describe("Message describing the change")
            .show(show(CONTENT, &["publish"]))
            .body("change_message"),
        // Push notification
        FieldDefinition::new("notificationTitle", "Title", FieldKind::String, json!(""))
            .required()
            .describe("Title of the notification")
            .show(show(PUSH_NOTIFICATION, &["send"]))
            .body("title"),
        FieldDefinition::new("notificationBody", "Body", FieldKind::String, json!(""))
            .required()
            .describe("Text of the notification")
            .show(show(PUSH_NOTIFICATION, &["send"]))
            .body("body"),
        FieldDefinition::new("shortCode", "Short Code", FieldKind::String, json!(""))
            .describe("Short code of the content opened by the notification")
            .show(show(PUSH_NOTIFICATION, &["send"]))
            .body("short_code"),
        FieldDefinition::new(
            "destinationType",
            "Destination Type",
            open_options(&[("All Users", "all"), ("Specific Users", "users")]),
            json!("all"),
        )
        .describe("Who receives the notification")
        .show(show(PUSH_NOTIFICATION, &["send"]))
        .body("destination_type"),
        FieldDefinition::new("users", "Users", FieldKind::String, json!(""))
            .describe("Comma-separated list of user emails")
            .show(show(PUSH_NOTIFICATION, &["send"]))
            .body("users")
            .transform(ValueTransform::CommaSeparatedList),
    ]
}
