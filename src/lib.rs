//! Midiacode connector - declarative routing of workflow node operations onto
//! the Midiacode content REST API.
//!
//! # Architecture
//!
//! ```text
//! (resource, operation, field values)
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       Router                             │
//! │  - Look up operation in routing table    │
//! │  - Substitute path, validate fields      │
//! │  - Place values in query / body          │
//! └─────────────────────────────────────────┘
//!          ↓
//!   RequestDescriptor (+ X-API-Key)
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │       Transport (reqwest by default)     │
//! └─────────────────────────────────────────┘
//!          ↓
//!   contentcore.midiacode.pt / account.midiacode.pt
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use midiacode::{MidiacodeCredentials, MidiacodeNode};
//! use serde_json::json;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let node = MidiacodeNode::new(MidiacodeCredentials::new("api-key", "workspace-id"))?;
//! node.test_credentials().await?;
//!
//! let params = json!({"workspaceId": "workspace-id", "searchTerm": "summer"});
//! let contents = node
//!     .execute("content", "search", params.as_object().unwrap())
//!     .await?;
//! println!("{}", contents);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod node;
pub mod request;
pub mod router;
pub mod table;
pub mod transport;
pub mod types;

pub use config::{load_config, ApiConfig, ConnectorConfig, HttpConfig};
pub use credentials::MidiacodeCredentials;
pub use error::ConnectorError;
pub use node::{MidiacodeNode, NodeDescription};
pub use request::RequestDescriptor;
pub use router::{FieldValues, Router};
pub use table::routing_table;
pub use transport::{ApiResponse, HttpTransport, Transport};
