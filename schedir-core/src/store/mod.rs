//! Document store boundary.
//!
//! The event repository talks to durable storage only through this trait.
//! Semantics follow a hosted document database:
//!
//! - `create` assigns a fresh opaque id
//! - `update` merges fields into an existing document, failing with
//!   `NotFound` if there is none
//! - `delete` of a missing document is a no-op

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::document::Document;
use crate::error::SchedirResult;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, collection: &str) -> SchedirResult<Vec<Document>>;

    async fn get(&self, collection: &str, id: &str) -> SchedirResult<Option<Document>>;

    /// Store a new document and return its id.
    async fn create(&self, collection: &str, fields: Map<String, Value>) -> SchedirResult<String>;

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> SchedirResult<()>;

    async fn delete(&self, collection: &str, id: &str) -> SchedirResult<()>;
}

/// Generate an opaque document id.
pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Merge `patch` into `fields`, overwriting keys present in both.
pub(crate) fn merge_fields(fields: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        fields.insert(key, value);
    }
}
