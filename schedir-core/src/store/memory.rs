//! Process-local document store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::document::Document;
use crate::error::{SchedirError, SchedirResult};
use crate::store::{DocumentStore, merge_fields, new_document_id};

/// In-memory store. Collections keep documents in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: &str) -> SchedirResult<Vec<Document>> {
        let collections = self.collections.lock();
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> SchedirResult<Option<Document>> {
        let collections = self.collections.lock();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn create(&self, collection: &str, fields: Map<String, Value>) -> SchedirResult<String> {
        let id = new_document_id();
        let mut collections = self.collections.lock();
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> SchedirResult<()> {
        let mut collections = self.collections.lock();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| SchedirError::NotFound(id.to_string()))?;
        merge_fields(&mut doc.fields, fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> SchedirResult<()> {
        let mut collections = self.collections.lock();
        if let Some(docs) = collections.get_mut(collection) {
            docs.retain(|d| d.id != id);
        }
        Ok(())
    }
}
