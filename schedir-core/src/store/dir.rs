//! Directory-backed document store.
//!
//! Layout: `<root>/<collection>/<id>.json`, one pretty-printed JSON object per
//! document. Writes go to a `.tmp` sibling and are renamed into place.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::warn;

use crate::document::Document;
use crate::error::{SchedirError, SchedirResult};
use crate::store::{DocumentStore, merge_fields, new_document_id};

const DOCUMENT_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.root.join(collection)
    }

    fn document_path(&self, collection: &str, id: &str) -> SchedirResult<PathBuf> {
        // Ids come from callers; keep them inside the collection directory.
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(SchedirError::NotFound(id.to_string()));
        }
        Ok(self
            .collection_path(collection)
            .join(format!("{}.{}", id, DOCUMENT_EXTENSION)))
    }

    async fn read_document(path: &Path, id: &str) -> SchedirResult<Option<Document>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(unavailable(path, e)),
        };

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(fields) => Ok(Some(Document {
                id: id.to_string(),
                fields,
            })),
            _ => Err(SchedirError::Serialization(format!(
                "{} does not hold a JSON object",
                path.display()
            ))),
        }
    }

    async fn write_document(&self, collection: &str, doc: &Document) -> SchedirResult<()> {
        let dir = self.collection_path(collection);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| unavailable(&dir, e))?;

        let path = self.document_path(collection, &doc.id)?;
        let temp = path.with_extension(format!("{}.tmp", DOCUMENT_EXTENSION));
        let content = serde_json::to_string_pretty(&Value::Object(doc.fields.clone()))?;

        tokio::fs::write(&temp, content)
            .await
            .map_err(|e| unavailable(&temp, e))?;
        tokio::fs::rename(&temp, &path)
            .await
            .map_err(|e| unavailable(&path, e))?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for DirStore {
    async fn list(&self, collection: &str) -> SchedirResult<Vec<Document>> {
        let dir = self.collection_path(collection);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(unavailable(&dir, e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| unavailable(&dir, e))? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == DOCUMENT_EXTENSION) {
                paths.push(path);
            }
        }
        // Sort for deterministic output
        paths.sort();

        let mut docs = Vec::with_capacity(paths.len());
        for path in paths {
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            match Self::read_document(&path, &id).await {
                Ok(Some(doc)) => docs.push(doc),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable document"),
            }
        }
        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> SchedirResult<Option<Document>> {
        let path = match self.document_path(collection, id) {
            Ok(path) => path,
            Err(_) => return Ok(None),
        };
        Self::read_document(&path, id).await
    }

    async fn create(&self, collection: &str, fields: Map<String, Value>) -> SchedirResult<String> {
        let doc = Document {
            id: new_document_id(),
            fields,
        };
        self.write_document(collection, &doc).await?;
        Ok(doc.id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> SchedirResult<()> {
        let mut doc = self
            .get(collection, id)
            .await?
            .ok_or_else(|| SchedirError::NotFound(id.to_string()))?;
        merge_fields(&mut doc.fields, fields);
        self.write_document(collection, &doc).await
    }

    async fn delete(&self, collection: &str, id: &str) -> SchedirResult<()> {
        let Ok(path) = self.document_path(collection, id) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable(&path, e)),
        }
    }
}

fn unavailable(path: &Path, e: std::io::Error) -> SchedirError {
    SchedirError::StorageUnavailable(format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_documents_survive_a_fresh_instance() {
        let dir = tempfile::tempdir().unwrap();
        let id = DirStore::new(dir.path())
            .create("events", fields(json!({"title": "Standup"})))
            .await
            .unwrap();

        let docs = DirStore::new(dir.path()).list("events").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert_eq!(docs[0].fields["title"], json!("Standup"));
    }

    #[tokio::test]
    async fn test_documents_live_under_root_without_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        let id = store
            .create("events", fields(json!({"title": "Standup"})))
            .await
            .unwrap();

        let collection = store.root().join("events");
        let names: Vec<_> = std::fs::read_dir(&collection)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec![format!("{}.json", id)]);
    }

    #[tokio::test]
    async fn test_list_of_missing_collection_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path().join("nothing-here"));
        assert!(store.list("events").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_and_rejects_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        let id = store
            .create("events", fields(json!({"title": "a", "notes": "keep"})))
            .await
            .unwrap();

        store
            .update("events", &id, fields(json!({"title": "b"})))
            .await
            .unwrap();
        let doc = store.get("events", &id).await.unwrap().unwrap();
        assert_eq!(doc.fields["title"], json!("b"));
        assert_eq!(doc.fields["notes"], json!("keep"));

        let missing = store.update("events", "missing", Map::new()).await;
        assert_eq!(missing, Err(SchedirError::NotFound("missing".into())));
    }

    #[tokio::test]
    async fn test_delete_twice_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        let id = store
            .create("events", fields(json!({"title": "a"})))
            .await
            .unwrap();

        store.delete("events", &id).await.unwrap();
        store.delete("events", &id).await.unwrap();
        assert!(store.get("events", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_path_like_ids_never_escape_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        assert!(store.get("events", "../secret").await.unwrap().is_none());
        store.delete("events", "../secret").await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_documents_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        store
            .create("events", fields(json!({"title": "ok"})))
            .await
            .unwrap();
        std::fs::write(dir.path().join("events/broken.json"), "{not json").unwrap();

        let docs = store.list("events").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields["title"], json!("ok"));
    }
}
