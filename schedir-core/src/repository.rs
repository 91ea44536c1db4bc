//! CRUD boundary over persisted events.
//!
//! `EventRepository` is the only component that touches durable storage. It
//! maps events onto documents in the `events` collection, validates input
//! before anything is written, and bounds every store call with a timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::document::{EVENTS_COLLECTION, EventDocument};
use crate::error::{SchedirError, SchedirResult};
use crate::event::{Event, EventDraft, EventPatch};
use crate::store::DocumentStore;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct EventRepository {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl EventRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        EventRepository {
            store,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a store call under the transport timeout.
    ///
    /// The call runs on its own task, so a timeout only stops the wait. A
    /// write that times out still runs to completion or failure in the
    /// background; its outcome is unknown to the caller until the next list.
    async fn call<T, F>(&self, op: &'static str, fut: F) -> SchedirResult<T>
    where
        T: Send + 'static,
        F: Future<Output = SchedirResult<T>> + Send + 'static,
    {
        debug!(op, "store call");
        let mut handle = tokio::spawn(fut);

        match timeout(self.timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(SchedirError::StorageUnavailable(format!(
                "{} task failed: {}",
                op, e
            ))),
            Err(_) => {
                warn!(op, "store call timed out, leaving it to finish in the background");
                Err(SchedirError::StorageUnavailable(format!(
                    "{} timed out after {}s",
                    op,
                    self.timeout.as_secs_f64()
                )))
            }
        }
    }

    /// All stored events. Documents that cannot be decoded are skipped.
    pub async fn list_events(&self) -> SchedirResult<Vec<Event>> {
        let store = Arc::clone(&self.store);
        let docs = self
            .call("list", async move { store.list(EVENTS_COLLECTION).await })
            .await?;

        let events = docs
            .iter()
            .filter_map(|doc| match Event::try_from(doc) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(id = %doc.id, error = %e, "skipping undecodable event document");
                    None
                }
            })
            .collect();

        Ok(events)
    }

    pub async fn get_event(&self, id: &str) -> SchedirResult<Event> {
        let store = Arc::clone(&self.store);
        let key = id.to_string();
        let doc = self
            .call("get", async move { store.get(EVENTS_COLLECTION, &key).await })
            .await?
            .ok_or_else(|| SchedirError::NotFound(id.to_string()))?;
        Event::try_from(&doc)
    }

    /// Validate and persist a draft. The returned event carries the id the
    /// store assigned.
    pub async fn add_event(&self, draft: EventDraft) -> SchedirResult<Event> {
        // Validate before touching the store; the id is filled in afterwards.
        let mut event = draft.into_event(String::new())?;
        let fields = EventDocument::from_event(&event).to_fields()?;

        let store = Arc::clone(&self.store);
        event.id = self
            .call("create", async move { store.create(EVENTS_COLLECTION, fields).await })
            .await?;

        info!(id = %event.id, title = %event.title, "event added");
        Ok(event)
    }

    /// Merge `patch` into the stored event and write the full result back.
    pub async fn update_event(&self, id: &str, patch: &EventPatch) -> SchedirResult<Event> {
        let current = self.get_event(id).await?;
        let updated = current.patched(patch)?;
        let fields = EventDocument::from_event(&updated).to_fields()?;

        let store = Arc::clone(&self.store);
        let key = id.to_string();
        self.call("update", async move {
            store.update(EVENTS_COLLECTION, &key, fields).await
        })
        .await?;

        info!(id, "event updated");
        Ok(updated)
    }

    /// Delete an event. Deleting an id that is already gone is not an error.
    pub async fn delete_event(&self, id: &str) -> SchedirResult<()> {
        let store = Arc::clone(&self.store);
        let key = id.to_string();
        self.call("delete", async move { store.delete(EVENTS_COLLECTION, &key).await })
            .await?;
        info!(id, "event deleted");
        Ok(())
    }
}
