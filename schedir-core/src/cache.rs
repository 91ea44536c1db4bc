//! UI-facing mirror of repository state with optimistic writes.
//!
//! `ViewCache::apply` mutates the mirror first, then forwards the write to the
//! repository. If the repository fails, the touched entry is restored to what
//! it was before the intent and the error is returned. The mirror is advisory:
//! it is patched only from local intents and repository confirmations, never
//! from a full reload.
//!
//! Intents against the same id run through a per-id lane (a fair async mutex)
//! so they reach storage in submission order. Intents against different ids
//! do not wait on each other. No mirror lock is held across an await.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{SchedirError, SchedirResult};
use crate::event::{Event, EventDraft, EventPatch};
use crate::repository::EventRepository;
use crate::series::{self, Scope, SeriesWrite};

const PROVISIONAL_ID_PREFIX: &str = "pending-";

/// A user intent emitted by the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Add(EventDraft),
    Change {
        id: String,
        patch: EventPatch,
        scope: Scope,
    },
    Delete {
        id: String,
        scope: Scope,
    },
}

impl Intent {
    pub fn change(id: impl Into<String>, patch: EventPatch) -> Self {
        Intent::Change {
            id: id.into(),
            patch,
            scope: Scope::Series,
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Intent::Delete {
            id: id.into(),
            scope: Scope::Series,
        }
    }
}

/// The confirmed result of an intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Added(Event),
    Changed(Event),
    Deleted(String),
}

/// What an entry looked like before an optimistic write.
#[derive(Debug)]
struct Snapshot {
    id: String,
    index: usize,
    previous: Option<Event>,
}

/// Events in the order the surface first saw them.
#[derive(Debug, Default)]
struct Mirror {
    events: Vec<Event>,
}

impl Mirror {
    fn position(&self, id: &str) -> Option<usize> {
        self.events.iter().position(|e| e.id == id)
    }

    fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Insert or replace `event`, returning what was there before.
    fn put(&mut self, event: Event) -> Snapshot {
        let id = event.id.clone();
        match self.position(&id) {
            Some(index) => {
                let previous = std::mem::replace(&mut self.events[index], event);
                Snapshot {
                    id,
                    index,
                    previous: Some(previous),
                }
            }
            None => {
                self.events.push(event);
                Snapshot {
                    id,
                    index: self.events.len() - 1,
                    previous: None,
                }
            }
        }
    }

    fn remove(&mut self, id: &str) -> Snapshot {
        match self.position(id) {
            Some(index) => Snapshot {
                id: id.to_string(),
                index,
                previous: Some(self.events.remove(index)),
            },
            None => Snapshot {
                id: id.to_string(),
                index: self.events.len(),
                previous: None,
            },
        }
    }

    /// Swap the entry under `old_id` for the confirmed event, in place.
    fn confirm(&mut self, old_id: &str, event: Event) {
        match self.position(old_id) {
            Some(index) => self.events[index] = event,
            None => self.events.push(event),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        let current = self.position(&snapshot.id);
        match (current, snapshot.previous) {
            (Some(index), Some(previous)) => self.events[index] = previous,
            (None, Some(previous)) => {
                let index = snapshot.index.min(self.events.len());
                self.events.insert(index, previous);
            }
            (Some(index), None) => {
                self.events.remove(index);
            }
            (None, None) => {}
        }
    }
}

type Lane = Arc<tokio::sync::Mutex<()>>;

#[derive(Clone)]
pub struct ViewCache {
    repository: EventRepository,
    mirror: Arc<Mutex<Mirror>>,
    lanes: Arc<Mutex<HashMap<String, Lane>>>,
}

impl ViewCache {
    /// An empty cache over `repository`.
    pub fn new(repository: EventRepository) -> Self {
        ViewCache {
            repository,
            mirror: Arc::new(Mutex::new(Mirror::default())),
            lanes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A cache seeded from the repository's current contents.
    pub async fn load(repository: EventRepository) -> SchedirResult<Self> {
        let events = repository.list_events().await?;
        debug!(count = events.len(), "view cache loaded");
        let cache = Self::new(repository);
        cache.mirror.lock().events = events;
        Ok(cache)
    }

    pub fn repository(&self) -> &EventRepository {
        &self.repository
    }

    /// Snapshot of the mirror, including optimistic entries.
    pub fn events(&self) -> Vec<Event> {
        self.mirror.lock().events.clone()
    }

    pub fn get(&self, id: &str) -> Option<Event> {
        self.mirror.lock().get(id).cloned()
    }

    pub async fn apply(&self, intent: Intent) -> SchedirResult<Outcome> {
        match intent {
            Intent::Add(draft) => self.add(draft).await,
            Intent::Change { id, patch, scope } => self.change(&id, patch, scope).await,
            Intent::Delete { id, scope } => self.delete(&id, scope).await,
        }
    }

    async fn add(&self, draft: EventDraft) -> SchedirResult<Outcome> {
        let provisional_id = format!("{}{}", PROVISIONAL_ID_PREFIX, uuid::Uuid::new_v4().simple());
        let optimistic = draft.clone().into_event(provisional_id.clone())?;

        self.in_lane(&provisional_id, async {
            let snapshot = self.mirror.lock().put(optimistic);

            match self.repository.add_event(draft).await {
                Ok(event) => {
                    self.mirror.lock().confirm(&provisional_id, event.clone());
                    Ok(Outcome::Added(event))
                }
                Err(e) => Err(self.roll_back(snapshot, e)),
            }
        })
        .await
    }

    async fn change(&self, id: &str, patch: EventPatch, scope: Scope) -> SchedirResult<Outcome> {
        self.in_lane(id, async {
            let current = self
                .get(id)
                .ok_or_else(|| SchedirError::NotFound(id.to_string()))?;
            let optimistic = current.patched(&patch)?;
            let write = series::resolve_change(&current, scope, patch)?;

            let snapshot = self.mirror.lock().put(optimistic);
            self.forward(write)
                .await
                .map_err(|e| self.roll_back(snapshot, e))
        })
        .await
    }

    async fn delete(&self, id: &str, scope: Scope) -> SchedirResult<Outcome> {
        self.in_lane(id, async {
            let current = self
                .get(id)
                .ok_or_else(|| SchedirError::NotFound(id.to_string()))?;
            let write = series::resolve_delete(&current, scope)?;

            let snapshot = self.mirror.lock().remove(write.target());
            self.forward(write)
                .await
                .map_err(|e| self.roll_back(snapshot, e))
        })
        .await
    }

    /// Send a resolved write to the repository and fold the confirmation
    /// back into the mirror.
    async fn forward(&self, write: SeriesWrite) -> SchedirResult<Outcome> {
        match write {
            SeriesWrite::Update { id, patch } => {
                let event = self.repository.update_event(&id, &patch).await?;
                self.mirror.lock().confirm(&id, event.clone());
                Ok(Outcome::Changed(event))
            }
            SeriesWrite::Delete { id } => {
                self.repository.delete_event(&id).await?;
                Ok(Outcome::Deleted(id))
            }
        }
    }

    fn roll_back(&self, snapshot: Snapshot, error: SchedirError) -> SchedirError {
        warn!(id = %snapshot.id, error = %error, "write failed, rolling back mirror entry");
        self.mirror.lock().restore(snapshot);
        error
    }

    /// Run `work` once every earlier intent for `id` has finished.
    async fn in_lane<T>(
        &self,
        id: &str,
        work: impl Future<Output = SchedirResult<T>>,
    ) -> SchedirResult<T> {
        let lane = self
            .lanes
            .lock()
            .entry(id.to_string())
            .or_default()
            .clone();

        let result = {
            let _turn = lane.lock().await;
            work.await
        };

        // Drop the lane once nobody else is queued on it.
        let mut lanes = self.lanes.lock();
        if Arc::strong_count(&lane) == 2 {
            lanes.remove(id);
        }
        result
    }
}
