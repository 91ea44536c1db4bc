//! Core of the schedir event series store.
//!
//! - `repository`: CRUD over event documents in a `DocumentStore`
//! - `series`: recurrence expansion and write-scope resolution
//! - `cache`: the optimistic, per-id ordered mirror a UI binds to
//! - `view`: turns a (date, view) pair into the occurrences to draw

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod repository;
pub mod series;
pub mod store;
pub mod time;
pub mod view;

pub use cache::{Intent, Outcome, ViewCache};
pub use error::{SchedirError, SchedirResult};
pub use event::{Event, EventDraft, EventPatch, Occurrence};
pub use repository::EventRepository;
pub use series::Scope;
