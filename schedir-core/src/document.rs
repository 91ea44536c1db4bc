//! Wire shape of a stored event document.
//!
//! One document per event in the `events` collection:
//!
//! ```json
//! {"startDate": "2024-03-01T09:00:00.000Z", "endDate": "...", "title": "Standup",
//!  "notes": "room 4", "allDay": false, "rRule": "FREQ=WEEKLY;BYDAY=MO"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{SchedirError, SchedirResult};
use crate::event::{Event, normalize_rule};
use crate::time::{format_instant, parse_instant};

pub const EVENTS_COLLECTION: &str = "events";

/// A document as held by a `DocumentStore`: an opaque id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDocument {
    pub start_date: String,
    pub end_date: String,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub all_day: Option<bool>,
    #[serde(default)]
    pub r_rule: Option<String>,
}

impl EventDocument {
    pub fn from_event(event: &Event) -> Self {
        EventDocument {
            start_date: format_instant(&event.start),
            end_date: format_instant(&event.end),
            title: event.title.clone(),
            notes: event.notes.clone(),
            all_day: Some(event.all_day),
            r_rule: event.rrule.clone(),
        }
    }

    /// Decode a stored document, applying the read-side defaults:
    /// a missing `allDay` is false and an empty `rRule` is no rule.
    pub fn into_event(self, id: String) -> SchedirResult<Event> {
        Ok(Event {
            id,
            start: parse_instant(&self.start_date)?,
            end: parse_instant(&self.end_date)?,
            title: self.title,
            notes: self.notes,
            all_day: self.all_day.unwrap_or(false),
            rrule: normalize_rule(self.r_rule),
        })
    }

    pub fn to_fields(&self) -> SchedirResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(SchedirError::Serialization(format!(
                "expected an object, got {}",
                other
            ))),
        }
    }
}

impl TryFrom<&Document> for Event {
    type Error = SchedirError;

    fn try_from(doc: &Document) -> SchedirResult<Event> {
        let parsed: EventDocument = serde_json::from_value(Value::Object(doc.fields.clone()))?;
        parsed.into_event(doc.id.clone())
    }
}
