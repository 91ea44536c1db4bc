//! Event data model.
//!
//! An `Event` is what storage holds: either a one-off event or the master
//! record of a recurring series. Occurrences of a series are never stored;
//! they are derived by the `series` module.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SchedirError, SchedirResult};
use crate::time::parse_instant;

/// A stored event (one-off, or the master of a recurring series).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque id assigned by storage on creation.
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub notes: Option<String>,
    pub all_day: bool,
    /// RRULE text; only set on series masters.
    pub rrule: Option<String>,
}

impl Event {
    pub fn is_recurring(&self) -> bool {
        self.rrule.is_some()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Apply a patch, returning the merged event.
    ///
    /// The result is validated as a whole, so a patch that moves only `end`
    /// before the existing `start` is rejected.
    pub fn patched(&self, patch: &EventPatch) -> SchedirResult<Event> {
        let start = match &patch.start {
            Some(s) => parse_instant(s)?,
            None => self.start,
        };
        let end = match &patch.end {
            Some(s) => parse_instant(s)?,
            None => self.end,
        };

        let merged = Event {
            id: self.id.clone(),
            start,
            end,
            title: patch.title.clone().unwrap_or_else(|| self.title.clone()),
            notes: match &patch.notes {
                Some(notes) => notes.clone(),
                None => self.notes.clone(),
            },
            all_day: patch.all_day.unwrap_or(self.all_day),
            rrule: match &patch.rrule {
                Some(rule) => normalize_rule(rule.clone()),
                None => self.rrule.clone(),
            },
        };

        merged.validate()?;
        Ok(merged)
    }

    pub(crate) fn validate(&self) -> SchedirResult<()> {
        validate_fields(&self.title, &self.start, &self.end)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// An event as submitted by the rendering surface, before storage assigns
/// an id. Dates are raw ISO-8601 strings and are validated on add.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub start: String,
    pub end: String,
    pub notes: Option<String>,
    pub all_day: bool,
    pub rrule: Option<String>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        EventDraft {
            title: title.into(),
            start: start.into(),
            end: end.into(),
            ..Default::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_rrule(mut self, rule: impl Into<String>) -> Self {
        self.rrule = Some(rule.into());
        self
    }

    pub fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    /// Validate the draft and turn it into an event carrying `id`.
    pub fn into_event(self, id: String) -> SchedirResult<Event> {
        let start = parse_instant(&self.start)?;
        let end = parse_instant(&self.end)?;
        validate_fields(&self.title, &start, &end)?;

        Ok(Event {
            id,
            start,
            end,
            title: self.title,
            notes: self.notes,
            all_day: self.all_day,
            rrule: normalize_rule(self.rrule),
        })
    }
}

/// A partial update. `None` leaves a field unchanged; for `notes` and
/// `rrule`, `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub notes: Option<Option<String>>,
    pub all_day: Option<bool>,
    pub rrule: Option<Option<String>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }
}

/// One concrete instance of an event within a range.
///
/// For a one-off event there is exactly one occurrence and `series_id` is the
/// event's own id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub series_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub notes: Option<String>,
    pub all_day: bool,
}

impl Occurrence {
    pub(crate) fn of(event: &Event, start: DateTime<Utc>) -> Self {
        Occurrence {
            series_id: event.id.clone(),
            start,
            end: start + event.duration(),
            title: event.title.clone(),
            notes: event.notes.clone(),
            all_day: event.all_day,
        }
    }
}

fn validate_fields(title: &str, start: &DateTime<Utc>, end: &DateTime<Utc>) -> SchedirResult<()> {
    if title.trim().is_empty() {
        return Err(SchedirError::Validation("title is required".into()));
    }
    if end < start {
        return Err(SchedirError::Validation(format!(
            "end {} is before start {}",
            end.to_rfc3339(),
            start.to_rfc3339()
        )));
    }
    Ok(())
}

/// Blank rules mean "no rule", the same as a missing one.
pub(crate) fn normalize_rule(rule: Option<String>) -> Option<String> {
    rule.map(|r| r.trim().to_string()).filter(|r| !r.is_empty())
}
