//! Series resolution for recurring events.
//!
//! Two jobs:
//! - expand a series master into the occurrences that fall inside a bounded
//!   range, lazily, so unbounded rules never materialize
//! - decide what a change or delete against an event actually writes
//!
//! Occurrences are derived from (start, end, rule) and never stored, so a
//! series-scoped write only ever touches the master record. There is no
//! per-occurrence override storage, which makes occurrence-scoped writes on a
//! recurring event unrepresentable; they fail with `UnsupportedScope`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use rrule::RRuleSet;

use crate::error::{SchedirError, SchedirResult};
use crate::event::{Event, EventPatch, Occurrence};

/// How far a write against a recurring event reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// The whole series (the master record).
    #[default]
    Series,
    /// A single occurrence.
    Occurrence,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Series => write!(f, "series"),
            Scope::Occurrence => write!(f, "occurrence"),
        }
    }
}

impl FromStr for Scope {
    type Err = SchedirError;

    fn from_str(s: &str) -> SchedirResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "series" => Ok(Scope::Series),
            "occurrence" => Ok(Scope::Occurrence),
            other => Err(SchedirError::Validation(format!(
                "unknown scope '{}', expected 'series' or 'occurrence'",
                other
            ))),
        }
    }
}

/// The write a resolved intent turns into.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesWrite {
    Update { id: String, patch: EventPatch },
    Delete { id: String },
}

impl SeriesWrite {
    /// Id of the stored record the write lands on.
    pub fn target(&self) -> &str {
        match self {
            SeriesWrite::Update { id, .. } | SeriesWrite::Delete { id } => id,
        }
    }
}

pub fn resolve_change(event: &Event, scope: Scope, patch: EventPatch) -> SchedirResult<SeriesWrite> {
    check_scope(event, scope)?;
    Ok(SeriesWrite::Update {
        id: event.id.clone(),
        patch,
    })
}

pub fn resolve_delete(event: &Event, scope: Scope) -> SchedirResult<SeriesWrite> {
    check_scope(event, scope)?;
    Ok(SeriesWrite::Delete {
        id: event.id.clone(),
    })
}

/// A one-off event is its own single occurrence, so either scope targets it.
fn check_scope(event: &Event, scope: Scope) -> SchedirResult<()> {
    if event.is_recurring() && scope == Scope::Occurrence {
        return Err(SchedirError::UnsupportedScope {
            id: event.id.clone(),
            scope: scope.to_string(),
        });
    }
    Ok(())
}

/// Occurrences of one event inside `[range_start, range_end)`.
///
/// Nothing is computed until iterated, and `iter` can be called any number
/// of times; each call restarts from the beginning of the range.
#[derive(Debug, Clone)]
pub struct Occurrences {
    event: Event,
    rules: Option<RRuleSet>,
    /// Sub-second part of the event start. Rules expand at whole seconds,
    /// so it is added back to every expanded start.
    subsec: TimeDelta,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
}

impl Occurrences {
    pub fn iter(&self) -> impl Iterator<Item = Occurrence> + '_ {
        let (range_start, range_end, subsec) = (self.range_start, self.range_end, self.subsec);
        let in_range = move |start: &DateTime<Utc>| *start >= range_start && *start < range_end;

        let single = self
            .rules
            .is_none()
            .then_some(self.event.start)
            .filter(in_range)
            .into_iter();

        // Rule dates come out in ascending order: skip up to the range, then
        // stop at its end so unbounded rules terminate.
        let series = self.rules.iter().flat_map(move |rules| {
            rules
                .into_iter()
                .map(move |dt| dt.with_timezone(&Utc) + subsec)
                .skip_while(move |start| *start < range_start)
                .take_while(move |start| *start < range_end)
        });

        single
            .chain(series)
            .map(|start| Occurrence::of(&self.event, start))
    }
}

/// Expand `event` into the occurrences starting inside `[range_start, range_end)`.
///
/// Fails with `MalformedRecurrenceRule` if the event's rule does not parse;
/// callers that still want to show the event fall back to treating it as
/// non-recurring (see [`expand_or_single`]).
pub fn expand_occurrences(
    event: &Event,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> SchedirResult<Occurrences> {
    let rules = match &event.rrule {
        Some(rule) => Some(parse_rule(&event.start, rule)?),
        None => None,
    };

    Ok(Occurrences {
        event: event.clone(),
        rules,
        subsec: event.start - event.start.trunc_subsecs(0),
        range_start,
        range_end,
    })
}

/// Like [`expand_occurrences`], but a malformed rule degrades to the stored
/// event alone. The parse error is returned alongside so the caller can
/// report the fallback.
pub fn expand_or_single(
    event: &Event,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> (Occurrences, Option<SchedirError>) {
    match expand_occurrences(event, range_start, range_end) {
        Ok(occurrences) => (occurrences, None),
        Err(e) => {
            let mut one_off = event.clone();
            one_off.rrule = None;
            let occurrences = Occurrences {
                event: one_off,
                rules: None,
                subsec: TimeDelta::zero(),
                range_start,
                range_end,
            };
            (occurrences, Some(e))
        }
    }
}

fn parse_rule(start: &DateTime<Utc>, rule: &str) -> SchedirResult<RRuleSet> {
    build_rule_set_text(start, rule)
        .parse::<RRuleSet>()
        .map_err(|e| SchedirError::MalformedRecurrenceRule {
            rule: rule.to_string(),
            reason: e.to_string(),
        })
}

/// Build iCalendar text for the rrule parser.
///
/// Accepts a bare rule (`FREQ=DAILY;COUNT=5`) or property lines
/// (`RRULE:...`, `EXDATE:...`). DTSTART always comes from the event; any
/// DTSTART in the stored rule is ignored.
fn build_rule_set_text(start: &DateTime<Utc>, rule: &str) -> String {
    let anchor = start.trunc_subsecs(0);
    let mut lines = vec![format!("DTSTART:{}", anchor.format("%Y%m%dT%H%M%SZ"))];

    for line in rule.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let upper = line.to_ascii_uppercase();
        if upper.starts_with("DTSTART") {
            continue;
        }
        let is_property = ["RRULE", "EXRULE", "RDATE", "EXDATE"]
            .iter()
            .any(|name| upper.starts_with(name) && upper[name.len()..].starts_with([':', ';']));

        if is_property {
            lines.push(line.to_string());
        } else {
            lines.push(format!("RRULE:{}", line));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn make_event(rrule: Option<&str>) -> Event {
        Event {
            id: "series-1".to_string(),
            start: at(2024, 3, 1, 9),
            end: at(2024, 3, 1, 10),
            title: "Standup".to_string(),
            notes: None,
            all_day: false,
            rrule: rrule.map(String::from),
        }
    }

    #[test]
    fn test_one_off_inside_range_yields_exactly_one() {
        let event = make_event(None);
        let occ: Vec<_> = expand_occurrences(&event, at(2024, 3, 1, 0), at(2024, 3, 2, 0))
            .unwrap()
            .iter()
            .collect();

        assert_eq!(occ.len(), 1);
        assert_eq!(occ[0].series_id, "series-1");
        assert_eq!(occ[0].start, event.start);
        assert_eq!(occ[0].end, event.end);
    }

    #[test]
    fn test_one_off_range_is_half_open() {
        let event = make_event(None);

        let starting_at = expand_occurrences(&event, event.start, at(2024, 3, 2, 0)).unwrap();
        assert_eq!(starting_at.iter().count(), 1);

        let ending_at = expand_occurrences(&event, at(2024, 2, 1, 0), event.start).unwrap();
        assert_eq!(ending_at.iter().count(), 0);
    }

    #[test]
    fn test_bounded_rule_yields_its_count() {
        let event = make_event(Some("FREQ=DAILY;COUNT=5"));
        let occ = expand_occurrences(&event, at(2024, 1, 1, 0), at(2025, 1, 1, 0)).unwrap();

        let starts: Vec<_> = occ.iter().map(|o| o.start).collect();
        assert_eq!(starts.len(), 5);
        assert_eq!(starts[0], at(2024, 3, 1, 9));
        assert_eq!(starts[4], at(2024, 3, 5, 9));
    }

    #[test]
    fn test_fractional_start_keeps_first_occurrence() {
        let mut event = make_event(Some("FREQ=DAILY;COUNT=5"));
        event.start += Duration::milliseconds(500);
        event.end += Duration::milliseconds(500);

        let starts: Vec<_> = expand_occurrences(&event, event.start, event.start + Duration::days(30))
            .unwrap()
            .iter()
            .map(|o| o.start)
            .collect();

        assert_eq!(starts.len(), 5);
        assert_eq!(starts[0], event.start);
        assert_eq!(starts[4], event.start + Duration::days(4));
    }

    #[test]
    fn test_unbounded_rule_stops_at_range_end() {
        let event = make_event(Some("FREQ=DAILY"));
        let occ = expand_occurrences(&event, at(2024, 6, 3, 0), at(2024, 6, 10, 0)).unwrap();

        let all: Vec<_> = occ.iter().collect();
        assert_eq!(all.len(), 7);
        assert_eq!(all[0].start, at(2024, 6, 3, 9));
        assert!(all.iter().all(|o| o.end - o.start == Duration::hours(1)));
    }

    #[test]
    fn test_expansion_is_restartable() {
        let event = make_event(Some("RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR"));
        let occ = expand_occurrences(&event, at(2024, 3, 1, 0), at(2024, 4, 1, 0)).unwrap();

        let first: Vec<_> = occ.iter().collect();
        let second: Vec<_> = occ.iter().collect();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_exdate_lines_are_honored() {
        let event = make_event(Some(
            "RRULE:FREQ=DAILY;COUNT=3\nEXDATE:20240302T090000Z",
        ));
        let starts: Vec<_> = expand_occurrences(&event, at(2024, 3, 1, 0), at(2024, 4, 1, 0))
            .unwrap()
            .iter()
            .map(|o| o.start)
            .collect();
        assert_eq!(starts, vec![at(2024, 3, 1, 9), at(2024, 3, 3, 9)]);
    }

    #[test]
    fn test_malformed_rule_fails() {
        let event = make_event(Some("FREQ=BOGUS"));
        let result = expand_occurrences(&event, at(2024, 3, 1, 0), at(2024, 4, 1, 0));
        assert!(matches!(
            result,
            Err(SchedirError::MalformedRecurrenceRule { .. })
        ));
    }

    #[test]
    fn test_malformed_rule_falls_back_to_single() {
        let event = make_event(Some("FREQ=BOGUS"));
        let (occ, err) = expand_or_single(&event, at(2024, 3, 1, 0), at(2024, 4, 1, 0));

        assert!(matches!(err, Some(SchedirError::MalformedRecurrenceRule { .. })));
        let all: Vec<_> = occ.iter().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].start, event.start);
    }

    #[test]
    fn test_occurrence_scope_on_series_is_unsupported() {
        let event = make_event(Some("FREQ=DAILY"));
        assert!(matches!(
            resolve_delete(&event, Scope::Occurrence),
            Err(SchedirError::UnsupportedScope { .. })
        ));
        assert!(matches!(
            resolve_change(&event, Scope::Occurrence, EventPatch::default()),
            Err(SchedirError::UnsupportedScope { .. })
        ));
    }

    #[test]
    fn test_series_scope_targets_master() {
        let event = make_event(Some("FREQ=DAILY"));
        assert_eq!(
            resolve_delete(&event, Scope::Series).unwrap(),
            SeriesWrite::Delete {
                id: "series-1".into()
            }
        );
    }

    #[test]
    fn test_occurrence_scope_on_one_off_targets_event() {
        let event = make_event(None);
        assert!(resolve_delete(&event, Scope::Occurrence).is_ok());
    }

    #[test]
    fn test_scope_from_str() {
        assert_eq!("series".parse::<Scope>().unwrap(), Scope::Series);
        assert_eq!("Occurrence".parse::<Scope>().unwrap(), Scope::Occurrence);
        assert!("instance".parse::<Scope>().is_err());
    }

    #[test]
    fn test_build_rule_set_text_prefixes_bare_rules() {
        let text = build_rule_set_text(&at(2024, 3, 1, 9), "FREQ=DAILY;COUNT=2");
        assert_eq!(text, "DTSTART:20240301T090000Z\nRRULE:FREQ=DAILY;COUNT=2");
    }
}
