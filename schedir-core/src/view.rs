//! Rendering boundary.
//!
//! A surface asks for "the week of 2024-03-01" and gets back the concrete
//! occurrences to draw. Locale and view travel in an explicit
//! `RenderContext`; nothing here reads process-wide state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SchedirError, SchedirResult};
use crate::event::{Event, Occurrence};
use crate::series::expand_or_single;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewName {
    Day,
    #[default]
    Week,
    Month,
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewName::Day => write!(f, "day"),
            ViewName::Week => write!(f, "week"),
            ViewName::Month => write!(f, "month"),
        }
    }
}

impl FromStr for ViewName {
    type Err = SchedirError;

    fn from_str(s: &str) -> SchedirResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(ViewName::Day),
            "week" => Ok(ViewName::Week),
            "month" => Ok(ViewName::Month),
            other => Err(SchedirError::Validation(format!(
                "unknown view '{}', expected day, week or month",
                other
            ))),
        }
    }
}

/// The half-open instant range `[start, end)` a view covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ViewWindow {
    /// Window for `view` around `current_date`. Day boundaries are UTC
    /// midnights; weeks begin on `week_start`.
    pub fn new(current_date: NaiveDate, view: ViewName, week_start: Weekday) -> Self {
        let (first, last) = match view {
            ViewName::Day => (current_date, current_date + Days::new(1)),
            ViewName::Week => {
                let offset = (7 + current_date.weekday().num_days_from_monday()
                    - week_start.num_days_from_monday())
                    % 7;
                let first = current_date - Days::new(offset as u64);
                (first, first + Days::new(7))
            }
            ViewName::Month => {
                let first = current_date - Days::new(current_date.day0() as u64);
                let next = first
                    .checked_add_months(Months::new(1))
                    .unwrap_or(NaiveDate::MAX);
                (first, next)
            }
        };

        ViewWindow {
            start: first.and_time(NaiveTime::MIN).and_utc(),
            end: last.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

/// Everything the rendering boundary needs, passed explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    /// Locale tag such as `pl-PL`. Affects formatting only.
    pub locale: String,
    pub view: ViewName,
    pub current_date: NaiveDate,
    pub week_start: Weekday,
}

impl RenderContext {
    pub fn window(&self) -> ViewWindow {
        ViewWindow::new(self.current_date, self.view, self.week_start)
    }
}

/// All occurrences of `events` inside `window`, ordered by start.
///
/// An event whose rule does not parse is shown once, at its stored start,
/// and the fallback is logged.
pub fn visible_occurrences(events: &[Event], window: &ViewWindow) -> Vec<Occurrence> {
    let mut visible: Vec<Occurrence> = events
        .iter()
        .flat_map(|event| {
            let (occurrences, error) = expand_or_single(event, window.start, window.end);
            if let Some(e) = error {
                warn!(id = %event.id, error = %e, "rendering recurring event as a single occurrence");
            }
            occurrences.iter().collect::<Vec<_>>()
        })
        .collect();

    visible.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.series_id.cmp(&b.series_id)));
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn make_event(id: &str, day: u32, hour: u32, rrule: Option<&str>) -> Event {
        Event {
            id: id.to_string(),
            start: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, day, hour + 1, 0, 0).unwrap(),
            title: id.to_string(),
            notes: None,
            all_day: false,
            rrule: rrule.map(String::from),
        }
    }

    #[test]
    fn test_day_window() {
        let window = ViewWindow::new(date(2024, 3, 6), ViewName::Day, Weekday::Mon);
        assert_eq!(window.start, midnight(2024, 3, 6));
        assert_eq!(window.end, midnight(2024, 3, 7));
    }

    #[test]
    fn test_week_window_starts_on_configured_day() {
        // 2024-03-06 is a Wednesday
        let monday = ViewWindow::new(date(2024, 3, 6), ViewName::Week, Weekday::Mon);
        assert_eq!(monday.start, midnight(2024, 3, 4));
        assert_eq!(monday.end, midnight(2024, 3, 11));

        let sunday = ViewWindow::new(date(2024, 3, 6), ViewName::Week, Weekday::Sun);
        assert_eq!(sunday.start, midnight(2024, 3, 3));
    }

    #[test]
    fn test_week_window_on_first_weekday() {
        let window = ViewWindow::new(date(2024, 3, 4), ViewName::Week, Weekday::Mon);
        assert_eq!(window.start, midnight(2024, 3, 4));
    }

    #[test]
    fn test_month_window_handles_year_end() {
        let window = ViewWindow::new(date(2024, 12, 15), ViewName::Month, Weekday::Mon);
        assert_eq!(window.start, midnight(2024, 12, 1));
        assert_eq!(window.end, midnight(2025, 1, 1));
    }

    #[test]
    fn test_visible_occurrences_sorted_and_expanded() {
        let events = vec![
            make_event("late", 5, 15, None),
            make_event("daily", 1, 9, Some("FREQ=DAILY")),
            make_event("outside", 20, 9, None),
        ];
        let window = ViewWindow::new(date(2024, 3, 5), ViewName::Day, Weekday::Mon);

        let visible = visible_occurrences(&events, &window);
        let ids: Vec<_> = visible.iter().map(|o| o.series_id.as_str()).collect();
        assert_eq!(ids, vec!["daily", "late"]);
        assert_eq!(visible[0].start, Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_malformed_rule_renders_once() {
        let events = vec![make_event("broken", 5, 9, Some("FREQ=BOGUS"))];
        let window = ViewWindow::new(date(2024, 3, 5), ViewName::Week, Weekday::Mon);

        let visible = visible_occurrences(&events, &window);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].series_id, "broken");
    }

    #[test]
    fn test_view_name_parse() {
        assert_eq!("Month".parse::<ViewName>().unwrap(), ViewName::Month);
        assert!("agenda".parse::<ViewName>().is_err());
        assert_eq!(ViewName::default(), ViewName::Week);
    }
}
