//! Terminal rendering for schedir types.
//!
//! Dates and times are shown in the local time zone and formatted for the
//! configured locale. Storage is never affected by either.

use chrono::{DateTime, Local, Locale, Utc};
use owo_colors::OwoColorize;
use schedir_core::view::{ViewName, ViewWindow};
use schedir_core::{Event, Occurrence};
use tracing::warn;

/// Locale-aware date/time formatting.
pub struct Formatter {
    locale: Locale,
}

impl Formatter {
    /// Build a formatter from a tag such as `pl-PL` or `en_US`.
    /// Unknown tags fall back to POSIX formatting.
    pub fn new(tag: &str) -> Self {
        Formatter {
            locale: parse_locale(tag),
        }
    }

    fn local(dt: &DateTime<Utc>) -> DateTime<Local> {
        dt.with_timezone(&Local)
    }

    /// e.g. "Friday, 1 March 2024"
    pub fn day_label(&self, dt: &DateTime<Utc>) -> String {
        Self::local(dt)
            .format_localized("%A, %e %B %Y", self.locale)
            .to_string()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn time(&self, dt: &DateTime<Utc>) -> String {
        Self::local(dt).format_localized("%H:%M", self.locale).to_string()
    }

    pub fn date(&self, dt: &DateTime<Utc>) -> String {
        Self::local(dt).format_localized("%x", self.locale).to_string()
    }

    /// Heading for a view, e.g. "Week of Monday, 4 March 2024".
    pub fn window_label(&self, window: &ViewWindow, view: ViewName) -> String {
        let first = self.day_label(&window.start);
        match view {
            ViewName::Day => first,
            ViewName::Week => format!("Week of {}", first),
            ViewName::Month => Self::local(&window.start)
                .format_localized("%B %Y", self.locale)
                .to_string(),
        }
    }
}

fn parse_locale(tag: &str) -> Locale {
    let normalized = tag.trim().replace('-', "_");
    Locale::try_from(normalized.as_str()).unwrap_or_else(|_| {
        warn!(locale = tag, "unknown locale, using POSIX formatting");
        Locale::POSIX
    })
}

/// Extension trait for terminal rendering with colors.
pub trait Render {
    fn render(&self, formatter: &Formatter) -> String;
}

impl Render for Occurrence {
    fn render(&self, formatter: &Formatter) -> String {
        let time = if self.all_day {
            format!("{:>13}", "all-day")
        } else {
            format!(
                "{:>13}",
                format!("{}-{}", formatter.time(&self.start), formatter.time(&self.end))
            )
        };

        let mut line = format!("  {} {}", time.cyan(), self.title);
        if let Some(notes) = self.notes.as_deref().filter(|n| !n.is_empty()) {
            line.push_str(&format!(" {}", format!("({})", notes).dimmed()));
        }
        line
    }
}

impl Render for Event {
    fn render(&self, formatter: &Formatter) -> String {
        let when = if self.all_day {
            formatter.date(&self.start)
        } else {
            format!("{} {}", formatter.date(&self.start), formatter.time(&self.start))
        };

        let mut line = format!("{} {} {}", self.id.dimmed(), when.cyan(), self.title);
        if let Some(rule) = &self.rrule {
            line.push_str(&format!(" {}", format!("↻ {}", rule).yellow()));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_locale_tags_with_dash_or_underscore() {
        assert_eq!(parse_locale("pl-PL"), Locale::pl_PL);
        assert_eq!(parse_locale("en_US"), Locale::en_US);
    }

    #[test]
    fn test_unknown_locale_falls_back_to_posix() {
        assert_eq!(parse_locale("xx-YY"), Locale::POSIX);
    }

    #[test]
    fn test_all_day_occurrence_renders_label() {
        let occurrence = Occurrence {
            series_id: "a".into(),
            start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap(),
            title: "Holiday".into(),
            notes: None,
            all_day: true,
        };
        let line = occurrence.render(&Formatter::new("en-US"));
        assert!(line.contains("all-day"));
        assert!(line.contains("Holiday"));
    }
}
