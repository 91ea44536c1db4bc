use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use schedir_core::{EventDraft, Intent, Outcome, ViewCache};

pub async fn run(
    cache: &ViewCache,
    title: String,
    start: String,
    end: String,
    notes: Option<String>,
    all_day: bool,
    rrule: Option<String>,
) -> Result<()> {
    let draft = EventDraft {
        title,
        start,
        end,
        notes,
        all_day,
        rrule,
    };

    let outcome = cache
        .apply(Intent::Add(draft))
        .await
        .context("Failed to add event")?;

    if let Outcome::Added(event) = outcome {
        println!(
            "{} {}",
            format!("  Created: {}", event).green(),
            format!("({})", event.id).dimmed()
        );
    }

    Ok(())
}
