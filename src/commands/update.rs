use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use schedir_core::{EventPatch, Intent, Outcome, Scope, ViewCache};

pub async fn run(cache: &ViewCache, id: String, patch: EventPatch, scope: Scope) -> Result<()> {
    if patch.is_empty() {
        anyhow::bail!("Nothing to update. Pass at least one field, e.g. --title");
    }

    let outcome = cache
        .apply(Intent::Change {
            id: id.clone(),
            patch,
            scope,
        })
        .await
        .with_context(|| format!("Failed to update event {}", id))?;

    if let Outcome::Changed(event) = outcome {
        println!("{}", format!("  Updated: {}", event).yellow());
    }

    Ok(())
}

/// Turn CLI flags into a patch. `--clear-*` flags map to an explicit clear,
/// which is different from leaving the field out.
#[allow(clippy::too_many_arguments)]
pub fn build_patch(
    title: Option<String>,
    start: Option<String>,
    end: Option<String>,
    notes: Option<String>,
    clear_notes: bool,
    all_day: Option<bool>,
    rrule: Option<String>,
    clear_rrule: bool,
) -> EventPatch {
    EventPatch {
        title,
        start,
        end,
        notes: if clear_notes { Some(None) } else { notes.map(Some) },
        all_day,
        rrule: if clear_rrule { Some(None) } else { rrule.map(Some) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_patch_leaves_missing_flags_unset() {
        let patch = build_patch(
            Some("Retro".into()),
            None,
            None,
            None,
            false,
            None,
            None,
            false,
        );
        assert_eq!(patch.title.as_deref(), Some("Retro"));
        assert_eq!(patch.notes, None);
        assert_eq!(patch.rrule, None);
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_build_patch_clear_flags() {
        let patch = build_patch(None, None, None, None, true, None, None, true);
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.rrule, Some(None));
    }

    #[test]
    fn test_build_patch_with_nothing_is_empty() {
        let patch = build_patch(None, None, None, None, false, None, None, false);
        assert!(patch.is_empty());
    }
}
