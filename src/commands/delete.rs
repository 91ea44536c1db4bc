use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use schedir_core::{Intent, Scope, ViewCache};

pub async fn run(cache: &ViewCache, id: String, scope: Scope) -> Result<()> {
    let title = cache.get(&id).map(|e| e.title);

    cache
        .apply(Intent::Delete {
            id: id.clone(),
            scope,
        })
        .await
        .with_context(|| format!("Failed to delete event {}", id))?;

    let label = title.unwrap_or(id);
    println!("{}", format!("  Deleted: {}", label).red());

    Ok(())
}
