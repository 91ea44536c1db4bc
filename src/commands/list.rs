use anyhow::Result;
use owo_colors::OwoColorize;
use schedir_core::ViewCache;
use schedir_core::config::SchedirConfig;

use crate::render::{Formatter, Render};

pub fn run(cache: &ViewCache, config: &SchedirConfig) -> Result<()> {
    let mut events = cache.events();

    if events.is_empty() {
        println!("{}", "No events stored".dimmed());
        return Ok(());
    }

    events.sort_by(|a, b| a.start.cmp(&b.start));

    let formatter = Formatter::new(&config.locale);
    for event in &events {
        println!("{}", event.render(&formatter));
    }

    Ok(())
}
