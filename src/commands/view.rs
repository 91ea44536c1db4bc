use anyhow::Result;
use chrono::{Local, NaiveDate};
use owo_colors::OwoColorize;
use schedir_core::ViewCache;
use schedir_core::config::SchedirConfig;
use schedir_core::view::{RenderContext, ViewName, visible_occurrences};

use crate::render::{Formatter, Render};

pub fn run(
    cache: &ViewCache,
    config: &SchedirConfig,
    date: Option<NaiveDate>,
    view: Option<ViewName>,
) -> Result<()> {
    let context = RenderContext {
        locale: config.locale.clone(),
        view: view.unwrap_or(config.default_view),
        current_date: date.unwrap_or_else(|| Local::now().date_naive()),
        week_start: config.week_start()?,
    };
    let formatter = Formatter::new(&context.locale);
    let window = context.window();

    println!(
        "{}",
        formatter.window_label(&window, context.view).bold().underline()
    );
    println!();

    let occurrences = visible_occurrences(&cache.events(), &window);
    if occurrences.is_empty() {
        println!("{}", "No events".dimmed());
        return Ok(());
    }

    // Group occurrences by day and print
    let mut current_day: Option<String> = None;

    for occurrence in &occurrences {
        let day_label = formatter.day_label(&occurrence.start);

        if current_day.as_ref() != Some(&day_label) {
            if current_day.is_some() {
                println!();
            }
            println!("{}", day_label.bold());
            current_day = Some(day_label);
        }

        println!("{}", occurrence.render(&formatter));
    }

    Ok(())
}
