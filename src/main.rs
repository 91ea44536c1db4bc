mod commands;
mod render;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use schedir_core::config::SchedirConfig;
use schedir_core::store::DirStore;
use schedir_core::view::ViewName;
use schedir_core::{EventRepository, Scope, ViewCache};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "schedir")]
#[command(about = "View and edit events in your schedir event store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show occurrences for a day, week or month
    View {
        /// Date inside the period to show (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// day, week or month (defaults to the configured view)
        #[arg(short, long)]
        view: Option<ViewName>,
    },
    /// List stored events (series masters and one-off events)
    List,
    /// Add an event
    Add {
        title: String,

        /// Start date/time (e.g. "2025-03-20T15:00Z")
        #[arg(short, long)]
        start: String,

        /// End date/time
        #[arg(short, long)]
        end: String,

        #[arg(short, long)]
        notes: Option<String>,

        #[arg(long)]
        all_day: bool,

        /// Recurrence rule, e.g. "FREQ=WEEKLY;BYDAY=MO"
        #[arg(short, long)]
        rrule: Option<String>,
    },
    /// Change fields of an event
    Update {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        start: Option<String>,

        #[arg(short, long)]
        end: Option<String>,

        #[arg(short, long, conflicts_with = "clear_notes")]
        notes: Option<String>,

        #[arg(long)]
        clear_notes: bool,

        #[arg(long)]
        all_day: Option<bool>,

        #[arg(short, long, conflicts_with = "clear_rrule")]
        rrule: Option<String>,

        #[arg(long)]
        clear_rrule: bool,

        /// series or occurrence
        #[arg(long, default_value = "series")]
        scope: Scope,
    },
    /// Delete an event (and every occurrence of a series)
    Delete {
        id: String,

        /// series or occurrence
        #[arg(long, default_value = "series")]
        scope: Scope,
    },
    /// Show the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = SchedirConfig::load()?;

    match cli.command {
        Commands::Config => commands::config::run(&config),
        Commands::View { date, view } => {
            let cache = open_cache(&config).await?;
            commands::view::run(&cache, &config, date, view)
        }
        Commands::List => {
            let cache = open_cache(&config).await?;
            commands::list::run(&cache, &config)
        }
        Commands::Add {
            title,
            start,
            end,
            notes,
            all_day,
            rrule,
        } => {
            let cache = open_cache(&config).await?;
            commands::add::run(&cache, title, start, end, notes, all_day, rrule).await
        }
        Commands::Update {
            id,
            title,
            start,
            end,
            notes,
            clear_notes,
            all_day,
            rrule,
            clear_rrule,
            scope,
        } => {
            let cache = open_cache(&config).await?;
            let patch = commands::update::build_patch(
                title,
                start,
                end,
                notes,
                clear_notes,
                all_day,
                rrule,
                clear_rrule,
            );
            commands::update::run(&cache, id, patch, scope).await
        }
        Commands::Delete { id, scope } => {
            let cache = open_cache(&config).await?;
            commands::delete::run(&cache, id, scope).await
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("SCHEDIR_LOG")
                .unwrap_or_else(|_| "schedir=warn,schedir_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn open_cache(config: &SchedirConfig) -> Result<ViewCache> {
    let store = Arc::new(DirStore::new(config.store_path()));
    let repository = EventRepository::new(store.clone()).with_timeout(config.store_timeout()?);

    ViewCache::load(repository)
        .await
        .with_context(|| format!("Failed to load events from {}", store.root().display()))
}
