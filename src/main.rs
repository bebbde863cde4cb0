//! # todo - weekly to-do board
//!
//! A command-line to-do list that files every task under the section of the
//! coming week it belongs to, with an optional terminal user interface (TUI).
//!
//! ## Sections
//!
//! The board opens with today's weekday and runs through the next six days,
//! followed by **Soon**, **Waiting** and **Completed**. A task lands in a
//! section by, in order:
//!
//! - being overdue (shown at the end of today's section),
//! - its day hint (`--day friday`, `--day soon`),
//! - the weekday of its due date when that falls within the coming week,
//! - otherwise **Waiting**.
//!
//! Daily recurring tasks appear under every weekday. Completing a weekly,
//! biweekly, monthly or yearly task moves it to its next occurrence.
//!
//! ## Quick Start
//!
//! ```bash
//! todo add "Groceries" --due today --time 17:30
//! todo add "Call plumber" --day soon
//! todo add "Vitamins" --repeat daily --slot morning
//! todo list
//! todo complete groceries
//! todo ui
//! ```
//!
//! Data is stored in `~/.mytodo/tasks.json`; settings live in
//! `~/.mytodo/config.toml`. Set `RUST_LOG=debug` to see store activity.

use clap::Parser;
use tracing::debug;

pub mod categorizer;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod familysync;
pub mod fields;
pub mod locale;
pub mod recurrence;
pub mod render;
pub mod service;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::{app_dir, Config, CONFIG_FILE};
use db::Database;
use service::TaskService;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Completions need no store or config
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let app_dir = app_dir();
    let config_path = app_dir.join(CONFIG_FILE);
    let mut config = match Config::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(owner) = cli.owner {
        config.owner = owner;
    }
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    let db_path = cli.db.unwrap_or_else(|| config.data_path(&app_dir));
    debug!(db = %db_path.display(), owner = %config.owner, "starting");

    if let Commands::Config { init } = cli.command {
        cmd_config(&config, &config_path, &db_path, init);
        return;
    }

    let db = match Database::open(&db_path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open task store: {e}");
            std::process::exit(1);
        }
    };
    let mut svc = TaskService::new(db, config.owner.clone());
    let locale = config.locale;

    match cli.command {
        Commands::Completions { .. } => unreachable!("completions handled above"),
        Commands::Config { .. } => unreachable!("config handled above"),

        Commands::Ui => cmd_ui(&mut svc, locale),

        Commands::Add { description, due, time, day, repeat, priority, slot, remind } =>
            cmd_add(&mut svc, description, due, time, day, repeat, priority, slot, remind),

        Commands::List { hide_completed } => cmd_list(&svc, locale, hide_completed),

        Commands::View { id } => cmd_view(&svc, locale, id),

        Commands::Update {
            id, desc, due, clear_due, time, clear_time, day, repeat, no_repeat,
            priority, remind, clear_remind,
        } => cmd_update(&mut svc, id, desc, due, clear_due, time, clear_time, day,
                        repeat, no_repeat, priority, remind, clear_remind),

        Commands::Complete { id } => cmd_complete(&mut svc, id),

        Commands::Reopen { id } => cmd_reopen(&mut svc, id),

        Commands::Slot { id, slot, clear } => cmd_slot(&mut svc, id, slot, clear),

        Commands::Delete { id } => cmd_delete(&mut svc, id),

        Commands::Import { input } => cmd_import(&mut svc, &input),

        Commands::Migrate => cmd_migrate(&mut svc),
    }
}
