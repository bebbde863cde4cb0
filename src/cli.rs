use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::locale::Locale;

/// File-backed to-do list that files tasks under the days of the coming week.
/// Settings come from ~/.mytodo/config.toml; the flags below override them.
#[derive(Parser)]
#[command(name = "todo", version, about = "Weekly to-do board")]
pub struct Cli {
    /// Path to the JSON task store.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Owner whose tasks are shown and created.
    #[arg(long, global = true)]
    pub owner: Option<String>,

    /// Display language for section and token labels.
    #[arg(long, global = true, value_enum)]
    pub locale: Option<Locale>,

    #[command(subcommand)]
    pub command: Commands,
}
