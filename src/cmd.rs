//! Command implementations for the CLI interface.
//!
//! Each handler maps its arguments onto a `TaskService` operation and prints
//! the outcome. Failures are printed to stderr and exit with status 1.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::config::Config;
use crate::db::Database;
use crate::error::{Result, TodoError};
use crate::familysync::{import_records, load_records};
use crate::fields::*;
use crate::locale::{Locale, Localizer};
use crate::render::{format_due_relative, parse_due_input, render_board};
use crate::service::{Completion, TaskService};
use crate::task::{format_due_time, parse_due_time, TaskDraft, TaskPatch};
use crate::tui::run::run_board;

pub type Service = TaskService<Database>;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive board.
    Ui,

    /// Add a new task.
    Add {
        /// What needs doing.
        description: String,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", "in Nw" or a weekday.
        #[arg(long)]
        due: Option<String>,
        /// Due time of day, HH:MM.
        #[arg(long)]
        time: Option<String>,
        /// Bucket hint: none | immediate | soon | waiting | a weekday name.
        #[arg(long, value_parser = parse_day_arg)]
        day: Option<DayToken>,
        /// Recurrence: daily | weekly | biweekly | monthly | yearly.
        #[arg(long, value_parser = parse_recurrence_arg)]
        repeat: Option<Recurrence>,
        #[arg(long, value_enum, default_value_t = Priority::Normal)]
        priority: Priority,
        /// Pin to a time-of-day slot instead of ordering by due time.
        #[arg(long, value_enum)]
        slot: Option<ManualSlot>,
        /// Reminder, in minutes before the due time.
        #[arg(long)]
        remind: Option<i32>,
    },

    /// Show the categorised board.
    List {
        /// Leave out the Completed section.
        #[arg(long)]
        hide_completed: bool,
    },

    /// View a single task by id, id prefix or description.
    View {
        id: String,
    },

    /// Update fields on a task.
    Update {
        id: String,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long, conflicts_with = "clear_time")]
        time: Option<String>,
        #[arg(long)]
        clear_time: bool,
        #[arg(long, value_parser = parse_day_arg)]
        day: Option<DayToken>,
        #[arg(long, value_parser = parse_recurrence_arg, conflicts_with = "no_repeat")]
        repeat: Option<Recurrence>,
        /// Make the task a one-off.
        #[arg(long)]
        no_repeat: bool,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "clear_remind")]
        remind: Option<i32>,
        #[arg(long)]
        clear_remind: bool,
    },

    /// Mark a task done. Recurring tasks move to their next occurrence.
    Complete {
        id: String,
    },

    /// Mark a completed task as not done.
    Reopen {
        id: String,
    },

    /// Pin a task to a time-of-day slot, or clear the pin.
    Slot {
        id: String,
        #[arg(value_enum, required_unless_present = "clear")]
        slot: Option<ManualSlot>,
        #[arg(long, conflicts_with = "slot")]
        clear: bool,
    },

    /// Delete a task.
    Delete {
        id: String,
    },

    /// Import tasks from a FamilySync JSON export.
    Import {
        input: PathBuf,
    },

    /// Rewrite day hints and recurrence types stored in Hebrew to canonical tokens.
    Migrate,

    /// Show the effective configuration.
    Config {
        /// Write a config file with the current settings.
        #[arg(long)]
        init: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn fail(err: TodoError) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(1);
}

fn resolve(svc: &Service, id: &str) -> String {
    svc.resolve(id).unwrap_or_else(|e| fail(e))
}

fn parse_time_arg(time: &str) -> Result<u32> {
    parse_due_time(time)
        .ok_or_else(|| TodoError::validation("due time", format!("'{time}' is not HH:MM before 24:00")))
}

fn parse_due_arg(due: &str) -> Result<NaiveDate> {
    parse_due_input(due, Local::now().date_naive())
        .ok_or_else(|| TodoError::validation("due date", format!("'{due}' is not a date")))
}

/// Launch the terminal board.
pub fn cmd_ui(svc: &mut Service, locale: Locale) {
    if let Err(e) = run_board(svc, locale) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

pub fn cmd_add(
    svc: &mut Service,
    description: String,
    due: Option<String>,
    time: Option<String>,
    day: Option<DayToken>,
    repeat: Option<Recurrence>,
    priority: Priority,
    slot: Option<ManualSlot>,
    remind: Option<i32>,
) {
    let mut draft = TaskDraft::new(description);
    draft.due_date = due.as_deref().map(parse_due_arg).transpose().unwrap_or_else(|e| fail(e));
    draft.due_time = time.as_deref().map(parse_time_arg).transpose().unwrap_or_else(|e| fail(e));
    if let Some(day) = day {
        draft.day_of_week = Some(day);
    }
    draft.recurrence = repeat;
    draft.priority = priority.level();
    draft.manual_position = slot.map(ManualSlot::position);
    draft.reminder_offset = remind;

    let id = svc.add(draft, Local::now()).unwrap_or_else(|e| fail(e));
    println!("Added task {id}");
}

pub fn cmd_list(svc: &Service, locale: Locale, hide_completed: bool) {
    let now = Local::now();
    let mut sections = svc.board(now);
    if hide_completed {
        sections.retain(|s| s.category != Category::Completed);
    }
    if sections.is_empty() {
        println!("No tasks.");
        return;
    }
    print!("{}", render_board(&sections, &locale, now.date_naive()));
}

pub fn cmd_view(svc: &Service, locale: Locale, id: String) {
    let id = resolve(svc, &id);
    let task = svc.get(&id).unwrap_or_else(|e| fail(e));
    let now = Local::now();
    let today = now.date_naive();
    let section = svc
        .board(now)
        .into_iter()
        .find(|s| s.tasks.iter().any(|t| t.id == id))
        .map(|s| s.title(&locale).to_string())
        .unwrap_or_else(|| "-".into());

    println!("ID:           {}", task.id);
    println!("Description:  {}", task.description);
    println!("Section:      {section}");
    println!(
        "Due:          {}",
        match task.due_date {
            Some(d) => format!("{d} ({})", format_due_relative(d, today)),
            None => "-".into(),
        }
    );
    println!("Time:         {}", task.due_time.map(format_due_time).unwrap_or_else(|| "-".into()));
    println!(
        "Day:          {}",
        task.day_of_week.as_ref().map(|d| locale.day_token(d)).unwrap_or_else(|| "-".into())
    );
    println!(
        "Repeats:      {}",
        task.recurrence().map(|r| locale.recurrence(&r)).unwrap_or_else(|| "-".into())
    );
    println!("Priority:     {}", task.priority_level().label());
    println!(
        "Slot:         {}",
        task.manual_position
            .and_then(ManualSlot::from_position)
            .map(ManualSlot::label)
            .unwrap_or("auto")
    );
    println!(
        "Completed:    {}",
        match (task.is_completed, task.completion_date) {
            (true, Some(at)) => format!("yes ({})", at.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
            (true, None) => "yes".into(),
            (false, _) => "no".into(),
        }
    );
    if let Some(offset) = task.reminder_offset {
        println!("Reminder:     {offset} min before");
    }
    if let Some(days) = &task.reminder_days {
        println!("Remind on:    {days}");
    }
    if task.is_externally_sourced() {
        let p = &task.provenance;
        println!(
            "Source:       FamilySync {} (group {})",
            p.source_task_id.as_deref().unwrap_or("-"),
            p.source_group_id.as_deref().unwrap_or("-")
        );
    }
    println!("Created UTC:  {}", task.created_at.to_rfc3339());
    println!("Updated UTC:  {}", task.updated_at.to_rfc3339());
}

pub fn cmd_update(
    svc: &mut Service,
    id: String,
    desc: Option<String>,
    due: Option<String>,
    clear_due: bool,
    time: Option<String>,
    clear_time: bool,
    day: Option<DayToken>,
    repeat: Option<Recurrence>,
    no_repeat: bool,
    priority: Option<Priority>,
    remind: Option<i32>,
    clear_remind: bool,
) {
    let id = resolve(svc, &id);
    let mut patch = TaskPatch {
        description: desc,
        day_of_week: day.map(Some),
        priority: priority.map(Priority::level),
        ..Default::default()
    };
    if clear_due {
        patch.due_date = Some(None);
    } else if let Some(due) = due {
        patch.due_date = Some(Some(parse_due_arg(&due).unwrap_or_else(|e| fail(e))));
    }
    if clear_time {
        patch.due_time = Some(None);
    } else if let Some(time) = time {
        patch.due_time = Some(Some(parse_time_arg(&time).unwrap_or_else(|e| fail(e))));
    }
    if no_repeat {
        patch.is_recurring = Some(false);
        patch.recurrence_type = Some(None);
    } else if let Some(repeat) = repeat {
        patch.is_recurring = Some(true);
        patch.recurrence_type = Some(Some(repeat));
    }
    if clear_remind {
        patch.reminder_offset = Some(None);
    } else if remind.is_some() {
        patch.reminder_offset = Some(remind);
    }

    if patch.is_empty() {
        println!("Nothing to update.");
        return;
    }
    svc.edit(&id, patch, Local::now()).unwrap_or_else(|e| fail(e));
    println!("Updated task {id}");
}

pub fn cmd_complete(svc: &mut Service, id: String) {
    let id = resolve(svc, &id);
    match svc.set_completed(&id, true, Local::now()).unwrap_or_else(|e| fail(e)) {
        Completion::Advanced { next_due: Some(next) } => println!("Done. Next occurrence due {next}"),
        Completion::Advanced { next_due: None } => println!("Done. Moved to next occurrence"),
        _ => println!("Marked done."),
    }
}

pub fn cmd_reopen(svc: &mut Service, id: String) {
    let id = resolve(svc, &id);
    svc.set_completed(&id, false, Local::now()).unwrap_or_else(|e| fail(e));
    println!("Reopened {id}");
}

pub fn cmd_slot(svc: &mut Service, id: String, slot: Option<ManualSlot>, clear: bool) {
    let id = resolve(svc, &id);
    let slot = if clear { None } else { slot };
    svc.set_slot(&id, slot, Local::now()).unwrap_or_else(|e| fail(e));
    match slot {
        Some(s) => println!("Pinned {id} to {}", s.label()),
        None => println!("Cleared slot on {id}"),
    }
}

pub fn cmd_delete(svc: &mut Service, id: String) {
    let id = resolve(svc, &id);
    svc.delete(&id, Local::now()).unwrap_or_else(|e| fail(e));
    println!("Deleted {id}");
}

pub fn cmd_import(svc: &mut Service, input: &Path) {
    let records = load_records(input).unwrap_or_else(|e| fail(e));
    let report = import_records(svc, &records, Local::now()).unwrap_or_else(|e| fail(e));
    println!(
        "Imported {} record(s): {} created, {} synced, {} unchanged, {} skipped",
        records.len(),
        report.created,
        report.synced,
        report.unchanged,
        report.skipped
    );
}

pub fn cmd_migrate(svc: &mut Service) {
    let migrated = svc.migrate_legacy_tokens(Local::now()).unwrap_or_else(|e| fail(e));
    println!("Migrated {migrated} task(s)");
}

pub fn cmd_config(config: &Config, config_path: &Path, data_path: &Path, init: bool) {
    if init {
        if config_path.exists() {
            println!("Config already exists at {}", config_path.display());
        } else {
            config.save(config_path).unwrap_or_else(|e| fail(e));
            println!("Wrote {}", config_path.display());
        }
    }
    println!("Config file:  {}", config_path.display());
    println!("Owner:        {}", config.owner);
    println!("Locale:       {:?}", config.locale);
    println!("Data file:    {}", data_path.display());
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
