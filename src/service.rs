//! Application operations over an injected `TaskStore`.
//!
//! Every mutation re-reads the current record first, so fields the caller did
//! not mean to touch (description, provenance) are never overwritten with a
//! stale copy.

use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{info, warn};

use crate::categorizer::{categorize, Section};
use crate::db::TaskStore;
use crate::error::{Result, TodoError};
use crate::fields::{DayToken, ManualSlot, Recurrence};
use crate::locale::{canonical_day_token, canonical_recurrence};
use crate::recurrence::{advance_patch, completion_patch};
use crate::task::{Task, TaskDraft, TaskPatch, MILLIS_PER_DAY};

/// Result of a completion toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Completed,
    Reopened,
    /// A recurring task moved on to its next occurrence.
    Advanced { next_due: Option<NaiveDate> },
}

/// Task operations scoped to one owner.
pub struct TaskService<S> {
    store: S,
    owner: String,
}

impl<S: TaskStore> TaskService<S> {
    pub fn new(store: S, owner: impl Into<String>) -> Self {
        TaskService { store, owner: owner.into() }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Live tasks, most recently modified first.
    pub fn tasks(&self) -> Vec<Task> {
        self.store.list(&self.owner)
    }

    /// The categorised board as of `now`.
    pub fn board(&self, now: DateTime<Local>) -> Vec<Section> {
        categorize(&self.tasks(), now.naive_local())
    }

    /// Fetch a live task that belongs to this owner.
    pub fn get(&self, id: &str) -> Result<Task> {
        let task = self.store.get(id)?;
        if task.owner_id != self.owner {
            return Err(TodoError::not_found(id));
        }
        Ok(task)
    }

    /// Resolve a full id, a unique id prefix or a unique description
    /// (case-insensitive) to a task id.
    pub fn resolve(&self, identifier: &str) -> Result<String> {
        let identifier = identifier.trim();
        let tasks = self.tasks();
        if let Some(task) = tasks.iter().find(|t| t.id == identifier) {
            return Ok(task.id.clone());
        }

        let by_prefix: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(identifier)).collect();
        let candidates = if identifier.is_empty() || by_prefix.is_empty() {
            let wanted = identifier.to_lowercase();
            tasks.iter().filter(|t| t.description.to_lowercase() == wanted).collect()
        } else {
            by_prefix
        };

        match candidates.as_slice() {
            [] => Err(TodoError::not_found(identifier)),
            [task] => Ok(task.id.clone()),
            many => {
                let listed: Vec<String> = many
                    .iter()
                    .map(|t| format!("{} ({})", t.id, t.description))
                    .collect();
                Err(TodoError::validation(
                    "task identifier",
                    format!("'{identifier}' matches several tasks: {}", listed.join(", ")),
                ))
            }
        }
    }

    pub fn add(&mut self, draft: TaskDraft, now: DateTime<Local>) -> Result<String> {
        validate_description(&draft.description)?;
        validate_due_time(draft.due_time)?;
        validate_priority(draft.priority)?;
        validate_position(draft.manual_position)?;
        self.store.create(draft, &self.owner, now.with_timezone(&Utc))
    }

    pub fn edit(&mut self, id: &str, patch: TaskPatch, now: DateTime<Local>) -> Result<Task> {
        self.get(id)?;
        if let Some(description) = &patch.description {
            validate_description(description)?;
        }
        if let Some(due_time) = patch.due_time {
            validate_due_time(due_time)?;
        }
        if let Some(priority) = patch.priority {
            validate_priority(priority)?;
        }
        if let Some(position) = patch.manual_position {
            validate_position(position)?;
        }
        if patch.is_empty() {
            return self.get(id);
        }
        self.store.update(id, patch, now.with_timezone(&Utc))
    }

    /// Mark a task done or not done.
    ///
    /// Completing a weekly, biweekly, monthly or yearly task advances it to
    /// its next occurrence instead of completing it.
    pub fn set_completed(&mut self, id: &str, completed: bool, now: DateTime<Local>) -> Result<Completion> {
        let current = self.get(id)?;
        let stamp = now.with_timezone(&Utc);

        if completed {
            if let Some(patch) = advance_patch(&current, now.date_naive()) {
                let next_due = patch.due_date.flatten();
                self.store.update(id, patch, stamp)?;
                info!(task = %id, next_due = ?next_due, "advanced recurring task");
                return Ok(Completion::Advanced { next_due });
            }
        }

        self.store.update(id, completion_patch(completed, stamp), stamp)?;
        Ok(if completed { Completion::Completed } else { Completion::Reopened })
    }

    /// Write the completion state as given, without advancing recurring
    /// tasks. Used when mirroring a status owned by another system.
    pub fn sync_completion(&mut self, id: &str, completed: bool, now: DateTime<Local>) -> Result<Task> {
        self.get(id)?;
        let stamp = now.with_timezone(&Utc);
        self.store.update(id, completion_patch(completed, stamp), stamp)
    }

    /// Flip the completion state of a task.
    pub fn toggle(&mut self, id: &str, now: DateTime<Local>) -> Result<Completion> {
        let current = self.get(id)?;
        self.set_completed(id, !current.is_completed, now)
    }

    /// Pin a task to a time-of-day slot, or return it to automatic ordering.
    pub fn set_slot(&mut self, id: &str, slot: Option<ManualSlot>, now: DateTime<Local>) -> Result<Task> {
        let patch = TaskPatch {
            manual_position: Some(slot.map(ManualSlot::position)),
            ..Default::default()
        };
        self.edit(id, patch, now)
    }

    pub fn delete(&mut self, id: &str, now: DateTime<Local>) -> Result<()> {
        self.get(id)?;
        self.store.soft_delete(id, now.with_timezone(&Utc))
    }

    /// Rewrite day hints and recurrence types stored in a localised spelling
    /// to their canonical tokens. Returns how many tasks changed.
    pub fn migrate_legacy_tokens(&mut self, now: DateTime<Local>) -> Result<usize> {
        let stamp = now.with_timezone(&Utc);
        let mut migrated = 0;
        for task in self.tasks() {
            let mut patch = TaskPatch::default();
            if let Some(DayToken::Unrecognised(raw)) = &task.day_of_week {
                match canonical_day_token(raw) {
                    Some(token) => patch.day_of_week = Some(Some(token)),
                    None => warn!(task = %task.id, token = %raw, "leaving unknown day token"),
                }
            }
            if let Some(Recurrence::Unrecognised(raw)) = &task.recurrence_type {
                match canonical_recurrence(raw) {
                    Some(r) => patch.recurrence_type = Some(Some(r)),
                    None => warn!(task = %task.id, recurrence = %raw, "leaving unknown recurrence type"),
                }
            }
            if !patch.is_empty() {
                self.store.update(&task.id, patch, stamp)?;
                migrated += 1;
            }
        }
        info!(migrated, "migrated legacy tokens");
        Ok(migrated)
    }
}

fn validate_description(description: &str) -> Result<()> {
    if description.trim().is_empty() {
        return Err(TodoError::validation("description", "must not be empty"));
    }
    Ok(())
}

fn validate_due_time(due_time: Option<u32>) -> Result<()> {
    match due_time {
        Some(ms) if ms >= MILLIS_PER_DAY => {
            Err(TodoError::validation("due time", format!("{ms}ms is past midnight")))
        }
        _ => Ok(()),
    }
}

fn validate_priority(priority: u8) -> Result<()> {
    if priority > 3 {
        return Err(TodoError::validation("priority", format!("{priority} is not in 0..=3")));
    }
    Ok(())
}

fn validate_position(position: Option<u8>) -> Result<()> {
    match position {
        Some(p) if p > 3 => Err(TodoError::validation("manual position", format!("{p} is not in 0..=3"))),
        _ => Ok(()),
    }
}
