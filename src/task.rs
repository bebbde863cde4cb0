//! Task data structure and related functionality.
//!
//! This module defines the `Task` record as it is persisted by the store, the
//! `TaskDraft` used to create one, and the `TaskPatch` used for partial updates.
//! Field names serialise in camelCase so the store file reads the same as the
//! documents written by the mobile and web clients.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::locale::canonical_recurrence;

/// `sourceApp` value of tasks imported from FamilySync.
pub const FAMILYSYNC_SOURCE: &str = "familysync";

/// Milliseconds in a day; `dueTime` is always below this.
pub const MILLIS_PER_DAY: u32 = 86_400_000;
pub const MILLIS_PER_HOUR: u32 = 3_600_000;
pub const MILLIS_PER_MINUTE: u32 = 60_000;

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    /// Milliseconds since local midnight.
    pub due_time: Option<u32>,
    pub day_of_week: Option<DayToken>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_type: Option<Recurrence>,
    #[serde(default)]
    pub is_completed: bool,
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: u8,
    pub manual_position: Option<u8>,
    /// Minutes before the due time.
    pub reminder_offset: Option<i32>,
    pub reminder_days: Option<String>,
    #[serde(flatten)]
    pub provenance: Provenance,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Where an imported task came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "familySyncAssigneeId")]
    pub assignee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "familySyncCreatorId")]
    pub creator_id: Option<String>,
}

impl Task {
    /// Recurrence type of a recurring task. A recurring task without a type
    /// behaves like any other non-daily recurrence. Types stored in a
    /// localised spelling by older clients resolve to their canonical value.
    pub fn recurrence(&self) -> Option<Recurrence> {
        if !self.is_recurring {
            return None;
        }
        match self.recurrence_type.as_ref()? {
            Recurrence::Unrecognised(raw) => {
                Some(canonical_recurrence(raw).unwrap_or_else(|| Recurrence::Unrecognised(raw.clone())))
            }
            other => Some(other.clone()),
        }
    }

    pub fn is_daily(&self) -> bool {
        matches!(self.recurrence(), Some(Recurrence::Daily))
    }

    /// True for tasks imported from FamilySync.
    pub fn is_externally_sourced(&self) -> bool {
        self.provenance.source_app.as_deref() == Some(FAMILYSYNC_SOURCE)
            && self
                .provenance
                .source_task_id
                .as_deref()
                .is_some_and(|id| !id.is_empty())
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn priority_level(&self) -> Priority {
        Priority::from_level(self.priority)
    }
}

/// Field values for a new task. The store assigns id and timestamps.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<u32>,
    pub day_of_week: Option<DayToken>,
    pub recurrence: Option<Recurrence>,
    pub priority: u8,
    pub manual_position: Option<u8>,
    pub reminder_offset: Option<i32>,
    pub reminder_days: Option<String>,
    pub provenance: Provenance,
}

impl TaskDraft {
    pub fn new(description: impl Into<String>) -> Self {
        TaskDraft {
            description: description.into(),
            day_of_week: Some(DayToken::None),
            ..Default::default()
        }
    }

    /// Materialise the draft into a stored record.
    pub fn into_task(self, id: String, owner_id: &str, now: DateTime<Utc>) -> Task {
        Task {
            id,
            owner_id: owner_id.to_string(),
            description: self.description,
            due_date: self.due_date,
            due_time: self.due_time,
            day_of_week: self.day_of_week,
            is_recurring: self.recurrence.is_some(),
            recurrence_type: self.recurrence,
            is_completed: false,
            completion_date: None,
            priority: self.priority,
            manual_position: self.manual_position,
            reminder_offset: self.reminder_offset,
            reminder_days: self.reminder_days,
            provenance: self.provenance,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Partial update. `None` leaves a field alone; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub description: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub due_time: Option<Option<u32>>,
    pub day_of_week: Option<Option<DayToken>>,
    pub is_recurring: Option<bool>,
    pub recurrence_type: Option<Option<Recurrence>>,
    pub is_completed: Option<bool>,
    pub completion_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<u8>,
    pub manual_position: Option<Option<u8>>,
    pub reminder_offset: Option<Option<i32>>,
    pub reminder_days: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Apply the patch in place. Provenance is never part of a patch.
    pub fn apply(self, task: &mut Task) {
        if let Some(v) = self.description { task.description = v; }
        if let Some(v) = self.due_date { task.due_date = v; }
        if let Some(v) = self.due_time { task.due_time = v; }
        if let Some(v) = self.day_of_week { task.day_of_week = v; }
        if let Some(v) = self.is_recurring { task.is_recurring = v; }
        if let Some(v) = self.recurrence_type { task.recurrence_type = v; }
        if let Some(v) = self.is_completed { task.is_completed = v; }
        if let Some(v) = self.completion_date { task.completion_date = v; }
        if let Some(v) = self.priority { task.priority = v; }
        if let Some(v) = self.manual_position { task.manual_position = v; }
        if let Some(v) = self.reminder_offset { task.reminder_offset = v; }
        if let Some(v) = self.reminder_days { task.reminder_days = v; }
    }
}

/// Parse an `HH:MM` time of day into milliseconds since midnight.
pub fn parse_due_time(s: &str) -> Option<u32> {
    let (h, m) = s.trim().split_once(':')?;
    let hours: u32 = h.trim().parse().ok()?;
    let minutes: u32 = m.trim().parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * MILLIS_PER_HOUR + minutes * MILLIS_PER_MINUTE)
}

/// Format milliseconds since midnight as `HH:MM`.
pub fn format_due_time(millis: u32) -> String {
    let hours = millis / MILLIS_PER_HOUR;
    let minutes = (millis % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE;
    format!("{hours:02}:{minutes:02}")
}
