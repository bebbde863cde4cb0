//! Advancing recurring tasks to their next occurrence.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use crate::fields::{DayToken, Recurrence};
use crate::task::{Task, TaskPatch};

/// Due date of the occurrence after `base`.
///
/// Month and year steps keep the day of month, clamped to the last day of the
/// target month (Jan 31 -> Feb 28, Feb 29 -> Feb 28). Daily and unrecognised
/// recurrences do not advance.
pub fn next_due_date(recurrence: &Recurrence, base: NaiveDate) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::Weekly => Some(base + Duration::weeks(1)),
        Recurrence::Biweekly => Some(base + Duration::weeks(2)),
        Recurrence::Monthly => Some(add_months(base, 1)),
        Recurrence::Yearly => Some(add_months(base, 12)),
        Recurrence::Daily | Recurrence::Unrecognised(_) => None,
    }
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.month0() + months;
    let year = date.year() + (total / 12) as i32;
    let month = total % 12 + 1;
    let last = last_day_of_month(year, month);
    // The clamped day always exists.
    NaiveDate::from_ymd_opt(year, month, date.day().min(last)).unwrap_or(date)
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// Patch that moves a completed occurrence of `task` to the next one, or
/// `None` when the task does not advance (one-off, daily, unknown type).
///
/// The new due date counts from the current due date, or from `today` when
/// the task has none. The day hint is reset so the task files by date again.
pub fn advance_patch(task: &Task, today: NaiveDate) -> Option<TaskPatch> {
    let recurrence = task.recurrence()?;
    let next = next_due_date(&recurrence, task.due_date.unwrap_or(today))?;
    Some(TaskPatch {
        due_date: Some(Some(next)),
        day_of_week: Some(Some(DayToken::None)),
        is_completed: Some(false),
        completion_date: Some(None),
        ..Default::default()
    })
}

/// Patch for a plain completion toggle.
pub fn completion_patch(completed: bool, now: DateTime<Utc>) -> TaskPatch {
    TaskPatch {
        is_completed: Some(completed),
        completion_date: Some(completed.then_some(now)),
        ..Default::default()
    }
}
