//! Text rendering of the categorised board and due-date input parsing.

use std::fmt::Write as _;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::categorizer::Section;
use crate::fields::{parse_day_arg, DayToken, ManualSlot};
use crate::locale::Localizer;
use crate::task::{format_due_time, Task};

/// Characters of the id shown in listings. Any unique prefix resolves.
pub const SHORT_ID_LEN: usize = 8;

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Parse a due date: `YYYY-MM-DD`, "today", "tomorrow", "in Nd", "in Nw" or a
/// weekday name (its next occurrence, today included).
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(days) = rest.strip_suffix('d').and_then(|n| n.trim().parse::<i64>().ok()) {
            return Some(today + Duration::days(days));
        }
        if let Some(weeks) = rest.strip_suffix('w').and_then(|n| n.trim().parse::<i64>().ok()) {
            return Some(today + Duration::weeks(weeks));
        }
    }

    if let Ok(DayToken::Day(day)) = parse_day_arg(&s) {
        return Some(next_weekday(today, day));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

fn next_weekday(today: NaiveDate, day: Weekday) -> NaiveDate {
    let ahead = (7 + day.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    today + Duration::days(ahead as i64)
}

/// Due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();
    match days {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

/// One listing line for a task.
pub fn task_line(task: &Task, localizer: &dyn Localizer, today: NaiveDate) -> String {
    let check = if task.is_completed { "[x]" } else { "[ ]" };
    let time = task.due_time.map(format_due_time).unwrap_or_else(|| "--:--".into());
    let mut line = format!(
        "  {check} {:<width$} {time}  {}  ({})",
        short_id(&task.id),
        task.description,
        task.priority_level().label(),
        width = SHORT_ID_LEN,
    );
    if let Some(due) = task.due_date {
        let _ = write!(line, "  due {}", format_due_relative(due, today));
    }
    if let Some(recurrence) = task.recurrence() {
        let _ = write!(line, "  ~{}", localizer.recurrence(&recurrence));
    }
    if let Some(slot) = task.manual_position.and_then(ManualSlot::from_position) {
        let _ = write!(line, "  @{}", slot.label());
    }
    if task.is_externally_sourced() {
        line.push_str("  [FamilySync]");
    }
    line
}

/// The whole board: each section as `<label> (<count>)` followed by its tasks.
pub fn render_board(sections: &[Section], localizer: &dyn Localizer, today: NaiveDate) -> String {
    let mut out = String::new();
    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{} ({})", section.title(localizer), section.task_count());
        for task in &section.tasks {
            let _ = writeln!(out, "{}", task_line(task, localizer, today));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeZone, Utc};

    use crate::categorizer::categorize;
    use crate::fields::{Category, Recurrence};
    use crate::locale::Locale;
    use crate::task::{TaskDraft, FAMILYSYNC_SOURCE, MILLIS_PER_HOUR, MILLIS_PER_MINUTE};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn now() -> NaiveDateTime {
        today().and_hms_opt(10, 30, 0).unwrap()
    }

    fn task(id: &str, draft: TaskDraft) -> Task {
        draft.into_task(id.into(), "me", Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap())
    }

    #[test]
    fn test_parse_due_input() {
        assert_eq!(parse_due_input("today", today()), Some(today()));
        assert_eq!(parse_due_input("Tomorrow", today()), NaiveDate::from_ymd_opt(2026, 10, 20));
        assert_eq!(parse_due_input("in 3d", today()), NaiveDate::from_ymd_opt(2026, 10, 22));
        assert_eq!(parse_due_input("in 2w", today()), NaiveDate::from_ymd_opt(2026, 11, 2));
        assert_eq!(parse_due_input("friday", today()), NaiveDate::from_ymd_opt(2026, 10, 23));
        assert_eq!(parse_due_input("monday", today()), Some(today()));
        assert_eq!(parse_due_input("2027-01-05", today()), NaiveDate::from_ymd_opt(2027, 1, 5));
        assert_eq!(parse_due_input("someday", today()), None);
    }

    #[test]
    fn test_format_due_relative() {
        let d = |n: i64| today() + Duration::days(n);
        assert_eq!(format_due_relative(d(0), today()), "today");
        assert_eq!(format_due_relative(d(1), today()), "tomorrow");
        assert_eq!(format_due_relative(d(4), today()), "in 4d");
        assert_eq!(format_due_relative(d(-2), today()), "2d late");
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_task_line_markers() {
        let mut draft = TaskDraft::new("Swim practice");
        draft.due_time = Some(17 * MILLIS_PER_HOUR + 30 * MILLIS_PER_MINUTE);
        draft.priority = 3;
        draft.recurrence = Some(Recurrence::Weekly);
        draft.manual_position = Some(2);
        draft.provenance.source_app = Some(FAMILYSYNC_SOURCE.into());
        draft.provenance.source_task_id = Some("fs-1".into());
        let line = task_line(&task("abcdef123456", draft), &Locale::English, today());
        assert_eq!(
            line,
            "  [ ] abcdef12 17:30  Swim practice  (High)  ~Weekly  @afternoon  [FamilySync]"
        );

        let plain = task_line(&task("t1", TaskDraft::new("Read")), &Locale::Hebrew, today());
        assert_eq!(plain, "  [ ] t1       --:--  Read  (Normal)");
    }

    #[test]
    fn test_render_board_headers() {
        let mut soon = TaskDraft::new("Call plumber");
        soon.day_of_week = Some(DayToken::Soon);
        let mut today_task = TaskDraft::new("Groceries");
        today_task.due_date = Some(today());
        let tasks = vec![task("a1", soon), task("b2", today_task)];
        let sections = categorize(&tasks, now());
        assert_eq!(sections[0].category, Category::Day(Weekday::Mon));

        let english = render_board(&sections, &Locale::English, today());
        assert_eq!(
            english,
            "Monday (1)\n  [ ] b2       --:--  Groceries  (Normal)  due today\n\n\
             Soon (1)\n  [ ] a1       --:--  Call plumber  (Normal)\n"
        );

        let hebrew = render_board(&sections, &Locale::Hebrew, today());
        assert!(hebrew.starts_with("שני (1)\n"));
        assert!(hebrew.contains("בקרוב (1)\n"));
    }
}
