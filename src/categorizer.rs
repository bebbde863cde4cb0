//! Bucketing and ordering of tasks into the weekday board.
//!
//! `categorize` takes a snapshot of live tasks and a local "now" and returns
//! the sections to render: today's weekday first, then the following six
//! days, then Soon, Waiting and Completed. Empty sections are dropped.
//! The function is pure; every call with the same input yields the same output.

use std::cmp::Ordering;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use tracing::warn;

use crate::fields::*;
use crate::locale::{canonical_day_token, Localizer};
use crate::task::{Task, MILLIS_PER_HOUR};

/// One rendered group: a header category and its ordered tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub category: Category,
    pub tasks: Vec<Task>,
}

impl Section {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Header label for display.
    pub fn title(&self, localizer: &dyn Localizer) -> &'static str {
        localizer.category(self.category)
    }
}

/// Reference dates for one categorisation pass.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub today: NaiveDate,
    pub next_week: NaiveDate,
    /// Weekdays in rendering order, starting with today.
    pub days: [Weekday; 7],
}

impl Window {
    pub fn new(now: NaiveDateTime) -> Self {
        let today = now.date();
        let first = today.weekday().num_days_from_sunday();
        let mut days = [Weekday::Sun; 7];
        for (i, slot) in days.iter_mut().enumerate() {
            *slot = weekday_from_sunday_index(first + i as u32);
        }
        Window {
            today,
            next_week: today + Duration::days(7),
            days,
        }
    }

    /// Position of a weekday in rendering order (0 = today).
    fn slot_of(&self, day: Weekday) -> usize {
        let today = self.today.weekday().num_days_from_sunday();
        ((day.num_days_from_sunday() + 7 - today) % 7) as usize
    }
}

#[derive(Default)]
struct Buckets {
    days: [Vec<Task>; 7],
    immediate: Vec<Task>,
    soon: Vec<Task>,
    waiting: Vec<Task>,
    completed: Vec<Task>,
}

impl Buckets {
    fn push(&mut self, category: Category, task: Task, window: &Window) {
        match category {
            Category::Day(day) => self.days[window.slot_of(day)].push(task),
            Category::Immediate => self.immediate.push(task),
            Category::Soon => self.soon.push(task),
            Category::Waiting => self.waiting.push(task),
            Category::Completed => self.completed.push(task),
        }
    }
}

/// Bucket and order `tasks` relative to `now` (local wall-clock time).
pub fn categorize(tasks: &[Task], now: NaiveDateTime) -> Vec<Section> {
    let window = Window::new(now);
    let mut buckets = Buckets::default();

    for task in tasks {
        if !task.is_recurring && task.is_completed {
            if task.completion_date.is_none() {
                warn!(task = %task.id, "completed task has no completion date");
            }
            buckets.completed.push(task.clone());
        } else if task.is_daily() {
            for (slot, day) in window.days.iter().enumerate() {
                let mut copy = task.clone();
                copy.day_of_week = Some(DayToken::Day(*day));
                copy.is_completed = slot == 0 && task.is_completed;
                buckets.days[slot].push(copy);
            }
        } else {
            let category = classify(task, &window);
            buckets.push(category, task.clone(), &window);
        }
    }

    for day in buckets.days.iter_mut() {
        day.sort_by(compare);
    }
    buckets.immediate.sort_by(compare);
    buckets.soon.sort_by(compare);
    buckets.waiting.sort_by(compare);
    buckets.completed.sort_by(compare_completed);

    let Buckets { days, immediate, soon, waiting, completed } = buckets;
    let mut sections = Vec::with_capacity(10);
    let mut immediate = Some(immediate);
    for (slot, mut day_tasks) in days.into_iter().enumerate() {
        if slot == 0 {
            day_tasks.extend(immediate.take().unwrap_or_default());
        }
        sections.push(Section { category: Category::Day(window.days[slot]), tasks: day_tasks });
    }
    sections.push(Section { category: Category::Soon, tasks: soon });
    sections.push(Section { category: Category::Waiting, tasks: waiting });
    sections.push(Section { category: Category::Completed, tasks: completed });

    sections.retain(|s| !s.tasks.is_empty());
    sections
}

/// Bucket for a task that is neither completed-and-one-off nor daily.
///
/// Precedence: overdue, then an explicit day hint, then the due date's
/// weekday when it falls within the coming week, otherwise Waiting.
pub fn classify(task: &Task, window: &Window) -> Category {
    if let Some(due) = task.due_date {
        if due < window.today {
            return Category::Immediate;
        }
    }

    let hint = match &task.day_of_week {
        Some(DayToken::Unrecognised(raw)) => match canonical_day_token(raw) {
            Some(token) => Some(token),
            None => {
                warn!(task = %task.id, token = %raw, "unrecognised day token, filing under Waiting");
                return Category::Waiting;
            }
        },
        other => other.clone(),
    };

    match hint {
        Some(DayToken::Immediate) => Category::Immediate,
        Some(DayToken::Soon) => Category::Soon,
        Some(DayToken::Day(day)) => Category::Day(day),
        None | Some(DayToken::None | DayToken::Waiting | DayToken::Unrecognised(_)) => match task.due_date {
            Some(due) if due >= window.today && due < window.next_week => {
                Category::Day(due.weekday())
            }
            _ => Category::Waiting,
        },
    }
}

/// Ordering within every section except Completed.
///
/// Manually placed tasks order by slot. Automatic tasks order by due time,
/// then priority, with untimed tasks last. A timed automatic task meets a
/// manual one by comparing its due hour with the slot's representative hour;
/// on an equal hour the manual task goes first.
pub fn compare(a: &Task, b: &Task) -> Ordering {
    match (a.manual_position, b.manual_position) {
        (Some(x), Some(y)) => x.cmp(&y),
        (None, None) => match (a.due_time, b.due_time) {
            (Some(x), Some(y)) => x.cmp(&y).then(a.priority.cmp(&b.priority)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.priority.cmp(&b.priority),
        },
        (Some(position), None) => manual_against_auto(position, b),
        (None, Some(position)) => manual_against_auto(position, a).reverse(),
    }
}

fn manual_against_auto(position: u8, auto: &Task) -> Ordering {
    match auto.due_time {
        None => Ordering::Less,
        Some(millis) => slot_hour(position)
            .cmp(&(millis / MILLIS_PER_HOUR))
            .then(Ordering::Less),
    }
}

/// Most recently completed first; tasks without a completion date last.
pub fn compare_completed(a: &Task, b: &Task) -> Ordering {
    match (a.completion_date, b.completion_date) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveTime, TimeZone, Utc};

    use crate::locale::Locale;
    use crate::task::{TaskDraft, MILLIS_PER_MINUTE};

    // Monday 2026-10-19, 10:30 local.
    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_time(NaiveTime::from_hms_opt(10, 30, 0).unwrap())
    }

    fn today() -> NaiveDate {
        now().date()
    }

    fn stamp(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, hour, 0, 0).unwrap()
    }

    fn task(id: &str) -> Task {
        TaskDraft::new(format!("task {id}")).into_task(id.to_string(), "owner", stamp(8))
    }

    fn hours(h: u32) -> u32 {
        h * MILLIS_PER_HOUR
    }

    fn ids(section: &Section) -> Vec<&str> {
        section.tasks.iter().map(|t| t.id.as_str()).collect()
    }

    fn find(sections: &[Section], category: Category) -> Option<&Section> {
        sections.iter().find(|s| s.category == category)
    }

    #[test]
    fn test_window_rotates_from_today() {
        let window = Window::new(now());
        assert_eq!(window.today.weekday(), Weekday::Mon);
        assert_eq!(window.days[0], Weekday::Mon);
        assert_eq!(window.days[5], Weekday::Sat);
        assert_eq!(window.days[6], Weekday::Sun);
        assert_eq!(window.next_week, NaiveDate::from_ymd_opt(2026, 10, 26).unwrap());
    }

    #[test]
    fn test_completed_one_off_ignores_due_and_day() {
        let mut t = task("a");
        t.is_completed = true;
        t.completion_date = Some(stamp(9));
        t.due_date = Some(today() - Duration::days(3));
        t.day_of_week = Some(DayToken::Immediate);

        let mut no_date = task("b");
        no_date.is_completed = true;
        no_date.day_of_week = Some(DayToken::Day(Weekday::Wed));

        let sections = categorize(&[t, no_date], now());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].category, Category::Completed);
        assert_eq!(ids(&sections[0]), vec!["a", "b"]);
    }

    #[test]
    fn test_overdue_goes_after_todays_tasks() {
        let mut overdue = task("late");
        overdue.due_date = Some(today() - Duration::days(1));
        overdue.day_of_week = Some(DayToken::Day(Weekday::Fri));
        let mut monday = task("mon");
        monday.day_of_week = Some(DayToken::Day(Weekday::Mon));
        monday.priority = 3;

        let sections = categorize(&[overdue, monday], now());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].category, Category::Day(Weekday::Mon));
        assert_eq!(ids(&sections[0]), vec!["mon", "late"]);
    }

    #[test]
    fn test_immediate_alone_still_opens_today() {
        let mut urgent = task("now");
        urgent.day_of_week = Some(DayToken::Immediate);
        let sections = categorize(&[urgent], now());
        assert_eq!(sections[0].category, Category::Day(Weekday::Mon));
        assert_eq!(sections[0].task_count(), 1);
    }

    #[test]
    fn test_no_date_no_day_waits() {
        let mut unset = task("unset");
        unset.day_of_week = None;
        let sentinel = task("none");
        let mut waiting = task("waiting");
        waiting.day_of_week = Some(DayToken::Waiting);

        let sections = categorize(&[unset, sentinel, waiting], now());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].category, Category::Waiting);
        assert_eq!(sections[0].task_count(), 3);
    }

    #[test]
    fn test_due_within_week_uses_due_weekday() {
        let mut soon = task("thu");
        soon.due_date = Some(today() + Duration::days(3));
        let mut edge = task("sun");
        edge.due_date = Some(today() + Duration::days(6));
        edge.day_of_week = Some(DayToken::Waiting);
        let mut far = task("far");
        far.due_date = Some(today() + Duration::days(7));

        let sections = categorize(&[soon, edge, far], now());
        assert_eq!(ids(find(&sections, Category::Day(Weekday::Thu)).unwrap()), vec!["thu"]);
        assert_eq!(ids(find(&sections, Category::Day(Weekday::Sun)).unwrap()), vec!["sun"]);
        assert_eq!(ids(find(&sections, Category::Waiting).unwrap()), vec!["far"]);
    }

    #[test]
    fn test_day_hint_beats_future_due_date() {
        let mut t = task("hint");
        t.day_of_week = Some(DayToken::Day(Weekday::Sat));
        t.due_date = Some(today() + Duration::days(30));
        let mut s = task("soon");
        s.day_of_week = Some(DayToken::Soon);
        s.due_date = Some(today());

        let sections = categorize(&[t, s], now());
        let cats: Vec<Category> = sections.iter().map(|s| s.category).collect();
        assert_eq!(cats, vec![Category::Day(Weekday::Sat), Category::Soon]);
    }

    #[test]
    fn test_section_order_and_empty_sections_dropped() {
        let mut sun = task("sun");
        sun.day_of_week = Some(DayToken::Day(Weekday::Sun));
        let mut tue = task("tue");
        tue.day_of_week = Some(DayToken::Day(Weekday::Tue));
        let mut soon = task("soon");
        soon.day_of_week = Some(DayToken::Soon);
        let wait = task("wait");
        let mut done = task("done");
        done.is_completed = true;
        done.completion_date = Some(stamp(7));

        let sections = categorize(&[done, wait, soon, sun, tue], now());
        let cats: Vec<Category> = sections.iter().map(|s| s.category).collect();
        assert_eq!(
            cats,
            vec![
                Category::Day(Weekday::Tue),
                Category::Day(Weekday::Sun),
                Category::Soon,
                Category::Waiting,
                Category::Completed,
            ]
        );
    }

    #[test]
    fn test_unknown_token_falls_back_to_waiting() {
        let mut t = task("odd");
        t.day_of_week = Some(DayToken::Unrecognised("Someday".to_string()));
        t.due_date = Some(today() + Duration::days(1));
        let sections = categorize(&[t], now());
        assert_eq!(sections[0].category, Category::Waiting);
    }

    #[test]
    fn test_legacy_localised_token_is_canonicalised() {
        let mut t = task("legacy");
        t.day_of_week = Some(DayToken::Unrecognised("רביעי".to_string()));
        let mut w = task("legacy-wait");
        w.day_of_week = Some(DayToken::Unrecognised("בהמתנה".to_string()));
        w.due_date = Some(today() + Duration::days(1));

        let sections = categorize(&[t, w], now());
        assert_eq!(ids(find(&sections, Category::Day(Weekday::Wed)).unwrap()), vec!["legacy"]);
        assert_eq!(ids(find(&sections, Category::Day(Weekday::Tue)).unwrap()), vec!["legacy-wait"]);
    }

    #[test]
    fn test_daily_recurring_fans_out_to_every_day() {
        let mut daily = task("walk");
        daily.is_recurring = true;
        daily.recurrence_type = Some(Recurrence::Daily);
        daily.is_completed = true;
        daily.completion_date = Some(stamp(9));
        daily.due_date = Some(today() - Duration::days(10));

        let sections = categorize(&[daily.clone()], now());
        assert_eq!(sections.len(), 7);
        let window = Window::new(now());
        for (slot, section) in sections.iter().enumerate() {
            assert_eq!(section.category, Category::Day(window.days[slot]));
            assert_eq!(section.task_count(), 1);
            let copy = &section.tasks[0];
            assert_eq!(copy.day_of_week, Some(DayToken::Day(window.days[slot])));
            assert_eq!(copy.is_completed, slot == 0);
        }

        daily.is_completed = false;
        let sections = categorize(&[daily], now());
        assert_eq!(sections.len(), 7);
        assert!(sections.iter().all(|s| !s.tasks[0].is_completed));
    }

    #[test]
    fn test_daily_stored_in_hebrew_fans_out() {
        let mut daily = task("vitamins");
        daily.is_recurring = true;
        daily.recurrence_type = Some(Recurrence::Unrecognised("יומי".to_string()));

        let sections = categorize(&[daily], now());
        assert_eq!(sections.len(), 7);
        assert!(sections.iter().all(|s| ids(s) == vec!["vitamins"]));
        assert!(find(&sections, Category::Waiting).is_none());
    }

    #[test]
    fn test_non_daily_recurring_uses_general_rule() {
        let mut weekly = task("bins");
        weekly.is_recurring = true;
        weekly.recurrence_type = Some(Recurrence::Weekly);
        weekly.is_completed = true;
        weekly.due_date = Some(today() + Duration::days(2));

        let sections = categorize(&[weekly], now());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].category, Category::Day(Weekday::Wed));
        assert!(sections[0].tasks[0].is_completed);
    }

    #[test]
    fn test_timed_auto_task_before_later_manual_slot() {
        let mut manual = task("task1");
        manual.manual_position = Some(ManualSlot::Morning.position());
        let mut auto = task("task2");
        auto.due_time = Some(hours(5));
        assert_eq!(compare(&auto, &manual), Ordering::Less);
        assert_eq!(compare(&manual, &auto), Ordering::Greater);

        auto.due_time = Some(hours(16));
        assert_eq!(compare(&auto, &manual), Ordering::Greater);
    }

    #[test]
    fn test_untimed_auto_task_after_manual() {
        let mut manual = task("m");
        manual.manual_position = Some(ManualSlot::Evening.position());
        let auto = task("a");
        assert_eq!(compare(&manual, &auto), Ordering::Less);
        assert_eq!(compare(&auto, &manual), Ordering::Greater);
    }

    #[test]
    fn test_automatic_ordering() {
        let mut early = task("early");
        early.due_time = Some(hours(7));
        early.priority = 3;
        let mut late_low = task("late-low");
        late_low.due_time = Some(hours(18));
        let mut late_high = task("late-high");
        late_high.due_time = Some(hours(18));
        late_high.priority = 2;
        let mut untimed_high = task("untimed-high");
        untimed_high.priority = 3;
        let untimed = task("untimed");

        let mut all = vec![untimed_high, late_high, untimed, late_low, early];
        all.sort_by(compare);
        let order: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["early", "late-low", "late-high", "untimed", "untimed-high"]);
    }

    #[test]
    fn test_manual_tasks_order_by_position() {
        let mut evening = task("evening");
        evening.manual_position = Some(3);
        let mut morning = task("morning");
        morning.manual_position = Some(1);
        let mut auto_noon = task("noon");
        auto_noon.due_time = Some(hours(12) + 30 * MILLIS_PER_MINUTE);
        let mut auto_nine = task("nine");
        auto_nine.due_time = Some(hours(9) + 45 * MILLIS_PER_MINUTE);

        let mut all = vec![evening, auto_noon, morning, auto_nine];
        all.sort_by(compare);
        let order: Vec<&str> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["morning", "nine", "noon", "evening"]);
    }

    #[test]
    fn test_comparator_is_transitive() {
        let mut pool = Vec::new();
        for position in [None, Some(0), Some(1), Some(2), Some(3), Some(6)] {
            for time in [None, Some(hours(2)), Some(hours(9)), Some(hours(9) + 1), Some(hours(21))] {
                for priority in [0, 2] {
                    let mut t = task("x");
                    t.manual_position = position;
                    t.due_time = time;
                    t.priority = priority;
                    pool.push(t);
                }
            }
        }
        for a in &pool {
            for b in &pool {
                assert_eq!(compare(a, b), compare(b, a).reverse());
                for c in &pool {
                    if compare(a, b) != Ordering::Greater && compare(b, c) != Ordering::Greater {
                        assert_ne!(compare(a, c), Ordering::Greater);
                    }
                }
            }
        }
    }

    #[test]
    fn test_completed_most_recent_first() {
        let mut a = task("A");
        a.is_completed = true;
        a.completion_date = Some(stamp(9));
        let mut b = task("B");
        b.is_completed = true;
        b.completion_date = Some(stamp(10));
        let mut c = task("C");
        c.is_completed = true;

        let sections = categorize(&[c, a, b], now());
        assert_eq!(ids(&sections[0]), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_categorize_is_idempotent() {
        let mut tasks = Vec::new();
        for i in 0..12u32 {
            let mut t = task(&format!("t{i}"));
            t.due_date = Some(today() + Duration::days(i as i64 - 3));
            t.due_time = (i % 3 == 0).then(|| hours(i));
            t.manual_position = (i % 4 == 1).then_some((i % 4) as u8);
            t.priority = (i % 4) as u8;
            tasks.push(t);
        }
        assert_eq!(categorize(&tasks, now()), categorize(&tasks, now()));
    }

    #[test]
    fn test_section_title_uses_localizer() {
        let sections = categorize(&[task("w")], now());
        assert_eq!(sections[0].title(&Locale::English), "Waiting");
        assert_eq!(sections[0].title(&Locale::Hebrew), "בהמתנה");
    }
}
