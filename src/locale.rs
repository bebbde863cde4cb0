//! Display strings for canonical tokens.
//!
//! Categorisation only ever works with canonical English tokens. Translation
//! happens here, at the output boundary, through the `Localizer` trait.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::fields::*;

/// Maps canonical tokens to display strings for one locale.
pub trait Localizer {
    fn category(&self, category: Category) -> &'static str;
    fn day_token(&self, token: &DayToken) -> String;
    fn recurrence(&self, recurrence: &Recurrence) -> String;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Locale {
    #[default]
    #[serde(alias = "en")]
    #[value(alias = "en")]
    English,
    #[serde(alias = "he")]
    #[value(alias = "he")]
    Hebrew,
}

// Indexed 0=Sunday..6=Saturday, like `WEEKDAY_NAMES`.
const HEBREW_WEEKDAYS: [&str; 7] = ["ראשון", "שני", "שלישי", "רביעי", "חמישי", "שישי", "שבת"];
const HEBREW_NONE: &str = "ללא";
const HEBREW_IMMEDIATE: &str = "מיידי";
const HEBREW_SOON: &str = "בקרוב";
const HEBREW_WAITING: &str = "בהמתנה";
const HEBREW_COMPLETED: &str = "הושלם";

fn hebrew_recurrence(recurrence: &Recurrence) -> Option<&'static str> {
    match recurrence {
        Recurrence::Daily => Some("יומי"),
        Recurrence::Weekly => Some("שבועי"),
        Recurrence::Biweekly => Some("דו-שבועי"),
        Recurrence::Monthly => Some("חודשי"),
        Recurrence::Yearly => Some("שנתי"),
        Recurrence::Unrecognised(_) => None,
    }
}

impl Localizer for Locale {
    fn category(&self, category: Category) -> &'static str {
        match self {
            Locale::English => category.as_str(),
            Locale::Hebrew => match category {
                Category::Day(day) => HEBREW_WEEKDAYS[day.num_days_from_sunday() as usize],
                Category::Immediate => HEBREW_IMMEDIATE,
                Category::Soon => HEBREW_SOON,
                Category::Waiting => HEBREW_WAITING,
                Category::Completed => HEBREW_COMPLETED,
            },
        }
    }

    fn day_token(&self, token: &DayToken) -> String {
        match (self, token) {
            (Locale::English, t) => t.as_str().to_string(),
            (Locale::Hebrew, DayToken::None) => HEBREW_NONE.to_string(),
            (Locale::Hebrew, DayToken::Immediate) => HEBREW_IMMEDIATE.to_string(),
            (Locale::Hebrew, DayToken::Soon) => HEBREW_SOON.to_string(),
            (Locale::Hebrew, DayToken::Waiting) => HEBREW_WAITING.to_string(),
            (Locale::Hebrew, DayToken::Day(day)) => {
                HEBREW_WEEKDAYS[day.num_days_from_sunday() as usize].to_string()
            }
            (Locale::Hebrew, DayToken::Unrecognised(raw)) => raw.clone(),
        }
    }

    fn recurrence(&self, recurrence: &Recurrence) -> String {
        match self {
            Locale::English => recurrence.as_str().to_string(),
            Locale::Hebrew => hebrew_recurrence(recurrence)
                .map(str::to_string)
                .unwrap_or_else(|| recurrence.as_str().to_string()),
        }
    }
}

/// Canonical token for a value written by an older client that stored
/// localised strings. Returns `None` for values with no known meaning.
pub fn canonical_day_token(raw: &str) -> Option<DayToken> {
    let trimmed = raw.trim();
    match DayToken::parse(trimmed) {
        DayToken::Unrecognised(_) => {}
        token => return Some(token),
    }
    match trimmed {
        HEBREW_NONE => Some(DayToken::None),
        HEBREW_IMMEDIATE => Some(DayToken::Immediate),
        HEBREW_SOON => Some(DayToken::Soon),
        HEBREW_WAITING => Some(DayToken::Waiting),
        other => HEBREW_WEEKDAYS
            .iter()
            .position(|d| *d == other)
            .map(|i| DayToken::Day(weekday_from_sunday_index(i as u32))),
    }
}

/// Canonical recurrence type for a legacy localised value.
pub fn canonical_recurrence(raw: &str) -> Option<Recurrence> {
    let trimmed = raw.trim();
    match Recurrence::parse(trimmed) {
        Recurrence::Unrecognised(_) => {}
        r => return Some(r),
    }
    match trimmed {
        "יומי" => Some(Recurrence::Daily),
        "שבועי" => Some(Recurrence::Weekly),
        "דו-שבועי" | "דו שבועי" | "כל שבועיים" => Some(Recurrence::Biweekly),
        "חודשי" => Some(Recurrence::Monthly),
        "שנתי" => Some(Recurrence::Yearly),
        _ => None,
    }
}
