//! Enumerations and field types for to-do tasks.
//!
//! Every token that is persisted (day hints, recurrence types) is stored in its
//! canonical English spelling. Values that do not parse are kept verbatim in an
//! `Unrecognised` variant so that a bad record degrades instead of failing to load.

use std::fmt;

use chrono::Weekday;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Canonical weekday names, indexed 0=Sunday..6=Saturday.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Canonical English name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAY_NAMES[day.num_days_from_sunday() as usize]
}

/// Weekday for an index where 0=Sunday..6=Saturday (wraps modulo 7).
pub fn weekday_from_sunday_index(index: u32) -> Weekday {
    match index % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

fn parse_weekday(s: &str) -> Option<Weekday> {
    WEEKDAY_NAMES
        .iter()
        .position(|name| *name == s)
        .map(|i| weekday_from_sunday_index(i as u32))
}

/// User-chosen bucket hint, distinct from the weekday of the due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DayToken {
    None,
    Immediate,
    Soon,
    Waiting,
    Day(Weekday),
    /// A stored value that is not a canonical token.
    Unrecognised(String),
}

impl DayToken {
    /// Parse a canonical English token. Anything else is kept as `Unrecognised`.
    pub fn parse(s: &str) -> Self {
        match s {
            "None" => Self::None,
            "Immediate" => Self::Immediate,
            "Soon" => Self::Soon,
            "Waiting" => Self::Waiting,
            other => match parse_weekday(other) {
                Some(day) => Self::Day(day),
                None => Self::Unrecognised(other.to_string()),
            },
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "None",
            Self::Immediate => "Immediate",
            Self::Soon => "Soon",
            Self::Waiting => "Waiting",
            Self::Day(day) => weekday_name(*day),
            Self::Unrecognised(raw) => raw,
        }
    }
}

impl From<String> for DayToken {
    fn from(s: String) -> Self {
        DayToken::parse(&s)
    }
}

impl From<DayToken> for String {
    fn from(token: DayToken) -> Self {
        token.as_str().to_string()
    }
}

impl fmt::Display for DayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a recurring task comes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Recurrence {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
    Unrecognised(String),
}

impl Recurrence {
    pub fn parse(s: &str) -> Self {
        match s {
            "Daily" => Self::Daily,
            "Weekly" => Self::Weekly,
            "Biweekly" => Self::Biweekly,
            "Monthly" => Self::Monthly,
            "Yearly" => Self::Yearly,
            other => Self::Unrecognised(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Biweekly => "Biweekly",
            Self::Monthly => "Monthly",
            Self::Yearly => "Yearly",
            Self::Unrecognised(raw) => raw,
        }
    }
}

impl From<String> for Recurrence {
    fn from(s: String) -> Self {
        Recurrence::parse(&s)
    }
}

impl From<Recurrence> for String {
    fn from(r: Recurrence) -> Self {
        r.as_str().to_string()
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section a task is rendered under.
///
/// `Immediate` is a classification result only: its tasks are shown at the end
/// of today's weekday section and it never appears as a header of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Day(Weekday),
    Immediate,
    Soon,
    Waiting,
    Completed,
}

impl Category {
    /// Canonical English token, used as the key for display lookup.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day(day) => weekday_name(day),
            Self::Immediate => "Immediate",
            Self::Soon => "Soon",
            Self::Waiting => "Waiting",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Representative hour of each manual slot. Automatic tasks are interleaved
// with manually placed ones by comparing their due hour against these.
pub const SLOT_EARLY_MORNING_HOUR: u32 = 3;
pub const SLOT_MORNING_HOUR: u32 = 9;
pub const SLOT_AFTERNOON_HOUR: u32 = 15;
pub const SLOT_EVENING_HOUR: u32 = 21;

/// Time-of-day slot a task was dragged into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ManualSlot {
    EarlyMorning,
    Morning,
    Afternoon,
    Evening,
}

impl ManualSlot {
    pub const ALL: [ManualSlot; 4] = [
        ManualSlot::EarlyMorning,
        ManualSlot::Morning,
        ManualSlot::Afternoon,
        ManualSlot::Evening,
    ];

    /// Stored `manualPosition` value.
    pub fn position(self) -> u8 {
        match self {
            Self::EarlyMorning => 0,
            Self::Morning => 1,
            Self::Afternoon => 2,
            Self::Evening => 3,
        }
    }

    pub fn from_position(position: u8) -> Option<Self> {
        Self::ALL.get(position as usize).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::EarlyMorning => "early morning",
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }
}

/// Hour of day a stored `manualPosition` stands for. Out-of-range positions
/// count as evening.
pub fn slot_hour(position: u8) -> u32 {
    match position {
        0 => SLOT_EARLY_MORNING_HOUR,
        1 => SLOT_MORNING_HOUR,
        2 => SLOT_AFTERNOON_HOUR,
        _ => SLOT_EVENING_HOUR,
    }
}

/// Priority levels. Stored on the task as the numeric level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Priority {
    Normal,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn level(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    pub fn from_level(level: u8) -> Self {
        match level {
            1 => Self::Low,
            2 => Self::Medium,
            3 => Self::High,
            _ => Self::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// Parse a `--day` argument: a canonical token, case-insensitive.
pub fn parse_day_arg(s: &str) -> Result<DayToken, String> {
    let trimmed = s.trim();
    let mut chars = trimmed.chars();
    let capitalised: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    match DayToken::parse(&capitalised) {
        DayToken::Unrecognised(_) => Err(format!(
            "unknown day '{s}': expected none, immediate, soon, waiting or a weekday name"
        )),
        token => Ok(token),
    }
}

/// Parse a `--repeat` argument: a canonical recurrence type, case-insensitive.
pub fn parse_recurrence_arg(s: &str) -> Result<Recurrence, String> {
    match s.trim().to_lowercase().as_str() {
        "daily" => Ok(Recurrence::Daily),
        "weekly" => Ok(Recurrence::Weekly),
        "biweekly" => Ok(Recurrence::Biweekly),
        "monthly" => Ok(Recurrence::Monthly),
        "yearly" => Ok(Recurrence::Yearly),
        _ => Err(format!(
            "unknown recurrence '{s}': expected daily, weekly, biweekly, monthly or yearly"
        )),
    }
}
