use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::period::{ClockTime, Period, PeriodCount};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// The Monday-Friday academic week shown in the timetable.
    pub const WEEKDAYS: [DayOfWeek; 5] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
    ];

    pub fn from_chrono(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }

    /// Column in the weekday grid, `None` for the weekend.
    pub fn weekday_index(self) -> Option<usize> {
        Self::WEEKDAYS.iter().position(|day| *day == self)
    }

    pub fn is_weekday(self) -> bool {
        self.weekday_index().is_some()
    }

    pub fn short_label(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Mon",
            DayOfWeek::Tuesday => "Tue",
            DayOfWeek::Wednesday => "Wed",
            DayOfWeek::Thursday => "Thu",
            DayOfWeek::Friday => "Fri",
            DayOfWeek::Saturday => "Sat",
            DayOfWeek::Sunday => "Sun",
        }
    }
}

impl FromStr for DayOfWeek {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(DayOfWeek::Monday),
            "tuesday" | "tue" | "tues" => Ok(DayOfWeek::Tuesday),
            "wednesday" | "wed" => Ok(DayOfWeek::Wednesday),
            "thursday" | "thu" | "thur" | "thurs" => Ok(DayOfWeek::Thursday),
            "friday" | "fri" => Ok(DayOfWeek::Friday),
            "saturday" | "sat" => Ok(DayOfWeek::Saturday),
            "sunday" | "sun" => Ok(DayOfWeek::Sunday),
            other => Err(anyhow!("unknown day of week: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Class,
    Task,
    Exam,
    Reminder,
    #[default]
    Other,
}

macro_rules! impl_lowercase_from_str {
    ($ty:ty, $what:literal) => {
        impl FromStr for $ty {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let quoted = format!("\"{}\"", s.trim().to_ascii_lowercase());
                serde_json::from_str(&quoted).map_err(|_| anyhow!("invalid {}: {s}", $what))
            }
        }
    };
}

impl_lowercase_from_str!(Priority, "priority");
impl_lowercase_from_str!(TaskStatus, "task status");
impl_lowercase_from_str!(ExamStatus, "exam status");
impl_lowercase_from_str!(EventType, "event type");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSlot {
    pub id: u64,
    pub owner: OwnerId,
    pub name: String,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub period_count: PeriodCount,
    #[serde(default)]
    pub start_time: Option<ClockTime>,
    #[serde(default)]
    pub end_time: Option<ClockTime>,
    #[serde(default)]
    pub color: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ClassSlot {
    pub fn new(owner: OwnerId, name: String, now: NaiveDateTime) -> Self {
        Self {
            id: 0,
            owner,
            name,
            instructor: None,
            room: None,
            day_of_week: None,
            period: None,
            period_count: PeriodCount::Single,
            start_time: None,
            end_time: None,
            color: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Placed on a weekday grid cell; a period without a day is unscheduled.
    pub fn is_scheduled(&self) -> bool {
        self.day_of_week.is_some() && self.period.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub owner: OwnerId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub class_id: Option<u64>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub color: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Task {
    pub fn new(owner: OwnerId, title: String, now: NaiveDateTime) -> Self {
        Self {
            id: 0,
            owner,
            title,
            description: None,
            due_date: None,
            class_id: None,
            priority: Priority::Medium,
            status: TaskStatus::Pending,
            color: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Flips between completed and pending; in-progress counts as open.
    pub fn toggle_status(&mut self) {
        self.status = if self.is_completed() {
            TaskStatus::Pending
        } else {
            TaskStatus::Completed
        };
    }
}

/// Task list filter: `pending` means anything not yet completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => !task.is_completed(),
            TaskFilter::Completed => task.is_completed(),
        }
    }
}

impl FromStr for TaskFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "pending" | "open" => Ok(TaskFilter::Pending),
            "completed" | "done" => Ok(TaskFilter::Completed),
            other => Err(anyhow!("unknown task filter: {other} (expected all, pending or completed)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: u64,
    pub owner: OwnerId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub exam_date: NaiveDateTime,
    /// Minutes.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub class_id: Option<u64>,
    #[serde(default)]
    pub status: ExamStatus,
    #[serde(default)]
    pub color: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Exam {
    pub fn new(owner: OwnerId, title: String, exam_date: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self {
            id: 0,
            owner,
            title,
            description: None,
            exam_date,
            duration: None,
            room: None,
            class_id: None,
            status: ExamStatus::Scheduled,
            color: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: u64,
    pub owner: OwnerId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDateTime,
    #[serde(default)]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub color: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Event {
    pub fn new(owner: OwnerId, title: String, start_date: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self {
            id: 0,
            owner,
            title,
            description: None,
            start_date,
            end_date: None,
            all_day: false,
            event_type: EventType::Other,
            color: None,
            created_at: now,
            updated_at: now,
        }
    }
}
