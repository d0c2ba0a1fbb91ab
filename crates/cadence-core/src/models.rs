use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    #[serde(with = "uuid::serde::compact")]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
    Cancelled,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum TaskPriority {
    None,
    Low,
    Medium,
    High,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(TaskPriority::None),
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker: trashed tasks keep their row until the trash is emptied
    pub deleted_at: Option<DateTime<Utc>>,
    pub project_id: Option<Uuid>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            name: "".to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: TaskPriority::None,
            due_at: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
            project_id: None,
        }
    }
}

// ============================================================================
// Recurrence Models
// ============================================================================

/// How often a recurring item repeats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid frequency: {0}")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Frequency::Daily),
            "weekly" | "week" => Ok(Frequency::Weekly),
            "monthly" | "month" => Ok(Frequency::Monthly),
            "yearly" | "year" | "annually" => Ok(Frequency::Yearly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

/// Status of one occurrence after overlaying overrides onto the rule's default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum OccurrenceStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for OccurrenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccurrenceStatus::Scheduled => write!(f, "scheduled"),
            OccurrenceStatus::Completed => write!(f, "completed"),
            OccurrenceStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid occurrence status: {0}")]
pub struct ParseOccurrenceStatusError(String);

impl FromStr for OccurrenceStatus {
    type Err = ParseOccurrenceStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(OccurrenceStatus::Scheduled),
            "completed" => Ok(OccurrenceStatus::Completed),
            "cancelled" => Ok(OccurrenceStatus::Cancelled),
            _ => Err(ParseOccurrenceStatusError(s.to_string())),
        }
    }
}

/// Compact set of weekdays, used as the weekly recurrence mask.
///
/// Bit 0 is Monday, matching `Weekday::num_days_from_monday`. Round-trips
/// through text as a comma-separated list of short day names ("mon,wed").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const fn empty() -> Self {
        WeekdaySet(0)
    }

    pub fn single(day: Weekday) -> Self {
        let mut set = WeekdaySet::empty();
        set.insert(day);
        set
    }

    /// Monday through Friday.
    pub fn weekdays() -> Self {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
        .into_iter()
        .collect()
    }

    /// Saturday and Sunday.
    pub fn weekend() -> Self {
        [Weekday::Sat, Weekday::Sun].into_iter().collect()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn remove(&mut self, day: Weekday) {
        self.0 &= !(1 << day.num_days_from_monday());
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        (0u8..7).filter(|i| self.0 & (1 << i) != 0).map(|i| match i {
            0 => Weekday::Mon,
            1 => Weekday::Tue,
            2 => Weekday::Wed,
            3 => Weekday::Thu,
            4 => Weekday::Fri,
            5 => Weekday::Sat,
            _ => Weekday::Sun,
        })
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<T: IntoIterator<Item = Weekday>>(iter: T) -> Self {
        let mut set = WeekdaySet::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for day in self.iter() {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            let name = match day {
                Weekday::Mon => "mon",
                Weekday::Tue => "tue",
                Weekday::Wed => "wed",
                Weekday::Thu => "thu",
                Weekday::Fri => "fri",
                Weekday::Sat => "sat",
                Weekday::Sun => "sun",
            };
            write!(f, "{}", name)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid weekday set: {0}")]
pub struct ParseWeekdaySetError(String);

impl FromStr for WeekdaySet {
    type Err = ParseWeekdaySetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = WeekdaySet::empty();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let day: Weekday = part
                .parse()
                .map_err(|_| ParseWeekdaySetError(part.to_string()))?;
            set.insert(day);
        }
        Ok(set)
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Template describing how a recurring task repeats.
///
/// One rule per task (`task_id` unique). Occurrences are derived from this
/// template on demand; they are never stored. The rule is valid only when
/// `validate` passes, which every construction and update path enforces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceRule {
    /// Primary key, UUIDv7 for time-ordered performance
    #[serde(with = "uuid::serde::compact")]
    pub id: Uuid,
    /// The task this rule repeats
    #[serde(with = "uuid::serde::compact")]
    pub task_id: Uuid,
    pub frequency: Frequency,
    /// Every N base units (days, weeks, months or years)
    pub interval: u32,
    /// First calendar day of the pattern
    pub anchor_start: NaiveDate,
    /// Optional last calendar day (inclusive)
    pub anchor_end: Option<NaiveDate>,
    /// Weekly mask; empty means "the anchor's weekday only"
    pub days_of_week: WeekdaySet,
    /// Nominal time-of-day for occurrences
    pub at_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurrenceRule {
    /// Rejects invalid field combinations. Called at every construction and
    /// update site; the resolver can therefore assume a valid rule.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.interval < 1 {
            return Err(CoreError::InvalidRule(
                "interval must be at least 1".to_string(),
            ));
        }
        if !self.days_of_week.is_empty() && self.frequency != Frequency::Weekly {
            return Err(CoreError::InvalidRule(format!(
                "days of week can only be set for weekly rules, not {}",
                self.frequency
            )));
        }
        if let Some(end) = self.anchor_end {
            if end < self.anchor_start {
                return Err(CoreError::InvalidRule(format!(
                    "end date {} is before start date {}",
                    end, self.anchor_start
                )));
            }
        }
        Ok(())
    }
}

/// A single date's deviation from the rule's template.
///
/// Created lazily the first time one occurrence is completed, cancelled or
/// rescheduled. `None` fields fall through to the template defaults.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct OccurrenceOverride {
    #[serde(with = "uuid::serde::compact")]
    pub rule_id: Uuid,
    pub occurrence_date: NaiveDate,
    pub status: Option<OccurrenceStatus>,
    pub at_time: Option<NaiveTime>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Data Transfer Objects (DTOs)
// ============================================================================

/// Recurrence settings supplied alongside a new task
#[derive(Debug, Clone)]
pub struct NewRecurrence {
    pub frequency: Frequency,
    pub interval: u32,
    pub anchor_start: NaiveDate,
    pub anchor_end: Option<NaiveDate>,
    pub days_of_week: WeekdaySet,
    pub at_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub name: String,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub priority: Option<TaskPriority>,
    pub project_name: Option<String>, // Kept for CLI convenience
    pub project_id: Option<Uuid>,     // Used internally for transactions
    pub tags: Vec<String>,
    /// When present, a RecurrenceRule is created together with the task
    pub recurrence: Option<NewRecurrence>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub due_at: Option<Option<DateTime<Utc>>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub project_name: Option<Option<String>>,
    pub add_tags: Option<Vec<String>>,
    pub remove_tags: Option<Vec<String>>,
}

/// Data required to attach a recurrence rule to an existing task
#[derive(Debug, Clone)]
pub struct NewRuleData {
    pub task_id: Uuid,
    pub frequency: Frequency,
    pub interval: u32,
    pub anchor_start: NaiveDate,
    pub anchor_end: Option<NaiveDate>,
    pub days_of_week: WeekdaySet,
    pub at_time: Option<NaiveTime>,
}

/// Data for modifying an existing rule
#[derive(Debug, Clone, Default)]
pub struct UpdateRuleData {
    pub frequency: Option<Frequency>,
    pub interval: Option<u32>,
    pub anchor_start: Option<NaiveDate>,
    pub anchor_end: Option<Option<NaiveDate>>,
    pub days_of_week: Option<WeekdaySet>,
    pub at_time: Option<Option<NaiveTime>>,
}

/// Data for creating or folding into an occurrence override
#[derive(Debug, Clone)]
pub struct NewOverrideData {
    pub rule_id: Uuid,
    /// Which occurrence to affect
    pub occurrence_date: NaiveDate,
    pub status: Option<OccurrenceStatus>,
    pub at_time: Option<NaiveTime>,
    pub notes: Option<String>,
}

/// Filter for listing tasks. All fields combine with AND.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub project: Option<String>,
    pub tag: Option<String>,
    /// When false (the default) only pending tasks are listed unless a
    /// status filter says otherwise
    pub include_closed: bool,
}

/// Result of completing or cancelling a task
#[derive(Debug)]
pub enum CompletionResult {
    /// A one-off task whose row was updated in place
    Single(Task),
    /// One occurrence of a recurring task, recorded as an override
    Occurrence {
        task: Task,
        applied: OccurrenceOverride,
        next_occurrence: Option<NaiveDate>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_rule() -> RecurrenceRule {
        RecurrenceRule {
            id: Uuid::now_v7(),
            task_id: Uuid::now_v7(),
            frequency: Frequency::Daily,
            interval: 1,
            anchor_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            anchor_end: None,
            days_of_week: WeekdaySet::empty(),
            at_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_accepts_base_rule() {
        assert!(base_rule().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut rule = base_rule();
        rule.interval = 0;
        assert!(matches!(
            rule.validate().unwrap_err(),
            CoreError::InvalidRule(_)
        ));
    }

    #[test]
    fn test_validate_rejects_mask_on_non_weekly() {
        let mut rule = base_rule();
        rule.frequency = Frequency::Monthly;
        rule.days_of_week = WeekdaySet::single(Weekday::Mon);
        assert!(matches!(
            rule.validate().unwrap_err(),
            CoreError::InvalidRule(_)
        ));
    }

    #[test]
    fn test_validate_rejects_end_before_start() {
        let mut rule = base_rule();
        rule.anchor_end = NaiveDate::from_ymd_opt(2023, 12, 31);
        assert!(matches!(
            rule.validate().unwrap_err(),
            CoreError::InvalidRule(_)
        ));
    }

    #[test]
    fn test_weekday_set_round_trip() {
        let set: WeekdaySet = "mon,wed,fri".parse().unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains(Weekday::Mon));
        assert!(set.contains(Weekday::Wed));
        assert!(set.contains(Weekday::Fri));
        assert!(!set.contains(Weekday::Tue));
        assert_eq!(set.to_string(), "mon,wed,fri");
        assert_eq!(set.to_string().parse::<WeekdaySet>().unwrap(), set);
    }

    #[test]
    fn test_weekday_set_accepts_full_names() {
        let set: WeekdaySet = "Monday,Sunday".parse().unwrap();
        assert!(set.contains(Weekday::Mon));
        assert!(set.contains(Weekday::Sun));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_weekday_set_rejects_garbage() {
        assert!("mon,funday".parse::<WeekdaySet>().is_err());
    }

    #[test]
    fn test_weekday_groups() {
        assert_eq!(WeekdaySet::weekdays().len(), 5);
        assert_eq!(WeekdaySet::weekend().len(), 2);
        assert!(!WeekdaySet::weekdays().contains(Weekday::Sat));
        assert!(WeekdaySet::weekend().contains(Weekday::Sun));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("pending".parse::<TaskStatus>().unwrap(), TaskStatus::Pending);
        assert_eq!(
            "Completed".parse::<OccurrenceStatus>().unwrap(),
            OccurrenceStatus::Completed
        );
        assert!("done".parse::<TaskStatus>().is_err());
        assert_eq!("weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert!("fortnightly".parse::<Frequency>().is_err());
    }
}
