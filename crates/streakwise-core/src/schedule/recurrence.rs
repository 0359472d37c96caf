//! Recurrence schedules: which calendar days a recurring task expects completion.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DayMask;
use crate::error::ValidationError;

/// Days on which a recurring task is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum RecurrenceSchedule {
    /// Every calendar day.
    Daily,
    /// Only the weekdays in the mask.
    Weekly(DayMask),
}

impl RecurrenceSchedule {
    /// Weekday set this schedule covers.
    pub fn mask(&self) -> DayMask {
        match self {
            RecurrenceSchedule::Daily => DayMask::EVERY_DAY,
            RecurrenceSchedule::Weekly(mask) => *mask,
        }
    }

    pub fn is_scheduled(&self, day: NaiveDate) -> bool {
        self.mask().contains(day.weekday())
    }

    /// A weekly schedule with no weekdays can never be satisfied.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.mask().is_empty() {
            return Err(ValidationError::EmptySchedule);
        }
        Ok(())
    }

    /// Nearest scheduled day strictly before `day`.
    pub fn previous_scheduled(&self, day: NaiveDate) -> Option<NaiveDate> {
        if self.mask().is_empty() {
            return None;
        }
        (1..=7)
            .filter_map(|n| day.checked_sub_days(Days::new(n)))
            .find(|d| self.is_scheduled(*d))
    }

    /// Nearest scheduled day strictly after `day`.
    pub fn next_scheduled(&self, day: NaiveDate) -> Option<NaiveDate> {
        if self.mask().is_empty() {
            return None;
        }
        (1..=7)
            .filter_map(|n| day.checked_add_days(Days::new(n)))
            .find(|d| self.is_scheduled(*d))
    }

    /// Number of scheduled days in `start..=end`; zero when the range is empty.
    pub fn scheduled_days_between(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        if end < start {
            return 0;
        }
        let span = (end - start).num_days() + 1;
        let full_weeks = (span / 7) as u32;
        let mut count = full_weeks * self.mask().len() as u32;

        let remainder = span % 7;
        let tail_start = start + chrono::Duration::days(span - remainder);
        for offset in 0..remainder {
            if self.is_scheduled(tail_start + chrono::Duration::days(offset)) {
                count += 1;
            }
        }
        count
    }
}

impl fmt::Display for RecurrenceSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceSchedule::Daily => write!(f, "daily"),
            RecurrenceSchedule::Weekly(mask) => write!(f, "weekly:{mask}"),
        }
    }
}

/// `daily`, `weekly:mon,thu`, or a bare weekday list (`mon,thu`, `weekends`).
impl FromStr for RecurrenceSchedule {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered == "daily" {
            return Ok(RecurrenceSchedule::Daily);
        }
        let days = lowered.strip_prefix("weekly:").unwrap_or(&lowered);
        let schedule = RecurrenceSchedule::Weekly(days.parse()?);
        schedule.validate()?;
        Ok(schedule)
    }
}
