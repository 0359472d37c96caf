//! Calendar helpers: which day "today" is, and where weeks start.
//!
//! Instants are stored in UTC; everything day-based (streaks, today's list,
//! analytics) works on the calendar day of that instant in the user's zone.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Time zone used to turn instants into calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarZone {
    /// The system's local zone.
    #[default]
    Local,
    /// A fixed UTC offset such as `+09:00`.
    Fixed(FixedOffset),
}

impl CalendarZone {
    /// Calendar day containing `instant`.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            CalendarZone::Local => instant.with_timezone(&Local).date_naive(),
            CalendarZone::Fixed(offset) => instant.with_timezone(offset).date_naive(),
        }
    }

    /// Same as [`day_of`](Self::day_of); reads better at call sites that pass `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.day_of(now)
    }

    /// Move `instant` onto `day`, keeping its local time of day.
    ///
    /// Falls back to noon UTC when the wall-clock time does not exist on
    /// the target day (DST gaps).
    pub fn with_day(&self, instant: DateTime<Utc>, day: NaiveDate) -> DateTime<Utc> {
        let time = match self {
            CalendarZone::Local => instant.with_timezone(&Local).time(),
            CalendarZone::Fixed(offset) => instant.with_timezone(offset).time(),
        };
        let naive = day.and_time(time);
        let resolved = match self {
            CalendarZone::Local => naive
                .and_local_timezone(Local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            CalendarZone::Fixed(offset) => naive
                .and_local_timezone(*offset)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        };
        resolved.unwrap_or_else(|| {
            tracing::warn!(%day, "local time does not exist on target day, using noon UTC");
            day.and_hms_opt(12, 0, 0)
                .map(|n| n.and_utc())
                .unwrap_or(instant)
        })
    }
}

impl fmt::Display for CalendarZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarZone::Local => write!(f, "local"),
            CalendarZone::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

/// `local`, `utc`/`z`, or an offset in `±HH:MM` form.
impl FromStr for CalendarZone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("local") || s.is_empty() {
            return Ok(CalendarZone::Local);
        }
        if s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("z") {
            return Ok(CalendarZone::Fixed(Utc.fix()));
        }
        FixedOffset::from_str(s)
            .map(CalendarZone::Fixed)
            .map_err(|e| ValidationError::InvalidValue {
                field: "time_zone".into(),
                message: format!("'{s}' is not 'local' or a ±HH:MM offset ({e})"),
            })
    }
}

/// First day of the week for week-aligned ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    /// First day of the week containing `day`.
    pub fn start_of_week(self, day: NaiveDate) -> NaiveDate {
        let back = match self {
            WeekStart::Monday => day.weekday().num_days_from_monday(),
            WeekStart::Sunday => day.weekday().num_days_from_sunday(),
        };
        day - chrono::Duration::days(i64::from(back))
    }
}
