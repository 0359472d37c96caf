//! Consecutive-day streak calculation over a recurrence schedule.
//!
//! Only scheduled days matter: an unscheduled day neither extends nor breaks
//! a run. Today gets a grace period: while it is scheduled but not yet
//! completed it is treated as still open rather than missed.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::calendar::CalendarZone;
use crate::schedule::RecurrenceSchedule;

/// Configuration for streak calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Treat an uncompleted scheduled today as open instead of missed
    pub grace_today: bool,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self { grace_today: true }
    }
}

/// Output of a streak calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakResult {
    /// Consecutive scheduled days completed, ending at (grace-adjusted) today
    pub current: u32,
    /// Longest run ever observed; always >= `current`
    pub longest: u32,
    /// First day of the earliest run that reached `longest`
    pub longest_start: Option<NaiveDate>,
    /// Most recent counted completion on or before today
    pub last_completed: Option<NaiveDate>,
}

/// Streak calculator
pub struct StreakCalculator {
    config: StreakConfig,
}

impl Default for StreakCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreakCalculator {
    /// Create a new calculator with default config
    pub fn new() -> Self {
        Self {
            config: StreakConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: StreakConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StreakConfig {
        &self.config
    }

    /// Compute streaks as of the calendar day of `now` in `zone`.
    pub fn calculate_at<I>(
        &self,
        completions: I,
        schedule: &RecurrenceSchedule,
        now: DateTime<Utc>,
        zone: &CalendarZone,
    ) -> StreakResult
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.calculate(completions, schedule, zone.today(now))
    }

    /// Compute current and longest streaks as of `today`.
    ///
    /// Duplicate days collapse; days after `today` and days the schedule
    /// does not include are ignored.
    pub fn calculate<I>(
        &self,
        completions: I,
        schedule: &RecurrenceSchedule,
        today: NaiveDate,
    ) -> StreakResult
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let days: BTreeSet<NaiveDate> = completions
            .into_iter()
            .filter(|d| *d <= today && schedule.is_scheduled(*d))
            .collect();

        let (Some(&earliest), Some(&latest)) = (days.first(), days.last()) else {
            return StreakResult::default();
        };

        let current = self.current_streak(&days, schedule, today, earliest);
        let (longest, longest_start) = self.longest_streak(&days, schedule, today, earliest);

        StreakResult {
            current,
            longest: longest.max(current),
            longest_start,
            last_completed: Some(latest),
        }
    }

    /// Backward walk from the grace-adjusted today.
    fn current_streak(
        &self,
        days: &BTreeSet<NaiveDate>,
        schedule: &RecurrenceSchedule,
        today: NaiveDate,
        earliest: NaiveDate,
    ) -> u32 {
        let open_today =
            self.config.grace_today && schedule.is_scheduled(today) && !days.contains(&today);

        let mut cursor = if schedule.is_scheduled(today) && !open_today {
            Some(today)
        } else {
            schedule.previous_scheduled(today)
        };

        let mut streak = 0;
        while let Some(day) = cursor {
            if day < earliest || !days.contains(&day) {
                break;
            }
            streak += 1;
            cursor = schedule.previous_scheduled(day);
        }
        streak
    }

    /// Forward scan from the earliest completion through today.
    fn longest_streak(
        &self,
        days: &BTreeSet<NaiveDate>,
        schedule: &RecurrenceSchedule,
        today: NaiveDate,
        earliest: NaiveDate,
    ) -> (u32, Option<NaiveDate>) {
        let mut longest = 0;
        let mut longest_start = None;
        let mut run = 0;
        let mut run_start = earliest;

        let mut cursor = Some(earliest);
        while let Some(day) = cursor.filter(|d| *d <= today) {
            if schedule.is_scheduled(day) {
                if days.contains(&day) {
                    if run == 0 {
                        run_start = day;
                    }
                    run += 1;
                    if run > longest {
                        longest = run;
                        longest_start = Some(run_start);
                    }
                } else if !(day == today && self.config.grace_today) {
                    run = 0;
                }
            }
            cursor = day.checked_add_days(Days::new(1));
        }
        (longest, longest_start)
    }
}
