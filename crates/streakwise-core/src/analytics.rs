//! Completion history analytics over calendar-aligned date ranges.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::calendar::WeekStart;
use crate::completion::{CompletionLog, DayCount};
use crate::error::ValidationError;
use crate::task::Task;

/// Named reporting window, always ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsRange {
    /// Start of the current week
    Week,
    /// First of the current month
    Month,
    /// January 1st of the current year
    Year,
    /// Earliest recorded completion
    All,
}

impl AnalyticsRange {
    /// Resolve to concrete inclusive bounds.
    ///
    /// `All` starts at the earliest completion and collapses to today when
    /// there is no history.
    pub fn resolve(
        self,
        today: NaiveDate,
        week_start: WeekStart,
        earliest_completion: Option<NaiveDate>,
    ) -> DateRange {
        let start = match self {
            AnalyticsRange::Week => week_start.start_of_week(today),
            AnalyticsRange::Month => today.with_day(1).unwrap_or(today),
            AnalyticsRange::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
            AnalyticsRange::All => earliest_completion
                .filter(|d| *d <= today)
                .unwrap_or(today),
        };
        DateRange { start, end: today }
    }
}

impl fmt::Display for AnalyticsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalyticsRange::Week => "week",
            AnalyticsRange::Month => "month",
            AnalyticsRange::Year => "year",
            AnalyticsRange::All => "all",
        };
        f.write_str(s)
    }
}

impl FromStr for AnalyticsRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(AnalyticsRange::Week),
            "month" => Ok(AnalyticsRange::Month),
            "year" => Ok(AnalyticsRange::Year),
            "all" => Ok(AnalyticsRange::All),
            other => Err(ValidationError::InvalidValue {
                field: "range".into(),
                message: format!("'{other}' is not week, month, year or all"),
            }),
        }
    }
}

/// Inclusive calendar-day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Number of days in the range (0 if `end < start`).
    pub fn len(&self) -> u32 {
        if self.end < self.start {
            0
        } else {
            ((self.end - self.start).num_days() + 1) as u32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Per-task figures within the report range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub title: String,
    pub completions: u32,
    /// Scheduled days in range, recurring tasks only
    pub scheduled: Option<u32>,
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub range: AnalyticsRange,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_completions: u32,
    /// Days with at least one completion
    pub active_days: u32,
    /// One entry per day in range, zero-filled
    pub daily: Vec<DayCount>,
    pub best_day: Option<DayCount>,
    /// Completed scheduled days / scheduled days over recurring tasks
    pub completion_rate: Option<f64>,
    pub tasks: Vec<TaskSummary>,
}

impl AnalyticsReport {
    /// Aggregate completed log rows for `tasks` over `span`.
    ///
    /// Rows outside the span, rows not marked completed, and rows for
    /// unknown tasks are ignored.
    pub fn build(
        range: AnalyticsRange,
        span: DateRange,
        tasks: &[Task],
        logs: &[CompletionLog],
    ) -> Self {
        let mut by_task: BTreeMap<&str, BTreeSet<NaiveDate>> = BTreeMap::new();
        for log in logs.iter().filter(|l| l.completed && span.contains(l.day)) {
            by_task.entry(log.task_id.as_str()).or_default().insert(log.day);
        }

        let mut per_day: BTreeMap<NaiveDate, u32> = BTreeMap::new();
        let mut summaries = Vec::new();
        let mut scheduled_total = 0u32;
        let mut scheduled_done = 0u32;

        for task in tasks {
            let days = by_task.get(task.id.as_str());
            let completions = days.map_or(0, |d| d.len() as u32);
            for day in days.into_iter().flatten() {
                *per_day.entry(*day).or_default() += 1;
            }

            let (scheduled, rate) = match task.schedule.filter(|_| task.is_recurring) {
                Some(schedule) => {
                    let from = span.start.max(task.start_date);
                    let scheduled = schedule.scheduled_days_between(from, span.end);
                    let done = days.map_or(0, |d| {
                        d.iter()
                            .filter(|day| **day >= from && schedule.is_scheduled(**day))
                            .count() as u32
                    });
                    scheduled_total += scheduled;
                    scheduled_done += done;
                    let rate = (scheduled > 0).then(|| f64::from(done) / f64::from(scheduled));
                    (Some(scheduled), rate)
                }
                None => (None, None),
            };

            if completions > 0 || scheduled.is_some_and(|s| s > 0) {
                summaries.push(TaskSummary {
                    task_id: task.id.clone(),
                    title: task.title.clone(),
                    completions,
                    scheduled,
                    rate,
                });
            }
        }

        let daily: Vec<DayCount> = span
            .days()
            .map(|day| DayCount {
                day,
                completions: per_day.get(&day).copied().unwrap_or(0),
            })
            .collect();

        let best_day = daily
            .iter()
            .filter(|c| c.completions > 0)
            .fold(None::<DayCount>, |best, c| match best {
                Some(b) if b.completions >= c.completions => Some(b),
                _ => Some(*c),
            });

        let completion_rate =
            (scheduled_total > 0).then(|| f64::from(scheduled_done) / f64::from(scheduled_total));

        AnalyticsReport {
            range,
            start: span.start,
            end: span.end,
            total_completions: daily.iter().map(|c| c.completions).sum(),
            active_days: daily.iter().filter(|c| c.completions > 0).count() as u32,
            daily,
            best_day,
            completion_rate,
            tasks: summaries,
        }
    }
}
