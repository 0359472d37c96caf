//! Per-day completion records.
//!
//! One row per (task, calendar day). Recurring tasks get a row for every day
//! they were done; one-off tasks get a row for the day they were completed,
//! which feeds the history heatmap and analytics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionLog {
    pub task_id: String,
    pub day: NaiveDate,
    pub completed: bool,
    pub logged_at: DateTime<Utc>,
}

/// Completions on one calendar day across all tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub day: NaiveDate,
    pub completions: u32,
}
