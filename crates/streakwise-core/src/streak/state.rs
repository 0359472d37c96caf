use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::StreakResult;

/// Cached streak figures for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    pub task_id: String,
    pub current: u32,
    /// Never below `current`
    pub longest: u32,
    pub longest_start: Option<NaiveDate>,
    pub last_completed: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl StreakState {
    pub fn empty(task_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            task_id: task_id.into(),
            current: 0,
            longest: 0,
            longest_start: None,
            last_completed: None,
            updated_at: now,
        }
    }

    pub fn from_result(
        task_id: impl Into<String>,
        result: StreakResult,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            current: result.current,
            longest: result.longest.max(result.current),
            longest_start: result.longest_start,
            last_completed: result.last_completed,
            updated_at: now,
        }
    }
}
