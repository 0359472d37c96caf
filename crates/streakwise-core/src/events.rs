use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::achievement::Achievement;
use crate::task::TaskStatus;

/// Every state change in the tracker produces an Event.
/// Views subscribe to them to refresh derived figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TaskCreated {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskUpdated {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskDeleted {
        task_id: String,
        at: DateTime<Utc>,
    },
    TaskStatusChanged {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
        at: DateTime<Utc>,
    },
    /// A day was marked or unmarked in the completion log.
    DayCompletionChanged {
        task_id: String,
        day: NaiveDate,
        completed: bool,
        at: DateTime<Utc>,
    },
    StreakUpdated {
        task_id: String,
        current: u32,
        longest: u32,
        at: DateTime<Utc>,
    },
    AchievementEarned {
        achievement: Achievement,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::TaskCreated { at, .. }
            | Event::TaskUpdated { at, .. }
            | Event::TaskDeleted { at, .. }
            | Event::TaskStatusChanged { at, .. }
            | Event::DayCompletionChanged { at, .. }
            | Event::StreakUpdated { at, .. }
            | Event::AchievementEarned { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_type_tag() {
        let at = Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap();
        let event = Event::DayCompletionChanged {
            task_id: "task-1".into(),
            day: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            completed: true,
            at,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "DayCompletionChanged");
        assert_eq!(json["day"], "2024-06-10");
        assert_eq!(event.at(), at);
    }
}
