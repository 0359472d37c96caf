//! Task model and status lifecycle.
//!
//! Status transitions are driven by [`TransitionAction`]:
//!
//!   TODO ──start──> IN_PROGRESS ──complete──> COMPLETED
//!    ^  <──pause──                                │
//!    │                                            │
//!    +──────────────────reopen────────────────────+
//!
//! Valid transitions:
//! - TODO → IN_PROGRESS (start)
//! - IN_PROGRESS → TODO (pause)
//! - TODO | IN_PROGRESS → COMPLETED (complete)
//! - COMPLETED → TODO (reopen)
//!
//! Recurring tasks never rest in COMPLETED: completing one records the day in
//! the completion log and returns the task to TODO for the next occurrence.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::CalendarZone;
use crate::error::ValidationError;
use crate::schedule::RecurrenceSchedule;

/// Task status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    /// Actions that may be applied from this status.
    pub fn available_actions(&self) -> &'static [TransitionAction] {
        match self {
            TaskStatus::Todo => &[TransitionAction::Start, TransitionAction::Complete],
            TaskStatus::InProgress => &[TransitionAction::Complete, TransitionAction::Pause],
            TaskStatus::Completed => &[TransitionAction::Reopen],
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority used to order the today list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" | "normal" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                message: format!("'{other}' is not low, medium or high"),
            }),
        }
    }
}

/// A one-off or recurring task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Optional deadline (calendar day)
    pub due_date: Option<NaiveDate>,
    /// First day the task exists for streak and analytics purposes
    pub start_date: NaiveDate,
    pub is_recurring: bool,
    /// Present iff `is_recurring`
    pub schedule: Option<RecurrenceSchedule>,
    /// Set iff `status == Completed`
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User input for creating a task.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    /// Defaults to the creation day
    pub start_date: Option<NaiveDate>,
    /// `Some` makes the task recurring
    pub schedule: Option<RecurrenceSchedule>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn recurring(mut self, schedule: RecurrenceSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn due(mut self, day: NaiveDate) -> Self {
        self.due_date = Some(day);
        self
    }

    pub fn starting(mut self, day: NaiveDate) -> Self {
        self.start_date = Some(day);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }
}

/// Partial update. Outer `None` leaves a field untouched; for nullable
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub start_date: Option<NaiveDate>,
    pub schedule: Option<Option<RecurrenceSchedule>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.start_date.is_none()
            && self.schedule.is_none()
    }
}

impl Task {
    /// Build and validate a task from user input.
    pub fn create(
        input: NewTask,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let task = Task {
            id: format!("task-{}", uuid::Uuid::new_v4()),
            title: input.title.trim().to_string(),
            description: input.description.filter(|d| !d.trim().is_empty()),
            status: TaskStatus::Todo,
            priority: input.priority,
            due_date: input.due_date,
            start_date: input.start_date.unwrap_or(today),
            is_recurring: input.schedule.is_some(),
            schedule: input.schedule,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        task.validate()?;
        Ok(task)
    }

    /// Check field-level invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        match (self.is_recurring, &self.schedule) {
            (true, Some(schedule)) => schedule.validate()?,
            (false, None) => {}
            _ => return Err(ValidationError::ScheduleMismatch),
        }
        if let Some(due) = self.due_date {
            if due < self.start_date {
                return Err(ValidationError::DueBeforeStart {
                    due,
                    start: self.start_date,
                });
            }
        }
        if (self.status == TaskStatus::Completed) != self.completed_at.is_some() {
            return Err(ValidationError::InvalidValue {
                field: "completed_at".into(),
                message: "must be set exactly when the task is completed".into(),
            });
        }
        Ok(())
    }

    /// Apply a patch and re-validate. The task is left untouched on error.
    pub fn apply_patch(
        &mut self,
        patch: TaskPatch,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let mut next = self.clone();
        if let Some(title) = patch.title {
            next.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            next.description = description.filter(|d| !d.trim().is_empty());
        }
        if let Some(priority) = patch.priority {
            next.priority = priority;
        }
        if let Some(due) = patch.due_date {
            next.due_date = due;
        }
        if let Some(start) = patch.start_date {
            next.start_date = start;
        }
        if let Some(schedule) = patch.schedule {
            next.is_recurring = schedule.is_some();
            next.schedule = schedule;
            // recurring tasks cannot rest in Completed
            if next.is_recurring && next.status == TaskStatus::Completed {
                next.status = TaskStatus::Todo;
                next.completed_at = None;
            }
        }
        next.validate()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    /// Apply a lifecycle action.
    ///
    /// For recurring tasks `Complete` returns the task to `Todo`; the caller
    /// records the day in the completion log.
    pub fn apply_action(
        &mut self,
        action: TransitionAction,
        now: DateTime<Utc>,
    ) -> Result<TaskStatus, TaskTransitionError> {
        if !self.status.available_actions().contains(&action) {
            return Err(TaskTransitionError {
                from: self.status,
                action,
            });
        }

        let previous = self.status;
        match action {
            TransitionAction::Start => {
                self.status = TaskStatus::InProgress;
            }
            TransitionAction::Pause => {
                self.status = TaskStatus::Todo;
            }
            TransitionAction::Complete if self.is_recurring => {
                self.status = TaskStatus::Todo;
                self.completed_at = None;
            }
            TransitionAction::Complete => {
                self.status = TaskStatus::Completed;
                self.completed_at = Some(now);
            }
            TransitionAction::Reopen => {
                self.status = TaskStatus::Todo;
                self.completed_at = None;
            }
        }
        self.updated_at = now;
        Ok(previous)
    }

    /// Calendar day of completion, for one-off completed tasks.
    pub fn completion_day(&self, zone: &CalendarZone) -> Option<NaiveDate> {
        self.completed_at.map(|at| zone.day_of(at))
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Completed && self.due_date.is_some_and(|due| due < today)
    }
}

/// User-facing lifecycle operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransitionAction {
    Start,
    Pause,
    Complete,
    Reopen,
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionAction::Start => write!(f, "start"),
            TransitionAction::Pause => write!(f, "pause"),
            TransitionAction::Complete => write!(f, "complete"),
            TransitionAction::Reopen => write!(f, "reopen"),
        }
    }
}

/// Error returned when an action is not allowed from the current status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("Cannot {action} a task that is {from}")]
pub struct TaskTransitionError {
    pub from: TaskStatus,
    pub action: TransitionAction,
}
