//! Home-screen "today" selection and progress.
//!
//! A task is shown today when any of these hold:
//! - it is recurring;
//! - it is due today;
//! - it is overdue and not completed, or was completed today;
//! - it has no due date and is not completed, or was completed today.
//!
//! Tasks due on a later day are hidden. Progress counts exactly the visible
//! tasks, so finishing something never shrinks the denominator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;

use crate::calendar::CalendarZone;
use crate::task::{Task, TaskStatus};

/// Completed/total for one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TodayProgress {
    pub day: NaiveDate,
    pub completed: u32,
    pub total: u32,
    /// `completed / total`, 0.0 when there is nothing to do
    pub ratio: f64,
}

impl TodayProgress {
    pub fn new(day: NaiveDate, completed: u32, total: u32) -> Self {
        let ratio = if total == 0 {
            0.0
        } else {
            f64::from(completed) / f64::from(total)
        };
        Self {
            day,
            completed,
            total,
            ratio,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayItem {
    pub task: Task,
    pub done: bool,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayView {
    pub items: Vec<TodayItem>,
    pub progress: TodayProgress,
}

/// Today-scoped filter over a task collection.
pub struct TodayQuery<'a> {
    today: NaiveDate,
    zone: &'a CalendarZone,
}

impl<'a> TodayQuery<'a> {
    pub fn new(today: NaiveDate, zone: &'a CalendarZone) -> Self {
        Self { today, zone }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    fn completed_today(&self, task: &Task) -> bool {
        task.completion_day(self.zone) == Some(self.today)
    }

    pub fn is_visible(&self, task: &Task) -> bool {
        if task.is_recurring {
            return true;
        }
        let open = task.status != TaskStatus::Completed;
        match task.due_date {
            Some(due) if due == self.today => true,
            Some(due) if due < self.today => open || self.completed_today(task),
            Some(_) => false,
            None => open || self.completed_today(task),
        }
    }

    /// Recurring tasks are done when today's completion is logged; one-off
    /// tasks when they are completed.
    pub fn is_done(&self, task: &Task, recurring_done_today: &HashSet<String>) -> bool {
        if task.is_recurring {
            recurring_done_today.contains(&task.id)
        } else {
            task.status == TaskStatus::Completed
        }
    }

    /// Visible tasks, open ones first, then by priority, due date and title.
    pub fn select(&self, tasks: Vec<Task>, recurring_done_today: &HashSet<String>) -> TodayView {
        let mut items: Vec<TodayItem> = tasks
            .into_iter()
            .filter(|t| self.is_visible(t))
            .map(|task| TodayItem {
                done: self.is_done(&task, recurring_done_today),
                overdue: task.is_overdue(self.today),
                task,
            })
            .collect();

        items.sort_by(|a, b| {
            let key = |i: &TodayItem| {
                (
                    i.done,
                    Reverse(i.task.priority),
                    i.task.due_date.is_none(),
                    i.task.due_date,
                )
            };
            key(a)
                .cmp(&key(b))
                .then_with(|| a.task.title.to_lowercase().cmp(&b.task.title.to_lowercase()))
        });

        let completed = items.iter().filter(|i| i.done).count() as u32;
        let progress = TodayProgress::new(self.today, completed, items.len() as u32);
        TodayView { items, progress }
    }

    pub fn progress(
        &self,
        tasks: &[Task],
        recurring_done_today: &HashSet<String>,
    ) -> TodayProgress {
        let (completed, total) = tasks
            .iter()
            .filter(|t| self.is_visible(t))
            .fold((0, 0), |(done, total), t| {
                (done + u32::from(self.is_done(t, recurring_done_today)), total + 1)
            });
        TodayProgress::new(self.today, completed, total)
    }
}
