//! # Streakwise Core Library
//!
//! This library provides the core logic for Streakwise, a gamified task and
//! habit tracker. Every operation is available through the standalone CLI
//! binary, which is a thin layer over the [`Tracker`] service defined here.
//!
//! ## Architecture
//!
//! - **Tasks**: one-off and recurring tasks with a small status lifecycle
//! - **Schedule**: weekday masks and recurrence rules
//! - **Streaks**: consecutive-scheduled-day calculation with a grace period for today
//! - **Today**: which tasks appear on the home screen and how far the day has progressed
//! - **Analytics**: completion history over calendar-aligned ranges
//! - **Achievements**: idempotent badges evaluated after each completion
//! - **Storage**: SQLite persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`Tracker`]: Entry point coordinating storage and the engines
//! - [`StreakCalculator`]: Pure streak computation
//! - [`Database`]: Task, completion, streak and achievement persistence
//! - [`Config`]: Application configuration management

pub mod achievement;
pub mod analytics;
pub mod calendar;
pub mod completion;
pub mod error;
pub mod events;
pub mod schedule;
pub mod storage;
pub mod streak;
pub mod task;
pub mod today;
pub mod tracker;

pub use achievement::{Achievement, AchievementEvaluator, AchievementKind};
pub use analytics::{AnalyticsRange, AnalyticsReport, DateRange};
pub use calendar::{CalendarZone, WeekStart};
pub use completion::{CompletionLog, DayCount};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use schedule::{DayMask, RecurrenceSchedule};
pub use storage::{Config, Database};
pub use streak::{StreakCalculator, StreakConfig, StreakResult, StreakState};
pub use task::{
    NewTask, Task, TaskPatch, TaskPriority, TaskStatus, TaskTransitionError, TransitionAction,
};
pub use today::{TodayItem, TodayProgress, TodayQuery, TodayView};
pub use tracker::{CompletionOutcome, Tracker};
