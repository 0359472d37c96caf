//! Tracker service: the single entry point the CLI (or any other front end)
//! talks to.
//!
//! Every mutation writes through to SQLite, recomputes the affected streak,
//! evaluates achievements and publishes [`Event`]s to subscribers. Callers
//! pass `now` explicitly so the whole service is deterministic under test.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::mpsc;

use crate::achievement::{Achievement, AchievementContext, AchievementEvaluator};
use crate::analytics::{AnalyticsRange, AnalyticsReport};
use crate::calendar::CalendarZone;
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::storage::{Config, Database};
use crate::streak::{StreakCalculator, StreakResult, StreakState};
use crate::task::{NewTask, Task, TaskPatch, TaskStatus, TransitionAction};
use crate::today::{TodayQuery, TodayView};

/// Result of a mutation that touched the completion log.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub task: Task,
    /// Recomputed streak, recurring tasks only
    pub streak: Option<StreakState>,
    /// Badges earned by this mutation
    pub achievements: Vec<Achievement>,
}

pub struct Tracker {
    db: Database,
    config: Config,
    zone: CalendarZone,
    calculator: StreakCalculator,
    evaluator: AchievementEvaluator,
    subscribers: Vec<mpsc::Sender<Event>>,
}

impl Tracker {
    /// # Errors
    /// Returns an error if the configured time zone is invalid.
    pub fn new(db: Database, config: Config) -> Result<Self> {
        let zone = config.zone()?;
        Ok(Self {
            calculator: StreakCalculator::with_config(config.streak_config()),
            evaluator: config.evaluator(),
            db,
            config,
            zone,
            subscribers: Vec::new(),
        })
    }

    /// Open the default database and configuration.
    pub fn open() -> Result<Self> {
        Self::new(Database::open()?, Config::load()?)
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn zone(&self) -> &CalendarZone {
        &self.zone
    }

    /// Receive every event published after this call.
    pub fn subscribe(&mut self) -> mpsc::Receiver<Event> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: Event) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // === Tasks ===

    pub fn create_task(&mut self, input: NewTask, now: DateTime<Utc>) -> Result<Task> {
        let task = Task::create(input, self.zone.today(now), now)?;
        self.db.create_task(&task)?;
        tracing::info!(task_id = %task.id, recurring = task.is_recurring, "task created");
        self.emit(Event::TaskCreated {
            task_id: task.id.clone(),
            at: now,
        });
        Ok(task)
    }

    /// # Errors
    /// Returns [`CoreError::TaskNotFound`] if no task has this id.
    pub fn get_task(&self, id: &str) -> Result<Task> {
        self.db
            .get_task(id)?
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        self.db.list_tasks()
    }

    /// Apply a patch to a task.
    ///
    /// Dropping the schedule of a recurring task turns it into a one-off and
    /// clears its completion log and streak state in the same transaction.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch, now: DateTime<Utc>) -> Result<Task> {
        let mut task = self.get_task(id)?;
        if patch.is_empty() {
            return Ok(task);
        }
        let was_recurring = task.is_recurring;
        let reschedules = patch.schedule.is_some() || patch.start_date.is_some();
        task.apply_patch(patch, now)?;
        let clears_history = was_recurring && !task.is_recurring;

        let cleared = self.db.transaction(|db| {
            if !db.update_task(&task)? {
                return Err(CoreError::TaskNotFound(id.to_string()));
            }
            if clears_history {
                db.clear_history(id)
            } else {
                Ok(Vec::new())
            }
        })?;

        tracing::info!(task_id = %task.id, cleared = cleared.len(), "task updated");
        self.emit(Event::TaskUpdated {
            task_id: task.id.clone(),
            at: now,
        });
        for day in cleared {
            self.emit(Event::DayCompletionChanged {
                task_id: task.id.clone(),
                day,
                completed: false,
                at: now,
            });
        }
        if reschedules {
            self.refresh_streak(&task, now)?;
        }
        Ok(task)
    }

    /// Delete a task with its completion logs and streak state. Earned
    /// achievements are kept.
    pub fn delete_task(&mut self, id: &str, now: DateTime<Utc>) -> Result<()> {
        if !self.db.delete_task(id)? {
            return Err(CoreError::TaskNotFound(id.to_string()));
        }
        tracing::info!(task_id = id, "task deleted");
        self.emit(Event::TaskDeleted {
            task_id: id.to_string(),
            at: now,
        });
        Ok(())
    }

    /// Run a lifecycle action.
    ///
    /// `Complete` logs today; `Reopen` removes the log rows of a one-off
    /// task, whichever day they were written under.
    ///
    /// # Errors
    /// `Complete` is rejected before the task's start date.
    pub fn apply_action(
        &mut self,
        id: &str,
        action: TransitionAction,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        let mut task = self.get_task(id)?;
        let previous = task.apply_action(action, now)?;
        let today = self.zone.today(now);
        if action == TransitionAction::Complete {
            self.check_loggable(&task, today, today)?;
        }

        let mut removed = self.db.transaction(|db| {
            if !db.update_task(&task)? {
                return Err(CoreError::TaskNotFound(id.to_string()));
            }
            match action {
                TransitionAction::Complete => {
                    db.set_completion(id, today, true, now)?;
                    Ok(Vec::new())
                }
                TransitionAction::Reopen if !task.is_recurring => db.clear_history(id),
                _ => Ok(Vec::new()),
            }
        })?;

        tracing::info!(
            task_id = id,
            %action,
            from = %previous,
            to = %task.status,
            "task action applied"
        );
        if previous != task.status {
            self.emit(Event::TaskStatusChanged {
                task_id: id.to_string(),
                from: previous,
                to: task.status,
                at: now,
            });
        }

        let log_change = match action {
            TransitionAction::Complete => Some((today, true)),
            _ => removed.pop().map(|day| (day, false)),
        };
        for day in removed {
            self.emit(Event::DayCompletionChanged {
                task_id: id.to_string(),
                day,
                completed: false,
                at: now,
            });
        }
        match log_change {
            Some((day, completed)) => self.after_completion_change(task, day, completed, now),
            None => Ok(CompletionOutcome {
                task,
                streak: None,
                achievements: Vec::new(),
            }),
        }
    }

    // === Completion log ===

    /// Mark or unmark `day` for a task.
    ///
    /// One-off tasks have a single completion day: marking a day completes
    /// the task on that day (moving an earlier completion), unmarking its
    /// completion day reopens it.
    ///
    /// # Errors
    /// Rejects days after today and days before the task's start date.
    pub fn set_day_completed(
        &mut self,
        id: &str,
        day: NaiveDate,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        let mut task = self.get_task(id)?;
        let today = self.zone.today(now);
        if completed {
            self.check_loggable(&task, day, today)?;
        }

        let previous = task.status;
        let mut removed_day = None;
        if !task.is_recurring {
            let completed_on = task.completion_day(&self.zone);
            if completed {
                if completed_on != Some(day) {
                    removed_day = completed_on;
                    task.status = TaskStatus::Completed;
                    task.completed_at = Some(self.zone.with_day(now, day));
                    task.updated_at = now;
                }
            } else if completed_on == Some(day) {
                task.status = TaskStatus::Todo;
                task.completed_at = None;
                task.updated_at = now;
            }
        }

        self.db.transaction(|db| {
            if !db.update_task(&task)? {
                return Err(CoreError::TaskNotFound(id.to_string()));
            }
            if let Some(old) = removed_day {
                db.remove_completion(id, old)?;
            }
            if completed {
                db.set_completion(id, day, true, now)?;
            } else {
                db.remove_completion(id, day)?;
            }
            Ok(())
        })?;

        tracing::info!(task_id = id, %day, completed, "day completion set");
        if previous != task.status {
            self.emit(Event::TaskStatusChanged {
                task_id: id.to_string(),
                from: previous,
                to: task.status,
                at: now,
            });
        }
        if let Some(old) = removed_day {
            self.emit(Event::DayCompletionChanged {
                task_id: id.to_string(),
                day: old,
                completed: false,
                at: now,
            });
        }
        self.after_completion_change(task, day, completed, now)
    }

    /// Move a logged completion from `from` to `to`.
    ///
    /// # Errors
    /// `to` must not be after today nor before the task's start date, and
    /// `from` must hold a completion.
    pub fn edit_completion_day(
        &mut self,
        id: &str,
        from: NaiveDate,
        to: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        let mut task = self.get_task(id)?;
        let today = self.zone.today(now);
        self.check_loggable(&task, to, today)?;
        if !self.db.is_completed_on(id, from)? {
            return Err(ValidationError::NoCompletionOn(from).into());
        }
        if from == to {
            let streak = self.refresh_streak(&task, now)?;
            return Ok(CompletionOutcome {
                task,
                streak,
                achievements: Vec::new(),
            });
        }

        if let Some(at) = task.completed_at.filter(|_| !task.is_recurring) {
            task.completed_at = Some(self.zone.with_day(at, to));
            task.updated_at = now;
        }

        self.db.transaction(|db| {
            if !db.update_task(&task)? {
                return Err(CoreError::TaskNotFound(id.to_string()));
            }
            db.remove_completion(id, from)?;
            db.set_completion(id, to, true, now)?;
            Ok(())
        })?;

        tracing::info!(task_id = id, %from, %to, "completion moved");
        self.emit(Event::DayCompletionChanged {
            task_id: id.to_string(),
            day: from,
            completed: false,
            at: now,
        });
        self.after_completion_change(task, to, true, now)
    }

    /// Completed days for one task, ascending.
    pub fn completion_days(&self, id: &str) -> Result<Vec<NaiveDate>> {
        self.get_task(id)?;
        self.db.completion_days(id)
    }

    fn check_loggable(&self, task: &Task, day: NaiveDate, today: NaiveDate) -> Result<()> {
        if day > today {
            return Err(ValidationError::FutureCompletion(day).into());
        }
        if day < task.start_date {
            return Err(ValidationError::CompletionBeforeStart {
                day,
                start: task.start_date,
            }
            .into());
        }
        Ok(())
    }

    fn after_completion_change(
        &mut self,
        task: Task,
        day: NaiveDate,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<CompletionOutcome> {
        self.emit(Event::DayCompletionChanged {
            task_id: task.id.clone(),
            day,
            completed,
            at: now,
        });
        let streak = self.refresh_streak(&task, now)?;
        let achievements = self.evaluate_achievements(&task, streak.as_ref(), now)?;
        Ok(CompletionOutcome {
            task,
            streak,
            achievements,
        })
    }

    // === Streaks ===

    /// Recompute and persist the streak of a recurring task.
    fn refresh_streak(&mut self, task: &Task, now: DateTime<Utc>) -> Result<Option<StreakState>> {
        let Some(schedule) = task.schedule.filter(|_| task.is_recurring) else {
            return Ok(None);
        };
        let days = self.db.completion_days(&task.id)?;
        let result = self.calculator.calculate_at(days, &schedule, now, &self.zone);
        let state = StreakState::from_result(&task.id, result, now);
        self.db.save_streak_state(&state)?;
        tracing::debug!(
            task_id = %task.id,
            current = state.current,
            longest = state.longest,
            "streak updated"
        );
        self.emit(Event::StreakUpdated {
            task_id: task.id.clone(),
            current: state.current,
            longest: state.longest,
            at: now,
        });
        Ok(Some(state))
    }

    /// Current streak of a recurring task, recomputed as of `now`.
    ///
    /// # Errors
    /// One-off tasks have no streak.
    pub fn streak(&mut self, id: &str, now: DateTime<Utc>) -> Result<StreakState> {
        let task = self.get_task(id)?;
        self.refresh_streak(&task, now)?.ok_or_else(|| {
            ValidationError::InvalidValue {
                field: "task".into(),
                message: format!("{id} is not a recurring task"),
            }
            .into()
        })
    }

    /// Streaks of every recurring task, recomputed as of `now`.
    pub fn streaks(&mut self, now: DateTime<Utc>) -> Result<Vec<StreakState>> {
        let tasks = self.db.list_tasks()?;
        let mut states = Vec::new();
        for task in tasks.iter().filter(|t| t.is_recurring) {
            if let Some(state) = self.refresh_streak(task, now)? {
                states.push(state);
            }
        }
        states.sort_by(|a, b| b.current.cmp(&a.current).then(b.longest.cmp(&a.longest)));
        Ok(states)
    }

    // === Views ===

    pub fn today(&self, now: DateTime<Utc>) -> Result<TodayView> {
        let today = self.zone.today(now);
        let done = self.db.recurring_done_on(today)?;
        let tasks = self.db.list_tasks()?;
        Ok(TodayQuery::new(today, &self.zone).select(tasks, &done))
    }

    pub fn analytics(&self, range: AnalyticsRange, now: DateTime<Utc>) -> Result<AnalyticsReport> {
        let today = self.zone.today(now);
        let span = range.resolve(
            today,
            self.config.calendar.week_start,
            self.db.earliest_completion()?,
        );
        let logs = self.db.completions_between(span.start, span.end)?;
        let tasks = self.db.list_tasks()?;
        Ok(AnalyticsReport::build(range, span, &tasks, &logs))
    }

    pub fn achievements(&self) -> Result<Vec<Achievement>> {
        self.db.list_achievements()
    }

    fn evaluate_achievements(
        &mut self,
        task: &Task,
        streak: Option<&StreakState>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Achievement>> {
        if !self.config.achievements.enabled {
            return Ok(Vec::new());
        }

        let today = self.zone.today(now);
        let done = self.db.recurring_done_on(today)?;
        let tasks = self.db.list_tasks()?;
        let progress = TodayQuery::new(today, &self.zone).progress(&tasks, &done);
        let ctx = AchievementContext {
            task_id: &task.id,
            streak: streak.map(|s| StreakResult {
                current: s.current,
                longest: s.longest,
                longest_start: s.longest_start,
                last_completed: s.last_completed,
            }),
            total_completions: self.db.total_completions()?,
            today,
            today_total: progress.total,
            today_completed: progress.completed,
        };

        let mut earned = Vec::new();
        for achievement in self.evaluator.evaluate(&ctx, now) {
            if self.db.insert_achievement(&achievement)? {
                tracing::info!(
                    kind = %achievement.kind,
                    period = %achievement.period,
                    "achievement earned"
                );
                earned.push(achievement);
            }
        }
        for achievement in &earned {
            self.emit(Event::AchievementEarned {
                achievement: achievement.clone(),
                at: now,
            });
        }
        Ok(earned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievement::AchievementKind;
    use crate::schedule::RecurrenceSchedule;
    use chrono::{Days, TimeZone};

    fn utc_config() -> Config {
        let mut config = Config::default();
        config.set("calendar.time_zone", "utc").unwrap();
        config
    }

    fn tracker() -> Tracker {
        Tracker::new(Database::open_memory().unwrap(), utc_config()).unwrap()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn habit(t: &mut Tracker) -> Task {
        t.create_task(
            NewTask::new("Stretch")
                .recurring(RecurrenceSchedule::Daily)
                .starting(d(1)),
            at(1),
        )
        .unwrap()
    }

    #[test]
    fn completing_recurring_task_logs_today_and_stays_open() {
        let mut t = tracker();
        let task = habit(&mut t);

        let outcome = t.apply_action(&task.id, TransitionAction::Complete, at(3)).unwrap();
        assert_eq!(outcome.task.status, TaskStatus::Todo);
        assert_eq!(outcome.streak.unwrap().current, 1);
        assert_eq!(t.completion_days(&task.id).unwrap(), vec![d(3)]);
        assert!(outcome
            .achievements
            .iter()
            .any(|a| a.kind == AchievementKind::FirstCompletion));
    }

    #[test]
    fn one_off_complete_and_reopen_round_trip_the_log() {
        let mut t = tracker();
        let task = t.create_task(NewTask::new("Call bank"), at(1)).unwrap();

        t.apply_action(&task.id, TransitionAction::Complete, at(2)).unwrap();
        assert_eq!(t.completion_days(&task.id).unwrap(), vec![d(2)]);

        let outcome = t.apply_action(&task.id, TransitionAction::Reopen, at(4)).unwrap();
        assert_eq!(outcome.task.status, TaskStatus::Todo);
        assert!(outcome.task.completed_at.is_none());
        assert!(t.completion_days(&task.id).unwrap().is_empty());
    }

    #[test]
    fn rejects_future_and_pre_start_days() {
        let mut t = tracker();
        let task = habit(&mut t);
        let future = t.set_day_completed(&task.id, d(6), true, at(5));
        assert!(matches!(
            future,
            Err(CoreError::Validation(ValidationError::FutureCompletion(_)))
        ));
        let may_31 = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let early = t.set_day_completed(&task.id, may_31, true, at(5));
        assert!(matches!(
            early,
            Err(CoreError::Validation(ValidationError::CompletionBeforeStart { .. }))
        ));
    }

    #[test]
    fn completing_before_start_date_is_rejected() {
        let mut t = tracker();
        let task = t
            .create_task(
                NewTask::new("Swim")
                    .recurring(RecurrenceSchedule::Daily)
                    .starting(d(10)),
                at(1),
            )
            .unwrap();

        let early = t.apply_action(&task.id, TransitionAction::Complete, at(5));
        assert!(matches!(
            early,
            Err(CoreError::Validation(ValidationError::CompletionBeforeStart { .. }))
        ));
        assert!(t.completion_days(&task.id).unwrap().is_empty());
        assert!(t.db().get_streak_state(&task.id).unwrap().is_none());
    }

    #[test]
    fn dropping_the_schedule_clears_history() {
        let mut t = tracker();
        let task = habit(&mut t);
        for day in 1..=3 {
            t.set_day_completed(&task.id, d(day), true, at(4)).unwrap();
        }
        assert_eq!(t.db().get_streak_state(&task.id).unwrap().unwrap().current, 3);

        let rx = t.subscribe();
        let once = TaskPatch {
            schedule: Some(None),
            ..Default::default()
        };
        let updated = t.update_task(&task.id, once, at(4)).unwrap();
        assert!(!updated.is_recurring);
        assert!(t.completion_days(&task.id).unwrap().is_empty());
        assert!(t.db().get_streak_state(&task.id).unwrap().is_none());
        let unlogged = rx
            .try_iter()
            .filter(|e| matches!(e, Event::DayCompletionChanged { completed: false, .. }))
            .count();
        assert_eq!(unlogged, 3);

        t.apply_action(&task.id, TransitionAction::Complete, at(4)).unwrap();
        assert_eq!(t.completion_days(&task.id).unwrap(), vec![d(4)]);
        t.apply_action(&task.id, TransitionAction::Reopen, at(4)).unwrap();
        assert!(t.completion_days(&task.id).unwrap().is_empty());
    }

    #[test]
    fn reopen_after_time_zone_change_removes_the_logged_day() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streakwise.db");
        let late = Utc.with_ymd_and_hms(2024, 6, 10, 20, 0, 0).unwrap();

        let task_id = {
            let mut t = Tracker::new(Database::open_at(&path).unwrap(), utc_config()).unwrap();
            let task = t.create_task(NewTask::new("Pay bills"), at(1)).unwrap();
            t.apply_action(&task.id, TransitionAction::Complete, late).unwrap();
            assert_eq!(t.completion_days(&task.id).unwrap(), vec![d(10)]);
            task.id
        };

        // 20:00 UTC on the 10th is already the 11th at +09:00
        let mut config = Config::default();
        config.set("calendar.time_zone", "+09:00").unwrap();
        let mut t = Tracker::new(Database::open_at(&path).unwrap(), config).unwrap();
        assert_eq!(t.get_task(&task_id).unwrap().completion_day(t.zone()), Some(d(11)));

        let outcome = t.apply_action(&task_id, TransitionAction::Reopen, at(12)).unwrap();
        assert_eq!(outcome.task.status, TaskStatus::Todo);
        assert!(t.completion_days(&task_id).unwrap().is_empty());
    }

    #[test]
    fn backfilled_days_build_a_streak() {
        let mut t = tracker();
        let task = habit(&mut t);
        for day in 1..=7 {
            t.set_day_completed(&task.id, d(day), true, at(8)).unwrap();
        }
        let streak = t.streak(&task.id, at(8)).unwrap();
        assert_eq!(streak.current, 7);
        assert_eq!(streak.longest, 7);
        assert_eq!(streak.longest_start, Some(d(1)));

        let badges: Vec<_> = t
            .achievements()
            .unwrap()
            .into_iter()
            .filter(|a| a.kind == AchievementKind::StreakMilestone)
            .map(|a| a.period)
            .collect();
        assert_eq!(badges, vec!["3", "7"]);
    }

    #[test]
    fn unmarking_breaks_the_streak() {
        let mut t = tracker();
        let task = habit(&mut t);
        for day in 1..=4 {
            t.set_day_completed(&task.id, d(day), true, at(4)).unwrap();
        }
        let outcome = t.set_day_completed(&task.id, d(3), false, at(4)).unwrap();
        let streak = outcome.streak.unwrap();
        assert_eq!(streak.current, 1);
        assert_eq!(streak.longest, 2);
    }

    #[test]
    fn edit_completion_day_moves_the_log() {
        let mut t = tracker();
        let task = t.create_task(NewTask::new("Taxes"), at(1)).unwrap();
        t.apply_action(&task.id, TransitionAction::Complete, at(5)).unwrap();

        let outcome = t.edit_completion_day(&task.id, d(5), d(3), at(5)).unwrap();
        assert_eq!(outcome.task.completion_day(t.zone()), Some(d(3)));
        assert_eq!(t.completion_days(&task.id).unwrap(), vec![d(3)]);

        let missing = t.edit_completion_day(&task.id, d(5), d(4), at(5));
        assert!(matches!(
            missing,
            Err(CoreError::Validation(ValidationError::NoCompletionOn(_)))
        ));
    }

    #[test]
    fn marking_another_day_moves_a_one_off_completion() {
        let mut t = tracker();
        let task = t.create_task(NewTask::new("Renew passport"), at(1)).unwrap();
        t.set_day_completed(&task.id, d(2), true, at(5)).unwrap();
        let outcome = t.set_day_completed(&task.id, d(4), true, at(5)).unwrap();
        assert_eq!(outcome.task.completion_day(t.zone()), Some(d(4)));
        assert_eq!(t.completion_days(&task.id).unwrap(), vec![d(4)]);
    }

    #[test]
    fn today_view_and_perfect_day() {
        let mut t = tracker();
        let task = habit(&mut t);
        let chore = t.create_task(NewTask::new("Dishes").due(d(10)), at(1)).unwrap();

        let view = t.today(at(10)).unwrap();
        assert_eq!(view.progress.total, 2);
        assert_eq!(view.progress.completed, 0);

        t.apply_action(&task.id, TransitionAction::Complete, at(10)).unwrap();
        let outcome = t.apply_action(&chore.id, TransitionAction::Complete, at(10)).unwrap();
        assert!(outcome
            .achievements
            .iter()
            .any(|a| a.kind == AchievementKind::PerfectDay && a.period == "2024-06-10"));
        let view = t.today(at(10)).unwrap();
        assert_eq!(view.progress.completed, 2);
    }

    #[test]
    fn subscribers_receive_events_and_dropped_ones_are_pruned() {
        let mut t = tracker();
        let rx = t.subscribe();
        let dropped = t.subscribe();
        drop(dropped);

        let task = habit(&mut t);
        t.apply_action(&task.id, TransitionAction::Complete, at(2)).unwrap();
        assert_eq!(t.subscribers.len(), 1);

        let events: Vec<Event> = rx.try_iter().collect();
        assert!(matches!(events[0], Event::TaskCreated { .. }));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::DayCompletionChanged { completed: true, .. })));
        assert!(events.iter().any(|e| matches!(e, Event::StreakUpdated { current: 1, .. })));
    }

    #[test]
    fn missing_tasks_are_reported() {
        let mut t = tracker();
        assert!(matches!(t.get_task("nope"), Err(CoreError::TaskNotFound(_))));
        assert!(matches!(
            t.delete_task("nope", at(1)),
            Err(CoreError::TaskNotFound(_))
        ));
        assert!(matches!(
            t.apply_action("nope", TransitionAction::Start, at(1)),
            Err(CoreError::TaskNotFound(_))
        ));
    }

    #[test]
    fn analytics_counts_range() {
        let mut t = tracker();
        let task = habit(&mut t);
        let now = at(1).checked_add_days(Days::new(9)).unwrap();
        for day in [3, 4, 10] {
            t.set_day_completed(&task.id, d(day), true, now).unwrap();
        }
        let report = t.analytics(AnalyticsRange::Month, now).unwrap();
        assert_eq!(report.total_completions, 3);
        assert_eq!(report.daily.len(), 10);
        assert_eq!(report.completion_rate, Some(0.3));
    }

    #[test]
    fn achievements_can_be_disabled() {
        let mut config = Config::default();
        config.set("calendar.time_zone", "utc").unwrap();
        config.set("achievements.enabled", "false").unwrap();
        let mut t = Tracker::new(Database::open_memory().unwrap(), config).unwrap();
        let task = habit(&mut t);
        let outcome = t.apply_action(&task.id, TransitionAction::Complete, at(2)).unwrap();
        assert!(outcome.achievements.is_empty());
        assert!(t.achievements().unwrap().is_empty());
    }
}
