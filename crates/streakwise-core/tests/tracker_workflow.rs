//! Integration tests for the tracker service against an on-disk database.
//!
//! Covers the full loop from task creation through daily completions to
//! streaks, today's progress, analytics and achievements, and checks that
//! everything survives reopening the database.

use chrono::{DateTime, NaiveDate, TimeZone, Utc, Weekday};
use streakwise_core::{
    AchievementKind, AnalyticsRange, Config, CoreError, Database, DayMask, Event, NewTask,
    RecurrenceSchedule, TaskPatch, TaskStatus, Tracker, TransitionAction,
};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn utc_config() -> Config {
    let mut config = Config::default();
    config.set("calendar.time_zone", "+00:00").unwrap();
    config
}

#[test]
fn test_full_habit_workflow_persists() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("streakwise.db");

    let habit_id;
    {
        let mut tracker = Tracker::new(Database::open_at(&db_path).unwrap(), utc_config()).unwrap();
        // Mon/Wed/Fri, starting Monday 3 June
        let habit = tracker
            .create_task(
                NewTask::new("Run")
                    .starting(d(3))
                    .recurring(RecurrenceSchedule::Weekly(DayMask::from_weekdays([
                        Weekday::Mon,
                        Weekday::Wed,
                        Weekday::Fri,
                    ]))),
                at(3, 7),
            )
            .unwrap();
        habit_id = habit.id.clone();

        for day in [3, 5, 7] {
            tracker
                .apply_action(&habit.id, TransitionAction::Complete, at(day, 18))
                .unwrap();
        }

        // Saturday and Sunday are unscheduled: the streak survives the weekend
        let streak = tracker.streak(&habit.id, at(9, 20)).unwrap();
        assert_eq!(streak.current, 3);
        assert_eq!(streak.last_completed, Some(d(7)));

        // Monday morning, not yet done: grace keeps the streak alive
        let streak = tracker.streak(&habit.id, at(10, 8)).unwrap();
        assert_eq!(streak.current, 3);
    }

    let mut tracker = Tracker::new(Database::open_at(&db_path).unwrap(), utc_config()).unwrap();
    let stored = tracker.db().get_streak_state(&habit_id).unwrap().unwrap();
    assert_eq!(stored.longest, 3);

    // Tuesday: Monday was missed
    let streak = tracker.streak(&habit_id, at(11, 8)).unwrap();
    assert_eq!(streak.current, 0);
    assert_eq!(streak.longest, 3);
    assert_eq!(streak.longest_start, Some(d(3)));

    let kinds: Vec<_> = tracker
        .achievements()
        .unwrap()
        .into_iter()
        .map(|a| (a.kind, a.period))
        .collect();
    assert!(kinds.contains(&(AchievementKind::FirstCompletion, "all".to_string())));
    assert!(kinds.contains(&(AchievementKind::StreakMilestone, "3".to_string())));
}

#[test]
fn test_today_progress_across_task_kinds() {
    let mut tracker = Tracker::new(Database::open_memory().unwrap(), utc_config()).unwrap();

    let habit = tracker
        .create_task(NewTask::new("Meditate").recurring(RecurrenceSchedule::Daily), at(1, 8))
        .unwrap();
    let overdue = tracker
        .create_task(NewTask::new("Pay rent").due(d(5)), at(1, 8))
        .unwrap();
    let later = tracker
        .create_task(NewTask::new("Book flights").due(d(20)), at(1, 8))
        .unwrap();
    let undated = tracker.create_task(NewTask::new("Clean desk"), at(1, 8)).unwrap();

    let view = tracker.today(at(10, 9)).unwrap();
    let ids: Vec<_> = view.items.iter().map(|i| i.task.id.clone()).collect();
    assert!(ids.contains(&habit.id));
    assert!(ids.contains(&overdue.id));
    assert!(ids.contains(&undated.id));
    assert!(!ids.contains(&later.id));
    assert_eq!(view.progress.total, 3);

    tracker
        .apply_action(&overdue.id, TransitionAction::Complete, at(10, 10))
        .unwrap();
    tracker
        .apply_action(&habit.id, TransitionAction::Complete, at(10, 11))
        .unwrap();

    let view = tracker.today(at(10, 12)).unwrap();
    assert_eq!(view.progress.total, 3);
    assert_eq!(view.progress.completed, 2);
    assert!(view.items.iter().any(|i| i.task.id == overdue.id && i.done));

    // Next day the habit is open again and the finished chore is gone
    let view = tracker.today(at(11, 9)).unwrap();
    assert_eq!(view.progress.total, 2);
    assert_eq!(view.progress.completed, 0);
}

#[test]
fn test_lifecycle_errors_and_patches() {
    let mut tracker = Tracker::new(Database::open_memory().unwrap(), utc_config()).unwrap();
    let task = tracker.create_task(NewTask::new("Draft essay"), at(1, 8)).unwrap();

    let err = tracker
        .apply_action(&task.id, TransitionAction::Reopen, at(1, 9))
        .unwrap_err();
    assert!(matches!(err, CoreError::Transition(_)));
    assert!(err.to_string().contains("TODO"));

    tracker
        .apply_action(&task.id, TransitionAction::Start, at(1, 9))
        .unwrap();
    let patched = tracker
        .update_task(
            &task.id,
            TaskPatch {
                title: Some("Draft the essay".into()),
                due_date: Some(Some(d(4))),
                ..Default::default()
            },
            at(1, 10),
        )
        .unwrap();
    assert_eq!(patched.status, TaskStatus::InProgress);
    assert_eq!(patched.due_date, Some(d(4)));

    let err = tracker
        .update_task(
            &task.id,
            TaskPatch {
                title: Some("   ".into()),
                ..Default::default()
            },
            at(1, 11),
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(tracker.get_task(&task.id).unwrap().title, "Draft the essay");

    tracker.delete_task(&task.id, at(1, 12)).unwrap();
    let rename = TaskPatch {
        title: Some("x".into()),
        ..Default::default()
    };
    assert!(matches!(
        tracker.update_task(&task.id, rename, at(1, 13)),
        Err(CoreError::TaskNotFound(_))
    ));
}

#[test]
fn test_analytics_and_events() {
    let mut tracker = Tracker::new(Database::open_memory().unwrap(), utc_config()).unwrap();
    let events = tracker.subscribe();

    let habit = tracker
        .create_task(
            NewTask::new("Read").starting(d(1)).recurring(RecurrenceSchedule::Daily),
            at(1, 8),
        )
        .unwrap();
    for day in [2, 3, 5] {
        tracker.set_day_completed(&habit.id, d(day), true, at(6, 9)).unwrap();
    }
    tracker
        .edit_completion_day(&habit.id, d(5), d(4), at(6, 9))
        .unwrap();

    let report = tracker.analytics(AnalyticsRange::All, at(6, 9)).unwrap();
    assert_eq!(report.start, d(2));
    assert_eq!(report.total_completions, 3);
    assert_eq!(report.active_days, 3);
    assert_eq!(report.completion_rate, Some(0.6));

    let streak = tracker.streak(&habit.id, at(6, 9)).unwrap();
    assert_eq!(streak.current, 0);
    assert_eq!(streak.longest, 3);

    let received: Vec<Event> = events.try_iter().collect();
    let moved = received
        .iter()
        .filter(|e| matches!(e, Event::DayCompletionChanged { completed: false, .. }))
        .count();
    assert_eq!(moved, 1);
    assert!(received
        .iter()
        .any(|e| matches!(e, Event::AchievementEarned { .. })));
}
