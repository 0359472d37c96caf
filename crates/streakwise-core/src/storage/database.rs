//! SQLite storage for tasks, completion logs, streak states and achievements.
//!
//! Calendar days are stored as `YYYY-MM-DD` text and instants as RFC 3339,
//! so range queries on days are plain string comparisons.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

use super::{data_dir, migrations};
use crate::achievement::{Achievement, AchievementKind};
use crate::completion::CompletionLog;
use crate::error::{DatabaseError, Result};
use crate::schedule::{DayMask, RecurrenceSchedule};
use crate::streak::StreakState;
use crate::task::{Task, TaskPriority, TaskStatus};

const DAY_FORMAT: &str = "%Y-%m-%d";

const TASK_COLUMNS: &str = "id, title, description, status, priority, due_date, start_date,
     is_recurring, schedule_kind, day_mask, completed_at, created_at, updated_at";

// === Helper Functions ===

fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

fn parse_day(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DAY_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_day(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    s.map(|s| parse_day(idx, &s)).transpose()
}

/// Parse datetime from RFC3339 string with fallback to the epoch.
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            tracing::warn!(value = dt_str, error = %e, "unparsable stored timestamp");
            DateTime::<Utc>::UNIX_EPOCH
        })
}

fn parse_task_status(s: &str) -> TaskStatus {
    match s {
        "IN_PROGRESS" => TaskStatus::InProgress,
        "COMPLETED" => TaskStatus::Completed,
        _ => TaskStatus::Todo,
    }
}

fn parse_task_priority(s: &str) -> TaskPriority {
    s.parse().unwrap_or_default()
}

/// Split a schedule into its `(schedule_kind, day_mask)` columns.
fn format_schedule(schedule: Option<&RecurrenceSchedule>) -> (Option<&'static str>, Option<u8>) {
    match schedule {
        Some(RecurrenceSchedule::Daily) => (Some("daily"), Some(DayMask::EVERY_DAY.bits())),
        Some(RecurrenceSchedule::Weekly(mask)) => (Some("weekly"), Some(mask.bits())),
        None => (None, None),
    }
}

fn parse_schedule(
    kind: Option<String>,
    bits: Option<u8>,
) -> rusqlite::Result<Option<RecurrenceSchedule>> {
    match kind.as_deref() {
        Some("daily") => Ok(Some(RecurrenceSchedule::Daily)),
        Some("weekly") => {
            let mask = DayMask::from_bits(bits.unwrap_or(0)).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(9, Type::Integer, Box::new(e))
            })?;
            Ok(Some(RecurrenceSchedule::Weekly(mask)))
        }
        _ => Ok(None),
    }
}

/// Build a Task from a row selected with `TASK_COLUMNS`.
fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    let start_date: String = row.get(6)?;
    let completed_at: Option<String> = row.get(10)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;

    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: parse_task_status(&status),
        priority: parse_task_priority(&priority),
        due_date: parse_opt_day(5, row.get(5)?)?,
        start_date: parse_day(6, &start_date)?,
        is_recurring: row.get(7)?,
        schedule: parse_schedule(row.get(8)?, row.get(9)?)?,
        completed_at: completed_at.as_deref().map(parse_datetime_fallback),
        created_at: parse_datetime_fallback(&created_at),
        updated_at: parse_datetime_fallback(&updated_at),
    })
}

fn row_to_completion(row: &Row) -> rusqlite::Result<CompletionLog> {
    let day: String = row.get(1)?;
    let logged_at: String = row.get(3)?;
    Ok(CompletionLog {
        task_id: row.get(0)?,
        day: parse_day(1, &day)?,
        completed: row.get(2)?,
        logged_at: parse_datetime_fallback(&logged_at),
    })
}

fn row_to_streak_state(row: &Row) -> rusqlite::Result<StreakState> {
    let updated_at: String = row.get(4)?;
    Ok(StreakState {
        task_id: row.get(0)?,
        current: row.get(1)?,
        longest: row.get(2)?,
        longest_start: parse_opt_day(3, row.get(3)?)?,
        updated_at: parse_datetime_fallback(&updated_at),
        last_completed: parse_opt_day(5, row.get(5)?)?,
    })
}

fn row_to_achievement(row: &Row) -> rusqlite::Result<Option<Achievement>> {
    let kind: String = row.get(0)?;
    let earned_at: String = row.get(3)?;
    let Some(kind) = AchievementKind::parse(&kind) else {
        tracing::warn!(kind, "skipping achievement of unknown kind");
        return Ok(None);
    };
    Ok(Some(Achievement {
        kind,
        task_id: row.get(1)?,
        period: row.get(2)?,
        earned_at: parse_datetime_fallback(&earned_at),
    }))
}

/// SQLite database for all persistent tracker state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/streakwise.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("streakwise.db");
        Self::open_at(&path)
    }

    /// Open (or create) a database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::init(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Run `f` inside a transaction; it is rolled back if `f` fails.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    // === Tasks ===

    pub fn create_task(&self, task: &Task) -> Result<()> {
        let (schedule_kind, day_mask) = format_schedule(task.schedule.as_ref());
        self.conn.execute(
            &format!(
                "INSERT INTO tasks ({TASK_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                task.id,
                task.title,
                task.description,
                task.status.as_str(),
                task.priority.as_str(),
                task.due_date.map(format_day),
                format_day(task.start_date),
                task.is_recurring,
                schedule_kind,
                day_mask,
                task.completed_at.map(|dt| dt.to_rfc3339()),
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    /// All tasks, oldest first.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at, id"))?;
        let tasks = stmt
            .query_map([], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    /// Overwrite a task row. Returns false when the task no longer exists.
    pub fn update_task(&self, task: &Task) -> Result<bool> {
        let (schedule_kind, day_mask) = format_schedule(task.schedule.as_ref());
        let changed = self.conn.execute(
            "UPDATE tasks
             SET title = ?2, description = ?3, status = ?4, priority = ?5, due_date = ?6,
                 start_date = ?7, is_recurring = ?8, schedule_kind = ?9, day_mask = ?10,
                 completed_at = ?11, updated_at = ?12
             WHERE id = ?1",
            params![
                task.id,
                task.title,
                task.description,
                task.status.as_str(),
                task.priority.as_str(),
                task.due_date.map(format_day),
                format_day(task.start_date),
                task.is_recurring,
                schedule_kind,
                day_mask,
                task.completed_at.map(|dt| dt.to_rfc3339()),
                task.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(changed == 1)
    }

    /// Delete a task with its logs and streak state. Achievements are kept.
    pub fn delete_task(&self, id: &str) -> Result<bool> {
        self.transaction(|db| {
            db.clear_history(id)?;
            let deleted = db.conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            Ok(deleted == 1)
        })
    }

    // === Completion logs ===

    /// Upsert the completion flag for `(task_id, day)`.
    pub fn set_completion(
        &self,
        task_id: &str,
        day: NaiveDate,
        completed: bool,
        logged_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO completion_logs (task_id, day, completed, logged_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(task_id, day) DO UPDATE
             SET completed = excluded.completed, logged_at = excluded.logged_at",
            params![task_id, format_day(day), completed, logged_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Remove the row for `(task_id, day)`. Returns whether one existed.
    pub fn remove_completion(&self, task_id: &str, day: NaiveDate) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM completion_logs WHERE task_id = ?1 AND day = ?2",
            params![task_id, format_day(day)],
        )?;
        Ok(removed == 1)
    }

    pub fn is_completed_on(&self, task_id: &str, day: NaiveDate) -> Result<bool> {
        let completed: Option<bool> = self
            .conn
            .query_row(
                "SELECT completed FROM completion_logs WHERE task_id = ?1 AND day = ?2",
                params![task_id, format_day(day)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(completed.unwrap_or(false))
    }

    /// Delete every log row and the streak state of a task, keeping the task
    /// itself. Returns the days that held a completion.
    ///
    /// Runs outside any transaction of its own; wrap it with
    /// [`Database::transaction`] alongside the task update.
    pub fn clear_history(&self, task_id: &str) -> Result<Vec<NaiveDate>> {
        let days = self.completion_days(task_id)?;
        self.conn.execute(
            "DELETE FROM completion_logs WHERE task_id = ?1",
            params![task_id],
        )?;
        self.conn
            .execute("DELETE FROM streak_states WHERE task_id = ?1", params![task_id])?;
        Ok(days)
    }

    /// Completed days for one task, ascending.
    pub fn completion_days(&self, task_id: &str) -> Result<Vec<NaiveDate>> {
        let mut stmt = self.conn.prepare(
            "SELECT day FROM completion_logs
             WHERE task_id = ?1 AND completed = 1
             ORDER BY day",
        )?;
        let days = stmt
            .query_map(params![task_id], |row| {
                let day: String = row.get(0)?;
                parse_day(0, &day)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(days)
    }

    /// Completed rows across all tasks with `start <= day <= end`.
    pub fn completions_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CompletionLog>> {
        let mut stmt = self.conn.prepare(
            "SELECT task_id, day, completed, logged_at FROM completion_logs
             WHERE completed = 1 AND day >= ?1 AND day <= ?2
             ORDER BY day, task_id",
        )?;
        let logs = stmt
            .query_map(params![format_day(start), format_day(end)], row_to_completion)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(logs)
    }

    /// Ids of recurring tasks completed on `day`.
    pub fn recurring_done_on(&self, day: NaiveDate) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT l.task_id FROM completion_logs l
             JOIN tasks t ON t.id = l.task_id
             WHERE t.is_recurring = 1 AND l.completed = 1 AND l.day = ?1",
        )?;
        let ids = stmt
            .query_map(params![format_day(day)], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(ids)
    }

    /// Number of completed (task, day) rows.
    pub fn total_completions(&self) -> Result<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM completion_logs WHERE completed = 1",
            [],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }

    pub fn earliest_completion(&self) -> Result<Option<NaiveDate>> {
        let day: Option<String> = self.conn.query_row(
            "SELECT MIN(day) FROM completion_logs WHERE completed = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(parse_opt_day(0, day)?)
    }

    // === Streak states ===

    pub fn save_streak_state(&self, state: &StreakState) -> Result<()> {
        self.conn.execute(
            "INSERT INTO streak_states
                 (task_id, current, longest, longest_start, updated_at, last_completed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(task_id) DO UPDATE
             SET current = excluded.current,
                 longest = excluded.longest,
                 longest_start = excluded.longest_start,
                 updated_at = excluded.updated_at,
                 last_completed = excluded.last_completed",
            params![
                state.task_id,
                state.current,
                state.longest,
                state.longest_start.map(format_day),
                state.updated_at.to_rfc3339(),
                state.last_completed.map(format_day),
            ],
        )?;
        Ok(())
    }

    pub fn get_streak_state(&self, task_id: &str) -> Result<Option<StreakState>> {
        let state = self
            .conn
            .query_row(
                "SELECT task_id, current, longest, longest_start, updated_at, last_completed
                 FROM streak_states WHERE task_id = ?1",
                params![task_id],
                row_to_streak_state,
            )
            .optional()?;
        Ok(state)
    }

    // === Achievements ===

    /// Insert unless `(kind, task_id, period)` already exists. Returns true
    /// when the row is new.
    pub fn insert_achievement(&self, achievement: &Achievement) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO achievements (kind, task_id, period, earned_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                achievement.kind.as_str(),
                achievement.task_id,
                achievement.period,
                achievement.earned_at.to_rfc3339(),
            ],
        )?;
        Ok(inserted == 1)
    }

    /// All earned achievements, oldest first.
    pub fn list_achievements(&self) -> Result<Vec<Achievement>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, task_id, period, earned_at FROM achievements ORDER BY earned_at, id",
        )?;
        let rows = stmt
            .query_map([], row_to_achievement)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;
    use chrono::{TimeZone, Weekday};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap()
    }

    fn make_task(input: NewTask) -> Task {
        Task::create(input, d(1), now()).unwrap()
    }

    #[test]
    fn create_and_get_task() {
        let db = Database::open_memory().unwrap();
        let schedule =
            RecurrenceSchedule::Weekly(DayMask::from_weekdays([Weekday::Tue, Weekday::Sat]));
        let task = make_task(
            NewTask::new("Piano")
                .recurring(schedule)
                .with_priority(TaskPriority::High),
        );
        db.create_task(&task).unwrap();

        let retrieved = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(retrieved, task);
        assert!(db.get_task("missing").unwrap().is_none());
    }

    #[test]
    fn update_reports_missing_rows() {
        let db = Database::open_memory().unwrap();
        let mut task = make_task(NewTask::new("Read").due(d(12)));
        assert!(!db.update_task(&task).unwrap());

        db.create_task(&task).unwrap();
        task.title = "Read a chapter".into();
        task.due_date = None;
        assert!(db.update_task(&task).unwrap());
        let retrieved = db.get_task(&task.id).unwrap().unwrap();
        assert_eq!(retrieved.title, "Read a chapter");
        assert_eq!(retrieved.due_date, None);
    }

    #[test]
    fn completion_log_is_unique_per_day() {
        let db = Database::open_memory().unwrap();
        let task = make_task(NewTask::new("Walk").recurring(RecurrenceSchedule::Daily));
        db.create_task(&task).unwrap();

        db.set_completion(&task.id, d(9), true, now()).unwrap();
        db.set_completion(&task.id, d(9), true, now()).unwrap();
        db.set_completion(&task.id, d(10), true, now()).unwrap();
        assert_eq!(db.completion_days(&task.id).unwrap(), vec![d(9), d(10)]);
        assert_eq!(db.total_completions().unwrap(), 2);

        db.set_completion(&task.id, d(9), false, now()).unwrap();
        assert_eq!(db.completion_days(&task.id).unwrap(), vec![d(10)]);
        assert!(!db.is_completed_on(&task.id, d(9)).unwrap());
        assert_eq!(db.earliest_completion().unwrap(), Some(d(10)));
    }

    #[test]
    fn completions_between_is_inclusive() {
        let db = Database::open_memory().unwrap();
        let task = make_task(NewTask::new("Walk").recurring(RecurrenceSchedule::Daily));
        db.create_task(&task).unwrap();
        for day in [3, 5, 7, 9] {
            db.set_completion(&task.id, d(day), true, now()).unwrap();
        }
        let logs = db.completions_between(d(5), d(7)).unwrap();
        assert_eq!(logs.iter().map(|l| l.day).collect::<Vec<_>>(), vec![d(5), d(7)]);
    }

    #[test]
    fn recurring_done_on_ignores_one_off_tasks() {
        let db = Database::open_memory().unwrap();
        let habit = make_task(NewTask::new("Walk").recurring(RecurrenceSchedule::Daily));
        let chore = make_task(NewTask::new("Laundry"));
        db.create_task(&habit).unwrap();
        db.create_task(&chore).unwrap();
        db.set_completion(&habit.id, d(10), true, now()).unwrap();
        db.set_completion(&chore.id, d(10), true, now()).unwrap();

        let done = db.recurring_done_on(d(10)).unwrap();
        assert!(done.contains(&habit.id));
        assert!(!done.contains(&chore.id));
    }

    #[test]
    fn delete_task_removes_logs_and_streaks() {
        let db = Database::open_memory().unwrap();
        let task = make_task(NewTask::new("Walk").recurring(RecurrenceSchedule::Daily));
        db.create_task(&task).unwrap();
        db.set_completion(&task.id, d(10), true, now()).unwrap();
        db.save_streak_state(&StreakState::empty(&task.id, now())).unwrap();

        assert!(db.delete_task(&task.id).unwrap());
        assert!(!db.delete_task(&task.id).unwrap());
        assert_eq!(db.total_completions().unwrap(), 0);
        assert!(db.get_streak_state(&task.id).unwrap().is_none());
    }

    #[test]
    fn clear_history_keeps_the_task() {
        let db = Database::open_memory().unwrap();
        let task = make_task(NewTask::new("Walk").recurring(RecurrenceSchedule::Daily));
        db.create_task(&task).unwrap();
        for day in [8, 9, 10] {
            db.set_completion(&task.id, d(day), true, now()).unwrap();
        }
        db.save_streak_state(&StreakState::empty(&task.id, now())).unwrap();

        let cleared = db.clear_history(&task.id).unwrap();
        assert_eq!(cleared, vec![d(8), d(9), d(10)]);
        assert!(db.completion_days(&task.id).unwrap().is_empty());
        assert!(db.get_streak_state(&task.id).unwrap().is_none());
        assert!(db.get_task(&task.id).unwrap().is_some());
    }

    #[test]
    fn streak_state_upserts() {
        let db = Database::open_memory().unwrap();
        let task = make_task(NewTask::new("Walk").recurring(RecurrenceSchedule::Daily));
        db.create_task(&task).unwrap();

        let mut state = StreakState::empty(&task.id, now());
        db.save_streak_state(&state).unwrap();
        state.current = 4;
        state.longest = 6;
        state.longest_start = Some(d(1));
        state.last_completed = Some(d(10));
        db.save_streak_state(&state).unwrap();

        assert_eq!(db.get_streak_state(&task.id).unwrap(), Some(state));
    }

    #[test]
    fn achievements_insert_once() {
        let db = Database::open_memory().unwrap();
        let badge = Achievement {
            kind: AchievementKind::StreakMilestone,
            task_id: "task-1".into(),
            period: "7".into(),
            earned_at: now(),
        };
        assert!(db.insert_achievement(&badge).unwrap());
        assert!(!db.insert_achievement(&badge).unwrap());

        let global = Achievement {
            kind: AchievementKind::FirstCompletion,
            task_id: String::new(),
            period: "all".into(),
            earned_at: now(),
        };
        assert!(db.insert_achievement(&global).unwrap());
        assert!(!db.insert_achievement(&global).unwrap());
        assert_eq!(db.list_achievements().unwrap().len(), 2);
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let db = Database::open_memory().unwrap();
        let task = make_task(NewTask::new("Walk"));
        let result: Result<()> = db.transaction(|db| {
            db.create_task(&task)?;
            Err(crate::error::CoreError::TaskNotFound("boom".into()))
        });
        assert!(result.is_err());
        assert!(db.get_task(&task.id).unwrap().is_none());
    }
}
