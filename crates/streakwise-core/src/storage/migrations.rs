//! Database schema migrations for streakwise.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 3;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);
    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Current schema version; 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version, assuming 0");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    tracing::debug!(version, "schema version set");
    Ok(())
}

/// Migration v1: base tables.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id            TEXT PRIMARY KEY,
            title         TEXT NOT NULL,
            description   TEXT,
            status        TEXT NOT NULL DEFAULT 'TODO',
            due_date      TEXT,
            start_date    TEXT NOT NULL,
            is_recurring  INTEGER NOT NULL DEFAULT 0,
            schedule_kind TEXT,
            day_mask      INTEGER,
            completed_at  TEXT,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS completion_logs (
            task_id   TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            day       TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 1,
            logged_at TEXT NOT NULL,
            PRIMARY KEY (task_id, day)
        );

        CREATE TABLE IF NOT EXISTS streak_states (
            task_id       TEXT PRIMARY KEY REFERENCES tasks(id) ON DELETE CASCADE,
            current       INTEGER NOT NULL DEFAULT 0,
            longest       INTEGER NOT NULL DEFAULT 0,
            longest_start TEXT,
            updated_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS achievements (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            kind      TEXT NOT NULL,
            task_id   TEXT NOT NULL DEFAULT '',
            period    TEXT NOT NULL,
            earned_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_completion_logs_day ON completion_logs(day);
        CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: task priority.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch("ALTER TABLE tasks ADD COLUMN priority TEXT NOT NULL DEFAULT 'medium';")?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}

/// Migration v3: idempotent achievements and `last_completed` on streak states.
///
/// Duplicate achievement rows from older builds are collapsed to the
/// earliest before the unique index is created.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM achievements
         WHERE id NOT IN (
             SELECT MIN(id) FROM achievements GROUP BY kind, task_id, period
         );
         CREATE UNIQUE INDEX IF NOT EXISTS idx_achievements_key
             ON achievements(kind, task_id, period);
         ALTER TABLE streak_states ADD COLUMN last_completed TEXT;",
    )?;
    set_schema_version(&tx, 3)?;
    tx.commit()
}
