//! Database schema migrations for tomoro.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current schema
/// version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    // Apply migrations sequentially
    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or(0)
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: initial schema.
///
/// Creates the four core tables: users (settings plus the cumulative
/// pomodoro counter), sessions (one row per timer instance), focus_events
/// (one immutable row per naturally completed work session) and daily_stats
/// (one mutable rollup row per user per calendar day).
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            user_id                     INTEGER PRIMARY KEY AUTOINCREMENT,
            email                       TEXT NOT NULL UNIQUE,
            name                        TEXT NOT NULL,
            pomodoro_count              INTEGER NOT NULL DEFAULT 0,
            work_minutes                INTEGER NOT NULL DEFAULT 25,
            break_minutes               INTEGER NOT NULL DEFAULT 5,
            short_break_minutes         INTEGER NOT NULL DEFAULT 5,
            long_break_minutes          INTEGER NOT NULL DEFAULT 15,
            pomodoros_before_long_break INTEGER NOT NULL DEFAULT 4,
            created_at                  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       INTEGER NOT NULL REFERENCES users(user_id),
            kind          TEXT NOT NULL,
            work_minutes  INTEGER NOT NULL,
            break_minutes INTEGER NOT NULL,
            started_at    TEXT NOT NULL,
            ended_at      TEXT,
            completed     INTEGER NOT NULL DEFAULT 0,
            interrupted   INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS focus_events (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(user_id),
            started_at      TEXT NOT NULL,
            ended_at        TEXT NOT NULL,
            successful      INTEGER NOT NULL DEFAULT 1,
            sequence_number INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS daily_stats (
            user_id                 INTEGER NOT NULL REFERENCES users(user_id),
            day                     TEXT NOT NULL,
            focus_event_count       INTEGER NOT NULL DEFAULT 0,
            completed_session_count INTEGER NOT NULL DEFAULT 0,
            total_focus_minutes     INTEGER NOT NULL DEFAULT 0,
            UNIQUE (user_id, day)
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id, id);
        CREATE INDEX IF NOT EXISTS idx_focus_events_user_started
            ON focus_events(user_id, started_at);",
    )?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;

    tx.commit()?;
    Ok(())
}

/// Migration v2: enforce the one-active-session invariant in the schema.
///
/// A session is active while neither completed nor interrupted. The partial
/// unique index makes a second open row per user unrepresentable, so two
/// concurrent starts cannot both succeed.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_one_active
            ON sessions(user_id) WHERE completed = 0 AND interrupted = 0;",
    )?;
    set_schema_version(conn, 2)?;
    Ok(())
}
