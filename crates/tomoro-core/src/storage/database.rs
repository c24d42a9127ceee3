//! SQLite-based storage for users, timer sessions, focus events and the
//! daily statistics rollup.
//!
//! All queries live here; the engine and the aggregator compose them inside
//! their own transaction scopes. Timestamps are stored as RFC3339 text in
//! UTC, calendar days as `YYYY-MM-DD` text (SQLite's `date()` output).

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::data_dir;
use super::migrations;
use super::TimerDefaults;
use crate::error::{DatabaseError, Result};
use crate::timer::TimerKind;

// === Row types ===

/// One user row: identity, settings and the cumulative pomodoro counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub pomodoro_count: u32,
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub pomodoros_before_long_break: u32,
    pub created_at: DateTime<Utc>,
}

/// One timer session. Active while neither `completed` nor `interrupted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub user_id: i64,
    pub kind: TimerKind,
    /// Durations effective for this session, snapshotted at creation.
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub interrupted: bool,
}

impl SessionRecord {
    /// Total duration of this session in seconds.
    pub fn duration_seconds(&self) -> u64 {
        let minutes = if self.kind.is_work() {
            self.work_minutes
        } else {
            self.break_minutes
        };
        u64::from(minutes) * 60
    }
}

/// An immutable record of one naturally completed work session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusEvent {
    pub id: i64,
    pub user_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub successful: bool,
    /// The user's pomodoro counter value after the completing increment.
    pub sequence_number: u32,
}

/// The per-user-per-day statistics rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyStat {
    pub user_id: i64,
    pub day: NaiveDate,
    pub focus_event_count: u32,
    pub completed_session_count: u32,
    pub total_focus_minutes: u32,
}

// === Helper functions ===

/// Parse a timer kind from its database string, defensively falling back to
/// work for anything unrecognized.
fn parse_timer_kind(kind_str: &str) -> TimerKind {
    match kind_str {
        "short_break" => TimerKind::ShortBreak,
        "long_break" => TimerKind::LongBreak,
        _ => TimerKind::Work,
    }
}

/// Parse an RFC3339 timestamp read from column `idx`. Corrupt stored rows
/// surface as conversion errors rather than being remapped to the current
/// time, which would misattribute history to today.
fn parse_datetime(idx: usize, dt_str: &str) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Parse a `YYYY-MM-DD` day string read from column `idx`.
fn parse_day(idx: usize, day_str: &str) -> std::result::Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(day_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Build a SessionRecord from a row selected in column order
/// `id, user_id, kind, work_minutes, break_minutes, started_at, ended_at,
/// completed, interrupted`.
fn row_to_session(row: &rusqlite::Row) -> std::result::Result<SessionRecord, rusqlite::Error> {
    let kind_str: String = row.get(2)?;
    let started_at_str: String = row.get(5)?;
    let ended_at_str: Option<String> = row.get(6)?;

    Ok(SessionRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: parse_timer_kind(&kind_str),
        work_minutes: row.get(3)?,
        break_minutes: row.get(4)?,
        started_at: parse_datetime(5, &started_at_str)?,
        ended_at: ended_at_str
            .as_deref()
            .map(|s| parse_datetime(6, s))
            .transpose()?,
        completed: row.get(7)?,
        interrupted: row.get(8)?,
    })
}

const SESSION_COLUMNS: &str =
    "id, user_id, kind, work_minutes, break_minutes, started_at, ended_at, completed, interrupted";

fn row_to_user(row: &rusqlite::Row) -> std::result::Result<UserRecord, rusqlite::Error> {
    let created_at_str: String = row.get(9)?;
    Ok(UserRecord {
        user_id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        pomodoro_count: row.get(3)?,
        work_minutes: row.get(4)?,
        break_minutes: row.get(5)?,
        short_break_minutes: row.get(6)?,
        long_break_minutes: row.get(7)?,
        pomodoros_before_long_break: row.get(8)?,
        created_at: parse_datetime(9, &created_at_str)?,
    })
}

const USER_COLUMNS: &str = "user_id, email, name, pomodoro_count, work_minutes, break_minutes, \
     short_break_minutes, long_break_minutes, pomodoros_before_long_break, created_at";

/// SQLite database for tomoro.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/tomoro/tomoro.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("tomoro.db");
        Self::open_at(&path)
    }

    /// Open the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and tooling).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        migrations::migrate(&self.conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // === Users ===

    /// Insert a new user seeded with the configured default durations.
    ///
    /// # Errors
    /// Returns a constraint error if the email is already registered.
    pub fn insert_user(
        &self,
        email: &str,
        name: &str,
        defaults: &TimerDefaults,
    ) -> std::result::Result<i64, rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO users (email, name, work_minutes, break_minutes,
                 short_break_minutes, long_break_minutes, pomodoros_before_long_break, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                email,
                name,
                defaults.work_minutes,
                defaults.break_minutes,
                defaults.short_break_minutes,
                defaults.long_break_minutes,
                defaults.pomodoros_before_long_break,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn user(&self, user_id: i64) -> std::result::Result<Option<UserRecord>, rusqlite::Error> {
        self.conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
                params![user_id],
                row_to_user,
            )
            .optional()
    }

    /// Apply a partial settings update; `None` fields keep their value.
    ///
    /// Returns the number of affected rows (0 for an unknown user).
    pub fn apply_settings(
        &self,
        user_id: i64,
        work_minutes: Option<u32>,
        break_minutes: Option<u32>,
        long_break_minutes: Option<u32>,
    ) -> std::result::Result<usize, rusqlite::Error> {
        self.conn.execute(
            "UPDATE users SET
                 work_minutes = COALESCE(?2, work_minutes),
                 break_minutes = COALESCE(?3, break_minutes),
                 short_break_minutes = COALESCE(?3, short_break_minutes),
                 long_break_minutes = COALESCE(?4, long_break_minutes)
             WHERE user_id = ?1",
            params![user_id, work_minutes, break_minutes, long_break_minutes],
        )
    }

    /// Increment the pomodoro counter and return the new value.
    pub fn increment_pomodoro_count(
        &self,
        user_id: i64,
    ) -> std::result::Result<u32, rusqlite::Error> {
        self.conn.execute(
            "UPDATE users SET pomodoro_count = pomodoro_count + 1 WHERE user_id = ?1",
            params![user_id],
        )?;
        self.conn.query_row(
            "SELECT pomodoro_count FROM users WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
    }

    /// Zero the pomodoro counter. Returns affected row count.
    pub fn reset_pomodoro_count(&self, user_id: i64) -> std::result::Result<usize, rusqlite::Error> {
        self.conn.execute(
            "UPDATE users SET pomodoro_count = 0 WHERE user_id = ?1",
            params![user_id],
        )
    }

    // === Sessions ===

    /// The user's active session, if any. Latest row wins if the invariant
    /// is ever violated.
    pub fn active_session(
        &self,
        user_id: i64,
    ) -> std::result::Result<Option<SessionRecord>, rusqlite::Error> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions
                     WHERE user_id = ?1 AND completed = 0 AND interrupted = 0
                     ORDER BY id DESC LIMIT 1"
                ),
                params![user_id],
                row_to_session,
            )
            .optional()
    }

    /// The user's most recently created completed session of any kind.
    /// Creation order breaks timestamp ties.
    pub fn last_completed_session(
        &self,
        user_id: i64,
    ) -> std::result::Result<Option<SessionRecord>, rusqlite::Error> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions
                     WHERE user_id = ?1 AND completed = 1
                     ORDER BY id DESC LIMIT 1"
                ),
                params![user_id],
                row_to_session,
            )
            .optional()
    }

    /// Insert a new active session and return it.
    pub fn insert_session(
        &self,
        user_id: i64,
        kind: TimerKind,
        work_minutes: u32,
        break_minutes: u32,
        started_at: DateTime<Utc>,
    ) -> std::result::Result<SessionRecord, rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO sessions (user_id, kind, work_minutes, break_minutes, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                kind.as_str(),
                work_minutes,
                break_minutes,
                started_at.to_rfc3339(),
            ],
        )?;
        Ok(SessionRecord {
            id: self.conn.last_insert_rowid(),
            user_id,
            kind,
            work_minutes,
            break_minutes,
            started_at,
            ended_at: None,
            completed: false,
            interrupted: false,
        })
    }

    /// Finalize a session exactly once: completed on natural completion,
    /// interrupted on explicit stop. Never both.
    pub fn close_session(
        &self,
        session_id: i64,
        ended_at: DateTime<Utc>,
        completed: bool,
    ) -> std::result::Result<usize, rusqlite::Error> {
        let (completed_flag, interrupted_flag) = if completed { (1, 0) } else { (0, 1) };
        self.conn.execute(
            "UPDATE sessions SET ended_at = ?2, completed = ?3, interrupted = ?4
             WHERE id = ?1 AND completed = 0 AND interrupted = 0",
            params![
                session_id,
                ended_at.to_rfc3339(),
                completed_flag,
                interrupted_flag,
            ],
        )
    }

    // === Focus events ===

    pub fn insert_focus_event(
        &self,
        user_id: i64,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        sequence_number: u32,
    ) -> std::result::Result<i64, rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO focus_events (user_id, started_at, ended_at, successful, sequence_number)
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![
                user_id,
                started_at.to_rfc3339(),
                ended_at.to_rfc3339(),
                sequence_number,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent focus events first, up to `limit`.
    pub fn recent_focus_events(
        &self,
        user_id: i64,
        limit: u32,
    ) -> std::result::Result<Vec<FocusEvent>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, started_at, ended_at, successful, sequence_number
             FROM focus_events WHERE user_id = ?1
             ORDER BY id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], |row| {
            let started_at: String = row.get(2)?;
            let ended_at: String = row.get(3)?;
            Ok(FocusEvent {
                id: row.get(0)?,
                user_id: row.get(1)?,
                started_at: parse_datetime(2, &started_at)?,
                ended_at: parse_datetime(3, &ended_at)?,
                successful: row.get(4)?,
                sequence_number: row.get(5)?,
            })
        })?;
        rows.collect()
    }

    /// Successful focus events per calendar day in the inclusive day range.
    pub fn focus_events_by_day(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> std::result::Result<Vec<(NaiveDate, u32)>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT date(started_at), COUNT(*) FROM focus_events
             WHERE user_id = ?1 AND successful = 1
               AND date(started_at) BETWEEN ?2 AND ?3
             GROUP BY date(started_at)
             ORDER BY date(started_at) ASC",
        )?;
        let rows = stmt.query_map(
            params![user_id, from.to_string(), to.to_string()],
            |row| {
                let day: String = row.get(0)?;
                Ok((parse_day(0, &day)?, row.get::<_, u32>(1)?))
            },
        )?;
        rows.collect()
    }

    /// Count of all successful focus events for the user.
    pub fn total_focus_events(&self, user_id: i64) -> std::result::Result<u32, rusqlite::Error> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM focus_events WHERE user_id = ?1 AND successful = 1",
            params![user_id],
            |row| row.get(0),
        )
    }

    /// Successful focus events on one calendar day.
    pub fn focus_events_on(
        &self,
        user_id: i64,
        day: NaiveDate,
    ) -> std::result::Result<u32, rusqlite::Error> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM focus_events
             WHERE user_id = ?1 AND successful = 1 AND date(started_at) = ?2",
            params![user_id, day.to_string()],
            |row| row.get(0),
        )
    }

    // === Daily statistics rollup ===

    /// Upsert the rollup row for `(user_id, day)`, adding the given deltas.
    pub fn bump_daily_stat(
        &self,
        user_id: i64,
        day: NaiveDate,
        focus_events: u32,
        completed_sessions: u32,
        focus_minutes: u32,
    ) -> std::result::Result<usize, rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO daily_stats
                 (user_id, day, focus_event_count, completed_session_count, total_focus_minutes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (user_id, day) DO UPDATE SET
                 focus_event_count = focus_event_count + excluded.focus_event_count,
                 completed_session_count = completed_session_count + excluded.completed_session_count,
                 total_focus_minutes = total_focus_minutes + excluded.total_focus_minutes",
            params![
                user_id,
                day.to_string(),
                focus_events,
                completed_sessions,
                focus_minutes,
            ],
        )
    }

    pub fn daily_stat(
        &self,
        user_id: i64,
        day: NaiveDate,
    ) -> std::result::Result<Option<DailyStat>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT user_id, day, focus_event_count, completed_session_count, total_focus_minutes
                 FROM daily_stats WHERE user_id = ?1 AND day = ?2",
                params![user_id, day.to_string()],
                row_to_daily_stat,
            )
            .optional()
    }

    /// Persisted rollup rows in the inclusive day range, ascending by date.
    pub fn daily_stats_between(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> std::result::Result<Vec<DailyStat>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, day, focus_event_count, completed_session_count, total_focus_minutes
             FROM daily_stats
             WHERE user_id = ?1 AND day BETWEEN ?2 AND ?3
             ORDER BY day ASC",
        )?;
        let rows = stmt.query_map(
            params![user_id, from.to_string(), to.to_string()],
            row_to_daily_stat,
        )?;
        rows.collect()
    }

    /// Sum of `(total_focus_minutes, focus_event_count)` over all rollup rows.
    pub fn daily_stat_totals(
        &self,
        user_id: i64,
    ) -> std::result::Result<(u32, u32), rusqlite::Error> {
        self.conn.query_row(
            "SELECT COALESCE(SUM(total_focus_minutes), 0), COALESCE(SUM(focus_event_count), 0)
             FROM daily_stats WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
    }

    // === Raw session aggregates (rollup fallback paths) ===

    /// Minutes of completed work sessions per calendar day in the inclusive
    /// day range.
    pub fn work_minutes_by_day(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> std::result::Result<Vec<(NaiveDate, u32)>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT date(started_at), COALESCE(SUM(work_minutes), 0) FROM sessions
             WHERE user_id = ?1 AND kind = 'work' AND completed = 1
               AND date(started_at) BETWEEN ?2 AND ?3
             GROUP BY date(started_at)
             ORDER BY date(started_at) ASC",
        )?;
        let rows = stmt.query_map(
            params![user_id, from.to_string(), to.to_string()],
            |row| {
                let day: String = row.get(0)?;
                Ok((parse_day(0, &day)?, row.get::<_, u32>(1)?))
            },
        )?;
        rows.collect()
    }

    /// Minutes of completed work sessions on one calendar day.
    pub fn work_minutes_on(
        &self,
        user_id: i64,
        day: NaiveDate,
    ) -> std::result::Result<u32, rusqlite::Error> {
        self.conn.query_row(
            "SELECT COALESCE(SUM(work_minutes), 0) FROM sessions
             WHERE user_id = ?1 AND kind = 'work' AND completed = 1
               AND date(started_at) = ?2",
            params![user_id, day.to_string()],
            |row| row.get(0),
        )
    }

    /// Minutes of completed work sessions across all time.
    pub fn total_work_minutes(&self, user_id: i64) -> std::result::Result<u32, rusqlite::Error> {
        self.conn.query_row(
            "SELECT COALESCE(SUM(work_minutes), 0) FROM sessions
             WHERE user_id = ?1 AND kind = 'work' AND completed = 1",
            params![user_id],
            |row| row.get(0),
        )
    }
}

fn row_to_daily_stat(row: &rusqlite::Row) -> std::result::Result<DailyStat, rusqlite::Error> {
    let day_str: String = row.get(1)?;
    Ok(DailyStat {
        user_id: row.get(0)?,
        day: parse_day(1, &day_str)?,
        focus_event_count: row.get(2)?,
        completed_session_count: row.get(3)?,
        total_focus_minutes: row.get(4)?,
    })
}
