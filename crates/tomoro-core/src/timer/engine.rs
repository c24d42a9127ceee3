//! Timer engine implementation.
//!
//! The engine is a wall-clock-based state machine over persisted sessions:
//! at most one active session exists per user, and every transition
//! (start, stop, complete) runs inside one transaction so the
//! check-then-act sequence is never interleaved for the same user. The
//! partial unique index on open sessions backs the same invariant at the
//! schema level.
//!
//! ## Session lifecycle
//!
//! ```text
//! start -> active -> (complete | stop)
//! ```
//!
//! A session is finalized exactly once and never reopened. Completing a
//! work session increments the user's pomodoro counter, records a focus
//! event and feeds the statistics rollup; stopping marks the session
//! interrupted and feeds the rollup without a focus event.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::TimerKind;
use crate::error::{CoreError, DatabaseError, Result};
use crate::stats::StatisticsAggregator;
use crate::storage::{Database, SessionRecord, StatsConfig, UserRecord};

/// GetActive result: the open session plus derived countdown state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTimer {
    pub session: SessionRecord,
    pub elapsed_seconds: u64,
    pub duration_seconds: u64,
    pub seconds_left: u64,
}

/// StartTimer result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartedTimer {
    pub session: SessionRecord,
    pub duration_seconds: u64,
}

/// StopTimer result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoppedTimer {
    pub session: SessionRecord,
}

/// CompleteTimer result. `next_kind` is evaluated after the counter
/// increment, so breaks are scheduled relative to the just-completed
/// session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedTimer {
    pub session: SessionRecord,
    pub next_kind: TimerKind,
    pub pomodoro_count: u32,
}

/// SequenceInfo result: position in the current work/break cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceInfo {
    pub pomodoro_count: u32,
    pub threshold: u32,
    pub next_kind: TimerKind,
    /// Position in the cycle as "a/b".
    pub progress: String,
    pub percentage: u32,
}

/// Position in the cycle for display purposes.
///
/// `count % threshold`, with an asymmetric remap: a zero remainder shows as
/// `threshold` once any pomodoro has completed (cycle just closed) but as 1
/// on a fresh counter (first session of a new cycle). Intentional UI
/// framing, kept as-is.
fn cycle_position(count: u32, threshold: u32) -> u32 {
    let rem = count % threshold;
    if rem != 0 {
        rem
    } else if count > 0 {
        threshold
    } else {
        1
    }
}

/// The timer state machine over persisted sessions.
pub struct TimerEngine<'a> {
    db: &'a Database,
    stats: StatisticsAggregator<'a>,
}

impl<'a> TimerEngine<'a> {
    pub fn new(db: &'a Database, stats_config: StatsConfig) -> Self {
        Self {
            db,
            stats: StatisticsAggregator::new(db, stats_config),
        }
    }

    // === Queries ===

    /// The user's active timer with countdown state, if one exists.
    /// No side effects.
    pub fn active(&self, user_id: i64) -> Result<Option<ActiveTimer>> {
        let Some(session) = self.db.active_session(user_id)? else {
            return Ok(None);
        };
        let elapsed_seconds = (Utc::now() - session.started_at).num_seconds().max(0) as u64;
        let duration_seconds = session.duration_seconds();
        Ok(Some(ActiveTimer {
            seconds_left: duration_seconds.saturating_sub(elapsed_seconds),
            elapsed_seconds,
            duration_seconds,
            session,
        }))
    }

    /// What kind of timer comes next, as a pure function of persisted state.
    pub fn next_kind(&self, user_id: i64) -> Result<TimerKind> {
        let user = self.require_user(user_id)?;
        self.next_kind_for(&user)
    }

    /// Cycle position, threshold and look-ahead in one read.
    pub fn sequence_info(&self, user_id: i64) -> Result<SequenceInfo> {
        let user = self.require_user(user_id)?;
        let threshold = user.pomodoros_before_long_break.max(1);
        let count = user.pomodoro_count;
        let next_kind = self.next_kind_for(&user)?;
        let position = cycle_position(count, threshold);
        Ok(SequenceInfo {
            pomodoro_count: count,
            threshold,
            next_kind,
            progress: format!("{position}/{threshold}"),
            percentage: position * 100 / threshold,
        })
    }

    // === Transitions ===

    /// Start a new timer.
    ///
    /// The kind is resolved via [`Self::next_kind`] when not requested
    /// explicitly. Durations are snapshotted from the user's current
    /// settings: work sessions freeze `work_minutes`, break sessions take
    /// the short/long break duration respectively.
    ///
    /// # Errors
    /// `ActiveTimerExists` if the user already has an open session.
    pub fn start(&self, user_id: i64, requested: Option<TimerKind>) -> Result<StartedTimer> {
        let tx = self.db.conn().unchecked_transaction()?;
        let user = self.require_user(user_id)?;

        if self.db.active_session(user_id)?.is_some() {
            return Err(CoreError::ActiveTimerExists);
        }

        let kind = match requested {
            Some(kind) => kind,
            None => self.next_kind_for(&user)?,
        };
        let break_minutes = match kind {
            TimerKind::Work => user.break_minutes,
            TimerKind::ShortBreak => user.short_break_minutes,
            TimerKind::LongBreak => user.long_break_minutes,
        };

        let session = self
            .db
            .insert_session(user_id, kind, user.work_minutes, break_minutes, Utc::now())
            .map_err(|e| {
                // A concurrent start can slip past the check above; the
                // partial unique index turns it into a constraint error.
                match DatabaseError::from(e) {
                    DatabaseError::Constraint(_) => CoreError::ActiveTimerExists,
                    other => other.into(),
                }
            })?;
        tx.commit()?;

        Ok(StartedTimer {
            duration_seconds: session.duration_seconds(),
            session,
        })
    }

    /// Interrupt the active timer.
    ///
    /// # Errors
    /// `NoActiveTimer` if the user has no open session.
    pub fn stop(&self, user_id: i64) -> Result<StoppedTimer> {
        let tx = self.db.conn().unchecked_transaction()?;
        let mut session = self
            .db
            .active_session(user_id)?
            .ok_or(CoreError::NoActiveTimer)?;

        let ended_at = Utc::now();
        self.db.close_session(session.id, ended_at, false)?;
        tx.commit()?;

        session.ended_at = Some(ended_at);
        session.interrupted = true;

        // Interrupted work still counts toward the day's completed-session
        // tally; no focus event is ever recorded for an interruption.
        if session.kind.is_work() {
            self.stats.record_session_best_effort(&session);
        }

        Ok(StoppedTimer { session })
    }

    /// Complete the active timer naturally.
    ///
    /// For work sessions this increments the pomodoro counter, records one
    /// focus event carrying the post-increment counter value, and feeds the
    /// daily rollup. The session row, counter and focus event commit
    /// atomically; the rollup update is a best-effort side channel.
    ///
    /// # Errors
    /// `NoActiveTimer` if the user has no open session.
    pub fn complete(&self, user_id: i64) -> Result<CompletedTimer> {
        let tx = self.db.conn().unchecked_transaction()?;
        let user = self.require_user(user_id)?;
        let mut session = self
            .db
            .active_session(user_id)?
            .ok_or(CoreError::NoActiveTimer)?;

        let ended_at = Utc::now();
        self.db.close_session(session.id, ended_at, true)?;
        session.ended_at = Some(ended_at);
        session.completed = true;

        let mut pomodoro_count = user.pomodoro_count;
        if session.kind.is_work() {
            pomodoro_count = self.db.increment_pomodoro_count(user_id)?;
            self.db
                .insert_focus_event(user_id, session.started_at, ended_at, pomodoro_count)?;
        }
        tx.commit()?;

        if session.kind.is_work() {
            self.stats.record_session_best_effort(&session);
        }

        // Look ahead with the counter already incremented.
        let next_kind = self.next_kind(user_id)?;

        Ok(CompletedTimer {
            session,
            next_kind,
            pomodoro_count,
        })
    }

    /// Zero the user's pomodoro counter. History (sessions, focus events,
    /// rollups) is untouched; only future look-aheads change.
    ///
    /// # Errors
    /// `UnknownUser` if the user does not exist.
    pub fn reset_counter(&self, user_id: i64) -> Result<u32> {
        let affected = self.db.reset_pomodoro_count(user_id)?;
        if affected == 0 {
            return Err(CoreError::UnknownUser(user_id));
        }
        Ok(0)
    }

    // === Internal ===

    fn require_user(&self, user_id: i64) -> Result<UserRecord> {
        self.db
            .user(user_id)?
            .ok_or(CoreError::UnknownUser(user_id))
    }

    /// Look-ahead: after anything other than a completed work session the
    /// next timer is work. After completed work, the break type is decided
    /// by the counter value with the completing increment already applied:
    /// a count divisible by the threshold means the cycle just closed, so
    /// the long break is due.
    fn next_kind_for(&self, user: &UserRecord) -> Result<TimerKind> {
        let last = self.db.last_completed_session(user.user_id)?;
        let followed_work = matches!(&last, Some(s) if s.kind.is_work());
        if !followed_work {
            return Ok(TimerKind::Work);
        }
        let threshold = user.pomodoros_before_long_break.max(1);
        if user.pomodoro_count > 0 && user.pomodoro_count % threshold == 0 {
            Ok(TimerKind::LongBreak)
        } else {
            Ok(TimerKind::ShortBreak)
        }
    }
}
