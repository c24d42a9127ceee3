//! Daily and summary statistics derived from timer activity.
//!
//! The `daily_stats` rollup is updated incrementally as sessions finish.
//! Read paths prefer the rollup and reconstruct from raw session and focus
//! event rows when it is absent, so statistics stay usable even if rollup
//! writes were lost -- they are a best-effort side channel of the timer
//! transitions, never allowed to fail one.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::storage::{Database, SessionRecord, StatsConfig};

/// One day's worth of focus activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub focus_event_count: u32,
    pub total_focus_minutes: u32,
}

/// Headline numbers across today and all time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub today_minutes: u32,
    pub total_minutes: u32,
    pub streak_days: u32,
    pub today_pomodoros: u32,
    pub total_pomodoros: u32,
}

/// Derives and caches daily/summary metrics from finished sessions.
pub struct StatisticsAggregator<'a> {
    db: &'a Database,
    config: StatsConfig,
}

impl<'a> StatisticsAggregator<'a> {
    pub fn new(db: &'a Database, config: StatsConfig) -> Self {
        Self { db, config }
    }

    /// Fold one finished work session into its day's rollup row.
    ///
    /// Interruptions bump the completed-session tally but not the focus
    /// event count; focus minutes accrue for work sessions either way.
    pub fn record_session(&self, session: &SessionRecord) -> Result<()> {
        let day = session.started_at.date_naive();
        let focus_events = u32::from(session.completed);
        let focus_minutes = if session.kind.is_work() {
            session.work_minutes
        } else {
            0
        };
        self.db
            .bump_daily_stat(session.user_id, day, focus_events, 1, focus_minutes)?;
        Ok(())
    }

    /// [`Self::record_session`], with failures logged and swallowed so the
    /// timer transition that triggered the update still reports success.
    pub fn record_session_best_effort(&self, session: &SessionRecord) {
        if let Err(e) = self.record_session(session) {
            warn!(
                user_id = session.user_id,
                session_id = session.id,
                error = %e,
                "failed to update daily statistics"
            );
        }
    }

    /// Per-day activity over the inclusive date range, ascending.
    ///
    /// Defaults to the configured lookback window ending today. Persisted
    /// rollup rows are returned as-is; when none exist in range the report
    /// is reconstructed from completed work sessions and successful focus
    /// events. Both paths emit only days with recorded activity.
    pub fn range(
        &self,
        user_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<DailyReport>> {
        let today = Utc::now().date_naive();
        let to = to.unwrap_or(today);
        let from =
            from.unwrap_or_else(|| today - Duration::days(i64::from(self.config.lookback_days)));

        let persisted = self.db.daily_stats_between(user_id, from, to)?;
        if !persisted.is_empty() {
            return Ok(persisted
                .into_iter()
                .map(|stat| DailyReport {
                    date: stat.day,
                    focus_event_count: stat.focus_event_count,
                    total_focus_minutes: stat.total_focus_minutes,
                })
                .collect());
        }

        self.reconstruct_range(user_id, from, to)
    }

    /// Today's numbers, lifetime totals and the current streak.
    ///
    /// Today's values prefer the rollup and fall back to live aggregation;
    /// lifetime totals fall back to raw rows when the rollup sums to zero
    /// (no rollups recorded yet).
    pub fn summary(&self, user_id: i64) -> Result<Summary> {
        let today = Utc::now().date_naive();

        let (today_minutes, today_pomodoros) = self.day_activity(user_id, today)?;

        let (mut total_minutes, mut total_pomodoros) = self.db.daily_stat_totals(user_id)?;
        if total_minutes == 0 {
            total_minutes = self.db.total_work_minutes(user_id)?;
        }
        if total_pomodoros == 0 {
            total_pomodoros = self.db.total_focus_events(user_id)?;
        }

        Ok(Summary {
            today_minutes,
            total_minutes,
            streak_days: self.streak(user_id, today)?,
            today_pomodoros,
            total_pomodoros,
        })
    }

    // === Internal ===

    fn reconstruct_range(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyReport>> {
        let mut days: BTreeMap<NaiveDate, DailyReport> = BTreeMap::new();

        for (day, minutes) in self.db.work_minutes_by_day(user_id, from, to)? {
            days.entry(day)
                .or_insert_with(|| empty_report(day))
                .total_focus_minutes += minutes;
        }
        for (day, count) in self.db.focus_events_by_day(user_id, from, to)? {
            days.entry(day)
                .or_insert_with(|| empty_report(day))
                .focus_event_count += count;
        }

        Ok(days.into_values().collect())
    }

    /// `(focus_minutes, focus_events)` for one day, preferring the rollup.
    fn day_activity(&self, user_id: i64, day: NaiveDate) -> Result<(u32, u32)> {
        let stat = self.db.daily_stat(user_id, day)?;

        let minutes = match &stat {
            Some(s) if s.total_focus_minutes > 0 => s.total_focus_minutes,
            _ => self.db.work_minutes_on(user_id, day)?,
        };
        let events = match &stat {
            Some(s) if s.focus_event_count > 0 => s.focus_event_count,
            _ => self.db.focus_events_on(user_id, day)?,
        };
        Ok((minutes, events))
    }

    /// Consecutive trailing days with at least one focus event, starting
    /// today and scanning back to the configured horizon. A zero-activity
    /// today yields 0.
    fn streak(&self, user_id: i64, today: NaiveDate) -> Result<u32> {
        let mut streak = 0;
        for days_ago in 0..self.config.streak_horizon_days {
            let day = today - Duration::days(i64::from(days_ago));
            let (_, events) = self.day_activity(user_id, day)?;
            if events > 0 {
                streak += 1;
            } else {
                break;
            }
        }
        Ok(streak)
    }
}

fn empty_report(date: NaiveDate) -> DailyReport {
    DailyReport {
        date,
        focus_event_count: 0,
        total_focus_minutes: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TimerDefaults;
    use crate::timer::TimerKind;
    use chrono::{DateTime, Utc};
    use rusqlite::params;

    fn setup() -> (Database, i64) {
        let db = Database::open_memory().unwrap();
        let user_id = db
            .insert_user("user@example.com", "user", &TimerDefaults::default())
            .unwrap();
        (db, user_id)
    }

    fn aggregator(db: &Database) -> StatisticsAggregator<'_> {
        StatisticsAggregator::new(db, StatsConfig::default())
    }

    /// Insert a completed work session + matching focus event some days ago,
    /// bypassing the engine so rows can carry back-dated timestamps.
    fn backdated_work(db: &Database, user_id: i64, days_ago: i64, minutes: u32, seq: u32) {
        let started: DateTime<Utc> = Utc::now() - Duration::days(days_ago);
        db.conn()
            .execute(
                "INSERT INTO sessions
                     (user_id, kind, work_minutes, break_minutes, started_at, ended_at, completed)
                 VALUES (?1, 'work', ?2, 5, ?3, ?3, 1)",
                params![user_id, minutes, started.to_rfc3339()],
            )
            .unwrap();
        db.insert_focus_event(user_id, started, started, seq).unwrap();
    }

    #[test]
    fn empty_user_summary_is_all_zeros() {
        let (db, user_id) = setup();
        let summary = aggregator(&db).summary(user_id).unwrap();
        assert_eq!(summary, Summary::default());
    }

    #[test]
    fn record_session_distinguishes_completion_from_interruption() {
        let (db, user_id) = setup();
        let stats = aggregator(&db);
        let now = Utc::now();

        let mut session = db
            .insert_session(user_id, TimerKind::Work, 25, 5, now)
            .unwrap();
        session.completed = true;
        stats.record_session(&session).unwrap();

        session.completed = false;
        session.interrupted = true;
        stats.record_session(&session).unwrap();

        let stat = db.daily_stat(user_id, now.date_naive()).unwrap().unwrap();
        assert_eq!(stat.completed_session_count, 2);
        assert_eq!(stat.focus_event_count, 1);
        assert_eq!(stat.total_focus_minutes, 50);
    }

    #[test]
    fn range_prefers_persisted_rollups_without_gap_filling() {
        let (db, user_id) = setup();
        let stats = aggregator(&db);
        let today = Utc::now().date_naive();

        db.bump_daily_stat(user_id, today - Duration::days(3), 2, 2, 50)
            .unwrap();
        db.bump_daily_stat(user_id, today, 1, 1, 25).unwrap();

        let report = stats.range(user_id, None, None).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].date, today - Duration::days(3));
        assert_eq!(report[0].total_focus_minutes, 50);
        assert_eq!(report[1].date, today);
    }

    #[test]
    fn range_reconstructs_from_raw_rows_when_rollup_is_missing() {
        let (db, user_id) = setup();
        let stats = aggregator(&db);

        backdated_work(&db, user_id, 2, 25, 1);
        backdated_work(&db, user_id, 2, 25, 2);
        backdated_work(&db, user_id, 0, 50, 3);

        let report = stats.range(user_id, None, None).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].focus_event_count, 2);
        assert_eq!(report[0].total_focus_minutes, 50);
        assert_eq!(report[1].focus_event_count, 1);
        assert_eq!(report[1].total_focus_minutes, 50);
    }

    #[test]
    fn range_respects_explicit_bounds() {
        let (db, user_id) = setup();
        let stats = aggregator(&db);
        let today = Utc::now().date_naive();

        backdated_work(&db, user_id, 10, 25, 1);
        backdated_work(&db, user_id, 1, 25, 2);

        let report = stats
            .range(user_id, Some(today - Duration::days(5)), Some(today))
            .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].date, today - Duration::days(1));
    }

    #[test]
    fn summary_falls_back_to_raw_rows() {
        let (db, user_id) = setup();
        let stats = aggregator(&db);

        // Raw data only, no rollups anywhere.
        backdated_work(&db, user_id, 0, 25, 1);
        backdated_work(&db, user_id, 0, 25, 2);
        backdated_work(&db, user_id, 1, 50, 3);

        let summary = stats.summary(user_id).unwrap();
        assert_eq!(summary.today_minutes, 50);
        assert_eq!(summary.today_pomodoros, 2);
        assert_eq!(summary.total_minutes, 100);
        assert_eq!(summary.total_pomodoros, 3);
        assert_eq!(summary.streak_days, 2);
    }

    #[test]
    fn streak_stops_at_first_empty_day() {
        let (db, user_id) = setup();
        let stats = aggregator(&db);

        backdated_work(&db, user_id, 0, 25, 1);
        backdated_work(&db, user_id, 1, 25, 2);
        // Day 2 has nothing; day 3 should not count.
        backdated_work(&db, user_id, 3, 25, 3);

        assert_eq!(stats.summary(user_id).unwrap().streak_days, 2);
    }

    #[test]
    fn streak_is_zero_without_activity_today() {
        let (db, user_id) = setup();
        let stats = aggregator(&db);

        backdated_work(&db, user_id, 1, 25, 1);
        assert_eq!(stats.summary(user_id).unwrap().streak_days, 0);
    }
}
