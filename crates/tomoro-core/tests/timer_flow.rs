//! End-to-end tests for the timer state machine and its statistics
//! side-effects, driven the way a transport layer would drive them.

use tomoro_core::{
    Database, ErrorKind, SettingsStore, SettingsUpdate, StatisticsAggregator, StatsConfig,
    TimerDefaults, TimerEngine, TimerKind,
};

struct Fixture {
    db: Database,
    user_id: i64,
}

impl Fixture {
    fn new() -> Self {
        let db = Database::open_memory().unwrap();
        let user_id = SettingsStore::new(&db, TimerDefaults::default())
            .register_user("focus@example.com", "focus")
            .unwrap();
        Self { db, user_id }
    }

    fn engine(&self) -> TimerEngine<'_> {
        TimerEngine::new(&self.db, StatsConfig::default())
    }

    fn stats(&self) -> StatisticsAggregator<'_> {
        StatisticsAggregator::new(&self.db, StatsConfig::default())
    }

    fn settings(&self) -> SettingsStore<'_> {
        SettingsStore::new(&self.db, TimerDefaults::default())
    }

    /// Run one full work pomodoro and the break the engine suggests.
    fn work_and_break(&self) -> TimerKind {
        let engine = self.engine();
        let started = engine.start(self.user_id, None).unwrap();
        assert_eq!(started.session.kind, TimerKind::Work);
        let completed = engine.complete(self.user_id).unwrap();
        engine.start(self.user_id, Some(completed.next_kind)).unwrap();
        engine.complete(self.user_id).unwrap();
        completed.next_kind
    }
}

#[test]
fn at_most_one_active_session_per_user() {
    let fx = Fixture::new();
    let engine = fx.engine();

    engine.start(fx.user_id, None).unwrap();
    assert_eq!(
        engine.start(fx.user_id, None).unwrap_err().kind(),
        ErrorKind::Conflict
    );

    // Independent users are unaffected.
    let other = fx.settings().register_user("other@example.com", "other").unwrap();
    engine.start(other, None).unwrap();

    let open_rows: i64 = fx
        .db
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM sessions WHERE completed = 0 AND interrupted = 0",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(open_rows, 2);
}

#[test]
fn completion_creates_exactly_one_focus_event_with_matching_sequence() {
    let fx = Fixture::new();
    let engine = fx.engine();

    for expected in 1..=3u32 {
        engine.start(fx.user_id, Some(TimerKind::Work)).unwrap();
        let completed = engine.complete(fx.user_id).unwrap();
        assert_eq!(completed.pomodoro_count, expected);

        let events = fx.db.recent_focus_events(fx.user_id, 10).unwrap();
        assert_eq!(events.len(), expected as usize);
        assert_eq!(events[0].sequence_number, expected);
        assert!(events[0].successful);
    }
}

#[test]
fn full_cycle_schedules_long_break_after_fourth_work() {
    let fx = Fixture::new();

    let mut breaks = Vec::new();
    for _ in 0..4 {
        breaks.push(fx.work_and_break());
    }
    assert_eq!(
        breaks,
        vec![
            TimerKind::ShortBreak,
            TimerKind::ShortBreak,
            TimerKind::ShortBreak,
            TimerKind::LongBreak,
        ]
    );

    // The pattern repeats into the next cycle.
    for _ in 0..3 {
        assert_eq!(fx.work_and_break(), TimerKind::ShortBreak);
    }
    assert_eq!(fx.work_and_break(), TimerKind::LongBreak);
}

#[test]
fn interruption_counts_sessions_but_not_focus_events() {
    let fx = Fixture::new();
    let engine = fx.engine();

    engine.start(fx.user_id, Some(TimerKind::Work)).unwrap();
    engine.stop(fx.user_id).unwrap();

    assert!(fx.db.recent_focus_events(fx.user_id, 10).unwrap().is_empty());
    let stat = fx
        .db
        .daily_stat(fx.user_id, chrono::Utc::now().date_naive())
        .unwrap()
        .unwrap();
    assert_eq!(stat.completed_session_count, 1);
    assert_eq!(stat.focus_event_count, 0);

    // The slot is free again.
    engine.start(fx.user_id, None).unwrap();
}

#[test]
fn three_completed_pomodoros_roll_up_into_daily_and_summary_stats() {
    let fx = Fixture::new();
    let engine = fx.engine();

    for _ in 0..3 {
        engine.start(fx.user_id, Some(TimerKind::Work)).unwrap();
        engine.complete(fx.user_id).unwrap();
    }

    let today = chrono::Utc::now().date_naive();
    let stat = fx.db.daily_stat(fx.user_id, today).unwrap().unwrap();
    assert_eq!(stat.focus_event_count, 3);
    assert_eq!(stat.completed_session_count, 3);
    assert_eq!(stat.total_focus_minutes, 75);

    let summary = fx.stats().summary(fx.user_id).unwrap();
    assert_eq!(summary.today_minutes, 75);
    assert_eq!(summary.today_pomodoros, 3);
    assert_eq!(summary.total_minutes, 75);
    assert_eq!(summary.total_pomodoros, 3);
    assert_eq!(summary.streak_days, 1);

    let report = fx.stats().range(fx.user_id, None, None).unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].date, today);
    assert_eq!(report[0].total_focus_minutes, 75);
}

#[test]
fn reset_counter_preserves_all_history() {
    let fx = Fixture::new();
    let engine = fx.engine();

    engine.start(fx.user_id, Some(TimerKind::Work)).unwrap();
    engine.complete(fx.user_id).unwrap();

    engine.reset_counter(fx.user_id).unwrap();

    assert_eq!(fx.settings().get(fx.user_id).unwrap().pomodoro_count, 0);
    assert_eq!(fx.db.recent_focus_events(fx.user_id, 10).unwrap().len(), 1);
    assert!(fx
        .db
        .daily_stat(fx.user_id, chrono::Utc::now().date_naive())
        .unwrap()
        .is_some());

    // The look-ahead starts a fresh cycle from the reset counter.
    let info = fx.engine().sequence_info(fx.user_id).unwrap();
    assert_eq!(info.pomodoro_count, 0);
    assert_eq!(info.progress, "1/4");
}

#[test]
fn settings_changes_apply_to_the_next_session_not_the_running_one() {
    let fx = Fixture::new();
    let engine = fx.engine();
    let settings = fx.settings();

    let started = engine.start(fx.user_id, Some(TimerKind::Work)).unwrap();
    assert_eq!(started.duration_seconds, 25 * 60);

    settings
        .update(
            fx.user_id,
            &SettingsUpdate {
                work_minutes: Some(50),
                ..Default::default()
            },
        )
        .unwrap();

    // Running session keeps its snapshot.
    let active = engine.active(fx.user_id).unwrap().unwrap();
    assert_eq!(active.duration_seconds, 25 * 60);

    engine.complete(fx.user_id).unwrap();
    let next = engine.start(fx.user_id, Some(TimerKind::Work)).unwrap();
    assert_eq!(next.duration_seconds, 50 * 60);
}

#[test]
fn summary_for_a_user_with_no_sessions_is_all_zeros() {
    let fx = Fixture::new();
    let summary = fx.stats().summary(fx.user_id).unwrap();
    assert_eq!(summary.today_minutes, 0);
    assert_eq!(summary.total_minutes, 0);
    assert_eq!(summary.streak_days, 0);
    assert_eq!(summary.today_pomodoros, 0);
    assert_eq!(summary.total_pomodoros, 0);
}

#[test]
fn state_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tomoro.db");

    let user_id = {
        let db = Database::open_at(&path).unwrap();
        let user_id = SettingsStore::new(&db, TimerDefaults::default())
            .register_user("persist@example.com", "persist")
            .unwrap();
        let engine = TimerEngine::new(&db, StatsConfig::default());
        engine.start(user_id, Some(TimerKind::Work)).unwrap();
        engine.complete(user_id).unwrap();
        engine.start(user_id, None).unwrap();
        user_id
    };

    let db = Database::open_at(&path).unwrap();
    let engine = TimerEngine::new(&db, StatsConfig::default());

    // The break started before reopening is still the active session.
    let active = engine.active(user_id).unwrap().unwrap();
    assert_eq!(active.session.kind, TimerKind::ShortBreak);
    assert_eq!(db.user(user_id).unwrap().unwrap().pomodoro_count, 1);
    assert_eq!(db.recent_focus_events(user_id, 10).unwrap().len(), 1);
}

#[test]
fn operations_against_unknown_users_are_not_found() {
    let fx = Fixture::new();
    let engine = fx.engine();

    assert_eq!(engine.start(999, None).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        engine.sequence_info(999).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        fx.settings().get(999).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}
