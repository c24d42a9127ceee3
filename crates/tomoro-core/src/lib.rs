//! # Tomoro Core Library
//!
//! Core business logic for Tomoro, a pomodoro productivity timer backend:
//! per-user settings, a work/break timer state machine over SQLite, and
//! daily/summary focus statistics. Transport layers (the CLI binary, or any
//! future HTTP surface) are thin wrappers over this crate; authentication is
//! an external collaborator that supplies an opaque `user_id`.
//!
//! ## Architecture
//!
//! - **Timer Engine**: persisted state machine allowing at most one active
//!   session per user; start/stop/complete transitions run in a single
//!   transaction and the schema enforces the one-active-session invariant
//! - **Settings Store**: per-user durations and the cumulative pomodoro
//!   counter, mutated in place and snapshotted into sessions at start
//! - **Statistics Aggregator**: incrementally maintained daily rollups with
//!   reconstruction from raw rows when a rollup is missing
//! - **Storage**: SQLite persistence with versioned migrations and a
//!   TOML-based process configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: timer state machine
//! - [`SettingsStore`]: settings reads/writes and user registration
//! - [`StatisticsAggregator`]: rollup maintenance and summary queries
//! - [`Database`]: persistence layer

pub mod error;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, ErrorKind, ValidationError};
pub use settings::{SettingsStore, SettingsUpdate, UserSettings};
pub use stats::{DailyReport, StatisticsAggregator, Summary};
pub use storage::{
    Config, DailyStat, Database, FocusEvent, SessionRecord, StatsConfig, TimerDefaults, UserRecord,
};
pub use timer::{
    ActiveTimer, CompletedTimer, SequenceInfo, StartedTimer, StoppedTimer, TimerEngine, TimerKind,
};
