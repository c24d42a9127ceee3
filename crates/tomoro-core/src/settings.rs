//! Per-user timer settings.
//!
//! Settings live as columns on the `users` table and are mutated in place.
//! Starting a timer snapshots them into the session row, so a session's
//! durations are frozen at creation and never live-reloaded.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::storage::{Database, TimerDefaults, UserRecord};

/// Read model returned to callers: configurable durations plus the
/// cumulative pomodoro counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    pub pomodoros_before_long_break: u32,
    pub pomodoro_count: u32,
}

impl From<&UserRecord> for UserSettings {
    fn from(user: &UserRecord) -> Self {
        Self {
            work_minutes: user.work_minutes,
            break_minutes: user.break_minutes,
            short_break_minutes: user.short_break_minutes,
            long_break_minutes: user.long_break_minutes,
            pomodoros_before_long_break: user.pomodoros_before_long_break.max(1),
            pomodoro_count: user.pomodoro_count,
        }
    }
}

/// Partial settings update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub work_minutes: Option<u32>,
    pub break_minutes: Option<u32>,
    pub long_break_minutes: Option<u32>,
}

impl SettingsUpdate {
    /// Range-check every provided field.
    ///
    /// # Errors
    /// Returns the first out-of-range field as a validation error.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("work_minutes", self.work_minutes, 1, 90)?;
        check_range("break_minutes", self.break_minutes, 1, 30)?;
        check_range("long_break_minutes", self.long_break_minutes, 1, 60)?;
        Ok(())
    }
}

fn check_range(
    field: &'static str,
    value: Option<u32>,
    min: u32,
    max: u32,
) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < min || v > max => Err(ValidationError::OutOfRange { field, min, max }),
        _ => Ok(()),
    }
}

/// Reads and writes per-user settings.
pub struct SettingsStore<'a> {
    db: &'a Database,
    defaults: TimerDefaults,
}

impl<'a> SettingsStore<'a> {
    pub fn new(db: &'a Database, defaults: TimerDefaults) -> Self {
        Self { db, defaults }
    }

    /// Register a new user seeded with the configured defaults.
    ///
    /// # Errors
    /// `EmailTaken` if the email is already registered.
    pub fn register_user(&self, email: &str, name: &str) -> Result<i64> {
        match self.db.insert_user(email, name, &self.defaults) {
            Ok(user_id) => Ok(user_id),
            Err(e) => {
                let db_err: crate::error::DatabaseError = e.into();
                if matches!(db_err, crate::error::DatabaseError::Constraint(_)) {
                    Err(CoreError::EmailTaken(email.to_string()))
                } else {
                    Err(db_err.into())
                }
            }
        }
    }

    /// Current settings for a user.
    ///
    /// # Errors
    /// `UnknownUser` if the user does not exist.
    pub fn get(&self, user_id: i64) -> Result<UserSettings> {
        let user = self
            .db
            .user(user_id)?
            .ok_or(CoreError::UnknownUser(user_id))?;
        Ok(UserSettings::from(&user))
    }

    /// Apply a partial update and return the resulting settings.
    ///
    /// # Errors
    /// `Validation` for out-of-range values, `UnknownUser` if the user does
    /// not exist.
    pub fn update(&self, user_id: i64, update: &SettingsUpdate) -> Result<UserSettings> {
        update.validate()?;
        let affected = self.db.apply_settings(
            user_id,
            update.work_minutes,
            update.break_minutes,
            update.long_break_minutes,
        )?;
        if affected == 0 {
            return Err(CoreError::UnknownUser(user_id));
        }
        self.get(user_id)
    }
}
