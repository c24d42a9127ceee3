mod engine;

pub use engine::{
    ActiveTimer, CompletedTimer, SequenceInfo, StartedTimer, StoppedTimer, TimerEngine,
};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// What a timer session is for.
///
/// This is a closed set: the engine can never be handed an out-of-range
/// kind, so "invalid timer kind" errors only exist at boundaries that parse
/// untrusted input (CLI flags, JSON payloads).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    Work,
    ShortBreak,
    LongBreak,
}

impl TimerKind {
    pub fn is_work(self) -> bool {
        matches!(self, TimerKind::Work)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimerKind::Work => "work",
            TimerKind::ShortBreak => "short_break",
            TimerKind::LongBreak => "long_break",
        }
    }
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "work" => Ok(TimerKind::Work),
            "short_break" => Ok(TimerKind::ShortBreak),
            "long_break" => Ok(TimerKind::LongBreak),
            other => Err(ValidationError::UnknownTimerKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in [TimerKind::Work, TimerKind::ShortBreak, TimerKind::LongBreak] {
            assert_eq!(kind.as_str().parse::<TimerKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!("settings".parse::<TimerKind>().is_err());
        assert!("".parse::<TimerKind>().is_err());
    }
}
