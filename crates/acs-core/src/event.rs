//! Classified turnstile events.

use std::fmt;

use chrono::NaiveDateTime;

/// Directional outcome of a single turnstile scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Successful scan into a restricted area.
    Enter,
    /// Successful scan out of a restricted area.
    Exit,
    /// Rejected scan or unrecognized direction code.
    Ignored,
}

impl Direction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Ignored => "ignored",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified scan, consumed immediately by the session reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    /// Restricted area the turnstile guards.
    pub area: String,
    /// Local wall-clock time of the scan.
    pub timestamp: NaiveDateTime,
    pub turnstile_id: String,
    pub direction: Direction,
}

impl AccessEvent {
    pub fn new(
        area: impl Into<String>,
        timestamp: NaiveDateTime,
        turnstile_id: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            area: area.into(),
            timestamp,
            turnstile_id: turnstile_id.into(),
            direction,
        }
    }
}
