//! Session reconciliation: pairing enter and exit scans per employee.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::event::{AccessEvent, Direction};

/// One continuous occupancy of a restricted area.
///
/// `enter_at` is fixed at creation. The exit is recorded at most once and
/// never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSession {
    restricted_area: String,
    enter_at: NaiveDateTime,
    enter_turnstile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exit_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exit_turnstile: Option<String>,
}

impl AccessSession {
    /// Opens a session with no exit recorded.
    pub fn open(
        restricted_area: impl Into<String>,
        enter_at: NaiveDateTime,
        enter_turnstile: impl Into<String>,
    ) -> Self {
        Self {
            restricted_area: restricted_area.into(),
            enter_at,
            enter_turnstile: enter_turnstile.into(),
            exit_at: None,
            exit_turnstile: None,
        }
    }

    /// Records the exit. Returns false if the session was already closed.
    pub fn close(&mut self, exit_at: NaiveDateTime, exit_turnstile: impl Into<String>) -> bool {
        if !self.is_open() {
            return false;
        }
        self.exit_at = Some(exit_at);
        self.exit_turnstile = Some(exit_turnstile.into());
        true
    }

    pub const fn is_open(&self) -> bool {
        self.exit_at.is_none() && self.exit_turnstile.is_none()
    }

    pub fn restricted_area(&self) -> &str {
        &self.restricted_area
    }

    pub const fn enter_at(&self) -> NaiveDateTime {
        self.enter_at
    }

    pub fn enter_turnstile(&self) -> &str {
        &self.enter_turnstile
    }

    pub const fn exit_at(&self) -> Option<NaiveDateTime> {
        self.exit_at
    }

    pub fn exit_turnstile(&self) -> Option<&str> {
        self.exit_turnstile.as_deref()
    }

    /// Calendar date the session is reported under (the exit date).
    pub fn exit_date(&self) -> Option<NaiveDate> {
        self.exit_at.map(|t| t.date())
    }

    /// Whole seconds between enter and exit. May be negative for bad data.
    pub fn duration_seconds(&self) -> Option<i64> {
        self.exit_at.map(|exit| (exit - self.enter_at).num_seconds())
    }
}

/// What applying one event did to an employee's sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new open session was appended.
    Opened,
    /// The latest session was closed.
    Closed,
    /// Exit with no session to close; the event was dropped.
    OrphanExit,
    /// Exit while the latest session is already closed; the event was dropped.
    DuplicateExit,
    /// Rejected or unrecognized scan; nothing changed.
    Ignored,
}

impl ApplyOutcome {
    /// True for outcomes that indicate a data-quality problem.
    pub const fn is_anomaly(self) -> bool {
        matches!(self, Self::OrphanExit | Self::DuplicateExit)
    }
}

/// All sessions of one employee found in one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeAccess {
    pub name: String,
    pub unit: String,
    /// Badge/card number, when the export carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub sessions: Vec<AccessSession>,
}

impl EmployeeAccess {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            badge: None,
            sessions: Vec::new(),
        }
    }

    /// Applies one classified event in source order.
    ///
    /// The latest appended session is the only candidate for an exit,
    /// whatever area it was opened in.
    pub fn apply(&mut self, event: &AccessEvent) -> ApplyOutcome {
        match event.direction {
            Direction::Enter => {
                self.sessions.push(AccessSession::open(
                    event.area.clone(),
                    event.timestamp,
                    event.turnstile_id.clone(),
                ));
                ApplyOutcome::Opened
            }
            Direction::Exit => match self.sessions.last_mut() {
                None => ApplyOutcome::OrphanExit,
                Some(last) => {
                    if last.close(event.timestamp, event.turnstile_id.clone()) {
                        ApplyOutcome::Closed
                    } else {
                        ApplyOutcome::DuplicateExit
                    }
                }
            },
            Direction::Ignored => ApplyOutcome::Ignored,
        }
    }

    pub fn open_sessions(&self) -> impl Iterator<Item = &AccessSession> {
        self.sessions.iter().filter(|s| s.is_open())
    }

    pub fn closed_sessions(&self) -> impl Iterator<Item = &AccessSession> {
        self.sessions.iter().filter(|s| !s.is_open())
    }
}
