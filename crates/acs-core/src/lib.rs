//! Core domain logic for ACS turnstile reports.
//!
//! This crate contains the fundamental types and logic for:
//! - Classification: turning status/direction codes into enter/exit scans
//! - Reconciliation: pairing scans into per-employee sessions
//! - Aggregation: summing session durations per unit, date and employee

mod aggregate;
pub mod classify;
pub mod event;
pub mod format;
pub mod interpret;
pub mod row;
pub mod session;

pub use aggregate::{
    Aggregate, AggregateStats, EmployeeColumn, NegativeDurationPolicy, UnitMatrix, distinct_units,
};
pub use classify::{Classifier, ClassifierConfig};
pub use event::{AccessEvent, Direction};
pub use format::format_hms;
pub use interpret::{ConfigError, ParseError, ReaderConfig, RowInterpreter, interpret_sheets};
pub use row::{CellValue, RawRow, RawSheet};
pub use session::{AccessSession, ApplyOutcome, EmployeeAccess};
