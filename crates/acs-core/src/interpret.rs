//! Turning raw sheet rows into per-employee sessions.
//!
//! Rows are processed strictly in source order: within one file the order
//! of rows is the only reliable ordering of scans that share a timestamp.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::{Classifier, ClassifierConfig};
use crate::event::AccessEvent;
use crate::row::{CellValue, RawRow, RawSheet};
use crate::session::{ApplyOutcome, EmployeeAccess};

/// Textual date format used by ACS exports.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Textual time format used by ACS exports.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Invalid reader configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("row_first must be at least 1")]
    RowFirst,

    #[error("{field} must be a 1-based column index")]
    Column { field: &'static str },

    #[error("status_success_prefix cannot be empty")]
    EmptySuccessPrefix,

    #[error("{field} must list at least one non-empty prefix")]
    EmptyPrefixes { field: &'static str },
}

/// Errors that abort the parse of one input file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("sheet {sheet:?} row {row}: cannot parse date {value:?} (expected dd.mm.yyyy)")]
    InvalidDate {
        sheet: String,
        row: usize,
        value: String,
    },

    #[error("sheet {sheet:?} row {row}: cannot parse time {value:?} (expected hh:mm:ss)")]
    InvalidTime {
        sheet: String,
        row: usize,
        value: String,
    },

    #[error("sheet {sheet:?} row {row}: {field} cell is empty")]
    MissingCell {
        sheet: String,
        row: usize,
        field: &'static str,
    },
}

/// Column roles and classification rules for one ACS export layout.
///
/// Column indices are 1-based, matching spreadsheet column numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// First data row (1-based); rows above it are headers.
    pub row_first: usize,
    pub col_name: usize,
    pub col_unit: usize,
    pub col_date: usize,
    pub col_time: usize,
    pub col_status: usize,
    pub col_turnstile: usize,
    pub col_direction: usize,
    pub col_area: usize,
    /// Optional badge/card number column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_badge: Option<usize>,
    #[serde(flatten)]
    pub classifier: ClassifierConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            row_first: 2,
            col_name: 1,
            col_unit: 2,
            col_date: 3,
            col_time: 4,
            col_status: 5,
            col_turnstile: 6,
            col_direction: 7,
            col_area: 8,
            col_badge: None,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl ReaderConfig {
    /// Checks the layout. Overlapping direction prefixes are not an error
    /// here; see [`Classifier::overlapping_prefixes`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.row_first == 0 {
            return Err(ConfigError::RowFirst);
        }
        let columns = [
            ("col_name", self.col_name),
            ("col_unit", self.col_unit),
            ("col_date", self.col_date),
            ("col_time", self.col_time),
            ("col_status", self.col_status),
            ("col_turnstile", self.col_turnstile),
            ("col_direction", self.col_direction),
            ("col_area", self.col_area),
            ("col_badge", self.col_badge.unwrap_or(1)),
        ];
        if let Some(&(field, _)) = columns.iter().find(|(_, col)| *col == 0) {
            return Err(ConfigError::Column { field });
        }
        if self.classifier.status_success_prefix.trim().is_empty() {
            return Err(ConfigError::EmptySuccessPrefix);
        }
        let prefix_sets = [
            ("direction_plus_prefixes", &self.classifier.direction_plus_prefixes),
            ("direction_minus_prefixes", &self.classifier.direction_minus_prefixes),
        ];
        for (field, prefixes) in prefix_sets {
            if prefixes.is_empty() || prefixes.iter().any(|p| p.trim().is_empty()) {
                return Err(ConfigError::EmptyPrefixes { field });
            }
        }
        Ok(())
    }
}

fn parse_date(cell: &CellValue, sheet: &str, row: usize) -> Result<NaiveDate, ParseError> {
    let invalid = || ParseError::InvalidDate {
        sheet: sheet.to_string(),
        row,
        value: cell.to_text(),
    };
    match cell {
        c if c.is_empty() => Err(ParseError::MissingCell {
            sheet: sheet.to_string(),
            row,
            field: "date",
        }),
        CellValue::Date(d) => Ok(*d),
        CellValue::DateTime(dt) => Ok(dt.date()),
        CellValue::Text(s) => {
            tracing::warn!(sheet, row, value = %s, "parsing textual date cell");
            NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

fn parse_time(cell: &CellValue, sheet: &str, row: usize) -> Result<NaiveTime, ParseError> {
    let invalid = || ParseError::InvalidTime {
        sheet: sheet.to_string(),
        row,
        value: cell.to_text(),
    };
    match cell {
        c if c.is_empty() => Err(ParseError::MissingCell {
            sheet: sheet.to_string(),
            row,
            field: "time",
        }),
        CellValue::Time(t) => Ok(*t),
        CellValue::DateTime(dt) => Ok(dt.time()),
        CellValue::Text(s) => {
            tracing::warn!(sheet, row, value = %s, "parsing textual time cell");
            NaiveTime::parse_from_str(s, TIME_FORMAT).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

/// Accumulates employees and their sessions while rows of one file stream in.
#[derive(Debug)]
pub struct RowInterpreter<'a> {
    config: &'a ReaderConfig,
    classifier: Classifier,
    employees: Vec<EmployeeAccess>,
    index: HashMap<(String, String), usize>,
    anomalies: usize,
}

impl<'a> RowInterpreter<'a> {
    pub fn new(config: &'a ReaderConfig) -> Self {
        Self {
            config,
            classifier: Classifier::new(&config.classifier),
            employees: Vec::new(),
            index: HashMap::new(),
            anomalies: 0,
        }
    }

    /// Number of orphan or duplicate exits seen so far.
    pub const fn anomalies(&self) -> usize {
        self.anomalies
    }

    /// Feeds every data row of a sheet, in order.
    pub fn push_sheet(&mut self, sheet: &RawSheet) -> Result<(), ParseError> {
        for row in &sheet.rows {
            if row.number < self.config.row_first || row.width() < sheet.width {
                continue;
            }
            self.push_row(&sheet.name, row)?;
        }
        Ok(())
    }

    /// Interprets one data row. Rows without a name are skipped.
    pub fn push_row(&mut self, sheet: &str, row: &RawRow) -> Result<(), ParseError> {
        let config = self.config;
        if row.get(config.col_name).is_empty() {
            return Ok(());
        }
        let name = row.get(config.col_name).to_text();
        let unit = row.get(config.col_unit).to_text();

        let idx = self.employee_index(name, unit);
        if let Some(col_badge) = config.col_badge {
            let badge = row.get(col_badge);
            let employee = &mut self.employees[idx];
            if employee.badge.is_none() && !badge.is_empty() {
                employee.badge = Some(badge.to_text());
            }
        }

        let date = parse_date(row.get(config.col_date), sheet, row.number)?;
        let time = parse_time(row.get(config.col_time), sheet, row.number)?;
        let timestamp = NaiveDateTime::new(date, time);

        let status = row.get(config.col_status).to_text();
        let direction_code = row.get(config.col_direction).to_text();
        let direction = self.classifier.classify(&status, &direction_code);
        let event = AccessEvent::new(
            row.get(config.col_area).to_text(),
            timestamp,
            row.get(config.col_turnstile).to_text(),
            direction,
        );

        let employee = &mut self.employees[idx];
        match employee.apply(&event) {
            ApplyOutcome::OrphanExit => {
                self.anomalies += 1;
                tracing::error!(
                    name = %employee.name,
                    unit = %employee.unit,
                    direction = %direction_code,
                    timestamp = %event.timestamp,
                    turnstile = %event.turnstile_id,
                    sheet,
                    row = row.number,
                    "exit before enter"
                );
            }
            ApplyOutcome::DuplicateExit => {
                self.anomalies += 1;
                tracing::debug!(
                    name = %employee.name,
                    unit = %employee.unit,
                    timestamp = %event.timestamp,
                    turnstile = %event.turnstile_id,
                    "dropping exit for an already closed session"
                );
            }
            ApplyOutcome::Opened | ApplyOutcome::Closed | ApplyOutcome::Ignored => {}
        }
        Ok(())
    }

    fn employee_index(&mut self, name: String, unit: String) -> usize {
        let key = (name, unit);
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.employees.len();
        self.employees.push(EmployeeAccess::new(key.0.clone(), key.1.clone()));
        self.index.insert(key, idx);
        idx
    }

    /// Returns employees in first-seen order.
    pub fn finish(self) -> Vec<EmployeeAccess> {
        self.employees
    }
}

/// Interprets all sheets of one file.
///
/// Any unparsable timestamp discards the whole file's results.
pub fn interpret_sheets(
    sheets: &[RawSheet],
    config: &ReaderConfig,
) -> Result<Vec<EmployeeAccess>, ParseError> {
    let mut interpreter = RowInterpreter::new(config);
    for sheet in sheets {
        interpreter.push_sheet(sheet)?;
    }
    Ok(interpreter.finish())
}
