//! Folding sessions into per-unit date × employee duration matrices.
//!
//! # Algorithm Summary
//!
//! 1. Collect units (first-seen order) and exit dates of closed sessions (sorted)
//! 2. Give every `(name, unit)` employee a column in its unit's matrix
//! 3. Add each closed session's duration to the cell of its exit date
//!
//! Open sessions and negative durations are reported, never summed.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::EmployeeAccess;

/// What to do with a session whose exit precedes its enter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeDurationPolicy {
    /// Count the session as zero seconds.
    #[default]
    Clamp,
    /// Leave the session out of the sums.
    Skip,
}

/// Counters collected while aggregating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Distinct `(name, unit)` columns across all units.
    pub employees: usize,
    pub closed_sessions: usize,
    /// Sessions without an exit; excluded from the sums.
    pub open_sessions: usize,
    pub negative_durations: usize,
}

/// One employee column of a unit matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeColumn {
    pub name: String,
    pub badge: Option<String>,
}

/// Sparse date × employee matrix of accumulated seconds for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMatrix {
    unit: String,
    employees: Vec<EmployeeColumn>,
    columns: HashMap<String, usize>,
    cells: HashMap<(NaiveDate, usize), i64>,
}

impl UnitMatrix {
    fn new(unit: String) -> Self {
        Self {
            unit,
            employees: Vec::new(),
            columns: HashMap::new(),
            cells: HashMap::new(),
        }
    }

    fn column_for(&mut self, employee: &EmployeeAccess) -> usize {
        if let Some(&col) = self.columns.get(&employee.name) {
            let column = &mut self.employees[col];
            // Smallest badge wins regardless of file order.
            if let Some(badge) = &employee.badge {
                if column.badge.as_ref().is_none_or(|current| badge < current) {
                    column.badge = Some(badge.clone());
                }
            }
            return col;
        }
        let col = self.employees.len();
        self.employees.push(EmployeeColumn {
            name: employee.name.clone(),
            badge: employee.badge.clone(),
        });
        self.columns.insert(employee.name.clone(), col);
        col
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Columns in first-seen order.
    pub fn employees(&self) -> &[EmployeeColumn] {
        &self.employees
    }

    /// Column index of an employee by name.
    pub fn column_of(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Accumulated seconds for a cell, or `None` if nothing was recorded.
    pub fn seconds(&self, date: NaiveDate, column: usize) -> Option<i64> {
        self.cells.get(&(date, column)).copied()
    }

    /// Accumulated seconds for a cell addressed by employee name.
    pub fn seconds_for(&self, date: NaiveDate, name: &str) -> Option<i64> {
        self.column_of(name).and_then(|col| self.seconds(date, col))
    }

    /// Sum across all employees for one date.
    pub fn row_total(&self, date: NaiveDate) -> i64 {
        self.cells
            .iter()
            .filter(|((d, _), _)| *d == date)
            .map(|(_, secs)| secs)
            .sum()
    }

    /// Sum across all dates for one employee column.
    pub fn column_total(&self, column: usize) -> i64 {
        self.cells
            .iter()
            .filter(|((_, c), _)| *c == column)
            .map(|(_, secs)| secs)
            .sum()
    }

    pub fn grand_total(&self) -> i64 {
        self.cells.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// The full report: one matrix per unit sharing a global date axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    dates: Vec<NaiveDate>,
    units: Vec<UnitMatrix>,
    stats: AggregateStats,
}

impl Aggregate {
    /// Builds the matrices from employee records of any number of files.
    pub fn build(records: &[EmployeeAccess], policy: NegativeDurationPolicy) -> Self {
        let dates: BTreeSet<NaiveDate> = records
            .iter()
            .flat_map(|e| e.sessions.iter().filter_map(|s| s.exit_date()))
            .collect();

        let mut units: Vec<UnitMatrix> = Vec::new();
        let mut unit_index: HashMap<&str, usize> = HashMap::new();
        let mut stats = AggregateStats::default();

        for employee in records {
            let unit_idx = *unit_index.entry(employee.unit.as_str()).or_insert_with(|| {
                units.push(UnitMatrix::new(employee.unit.clone()));
                units.len() - 1
            });
            let matrix = &mut units[unit_idx];
            let col = matrix.column_for(employee);

            for session in &employee.sessions {
                let (Some(date), Some(seconds)) = (session.exit_date(), session.duration_seconds())
                else {
                    stats.open_sessions += 1;
                    tracing::error!(
                        name = %employee.name,
                        unit = %employee.unit,
                        enter_at = %session.enter_at(),
                        turnstile = %session.enter_turnstile(),
                        area = %session.restricted_area(),
                        "no exit for enter event"
                    );
                    continue;
                };
                stats.closed_sessions += 1;

                let seconds = if seconds < 0 {
                    stats.negative_durations += 1;
                    tracing::error!(
                        name = %employee.name,
                        unit = %employee.unit,
                        enter_at = %session.enter_at(),
                        exit_at = %date,
                        seconds,
                        ?policy,
                        "exit precedes enter"
                    );
                    match policy {
                        NegativeDurationPolicy::Clamp => 0,
                        NegativeDurationPolicy::Skip => continue,
                    }
                } else {
                    seconds
                };
                *matrix.cells.entry((date, col)).or_insert(0) += seconds;
            }
        }

        stats.employees = units.iter().map(|u| u.employees.len()).sum();
        Self {
            dates: dates.into_iter().collect(),
            units,
            stats,
        }
    }

    /// All exit dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Unit matrices in first-seen order.
    pub fn units(&self) -> &[UnitMatrix] {
        &self.units
    }

    pub fn unit(&self, unit: &str) -> Option<&UnitMatrix> {
        self.units.iter().find(|u| u.unit == unit)
    }

    pub const fn stats(&self) -> AggregateStats {
        self.stats
    }
}

/// Distinct units in first-seen order.
///
/// A single ACS export is expected to cover one unit.
pub fn distinct_units(records: &[EmployeeAccess]) -> Vec<&str> {
    let mut units: Vec<&str> = Vec::new();
    for record in records {
        if !units.contains(&record.unit.as_str()) {
            units.push(&record.unit);
        }
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AccessSession;
    use chrono::NaiveDateTime;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn closed(enter: NaiveDateTime, exit: NaiveDateTime) -> AccessSession {
        let mut session = AccessSession::open("Lobby", enter, "T1");
        session.close(exit, "T2");
        session
    }

    fn employee(name: &str, unit: &str, sessions: Vec<AccessSession>) -> EmployeeAccess {
        EmployeeAccess {
            sessions,
            ..EmployeeAccess::new(name, unit)
        }
    }

    #[test]
    fn test_full_day_is_28800_seconds() {
        let records = vec![employee("Alice", "UnitA", vec![closed(at(1, 9, 0), at(1, 17, 0))])];

        let aggregate = Aggregate::build(&records, NegativeDurationPolicy::default());

        assert_eq!(aggregate.dates(), &[date(1)]);
        let unit = aggregate.unit("UnitA").unwrap();
        assert_eq!(unit.employees().len(), 1);
        assert_eq!(unit.seconds_for(date(1), "Alice"), Some(28_800));
        assert_eq!(unit.grand_total(), 28_800);
    }

    #[test]
    fn test_sessions_on_same_date_accumulate() {
        let records = vec![employee(
            "Alice",
            "UnitA",
            vec![
                closed(at(1, 9, 0), at(1, 10, 0)),
                closed(at(1, 13, 0), at(1, 13, 30)),
            ],
        )];

        let aggregate = Aggregate::build(&records, NegativeDurationPolicy::default());

        let unit = aggregate.unit("UnitA").unwrap();
        assert_eq!(unit.seconds_for(date(1), "Alice"), Some(5400));
    }

    #[test]
    fn test_open_session_contributes_nothing() {
        let records = vec![
            employee("Alice", "UnitA", vec![AccessSession::open("Lobby", at(2, 9, 0), "T1")]),
            employee("Bob", "UnitA", vec![closed(at(1, 9, 0), at(1, 9, 10))]),
        ];

        let aggregate = Aggregate::build(&records, NegativeDurationPolicy::default());

        assert_eq!(aggregate.dates(), &[date(1)]);
        let unit = aggregate.unit("UnitA").unwrap();
        // Alice still gets a column, with no values.
        assert_eq!(unit.column_of("Alice"), Some(0));
        assert_eq!(unit.column_total(0), 0);
        assert_eq!(unit.seconds_for(date(1), "Alice"), None);
        assert_eq!(aggregate.stats().open_sessions, 1);
        assert_eq!(aggregate.stats().closed_sessions, 1);
    }

    #[test]
    fn test_overnight_session_counts_on_exit_date() {
        let records = vec![employee("Alice", "UnitA", vec![closed(at(1, 22, 0), at(2, 2, 0))])];

        let aggregate = Aggregate::build(&records, NegativeDurationPolicy::default());

        assert_eq!(aggregate.dates(), &[date(2)]);
        assert_eq!(
            aggregate.unit("UnitA").unwrap().seconds_for(date(2), "Alice"),
            Some(4 * 3600)
        );
    }

    #[test]
    fn test_dates_are_global_and_sorted() {
        let records = vec![
            employee("Alice", "UnitA", vec![closed(at(3, 9, 0), at(3, 10, 0))]),
            employee("Bob", "UnitB", vec![closed(at(1, 9, 0), at(1, 10, 0))]),
            employee("Carol", "UnitA", vec![closed(at(2, 9, 0), at(2, 10, 0))]),
            employee("Dan", "UnitB", vec![closed(at(3, 11, 0), at(3, 12, 0))]),
        ];

        let aggregate = Aggregate::build(&records, NegativeDurationPolicy::default());

        assert_eq!(aggregate.dates(), &[date(1), date(2), date(3)]);
        let units: Vec<_> = aggregate.units().iter().map(UnitMatrix::unit).collect();
        assert_eq!(units, vec!["UnitA", "UnitB"]);
        let unit_b = aggregate.unit("UnitB").unwrap();
        assert_eq!(unit_b.column_of("Alice"), None);
        assert_eq!(unit_b.row_total(date(3)), 3600);
    }

    #[test]
    fn test_same_employee_from_two_files_shares_a_column() {
        let records = vec![
            employee("Alice", "UnitA", vec![closed(at(1, 9, 0), at(1, 10, 0))]),
            employee("Alice", "UnitA", vec![closed(at(1, 11, 0), at(1, 11, 30))]),
        ];

        let aggregate = Aggregate::build(&records, NegativeDurationPolicy::default());

        let unit = aggregate.unit("UnitA").unwrap();
        assert_eq!(unit.employees().len(), 1);
        assert_eq!(unit.seconds_for(date(1), "Alice"), Some(5400));
        assert_eq!(aggregate.stats().employees, 1);
    }

    #[test]
    fn test_totals() {
        let records = vec![
            employee(
                "Alice",
                "UnitA",
                vec![closed(at(1, 9, 0), at(1, 10, 0)), closed(at(2, 9, 0), at(2, 11, 0))],
            ),
            employee("Bob", "UnitA", vec![closed(at(1, 9, 0), at(1, 9, 30))]),
        ];

        let aggregate = Aggregate::build(&records, NegativeDurationPolicy::default());

        let unit = aggregate.unit("UnitA").unwrap();
        assert_eq!(unit.row_total(date(1)), 5400);
        assert_eq!(unit.row_total(date(2)), 7200);
        assert_eq!(unit.column_total(0), 10_800);
        assert_eq!(unit.column_total(1), 1800);
        assert_eq!(unit.grand_total(), 12_600);
    }

    #[test]
    fn test_negative_duration_clamped_or_skipped() {
        let records = vec![employee(
            "Alice",
            "UnitA",
            vec![closed(at(1, 10, 0), at(1, 9, 0)), closed(at(1, 11, 0), at(1, 11, 10))],
        )];

        let clamped = Aggregate::build(&records, NegativeDurationPolicy::Clamp);
        let skipped = Aggregate::build(&records, NegativeDurationPolicy::Skip);

        assert_eq!(clamped.unit("UnitA").unwrap().grand_total(), 600);
        assert_eq!(skipped.unit("UnitA").unwrap().grand_total(), 600);
        assert_eq!(clamped.stats().negative_durations, 1);
        assert_eq!(skipped.stats().negative_durations, 1);
    }

    #[test]
    fn test_negative_only_cell_is_zero_when_clamped() {
        let records = vec![employee("Alice", "UnitA", vec![closed(at(1, 10, 0), at(1, 9, 0))])];

        let clamped = Aggregate::build(&records, NegativeDurationPolicy::Clamp);
        let skipped = Aggregate::build(&records, NegativeDurationPolicy::Skip);

        assert_eq!(clamped.unit("UnitA").unwrap().seconds_for(date(1), "Alice"), Some(0));
        assert_eq!(skipped.unit("UnitA").unwrap().seconds_for(date(1), "Alice"), None);
    }

    #[test]
    fn test_file_order_does_not_change_cells() {
        let file_a = vec![
            employee("Alice", "UnitA", vec![closed(at(1, 9, 0), at(1, 12, 0))]),
            employee("Bob", "UnitA", vec![closed(at(2, 9, 0), at(2, 9, 45))]),
        ];
        let file_b = vec![
            employee("Bob", "UnitA", vec![closed(at(1, 8, 0), at(1, 8, 20))]),
            employee("Carol", "UnitB", vec![closed(at(3, 9, 0), at(3, 10, 0))]),
        ];
        let ab: Vec<_> = file_a.iter().chain(&file_b).cloned().collect();
        let ba: Vec<_> = file_b.iter().chain(&file_a).cloned().collect();

        let first = Aggregate::build(&ab, NegativeDurationPolicy::default());
        let second = Aggregate::build(&ba, NegativeDurationPolicy::default());

        assert_eq!(first.dates(), second.dates());
        assert_eq!(first.stats(), second.stats());
        for unit in first.units() {
            let other = second.unit(unit.unit()).unwrap();
            for column in unit.employees() {
                for &day in first.dates() {
                    assert_eq!(
                        unit.seconds_for(day, &column.name),
                        other.seconds_for(day, &column.name),
                        "{} {} {day}",
                        unit.unit(),
                        column.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_badge_fills_in_from_later_record() {
        let first = employee("Alice", "UnitA", vec![]);
        let second = EmployeeAccess {
            badge: Some("0042".to_string()),
            ..employee("Alice", "UnitA", vec![])
        };

        let aggregate = Aggregate::build(&[first, second], NegativeDurationPolicy::default());

        let unit = aggregate.unit("UnitA").unwrap();
        assert_eq!(unit.employees()[0].badge.as_deref(), Some("0042"));
        assert!(unit.is_empty());
        assert!(aggregate.dates().is_empty());
    }

    #[test]
    fn test_conflicting_badges_resolve_independently_of_order() {
        let a = EmployeeAccess {
            badge: Some("222".to_string()),
            ..employee("Alice", "UnitA", vec![])
        };
        let b = EmployeeAccess {
            badge: Some("111".to_string()),
            ..employee("Alice", "UnitA", vec![])
        };

        let forward = Aggregate::build(&[a.clone(), b.clone()], NegativeDurationPolicy::default());
        let backward = Aggregate::build(&[b, a], NegativeDurationPolicy::default());

        for aggregate in [&forward, &backward] {
            let unit = aggregate.unit("UnitA").unwrap();
            assert_eq!(unit.employees()[0].badge.as_deref(), Some("111"));
        }
    }

    #[test]
    fn test_distinct_units_keeps_first_seen_order() {
        let records = vec![
            employee("Alice", "UnitB", vec![]),
            employee("Bob", "UnitA", vec![]),
            employee("Carol", "UnitB", vec![]),
        ];

        assert_eq!(distinct_units(&records), vec!["UnitB", "UnitA"]);
    }

    #[test]
    fn test_negative_policy_serde_names() {
        let policy: NegativeDurationPolicy = serde_json::from_str(r#""skip""#).unwrap();
        assert_eq!(policy, NegativeDurationPolicy::Skip);
        assert_eq!(
            serde_json::to_string(&NegativeDurationPolicy::Clamp).unwrap(),
            r#""clamp""#
        );
    }
}
