//! Reading ACS exports into raw sheets.

use std::path::Path;

use acs_core::{CellValue, EmployeeAccess, RawRow, RawSheet, ReaderConfig, interpret_sheets};
use calamine::{Data, ExcelDateTime, Range, Reader, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::XlsxError;

/// File extensions the reader can open (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Returns true if the path has a spreadsheet extension we can read.
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

#[allow(clippy::float_cmp)]
fn convert_datetime(value: &ExcelDateTime) -> CellValue {
    let Some(dt) = value.as_datetime() else {
        return CellValue::Number(value.as_f64());
    };
    let serial = value.as_f64();
    if serial < 1.0 {
        CellValue::Time(dt.time())
    } else if serial.fract() == 0.0 {
        CellValue::Date(dt.date())
    } else {
        CellValue::DateTime(dt)
    }
}

fn convert_iso(value: &str) -> CellValue {
    if let Ok(dt) = value.parse::<NaiveDateTime>() {
        CellValue::DateTime(dt)
    } else if let Ok(d) = value.parse::<NaiveDate>() {
        CellValue::Date(d)
    } else if let Ok(t) = value.parse::<NaiveTime>() {
        CellValue::Time(t)
    } else {
        CellValue::text(value)
    }
}

#[allow(clippy::cast_precision_loss)]
fn convert_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::text(s),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => convert_datetime(dt),
        Data::DateTimeIso(s) => convert_iso(s),
        Data::DurationIso(s) => CellValue::text(s),
    }
}

/// Converts a worksheet range into rows with absolute 1-based numbering.
///
/// Every row spans all columns from `A` to the last used column, so cell
/// positions match the configured column numbers.
fn convert_range(name: &str, range: &Range<Data>, row_first: usize) -> RawSheet {
    let (Some(start), Some(end)) = (range.start(), range.end()) else {
        return RawSheet {
            name: name.to_string(),
            width: 0,
            rows: Vec::new(),
        };
    };
    let width = end.1 as usize + 1;
    let first = u32::try_from(row_first.saturating_sub(1)).unwrap_or(u32::MAX).max(start.0);

    let rows = (first..=end.0)
        .map(|row| {
            let cells = (0..=end.1).map(|col| {
                range
                    .get_value((row, col))
                    .map_or(CellValue::Empty, convert_cell)
            });
            RawRow::new(row as usize + 1, cells)
        })
        .collect();

    RawSheet {
        name: name.to_string(),
        width,
        rows,
    }
}

/// Reads every worksheet of a workbook, starting at `row_first`.
///
/// The file handle is released before this returns.
pub fn read_sheets(path: &Path, row_first: usize) -> Result<Vec<RawSheet>, XlsxError> {
    let mut workbook = open_workbook_auto(path)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let sheet = convert_range(&name, &range, row_first);
        tracing::debug!(path = %path.display(), sheet = %name, rows = sheet.rows.len(), "read worksheet");
        sheets.push(sheet);
    }
    Ok(sheets)
}

/// Reads one ACS export and reconciles its sessions.
pub fn parse_file(path: &Path, config: &ReaderConfig) -> Result<Vec<EmployeeAccess>, XlsxError> {
    tracing::info!(path = %path.display(), "parsing file");
    let sheets = read_sheets(path, config.row_first)?;
    Ok(interpret_sheets(&sheets, config)?)
}
