//! Report workbook writer.

use std::collections::HashSet;
use std::path::Path;

use acs_core::{Aggregate, UnitMatrix, format_hms};
use chrono::NaiveDate;
use rust_xlsxwriter::utility::column_number_to_name;
use rust_xlsxwriter::{Color, Format, Formula, Workbook, Worksheet};

use crate::XlsxError;

/// Name of the leading sheet holding the seconds converter.
pub const CONVERTER_SHEET_NAME: &str = "converter";

/// Excel sheet name maximum length.
const N_LEN_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
const ILLEGAL_SHEET_CHARS: [char; 7] = ['*', ':', '?', '/', '\\', '[', ']'];

/// Header rows: employee name, badge.
const N_HEADER_ROWS: usize = 2;
/// Leading date column.
const N_HEADER_COLS: usize = 1;

/// Sample value shown in the converter block.
const CONVERTER_SAMPLE_SECONDS: i64 = 123_456;

const COLOR_HEADER: u32 = 0x00A4_FFA4;
const COLOR_DATE: u32 = 0x00FF_CC00;
const COLOR_TOTAL: u32 = 0x00C0_C0C0;

/// Makes a unit name usable as a worksheet name.
pub fn sanitize_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if ILLEGAL_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let truncated: String = trim_sheet_name(&replaced)
        .chars()
        .take(N_LEN_SHEET_NAME_MAX)
        .collect();
    let trimmed = trim_sheet_name(&truncated);
    if trimmed.is_empty() {
        return "Sheet".to_string();
    }
    trimmed.to_string()
}

/// Strips what Excel refuses at either end of a sheet name.
fn trim_sheet_name(name: &str) -> &str {
    name.trim().trim_matches('\'').trim()
}

fn cast_row_num(value: usize) -> Result<u32, XlsxError> {
    u32::try_from(value).map_err(|_| XlsxError::Overflow { what: "row", value })
}

fn cast_col_num(value: usize) -> Result<u16, XlsxError> {
    u16::try_from(value).map_err(|_| XlsxError::Overflow { what: "column", value })
}

/// Spreadsheet address of a 0-based cell, e.g. `(2, 1)` is `B3`.
fn cell_name(row: usize, col: usize) -> Result<String, XlsxError> {
    Ok(format!("{}{}", column_number_to_name(cast_col_num(col)?), row + 1))
}

#[allow(clippy::cast_precision_loss)]
fn seconds_as_number(seconds: i64) -> f64 {
    seconds as f64
}

/// Writes the seconds → hours/minutes/seconds helper at the top-left of a sheet.
fn write_converter_block(worksheet: &mut Worksheet) -> Result<(), XlsxError> {
    let sample = CONVERTER_SAMPLE_SECONDS;
    let hours = sample / 3600;
    let minutes = (sample - hours * 3600) / 60;
    let seconds = sample - hours * 3600 - minutes * 60;

    worksheet.write_string(0, 0, "total_seconds")?;
    worksheet.write_number(0, 1, seconds_as_number(sample))?;
    worksheet.write_string(2, 0, "hours")?;
    worksheet.write_formula(2, 1, Formula::new("=INT(B1/60/60)").set_result(hours.to_string()))?;
    worksheet.write_string(3, 0, "minutes")?;
    worksheet.write_formula(
        3,
        1,
        Formula::new("=INT((B1-B3*60*60)/60)").set_result(minutes.to_string()),
    )?;
    worksheet.write_string(4, 0, "seconds")?;
    worksheet.write_formula(
        4,
        1,
        Formula::new("=B1-B3*60*60-B4*60").set_result(seconds.to_string()),
    )?;
    worksheet.write_string(6, 0, "[HH]:MM:SS")?;
    worksheet.write_formula(
        6,
        1,
        Formula::new(r#"=TEXT(B3,"00")&":"&TEXT(B4,"00")&":"&TEXT(B5,"00")"#)
            .set_result(format_hms(sample)),
    )?;
    worksheet.set_column_width(0, 14)?;
    Ok(())
}

/// Builds the report workbook sheet by sheet.
///
/// The workbook is buffered in memory until [`Self::save`] is called.
pub struct ReportWriter {
    workbook: Workbook,
    fmt_header: Format,
    fmt_date: Format,
    fmt_total: Format,
    sheet_names: HashSet<String>,
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportWriter {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            fmt_header: Format::new().set_background_color(Color::RGB(COLOR_HEADER)),
            fmt_date: Format::new()
                .set_num_format("dd.mm.yyyy")
                .set_background_color(Color::RGB(COLOR_DATE)),
            fmt_total: Format::new().set_background_color(Color::RGB(COLOR_TOTAL)),
            sheet_names: HashSet::new(),
        }
    }

    /// Returns a sanitized sheet name not used yet in this workbook.
    ///
    /// Excel compares sheet names case-insensitively.
    fn unique_sheet_name(&mut self, name: &str) -> String {
        let base = sanitize_sheet_name(name);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.sheet_names.contains(&candidate.to_lowercase()) {
            let suffix = format!(" ({n})");
            let keep = N_LEN_SHEET_NAME_MAX - suffix.chars().count();
            let head: String = base.chars().take(keep).collect();
            let head = match trim_sheet_name(&head) {
                "" => "Sheet",
                head => head,
            };
            candidate = format!("{head}{suffix}");
            n += 1;
        }
        self.sheet_names.insert(candidate.to_lowercase());
        candidate
    }

    /// Adds the standalone converter sheet.
    pub fn write_converter(&mut self) -> Result<(), XlsxError> {
        let name = self.unique_sheet_name(CONVERTER_SHEET_NAME);
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&name)?;
        write_converter_block(worksheet)
    }

    /// Adds one unit sheet: dates down, employees across, totals last.
    ///
    /// A unit with no dates or no employees gets the converter block instead.
    pub fn write_unit(&mut self, matrix: &UnitMatrix, dates: &[NaiveDate]) -> Result<(), XlsxError> {
        let name = self.unique_sheet_name(matrix.unit());
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&name)?;

        let employees = matrix.employees();
        if dates.is_empty() || employees.is_empty() {
            tracing::debug!(unit = matrix.unit(), sheet = %name, "unit has no data");
            return write_converter_block(worksheet);
        }

        for (idx, employee) in employees.iter().enumerate() {
            let col = cast_col_num(N_HEADER_COLS + idx)?;
            worksheet.write_string_with_format(0, col, &employee.name, &self.fmt_header)?;
            match &employee.badge {
                Some(badge) => {
                    worksheet.write_string_with_format(1, col, badge, &self.fmt_header)?;
                }
                None => {
                    worksheet.write_blank(1, col, &self.fmt_header)?;
                }
            }
        }

        let first_data_col = N_HEADER_COLS;
        let last_data_col = N_HEADER_COLS + employees.len() - 1;
        let total_col = last_data_col + 1;
        let first_data_row = N_HEADER_ROWS;
        let last_data_row = N_HEADER_ROWS + dates.len() - 1;
        let total_row = last_data_row + 1;

        for (date_idx, &date) in dates.iter().enumerate() {
            let row_idx = first_data_row + date_idx;
            let row = cast_row_num(row_idx)?;
            worksheet.write_datetime_with_format(row, 0, &date, &self.fmt_date)?;
            for col_idx in 0..employees.len() {
                if let Some(seconds) = matrix.seconds(date, col_idx) {
                    worksheet.write_number(
                        row,
                        cast_col_num(first_data_col + col_idx)?,
                        seconds_as_number(seconds),
                    )?;
                }
            }
            let formula = format!(
                "=SUM({}:{})",
                cell_name(row_idx, first_data_col)?,
                cell_name(row_idx, last_data_col)?
            );
            worksheet.write_formula_with_format(
                row,
                cast_col_num(total_col)?,
                Formula::new(formula).set_result(matrix.row_total(date).to_string()),
                &self.fmt_total,
            )?;
        }

        for col_idx in first_data_col..=total_col {
            let total = if col_idx == total_col {
                matrix.grand_total()
            } else {
                matrix.column_total(col_idx - first_data_col)
            };
            let formula = format!(
                "=SUM({}:{})",
                cell_name(first_data_row, col_idx)?,
                cell_name(last_data_row, col_idx)?
            );
            worksheet.write_formula_with_format(
                cast_row_num(total_row)?,
                cast_col_num(col_idx)?,
                Formula::new(formula).set_result(total.to_string()),
                &self.fmt_total,
            )?;
        }

        worksheet.set_column_width(0, 12)?;
        worksheet.set_freeze_panes(cast_row_num(N_HEADER_ROWS)?, cast_col_num(N_HEADER_COLS)?)?;
        Ok(())
    }

    /// Writes the converter sheet followed by one sheet per unit.
    pub fn write_aggregate(&mut self, aggregate: &Aggregate) -> Result<(), XlsxError> {
        self.write_converter()?;
        for matrix in aggregate.units() {
            self.write_unit(matrix, aggregate.dates())?;
        }
        Ok(())
    }

    /// Flushes the workbook to disk.
    pub fn save(mut self, path: &Path) -> Result<(), XlsxError> {
        self.workbook.save(path)?;
        Ok(())
    }
}

/// Writes the complete report for an aggregate.
pub fn write_report(aggregate: &Aggregate, path: &Path) -> Result<(), XlsxError> {
    let mut writer = ReportWriter::new();
    writer.write_aggregate(aggregate)?;
    writer.save(path)?;
    tracing::info!(path = %path.display(), units = aggregate.units().len(), "report written");
    Ok(())
}
