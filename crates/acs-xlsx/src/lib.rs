//! Spreadsheet I/O for ACS turnstile reports.
//!
//! Reads ACS exports with `calamine` and writes the per-unit report with
//! `rust_xlsxwriter`.
//!
//! # Report Layout
//!
//! Each unit sheet keeps two header rows (employee name, badge) and one
//! leading date column, so data starts at `B3`:
//!
//! ```text
//!            A            B        C        D
//!   1                     Alice    Bob      (row totals)
//!   2                     0042
//!   3   01.01.2024       28800    1800     =SUM(B3:C3)
//!   4   02.01.2024                3600     =SUM(B4:C4)
//!   5                  =SUM(..) =SUM(..)  =SUM(..)
//! ```

mod reader;
mod writer;

use thiserror::Error;

pub use reader::{SUPPORTED_EXTENSIONS, is_supported, parse_file, read_sheets};
pub use writer::{CONVERTER_SHEET_NAME, ReportWriter, sanitize_sheet_name, write_report};

/// Spreadsheet I/O errors.
#[derive(Debug, Error)]
pub enum XlsxError {
    /// The input workbook could not be opened or read.
    #[error("failed to read workbook: {0}")]
    Read(#[from] calamine::Error),
    /// A cell of the input could not be interpreted.
    #[error(transparent)]
    Parse(#[from] acs_core::ParseError),
    /// The report workbook could not be written.
    #[error("failed to write report: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    /// The report does not fit into a worksheet.
    #[error("{what} index overflow: {value}")]
    Overflow { what: &'static str, value: usize },
}
