//! Raw tabular rows as handed over by a spreadsheet reader.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A single cell value, independent of the spreadsheet backend.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Builds a text cell, trimming surrounding whitespace.
    pub fn text(value: impl AsRef<str>) -> Self {
        Self::Text(value.as_ref().trim().to_string())
    }

    /// Returns true for empty cells and blank strings.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Renders the cell as trimmed text. Empty cells become an empty string.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            // Whole numbers (turnstile numbers, badge numbers) print without a fraction.
            #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format("%d.%m.%Y")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%d.%m.%Y %H:%M:%S")),
        }
    }
}

static EMPTY: CellValue = CellValue::Empty;

/// One sheet row with 1-based cell addressing. Index 0 is reserved.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based row number within the sheet.
    pub number: usize,
    cells: Vec<CellValue>,
}

impl RawRow {
    pub fn new(number: usize, cells: impl IntoIterator<Item = CellValue>) -> Self {
        let cells = std::iter::once(CellValue::Empty).chain(cells).collect();
        Self { number, cells }
    }

    /// Number of real cells in the row (excluding the reserved slot).
    pub fn width(&self) -> usize {
        self.cells.len() - 1
    }

    /// Returns the cell at a 1-based column, or an empty cell when out of range.
    pub fn get(&self, column: usize) -> &CellValue {
        if column == 0 {
            return &EMPTY;
        }
        self.cells.get(column).unwrap_or(&EMPTY)
    }
}

/// All rows of one worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    /// Column count of the sheet. Rows narrower than this are skipped.
    pub width: usize,
    pub rows: Vec<RawRow>,
}
