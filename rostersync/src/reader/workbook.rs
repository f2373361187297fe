//! Sheet data structures

use crate::address::ColumnId;
use std::collections::BTreeMap;

/// Represents a worksheet.
///
/// Coordinates are 1-based, matching the row numbers users see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub cells: BTreeMap<(u32, ColumnId), Cell>,
    /// Custom row heights keyed by row
    pub row_heights: BTreeMap<u32, f64>,
    /// Merged cell ranges
    pub merged_cells: Vec<MergedRange>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cell at the given position
    pub fn get_cell(&self, row: u32, col: ColumnId) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Value at the given position, `Empty` when the cell does not exist
    pub fn value(&self, row: u32, col: ColumnId) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells
            .get(&(row, col))
            .map(|c| &c.value)
            .unwrap_or(&EMPTY)
    }

    pub fn set_cell(&mut self, row: u32, col: ColumnId, cell: Cell) {
        self.cells.insert((row, col), cell);
    }

    /// Largest (row, column) holding a cell
    pub fn extent(&self) -> Option<(u32, ColumnId)> {
        let max_row = self.cells.keys().map(|(r, _)| *r).max()?;
        let max_col = self.cells.keys().map(|(_, c)| *c).max()?;
        Some((max_row, max_col))
    }
}

/// Represents a single cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    /// Index into the workbook's cell formats (`s` attribute)
    pub style: Option<u32>,
}

impl Cell {
    pub fn new(value: CellValue, style: Option<u32>) -> Self {
        Self { value, style }
    }
}

/// Cell value types
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Formula text including the leading `=`
    Formula(String),
    /// Error literal such as `#N/A`
    Error(String),
}

impl CellValue {
    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Check if the cell contains a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    /// Create a formula value, adding the leading `=` when missing
    pub fn formula(f: impl Into<String>) -> Self {
        let f = f.into();
        if f.starts_with('=') {
            CellValue::Formula(f)
        } else {
            CellValue::Formula(format!("={}", f))
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Interpret the value as a positive integer identifier.
    ///
    /// Numbers qualify when they have no fractional part, text when it is
    /// made of ASCII digits only (surrounding whitespace is ignored).
    pub fn as_positive_id(&self) -> Option<u64> {
        match self {
            CellValue::Number(n) if n.fract() == 0.0 && *n >= 1.0 && *n < u64::MAX as f64 => {
                Some(*n as u64)
            }
            CellValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() || !s.chars().all(|ch| ch.is_ascii_digit()) {
                    return None;
                }
                s.parse::<u64>().ok().filter(|id| *id > 0)
            }
            _ => None,
        }
    }

    /// Text used when ordering rows; `None` for empty values
    pub fn sort_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) if s.is_empty() => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::Boolean(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            CellValue::Formula(f) => Some(f.clone()),
            CellValue::Error(e) => Some(e.clone()),
        }
    }
}

/// A merged range with inclusive corners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRange {
    pub first_row: u32,
    pub first_col: ColumnId,
    pub last_row: u32,
    pub last_col: ColumnId,
}

impl MergedRange {
    /// True when every row of the range lies in `[start, end)`
    pub fn within_rows(&self, start: u32, end: u32) -> bool {
        self.first_row >= start && self.last_row < end
    }

    /// Move the range down (or up) by `delta` rows
    pub fn shifted(&self, delta: i64) -> Option<MergedRange> {
        let first_row = u32::try_from(i64::from(self.first_row) + delta).ok()?;
        let last_row = u32::try_from(i64::from(self.last_row) + delta).ok()?;
        (first_row >= 1).then_some(MergedRange {
            first_row,
            last_row,
            ..*self
        })
    }

    /// A1 range string ("A1:C2")
    pub fn to_ref(&self) -> String {
        format!(
            "{}:{}",
            self.first_col.at(self.first_row),
            self.last_col.at(self.last_row)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_ids() {
        assert_eq!(CellValue::Number(3.0).as_positive_id(), Some(3));
        assert_eq!(CellValue::text(" 12 ").as_positive_id(), Some(12));
        assert_eq!(CellValue::Number(2.5).as_positive_id(), None);
        assert_eq!(CellValue::Number(0.0).as_positive_id(), None);
        assert_eq!(CellValue::Number(-4.0).as_positive_id(), None);
        assert_eq!(CellValue::text("-4").as_positive_id(), None);
        assert_eq!(CellValue::text("Total").as_positive_id(), None);
        assert_eq!(CellValue::text("").as_positive_id(), None);
        assert_eq!(CellValue::Empty.as_positive_id(), None);
        assert_eq!(CellValue::formula("=1+1").as_positive_id(), None);
    }

    #[test]
    fn test_merged_range_shift() {
        let range = MergedRange {
            first_row: 8,
            first_col: "A".parse().unwrap(),
            last_row: 9,
            last_col: "C".parse().unwrap(),
        };
        assert!(range.within_rows(8, 10));
        assert!(!range.within_rows(8, 9));
        assert_eq!(range.shifted(2).unwrap().to_ref(), "A10:C11");
        assert_eq!(range.shifted(-3).unwrap().to_ref(), "A5:C6");
        assert!(range.shifted(-8).is_none());
    }
}
