//! Column identifiers and A1-style cell coordinates

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Largest column Excel accepts (`XFD`)
pub const MAX_COLUMN: u32 = 16_384;

/// Largest row Excel accepts
pub const MAX_ROW: u32 = 1_048_576;

/// A spreadsheet column, stored as its 1-based index.
///
/// Parsed from and displayed as letters (`A`, `Z`, `AA`). Ordering follows
/// the index, so `Z < AA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(u32);

impl ColumnId {
    /// Column `A`
    pub const FIRST: ColumnId = ColumnId(1);

    /// Create a column from its 1-based index
    pub fn new(index: u32) -> Option<Self> {
        (1..=MAX_COLUMN).contains(&index).then_some(Self(index))
    }

    /// 1-based column index
    pub fn index(self) -> u32 {
        self.0
    }

    /// Column letters (1 -> "A", 27 -> "AA")
    pub fn letters(self) -> String {
        let mut c = self.0;
        let mut letters = String::new();
        while c > 0 {
            let m = (c - 1) % 26;
            letters.insert(0, (b'A' + m as u8) as char);
            c = (c - m) / 26;
        }
        letters
    }

    /// A1 coordinate for this column at the given 1-based row
    pub fn at(self, row: u32) -> String {
        format!("{}{}", self.letters(), row)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters())
    }
}

/// Error returned when a column name is not made of letters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColumn(pub String);

impl fmt::Display for InvalidColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid column name '{}'", self.0)
    }
}

impl std::error::Error for InvalidColumn {}

impl FromStr for ColumnId {
    type Err = InvalidColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(InvalidColumn(s.to_string()));
        }
        let mut col = 0u32;
        for ch in trimmed.chars() {
            col = col
                .checked_mul(26)
                .and_then(|c| c.checked_add(ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1))
                .ok_or_else(|| InvalidColumn(s.to_string()))?;
        }
        ColumnId::new(col).ok_or_else(|| InvalidColumn(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for ColumnId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a cell reference like "B7" into 1-based (row, col)
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, ColumnId)> {
    let split = cell_ref.find(|ch: char| ch.is_ascii_digit())?;
    let (letters, digits) = cell_ref.split_at(split);
    let col = letters.trim_start_matches('$').trim_end_matches('$');
    let col: ColumnId = col.parse().ok()?;
    let row = digits.parse::<u32>().ok().filter(|r| *r > 0)?;
    Some((row, col))
}

/// Parse a range like "A1:C3" into ((row, col), (row, col)) corners
pub fn parse_cell_range(range: &str) -> Option<((u32, ColumnId), (u32, ColumnId))> {
    let (start, end) = range.split_once(':')?;
    Some((parse_cell_ref(start)?, parse_cell_ref(end)?))
}
