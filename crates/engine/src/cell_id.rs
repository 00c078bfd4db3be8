//! Cell identity for the dependency graph.
//!
//! A `CellId` identifies a cell by its zero-based row and column. Its text
//! form is the column letters followed immediately by the row number, with no
//! separator: `A0`, `B3`, `AA34`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Unique identifier for a cell in a grid.
///
/// Used as graph nodes in the dependency graph and as the payload of
/// cell-reference tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId {
    /// Row index (0-based, displayed as-is)
    pub row: usize,
    /// Column index (0-based, displayed as letters)
    pub col: usize,
}

impl CellId {
    /// Create a new CellId.
    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Parse a cell reference starting at byte `start` of `input`.
    ///
    /// Reads a run of uppercase letters and then a run of digits. Returns the
    /// reference and the index just past the last digit consumed.
    pub(crate) fn scan(input: &str, start: usize) -> Result<(CellId, usize), ParseError> {
        let bytes = input.as_bytes();
        let mut index = start;

        let mut col: usize = match bytes.get(index) {
            Some(b) if b.is_ascii_uppercase() => (b - b'A') as usize,
            _ => return Err(ParseError::MalformedReference { position: start }),
        };
        index += 1;

        while let Some(b) = bytes.get(index).filter(|b| b.is_ascii_uppercase()) {
            col = col
                .checked_add(1)
                .and_then(|c| c.checked_mul(26))
                .and_then(|c| c.checked_add((b - b'A') as usize))
                .ok_or(ParseError::MalformedReference { position: start })?;
            index += 1;
        }

        let digits_start = index;
        let mut row: usize = 0;
        while let Some(b) = bytes.get(index).filter(|b| b.is_ascii_digit()) {
            row = row
                .checked_mul(10)
                .and_then(|r| r.checked_add((b - b'0') as usize))
                .ok_or(ParseError::MalformedReference { position: start })?;
            index += 1;
        }

        if index == digits_start {
            return Err(ParseError::MalformedReference { position: start });
        }

        Ok((CellId::new(row, col), index))
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", col_to_letters(self.col), self.row)
    }
}

impl FromStr for CellId {
    type Err = ParseError;

    /// Parse `"AA34"`-style text. Lowercase letters are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let (id, end) = CellId::scan(&upper, 0)?;
        if end != upper.len() {
            return Err(ParseError::MalformedReference { position: 0 });
        }
        Ok(id)
    }
}

/// Convert a 0-based column index to letters: 0=A, 25=Z, 26=AA, 51=AZ, 52=BA.
///
/// Exact inverse of the column rule used when scanning references, where each
/// additional letter applies `col = (col + 1) * 26 + letter`.
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}
