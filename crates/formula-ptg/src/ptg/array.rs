//! `PtgArray` (0x20/0x40/0x60): an array constant.
//!
//! The token itself only carries 7 reserved bytes. Its dimensions and values live in the
//! formula's trailing data, after the last token:
//!
//! ```text
//! [cols - 1: u8][rows - 1: u16]
//! rows * cols * [type: u8][value]      (row-major)
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::constant::{char_count, ErrorCode};
use crate::error::PtgError;

pub const MAX_ARRAY_COLS: usize = 256;
pub const MAX_ARRAY_ROWS: usize = 65_536;
/// Size of the inline placeholder payload (excluding the opcode).
pub const ARRAY_PLACEHOLDER_SIZE: usize = 7;

pub(crate) const VALUE_EMPTY: u8 = 0x00;
pub(crate) const VALUE_NUMBER: u8 = 0x01;
pub(crate) const VALUE_STRING: u8 = 0x02;
pub(crate) const VALUE_BOOL: u8 = 0x04;
pub(crate) const VALUE_ERROR: u8 = 0x10;

/// One element of an array constant.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ArrayValue {
    Empty,
    Number(f64),
    Str(String),
    Bool(bool),
    Error(ErrorCode),
}

impl ArrayValue {
    pub(crate) fn encoded_size(&self) -> usize {
        match self {
            // [type][XLUnicodeString: cch u16, flags u8, chars]
            ArrayValue::Str(s) => {
                let utf16 = needs_utf16(s);
                let unit = if utf16 { 2 } else { 1 };
                1 + 3 + char_count(s, utf16) * unit
            }
            // [type][8 bytes]
            _ => 9,
        }
    }
}

pub(crate) fn needs_utf16(s: &str) -> bool {
    s.chars().any(|c| u32::from(c) > 0xFF)
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArrayPtg {
    reserved: [u8; ARRAY_PLACEHOLDER_SIZE],
    cols: usize,
    rows: usize,
    values: Vec<ArrayValue>,
}

impl ArrayPtg {
    /// Build an array constant from rows of values. Every row must have the same length.
    pub fn new(rows: Vec<Vec<ArrayValue>>) -> Result<Self, PtgError> {
        let row_count = rows.len();
        if row_count == 0 || row_count > MAX_ARRAY_ROWS {
            return Err(PtgError::ArrayRows { rows: row_count });
        }
        let cols = rows[0].len();
        if cols == 0 || cols > MAX_ARRAY_COLS {
            return Err(PtgError::ArrayColumns { cols });
        }

        let mut values = Vec::with_capacity(row_count * cols);
        for (row, items) in rows.into_iter().enumerate() {
            if items.len() != cols {
                return Err(PtgError::RaggedArray {
                    row,
                    len: items.len(),
                    expected: cols,
                });
            }
            for item in &items {
                if let ArrayValue::Str(s) = item {
                    let len = char_count(s, needs_utf16(s));
                    if len > usize::from(u16::MAX) {
                        return Err(PtgError::ArrayStringTooLong { len });
                    }
                }
            }
            values.extend(items);
        }

        Ok(Self {
            reserved: [0; ARRAY_PLACEHOLDER_SIZE],
            cols,
            rows: row_count,
            values,
        })
    }

    /// Dimensions come straight from the trailing data, which bounds them to the valid range.
    pub(crate) fn from_decoded(
        reserved: [u8; ARRAY_PLACEHOLDER_SIZE],
        cols: usize,
        rows: usize,
        values: Vec<ArrayValue>,
    ) -> Self {
        debug_assert_eq!(values.len(), cols * rows);
        Self {
            reserved,
            cols,
            rows,
            values,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// All values in row-major order.
    pub fn values(&self) -> &[ArrayValue] {
        &self.values
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&ArrayValue> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.values.get(row * self.cols + col)
    }

    pub fn row(&self, row: usize) -> Option<&[ArrayValue]> {
        let start = row.checked_mul(self.cols)?;
        self.values.get(start..start + self.cols)
    }

    pub fn reserved(&self) -> &[u8; ARRAY_PLACEHOLDER_SIZE] {
        &self.reserved
    }

    /// Size of the trailing data written after all tokens.
    pub fn data_size(&self) -> usize {
        3 + self
            .values
            .iter()
            .map(ArrayValue::encoded_size)
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_ragged_rows() {
        let err = ArrayPtg::new(vec![
            vec![ArrayValue::Number(1.0), ArrayValue::Number(2.0)],
            vec![ArrayValue::Number(3.0)],
        ])
        .unwrap_err();
        assert_eq!(
            err,
            PtgError::RaggedArray {
                row: 1,
                len: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn new_rejects_empty_and_oversized_shapes() {
        assert_eq!(ArrayPtg::new(vec![]), Err(PtgError::ArrayRows { rows: 0 }));
        assert_eq!(
            ArrayPtg::new(vec![vec![]]),
            Err(PtgError::ArrayColumns { cols: 0 })
        );
        let wide = vec![vec![ArrayValue::Empty; MAX_ARRAY_COLS + 1]];
        assert_eq!(
            ArrayPtg::new(wide),
            Err(PtgError::ArrayColumns {
                cols: MAX_ARRAY_COLS + 1
            })
        );
    }

    #[test]
    fn data_size_counts_every_value() {
        let array = ArrayPtg::new(vec![
            vec![ArrayValue::Number(1.0), ArrayValue::Str("ab".to_string())],
            vec![ArrayValue::Bool(true), ArrayValue::Error(ErrorCode::NA)],
        ])
        .unwrap();
        assert_eq!(array.data_size(), 3 + 9 + (4 + 2) + 9 + 9);
        assert_eq!(array.value(1, 0), Some(&ArrayValue::Bool(true)));
        assert_eq!(array.row(0).map(<[_]>::len), Some(2));
        assert_eq!(array.value(2, 0), None);
    }
}
