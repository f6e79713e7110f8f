//! Cell/area coordinates as stored in reference ptgs.
//!
//! BIFF8 stores a row as a plain `u16` and packs the column together with the two relative flags
//! into a second `u16`:
//!
//! ```text
//! bits 0..=13  column index
//! bit  14      row is relative
//! bit  15      column is relative
//! ```

use std::fmt::{self, Write as _};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Last addressable BIFF8 row (0-based).
pub const MAX_ROW: u16 = u16::MAX;
/// Last addressable BIFF8 column (0-based, `IV`).
pub const MAX_COL: u16 = 0x00FF;

const COL_INDEX_MASK: u16 = 0x3FFF;
const ROW_RELATIVE_BIT: u16 = 0x4000;
const COL_RELATIVE_BIT: u16 = 0x8000;

/// Index into the workbook `EXTERNSHEET` table (`ixti`).
///
/// This is deliberately opaque: the sheet (or sheet range, or external workbook) it denotes is
/// only looked up when formula text is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExternSheetIndex(pub u16);

impl From<u16> for ExternSheetIndex {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for ExternSheetIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ixti={}", self.0)
    }
}

/// A single-cell reference with per-axis relative flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CellCoord {
    pub row: u16,
    pub col: u16,
    pub row_relative: bool,
    pub col_relative: bool,
}

impl CellCoord {
    pub const fn new(row: u16, col: u16, row_relative: bool, col_relative: bool) -> Self {
        Self {
            row,
            col: col & COL_INDEX_MASK,
            row_relative,
            col_relative,
        }
    }

    /// Fully relative reference (`A1` style, no `$`).
    pub const fn relative(row: u16, col: u16) -> Self {
        Self::new(row, col, true, true)
    }

    /// Fully absolute reference (`$A$1`).
    pub const fn absolute(row: u16, col: u16) -> Self {
        Self::new(row, col, false, false)
    }

    pub(crate) fn from_fields(row: u16, col_field: u16) -> Self {
        Self {
            row,
            col: col_field & COL_INDEX_MASK,
            row_relative: col_field & ROW_RELATIVE_BIT != 0,
            col_relative: col_field & COL_RELATIVE_BIT != 0,
        }
    }

    pub(crate) fn col_field(&self) -> u16 {
        pack_col(self.col, self.row_relative, self.col_relative)
    }

    pub fn with_row(self, row: u16) -> Self {
        Self { row, ..self }
    }

    /// Append A1 text (`$` marks absolute axes).
    pub fn write_a1(&self, out: &mut String) {
        if !self.col_relative {
            out.push('$');
        }
        push_column_label(self.col, out);
        if !self.row_relative {
            out.push('$');
        }
        let _ = write!(out, "{}", u32::from(self.row) + 1);
    }

    pub fn to_a1(&self) -> String {
        let mut out = String::with_capacity(8);
        self.write_a1(&mut out);
        out
    }

    /// Resolve a `PtgRefN`-style coordinate against the host cell.
    ///
    /// Relative rows are stored as signed 16-bit offsets and relative columns as signed 8-bit
    /// offsets; both wrap around the sheet edges the way Excel does.
    pub fn resolve_offset(&self, base: CellCoord) -> CellCoord {
        let row = if self.row_relative {
            base.row.wrapping_add(self.row)
        } else {
            self.row
        };
        let col = if self.col_relative {
            let offset = (self.col & 0x00FF) as u8 as i8;
            (base.col as i32 + i32::from(offset)).rem_euclid(i32::from(MAX_COL) + 1) as u16
        } else {
            self.col
        };
        CellCoord::new(row, col, self.row_relative, self.col_relative)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// A rectangular reference. Each of the four edges carries its own relative flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AreaCoord {
    pub first_row: u16,
    pub last_row: u16,
    pub first_col: u16,
    pub last_col: u16,
    pub first_row_relative: bool,
    pub last_row_relative: bool,
    pub first_col_relative: bool,
    pub last_col_relative: bool,
}

impl AreaCoord {
    /// Build an area from two corner cells.
    ///
    /// Bounds are ordered so that `first_row <= last_row` and `first_col <= last_col`; when an
    /// axis is swapped its relative flags travel with the bounds.
    pub fn new(a: CellCoord, b: CellCoord) -> Self {
        let (first_row, first_row_relative, last_row, last_row_relative) = if a.row <= b.row {
            (a.row, a.row_relative, b.row, b.row_relative)
        } else {
            (b.row, b.row_relative, a.row, a.row_relative)
        };
        let (first_col, first_col_relative, last_col, last_col_relative) = if a.col <= b.col {
            (a.col, a.col_relative, b.col, b.col_relative)
        } else {
            (b.col, b.col_relative, a.col, a.col_relative)
        };
        Self {
            first_row,
            last_row,
            first_col: first_col & COL_INDEX_MASK,
            last_col: last_col & COL_INDEX_MASK,
            first_row_relative,
            last_row_relative,
            first_col_relative,
            last_col_relative,
        }
    }

    /// Fully relative area spanning the given bounds.
    pub fn relative(first_row: u16, first_col: u16, last_row: u16, last_col: u16) -> Self {
        Self::new(
            CellCoord::relative(first_row, first_col),
            CellCoord::relative(last_row, last_col),
        )
    }

    /// Fully absolute area spanning the given bounds.
    pub fn absolute(first_row: u16, first_col: u16, last_row: u16, last_col: u16) -> Self {
        Self::new(
            CellCoord::absolute(first_row, first_col),
            CellCoord::absolute(last_row, last_col),
        )
    }

    /// Fields exactly as stored in the stream; no reordering so re-encoding is byte-exact.
    pub(crate) fn from_fields(first_row: u16, last_row: u16, first_col: u16, last_col: u16) -> Self {
        let first = CellCoord::from_fields(first_row, first_col);
        let last = CellCoord::from_fields(last_row, last_col);
        Self {
            first_row,
            last_row,
            first_col: first.col,
            last_col: last.col,
            first_row_relative: first.row_relative,
            last_row_relative: last.row_relative,
            first_col_relative: first.col_relative,
            last_col_relative: last.col_relative,
        }
    }

    pub fn first(&self) -> CellCoord {
        CellCoord::new(
            self.first_row,
            self.first_col,
            self.first_row_relative,
            self.first_col_relative,
        )
    }

    pub fn last(&self) -> CellCoord {
        CellCoord::new(
            self.last_row,
            self.last_col,
            self.last_row_relative,
            self.last_col_relative,
        )
    }

    pub(crate) fn first_col_field(&self) -> u16 {
        self.first().col_field()
    }

    pub(crate) fn last_col_field(&self) -> u16 {
        self.last().col_field()
    }

    /// Same area with new row bounds; relative flags and columns are kept.
    pub fn with_rows(self, first_row: u16, last_row: u16) -> Self {
        Self {
            first_row,
            last_row,
            ..self
        }
    }

    /// Whether the area spans every row of the sheet (rendered as `A:B`).
    pub fn is_whole_column(&self) -> bool {
        self.first_row == 0 && self.last_row == MAX_ROW
    }

    pub fn write_a1(&self, out: &mut String) {
        if self.is_whole_column() {
            if !self.first_col_relative {
                out.push('$');
            }
            push_column_label(self.first_col, out);
            out.push(':');
            if !self.last_col_relative {
                out.push('$');
            }
            push_column_label(self.last_col, out);
            return;
        }
        self.first().write_a1(out);
        out.push(':');
        self.last().write_a1(out);
    }

    pub fn to_a1(&self) -> String {
        let mut out = String::with_capacity(16);
        self.write_a1(&mut out);
        out
    }

    /// Resolve a `PtgAreaN`-style area against the host cell.
    pub fn resolve_offset(&self, base: CellCoord) -> AreaCoord {
        let first = self.first().resolve_offset(base);
        let last = self.last().resolve_offset(base);
        AreaCoord {
            first_row: first.row,
            last_row: last.row,
            first_col: first.col,
            last_col: last.col,
            ..*self
        }
    }
}

impl fmt::Display for AreaCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

fn pack_col(col: u16, row_relative: bool, col_relative: bool) -> u16 {
    let mut field = col & COL_INDEX_MASK;
    if row_relative {
        field |= ROW_RELATIVE_BIT;
    }
    if col_relative {
        field |= COL_RELATIVE_BIT;
    }
    field
}

/// Convert a 0-based column index to an Excel column label and append it to `out`.
pub fn push_column_label(col: u16, out: &mut String) {
    // Excel column labels are 1-based.
    let mut col = u32::from(col) + 1;
    let mut buf = [0u8; 4];
    let mut i = 0usize;
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        buf[i] = b'A' + rem;
        i += 1;
        col = (col - 1) / 26;
    }
    for ch in buf[..i].iter().rev() {
        out.push(*ch as char);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn col_field_round_trips_flags() {
        let cell = CellCoord::new(4, 27, true, false);
        let field = cell.col_field();
        assert_eq!(field, 27 | ROW_RELATIVE_BIT);
        assert_eq!(CellCoord::from_fields(4, field), cell);
    }

    #[test]
    fn a1_text_marks_absolute_axes() {
        assert_eq!(CellCoord::relative(0, 0).to_a1(), "A1");
        assert_eq!(CellCoord::absolute(9, 27).to_a1(), "$AB$10");
        assert_eq!(CellCoord::new(2, 255, true, false).to_a1(), "$IV3");
    }

    #[test]
    fn area_new_orders_bounds_and_carries_flags() {
        let a = CellCoord::new(10, 1, false, true);
        let b = CellCoord::new(2, 5, true, false);
        let area = AreaCoord::new(a, b);
        assert_eq!((area.first_row, area.last_row), (2, 10));
        assert!(area.first_row_relative);
        assert!(!area.last_row_relative);
        assert_eq!((area.first_col, area.last_col), (1, 5));
        assert!(area.first_col_relative);
        assert!(!area.last_col_relative);
        assert_eq!(area.to_a1(), "B3:$F$11");
    }

    #[test]
    fn whole_column_area_renders_without_rows() {
        let area = AreaCoord::absolute(0, 0, MAX_ROW, 1);
        assert_eq!(area.to_a1(), "$A:$B");
    }

    #[test]
    fn relative_offsets_wrap_around_the_host_cell() {
        let base = CellCoord::relative(10, 3);
        // Row offset -1, column offset -2.
        let offset = CellCoord::new(u16::MAX, 0x00FE, true, true);
        let resolved = offset.resolve_offset(base);
        assert_eq!((resolved.row, resolved.col), (9, 1));
    }
}
