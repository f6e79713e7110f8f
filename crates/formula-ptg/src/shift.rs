//! Rewrites references in a token sequence when rows move or sheets are reordered.
//!
//! Row moves follow Excel's observed behaviour rather than a derived formula: references into the
//! moved block travel with it, references that the block lands on are destroyed, and areas that
//! partially overlap either side are stretched or truncated depending on which edge is involved.
//! Geometry outside the known cases is reported as [`ShiftError::SituationNotCovered`].
//!
//! Tokens are never edited in place. [`adjust_ptg`] returns a replacement token (or `None`) and
//! the drivers swap it into the sequence.

use std::cmp::{max, min};

use crate::coords::{AreaCoord, CellCoord, ExternSheetIndex};
use crate::error::ShiftError;
use crate::ptg::{ClassifiedPtg, Ptg};

/// Rows `first_moved_row..=last_moved_row` of one sheet are cut and pasted `delta` rows away.
///
/// Inserting rows is a move of everything below the insertion point by a positive delta; deleting
/// rows is a move of everything below the deleted block by a negative delta.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMove {
    /// Sheet whose rows move, as an index into the `EXTERNSHEET` table.
    pub extern_sheet_index: ExternSheetIndex,
    /// Display name of the sheet, used in diagnostics.
    pub sheet_name: String,
    pub first_moved_row: u16,
    pub last_moved_row: u16,
    pub delta: i32,
}

impl RowMove {
    fn dest_first(&self) -> i32 {
        i32::from(self.first_moved_row) + self.delta
    }

    fn dest_last(&self) -> i32 {
        i32::from(self.last_moved_row) + self.delta
    }

    fn not_covered(&self, first_row: i32, last_row: i32) -> ShiftError {
        log::warn!(
            "row move on sheet `{}` ({}) hit an uncovered geometry: rows {}..={} by {} against {}..={}",
            self.sheet_name,
            self.extern_sheet_index,
            self.first_moved_row,
            self.last_moved_row,
            self.delta,
            first_row,
            last_row
        );
        ShiftError::SituationNotCovered {
            first_moved_row: i32::from(self.first_moved_row),
            last_moved_row: i32::from(self.last_moved_row),
            delta: self.delta,
            first_row,
            last_row,
        }
    }
}

/// A structural change that references need to follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveDescriptor {
    RowMove(RowMove),
    /// Two sheets swap positions; 3D references to either one are redirected to the other.
    SheetReorder {
        src: ExternSheetIndex,
        dst: ExternSheetIndex,
    },
}

impl MoveDescriptor {
    pub fn row_move(
        extern_sheet_index: ExternSheetIndex,
        sheet_name: impl Into<String>,
        first_moved_row: u16,
        last_moved_row: u16,
        delta: i32,
    ) -> Self {
        Self::RowMove(RowMove {
            extern_sheet_index,
            sheet_name: sheet_name.into(),
            first_moved_row,
            last_moved_row,
            delta,
        })
    }

    pub fn sheet_reorder(src: ExternSheetIndex, dst: ExternSheetIndex) -> Self {
        Self::SheetReorder { src, dst }
    }

    /// Rejects row moves the shift engine cannot evaluate: an inverted row range, or a delta
    /// that could not land any row on the sheet.
    pub fn validate(&self) -> Result<(), ShiftError> {
        let Self::RowMove(mv) = self else {
            return Ok(());
        };
        if mv.first_moved_row > mv.last_moved_row {
            return Err(ShiftError::InvalidRowMove {
                first_moved_row: mv.first_moved_row,
                last_moved_row: mv.last_moved_row,
            });
        }
        if !(-MAX_ROW_DELTA..=MAX_ROW_DELTA).contains(&mv.delta) {
            return Err(ShiftError::RowDeltaOutOfRange { delta: mv.delta });
        }
        Ok(())
    }
}

/// Largest row distance on a BIFF8 sheet; row moves with a larger `|delta|` are rejected.
pub const MAX_ROW_DELTA: i32 = u16::MAX as i32;

/// Outcome of moving a row interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowAdjustment {
    Unchanged,
    Rows { first: i32, last: i32 },
    Deleted,
}

/// Adjust every token in place. Returns whether any token was replaced.
///
/// Replacements are computed before anything is written, so on error `ptgs` is untouched.
pub fn shift_ptgs(
    ptgs: &mut [Ptg],
    current_sheet: ExternSheetIndex,
    mv: &MoveDescriptor,
) -> Result<bool, ShiftError> {
    mv.validate()?;
    let mut replacements = Vec::new();
    for (index, ptg) in ptgs.iter().enumerate() {
        if let Some(replacement) = adjust_validated(ptg, current_sheet, mv)? {
            replacements.push((index, replacement));
        }
    }

    let changed = !replacements.is_empty();
    for (index, replacement) in replacements {
        ptgs[index] = replacement;
    }
    Ok(changed)
}

/// Owned variant of [`shift_ptgs`], returning the new sequence and the changed flag.
pub fn shifted(
    mut ptgs: Vec<Ptg>,
    current_sheet: ExternSheetIndex,
    mv: &MoveDescriptor,
) -> Result<(Vec<Ptg>, bool), ShiftError> {
    let changed = shift_ptgs(&mut ptgs, current_sheet, mv)?;
    Ok((ptgs, changed))
}

/// Replacement for a single token, or `None` when the move does not affect it.
///
/// `current_sheet` is the sheet hosting the formula; same-sheet references (`PtgRef`,
/// `PtgArea`) only follow a row move on that sheet.
pub fn adjust_ptg(
    ptg: &Ptg,
    current_sheet: ExternSheetIndex,
    mv: &MoveDescriptor,
) -> Result<Option<Ptg>, ShiftError> {
    mv.validate()?;
    adjust_validated(ptg, current_sheet, mv)
}

fn adjust_validated(
    ptg: &Ptg,
    current_sheet: ExternSheetIndex,
    mv: &MoveDescriptor,
) -> Result<Option<Ptg>, ShiftError> {
    let Ptg::Classified { class, ptg: inner } = ptg else {
        return Ok(None);
    };

    let replacement = match mv {
        MoveDescriptor::RowMove(mv) => row_move_ptg(inner, current_sheet, mv)?,
        MoveDescriptor::SheetReorder { src, dst } => reorder_ptg(inner, *src, *dst),
    };

    Ok(replacement
        .filter(|new| new != inner)
        .map(|new| {
            log::trace!("shift replaced {inner:?} with {new:?}");
            Ptg::classified(*class, new)
        }))
}

fn row_move_ptg(
    ptg: &ClassifiedPtg,
    current_sheet: ExternSheetIndex,
    mv: &RowMove,
) -> Result<Option<ClassifiedPtg>, ShiftError> {
    let on_moved_sheet = current_sheet == mv.extern_sheet_index;
    Ok(match ptg {
        ClassifiedPtg::Ref(cell) if on_moved_sheet => move_cell(*cell, mv)?.map(|moved| match moved {
            Moved::To(cell) => ClassifiedPtg::Ref(cell),
            Moved::Deleted => ClassifiedPtg::RefErr { reserved: 0 },
        }),
        ClassifiedPtg::Area(area) if on_moved_sheet => move_area(*area, mv)?.map(|moved| match moved {
            Moved::To(area) => ClassifiedPtg::Area(area),
            Moved::Deleted => ClassifiedPtg::AreaErr { reserved: 0 },
        }),
        ClassifiedPtg::Ref3d { sheet, cell } if *sheet == mv.extern_sheet_index => {
            let sheet = *sheet;
            move_cell(*cell, mv)?.map(|moved| match moved {
                Moved::To(cell) => ClassifiedPtg::Ref3d { sheet, cell },
                Moved::Deleted => ClassifiedPtg::DeletedRef3d { sheet, reserved: 0 },
            })
        }
        ClassifiedPtg::Area3d { sheet, area } if *sheet == mv.extern_sheet_index => {
            let sheet = *sheet;
            move_area(*area, mv)?.map(|moved| match moved {
                Moved::To(area) => ClassifiedPtg::Area3d { sheet, area },
                Moved::Deleted => ClassifiedPtg::DeletedArea3d { sheet, reserved: 0 },
            })
        }
        // RefN/AreaN are offsets from the host cell and move with it.
        _ => None,
    })
}

enum Moved<T> {
    To(T),
    Deleted,
}

/// Rows pushed off the sheet delete the reference, like rows that are overwritten.
fn move_cell(cell: CellCoord, mv: &RowMove) -> Result<Option<Moved<CellCoord>>, ShiftError> {
    Ok(match row_move_cell(cell.row, mv)? {
        RowAdjustment::Unchanged => None,
        RowAdjustment::Deleted => Some(Moved::Deleted),
        RowAdjustment::Rows { first, .. } => match u16::try_from(first) {
            Ok(row) => Some(Moved::To(cell.with_row(row))),
            Err(_) => Some(Moved::Deleted),
        },
    })
}

fn move_area(area: AreaCoord, mv: &RowMove) -> Result<Option<Moved<AreaCoord>>, ShiftError> {
    Ok(match row_move_area(&area, mv)? {
        RowAdjustment::Unchanged => None,
        RowAdjustment::Deleted => Some(Moved::Deleted),
        RowAdjustment::Rows { first, last } => match (u16::try_from(first), u16::try_from(last)) {
            (Ok(first), Ok(last)) => Some(Moved::To(area.with_rows(first, last))),
            _ => Some(Moved::Deleted),
        },
    })
}

fn row_move_cell(row: u16, mv: &RowMove) -> Result<RowAdjustment, ShiftError> {
    let row = i32::from(row);
    let first_moved = i32::from(mv.first_moved_row);
    let last_moved = i32::from(mv.last_moved_row);

    if first_moved <= row && row <= last_moved {
        let row = row + mv.delta;
        return Ok(RowAdjustment::Rows {
            first: row,
            last: row,
        });
    }

    let dest_first = mv.dest_first();
    let dest_last = mv.dest_last();
    if dest_last < row || row < dest_first {
        return Ok(RowAdjustment::Unchanged);
    }
    if dest_first <= row && row <= dest_last {
        return Ok(RowAdjustment::Deleted);
    }
    Err(mv.not_covered(row, row))
}

fn row_move_area(area: &AreaCoord, mv: &RowMove) -> Result<RowAdjustment, ShiftError> {
    let a_first = i32::from(area.first_row);
    let a_last = i32::from(area.last_row);
    let first_moved = i32::from(mv.first_moved_row);
    let last_moved = i32::from(mv.last_moved_row);
    let delta = mv.delta;
    let dest_first = mv.dest_first();
    let dest_last = mv.dest_last();

    // The whole area travels with the moved block.
    if first_moved <= a_first && a_last <= last_moved {
        return Ok(RowAdjustment::Rows {
            first: a_first + delta,
            last: a_last + delta,
        });
    }

    // The moved block sits strictly inside the area.
    if a_first < first_moved && last_moved < a_last {
        if dest_first < a_first && a_first <= dest_last {
            return Ok(RowAdjustment::Rows {
                first: dest_last + 1,
                last: a_last,
            });
        }
        if dest_first <= a_last && a_last < dest_last {
            return Ok(RowAdjustment::Rows {
                first: a_first,
                last: dest_first - 1,
            });
        }
        return Ok(RowAdjustment::Unchanged);
    }

    // Only the top edge moves.
    if first_moved <= a_first && a_first <= last_moved {
        if delta < 0 {
            return Ok(RowAdjustment::Rows {
                first: a_first + delta,
                last: a_last,
            });
        }
        if dest_first > a_last {
            return Ok(RowAdjustment::Unchanged);
        }
        let mut new_first = a_first + delta;
        if dest_last < a_last {
            return Ok(RowAdjustment::Rows {
                first: new_first,
                last: a_last,
            });
        }
        // The old bottom row is overwritten.
        let remaining_top = last_moved + 1;
        if dest_first > remaining_top {
            new_first = remaining_top;
        }
        return Ok(RowAdjustment::Rows {
            first: new_first,
            last: max(a_last, dest_last),
        });
    }

    // Only the bottom edge moves.
    if first_moved <= a_last && a_last <= last_moved {
        if delta > 0 {
            return Ok(RowAdjustment::Rows {
                first: a_first,
                last: a_last + delta,
            });
        }
        if dest_last < a_first {
            return Ok(RowAdjustment::Unchanged);
        }
        let mut new_last = a_last + delta;
        if dest_first > a_first {
            return Ok(RowAdjustment::Rows {
                first: a_first,
                last: new_last,
            });
        }
        // The old top row is overwritten.
        let remaining_bottom = first_moved - 1;
        if dest_last < remaining_bottom {
            new_last = remaining_bottom;
        }
        return Ok(RowAdjustment::Rows {
            first: min(a_first, dest_first),
            last: new_last,
        });
    }

    // None of the area's rows move; only the landing zone matters.
    if dest_last < a_first || a_last < dest_first {
        return Ok(RowAdjustment::Unchanged);
    }
    if dest_first <= a_first && a_last <= dest_last {
        return Ok(RowAdjustment::Deleted);
    }
    if a_first <= dest_first && dest_last <= a_last {
        return Ok(RowAdjustment::Unchanged);
    }
    if dest_first < a_first && a_first <= dest_last {
        return Ok(RowAdjustment::Rows {
            first: dest_last + 1,
            last: a_last,
        });
    }
    if dest_first <= a_last && a_last < dest_last {
        return Ok(RowAdjustment::Rows {
            first: a_first,
            last: dest_first - 1,
        });
    }
    Err(mv.not_covered(a_first, a_last))
}

fn reorder_ptg(
    ptg: &ClassifiedPtg,
    src: ExternSheetIndex,
    dst: ExternSheetIndex,
) -> Option<ClassifiedPtg> {
    let swap = |sheet: ExternSheetIndex| {
        if sheet == src {
            Some(dst)
        } else if sheet == dst {
            Some(src)
        } else {
            None
        }
    };

    match ptg {
        ClassifiedPtg::Ref3d { sheet, cell } => swap(*sheet).map(|sheet| ClassifiedPtg::Ref3d {
            sheet,
            cell: *cell,
        }),
        ClassifiedPtg::Area3d { sheet, area } => swap(*sheet).map(|sheet| ClassifiedPtg::Area3d {
            sheet,
            area: *area,
        }),
        ClassifiedPtg::DeletedRef3d { sheet, reserved } => {
            swap(*sheet).map(|sheet| ClassifiedPtg::DeletedRef3d {
                sheet,
                reserved: *reserved,
            })
        }
        ClassifiedPtg::DeletedArea3d { sheet, reserved } => {
            swap(*sheet).map(|sheet| ClassifiedPtg::DeletedArea3d {
                sheet,
                reserved: *reserved,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(first: u16, last: u16, delta: i32) -> RowMove {
        RowMove {
            extern_sheet_index: ExternSheetIndex(0),
            sheet_name: "Sheet1".to_string(),
            first_moved_row: first,
            last_moved_row: last,
            delta,
        }
    }

    fn area(first: u16, last: u16) -> AreaCoord {
        AreaCoord::relative(first, 0, last, 0)
    }

    #[test]
    fn single_row_cases() {
        let m = mv(5, 10, 3);
        assert_eq!(
            row_move_cell(7, &m),
            Ok(RowAdjustment::Rows { first: 10, last: 10 })
        );
        assert_eq!(row_move_cell(20, &m), Ok(RowAdjustment::Unchanged));
        // Destination is 8..=13; row 12 is overwritten.
        assert_eq!(row_move_cell(12, &m), Ok(RowAdjustment::Deleted));
    }

    #[test]
    fn area_inside_moved_block_translates() {
        assert_eq!(
            row_move_area(&area(5, 10), &mv(5, 10, 3)),
            Ok(RowAdjustment::Rows { first: 8, last: 13 })
        );
    }

    #[test]
    fn moved_block_inside_area_truncates_at_destination() {
        // Block 4..=5 lands on 8..=9, still inside the area.
        assert_eq!(
            row_move_area(&area(2, 10), &mv(4, 5, 4)),
            Ok(RowAdjustment::Unchanged)
        );
        // Block 4..=5 lands on 1..=2, poking through the top.
        assert_eq!(
            row_move_area(&area(2, 10), &mv(4, 5, -3)),
            Ok(RowAdjustment::Rows { first: 3, last: 10 })
        );
        // Block 8..=9 lands on 10..=11, poking through the bottom.
        assert_eq!(
            row_move_area(&area(2, 10), &mv(8, 9, 2)),
            Ok(RowAdjustment::Rows { first: 2, last: 9 })
        );
    }

    #[test]
    fn top_edge_moves() {
        // Upward: area grows.
        assert_eq!(
            row_move_area(&area(5, 10), &mv(5, 6, -2)),
            Ok(RowAdjustment::Rows { first: 3, last: 10 })
        );
        // Destination entirely below the area.
        assert_eq!(
            row_move_area(&area(5, 10), &mv(5, 6, 20)),
            Ok(RowAdjustment::Unchanged)
        );
        // Destination stops short of the bottom.
        assert_eq!(
            row_move_area(&area(5, 10), &mv(5, 6, 2)),
            Ok(RowAdjustment::Rows { first: 7, last: 10 })
        );
        // Destination covers the bottom: a new top row is exposed.
        assert_eq!(
            row_move_area(&area(5, 10), &mv(5, 6, 5)),
            Ok(RowAdjustment::Rows { first: 7, last: 11 })
        );
    }

    #[test]
    fn bottom_edge_moves() {
        assert_eq!(
            row_move_area(&area(5, 10), &mv(9, 10, 2)),
            Ok(RowAdjustment::Rows { first: 5, last: 12 })
        );
        assert_eq!(
            row_move_area(&area(5, 10), &mv(9, 10, -8)),
            Ok(RowAdjustment::Unchanged)
        );
        assert_eq!(
            row_move_area(&area(5, 10), &mv(9, 10, -2)),
            Ok(RowAdjustment::Rows { first: 5, last: 8 })
        );
        assert_eq!(
            row_move_area(&area(5, 10), &mv(9, 10, -5)),
            Ok(RowAdjustment::Rows { first: 4, last: 8 })
        );
    }

    #[test]
    fn landing_zone_cases() {
        let a = area(5, 10);
        assert_eq!(row_move_area(&a, &mv(20, 22, 5)), Ok(RowAdjustment::Unchanged));
        assert_eq!(row_move_area(&a, &mv(20, 27, -16)), Ok(RowAdjustment::Deleted));
        assert_eq!(row_move_area(&a, &mv(20, 21, -14)), Ok(RowAdjustment::Unchanged));
        assert_eq!(
            row_move_area(&a, &mv(20, 22, -17)),
            Ok(RowAdjustment::Rows { first: 6, last: 10 })
        );
        assert_eq!(
            row_move_area(&a, &mv(20, 22, -11)),
            Ok(RowAdjustment::Rows { first: 5, last: 8 })
        );
    }
}
