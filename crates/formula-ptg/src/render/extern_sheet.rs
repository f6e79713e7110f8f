//! Resolution of `EXTERNSHEET` indices into sheet names at render time.

use super::sheet_name::{append_sheet_name, append_workbook_sheet_name};
use crate::coords::ExternSheetIndex;

/// Sheet (or sheet range) an `EXTERNSHEET` entry points at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExternalSheet {
    /// Set when the entry refers to another workbook.
    pub workbook_name: Option<String>,
    pub sheet_name: String,
    /// Set for 3D ranges such as `Sheet1:Sheet3`.
    pub last_sheet_name: Option<String>,
}

impl ExternalSheet {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            ..Self::default()
        }
    }
}

/// Workbook-side lookups needed to turn tokens into formula text.
///
/// Every lookup may miss; callers render a miss as a `#REF` marker.
pub trait SheetNameResolver {
    /// Full description of an `EXTERNSHEET` entry.
    fn external_sheet(&self, index: ExternSheetIndex) -> Option<ExternalSheet>;

    /// Name of the first sheet covered by an entry. Used when
    /// [`SheetNameResolver::external_sheet`] has no answer.
    fn first_sheet_name(&self, index: ExternSheetIndex) -> Option<String> {
        let _ = index;
        None
    }

    fn last_sheet_name(&self, index: ExternSheetIndex) -> Option<String> {
        let _ = index;
        None
    }

    /// Text of the defined name with 1-based `index` (`PtgName`).
    fn name_text(&self, index: u16) -> Option<String> {
        let _ = index;
        None
    }

    /// Text of the external name `index` in the workbook behind `sheet` (`PtgNameX`).
    fn name_x_text(&self, sheet: ExternSheetIndex, index: u16) -> Option<String> {
        let _ = (sheet, index);
        None
    }
}

impl<T: SheetNameResolver + ?Sized> SheetNameResolver for &T {
    fn external_sheet(&self, index: ExternSheetIndex) -> Option<ExternalSheet> {
        (**self).external_sheet(index)
    }

    fn first_sheet_name(&self, index: ExternSheetIndex) -> Option<String> {
        (**self).first_sheet_name(index)
    }

    fn last_sheet_name(&self, index: ExternSheetIndex) -> Option<String> {
        (**self).last_sheet_name(index)
    }

    fn name_text(&self, index: u16) -> Option<String> {
        (**self).name_text(index)
    }

    fn name_x_text(&self, sheet: ExternSheetIndex, index: u16) -> Option<String> {
        (**self).name_x_text(sheet, index)
    }
}

/// Resolver with no workbook behind it. Every 3D reference renders as `#REF!...`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSheets;

impl SheetNameResolver for NoSheets {
    fn external_sheet(&self, _index: ExternSheetIndex) -> Option<ExternalSheet> {
        None
    }
}

/// `Sheet!ref`, `First:Last!ref`, `[Book]Sheet!ref` or `#REF!ref` for the given entry.
pub fn prepend_sheet_name(
    resolver: &dyn SheetNameResolver,
    index: ExternSheetIndex,
    ref_text: &str,
) -> String {
    let mut out = String::with_capacity(ref_text.len() + 16);

    if let Some(sheet) = resolver.external_sheet(index) {
        match &sheet.workbook_name {
            Some(workbook) => append_workbook_sheet_name(&mut out, workbook, &sheet.sheet_name),
            None => append_sheet_name(&mut out, &sheet.sheet_name),
        }
        if let Some(last) = &sheet.last_sheet_name {
            if *last != sheet.sheet_name {
                out.push(':');
                append_sheet_name(&mut out, last);
            }
        }
    } else {
        match resolver.first_sheet_name(index) {
            Some(first) if !first.is_empty() => {
                append_sheet_name(&mut out, &first);
                if let Some(last) = resolver.last_sheet_name(index) {
                    if last != first {
                        out.push(':');
                        append_sheet_name(&mut out, &last);
                    }
                }
            }
            _ => {
                log::debug!("extern sheet {index} did not resolve; rendering #REF");
                out.push_str("#REF");
            }
        }
    }

    out.push('!');
    out.push_str(ref_text);
    out
}
