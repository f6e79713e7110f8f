//! BIFF8 parsed-expression (`Ptg`) tokens.
//!
//! This crate owns the token model behind `.xls` formulas:
//! - [`Ptg`]: the closed token union, with operand classes carried as opcode bands
//! - [`codec`]: `rgce` decoding/encoding, including the trailing array-constant data
//! - [`shift`]: reference rewriting for row moves and sheet reorders
//! - [`render`]: formula text for a token sequence, with sheet names looked up on demand
//!
//! Function metadata comes from a caller-supplied [`FunctionDirectory`]; the default
//! `builtin-functions` feature provides [`BuiltinFunctions`].
//!
//! Notes on what is *not* here:
//! - Formula text is never parsed into tokens; a text front end builds [`Ptg`] values directly.
//! - Workbook state (sheet names, defined names) is consulted through
//!   [`render::SheetNameResolver`] and never cached inside tokens.

pub mod class;
pub mod codec;
pub mod coords;
pub mod error;
pub mod functions;
pub mod ptg;
pub mod render;
pub mod shift;

pub use class::OperandClass;
pub use codec::{
    decode_ptgs, encode_ptgs, encoded_size, encoded_size_without_array_data, read_ptgs,
    write_ptgs, PtgReader,
};
pub use coords::{AreaCoord, CellCoord, ExternSheetIndex};
pub use error::{ClassificationError, DecodeError, PtgError, RenderError, ShiftError};
pub use functions::{FunctionDescriptor, FunctionDirectory, NoFunctions, EXTERNAL_FUNCTION_INDEX};
pub use ptg::{BasePtg, ClassifiedPtg, Operator, Ptg};
pub use render::{to_formula_string, RenderOptions, SheetNameResolver};
pub use shift::{adjust_ptg, shift_ptgs, shifted, MoveDescriptor, RowMove};

#[cfg(feature = "builtin-functions")]
pub use functions::BuiltinFunctions;
