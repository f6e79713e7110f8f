//! Error types for token construction, decoding, shifting and rendering.

use thiserror::Error;

/// Failure decoding a BIFF8 `rgce` token stream.
///
/// Every variant carries the byte offset (relative to the start of the stream handed to the
/// decoder) so record readers can report where the stream went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The opcode byte has no decode routine. Nothing past the opcode has been consumed.
    #[error("unknown ptg opcode 0x{opcode:02X} at offset {offset}")]
    UnknownOpcode { offset: usize, opcode: u8 },
    /// The stream ended before the current field could be read.
    #[error(
        "truncated ptg stream at offset {offset} (needed {needed} bytes, remaining {remaining})"
    )]
    TruncatedStream {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    /// The last token straddled the declared token byte budget.
    #[error("ptg stream declared {declared} bytes of tokens but tokens consumed {consumed}")]
    SizeMismatch { declared: usize, consumed: usize },
    /// `PtgErr` (or an array error value) held a code that is not an Excel error.
    #[error("invalid error code 0x{code:02X} at offset {offset}")]
    InvalidErrorCode { offset: usize, code: u8 },
    /// An array constant value had an unknown type discriminant.
    #[error("invalid array constant value type 0x{tag:02X} at offset {offset}")]
    InvalidArrayValue { offset: usize, tag: u8 },
}

/// Operand class requested from, or assigned to, a structural (base) token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operand class is not defined for structural ptg 0x{opcode:02X}")]
pub struct ClassificationError {
    pub opcode: u8,
}

/// A token payload that the BIFF8 layout cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PtgError {
    #[error("string constant has {len} characters (max 255)")]
    StringTooLong { len: usize },
    #[error("array constant string has {len} characters (max 65535)")]
    ArrayStringTooLong { len: usize },
    #[error("array constant must have between 1 and 256 columns (got {cols})")]
    ArrayColumns { cols: usize },
    #[error("array constant must have between 1 and 65536 rows (got {rows})")]
    ArrayRows { rows: usize },
    #[error("array constant row {row} has {len} values (expected {expected})")]
    RaggedArray { row: usize, len: usize, expected: usize },
    #[error("choose jump table has {len} cases (max 65535)")]
    ChooseTableTooLong { len: usize },
    #[error("function `{name}` takes {expected} arguments, not {got}")]
    FixedArity {
        name: String,
        expected: u8,
        got: u8,
    },
    #[error("function argument count {got} exceeds 127")]
    TooManyArguments { got: usize },
}

/// A row move the shift engine rejects or has no rule for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShiftError {
    #[error(
        "situation not covered: moving rows {first_moved_row}..={last_moved_row} by {delta} \
         against reference rows {first_row}..={last_row}"
    )]
    SituationNotCovered {
        first_moved_row: i32,
        last_moved_row: i32,
        delta: i32,
        first_row: i32,
        last_row: i32,
    },
    #[error("invalid row move: first moved row {first_moved_row} is after last moved row {last_moved_row}")]
    InvalidRowMove {
        first_moved_row: u16,
        last_moved_row: u16,
    },
    #[error("invalid row move: delta {delta} is outside -65535..=65535")]
    RowDeltaOutOfRange { delta: i32 },
}

/// Failure assembling formula text from a token sequence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("ptg #{index} ({ptg}) needs {needed} operands but only {available} are available")]
    StackUnderflow {
        index: usize,
        ptg: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("formula rendered to {len} expressions (expected 1)")]
    UnbalancedStack { len: usize },
    #[error("ptg #{index} ({ptg}) has no formula text")]
    UnrenderablePtg { index: usize, ptg: &'static str },
    #[error("ptg #{index} ({ptg}) is relative to the host cell but no base cell was given")]
    RelativeWithoutBase { index: usize, ptg: &'static str },
}
