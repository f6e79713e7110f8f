//! `PtgAttr` (0x19): control/whitespace markers that do not push an operand.
//!
//! Layout: `[grbit: u8][wAttr: u16]`, followed by a jump table when the choose bit is set:
//! `wAttr` case offsets plus one trailing offset to the `CHOOSE` function call, each a `u16`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PtgError;

pub const ATTR_SEMI_VOLATILE: u8 = 0x01;
pub const ATTR_IF: u8 = 0x02;
pub const ATTR_CHOOSE: u8 = 0x04;
pub const ATTR_SKIP: u8 = 0x08;
pub const ATTR_SUM: u8 = 0x10;
pub const ATTR_BAXCEL: u8 = 0x20;
pub const ATTR_SPACE: u8 = 0x40;

/// Jump table of an optimized `CHOOSE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChooseTable {
    /// Byte offset of each case, measured from the end of the jump table.
    pub case_offsets: Vec<u16>,
    /// Byte offset of the `CHOOSE` function token.
    pub function_offset: u16,
}

/// What an inserted whitespace run precedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpaceKind {
    SpaceBefore,
    NewlineBefore,
    SpaceBeforeOpenParen,
    NewlineBeforeOpenParen,
    SpaceBeforeCloseParen,
    NewlineBeforeCloseParen,
    SpaceBeforeExpression,
}

impl SpaceKind {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::SpaceBefore),
            0x01 => Some(Self::NewlineBefore),
            0x02 => Some(Self::SpaceBeforeOpenParen),
            0x03 => Some(Self::NewlineBeforeOpenParen),
            0x04 => Some(Self::SpaceBeforeCloseParen),
            0x05 => Some(Self::NewlineBeforeCloseParen),
            0x06 => Some(Self::SpaceBeforeExpression),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::SpaceBefore => 0x00,
            Self::NewlineBefore => 0x01,
            Self::SpaceBeforeOpenParen => 0x02,
            Self::NewlineBeforeOpenParen => 0x03,
            Self::SpaceBeforeCloseParen => 0x04,
            Self::NewlineBeforeCloseParen => 0x05,
            Self::SpaceBeforeExpression => 0x06,
        }
    }

    pub const fn is_newline(self) -> bool {
        matches!(
            self,
            Self::NewlineBefore | Self::NewlineBeforeOpenParen | Self::NewlineBeforeCloseParen
        )
    }
}

/// Typed reading of the active attribute flag and its `wAttr` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind<'a> {
    SemiVolatile,
    /// Byte distance to the false branch (or to the closing skip).
    If { distance: u16 },
    Choose(&'a ChooseTable),
    /// Byte distance to jump over, minus one.
    Skip { distance: u16 },
    Sum,
    /// Macro `=` assignment marker (BASIC-style).
    Assignment,
    Space { kind: Option<SpaceKind>, count: u8 },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttrPtg {
    flags: u8,
    data: u16,
    choose: Option<ChooseTable>,
}

impl AttrPtg {
    pub fn semi_volatile() -> Self {
        Self::plain(ATTR_SEMI_VOLATILE, 0)
    }

    pub fn if_jump(distance: u16) -> Self {
        Self::plain(ATTR_IF, distance)
    }

    pub fn skip(distance: u16) -> Self {
        Self::plain(ATTR_SKIP, distance)
    }

    pub fn sum() -> Self {
        Self::plain(ATTR_SUM, 0)
    }

    pub fn assignment() -> Self {
        Self::plain(ATTR_BAXCEL, 0)
    }

    pub fn space(kind: SpaceKind, count: u8) -> Self {
        let data = u16::from(kind.code()) | (u16::from(count) << 8);
        Self::plain(ATTR_SPACE, data)
    }

    pub fn choose(case_offsets: Vec<u16>, function_offset: u16) -> Result<Self, PtgError> {
        let len = case_offsets.len();
        let data = u16::try_from(len).map_err(|_| PtgError::ChooseTableTooLong { len })?;
        Ok(Self {
            flags: ATTR_CHOOSE,
            data,
            choose: Some(ChooseTable {
                case_offsets,
                function_offset,
            }),
        })
    }

    fn plain(flags: u8, data: u16) -> Self {
        Self {
            flags,
            data,
            choose: None,
        }
    }

    /// Non-choose attribute with a raw flag byte (the choose bit is cleared).
    pub fn from_raw(flags: u8, data: u16) -> Self {
        Self::plain(flags & !ATTR_CHOOSE, data)
    }

    pub(crate) fn from_decoded(flags: u8, data: u16, choose: Option<ChooseTable>) -> Self {
        Self {
            flags,
            data,
            choose,
        }
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn data(&self) -> u16 {
        self.data
    }

    pub fn choose_table(&self) -> Option<&ChooseTable> {
        self.choose.as_ref()
    }

    pub fn is_semi_volatile(&self) -> bool {
        self.flags & ATTR_SEMI_VOLATILE != 0
    }

    pub fn is_optimized_if(&self) -> bool {
        self.flags & ATTR_IF != 0
    }

    pub fn is_optimized_choose(&self) -> bool {
        self.flags & ATTR_CHOOSE != 0
    }

    pub fn is_skip(&self) -> bool {
        self.flags & ATTR_SKIP != 0
    }

    pub fn is_sum(&self) -> bool {
        self.flags & ATTR_SUM != 0
    }

    pub fn is_assignment(&self) -> bool {
        self.flags & ATTR_BAXCEL != 0
    }

    pub fn is_space(&self) -> bool {
        self.flags & ATTR_SPACE != 0
    }

    /// Interpret the attribute by its most specific flag.
    ///
    /// Semi-volatile is reported only when no other flag is set, since Excel combines it with
    /// the others (e.g. a volatile whitespace run).
    pub fn kind(&self) -> AttrKind<'_> {
        if let Some(table) = &self.choose {
            return AttrKind::Choose(table);
        }
        if self.is_space() {
            let [type_byte, count] = self.data.to_le_bytes();
            return AttrKind::Space {
                kind: SpaceKind::from_code(type_byte),
                count,
            };
        }
        if self.is_optimized_if() {
            return AttrKind::If {
                distance: self.data,
            };
        }
        if self.is_skip() {
            return AttrKind::Skip {
                distance: self.data,
            };
        }
        if self.is_sum() {
            return AttrKind::Sum;
        }
        if self.is_assignment() {
            return AttrKind::Assignment;
        }
        if self.is_semi_volatile() {
            return AttrKind::SemiVolatile;
        }
        AttrKind::Other
    }

    pub(crate) fn payload_size(&self) -> usize {
        match &self.choose {
            Some(table) => 3 + (table.case_offsets.len() + 1) * 2,
            None => 3,
        }
    }
}
