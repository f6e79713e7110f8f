//! Operand classes (REF / VALUE / ARRAY).
//!
//! In BIFF8 the class of a classified ptg is not stored separately: it selects one of three
//! opcode bands. The low five bits of the opcode (plus `0x20`) give the *base* opcode, bits 5-6
//! give the class:
//!
//! | Band        | Class |
//! |-------------|-------|
//! | 0x20..=0x3F | REF   |
//! | 0x40..=0x5F | VALUE |
//! | 0x60..=0x7F | ARRAY |

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// First opcode of the classified range. Opcodes below this are structural.
pub const CLASSIFIED_OPCODE_BASE: u8 = 0x20;

const CLASS_MASK: u8 = 0x60;
const BASE_MASK: u8 = 0x1F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperandClass {
    Reference,
    Value,
    Array,
}

impl OperandClass {
    /// Class encoded by the band a raw classified opcode falls in.
    ///
    /// Returns `None` for structural opcodes (`< 0x20`) and for opcodes `>= 0x80`.
    pub fn from_opcode(raw: u8) -> Option<Self> {
        if raw >= 0x80 {
            return None;
        }
        match raw & CLASS_MASK {
            0x20 => Some(Self::Reference),
            0x40 => Some(Self::Value),
            0x60 => Some(Self::Array),
            _ => None,
        }
    }

    /// Band bits for this class.
    pub const fn band(self) -> u8 {
        match self {
            Self::Reference => 0x20,
            Self::Value => 0x40,
            Self::Array => 0x60,
        }
    }

    /// Combine a base opcode (`0x20..=0x3F`) with this class into the raw opcode.
    pub const fn encode(self, base: u8) -> u8 {
        (base & BASE_MASK) | self.band()
    }

    /// Single-letter code used in function metadata tables.
    pub const fn code(self) -> char {
        match self {
            Self::Reference => 'R',
            Self::Value => 'V',
            Self::Array => 'A',
        }
    }
}

/// Base opcode (`0x20..=0x3F`) of a raw classified opcode.
pub const fn base_opcode(raw: u8) -> u8 {
    (raw & BASE_MASK) | CLASSIFIED_OPCODE_BASE
}
