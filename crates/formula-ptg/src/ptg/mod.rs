//! The closed set of BIFF8 parsed-expression tokens.
//!
//! Structural tokens (opcode `< 0x20`) live in [`BasePtg`] and have no operand class.
//! Everything else is a [`ClassifiedPtg`] paired with the [`OperandClass`] selected by its
//! opcode band. The class is fixed when the [`Ptg`] is built; re-tagging produces a new token.

pub mod array;
pub mod attr;
pub mod constant;
pub mod func;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use array::{ArrayPtg, ArrayValue};
pub use attr::{AttrKind, AttrPtg, ChooseTable, SpaceKind};
pub use constant::{ErrorCode, StrPtg};
pub use func::{function_call, FuncPtg, FuncVarPtg, FunctionInfo};

use crate::class::OperandClass;
use crate::coords::{AreaCoord, CellCoord, ExternSheetIndex};
use crate::error::ClassificationError;

pub const PTG_EXP: u8 = 0x01;
pub const PTG_TBL: u8 = 0x02;
pub const PTG_PAREN: u8 = 0x15;
pub const PTG_MISS_ARG: u8 = 0x16;
pub const PTG_STR: u8 = 0x17;
pub const PTG_ATTR: u8 = 0x19;
pub const PTG_ERR: u8 = 0x1C;
pub const PTG_BOOL: u8 = 0x1D;
pub const PTG_INT: u8 = 0x1E;
pub const PTG_NUM: u8 = 0x1F;

pub const PTG_ARRAY: u8 = 0x20;
pub const PTG_FUNC: u8 = 0x21;
pub const PTG_FUNC_VAR: u8 = 0x22;
pub const PTG_NAME: u8 = 0x23;
pub const PTG_REF: u8 = 0x24;
pub const PTG_AREA: u8 = 0x25;
pub const PTG_MEM_AREA: u8 = 0x26;
pub const PTG_MEM_ERR: u8 = 0x27;
pub const PTG_MEM_NO_MEM: u8 = 0x28;
pub const PTG_MEM_FUNC: u8 = 0x29;
pub const PTG_REF_ERR: u8 = 0x2A;
pub const PTG_AREA_ERR: u8 = 0x2B;
pub const PTG_REF_N: u8 = 0x2C;
pub const PTG_AREA_N: u8 = 0x2D;
pub const PTG_NAME_X: u8 = 0x39;
pub const PTG_REF_3D: u8 = 0x3A;
pub const PTG_AREA_3D: u8 = 0x3B;
pub const PTG_REF_ERR_3D: u8 = 0x3C;
pub const PTG_AREA_ERR_3D: u8 = 0x3D;

/// Binary and unary operators (0x03..=0x14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Concat,
    LessThan,
    LessEqual,
    Equal,
    GreaterEqual,
    GreaterThan,
    NotEqual,
    Intersection,
    Union,
    Range,
    UnaryPlus,
    UnaryMinus,
    Percent,
}

impl Operator {
    const ALL: [Operator; 18] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Power,
        Self::Concat,
        Self::LessThan,
        Self::LessEqual,
        Self::Equal,
        Self::GreaterEqual,
        Self::GreaterThan,
        Self::NotEqual,
        Self::Intersection,
        Self::Union,
        Self::Range,
        Self::UnaryPlus,
        Self::UnaryMinus,
        Self::Percent,
    ];

    pub fn from_opcode(opcode: u8) -> Option<Self> {
        let pos = usize::from(opcode.checked_sub(0x03)?);
        Self::ALL.get(pos).copied()
    }

    pub fn opcode(self) -> u8 {
        // `ALL` is ordered by opcode, starting at 0x03.
        0x03 + self as u8
    }

    /// Infix text (prefix for unary plus/minus, postfix for percent).
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add | Self::UnaryPlus => "+",
            Self::Subtract | Self::UnaryMinus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Power => "^",
            Self::Concat => "&",
            Self::LessThan => "<",
            Self::LessEqual => "<=",
            Self::Equal => "=",
            Self::GreaterEqual => ">=",
            Self::GreaterThan => ">",
            Self::NotEqual => "<>",
            Self::Intersection => " ",
            Self::Union => ",",
            Self::Range => ":",
            Self::Percent => "%",
        }
    }

    pub fn is_unary(self) -> bool {
        matches!(self, Self::UnaryPlus | Self::UnaryMinus | Self::Percent)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "Add",
            Self::Subtract => "Sub",
            Self::Multiply => "Mul",
            Self::Divide => "Div",
            Self::Power => "Power",
            Self::Concat => "Concat",
            Self::LessThan => "Lt",
            Self::LessEqual => "Le",
            Self::Equal => "Eq",
            Self::GreaterEqual => "Ge",
            Self::GreaterThan => "Gt",
            Self::NotEqual => "Ne",
            Self::Intersection => "Isect",
            Self::Union => "Union",
            Self::Range => "Range",
            Self::UnaryPlus => "Uplus",
            Self::UnaryMinus => "Uminus",
            Self::Percent => "Percent",
        }
    }
}

/// Structural tokens. None of these carry an operand class.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BasePtg {
    /// Shared/array formula placeholder pointing at the anchor cell.
    Exp { row: u16, col: u16 },
    /// Data table placeholder pointing at the table's anchor cell.
    Tbl { row: u16, col: u16 },
    Operator(Operator),
    Paren,
    MissArg,
    Str(StrPtg),
    Attr(AttrPtg),
    Err(ErrorCode),
    Bool(bool),
    Int(u16),
    Num(f64),
}

impl BasePtg {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Exp { .. } => PTG_EXP,
            Self::Tbl { .. } => PTG_TBL,
            Self::Operator(op) => op.opcode(),
            Self::Paren => PTG_PAREN,
            Self::MissArg => PTG_MISS_ARG,
            Self::Str(_) => PTG_STR,
            Self::Attr(_) => PTG_ATTR,
            Self::Err(_) => PTG_ERR,
            Self::Bool(_) => PTG_BOOL,
            Self::Int(_) => PTG_INT,
            Self::Num(_) => PTG_NUM,
        }
    }

    /// Payload bytes after the opcode.
    pub fn payload_size(&self) -> usize {
        match self {
            Self::Exp { .. } | Self::Tbl { .. } => 4,
            Self::Operator(_) | Self::Paren | Self::MissArg => 0,
            Self::Str(s) => s.payload_size(),
            Self::Attr(attr) => attr.payload_size(),
            Self::Err(_) | Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::Num(_) => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Exp { .. } => "Exp",
            Self::Tbl { .. } => "Tbl",
            Self::Operator(op) => op.name(),
            Self::Paren => "Paren",
            Self::MissArg => "MissArg",
            Self::Str(_) => "Str",
            Self::Attr(_) => "Attr",
            Self::Err(_) => "Err",
            Self::Bool(_) => "Bool",
            Self::Int(_) => "Int",
            Self::Num(_) => "Num",
        }
    }
}

/// Payload shared by `PtgMemArea`, `PtgMemErr` and `PtgMemNoMem`.
///
/// `size` is the byte length of the sub-expression tokens that follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MemPtg {
    pub reserved: u32,
    pub size: u16,
}

/// Tokens that carry an operand class.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClassifiedPtg {
    Array(ArrayPtg),
    Func(FuncPtg),
    FuncVar(FuncVarPtg),
    /// Defined name, 1-based index into the workbook name table.
    Name { index: u16, reserved: u16 },
    Ref(CellCoord),
    Area(AreaCoord),
    MemArea(MemPtg),
    MemErr(MemPtg),
    MemNoMem(MemPtg),
    MemFunc { size: u16 },
    RefErr { reserved: u32 },
    AreaErr { reserved: u64 },
    /// Cell reference stored as offsets from the host cell (shared formulas, names).
    RefN(CellCoord),
    AreaN(AreaCoord),
    /// Name in an external (or add-in) workbook.
    NameX {
        sheet: ExternSheetIndex,
        index: u16,
        reserved: u16,
    },
    Ref3d {
        sheet: ExternSheetIndex,
        cell: CellCoord,
    },
    Area3d {
        sheet: ExternSheetIndex,
        area: AreaCoord,
    },
    DeletedRef3d {
        sheet: ExternSheetIndex,
        reserved: u32,
    },
    DeletedArea3d {
        sheet: ExternSheetIndex,
        reserved: u64,
    },
}

impl ClassifiedPtg {
    /// Base opcode (`0x20..=0x3F`); the stored opcode adds the class band.
    pub fn base_opcode(&self) -> u8 {
        match self {
            Self::Array(_) => PTG_ARRAY,
            Self::Func(_) => PTG_FUNC,
            Self::FuncVar(_) => PTG_FUNC_VAR,
            Self::Name { .. } => PTG_NAME,
            Self::Ref(_) => PTG_REF,
            Self::Area(_) => PTG_AREA,
            Self::MemArea(_) => PTG_MEM_AREA,
            Self::MemErr(_) => PTG_MEM_ERR,
            Self::MemNoMem(_) => PTG_MEM_NO_MEM,
            Self::MemFunc { .. } => PTG_MEM_FUNC,
            Self::RefErr { .. } => PTG_REF_ERR,
            Self::AreaErr { .. } => PTG_AREA_ERR,
            Self::RefN(_) => PTG_REF_N,
            Self::AreaN(_) => PTG_AREA_N,
            Self::NameX { .. } => PTG_NAME_X,
            Self::Ref3d { .. } => PTG_REF_3D,
            Self::Area3d { .. } => PTG_AREA_3D,
            Self::DeletedRef3d { .. } => PTG_REF_ERR_3D,
            Self::DeletedArea3d { .. } => PTG_AREA_ERR_3D,
        }
    }

    /// Class a parser would pick when nothing in the formula context overrides it.
    pub fn default_class(&self) -> OperandClass {
        match self {
            Self::Array(_) => OperandClass::Array,
            Self::Func(func) => func.info().return_class(),
            Self::FuncVar(func) => func.info().return_class(),
            Self::MemArea(_) | Self::MemErr(_) | Self::MemNoMem(_) | Self::NameX { .. } => {
                OperandClass::Value
            }
            _ => OperandClass::Reference,
        }
    }

    /// Payload bytes after the opcode. For arrays this is the inline placeholder only.
    pub fn payload_size(&self) -> usize {
        match self {
            Self::Array(_) => array::ARRAY_PLACEHOLDER_SIZE,
            Self::Func(_) | Self::MemFunc { .. } => 2,
            Self::FuncVar(_) => 3,
            Self::Name { .. } | Self::Ref(_) | Self::RefN(_) | Self::RefErr { .. } => 4,
            Self::Area(_) | Self::AreaN(_) | Self::AreaErr { .. } => 8,
            Self::MemArea(_) | Self::MemErr(_) | Self::MemNoMem(_) => 6,
            Self::NameX { .. } | Self::Ref3d { .. } | Self::DeletedRef3d { .. } => 6,
            Self::Area3d { .. } | Self::DeletedArea3d { .. } => 10,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Array(_) => "Array",
            Self::Func(_) => "Func",
            Self::FuncVar(_) => "FuncVar",
            Self::Name { .. } => "Name",
            Self::Ref(_) => "Ref",
            Self::Area(_) => "Area",
            Self::MemArea(_) => "MemArea",
            Self::MemErr(_) => "MemErr",
            Self::MemNoMem(_) => "MemNoMem",
            Self::MemFunc { .. } => "MemFunc",
            Self::RefErr { .. } => "RefErr",
            Self::AreaErr { .. } => "AreaErr",
            Self::RefN(_) => "RefN",
            Self::AreaN(_) => "AreaN",
            Self::NameX { .. } => "NameX",
            Self::Ref3d { .. } => "Ref3d",
            Self::Area3d { .. } => "Area3d",
            Self::DeletedRef3d { .. } => "RefErr3d",
            Self::DeletedArea3d { .. } => "AreaErr3d",
        }
    }

    /// External sheet index for tokens that address another sheet.
    pub fn extern_sheet(&self) -> Option<ExternSheetIndex> {
        match self {
            Self::NameX { sheet, .. }
            | Self::Ref3d { sheet, .. }
            | Self::Area3d { sheet, .. }
            | Self::DeletedRef3d { sheet, .. }
            | Self::DeletedArea3d { sheet, .. } => Some(*sheet),
            _ => None,
        }
    }
}

/// One parsed-expression token.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Ptg {
    Base(BasePtg),
    Classified {
        class: OperandClass,
        ptg: ClassifiedPtg,
    },
}

impl Ptg {
    /// Classified token tagged with an explicit class.
    pub fn classified(class: OperandClass, ptg: ClassifiedPtg) -> Self {
        Self::Classified { class, ptg }
    }

    pub fn is_base(&self) -> bool {
        matches!(self, Self::Base(_))
    }

    /// Raw opcode byte, including the class band for classified tokens.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Base(ptg) => ptg.opcode(),
            Self::Classified { class, ptg } => class.encode(ptg.base_opcode()),
        }
    }

    pub fn class(&self) -> Result<OperandClass, ClassificationError> {
        match self {
            Self::Base(ptg) => Err(ClassificationError {
                opcode: ptg.opcode(),
            }),
            Self::Classified { class, .. } => Ok(*class),
        }
    }

    /// Same token with a different class.
    pub fn with_class(self, class: OperandClass) -> Result<Self, ClassificationError> {
        match self {
            Self::Base(ptg) => Err(ClassificationError {
                opcode: ptg.opcode(),
            }),
            Self::Classified { ptg, .. } => Ok(Self::Classified { class, ptg }),
        }
    }

    /// Class a parser would assign when the formula context does not force one.
    pub fn default_class(&self) -> Result<OperandClass, ClassificationError> {
        match self {
            Self::Base(ptg) => Err(ClassificationError {
                opcode: ptg.opcode(),
            }),
            Self::Classified { ptg, .. } => Ok(ptg.default_class()),
        }
    }

    /// Encoded size in bytes (opcode + payload). Array constants count only their placeholder;
    /// see [`Ptg::array_data_size`].
    pub fn size(&self) -> usize {
        1 + match self {
            Self::Base(ptg) => ptg.payload_size(),
            Self::Classified { ptg, .. } => ptg.payload_size(),
        }
    }

    /// Size of the trailing data written after all tokens (non-zero only for arrays).
    pub fn array_data_size(&self) -> usize {
        match self {
            Self::Classified {
                ptg: ClassifiedPtg::Array(array),
                ..
            } => array.data_size(),
            _ => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Base(ptg) => ptg.name(),
            Self::Classified { ptg, .. } => ptg.name(),
        }
    }

    pub fn as_classified(&self) -> Option<&ClassifiedPtg> {
        match self {
            Self::Base(_) => None,
            Self::Classified { ptg, .. } => Some(ptg),
        }
    }

    pub fn as_base(&self) -> Option<&BasePtg> {
        match self {
            Self::Base(ptg) => Some(ptg),
            Self::Classified { .. } => None,
        }
    }
}

impl From<BasePtg> for Ptg {
    fn from(ptg: BasePtg) -> Self {
        Self::Base(ptg)
    }
}

/// Tags the token with its default class.
impl From<ClassifiedPtg> for Ptg {
    fn from(ptg: ClassifiedPtg) -> Self {
        Self::Classified {
            class: ptg.default_class(),
            ptg,
        }
    }
}

impl From<Operator> for Ptg {
    fn from(op: Operator) -> Self {
        Self::Base(BasePtg::Operator(op))
    }
}
