//! Function metadata consulted when building `PtgFunc` / `PtgFuncVar` tokens.
//!
//! Tokens never hold on to a directory: they copy the fields they need out of a
//! [`FunctionDescriptor`] when they are built, so swapping or mutating the directory later has no
//! effect on existing tokens.

use crate::class::OperandClass;

#[cfg(feature = "builtin-functions")]
mod builtin;

#[cfg(feature = "builtin-functions")]
pub use builtin::BuiltinFunctions;

/// BIFF `iftab` value used for user-defined / add-in / future functions.
///
/// A call through this index carries the function name as its first operand (usually a
/// `PtgNameX`).
pub const EXTERNAL_FUNCTION_INDEX: u16 = 255;

/// Metadata for one built-in function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub index: u16,
    pub name: String,
    pub return_class: OperandClass,
    /// Class of each declared parameter. Arguments past the end reuse the last entry.
    pub param_classes: Vec<OperandClass>,
    pub min_args: u8,
    pub max_args: u8,
    pub volatile: bool,
}

impl FunctionDescriptor {
    pub fn is_fixed_arity(&self) -> bool {
        self.min_args == self.max_args
    }

    /// Class of the parameter at `index`, reusing the last declared class for variadic tails.
    pub fn param_class(&self, index: usize) -> OperandClass {
        param_class_at(&self.param_classes, index)
    }
}

pub(crate) fn param_class_at(classes: &[OperandClass], index: usize) -> OperandClass {
    match classes.get(index).or_else(|| classes.last()) {
        Some(class) => *class,
        None => OperandClass::Value,
    }
}

/// Lookup capability for function metadata.
///
/// Misses are not errors: callers fall back to treating the call as an external function.
pub trait FunctionDirectory {
    fn by_index(&self, index: u16) -> Option<FunctionDescriptor>;

    fn index_by_name(&self, name: &str, case_insensitive: bool) -> Option<u16>;

    fn by_name(&self, name: &str, case_insensitive: bool) -> Option<FunctionDescriptor> {
        let index = self.index_by_name(name, case_insensitive)?;
        self.by_index(index)
    }
}

impl<T: FunctionDirectory + ?Sized> FunctionDirectory for &T {
    fn by_index(&self, index: u16) -> Option<FunctionDescriptor> {
        (**self).by_index(index)
    }

    fn index_by_name(&self, name: &str, case_insensitive: bool) -> Option<u16> {
        (**self).index_by_name(name, case_insensitive)
    }
}

/// Directory that knows no functions; every call is treated as external.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFunctions;

impl FunctionDirectory for NoFunctions {
    fn by_index(&self, _index: u16) -> Option<FunctionDescriptor> {
        None
    }

    fn index_by_name(&self, _name: &str, _case_insensitive: bool) -> Option<u16> {
        None
    }
}
