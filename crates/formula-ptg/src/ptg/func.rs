//! `PtgFunc` (0x21) and `PtgFuncVar` (0x22): built-in function calls.
//!
//! Both tokens copy what they need out of the [`FunctionDirectory`] when they are built, so the
//! directory is only consulted at construction time.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::class::OperandClass;
use crate::error::PtgError;
use crate::functions::{param_class_at, FunctionDescriptor, FunctionDirectory, EXTERNAL_FUNCTION_INDEX};

/// Largest argument count a `PtgFuncVar` can encode (7 bits).
pub const MAX_FUNC_VAR_ARGS: u8 = 0x7F;

const PROMPT_BIT: u8 = 0x80;
const COMMAND_EQUIVALENT_BIT: u16 = 0x8000;
const FUNCTION_INDEX_MASK: u16 = 0x7FFF;

/// Function metadata captured when a function token is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FunctionInfo {
    index: u16,
    name: Option<String>,
    return_class: OperandClass,
    param_classes: Vec<OperandClass>,
    min_args: u8,
    max_args: u8,
    volatile: bool,
}

impl FunctionInfo {
    fn from_descriptor(desc: FunctionDescriptor) -> Self {
        Self {
            index: desc.index,
            name: Some(desc.name),
            return_class: desc.return_class,
            param_classes: desc.param_classes,
            min_args: desc.min_args,
            max_args: desc.max_args,
            volatile: desc.volatile,
        }
    }

    /// Snapshot for a call the directory does not know. The function name travels as the first
    /// operand, which is why the only declared parameter is a reference.
    fn external(index: u16) -> Self {
        Self {
            index,
            name: None,
            return_class: OperandClass::Value,
            param_classes: vec![OperandClass::Reference],
            min_args: 0,
            max_args: MAX_FUNC_VAR_ARGS,
            volatile: false,
        }
    }

    pub(crate) fn lookup_index(index: u16, functions: &dyn FunctionDirectory) -> Self {
        match functions.by_index(index) {
            Some(desc) => Self::from_descriptor(desc),
            None => {
                if index != EXTERNAL_FUNCTION_INDEX {
                    log::debug!("function index {index} not in directory; treating as external");
                }
                Self::external(index)
            }
        }
    }

    pub(crate) fn lookup_name(name: &str, functions: &dyn FunctionDirectory) -> Self {
        match functions.by_name(name, true) {
            Some(desc) => Self::from_descriptor(desc),
            None => {
                log::debug!("function `{name}` not in directory; treating as external");
                Self::external(EXTERNAL_FUNCTION_INDEX)
            }
        }
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    /// Resolved name, or `None` for external calls.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether the call names its function through its first operand.
    pub fn is_external(&self) -> bool {
        self.name.is_none()
    }

    pub fn return_class(&self) -> OperandClass {
        self.return_class
    }

    pub fn param_classes(&self) -> &[OperandClass] {
        &self.param_classes
    }

    /// Expected class of the argument at `index`.
    pub fn param_class(&self, index: usize) -> OperandClass {
        param_class_at(&self.param_classes, index)
    }

    pub fn min_args(&self) -> u8 {
        self.min_args
    }

    pub fn max_args(&self) -> u8 {
        self.max_args
    }

    pub fn is_volatile(&self) -> bool {
        self.volatile
    }
}

/// Fixed-arity function call. The argument count is implied by the function index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FuncPtg {
    info: FunctionInfo,
}

impl FuncPtg {
    pub fn from_index(index: u16, functions: &dyn FunctionDirectory) -> Self {
        Self {
            info: FunctionInfo::lookup_index(index, functions),
        }
    }

    pub fn from_name(name: &str, functions: &dyn FunctionDirectory) -> Self {
        Self {
            info: FunctionInfo::lookup_name(name, functions),
        }
    }

    pub fn info(&self) -> &FunctionInfo {
        &self.info
    }

    pub fn index(&self) -> u16 {
        self.info.index
    }

    /// Number of operands the call consumes. Unknown functions report 0.
    pub fn arg_count(&self) -> u8 {
        if self.info.is_external() {
            0
        } else {
            self.info.min_args
        }
    }
}

/// Variable-arity function call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FuncVarPtg {
    info: FunctionInfo,
    arg_count: u8,
    prompt: bool,
    command_equivalent: bool,
}

impl FuncVarPtg {
    pub fn from_index(
        index: u16,
        arg_count: u8,
        functions: &dyn FunctionDirectory,
    ) -> Result<Self, PtgError> {
        check_var_args(usize::from(arg_count))?;
        Ok(Self {
            info: FunctionInfo::lookup_index(index & FUNCTION_INDEX_MASK, functions),
            arg_count,
            prompt: false,
            command_equivalent: false,
        })
    }

    pub fn from_name(
        name: &str,
        arg_count: u8,
        functions: &dyn FunctionDirectory,
    ) -> Result<Self, PtgError> {
        check_var_args(usize::from(arg_count))?;
        Ok(Self {
            info: FunctionInfo::lookup_name(name, functions),
            arg_count,
            prompt: false,
            command_equivalent: false,
        })
    }

    /// Rebuild from the raw `cparams` byte and `tab` field.
    pub(crate) fn from_fields(argc: u8, tab: u16, functions: &dyn FunctionDirectory) -> Self {
        Self {
            info: FunctionInfo::lookup_index(tab & FUNCTION_INDEX_MASK, functions),
            arg_count: argc & MAX_FUNC_VAR_ARGS,
            prompt: argc & PROMPT_BIT != 0,
            command_equivalent: tab & COMMAND_EQUIVALENT_BIT != 0,
        }
    }

    pub fn info(&self) -> &FunctionInfo {
        &self.info
    }

    pub fn index(&self) -> u16 {
        self.info.index
    }

    pub fn arg_count(&self) -> u8 {
        self.arg_count
    }

    /// Macro-sheet "prompt the user" flag.
    pub fn prompts_user(&self) -> bool {
        self.prompt
    }

    /// Macro-sheet command-equivalent flag.
    pub fn is_command_equivalent(&self) -> bool {
        self.command_equivalent
    }

    pub(crate) fn argc_field(&self) -> u8 {
        let mut argc = self.arg_count & MAX_FUNC_VAR_ARGS;
        if self.prompt {
            argc |= PROMPT_BIT;
        }
        argc
    }

    pub(crate) fn tab_field(&self) -> u16 {
        let mut tab = self.info.index & FUNCTION_INDEX_MASK;
        if self.command_equivalent {
            tab |= COMMAND_EQUIVALENT_BIT;
        }
        tab
    }
}

fn check_var_args(got: usize) -> Result<(), PtgError> {
    if got > usize::from(MAX_FUNC_VAR_ARGS) {
        return Err(PtgError::TooManyArguments { got });
    }
    Ok(())
}

/// Token for a call to `name` with `arg_count` operands, classified by the function's return
/// class.
///
/// Known fixed-arity functions become `PtgFunc` and must be called with exactly their arity;
/// everything else (variadic and unknown functions) becomes `PtgFuncVar`. For unknown functions
/// the caller is expected to push the function name as the first operand and count it in
/// `arg_count`.
pub fn function_call(
    name: &str,
    arg_count: usize,
    functions: &dyn FunctionDirectory,
) -> Result<super::Ptg, PtgError> {
    if let Some(desc) = functions.by_name(name, true) {
        if desc.is_fixed_arity() {
            if arg_count != usize::from(desc.min_args) {
                return Err(PtgError::FixedArity {
                    name: desc.name,
                    expected: desc.min_args,
                    got: u8::try_from(arg_count).unwrap_or(u8::MAX),
                });
            }
            let func = FuncPtg {
                info: FunctionInfo::from_descriptor(desc),
            };
            return Ok(super::ClassifiedPtg::Func(func).into());
        }
    }

    check_var_args(arg_count)?;
    // Checked above.
    let argc = arg_count as u8;
    let func = FuncVarPtg::from_name(name, argc, functions)?;
    Ok(super::ClassifiedPtg::FuncVar(func).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::NoFunctions;

    #[test]
    fn unknown_index_keeps_raw_index_and_is_external() {
        let func = FuncPtg::from_index(400, &NoFunctions);
        assert_eq!(func.index(), 400);
        assert!(func.info().is_external());
        assert_eq!(func.arg_count(), 0);
        assert_eq!(func.info().param_class(3), OperandClass::Reference);
    }

    #[test]
    fn unknown_name_uses_external_sentinel() {
        let func = FuncVarPtg::from_name("MYUDF", 3, &NoFunctions).unwrap();
        assert_eq!(func.index(), EXTERNAL_FUNCTION_INDEX);
        assert_eq!(func.info().return_class(), OperandClass::Value);
    }

    #[test]
    fn func_var_fields_keep_macro_bits() {
        let func = FuncVarPtg::from_fields(0x83, 0x8000 | 4, &NoFunctions);
        assert_eq!(func.arg_count(), 3);
        assert!(func.prompts_user());
        assert!(func.is_command_equivalent());
        assert_eq!(func.index(), 4);
        assert_eq!(func.argc_field(), 0x83);
        assert_eq!(func.tab_field(), 0x8004);
    }

    #[test]
    fn rejects_too_many_arguments() {
        assert_eq!(
            FuncVarPtg::from_index(4, 200, &NoFunctions),
            Err(PtgError::TooManyArguments { got: 200 })
        );
    }
}
