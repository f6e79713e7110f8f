//! Formula text from a token sequence.
//!
//! Tokens are in RPN order, so rendering runs a stack of text fragments: operands push, operators
//! and function calls pop their inputs and push the combined text.

mod extern_sheet;
pub mod sheet_name;

pub use extern_sheet::{prepend_sheet_name, ExternalSheet, NoSheets, SheetNameResolver};

use crate::coords::CellCoord;
use crate::error::RenderError;
use crate::ptg::{ArrayPtg, ArrayValue, AttrKind, BasePtg, ClassifiedPtg, Operator, Ptg};

/// Per-call rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    /// Host cell used to resolve `PtgRefN`/`PtgAreaN` offsets. Without it those tokens fail to
    /// render.
    pub base_cell: Option<CellCoord>,
}

/// Render `ptgs` as formula text without the leading `=`.
///
/// An empty sequence renders as the empty string.
pub fn to_formula_string(
    ptgs: &[Ptg],
    resolver: &dyn SheetNameResolver,
    options: RenderOptions,
) -> Result<String, RenderError> {
    if ptgs.is_empty() {
        return Ok(String::new());
    }

    let mut stack: Vec<String> = Vec::new();
    for (index, ptg) in ptgs.iter().enumerate() {
        match ptg {
            Ptg::Base(base) => render_base(base, index, &mut stack)?,
            Ptg::Classified { ptg, .. } => {
                render_classified(ptg, index, resolver, options, &mut stack)?
            }
        }
    }

    match stack.len() {
        1 => Ok(stack.pop().unwrap_or_default()),
        len => Err(RenderError::UnbalancedStack { len }),
    }
}

fn pop_n(
    stack: &mut Vec<String>,
    count: usize,
    index: usize,
    ptg: &'static str,
) -> Result<Vec<String>, RenderError> {
    if stack.len() < count {
        return Err(RenderError::StackUnderflow {
            index,
            ptg,
            needed: count,
            available: stack.len(),
        });
    }
    Ok(stack.split_off(stack.len() - count))
}

fn pop_one(stack: &mut Vec<String>, index: usize, ptg: &'static str) -> Result<String, RenderError> {
    stack.pop().ok_or(RenderError::StackUnderflow {
        index,
        ptg,
        needed: 1,
        available: 0,
    })
}

fn render_base(base: &BasePtg, index: usize, stack: &mut Vec<String>) -> Result<(), RenderError> {
    match base {
        BasePtg::Exp { .. } | BasePtg::Tbl { .. } => {
            return Err(RenderError::UnrenderablePtg {
                index,
                ptg: base.name(),
            })
        }
        BasePtg::Operator(op) => {
            let text = match op {
                Operator::UnaryPlus | Operator::UnaryMinus => {
                    let operand = pop_one(stack, index, op.name())?;
                    format!("{}{operand}", op.symbol())
                }
                Operator::Percent => {
                    let operand = pop_one(stack, index, op.name())?;
                    format!("{operand}%")
                }
                _ => {
                    let mut operands = pop_n(stack, 2, index, op.name())?.into_iter();
                    let lhs = operands.next().unwrap_or_default();
                    let rhs = operands.next().unwrap_or_default();
                    format!("{lhs}{}{rhs}", op.symbol())
                }
            };
            stack.push(text);
        }
        BasePtg::Paren => {
            let inner = pop_one(stack, index, "Paren")?;
            stack.push(format!("({inner})"));
        }
        BasePtg::MissArg => stack.push(String::new()),
        BasePtg::Str(s) => stack.push(s.to_formula_text()),
        BasePtg::Attr(attr) => {
            if let AttrKind::Sum = attr.kind() {
                let operand = pop_one(stack, index, "Attr")?;
                stack.push(format!("SUM({operand})"));
            }
        }
        BasePtg::Err(code) => stack.push(code.literal().to_string()),
        BasePtg::Bool(value) => stack.push(bool_text(*value).to_string()),
        BasePtg::Int(value) => stack.push(value.to_string()),
        BasePtg::Num(value) => stack.push(format_number(*value)),
    }
    Ok(())
}

fn render_classified(
    ptg: &ClassifiedPtg,
    index: usize,
    resolver: &dyn SheetNameResolver,
    options: RenderOptions,
    stack: &mut Vec<String>,
) -> Result<(), RenderError> {
    let text = match ptg {
        ClassifiedPtg::Array(array) => array_text(array),
        ClassifiedPtg::Func(func) => {
            let Some(name) = func.info().name() else {
                return Err(RenderError::UnrenderablePtg {
                    index,
                    ptg: ptg.name(),
                });
            };
            let args = pop_n(stack, usize::from(func.arg_count()), index, ptg.name())?;
            call_text(name, &args)
        }
        ClassifiedPtg::FuncVar(func) => {
            let args = pop_n(stack, usize::from(func.arg_count()), index, ptg.name())?;
            match func.info().name() {
                Some(name) => call_text(name, &args),
                None => match args.split_first() {
                    Some((name, rest)) => call_text(name, rest),
                    None => {
                        return Err(RenderError::StackUnderflow {
                            index,
                            ptg: ptg.name(),
                            needed: 1,
                            available: 0,
                        })
                    }
                },
            }
        }
        ClassifiedPtg::Name { index: name, .. } => match resolver.name_text(*name) {
            Some(text) => text,
            None => {
                log::debug!("defined name {name} did not resolve; rendering #REF!");
                "#REF!".to_string()
            }
        },
        ClassifiedPtg::Ref(cell) => cell.to_a1(),
        ClassifiedPtg::Area(area) => area.to_a1(),
        ClassifiedPtg::MemArea(_)
        | ClassifiedPtg::MemErr(_)
        | ClassifiedPtg::MemNoMem(_)
        | ClassifiedPtg::MemFunc { .. } => return Ok(()),
        ClassifiedPtg::RefErr { .. } | ClassifiedPtg::AreaErr { .. } => "#REF!".to_string(),
        ClassifiedPtg::RefN(cell) => {
            let base = options.base_cell.ok_or(RenderError::RelativeWithoutBase {
                index,
                ptg: ptg.name(),
            })?;
            cell.resolve_offset(base).to_a1()
        }
        ClassifiedPtg::AreaN(area) => {
            let base = options.base_cell.ok_or(RenderError::RelativeWithoutBase {
                index,
                ptg: ptg.name(),
            })?;
            area.resolve_offset(base).to_a1()
        }
        ClassifiedPtg::NameX {
            sheet,
            index: name,
            ..
        } => match resolver.name_x_text(*sheet, *name) {
            Some(text) => text,
            None => {
                log::debug!("external name {name} ({sheet}) did not resolve; rendering #REF!");
                "#REF!".to_string()
            }
        },
        ClassifiedPtg::Ref3d { sheet, cell } => prepend_sheet_name(resolver, *sheet, &cell.to_a1()),
        ClassifiedPtg::Area3d { sheet, area } => {
            prepend_sheet_name(resolver, *sheet, &area.to_a1())
        }
        ClassifiedPtg::DeletedRef3d { sheet, .. } | ClassifiedPtg::DeletedArea3d { sheet, .. } => {
            prepend_sheet_name(resolver, *sheet, "#REF!")
        }
    };
    stack.push(text);
    Ok(())
}

fn call_text(name: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(name.len() + 2 + args.iter().map(String::len).sum::<usize>());
    out.push_str(name);
    out.push('(');
    out.push_str(&args.join(","));
    out.push(')');
    out
}

fn array_text(array: &ArrayPtg) -> String {
    let mut out = String::from("{");
    for row in 0..array.rows() {
        if row > 0 {
            out.push(';');
        }
        for (col, value) in array.row(row).unwrap_or_default().iter().enumerate() {
            if col > 0 {
                out.push(',');
            }
            match value {
                ArrayValue::Empty => {}
                ArrayValue::Number(n) => out.push_str(&format_number(*n)),
                ArrayValue::Str(s) => {
                    out.push('"');
                    out.push_str(&s.replace('"', "\"\""));
                    out.push('"');
                }
                ArrayValue::Bool(b) => out.push_str(bool_text(*b)),
                ArrayValue::Error(code) => out.push_str(code.literal()),
            }
        }
    }
    out.push('}');
    out
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Largest magnitude written out in plain digits (Excel shows 15 significant digits).
const PLAIN_DIGITS_MAX: f64 = 1e15;
/// Smallest non-zero magnitude written out in plain digits.
const PLAIN_DIGITS_MIN: f64 = 1e-9;

/// Number literal text: integral values without a fractional part, others in shortest form.
///
/// Magnitudes outside the plain-digit range use Excel's exponent form (`1E+20`, `2.5E-10`).
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let magnitude = value.abs();
    if magnitude >= PLAIN_DIGITS_MAX || (magnitude != 0.0 && magnitude < PLAIN_DIGITS_MIN) {
        return exponent_text(value);
    }
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn exponent_text(value: f64) -> String {
    // `{:E}` gives the shortest mantissa with an unsigned positive exponent (`1E20`).
    let text = format!("{value:E}");
    match text.split_once('E') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}E+{exponent}")
        }
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_numbers_like_formula_literals() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(123_456_789_012_345.0), "123456789012345");
    }

    #[test]
    fn large_and_tiny_numbers_use_exponent_form() {
        assert_eq!(format_number(1e20), "1E+20");
        assert_eq!(format_number(-1e15), "-1E+15");
        assert_eq!(format_number(1.5e300), "1.5E+300");
        assert_eq!(format_number(2.5e-10), "2.5E-10");
        assert_eq!(format_number(0.000_000_001), "0.000000001");
    }

    #[test]
    fn empty_sequence_renders_empty_text() {
        assert_eq!(
            to_formula_string(&[], &NoSheets, RenderOptions::default()),
            Ok(String::new())
        );
    }
}
