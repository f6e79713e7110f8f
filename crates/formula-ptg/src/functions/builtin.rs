//! Static directory of BIFF8 built-in functions.
//!
//! Indices are the BIFF `iftab` values used by `PtgFunc`/`PtgFuncVar`. BIFF8 caps variadic
//! functions at 30 arguments. The table covers the classic functions that show up in the vast
//! majority of `.xls` formulas; anything else resolves as an external function.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::{FunctionDescriptor, FunctionDirectory};
use crate::class::OperandClass;

const R: OperandClass = OperandClass::Reference;
const V: OperandClass = OperandClass::Value;
const A: OperandClass = OperandClass::Array;

#[derive(Debug, Clone, Copy)]
struct FunctionSpec {
    id: u16,
    name: &'static str,
    min_args: u8,
    max_args: u8,
    return_class: OperandClass,
    params: &'static [OperandClass],
    volatile: bool,
}

const fn f(
    id: u16,
    name: &'static str,
    min_args: u8,
    max_args: u8,
    return_class: OperandClass,
    params: &'static [OperandClass],
) -> FunctionSpec {
    FunctionSpec {
        id,
        name,
        min_args,
        max_args,
        return_class,
        params,
        volatile: false,
    }
}

const fn volatile(spec: FunctionSpec) -> FunctionSpec {
    FunctionSpec {
        volatile: true,
        ..spec
    }
}

// Keep sorted by id; lookups binary-search this table.
const FUNCTION_SPECS: &[FunctionSpec] = &[
    f(0, "COUNT", 0, 30, V, &[R]),
    f(1, "IF", 2, 3, R, &[V, R]),
    f(2, "ISNA", 1, 1, V, &[V]),
    f(3, "ISERROR", 1, 1, V, &[V]),
    f(4, "SUM", 0, 30, V, &[R]),
    f(5, "AVERAGE", 1, 30, V, &[R]),
    f(6, "MIN", 1, 30, V, &[R]),
    f(7, "MAX", 1, 30, V, &[R]),
    f(8, "ROW", 0, 1, V, &[R]),
    f(9, "COLUMN", 0, 1, V, &[R]),
    f(10, "NA", 0, 0, V, &[]),
    f(11, "NPV", 2, 30, V, &[V, R]),
    f(12, "STDEV", 1, 30, V, &[R]),
    f(13, "DOLLAR", 1, 2, V, &[V]),
    f(14, "FIXED", 1, 3, V, &[V]),
    f(15, "SIN", 1, 1, V, &[V]),
    f(16, "COS", 1, 1, V, &[V]),
    f(17, "TAN", 1, 1, V, &[V]),
    f(18, "ATAN", 1, 1, V, &[V]),
    f(19, "PI", 0, 0, V, &[]),
    f(20, "SQRT", 1, 1, V, &[V]),
    f(21, "EXP", 1, 1, V, &[V]),
    f(22, "LN", 1, 1, V, &[V]),
    f(23, "LOG10", 1, 1, V, &[V]),
    f(24, "ABS", 1, 1, V, &[V]),
    f(25, "INT", 1, 1, V, &[V]),
    f(26, "SIGN", 1, 1, V, &[V]),
    f(27, "ROUND", 2, 2, V, &[V]),
    f(28, "LOOKUP", 2, 3, V, &[V, R]),
    f(29, "INDEX", 2, 4, R, &[R, V]),
    f(30, "REPT", 2, 2, V, &[V]),
    f(31, "MID", 3, 3, V, &[V]),
    f(32, "LEN", 1, 1, V, &[V]),
    f(33, "VALUE", 1, 1, V, &[V]),
    f(34, "TRUE", 0, 0, V, &[]),
    f(35, "FALSE", 0, 0, V, &[]),
    f(36, "AND", 1, 30, V, &[R]),
    f(37, "OR", 1, 30, V, &[R]),
    f(38, "NOT", 1, 1, V, &[V]),
    f(39, "MOD", 2, 2, V, &[V]),
    f(46, "VAR", 1, 30, V, &[R]),
    f(48, "TEXT", 2, 2, V, &[V]),
    f(56, "PV", 3, 5, V, &[V]),
    f(57, "FV", 3, 5, V, &[V]),
    f(58, "NPER", 3, 5, V, &[V]),
    f(59, "PMT", 3, 5, V, &[V]),
    f(60, "RATE", 3, 6, V, &[V]),
    f(61, "MIRR", 3, 3, V, &[R, V]),
    f(62, "IRR", 1, 2, V, &[R, V]),
    volatile(f(63, "RAND", 0, 0, V, &[])),
    f(64, "MATCH", 2, 3, V, &[V, R, R]),
    f(65, "DATE", 3, 3, V, &[V]),
    f(66, "TIME", 3, 3, V, &[V]),
    f(67, "DAY", 1, 1, V, &[V]),
    f(68, "MONTH", 1, 1, V, &[V]),
    f(69, "YEAR", 1, 1, V, &[V]),
    f(70, "WEEKDAY", 1, 2, V, &[V]),
    f(71, "HOUR", 1, 1, V, &[V]),
    f(72, "MINUTE", 1, 1, V, &[V]),
    f(73, "SECOND", 1, 1, V, &[V]),
    volatile(f(74, "NOW", 0, 0, V, &[])),
    f(75, "AREAS", 1, 1, V, &[R]),
    f(76, "ROWS", 1, 1, V, &[A]),
    f(77, "COLUMNS", 1, 1, V, &[A]),
    volatile(f(78, "OFFSET", 3, 5, R, &[R, V])),
    f(82, "SEARCH", 2, 3, V, &[V]),
    f(83, "TRANSPOSE", 1, 1, A, &[A]),
    f(86, "TYPE", 1, 1, V, &[V]),
    f(97, "ATAN2", 2, 2, V, &[V]),
    f(98, "ASIN", 1, 1, V, &[V]),
    f(99, "ACOS", 1, 1, V, &[V]),
    f(100, "CHOOSE", 2, 30, R, &[V, R]),
    f(101, "HLOOKUP", 3, 4, V, &[V, R, R, V]),
    f(102, "VLOOKUP", 3, 4, V, &[V, R, R, V]),
    f(105, "ISREF", 1, 1, V, &[R]),
    f(109, "LOG", 1, 2, V, &[V]),
    f(111, "CHAR", 1, 1, V, &[V]),
    f(112, "LOWER", 1, 1, V, &[V]),
    f(113, "UPPER", 1, 1, V, &[V]),
    f(114, "PROPER", 1, 1, V, &[V]),
    f(115, "LEFT", 1, 2, V, &[V]),
    f(116, "RIGHT", 1, 2, V, &[V]),
    f(117, "EXACT", 2, 2, V, &[V]),
    f(118, "TRIM", 1, 1, V, &[V]),
    f(119, "REPLACE", 4, 4, V, &[V]),
    f(120, "SUBSTITUTE", 3, 4, V, &[V]),
    f(121, "CODE", 1, 1, V, &[V]),
    f(124, "FIND", 2, 3, V, &[V]),
    volatile(f(125, "CELL", 1, 2, V, &[V, R])),
    f(126, "ISERR", 1, 1, V, &[V]),
    f(127, "ISTEXT", 1, 1, V, &[V]),
    f(128, "ISNUMBER", 1, 1, V, &[V]),
    f(129, "ISBLANK", 1, 1, V, &[V]),
    f(130, "T", 1, 1, V, &[R]),
    f(131, "N", 1, 1, V, &[R]),
    f(140, "DATEVALUE", 1, 1, V, &[V]),
    f(141, "TIMEVALUE", 1, 1, V, &[V]),
    volatile(f(148, "INDIRECT", 1, 2, R, &[V])),
    f(162, "CLEAN", 1, 1, V, &[V]),
    f(169, "COUNTA", 0, 30, V, &[R]),
    f(183, "PRODUCT", 0, 30, V, &[R]),
    f(184, "FACT", 1, 1, V, &[V]),
    f(190, "ISNONTEXT", 1, 1, V, &[V]),
    f(197, "TRUNC", 1, 2, V, &[V]),
    f(198, "ISLOGICAL", 1, 1, V, &[V]),
    f(212, "ROUNDUP", 2, 2, V, &[V]),
    f(213, "ROUNDDOWN", 2, 2, V, &[V]),
    f(216, "RANK", 2, 3, V, &[V, R, V]),
    f(219, "ADDRESS", 2, 5, V, &[V]),
    f(220, "DAYS360", 2, 3, V, &[V]),
    volatile(f(221, "TODAY", 0, 0, V, &[])),
    f(227, "MEDIAN", 1, 30, V, &[R]),
    f(228, "SUMPRODUCT", 1, 30, V, &[A]),
    f(229, "SINH", 1, 1, V, &[V]),
    f(230, "COSH", 1, 1, V, &[V]),
    f(231, "TANH", 1, 1, V, &[V]),
    f(276, "COMBIN", 2, 2, V, &[V]),
    f(285, "FLOOR", 2, 2, V, &[V]),
    f(288, "CEILING", 2, 2, V, &[V]),
    f(336, "CONCATENATE", 0, 30, V, &[V]),
    f(337, "POWER", 2, 2, V, &[V]),
    f(342, "RADIANS", 1, 1, V, &[V]),
    f(343, "DEGREES", 1, 1, V, &[V]),
    f(344, "SUBTOTAL", 2, 30, V, &[V, R]),
    f(345, "SUMIF", 2, 3, V, &[R, V, R]),
    f(346, "COUNTIF", 2, 2, V, &[R, V]),
    f(347, "COUNTBLANK", 1, 1, V, &[R]),
    f(354, "ROMAN", 1, 2, V, &[V]),
    f(359, "HYPERLINK", 1, 2, V, &[V]),
    f(361, "AVERAGEA", 1, 30, V, &[R]),
    f(362, "MAXA", 1, 30, V, &[R]),
    f(363, "MINA", 1, 30, V, &[R]),
];

fn name_to_id() -> &'static HashMap<&'static str, u16> {
    static MAP: OnceLock<HashMap<&'static str, u16>> = OnceLock::new();
    MAP.get_or_init(|| {
        FUNCTION_SPECS
            .iter()
            .map(|spec| (spec.name, spec.id))
            .collect()
    })
}

fn spec_by_id(id: u16) -> Option<&'static FunctionSpec> {
    FUNCTION_SPECS
        .binary_search_by_key(&id, |spec| spec.id)
        .ok()
        .map(|pos| &FUNCTION_SPECS[pos])
}

/// [`FunctionDirectory`] backed by the compiled-in BIFF8 function table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFunctions;

impl FunctionDirectory for BuiltinFunctions {
    fn by_index(&self, index: u16) -> Option<FunctionDescriptor> {
        let spec = spec_by_id(index)?;
        Some(FunctionDescriptor {
            index: spec.id,
            name: spec.name.to_string(),
            return_class: spec.return_class,
            param_classes: spec.params.to_vec(),
            min_args: spec.min_args,
            max_args: spec.max_args,
            volatile: spec.volatile,
        })
    }

    fn index_by_name(&self, name: &str, case_insensitive: bool) -> Option<u16> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if !case_insensitive {
            return name_to_id().get(name).copied();
        }
        // Names in the table are ASCII-uppercase.
        let mut buf = [0u8; 32];
        if name.len() <= buf.len() {
            for (dst, src) in buf[..name.len()].iter_mut().zip(name.as_bytes()) {
                *dst = src.to_ascii_uppercase();
            }
            let upper = std::str::from_utf8(&buf[..name.len()]).ok()?;
            return name_to_id().get(upper).copied();
        }
        name_to_id().get(name.to_ascii_uppercase().as_str()).copied()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn function_specs_are_sorted_and_unique() {
        let mut seen = HashSet::new();
        for pair in FUNCTION_SPECS.windows(2) {
            assert!(
                pair[0].id < pair[1].id,
                "FUNCTION_SPECS must be sorted by id; found {} then {}",
                pair[0].id,
                pair[1].id
            );
        }
        for spec in FUNCTION_SPECS {
            assert!(seen.insert(spec.name), "duplicate function name {}", spec.name);
            assert!(spec.min_args <= spec.max_args, "{} has min > max", spec.name);
            assert!(spec.max_args <= 30, "{} exceeds the BIFF8 argument cap", spec.name);
        }
    }

    #[test]
    fn looks_up_by_index_and_name() {
        let sum = BuiltinFunctions.by_index(4).expect("SUM");
        assert_eq!(sum.name, "SUM");
        assert_eq!(sum.param_class(5), OperandClass::Reference);
        assert_eq!(BuiltinFunctions.index_by_name("vlookup", true), Some(102));
        assert_eq!(BuiltinFunctions.index_by_name("vlookup", false), None);
        assert_eq!(BuiltinFunctions.index_by_name("VLOOKUP", false), Some(102));
        assert_eq!(BuiltinFunctions.by_index(255), None);
    }

    #[test]
    fn volatile_functions_are_flagged() {
        for id in [63u16, 74, 78, 125, 148, 221] {
            assert!(BuiltinFunctions.by_index(id).unwrap().volatile, "id {id}");
        }
        assert!(!BuiltinFunctions.by_index(4).unwrap().volatile);
    }
}
