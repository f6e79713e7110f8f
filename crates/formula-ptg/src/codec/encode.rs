use crate::coords::{AreaCoord, CellCoord};
use crate::ptg::array::{
    needs_utf16, ArrayPtg, ArrayValue, VALUE_BOOL, VALUE_EMPTY, VALUE_ERROR, VALUE_NUMBER,
    VALUE_STRING,
};
use crate::ptg::{BasePtg, ClassifiedPtg, MemPtg, Ptg};

/// Encode tokens followed by the trailing data of every array constant, in token order.
pub fn encode_ptgs(ptgs: &[Ptg]) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_size(ptgs));
    write_ptgs(ptgs, &mut out);
    out
}

/// Append the encoding of `ptgs` to `out`.
pub fn write_ptgs(ptgs: &[Ptg], out: &mut Vec<u8>) {
    for ptg in ptgs {
        write_ptg(ptg, out);
    }
    for ptg in ptgs {
        if let Ptg::Classified {
            ptg: ClassifiedPtg::Array(array),
            ..
        } = ptg
        {
            write_array_data(array, out);
        }
    }
}

/// Total encoded size: tokens plus trailing array data.
pub fn encoded_size(ptgs: &[Ptg]) -> usize {
    ptgs.iter()
        .map(|ptg| ptg.size() + ptg.array_data_size())
        .sum()
}

/// Size of the tokens alone, as declared in a record's `cce` field.
pub fn encoded_size_without_array_data(ptgs: &[Ptg]) -> usize {
    ptgs.iter().map(Ptg::size).sum()
}

fn write_ptg(ptg: &Ptg, out: &mut Vec<u8>) {
    out.push(ptg.opcode());
    match ptg {
        Ptg::Base(base) => write_base(base, out),
        Ptg::Classified { ptg, .. } => write_classified(ptg, out),
    }
}

fn write_base(ptg: &BasePtg, out: &mut Vec<u8>) {
    match ptg {
        BasePtg::Exp { row, col } | BasePtg::Tbl { row, col } => {
            push_u16(out, *row);
            push_u16(out, *col);
        }
        BasePtg::Operator(_) | BasePtg::Paren | BasePtg::MissArg => {}
        BasePtg::Str(s) => {
            // cch fits in a byte: `StrPtg` construction enforces it.
            out.push(s.cch() as u8);
            out.push(u8::from(s.is_utf16()));
            push_chars(out, s.text(), s.is_utf16());
        }
        BasePtg::Attr(attr) => {
            out.push(attr.flags());
            push_u16(out, attr.data());
            if let Some(table) = attr.choose_table() {
                for offset in &table.case_offsets {
                    push_u16(out, *offset);
                }
                push_u16(out, table.function_offset);
            }
        }
        BasePtg::Err(code) => out.push(code.code()),
        BasePtg::Bool(value) => out.push(u8::from(*value)),
        BasePtg::Int(value) => push_u16(out, *value),
        BasePtg::Num(value) => out.extend_from_slice(&value.to_le_bytes()),
    }
}

fn write_classified(ptg: &ClassifiedPtg, out: &mut Vec<u8>) {
    match ptg {
        ClassifiedPtg::Array(array) => out.extend_from_slice(array.reserved()),
        ClassifiedPtg::Func(func) => push_u16(out, func.index()),
        ClassifiedPtg::FuncVar(func) => {
            out.push(func.argc_field());
            push_u16(out, func.tab_field());
        }
        ClassifiedPtg::Name { index, reserved } => {
            push_u16(out, *index);
            push_u16(out, *reserved);
        }
        ClassifiedPtg::Ref(cell) | ClassifiedPtg::RefN(cell) => push_cell(out, cell),
        ClassifiedPtg::Area(area) | ClassifiedPtg::AreaN(area) => push_area(out, area),
        ClassifiedPtg::MemArea(mem) | ClassifiedPtg::MemErr(mem) | ClassifiedPtg::MemNoMem(mem) => {
            push_mem(out, mem)
        }
        ClassifiedPtg::MemFunc { size } => push_u16(out, *size),
        ClassifiedPtg::RefErr { reserved } => out.extend_from_slice(&reserved.to_le_bytes()),
        ClassifiedPtg::AreaErr { reserved } => out.extend_from_slice(&reserved.to_le_bytes()),
        ClassifiedPtg::NameX {
            sheet,
            index,
            reserved,
        } => {
            push_u16(out, sheet.0);
            push_u16(out, *index);
            push_u16(out, *reserved);
        }
        ClassifiedPtg::Ref3d { sheet, cell } => {
            push_u16(out, sheet.0);
            push_cell(out, cell);
        }
        ClassifiedPtg::Area3d { sheet, area } => {
            push_u16(out, sheet.0);
            push_area(out, area);
        }
        ClassifiedPtg::DeletedRef3d { sheet, reserved } => {
            push_u16(out, sheet.0);
            out.extend_from_slice(&reserved.to_le_bytes());
        }
        ClassifiedPtg::DeletedArea3d { sheet, reserved } => {
            push_u16(out, sheet.0);
            out.extend_from_slice(&reserved.to_le_bytes());
        }
    }
}

fn write_array_data(array: &ArrayPtg, out: &mut Vec<u8>) {
    // Dimensions are bounded by `ArrayPtg` construction (1..=256 cols, 1..=65536 rows).
    out.push((array.cols() - 1) as u8);
    push_u16(out, (array.rows() - 1) as u16);
    for value in array.values() {
        match value {
            ArrayValue::Empty => {
                out.push(VALUE_EMPTY);
                out.extend_from_slice(&[0; 8]);
            }
            ArrayValue::Number(n) => {
                out.push(VALUE_NUMBER);
                out.extend_from_slice(&n.to_le_bytes());
            }
            ArrayValue::Str(s) => {
                let utf16 = needs_utf16(s);
                out.push(VALUE_STRING);
                let cch = if utf16 {
                    s.encode_utf16().count()
                } else {
                    s.chars().count()
                };
                push_u16(out, cch as u16);
                out.push(u8::from(utf16));
                push_chars(out, s, utf16);
            }
            ArrayValue::Bool(b) => {
                out.push(VALUE_BOOL);
                out.push(u8::from(*b));
                out.extend_from_slice(&[0; 7]);
            }
            ArrayValue::Error(code) => {
                out.push(VALUE_ERROR);
                out.push(code.code());
                out.extend_from_slice(&[0; 7]);
            }
        }
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_chars(out: &mut Vec<u8>, text: &str, utf16: bool) {
    if utf16 {
        for unit in text.encode_utf16() {
            push_u16(out, unit);
        }
    } else {
        // Compressed layout only holds Latin-1, checked at construction.
        out.extend(text.chars().map(|ch| ch as u32 as u8));
    }
}

fn push_cell(out: &mut Vec<u8>, cell: &CellCoord) {
    push_u16(out, cell.row);
    push_u16(out, cell.col_field());
}

fn push_area(out: &mut Vec<u8>, area: &AreaCoord) {
    push_u16(out, area.first_row);
    push_u16(out, area.last_row);
    push_u16(out, area.first_col_field());
    push_u16(out, area.last_col_field());
}

fn push_mem(out: &mut Vec<u8>, mem: &MemPtg) {
    out.extend_from_slice(&mem.reserved.to_le_bytes());
    push_u16(out, mem.size);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::OperandClass;
    use crate::coords::ExternSheetIndex;
    use crate::ptg::{Operator, StrPtg};

    #[test]
    fn writes_area3d_layout() {
        let ptg = Ptg::classified(
            OperandClass::Reference,
            ClassifiedPtg::Area3d {
                sheet: ExternSheetIndex(2),
                area: AreaCoord::relative(1, 0, 3, 2),
            },
        );
        assert_eq!(
            encode_ptgs(&[ptg]),
            vec![0x3B, 0x02, 0x00, 0x01, 0x00, 0x03, 0x00, 0x00, 0xC0, 0x02, 0xC0]
        );
    }

    #[test]
    fn writes_compressed_and_wide_strings() {
        let narrow = Ptg::Base(BasePtg::Str(StrPtg::new("ab").unwrap()));
        assert_eq!(encode_ptgs(&[narrow]), vec![0x17, 0x02, 0x00, b'a', b'b']);

        let wide = Ptg::Base(BasePtg::Str(StrPtg::new("\u{3042}").unwrap()));
        assert_eq!(encode_ptgs(&[wide]), vec![0x17, 0x01, 0x01, 0x42, 0x30]);
    }

    #[test]
    fn array_data_follows_all_tokens() {
        let array = ArrayPtg::new(vec![vec![ArrayValue::Bool(true), ArrayValue::Number(2.0)]])
            .unwrap();
        let ptgs = vec![
            Ptg::from(ClassifiedPtg::Array(array)),
            Ptg::Base(BasePtg::Int(1)),
            Ptg::from(Operator::Add),
        ];
        let bytes = encode_ptgs(&ptgs);
        assert_eq!(encoded_size_without_array_data(&ptgs), 8 + 3 + 1);
        assert_eq!(bytes.len(), encoded_size(&ptgs));
        assert_eq!(&bytes[8..12], &[0x1E, 0x01, 0x00, 0x03]);
        // cols - 1, rows - 1
        assert_eq!(&bytes[12..15], &[0x01, 0x00, 0x00]);
        assert_eq!(&bytes[15..17], &[VALUE_BOOL, 0x01]);
    }
}
