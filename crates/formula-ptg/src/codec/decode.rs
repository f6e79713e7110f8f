use super::reader::PtgReader;
use crate::class::{base_opcode, OperandClass, CLASSIFIED_OPCODE_BASE};
use crate::coords::{AreaCoord, CellCoord, ExternSheetIndex};
use crate::error::DecodeError;
use crate::functions::FunctionDirectory;
use crate::ptg::array::{
    ArrayPtg, ArrayValue, ARRAY_PLACEHOLDER_SIZE, VALUE_BOOL, VALUE_EMPTY, VALUE_ERROR,
    VALUE_NUMBER, VALUE_STRING,
};
use crate::ptg::attr::{AttrPtg, ChooseTable, ATTR_CHOOSE};
use crate::ptg::{
    BasePtg, ClassifiedPtg, ErrorCode, FuncPtg, FuncVarPtg, MemPtg, Operator, Ptg, StrPtg,
};

type BaseDecoder = fn(&mut PtgReader<'_>, u8) -> Result<BasePtg, DecodeError>;
type ClassifiedDecoder =
    fn(&mut PtgReader<'_>, &dyn FunctionDirectory) -> Result<Decoded, DecodeError>;

/// Output of a classified decode routine, before the class band is applied.
enum Decoded {
    Ready(ClassifiedPtg),
    /// Only the placeholder has been read; the values follow the last token.
    Array([u8; ARRAY_PLACEHOLDER_SIZE]),
}

/// Token slot during the first pass over the stream.
enum Slot {
    Ready(Ptg),
    PendingArray(PendingArray),
}

struct PendingArray {
    class: OperandClass,
    reserved: [u8; ARRAY_PLACEHOLDER_SIZE],
}

const BASE_DECODERS: [Option<BaseDecoder>; 32] = {
    let mut table: [Option<BaseDecoder>; 32] = [None; 32];
    table[0x01] = Some(decode_exp as BaseDecoder);
    table[0x02] = Some(decode_tbl as BaseDecoder);
    let mut op = 0x03;
    while op <= 0x14 {
        table[op] = Some(decode_operator as BaseDecoder);
        op += 1;
    }
    table[0x15] = Some(decode_paren as BaseDecoder);
    table[0x16] = Some(decode_miss_arg as BaseDecoder);
    table[0x17] = Some(decode_str as BaseDecoder);
    table[0x19] = Some(decode_attr as BaseDecoder);
    table[0x1C] = Some(decode_err as BaseDecoder);
    table[0x1D] = Some(decode_bool as BaseDecoder);
    table[0x1E] = Some(decode_int as BaseDecoder);
    table[0x1F] = Some(decode_num as BaseDecoder);
    table
};

/// Indexed by `base_opcode - 0x20`.
const CLASSIFIED_DECODERS: [Option<ClassifiedDecoder>; 32] = {
    let mut table: [Option<ClassifiedDecoder>; 32] = [None; 32];
    table[0x00] = Some(decode_array as ClassifiedDecoder);
    table[0x01] = Some(decode_func as ClassifiedDecoder);
    table[0x02] = Some(decode_func_var as ClassifiedDecoder);
    table[0x03] = Some(decode_name as ClassifiedDecoder);
    table[0x04] = Some(decode_ref as ClassifiedDecoder);
    table[0x05] = Some(decode_area as ClassifiedDecoder);
    table[0x06] = Some(decode_mem_area as ClassifiedDecoder);
    table[0x07] = Some(decode_mem_err as ClassifiedDecoder);
    table[0x08] = Some(decode_mem_no_mem as ClassifiedDecoder);
    table[0x09] = Some(decode_mem_func as ClassifiedDecoder);
    table[0x0A] = Some(decode_ref_err as ClassifiedDecoder);
    table[0x0B] = Some(decode_area_err as ClassifiedDecoder);
    table[0x0C] = Some(decode_ref_n as ClassifiedDecoder);
    table[0x0D] = Some(decode_area_n as ClassifiedDecoder);
    table[0x19] = Some(decode_name_x as ClassifiedDecoder);
    table[0x1A] = Some(decode_ref_3d as ClassifiedDecoder);
    table[0x1B] = Some(decode_area_3d as ClassifiedDecoder);
    table[0x1C] = Some(decode_deleted_ref_3d as ClassifiedDecoder);
    table[0x1D] = Some(decode_deleted_area_3d as ClassifiedDecoder);
    table
};

/// Decode a BIFF8 `rgce` stream whose tokens occupy the first `size` bytes of `data`.
///
/// Bytes after `size` hold the trailing data of array constants; anything left over once every
/// array has been materialized is ignored.
pub fn decode_ptgs(
    data: &[u8],
    size: usize,
    functions: &dyn FunctionDirectory,
) -> Result<Vec<Ptg>, DecodeError> {
    let mut reader = PtgReader::new(data);
    read_ptgs(&mut reader, size, functions)
}

/// Decode `size` bytes of tokens from `reader`, then the trailing array data.
///
/// On success the reader is left just past the last array's values.
pub fn read_ptgs(
    reader: &mut PtgReader<'_>,
    size: usize,
    functions: &dyn FunctionDirectory,
) -> Result<Vec<Ptg>, DecodeError> {
    let start = reader.position();
    let mut slots = Vec::new();
    let mut pending_arrays = 0usize;

    while reader.position() - start < size {
        let slot = read_slot(reader, functions)?;
        if matches!(slot, Slot::PendingArray(_)) {
            pending_arrays += 1;
        }
        slots.push(slot);
    }

    let consumed = reader.position() - start;
    if consumed != size {
        return Err(DecodeError::SizeMismatch {
            declared: size,
            consumed,
        });
    }

    if pending_arrays == 0 {
        return Ok(slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Ready(ptg) => Some(ptg),
                Slot::PendingArray(_) => None,
            })
            .collect());
    }

    let mut ptgs = Vec::with_capacity(slots.len());
    for slot in slots {
        match slot {
            Slot::Ready(ptg) => ptgs.push(ptg),
            Slot::PendingArray(pending) => {
                let array = read_array_data(reader, pending.reserved)?;
                ptgs.push(Ptg::classified(pending.class, ClassifiedPtg::Array(array)));
            }
        }
    }
    Ok(ptgs)
}

fn read_slot(
    reader: &mut PtgReader<'_>,
    functions: &dyn FunctionDirectory,
) -> Result<Slot, DecodeError> {
    let offset = reader.position();
    let opcode = reader.peek_u8()?;
    let unknown = DecodeError::UnknownOpcode { offset, opcode };

    if opcode < CLASSIFIED_OPCODE_BASE {
        let decoder = BASE_DECODERS[usize::from(opcode)].ok_or(unknown)?;
        reader.read_u8()?;
        return Ok(Slot::Ready(Ptg::Base(decoder(reader, opcode)?)));
    }

    let class = OperandClass::from_opcode(opcode).ok_or(unknown.clone())?;
    let index = usize::from(base_opcode(opcode) - CLASSIFIED_OPCODE_BASE);
    let decoder = CLASSIFIED_DECODERS[index].ok_or(unknown)?;
    reader.read_u8()?;
    Ok(match decoder(reader, functions)? {
        Decoded::Ready(ptg) => Slot::Ready(Ptg::classified(class, ptg)),
        Decoded::Array(reserved) => Slot::PendingArray(PendingArray { class, reserved }),
    })
}

fn read_array_data(
    reader: &mut PtgReader<'_>,
    reserved: [u8; ARRAY_PLACEHOLDER_SIZE],
) -> Result<ArrayPtg, DecodeError> {
    let cols = usize::from(reader.read_u8()?) + 1;
    let rows = usize::from(reader.read_u16()?) + 1;
    // Capacity bounded by the input that is actually left.
    let mut values = Vec::with_capacity((cols * rows).min(reader.remaining()));
    for _ in 0..cols * rows {
        values.push(read_array_value(reader)?);
    }
    Ok(ArrayPtg::from_decoded(reserved, cols, rows, values))
}

fn read_array_value(reader: &mut PtgReader<'_>) -> Result<ArrayValue, DecodeError> {
    let offset = reader.position();
    let tag = reader.read_u8()?;
    match tag {
        VALUE_EMPTY => {
            reader.read_bytes(8)?;
            Ok(ArrayValue::Empty)
        }
        VALUE_NUMBER => Ok(ArrayValue::Number(reader.read_f64()?)),
        VALUE_STRING => {
            let cch = usize::from(reader.read_u16()?);
            let flags = reader.read_u8()?;
            Ok(ArrayValue::Str(reader.read_chars(cch, flags & 0x01 != 0)?))
        }
        VALUE_BOOL => {
            let value = reader.read_u8()? != 0;
            reader.read_bytes(7)?;
            Ok(ArrayValue::Bool(value))
        }
        VALUE_ERROR => {
            let code_offset = reader.position();
            let code = reader.read_u8()?;
            let err = ErrorCode::from_code(code).ok_or(DecodeError::InvalidErrorCode {
                offset: code_offset,
                code,
            })?;
            reader.read_bytes(7)?;
            Ok(ArrayValue::Error(err))
        }
        _ => Err(DecodeError::InvalidArrayValue { offset, tag }),
    }
}

fn decode_exp(reader: &mut PtgReader<'_>, _opcode: u8) -> Result<BasePtg, DecodeError> {
    let row = reader.read_u16()?;
    let col = reader.read_u16()?;
    Ok(BasePtg::Exp { row, col })
}

fn decode_tbl(reader: &mut PtgReader<'_>, _opcode: u8) -> Result<BasePtg, DecodeError> {
    let row = reader.read_u16()?;
    let col = reader.read_u16()?;
    Ok(BasePtg::Tbl { row, col })
}

fn decode_operator(reader: &mut PtgReader<'_>, opcode: u8) -> Result<BasePtg, DecodeError> {
    // Only registered for 0x03..=0x14.
    Operator::from_opcode(opcode)
        .map(BasePtg::Operator)
        .ok_or(DecodeError::UnknownOpcode {
            offset: reader.position().saturating_sub(1),
            opcode,
        })
}

fn decode_paren(_reader: &mut PtgReader<'_>, _opcode: u8) -> Result<BasePtg, DecodeError> {
    Ok(BasePtg::Paren)
}

fn decode_miss_arg(_reader: &mut PtgReader<'_>, _opcode: u8) -> Result<BasePtg, DecodeError> {
    Ok(BasePtg::MissArg)
}

fn decode_str(reader: &mut PtgReader<'_>, _opcode: u8) -> Result<BasePtg, DecodeError> {
    // ShortXLUnicodeString: [cch: u8][flags: u8][chars]
    let cch = usize::from(reader.read_u8()?);
    let utf16 = reader.read_u8()? & 0x01 != 0;
    let text = reader.read_chars(cch, utf16)?;
    Ok(BasePtg::Str(StrPtg::from_decoded(text, utf16)))
}

fn decode_attr(reader: &mut PtgReader<'_>, _opcode: u8) -> Result<BasePtg, DecodeError> {
    let flags = reader.read_u8()?;
    let data = reader.read_u16()?;
    let choose = if flags & ATTR_CHOOSE != 0 {
        let mut case_offsets = Vec::with_capacity(usize::from(data).min(reader.remaining() / 2));
        for _ in 0..data {
            case_offsets.push(reader.read_u16()?);
        }
        let function_offset = reader.read_u16()?;
        Some(ChooseTable {
            case_offsets,
            function_offset,
        })
    } else {
        None
    };
    Ok(BasePtg::Attr(AttrPtg::from_decoded(flags, data, choose)))
}

fn decode_err(reader: &mut PtgReader<'_>, _opcode: u8) -> Result<BasePtg, DecodeError> {
    let offset = reader.position();
    let code = reader.read_u8()?;
    ErrorCode::from_code(code)
        .map(BasePtg::Err)
        .ok_or(DecodeError::InvalidErrorCode { offset, code })
}

fn decode_bool(reader: &mut PtgReader<'_>, _opcode: u8) -> Result<BasePtg, DecodeError> {
    Ok(BasePtg::Bool(reader.read_u8()? != 0))
}

fn decode_int(reader: &mut PtgReader<'_>, _opcode: u8) -> Result<BasePtg, DecodeError> {
    Ok(BasePtg::Int(reader.read_u16()?))
}

fn decode_num(reader: &mut PtgReader<'_>, _opcode: u8) -> Result<BasePtg, DecodeError> {
    Ok(BasePtg::Num(reader.read_f64()?))
}

fn decode_array(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let mut reserved = [0u8; ARRAY_PLACEHOLDER_SIZE];
    reserved.copy_from_slice(reader.read_bytes(ARRAY_PLACEHOLDER_SIZE)?);
    Ok(Decoded::Array(reserved))
}

fn decode_func(
    reader: &mut PtgReader<'_>,
    functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let index = reader.read_u16()?;
    Ok(Decoded::Ready(ClassifiedPtg::Func(FuncPtg::from_index(
        index, functions,
    ))))
}

fn decode_func_var(
    reader: &mut PtgReader<'_>,
    functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let argc = reader.read_u8()?;
    let tab = reader.read_u16()?;
    Ok(Decoded::Ready(ClassifiedPtg::FuncVar(
        FuncVarPtg::from_fields(argc, tab, functions),
    )))
}

fn decode_name(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let index = reader.read_u16()?;
    let reserved = reader.read_u16()?;
    Ok(Decoded::Ready(ClassifiedPtg::Name { index, reserved }))
}

fn read_cell(reader: &mut PtgReader<'_>) -> Result<CellCoord, DecodeError> {
    let row = reader.read_u16()?;
    let col = reader.read_u16()?;
    Ok(CellCoord::from_fields(row, col))
}

fn read_area(reader: &mut PtgReader<'_>) -> Result<AreaCoord, DecodeError> {
    let first_row = reader.read_u16()?;
    let last_row = reader.read_u16()?;
    let first_col = reader.read_u16()?;
    let last_col = reader.read_u16()?;
    Ok(AreaCoord::from_fields(first_row, last_row, first_col, last_col))
}

fn read_mem(reader: &mut PtgReader<'_>) -> Result<MemPtg, DecodeError> {
    let reserved = reader.read_u32()?;
    let size = reader.read_u16()?;
    Ok(MemPtg { reserved, size })
}

fn read_sheet(reader: &mut PtgReader<'_>) -> Result<ExternSheetIndex, DecodeError> {
    Ok(ExternSheetIndex(reader.read_u16()?))
}

fn decode_ref(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    Ok(Decoded::Ready(ClassifiedPtg::Ref(read_cell(reader)?)))
}

fn decode_area(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    Ok(Decoded::Ready(ClassifiedPtg::Area(read_area(reader)?)))
}

fn decode_mem_area(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    Ok(Decoded::Ready(ClassifiedPtg::MemArea(read_mem(reader)?)))
}

fn decode_mem_err(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    Ok(Decoded::Ready(ClassifiedPtg::MemErr(read_mem(reader)?)))
}

fn decode_mem_no_mem(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    Ok(Decoded::Ready(ClassifiedPtg::MemNoMem(read_mem(reader)?)))
}

fn decode_mem_func(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let size = reader.read_u16()?;
    Ok(Decoded::Ready(ClassifiedPtg::MemFunc { size }))
}

fn decode_ref_err(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let reserved = reader.read_u32()?;
    Ok(Decoded::Ready(ClassifiedPtg::RefErr { reserved }))
}

fn decode_area_err(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let reserved = reader.read_u64()?;
    Ok(Decoded::Ready(ClassifiedPtg::AreaErr { reserved }))
}

fn decode_ref_n(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    Ok(Decoded::Ready(ClassifiedPtg::RefN(read_cell(reader)?)))
}

fn decode_area_n(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    Ok(Decoded::Ready(ClassifiedPtg::AreaN(read_area(reader)?)))
}

fn decode_name_x(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let sheet = read_sheet(reader)?;
    let index = reader.read_u16()?;
    let reserved = reader.read_u16()?;
    Ok(Decoded::Ready(ClassifiedPtg::NameX {
        sheet,
        index,
        reserved,
    }))
}

fn decode_ref_3d(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let sheet = read_sheet(reader)?;
    let cell = read_cell(reader)?;
    Ok(Decoded::Ready(ClassifiedPtg::Ref3d { sheet, cell }))
}

fn decode_area_3d(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let sheet = read_sheet(reader)?;
    let area = read_area(reader)?;
    Ok(Decoded::Ready(ClassifiedPtg::Area3d { sheet, area }))
}

fn decode_deleted_ref_3d(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let sheet = read_sheet(reader)?;
    let reserved = reader.read_u32()?;
    Ok(Decoded::Ready(ClassifiedPtg::DeletedRef3d { sheet, reserved }))
}

fn decode_deleted_area_3d(
    reader: &mut PtgReader<'_>,
    _functions: &dyn FunctionDirectory,
) -> Result<Decoded, DecodeError> {
    let sheet = read_sheet(reader)?;
    let reserved = reader.read_u64()?;
    Ok(Decoded::Ready(ClassifiedPtg::DeletedArea3d { sheet, reserved }))
}
