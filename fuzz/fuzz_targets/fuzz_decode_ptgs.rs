#![no_main]

use formula_ptg::render::NoSheets;
use formula_ptg::{
    decode_ptgs, encode_ptgs, encoded_size_without_array_data, shift_ptgs, to_formula_string,
    BuiltinFunctions, CellCoord, ExternSheetIndex, MoveDescriptor, RenderOptions,
};
use libfuzzer_sys::fuzz_target;

/// BIFF8 caps a formula's token bytes (`cce`) at a u16; keep inputs in the same range.
const MAX_INPUT_BYTES: usize = 64 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let data = if data.len() > MAX_INPUT_BYTES {
        &data[..MAX_INPUT_BYTES]
    } else {
        data
    };

    // [cce: u16][selector: u8][delta: i8][rgce...]
    let cce = usize::from(u16::from_le_bytes([data[0], data[1]]));
    let selector = data[2];
    let delta = i32::from(data[3] as i8);
    let rgce = &data[4..];

    let Ok(mut ptgs) = decode_ptgs(rgce, cce, &BuiltinFunctions) else {
        return;
    };

    // Whatever decodes must re-encode to a stream that decodes to the same tokens and is stable
    // under a second encode.
    let encoded = encode_ptgs(&ptgs);
    let cce = encoded_size_without_array_data(&ptgs);
    let again = decode_ptgs(&encoded, cce, &BuiltinFunctions).expect("re-encoded stream decodes");
    assert_eq!(encode_ptgs(&again), encoded);

    let options = RenderOptions {
        base_cell: Some(CellCoord::relative(u16::from(selector), u16::from(selector >> 4))),
    };
    let _ = to_formula_string(&ptgs, &NoSheets, options);

    let sheet = ExternSheetIndex(u16::from(selector & 0x03));
    let mv = if selector & 0x80 == 0 {
        MoveDescriptor::row_move(
            ExternSheetIndex(0),
            "Sheet1",
            u16::from(selector & 0x3F),
            u16::from(selector & 0x3F) + 4,
            delta,
        )
    } else {
        MoveDescriptor::sheet_reorder(ExternSheetIndex(0), ExternSheetIndex(1))
    };
    let size_before = encoded_size_without_array_data(&ptgs);
    if shift_ptgs(&mut ptgs, sheet, &mv).is_ok() {
        // Replacement tokens always have the size of the token they replace.
        assert_eq!(encoded_size_without_array_data(&ptgs), size_before);
    }
});
