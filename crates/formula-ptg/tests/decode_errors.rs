#![cfg(feature = "builtin-functions")]

use formula_ptg::{decode_ptgs, read_ptgs, BuiltinFunctions, DecodeError, NoFunctions, PtgReader};
use pretty_assertions::assert_eq;

#[test]
fn unmapped_first_byte_fails_without_consuming_input() {
    for opcode in [0x00u8, 0x18, 0x1A, 0x1B, 0x2E, 0x30, 0x38, 0x3E, 0x3F, 0x80, 0xFF] {
        let data = [opcode, 0x01, 0x02, 0x03];
        let mut reader = PtgReader::new(&data);
        let err = read_ptgs(&mut reader, data.len(), &NoFunctions).unwrap_err();
        assert_eq!(err, DecodeError::UnknownOpcode { offset: 0, opcode });
        assert_eq!(reader.position(), 0, "opcode 0x{opcode:02X}");
    }
}

#[test]
fn unmapped_opcode_in_the_middle_reports_its_offset() {
    // PtgInt 1, then an unmapped band opcode.
    let data = [0x1E, 0x01, 0x00, 0x4E];
    assert_eq!(
        decode_ptgs(&data, data.len(), &NoFunctions),
        Err(DecodeError::UnknownOpcode {
            offset: 3,
            opcode: 0x4E
        })
    );
}

#[test]
fn truncated_payload() {
    // PtgRef needs four payload bytes.
    let data = [0x24, 0x01];
    assert_eq!(
        decode_ptgs(&data, 5, &NoFunctions),
        Err(DecodeError::TruncatedStream {
            offset: 1,
            needed: 2,
            remaining: 1
        })
    );
}

#[test]
fn declared_size_beyond_input() {
    let data = [0x03];
    assert_eq!(
        decode_ptgs(&data, 4, &NoFunctions),
        Err(DecodeError::TruncatedStream {
            offset: 1,
            needed: 1,
            remaining: 0
        })
    );
}

#[test]
fn truncated_string() {
    // cch = 5 but only three characters follow.
    let data = [0x17, 0x05, 0x00, b'a', b'b', b'c'];
    assert!(matches!(
        decode_ptgs(&data, 8, &NoFunctions),
        Err(DecodeError::TruncatedStream { offset: 3, needed: 5, .. })
    ));
}

#[test]
fn truncated_choose_table() {
    // Three cases need four offsets; only two are present.
    let data = [0x19, 0x04, 0x03, 0x00, 0x02, 0x00, 0x04, 0x00];
    assert!(matches!(
        decode_ptgs(&data, 12, &NoFunctions),
        Err(DecodeError::TruncatedStream { offset: 8, .. })
    ));
}

#[test]
fn invalid_error_code() {
    let data = [0x1C, 0x99];
    assert_eq!(
        decode_ptgs(&data, 2, &NoFunctions),
        Err(DecodeError::InvalidErrorCode {
            offset: 1,
            code: 0x99
        })
    );
}

#[test]
fn missing_array_data() {
    // A PtgArray placeholder with no trailing values.
    let data = [0x60, 0, 0, 0, 0, 0, 0, 0];
    assert_eq!(
        decode_ptgs(&data, 8, &BuiltinFunctions),
        Err(DecodeError::TruncatedStream {
            offset: 8,
            needed: 1,
            remaining: 0
        })
    );
}

#[test]
fn invalid_array_value_tag() {
    let mut data = vec![0x60, 0, 0, 0, 0, 0, 0, 0];
    // 1x1 array holding a value with tag 0x03.
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x03]);
    data.extend_from_slice(&[0; 8]);
    assert_eq!(
        decode_ptgs(&data, 8, &BuiltinFunctions),
        Err(DecodeError::InvalidArrayValue {
            offset: 11,
            tag: 0x03
        })
    );
}

#[test]
fn invalid_array_error_code() {
    let mut data = vec![0x60, 0, 0, 0, 0, 0, 0, 0];
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x10, 0x55]);
    data.extend_from_slice(&[0; 7]);
    assert_eq!(
        decode_ptgs(&data, 8, &BuiltinFunctions),
        Err(DecodeError::InvalidErrorCode {
            offset: 12,
            code: 0x55
        })
    );
}

#[test]
fn errors_display_offsets() {
    let err = DecodeError::UnknownOpcode {
        offset: 7,
        opcode: 0x18,
    };
    assert_eq!(err.to_string(), "unknown ptg opcode 0x18 at offset 7");
}
