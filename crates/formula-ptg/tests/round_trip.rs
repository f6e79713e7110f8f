#![cfg(feature = "builtin-functions")]

use formula_ptg::ptg::attr::SpaceKind;
use formula_ptg::ptg::{
    ArrayPtg, ArrayValue, AttrPtg, ErrorCode, FuncPtg, FuncVarPtg, MemPtg, StrPtg,
};
use formula_ptg::{
    decode_ptgs, encode_ptgs, encoded_size, encoded_size_without_array_data, AreaCoord, BasePtg,
    BuiltinFunctions, CellCoord, ClassifiedPtg, ExternSheetIndex, OperandClass, Operator, Ptg,
};
use pretty_assertions::assert_eq;

fn every_token_kind() -> Vec<Ptg> {
    let mut ptgs: Vec<Ptg> = vec![
        BasePtg::Exp { row: 3, col: 2 }.into(),
        BasePtg::Tbl { row: 1, col: 1 }.into(),
    ];
    for opcode in 0x03u8..=0x14 {
        ptgs.push(Operator::from_opcode(opcode).unwrap().into());
    }
    let constants: Vec<Ptg> = vec![
        BasePtg::Paren.into(),
        BasePtg::MissArg.into(),
        BasePtg::Str(StrPtg::new("hello \"world\"").unwrap()).into(),
        BasePtg::Str(StrPtg::new("\u{65e5}\u{672c}").unwrap()).into(),
        BasePtg::Str(StrPtg::with_encoding("wide", true).unwrap()).into(),
        BasePtg::Attr(AttrPtg::semi_volatile()).into(),
        BasePtg::Attr(AttrPtg::if_jump(7)).into(),
        BasePtg::Attr(AttrPtg::skip(3)).into(),
        BasePtg::Attr(AttrPtg::sum()).into(),
        BasePtg::Attr(AttrPtg::assignment()).into(),
        BasePtg::Attr(AttrPtg::space(SpaceKind::NewlineBefore, 2)).into(),
        BasePtg::Attr(AttrPtg::choose(vec![2, 4, 6], 8).unwrap()).into(),
        BasePtg::Err(ErrorCode::Div0).into(),
        BasePtg::Bool(true).into(),
        BasePtg::Bool(false).into(),
        BasePtg::Int(42).into(),
        BasePtg::Num(3.25).into(),
    ];
    ptgs.extend(constants);

    let array = ArrayPtg::new(vec![
        vec![ArrayValue::Number(1.0), ArrayValue::Str("a".to_string())],
        vec![ArrayValue::Bool(false), ArrayValue::Empty],
    ])
    .unwrap();
    let sheet = ExternSheetIndex(2);
    let classified: Vec<Ptg> = vec![
        ClassifiedPtg::Array(array).into(),
        ClassifiedPtg::Func(FuncPtg::from_index(65, &BuiltinFunctions)).into(),
        ClassifiedPtg::FuncVar(FuncVarPtg::from_index(4, 3, &BuiltinFunctions).unwrap()).into(),
        ClassifiedPtg::Name {
            index: 1,
            reserved: 0,
        }
        .into(),
        ClassifiedPtg::Ref(CellCoord::new(4, 2, true, false)).into(),
        ClassifiedPtg::Area(AreaCoord::absolute(0, 0, 9, 3)).into(),
        ClassifiedPtg::MemArea(MemPtg {
            reserved: 0,
            size: 11,
        })
        .into(),
        ClassifiedPtg::MemErr(MemPtg {
            reserved: 0xDEAD_BEEF,
            size: 4,
        })
        .into(),
        ClassifiedPtg::MemNoMem(MemPtg {
            reserved: 0,
            size: 0,
        })
        .into(),
        ClassifiedPtg::MemFunc { size: 7 }.into(),
        ClassifiedPtg::RefErr {
            reserved: 0x0102_0304,
        }
        .into(),
        ClassifiedPtg::AreaErr {
            reserved: 0x0102_0304_0506_0708,
        }
        .into(),
        ClassifiedPtg::RefN(CellCoord::new(0xFFFF, 0xFF, true, true)).into(),
        ClassifiedPtg::AreaN(AreaCoord::relative(0, 0, 2, 1)).into(),
        ClassifiedPtg::NameX {
            sheet,
            index: 3,
            reserved: 0,
        }
        .into(),
        ClassifiedPtg::Ref3d {
            sheet,
            cell: CellCoord::absolute(10, 5),
        }
        .into(),
        ClassifiedPtg::Area3d {
            sheet,
            area: AreaCoord::relative(1, 1, 4, 4),
        }
        .into(),
        ClassifiedPtg::DeletedRef3d { sheet, reserved: 0 }.into(),
        ClassifiedPtg::DeletedArea3d {
            sheet,
            reserved: 0xFFFF,
        }
        .into(),
    ];
    ptgs.extend(classified);
    ptgs
}

#[test]
fn every_token_kind_round_trips() {
    let ptgs = every_token_kind();
    let bytes = encode_ptgs(&ptgs);
    assert_eq!(bytes.len(), encoded_size(&ptgs));

    let cce = encoded_size_without_array_data(&ptgs);
    let decoded = decode_ptgs(&bytes, cce, &BuiltinFunctions).unwrap();
    assert_eq!(decoded, ptgs);
    assert_eq!(encode_ptgs(&decoded), bytes);
}

#[test]
fn each_token_round_trips_on_its_own() {
    for ptg in every_token_kind() {
        let bytes = encode_ptgs(std::slice::from_ref(&ptg));
        assert_eq!(
            encoded_size_without_array_data(std::slice::from_ref(&ptg)),
            ptg.size(),
            "{}",
            ptg.name()
        );
        let decoded = decode_ptgs(&bytes, ptg.size(), &BuiltinFunctions).unwrap();
        assert_eq!(decoded, vec![ptg]);
    }
}

#[test]
fn excel_written_sum_formula_is_byte_exact() {
    // =SUM(A1:B2)+1 as Excel writes it.
    let bytes = [
        0x25, 0x00, 0x00, 0x01, 0x00, 0x00, 0xC0, 0x01, 0xC0, // PtgArea A1:B2
        0x19, 0x10, 0x00, 0x00, // PtgAttr sum
        0x1E, 0x01, 0x00, // PtgInt 1
        0x03, // PtgAdd
    ];
    let ptgs = decode_ptgs(&bytes, bytes.len(), &BuiltinFunctions).unwrap();
    assert_eq!(
        ptgs,
        vec![
            Ptg::classified(
                OperandClass::Reference,
                ClassifiedPtg::Area(AreaCoord::relative(0, 0, 1, 1))
            ),
            Ptg::Base(BasePtg::Attr(AttrPtg::sum())),
            Ptg::Base(BasePtg::Int(1)),
            Ptg::from(Operator::Add),
        ]
    );
    assert_eq!(encode_ptgs(&ptgs), bytes);
}

#[test]
fn reserved_fields_survive() {
    // PtgName with a non-zero reserved word, PtgNameX with non-zero reserved word.
    let bytes = [
        0x43, 0x05, 0x00, 0xAB, 0xCD, // PtgName (VALUE)
        0x39, 0x01, 0x00, 0x02, 0x00, 0x34, 0x12, // PtgNameX (REF)
    ];
    let ptgs = decode_ptgs(&bytes, bytes.len(), &BuiltinFunctions).unwrap();
    assert_eq!(
        ptgs[0],
        Ptg::classified(
            OperandClass::Value,
            ClassifiedPtg::Name {
                index: 5,
                reserved: 0xCDAB
            }
        )
    );
    assert_eq!(encode_ptgs(&ptgs), bytes);
}

#[test]
fn unusual_boolean_bytes_normalise_to_true() {
    let ptgs = decode_ptgs(&[0x1D, 0x05], 2, &BuiltinFunctions).unwrap();
    assert_eq!(ptgs, vec![Ptg::Base(BasePtg::Bool(true))]);
    assert_eq!(encode_ptgs(&ptgs), vec![0x1D, 0x01]);
}

#[test]
fn area_fields_keep_stored_order() {
    // Last row before first row, as some writers emit it.
    let bytes = [0x25, 0x05, 0x00, 0x01, 0x00, 0x00, 0xC0, 0x00, 0xC0];
    let ptgs = decode_ptgs(&bytes, bytes.len(), &BuiltinFunctions).unwrap();
    let Some(ClassifiedPtg::Area(area)) = ptgs[0].as_classified() else {
        panic!("expected an area, got {:?}", ptgs[0]);
    };
    assert_eq!((area.first_row, area.last_row), (5, 1));
    assert_eq!(encode_ptgs(&ptgs), bytes);
}

#[test]
fn trailing_bytes_after_tokens_are_ignored() {
    let bytes = [0x1E, 0x07, 0x00, 0xFF, 0xFF];
    let ptgs = decode_ptgs(&bytes, 3, &BuiltinFunctions).unwrap();
    assert_eq!(ptgs, vec![Ptg::Base(BasePtg::Int(7))]);
}
