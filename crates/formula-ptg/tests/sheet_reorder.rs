use formula_ptg::{
    shift_ptgs, shifted, AreaCoord, CellCoord, ClassifiedPtg, ExternSheetIndex, MoveDescriptor,
    OperandClass, Operator, Ptg,
};
use pretty_assertions::assert_eq;

fn sheet(index: u16) -> ExternSheetIndex {
    ExternSheetIndex(index)
}

fn ref3d(index: u16) -> Ptg {
    Ptg::from(ClassifiedPtg::Ref3d {
        sheet: sheet(index),
        cell: CellCoord::relative(1, 1),
    })
}

fn area3d(index: u16) -> Ptg {
    Ptg::classified(
        OperandClass::Value,
        ClassifiedPtg::Area3d {
            sheet: sheet(index),
            area: AreaCoord::absolute(0, 0, 9, 0),
        },
    )
}

#[test]
fn swaps_references_to_both_sheets() {
    let ptgs = vec![ref3d(2), ref3d(5), area3d(3), Ptg::from(Operator::Add)];
    let (ptgs, changed) = shifted(
        ptgs,
        sheet(0),
        &MoveDescriptor::sheet_reorder(sheet(2), sheet(5)),
    )
    .unwrap();
    assert!(changed);
    assert_eq!(
        ptgs,
        vec![ref3d(5), ref3d(2), area3d(3), Ptg::from(Operator::Add)]
    );
}

#[test]
fn deleted_references_follow_their_sheet() {
    let ptgs = vec![
        Ptg::from(ClassifiedPtg::DeletedRef3d {
            sheet: sheet(2),
            reserved: 0x0A0B_0C0D,
        }),
        Ptg::from(ClassifiedPtg::DeletedArea3d {
            sheet: sheet(5),
            reserved: 7,
        }),
        area3d(2),
    ];
    let (ptgs, _) = shifted(
        ptgs,
        sheet(0),
        &MoveDescriptor::sheet_reorder(sheet(2), sheet(5)),
    )
    .unwrap();
    assert_eq!(
        ptgs,
        vec![
            Ptg::from(ClassifiedPtg::DeletedRef3d {
                sheet: sheet(5),
                reserved: 0x0A0B_0C0D,
            }),
            Ptg::from(ClassifiedPtg::DeletedArea3d {
                sheet: sheet(2),
                reserved: 7,
            }),
            area3d(5),
        ]
    );
}

#[test]
fn reordering_twice_restores_the_formula() {
    let original = vec![ref3d(2), area3d(5), ref3d(7), Ptg::from(Operator::Union)];
    let mut ptgs = original.clone();
    let reorder = MoveDescriptor::sheet_reorder(sheet(2), sheet(5));
    assert_eq!(shift_ptgs(&mut ptgs, sheet(0), &reorder), Ok(true));
    assert_ne!(ptgs, original);

    let back = MoveDescriptor::sheet_reorder(sheet(5), sheet(2));
    assert_eq!(shift_ptgs(&mut ptgs, sheet(0), &back), Ok(true));
    assert_eq!(ptgs, original);
}

#[test]
fn names_and_same_sheet_references_are_untouched() {
    let mut ptgs = vec![
        Ptg::from(ClassifiedPtg::NameX {
            sheet: sheet(2),
            index: 1,
            reserved: 0,
        }),
        Ptg::from(ClassifiedPtg::Ref(CellCoord::relative(0, 0))),
        Ptg::from(ClassifiedPtg::Area(AreaCoord::relative(0, 0, 1, 1))),
        ref3d(9),
    ];
    let before = ptgs.clone();
    let changed = shift_ptgs(
        &mut ptgs,
        sheet(2),
        &MoveDescriptor::sheet_reorder(sheet(2), sheet(5)),
    )
    .unwrap();
    assert!(!changed);
    assert_eq!(ptgs, before);
}

#[test]
fn reordering_a_sheet_with_itself_is_a_no_op() {
    let mut ptgs = vec![ref3d(4)];
    assert_eq!(
        shift_ptgs(
            &mut ptgs,
            sheet(0),
            &MoveDescriptor::sheet_reorder(sheet(4), sheet(4))
        ),
        Ok(false)
    );
    assert_eq!(ptgs, vec![ref3d(4)]);
}
