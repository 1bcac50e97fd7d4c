//! S7 and the opcode-table universal properties, exercised through the
//! public API only.

use abc::opcode::{self, ControlFlowEffect, OPCODES};
use abc::{pop_count, MultinameKind};

#[test]
fn s7_stack_effects() {
    const CALLPROPERTY: u8 = 0x46;
    const NEWOBJECT: u8 = 0x55;
    const NEWARRAY: u8 = 0x56;
    const DUP: u8 = 0x2a;

    assert_eq!(
        pop_count(CALLPROPERTY, Some(MultinameKind::QName), 3).unwrap(),
        4
    );
    assert_eq!(
        pop_count(CALLPROPERTY, Some(MultinameKind::MultinameL), 3).unwrap(),
        5
    );
    assert_eq!(
        pop_count(CALLPROPERTY, Some(MultinameKind::RtQNameL), 3).unwrap(),
        6
    );
    assert_eq!(pop_count(NEWOBJECT, None, 2).unwrap(), 4);
    assert_eq!(pop_count(NEWARRAY, None, 2).unwrap(), 2);
    assert_eq!(pop_count(DUP, None, 0).unwrap(), 0);
    assert_eq!(OPCODES[DUP as usize].name, "dup");
}

#[test]
fn invalid_opcode_is_minus_one() {
    // 0xa-something unused, e.g. 0x33 is not a defined opcode.
    assert_eq!(pop_count(0x33, None, 0).unwrap(), -1);
    assert!(!OPCODES[0x33].valid);
}

#[test]
fn jump_and_branch_control_flow_effects() {
    assert_eq!(OPCODES[0x10].control_flow, ControlFlowEffect::Jump); // jump
    assert_eq!(OPCODES[0x11].control_flow, ControlFlowEffect::Branch); // iftrue
    assert_eq!(OPCODES[0x1b].control_flow, ControlFlowEffect::Switch); // lookupswitch
    assert_eq!(OPCODES[0x47].control_flow, ControlFlowEffect::Return); // returnvoid
    assert_eq!(OPCODES[0x03].control_flow, ControlFlowEffect::Throw); // throw
}

#[test]
fn negative_arg_count_rejected() {
    assert!(opcode::pop_count(0x41, None, -1).is_err());
}
