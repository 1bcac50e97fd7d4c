//! Static AVM2 instruction set metadata: one record per possible opcode
//! byte, plus the stack-effect calculator for the handful of instructions
//! whose pop count depends on their operands rather than being fixed.

use crate::error::Error;
use once_cell::sync::Lazy;

/// The shape of an instruction's immediate operands, as they appear
/// following the opcode byte in the bytecode stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmediateShape {
    /// No immediate operands.
    None,
    /// A single U30 (a pool index, local index, or argument count).
    U30,
    /// Two U30s in sequence (e.g. a dispatch id and an argument count).
    U30U30,
    /// A signed 24-bit branch offset, relative to the end of the
    /// instruction.
    S24,
    /// A single signed byte immediate (`pushbyte`).
    Byte,
    /// `debug`'s operand layout: a 1-byte kind, a U30 name index, a 1-byte
    /// register, and a trailing U30 that most producers emit as zero.
    DebugTriplet,
    /// `lookupswitch`'s variable-length jump table: a default S24 offset, a
    /// U30 case count, and that many additional S24 offsets.
    LookupSwitch,
}

/// How an instruction affects the flow of control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlowEffect {
    None,
    Jump,
    Branch,
    Switch,
    Return,
    Throw,
}

/// An opcode's fixed stack-depth effect, or a marker that it must be
/// computed from the instruction's operands via [`pop_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackEffect {
    Fixed(u8),
    Variable,
}

#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    pub name: &'static str,
    pub immediate_shape: ImmediateShape,
    pub control_flow: ControlFlowEffect,
    pub pop: StackEffect,
    pub push: StackEffect,
    pub scope_push: bool,
    pub scope_pop: bool,
    pub local_read: bool,
    pub local_write: bool,
    pub debug: bool,
    pub valid: bool,
}

impl OpcodeInfo {
    const fn invalid() -> OpcodeInfo {
        OpcodeInfo {
            name: "",
            immediate_shape: ImmediateShape::None,
            control_flow: ControlFlowEffect::None,
            pop: StackEffect::Fixed(0),
            push: StackEffect::Fixed(0),
            scope_push: false,
            scope_pop: false,
            local_read: false,
            local_write: false,
            debug: false,
            valid: false,
        }
    }
}

struct Entry {
    opcode: u8,
    name: &'static str,
    shape: ImmediateShape,
    flow: ControlFlowEffect,
    pop: StackEffect,
    push: StackEffect,
    scope_push: bool,
    scope_pop: bool,
    local_read: bool,
    local_write: bool,
    debug: bool,
}

const fn e(
    opcode: u8,
    name: &'static str,
    shape: ImmediateShape,
    flow: ControlFlowEffect,
    pop: StackEffect,
    push: StackEffect,
) -> Entry {
    Entry {
        opcode,
        name,
        shape,
        flow,
        pop,
        push,
        scope_push: false,
        scope_pop: false,
        local_read: false,
        local_write: false,
        debug: false,
    }
}

macro_rules! entries {
    ($($x:expr),* $(,)?) => { vec![$($x),*] };
}

fn raw_table() -> Vec<Entry> {
    use ControlFlowEffect::*;
    use ImmediateShape::*;
    use StackEffect::{Fixed, Variable};

    entries![
        e(0x01, "bkpt", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(0)),
        e(0x02, "nop", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(0)),
        e(0x03, "throw", self::ImmediateShape::None, Throw, Fixed(1), Fixed(0)),
        Entry { local_read: false, ..e(0x04, "getsuper", U30, self::ControlFlowEffect::None, Fixed(1), Fixed(1)) },
        e(0x05, "setsuper", U30, self::ControlFlowEffect::None, Fixed(2), Fixed(0)),
        e(0x06, "dxns", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(0)),
        e(0x07, "dxnslate", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(0)),
        Entry { local_write: true, ..e(0x08, "kill", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(0)) },
        e(0x09, "label", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(0)),
        e(0x0c, "ifnlt", S24, Branch, Fixed(2), Fixed(0)),
        e(0x0d, "ifnle", S24, Branch, Fixed(2), Fixed(0)),
        e(0x0e, "ifngt", S24, Branch, Fixed(2), Fixed(0)),
        e(0x0f, "ifnge", S24, Branch, Fixed(2), Fixed(0)),
        e(0x10, "jump", S24, Jump, Fixed(0), Fixed(0)),
        e(0x11, "iftrue", S24, Branch, Fixed(1), Fixed(0)),
        e(0x12, "iffalse", S24, Branch, Fixed(1), Fixed(0)),
        e(0x13, "ifeq", S24, Branch, Fixed(2), Fixed(0)),
        e(0x14, "ifne", S24, Branch, Fixed(2), Fixed(0)),
        e(0x15, "iflt", S24, Branch, Fixed(2), Fixed(0)),
        e(0x16, "ifle", S24, Branch, Fixed(2), Fixed(0)),
        e(0x17, "ifgt", S24, Branch, Fixed(2), Fixed(0)),
        e(0x18, "ifge", S24, Branch, Fixed(2), Fixed(0)),
        e(0x19, "ifstricteq", S24, Branch, Fixed(2), Fixed(0)),
        e(0x1a, "ifstrictne", S24, Branch, Fixed(2), Fixed(0)),
        e(0x1b, "lookupswitch", LookupSwitch, Switch, Fixed(1), Fixed(0)),
        Entry { scope_push: true, ..e(0x1c, "pushwith", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(0)) },
        Entry { scope_pop: true, ..e(0x1d, "popscope", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(0)) },
        e(0x1e, "nextname", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0x1f, "hasnext", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0x20, "pushnull", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x21, "pushundefined", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x23, "nextvalue", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0x24, "pushbyte", Byte, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x25, "pushshort", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x26, "pushtrue", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x27, "pushfalse", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x28, "pushnan", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x29, "pop", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(0)),
        e(0x2a, "dup", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x2b, "swap", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(2)),
        e(0x2c, "pushstring", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x2d, "pushint", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x2e, "pushuint", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x2f, "pushdouble", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        Entry { scope_push: true, ..e(0x30, "pushscope", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(0)) },
        e(0x31, "pushnamespace", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x32, "hasnext2", U30U30, self::ControlFlowEffect::None, Fixed(0), Fixed(2)),
        e(0x40, "newfunction", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x41, "call", U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x42, "construct", U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x43, "callmethod", U30U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x44, "callstatic", U30U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x45, "callsuper", U30U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x46, "callproperty", U30U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x47, "returnvoid", self::ImmediateShape::None, Return, Fixed(0), Fixed(0)),
        e(0x48, "returnvalue", self::ImmediateShape::None, Return, Fixed(1), Fixed(0)),
        e(0x49, "constructsuper", U30, self::ControlFlowEffect::None, Variable, Fixed(0)),
        e(0x4a, "constructprop", U30U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x4c, "callproplex", U30U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x4e, "callsupervoid", U30U30, self::ControlFlowEffect::None, Variable, Fixed(0)),
        e(0x4f, "callpropvoid", U30U30, self::ControlFlowEffect::None, Variable, Fixed(0)),
        e(0x53, "applytype", U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x55, "newobject", U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x56, "newarray", U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x57, "newactivation", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x58, "newclass", U30, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x59, "getdescendants", U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x5a, "newcatch", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x5d, "findpropstrict", U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x5e, "findproperty", U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x5f, "finddef", U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x60, "getlex", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x61, "setproperty", U30, self::ControlFlowEffect::None, Variable, Fixed(0)),
        Entry { local_read: true, ..e(0x62, "getlocal", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)) },
        Entry { local_write: true, ..e(0x63, "setlocal", U30, self::ControlFlowEffect::None, Fixed(1), Fixed(0)) },
        e(0x64, "getglobalscope", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x65, "getscopeobject", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x66, "getproperty", U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x68, "initproperty", U30, self::ControlFlowEffect::None, Variable, Fixed(0)),
        e(0x6a, "deleteproperty", U30, self::ControlFlowEffect::None, Variable, Fixed(1)),
        e(0x6c, "getslot", U30, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x6d, "setslot", U30, self::ControlFlowEffect::None, Fixed(2), Fixed(0)),
        e(0x6e, "getglobalslot", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(1)),
        e(0x6f, "setglobalslot", U30, self::ControlFlowEffect::None, Fixed(1), Fixed(0)),
        e(0x70, "convert_s", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x71, "esc_xelem", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x72, "esc_xattr", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x73, "convert_i", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x74, "convert_u", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x75, "convert_d", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x76, "convert_b", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x77, "convert_o", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x78, "checkfilter", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x80, "coerce", U30, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x82, "coerce_a", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x85, "coerce_s", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x86, "astype", U30, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x87, "astypelate", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0x90, "negate", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        Entry { local_read: true, local_write: true, ..e(0x91, "increment", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)) },
        Entry { local_read: true, local_write: true, ..e(0x92, "inclocal", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(0)) },
        e(0x93, "decrement", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        Entry { local_read: true, local_write: true, ..e(0x94, "declocal", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(0)) },
        e(0x95, "typeof", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x96, "not", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0x97, "bitnot", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0xa0, "add", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xa1, "subtract", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xa2, "multiply", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xa3, "divide", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xa4, "modulo", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xa5, "lshift", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xa6, "rshift", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xa7, "urshift", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xa8, "bitand", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xa9, "bitor", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xaa, "bitxor", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xab, "equals", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xac, "strictequals", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xad, "lessthan", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xae, "lessequals", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xaf, "greaterthan", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xb0, "greaterequals", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xb1, "instanceof", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xb2, "istype", U30, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0xb3, "istypelate", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xb4, "in", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xc0, "increment_i", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0xc1, "decrement_i", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        Entry { local_read: true, local_write: true, ..e(0xc2, "inclocal_i", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(0)) },
        Entry { local_read: true, local_write: true, ..e(0xc3, "declocal_i", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(0)) },
        e(0xc4, "negate_i", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(1)),
        e(0xc5, "add_i", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xc6, "subtract_i", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        e(0xc7, "multiply_i", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(2), Fixed(1)),
        Entry { local_read: true, ..e(0xd0, "getlocal0", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)) },
        Entry { local_read: true, ..e(0xd1, "getlocal1", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)) },
        Entry { local_read: true, ..e(0xd2, "getlocal2", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)) },
        Entry { local_read: true, ..e(0xd3, "getlocal3", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(1)) },
        Entry { local_write: true, ..e(0xd4, "setlocal0", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(0)) },
        Entry { local_write: true, ..e(0xd5, "setlocal1", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(0)) },
        Entry { local_write: true, ..e(0xd6, "setlocal2", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(0)) },
        Entry { local_write: true, ..e(0xd7, "setlocal3", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(1), Fixed(0)) },
        Entry { debug: true, ..e(0xef, "debug", DebugTriplet, self::ControlFlowEffect::None, Fixed(0), Fixed(0)) },
        Entry { debug: true, ..e(0xf0, "debugline", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(0)) },
        Entry { debug: true, ..e(0xf1, "debugfile", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(0)) },
        Entry { debug: true, ..e(0xf2, "bkptline", U30, self::ControlFlowEffect::None, Fixed(0), Fixed(0)) },
        e(0xf3, "timestamp", self::ImmediateShape::None, self::ControlFlowEffect::None, Fixed(0), Fixed(0)),
    ]
}

pub static OPCODES: Lazy<[OpcodeInfo; 256]> = Lazy::new(|| {
    let mut table = [OpcodeInfo::invalid(); 256];
    for entry in &raw_table() {
        table[entry.opcode as usize] = OpcodeInfo {
            name: entry.name,
            immediate_shape: entry.shape,
            control_flow: entry.flow,
            pop: entry.pop,
            push: entry.push,
            scope_push: entry.scope_push,
            scope_pop: entry.scope_pop,
            local_read: entry.local_read,
            local_write: entry.local_write,
            debug: entry.debug,
            valid: true,
        };
    }
    table
});

// Opcodes with argument-count-dependent or multiname-dependent pop counts;
// pop_count special-cases these by name rather than by looking at the
// table's nominal fixed pop field.
const OP_NEWARRAY: u8 = 0x56;
const OP_NEWOBJECT: u8 = 0x55;
const OP_CALL: u8 = 0x41;
const OP_CONSTRUCT: u8 = 0x42;
const OP_CALLMETHOD: u8 = 0x43;
const OP_CALLSTATIC: u8 = 0x44;
const OP_CONSTRUCTSUPER: u8 = 0x49;
const OP_APPLYTYPE: u8 = 0x53;
const OP_CALLPROPERTY: u8 = 0x46;
const OP_CALLPROPLEX: u8 = 0x4c;
const OP_CALLPROPVOID: u8 = 0x4f;
const OP_CALLSUPER: u8 = 0x45;
const OP_CALLSUPERVOID: u8 = 0x4e;
const OP_CONSTRUCTPROP: u8 = 0x4a;
const OP_FINDDEF: u8 = 0x5f;
const OP_FINDPROPERTY: u8 = 0x5e;
const OP_FINDPROPSTRICT: u8 = 0x5d;
const OP_DELETEPROPERTY: u8 = 0x6a;
const OP_GETDESCENDANTS: u8 = 0x59;
const OP_GETPROPERTY: u8 = 0x66;
const OP_GETSUPER: u8 = 0x04;
const OP_IN: u8 = 0xb4;
const OP_INITPROPERTY: u8 = 0x68;
const OP_SETPROPERTY: u8 = 0x61;
const OP_SETSUPER: u8 = 0x05;

/// Number of extra operand-stack slots a multiname's runtime-provided parts
/// (namespace and/or local name) consume at the instruction site.
fn multiname_runtime_addend(kind: Option<crate::multiname::MultinameKind>) -> Result<u32, Error> {
    let kind = kind.ok_or(Error::ArgumentOutOfRange {
        what: "multiname_kind",
        value: -1,
    })?;
    use crate::multiname::MultinameKind::*;
    Ok(match kind {
        QName | QNameAttr | Multiname | MultinameAttr => 0,
        RtQName | RtQNameAttr | MultinameL | MultinameLAttr => 1,
        RtQNameL | RtQNameLAttr => 2,
        GenericClassName => 0,
    })
}

/// Compute the true pop count of a concrete instruction occurrence. See
/// the per-opcode contract on each branch; anything not special-cased here
/// uses the opcode table's fixed pop count.
pub fn pop_count(
    opcode: u8,
    multiname_kind: Option<crate::multiname::MultinameKind>,
    arg_count: i64,
) -> Result<i64, Error> {
    let info = &OPCODES[opcode as usize];
    if !info.valid {
        return Ok(-1);
    }
    if arg_count < 0 {
        return Err(Error::ArgumentOutOfRange {
            what: "arg_count",
            value: arg_count,
        });
    }
    let arg_count = arg_count as u32;

    let pop = match opcode {
        OP_NEWARRAY => arg_count,
        OP_NEWOBJECT => 2 * arg_count,
        OP_CALL => arg_count + 2,
        OP_CONSTRUCT | OP_CALLMETHOD | OP_CALLSTATIC | OP_CONSTRUCTSUPER | OP_APPLYTYPE => {
            arg_count + 1
        }
        OP_CALLPROPERTY | OP_CALLPROPLEX | OP_CALLPROPVOID | OP_CALLSUPER | OP_CALLSUPERVOID
        | OP_CONSTRUCTPROP => arg_count + 1 + multiname_runtime_addend(multiname_kind)?,
        OP_FINDDEF | OP_FINDPROPERTY | OP_FINDPROPSTRICT => {
            multiname_runtime_addend(multiname_kind)?
        }
        OP_DELETEPROPERTY | OP_GETDESCENDANTS | OP_GETPROPERTY | OP_GETSUPER | OP_IN => {
            1 + multiname_runtime_addend(multiname_kind)?
        }
        OP_INITPROPERTY | OP_SETPROPERTY | OP_SETSUPER => {
            2 + multiname_runtime_addend(multiname_kind)?
        }
        _ => match info.pop {
            StackEffect::Fixed(n) => n as u32,
            StackEffect::Variable => {
                return Err(Error::ArgumentOutOfRange {
                    what: "opcode",
                    value: opcode as i64,
                })
            }
        },
    };
    Ok(pop as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiname::MultinameKind;

    #[test]
    fn invalid_opcode_returns_minus_one() {
        assert_eq!(pop_count(0xfe, None, 0).unwrap(), -1);
    }

    #[test]
    fn callproperty_addend_matches_multiname_kind() {
        assert_eq!(
            pop_count(OP_CALLPROPERTY, Some(MultinameKind::QName), 3).unwrap(),
            4
        );
        assert_eq!(
            pop_count(OP_CALLPROPERTY, Some(MultinameKind::MultinameL), 3).unwrap(),
            5
        );
        assert_eq!(
            pop_count(OP_CALLPROPERTY, Some(MultinameKind::RtQNameL), 3).unwrap(),
            6
        );
    }

    #[test]
    fn newobject_and_newarray_scale_with_arg_count() {
        assert_eq!(pop_count(OP_NEWOBJECT, None, 2).unwrap(), 4);
        assert_eq!(pop_count(OP_NEWARRAY, None, 2).unwrap(), 2);
    }

    #[test]
    fn dup_is_fixed_from_the_table() {
        assert_eq!(pop_count(0x2a, None, 0).unwrap(), 0);
        assert_eq!(OPCODES[0x2a].push, StackEffect::Fixed(1));
    }

    #[test]
    fn negative_arg_count_is_an_error() {
        assert!(pop_count(OP_CALL, None, -1).is_err());
    }
}
