//! The ABC data model: every record a parsed file is made of, exposed as
//! immutable, index-accessed structures hanging off [`AbcFile`].
//!
//! Nothing in this module parses bytes; [`crate::parser`] builds these
//! values and [`AbcFile`]'s accessors only ever validate an index against a
//! pool that already exists.

use crate::error::{Error, PoolKind};
use crate::multiname::{render, Multiname, Namespace, NamespaceSet, RenderContext};
use std::sync::Arc;

bitflags::bitflags! {
    /// `method_info` flag byte. Bits 0x10 and 0x20 are unused by any known
    /// producer and rejected by the parser as unknown.
    pub struct MethodFlags: u8 {
        const NEED_ARGUMENTS = 0x01;
        const NEED_ACTIVATION = 0x02;
        const NEED_REST = 0x04;
        const HAS_OPTIONAL = 0x08;
        const SET_DXNS = 0x40;
        const HAS_PARAM_NAMES = 0x80;
    }
}

impl MethodFlags {
    pub const VALID_MASK: u8 = 0x01 | 0x02 | 0x04 | 0x08 | 0x40 | 0x80;
}

bitflags::bitflags! {
    /// `instance_info` flag byte.
    pub struct ClassFlags: u8 {
        const SEALED = 0x01;
        const FINAL = 0x02;
        const INTERFACE = 0x04;
        const PROTECTED_NS = 0x08;
    }
}

impl ClassFlags {
    pub const VALID_MASK: u8 = 0x01 | 0x02 | 0x04 | 0x08;
}

bitflags::bitflags! {
    /// The high-nibble attribute bits of a trait's flag byte; the low
    /// nibble is the trait kind, see [`TraitKind`].
    pub struct TraitAttrs: u8 {
        const FINAL = 0x10;
        const OVERRIDE = 0x20;
        const METADATA = 0x40;
    }
}

impl TraitAttrs {
    pub const VALID_MASK: u8 = 0x10 | 0x20 | 0x40;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraitKind {
    Slot,
    Method,
    Getter,
    Setter,
    Class,
    Function,
    Const,
}

impl TraitKind {
    pub fn from_low_nibble(value: u8) -> Option<TraitKind> {
        match value {
            0 => Some(TraitKind::Slot),
            1 => Some(TraitKind::Method),
            2 => Some(TraitKind::Getter),
            3 => Some(TraitKind::Setter),
            4 => Some(TraitKind::Class),
            5 => Some(TraitKind::Function),
            6 => Some(TraitKind::Const),
            _ => None,
        }
    }

    pub fn is_dispatch_kind(self) -> bool {
        matches!(self, TraitKind::Method | TraitKind::Getter | TraitKind::Setter)
    }
}

/// The resolved payload of a trait, discriminated by [`TraitKind`].
#[derive(Debug, Clone)]
pub enum TraitPayload {
    /// Field-like traits (`Slot`, `Const`): type annotation plus an
    /// optional default value.
    Field {
        type_name: Multiname,
        default_value: Option<ConstantValue>,
    },
    /// `Class` traits: index into the class-info array.
    Class { class_index: u32 },
    /// `Method`/`Getter`/`Setter`/`Function` traits: index into the
    /// method-info array.
    Method { method_index: u32 },
}

#[derive(Debug, Clone)]
pub struct TraitInfo {
    pub name: Multiname,
    pub kind: TraitKind,
    pub attrs: TraitAttrs,
    /// Slot-id for `Slot`/`Const`/`Class`/`Function` traits, dispatch-id for
    /// `Method`/`Getter`/`Setter`. The spec calls this "slot/disp id"; which
    /// interpretation applies is determined by `kind`.
    pub slot_or_disp_id: u32,
    pub payload: TraitPayload,
    pub metadata: Vec<u32>,
}

impl TraitInfo {
    /// Slot id for field/class/function traits, -1 for dispatch-kind traits.
    pub fn slot_id(&self) -> i64 {
        if self.kind.is_dispatch_kind() {
            -1
        } else {
            self.slot_or_disp_id as i64
        }
    }

    /// Method-dispatch id for method/getter/setter traits, -1 otherwise.
    pub fn method_disp_id(&self) -> i64 {
        if self.kind.is_dispatch_kind() {
            self.slot_or_disp_id as i64
        } else {
            -1
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub return_type: Multiname,
    pub params: Vec<Multiname>,
    pub name: Arc<str>,
    pub flags: MethodFlags,
    pub options: Vec<ConstantValue>,
    pub param_names: Vec<Arc<str>>,
}

impl MethodInfo {
    pub fn param_count(&self) -> u32 {
        self.params.len() as u32
    }

    pub fn optional_count(&self) -> u32 {
        self.options.len() as u32
    }
}

#[derive(Debug, Clone)]
pub struct MetadataTag {
    pub name: Arc<str>,
    pub keys: Vec<Arc<str>>,
    pub values: Vec<Arc<str>>,
}

#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub name: Multiname,
    pub super_name: Multiname,
    pub flags: ClassFlags,
    pub protected_ns: Option<Namespace>,
    pub interfaces: Vec<Multiname>,
    pub init_index: u32,
    pub traits: Vec<TraitInfo>,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub instance: InstanceInfo,
    pub static_init_index: u32,
    pub static_traits: Vec<TraitInfo>,
}

#[derive(Debug, Clone)]
pub struct ScriptInfo {
    pub init_index: u32,
    pub traits: Vec<TraitInfo>,
}

#[derive(Debug, Clone)]
pub struct ExceptionInfo {
    pub try_start: u32,
    pub try_end: u32,
    pub target: u32,
    pub catch_type: Multiname,
    pub catch_var: Multiname,
}

#[derive(Debug, Clone)]
pub struct MethodBodyInfo {
    pub method_index: u32,
    pub max_stack: u32,
    pub local_count: u32,
    pub init_scope_depth: u32,
    pub max_scope_depth: u32,
    pub code: Vec<u8>,
    pub exceptions: Vec<ExceptionInfo>,
    pub traits: Vec<TraitInfo>,
}

/// A resolved default/constant value, tagged over the eight kinds the
/// format can express. Downstream consumers discriminate on this enum; the
/// parser itself never needs to.
#[derive(Debug, Clone)]
pub enum ConstantValue {
    Int(i32),
    Uint(u32),
    Double(f64),
    String(Arc<str>),
    Boolean(bool),
    Null,
    Undefined,
    Namespace(Namespace),
}

const CONSTANT_UNDEFINED: u8 = 0x00;
const CONSTANT_UTF8: u8 = 0x01;
const CONSTANT_INT: u8 = 0x03;
const CONSTANT_UINT: u8 = 0x04;
const CONSTANT_PRIVATE_NS: u8 = 0x05;
const CONSTANT_DOUBLE: u8 = 0x06;
const CONSTANT_NAMESPACE: u8 = 0x08;
const CONSTANT_FALSE: u8 = 0x0a;
const CONSTANT_TRUE: u8 = 0x0b;
const CONSTANT_NULL: u8 = 0x0c;
const CONSTANT_PACKAGE_NAMESPACE: u8 = 0x16;
const CONSTANT_PACKAGE_INTERNAL_NS: u8 = 0x17;
const CONSTANT_PROTECTED_NAMESPACE: u8 = 0x18;
const CONSTANT_EXPLICIT_NAMESPACE: u8 = 0x19;
const CONSTANT_STATIC_PROTECTED_NS: u8 = 0x1a;

/// The complete, immutable model of a parsed ABC file: eight constant
/// pools plus the method, metadata, class, script, and method-body arrays.
///
/// All pool fields other than `generic_arg_lists` hold a sentinel at index
/// 0, per the format's null/any-slot convention; `generic_arg_lists` is not
/// sentinel-prefixed; it is indexed directly by a `GenericClassName`
/// multiname's second index.
#[derive(Debug, Clone)]
pub struct AbcFile {
    pub major_version: u16,
    pub minor_version: u16,
    pub(crate) ints: Vec<i32>,
    pub(crate) uints: Vec<u32>,
    pub(crate) doubles: Vec<f64>,
    pub(crate) strings: Vec<Arc<str>>,
    pub(crate) namespaces: Vec<Namespace>,
    pub(crate) namespace_sets: Vec<NamespaceSet>,
    pub(crate) multinames: Vec<Multiname>,
    pub(crate) generic_arg_lists: Vec<Vec<Multiname>>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) metadata: Vec<MetadataTag>,
    pub(crate) classes: Vec<ClassInfo>,
    pub(crate) scripts: Vec<ScriptInfo>,
    pub(crate) method_bodies: Vec<MethodBodyInfo>,
}

macro_rules! pool_accessor {
    ($name:ident, $field:ident, $elem:ty, $kind:expr) => {
        pub fn $name(&self, index: u32) -> Result<&$elem, Error> {
            self.$field
                .get(index as usize)
                .ok_or(Error::ConstPoolOutOfRange {
                    pool: $kind,
                    index,
                    pool_len: self.$field.len() as u32,
                })
        }
    };
}

impl AbcFile {
    pool_accessor!(int, ints, i32, PoolKind::Int);
    pool_accessor!(uint, uints, u32, PoolKind::Uint);
    pool_accessor!(double, doubles, f64, PoolKind::Double);
    pool_accessor!(string, strings, Arc<str>, PoolKind::String);
    pool_accessor!(namespace, namespaces, Namespace, PoolKind::Namespace);
    pool_accessor!(
        namespace_set,
        namespace_sets,
        NamespaceSet,
        PoolKind::NamespaceSet
    );
    pool_accessor!(multiname, multinames, Multiname, PoolKind::Multiname);

    pub fn generic_arg_list(&self, index: u32) -> Result<&[Multiname], Error> {
        self.generic_arg_lists
            .get(index as usize)
            .map(Vec::as_slice)
            .ok_or(Error::ConstPoolOutOfRange {
                pool: PoolKind::GenericArgList,
                index,
                pool_len: self.generic_arg_lists.len() as u32,
            })
    }

    pub fn method_info(&self, index: u32) -> Result<&MethodInfo, Error> {
        self.methods
            .get(index as usize)
            .ok_or(Error::MethodInfoOutOfRange {
                index,
                len: self.methods.len() as u32,
            })
    }

    pub fn class_info(&self, index: u32) -> Result<&ClassInfo, Error> {
        self.classes
            .get(index as usize)
            .ok_or(Error::ClassInfoOutOfRange {
                index,
                len: self.classes.len() as u32,
            })
    }

    pub fn metadata_tag(&self, index: u32) -> Result<&MetadataTag, Error> {
        self.metadata
            .get(index as usize)
            .ok_or(Error::MetadataOutOfRange {
                index,
                len: self.metadata.len() as u32,
            })
    }

    pub fn scripts(&self) -> &[ScriptInfo] {
        &self.scripts
    }

    pub fn method_bodies(&self) -> &[MethodBodyInfo] {
        &self.method_bodies
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    pub fn classes(&self) -> &[ClassInfo] {
        &self.classes
    }

    /// Resolve a `(kind, index)` pair — as found in a trait's default value
    /// or a method's optional-parameter value — to a typed constant.
    pub fn resolve_constant(&self, kind: u8, index: u32) -> Result<ConstantValue, Error> {
        match kind {
            CONSTANT_INT => Ok(ConstantValue::Int(*self.int(index)?)),
            CONSTANT_UINT => Ok(ConstantValue::Uint(*self.uint(index)?)),
            CONSTANT_DOUBLE => Ok(ConstantValue::Double(*self.double(index)?)),
            CONSTANT_UTF8 => Ok(ConstantValue::String(self.string(index)?.clone())),
            CONSTANT_TRUE => Ok(ConstantValue::Boolean(true)),
            CONSTANT_FALSE => Ok(ConstantValue::Boolean(false)),
            CONSTANT_NULL => Ok(ConstantValue::Null),
            CONSTANT_UNDEFINED => Ok(ConstantValue::Undefined),
            CONSTANT_NAMESPACE
            | CONSTANT_PACKAGE_NAMESPACE
            | CONSTANT_PACKAGE_INTERNAL_NS
            | CONSTANT_PROTECTED_NAMESPACE
            | CONSTANT_EXPLICIT_NAMESPACE
            | CONSTANT_STATIC_PROTECTED_NS
            | CONSTANT_PRIVATE_NS => Ok(ConstantValue::Namespace(self.namespace(index)?.clone())),
            _ => Err(Error::ConstPoolOutOfRange {
                pool: PoolKind::String,
                index: kind as u32,
                pool_len: 0,
            }),
        }
    }

    /// Render a multiname to its disassembly text form (see
    /// [`crate::multiname::render`]).
    pub fn render_multiname(&self, m: &Multiname) -> Result<String, Error> {
        let ctx = RenderContext {
            strings: &self.strings,
            namespaces: &self.namespaces,
            namespace_sets: &self.namespace_sets,
            multinames: &self.multinames,
            generic_arg_lists: &self.generic_arg_lists,
        };
        render(&ctx, m)
    }
}
