//! The closed error taxonomy for ABC parsing.
//!
//! Every fatal condition the parser can hit is a distinct variant here, each
//! carrying whatever index/flag arguments identify the offending data. There
//! is no recovery: a parse that raises any of these aborts and no partial
//! `AbcFile` escapes.

use thiserror::Error;

/// Which constant pool an out-of-range index was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    Int,
    Uint,
    Double,
    String,
    Namespace,
    NamespaceSet,
    Multiname,
    GenericArgList,
}

impl std::fmt::Display for PoolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PoolKind::Int => "int",
            PoolKind::Uint => "uint",
            PoolKind::Double => "double",
            PoolKind::String => "string",
            PoolKind::Namespace => "namespace",
            PoolKind::NamespaceSet => "namespace_set",
            PoolKind::Multiname => "multiname",
            PoolKind::GenericArgList => "generic_arg_list",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The underlying reader ended before a fixed-width or length-prefixed
    /// field could be fully read.
    #[error("unexpected end of ABC stream")]
    AbcCorrupt,

    /// A string field contained a byte sequence that is not valid UTF-8, and
    /// the parser was run in strict mode.
    #[error("invalid UTF-8 in string at byte offset {offset}")]
    AbcInvalidUtf8 { offset: u64 },

    /// A U30 field decoded to a value with bit 30 or 31 set.
    #[error("illegal U30 value {value:#x} (bits 30/31 set)")]
    AbcIllegalU30 { value: u32 },

    /// A multiname's kind tag byte did not match any recognized kind.
    #[error("illegal multiname kind tag {kind:#x}")]
    AbcIllegalMultinameKind { kind: u8 },

    /// A multiname referenced a pool slot (namespace-set index, generic
    /// definition index, generic argument index) that is the reserved null
    /// slot 0, where a nonzero index is required.
    #[error("illegal multiname pool index {index} (must be nonzero)")]
    AbcIllegalMultinamePoolIndex { index: u32 },

    /// A namespace's kind tag byte did not match any recognized kind.
    #[error("illegal namespace kind tag {kind:#x}")]
    IllegalNamespaceValue { kind: u8 },

    /// An index into one of the eight constant pools was out of bounds when
    /// resolved by an accessor.
    #[error("{pool} pool index {index} out of range (pool has {pool_len} entries)")]
    ConstPoolOutOfRange {
        pool: PoolKind,
        index: u32,
        pool_len: u32,
    },

    /// A `method_info` index was out of bounds when resolved.
    #[error("method_info index {index} out of range ({len} entries)")]
    MethodInfoOutOfRange { index: u32, len: u32 },

    /// A `class_info` index was out of bounds when resolved.
    #[error("class_info index {index} out of range ({len} entries)")]
    ClassInfoOutOfRange { index: u32, len: u32 },

    /// A metadata-tag index was out of bounds when resolved.
    #[error("metadata index {index} out of range ({len} entries)")]
    MetadataOutOfRange { index: u32, len: u32 },

    /// A `method_info`'s flag byte carried unknown bits, or an illegal
    /// combination of known bits (`NEED_ARGUMENTS` with `NEED_REST`).
    #[error("method_info #{index} has invalid flags {flag_bits:#x}")]
    MethodInfoInvalidFlags { index: u32, flag_bits: u8 },

    /// A `method_info`'s declared optional-parameter count exceeded its
    /// parameter count.
    #[error(
        "method_info #{index} declares {optional_count} optional params but only has {param_count} params"
    )]
    MethodInfoOptionalExceedsParam {
        index: u32,
        optional_count: u32,
        param_count: u32,
    },

    /// An `instance_info`'s flag byte carried unknown bits, or declared both
    /// `ClassFinal` and `ClassInterface`.
    #[error("instance_info #{index} has invalid flags {flag_bits:#x}")]
    AbcInvalidInstanceInfoFlags { index: u32, flag_bits: u8 },

    /// A class's name multiname did not resolve to a `QName`.
    #[error("class name multiname is not a QName")]
    AbcClassTraitNameNotQName,

    /// A trait or class name resolved to a `QName` with a null local name.
    #[error("class or trait name has a null local name")]
    AbcClassTraitNameNull,

    /// A trait's low-nibble kind value did not match any recognized trait
    /// kind.
    #[error("invalid trait kind in flags byte {flags:#x}")]
    InvalidTraitKind { flags: u8 },

    /// A method body declared `init_scope_depth` greater than
    /// `max_scope_depth`.
    #[error("method body has init_scope_depth {init} greater than max_scope_depth {max}")]
    MethodBodyInvalidScopeDepths { init: u32, max: u32 },

    /// A caller-supplied argument that must not be absent was absent.
    #[error("argument `{what}` must not be null/absent")]
    ArgumentNull { what: &'static str },

    /// A caller-supplied argument (such as an opcode's argument count) was
    /// outside its legal range.
    #[error("argument `{what}` value {value} is out of range")]
    ArgumentOutOfRange { what: &'static str, value: i64 },

    /// A lower-level I/O failure from the underlying reader (not a short
    /// read of a well-formed stream, which is reported as [`Error::AbcCorrupt`]).
    #[error("I/O error reading ABC stream: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
