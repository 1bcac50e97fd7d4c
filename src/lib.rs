//! A parser and in-memory model for Adobe ActionScript 3 (AVM2) ABC
//! bytecode files.
//!
//! [`AbcFile::from_bytes`], [`AbcFile::from_reader`], and
//! [`AbcFile::from_path`] parse a complete file into an immutable,
//! randomly-accessible [`AbcFile`]: its eight constant pools, method
//! signatures, metadata, classes, scripts, and method bodies. The
//! [`opcode`] module separately exposes a static description of the AVM2
//! instruction set and the variable stack-effect calculation in
//! [`pop_count`].
//!
//! This crate does not verify bytecode, perform type inference, execute
//! anything, or resolve traits against a host type system; it produces the
//! parsed model for downstream consumers that do.

#![forbid(unsafe_code)]

mod error;
mod intern;
mod multiname;
pub mod opcode;
mod parser;
mod read;
mod types;

pub use error::{Error, PoolKind, Result};
pub use multiname::{Multiname, MultinameKind, Namespace, NamespaceSet, PrivateNamespaceId};
pub use opcode::pop_count;
pub use read::ParseOptions;
pub use types::{
    AbcFile, ClassFlags, ClassInfo, ConstantValue, ExceptionInfo, InstanceInfo, MetadataTag,
    MethodBodyInfo, MethodFlags, MethodInfo, ScriptInfo, TraitAttrs, TraitInfo, TraitKind,
    TraitPayload,
};

use std::io::Read;
use std::path::Path;

impl AbcFile {
    /// Parse a complete ABC file from an in-memory byte slice.
    pub fn from_bytes(bytes: &[u8], options: ParseOptions) -> Result<AbcFile> {
        Self::from_reader(bytes, options)
    }

    /// Parse a complete ABC file from an arbitrary stream. The stream is
    /// read to completion (or until a fatal error) and not closed.
    pub fn from_reader<R: Read>(reader: R, options: ParseOptions) -> Result<AbcFile> {
        parser::parse(reader, options)
    }

    /// Parse a complete ABC file from the file at `path`.
    pub fn from_path<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<AbcFile> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file), options)
    }
}
