//! The ABC parser driver: header, seven constant pools, the
//! generic-argument-list resolution micro-pass, method signatures,
//! metadata, classes (both halves), scripts, and method bodies, in that
//! fixed order.

use crate::error::{Error, PoolKind};
use crate::multiname::{Multiname, Namespace, NamespaceSet};
use crate::read::{ParseOptions, Reader};
use crate::types::*;
use log::{debug, trace};
use std::io::Read;
use std::sync::Arc;

/// Parse a complete ABC file from `input`. The stream is read to
/// completion (or until a fatal error) and not closed.
pub fn parse<R: Read>(input: R, options: ParseOptions) -> Result<AbcFile, Error> {
    let mut r = Reader::new(input, options);

    let major_version = r.read_u16_le()?;
    let minor_version = r.read_u16_le()?;
    debug!("ABC version {major_version}.{minor_version}");

    let ints = read_sentinel_pool(&mut r, 0i32, |r| Ok(r.read_u32()? as i32))?;
    let uints = read_sentinel_pool(&mut r, 0u32, |r| r.read_u32())?;
    let doubles = read_sentinel_pool(&mut r, f64::NAN, |r| r.read_d64_le())?;
    let strings = read_sentinel_pool(&mut r, Arc::from(""), |r| r.read_string())?;
    let namespaces = read_sentinel_pool(&mut r, Namespace::Any, |r| {
        Namespace::decode(r, &strings)
    })?;
    let namespace_sets = read_sentinel_pool(&mut r, NamespaceSet::new(Vec::new()), |r| {
        NamespaceSet::decode(r, &namespaces)
    })?;

    let mut raw_generic_arg_lists: Vec<Vec<u32>> = Vec::new();
    let multinames = read_sentinel_pool(&mut r, Multiname::qname(0, 0), |r| {
        Multiname::decode(r, &mut raw_generic_arg_lists)
    })?;

    let generic_arg_lists = resolve_generic_arg_lists(&raw_generic_arg_lists, &multinames)?;
    trace!("resolved {} generic argument list(s)", generic_arg_lists.len());

    let mut file = AbcFile {
        major_version,
        minor_version,
        ints,
        uints,
        doubles,
        strings,
        namespaces,
        namespace_sets,
        multinames,
        generic_arg_lists,
        methods: Vec::new(),
        metadata: Vec::new(),
        classes: Vec::new(),
        scripts: Vec::new(),
        method_bodies: Vec::new(),
    };

    file.methods = read_method_infos(&mut r, &file)?;
    debug!("{} method_info entries", file.methods.len());

    file.metadata = read_metadata(&mut r, &file)?;
    debug!("{} metadata tags", file.metadata.len());

    let class_count = r.read_u30()?;
    let mut instances = Vec::with_capacity(class_count as usize);
    for index in 0..class_count {
        instances.push(read_instance_info(&mut r, &file, index)?);
    }

    let mut classes = Vec::with_capacity(class_count as usize);
    for instance in instances {
        let static_init_index = r.read_u30()?;
        let static_traits = read_traits(&mut r, &file)?;
        classes.push(ClassInfo {
            instance,
            static_init_index,
            static_traits,
        });
    }
    file.classes = classes;
    debug!("{} class_info entries", file.classes.len());

    file.scripts = read_scripts(&mut r, &file)?;
    debug!("{} script_info entries", file.scripts.len());

    file.method_bodies = read_method_bodies(&mut r, &file)?;
    debug!("{} method_body_info entries", file.method_bodies.len());

    Ok(file)
}

/// Read a U30 declared count `C`, then build a pool of length `max(C, 1)`
/// with `sentinel` at index 0 and `C - 1` further entries read by
/// `read_one`. A declared count of 0 means "just the sentinel".
fn read_sentinel_pool<T, R: Read>(
    r: &mut Reader<R>,
    sentinel: T,
    mut read_one: impl FnMut(&mut Reader<R>) -> Result<T, Error>,
) -> Result<Vec<T>, Error> {
    let count = r.read_u30()?;
    let mut pool = Vec::with_capacity(count.max(1) as usize);
    pool.push(sentinel);
    for _ in 1..count {
        pool.push(read_one(r)?);
    }
    Ok(pool)
}

fn resolve_multiname(
    file_multinames: &[Multiname],
    index: u32,
) -> Result<Multiname, Error> {
    file_multinames
        .get(index as usize)
        .copied()
        .ok_or(Error::ConstPoolOutOfRange {
            pool: PoolKind::Multiname,
            index,
            pool_len: file_multinames.len() as u32,
        })
}

fn resolve_string(strings: &[Arc<str>], index: u32) -> Result<Arc<str>, Error> {
    strings
        .get(index as usize)
        .cloned()
        .ok_or(Error::ConstPoolOutOfRange {
            pool: PoolKind::String,
            index,
            pool_len: strings.len() as u32,
        })
}

fn resolve_generic_arg_lists(
    raw: &[Vec<u32>],
    multinames: &[Multiname],
) -> Result<Vec<Vec<Multiname>>, Error> {
    raw.iter()
        .map(|indices| {
            indices
                .iter()
                .map(|&idx| resolve_multiname(multinames, idx))
                .collect()
        })
        .collect()
}

fn read_method_infos<R: Read>(r: &mut Reader<R>, file: &AbcFile) -> Result<Vec<MethodInfo>, Error> {
    let count = r.read_u30()?;
    let mut methods = Vec::with_capacity(count as usize);
    for index in 0..count {
        let param_count = r.read_u30()?;
        let return_type_index = r.read_u30()?;
        let return_type = resolve_multiname(&file.multinames, return_type_index)?;
        let mut params = Vec::with_capacity(param_count as usize);
        for _ in 0..param_count {
            let idx = r.read_u30()?;
            params.push(resolve_multiname(&file.multinames, idx)?);
        }
        let name_index = r.read_u30()?;
        let name = resolve_string(&file.strings, name_index)?;

        let flag_bits = r.read_u8()?;
        if flag_bits & !MethodFlags::VALID_MASK != 0 {
            return Err(Error::MethodInfoInvalidFlags { index, flag_bits });
        }
        let flags = MethodFlags::from_bits_truncate(flag_bits);
        if flags.contains(MethodFlags::NEED_ARGUMENTS) && flags.contains(MethodFlags::NEED_REST) {
            return Err(Error::MethodInfoInvalidFlags { index, flag_bits });
        }

        let mut options = Vec::new();
        if flags.contains(MethodFlags::HAS_OPTIONAL) {
            let optional_count = r.read_u30()?;
            if optional_count > param_count {
                return Err(Error::MethodInfoOptionalExceedsParam {
                    index,
                    optional_count,
                    param_count,
                });
            }
            options.reserve(optional_count as usize);
            for _ in 0..optional_count {
                let value_index = r.read_u30()?;
                let kind = r.read_u8()?;
                options.push(file.resolve_constant(kind, value_index)?);
            }
        }

        let mut param_names = Vec::new();
        if flags.contains(MethodFlags::HAS_PARAM_NAMES) {
            param_names.reserve(param_count as usize);
            for _ in 0..param_count {
                let idx = r.read_u30()?;
                param_names.push(resolve_string(&file.strings, idx)?);
            }
        }

        methods.push(MethodInfo {
            return_type,
            params,
            name,
            flags,
            options,
            param_names,
        });
    }
    Ok(methods)
}

fn read_metadata<R: Read>(r: &mut Reader<R>, file: &AbcFile) -> Result<Vec<MetadataTag>, Error> {
    let count = r.read_u30()?;
    let mut tags = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = r.read_u30()?;
        let name = resolve_string(&file.strings, name_index)?;
        let pair_count = r.read_u30()?;
        let mut keys = Vec::with_capacity(pair_count as usize);
        for _ in 0..pair_count {
            let idx = r.read_u30()?;
            keys.push(resolve_string(&file.strings, idx)?);
        }
        let mut values = Vec::with_capacity(pair_count as usize);
        for _ in 0..pair_count {
            let idx = r.read_u30()?;
            values.push(resolve_string(&file.strings, idx)?);
        }
        tags.push(MetadataTag { name, keys, values });
    }
    Ok(tags)
}

fn read_instance_info<R: Read>(
    r: &mut Reader<R>,
    file: &AbcFile,
    index: u32,
) -> Result<InstanceInfo, Error> {
    let name_index = r.read_u30()?;
    let name = resolve_multiname(&file.multinames, name_index)?;
    if !name.is_qname() {
        return Err(Error::AbcClassTraitNameNotQName);
    }
    if name.namespace_or_set_index() == 0 || name.name_index() == 0 {
        return Err(Error::AbcClassTraitNameNull);
    }

    let super_index = r.read_u30()?;
    let super_name = resolve_multiname(&file.multinames, super_index)?;

    let flag_bits = r.read_u8()?;
    if flag_bits & !ClassFlags::VALID_MASK != 0 {
        return Err(Error::AbcInvalidInstanceInfoFlags { index, flag_bits });
    }
    let flags = ClassFlags::from_bits_truncate(flag_bits);
    if flags.contains(ClassFlags::FINAL) && flags.contains(ClassFlags::INTERFACE) {
        return Err(Error::AbcInvalidInstanceInfoFlags { index, flag_bits });
    }

    let protected_ns = if flags.contains(ClassFlags::PROTECTED_NS) {
        let ns_index = r.read_u30()?;
        Some(
            file.namespaces
                .get(ns_index as usize)
                .cloned()
                .ok_or(Error::ConstPoolOutOfRange {
                    pool: PoolKind::Namespace,
                    index: ns_index,
                    pool_len: file.namespaces.len() as u32,
                })?,
        )
    } else {
        None
    };

    let interface_count = r.read_u30()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        let idx = r.read_u30()?;
        interfaces.push(resolve_multiname(&file.multinames, idx)?);
    }

    let init_index = r.read_u30()?;
    let traits = read_traits(r, file)?;

    Ok(InstanceInfo {
        name,
        super_name,
        flags,
        protected_ns,
        interfaces,
        init_index,
        traits,
    })
}

/// Decode one trait array, used identically for class instance traits,
/// class static traits, script traits, and method-body activation traits.
fn read_traits<R: Read>(r: &mut Reader<R>, file: &AbcFile) -> Result<Vec<TraitInfo>, Error> {
    let count = r.read_u30()?;
    let mut traits = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = r.read_u30()?;
        let name = resolve_multiname(&file.multinames, name_index)?;
        if !name.is_qname() {
            return Err(Error::AbcClassTraitNameNotQName);
        }
        if name.namespace_or_set_index() == 0 || name.name_index() == 0 {
            return Err(Error::AbcClassTraitNameNull);
        }

        let flag_byte = r.read_u8()?;
        let kind_bits = flag_byte & 0x0f;
        let attr_bits = flag_byte & 0xf0;
        if attr_bits & !TraitAttrs::VALID_MASK != 0 {
            return Err(Error::InvalidTraitKind { flags: flag_byte });
        }
        let kind = TraitKind::from_low_nibble(kind_bits)
            .ok_or(Error::InvalidTraitKind { flags: flag_byte })?;
        let attrs = TraitAttrs::from_bits_truncate(attr_bits);

        let (slot_or_disp_id, payload) = match kind {
            TraitKind::Slot | TraitKind::Const => {
                let slot_id = r.read_u30()?;
                let type_name_index = r.read_u30()?;
                let type_name = resolve_multiname(&file.multinames, type_name_index)?;
                let value_index = r.read_u30()?;
                let default_value = if value_index != 0 {
                    let value_kind = r.read_u8()?;
                    Some(file.resolve_constant(value_kind, value_index)?)
                } else {
                    None
                };
                (
                    slot_id,
                    TraitPayload::Field {
                        type_name,
                        default_value,
                    },
                )
            }
            TraitKind::Class => {
                let slot_id = r.read_u30()?;
                let class_index = r.read_u30()?;
                (slot_id, TraitPayload::Class { class_index })
            }
            TraitKind::Method | TraitKind::Getter | TraitKind::Setter | TraitKind::Function => {
                let disp_id = r.read_u30()?;
                let method_index = r.read_u30()?;
                (disp_id, TraitPayload::Method { method_index })
            }
        };

        let metadata = if attrs.contains(TraitAttrs::METADATA) {
            let metadata_count = r.read_u30()?;
            let mut indices = Vec::with_capacity(metadata_count as usize);
            for _ in 0..metadata_count {
                indices.push(r.read_u30()?);
            }
            indices
        } else {
            Vec::new()
        };

        traits.push(TraitInfo {
            name,
            kind,
            attrs,
            slot_or_disp_id,
            payload,
            metadata,
        });
    }
    Ok(traits)
}

fn read_scripts<R: Read>(r: &mut Reader<R>, file: &AbcFile) -> Result<Vec<ScriptInfo>, Error> {
    let count = r.read_u30()?;
    let mut scripts = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let init_index = r.read_u30()?;
        let traits = read_traits(r, file)?;
        scripts.push(ScriptInfo { init_index, traits });
    }
    Ok(scripts)
}

fn read_method_bodies<R: Read>(
    r: &mut Reader<R>,
    file: &AbcFile,
) -> Result<Vec<MethodBodyInfo>, Error> {
    let count = r.read_u30()?;
    let mut bodies = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let method_index = r.read_u30()?;
        let max_stack = r.read_u30()?;
        let local_count = r.read_u30()?;
        let init_scope_depth = r.read_u30()?;
        let max_scope_depth = r.read_u30()?;
        if init_scope_depth > max_scope_depth {
            return Err(Error::MethodBodyInvalidScopeDepths {
                init: init_scope_depth,
                max: max_scope_depth,
            });
        }

        let code_len = r.read_u30()?;
        let mut code = vec![0u8; code_len as usize];
        read_exact(r, &mut code)?;

        let exception_count = r.read_u30()?;
        let mut exceptions = Vec::with_capacity(exception_count as usize);
        for _ in 0..exception_count {
            let try_start = r.read_u30()?;
            let try_end = r.read_u30()?;
            let target = r.read_u30()?;
            let catch_type_index = r.read_u30()?;
            let catch_type = resolve_multiname(&file.multinames, catch_type_index)?;
            let catch_var_index = r.read_u30()?;
            let catch_var = resolve_multiname(&file.multinames, catch_var_index)?;
            exceptions.push(ExceptionInfo {
                try_start,
                try_end,
                target,
                catch_type,
                catch_var,
            });
        }

        let traits = read_traits(r, file)?;

        bodies.push(MethodBodyInfo {
            method_index,
            max_stack,
            local_count,
            init_scope_depth,
            max_scope_depth,
            code,
            exceptions,
            traits,
        });
    }
    Ok(bodies)
}

/// Read `buf.len()` raw bytes, one at a time through [`Reader::read_u8`] so
/// short reads surface the same [`Error::AbcCorrupt`] every other primitive
/// read does.
fn read_exact<R: Read>(r: &mut Reader<R>, buf: &mut [u8]) -> Result<(), Error> {
    for slot in buf.iter_mut() {
        *slot = r.read_u8()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::ParseOptions;
    use pretty_assertions::assert_eq;

    fn header_and_empty_pools() -> Vec<u8> {
        // major (46), minor (16), then a zero U30 count for each of the 7 pools.
        let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
        bytes.extend(std::iter::repeat(0x00).take(7));
        bytes
    }

    #[test]
    fn empty_pools_then_truncated_method_count_is_corrupt() {
        let bytes = header_and_empty_pools();
        let err = parse(bytes.as_slice(), ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::AbcCorrupt));
    }

    #[test]
    fn parses_int_pool() {
        let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
        bytes.push(0x03); // int count = 3
        bytes.push(0x01); // int[1] = 1
        bytes.extend([0xff, 0xff, 0xff, 0xff, 0x0f]); // int[2] = -1
        bytes.extend(std::iter::repeat(0x00).take(6)); // remaining empty pools
        bytes.push(0x00); // method_info count = 0
        bytes.push(0x00); // metadata count = 0
        bytes.push(0x00); // class count = 0
        bytes.push(0x00); // script count = 0
        bytes.push(0x00); // method body count = 0

        let file = parse(bytes.as_slice(), ParseOptions::default()).unwrap();
        assert_eq!(*file.int(0).unwrap(), 0);
        assert_eq!(*file.int(1).unwrap(), 1);
        assert_eq!(*file.int(2).unwrap(), -1);
    }

    #[test]
    fn method_flag_conflict_is_rejected() {
        let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
        bytes.extend(std::iter::repeat(0x00).take(7)); // empty pools
        bytes.push(0x01); // method_info count = 1
        bytes.push(0x00); // param_count = 0
        bytes.push(0x00); // return type multiname index = 0
        bytes.push(0x00); // name index = 0
        bytes.push(0x05); // NEED_ARGUMENTS | NEED_REST

        let err = parse(bytes.as_slice(), ParseOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MethodInfoInvalidFlags { flag_bits: 0x05, .. }));
    }

    #[test]
    fn instance_flag_conflict_is_rejected() {
        let mut bytes = vec![0x2e, 0x00, 0x10, 0x00];
        bytes.extend([0x00, 0x00, 0x00]); // int, uint, double pools empty
        bytes.extend([0x02, 0x01, 0x41]); // string pool: count=2, strings[1] = "A"
        bytes.extend([0x02, 0x08, 0x01]); // namespace pool: count=2, ordinary ns naming "A"
        bytes.push(0x01); // namespace_set pool: count=1 (sentinel only)
        bytes.extend([0x02, 0x07, 0x01, 0x01]); // multiname pool: count=2, QName(ns=1, name=1)
        bytes.push(0x00); // method_info count = 0
        bytes.push(0x00); // metadata count = 0
        bytes.push(0x01); // class count = 1
        bytes.push(0x01); // instance name multiname index = 1 (the QName above)
        bytes.push(0x00); // super name index = 0
        bytes.push(0x06); // ClassFinal | ClassInterface

        let err = parse(bytes.as_slice(), ParseOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::AbcInvalidInstanceInfoFlags { flag_bits: 0x06, .. }
        ));
    }
}
