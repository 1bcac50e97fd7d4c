//! Namespaces, namespace sets, and multinames: the name-resolution triple
//! AVM2 property lookup is built on, plus the disassembly helper that
//! renders a multiname back to source-like text.

use crate::error::Error;
use crate::read::Reader;
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// Namespace kind tags, as they appear in the ABC constant pool.
const CONSTANT_NAMESPACE: u8 = 0x08;
const CONSTANT_PACKAGE_NAMESPACE: u8 = 0x16;
const CONSTANT_PACKAGE_INTERNAL_NS: u8 = 0x17;
const CONSTANT_PROTECTED_NAMESPACE: u8 = 0x18;
const CONSTANT_EXPLICIT_NAMESPACE: u8 = 0x19;
const CONSTANT_STATIC_PROTECTED_NS: u8 = 0x1a;
const CONSTANT_PRIVATE_NS: u8 = 0x05;

// Multiname kind tags.
const CONSTANT_QNAME: u8 = 0x07;
const CONSTANT_QNAME_A: u8 = 0x0d;
const CONSTANT_RTQNAME: u8 = 0x0f;
const CONSTANT_RTQNAME_A: u8 = 0x10;
const CONSTANT_RTQNAME_L: u8 = 0x11;
const CONSTANT_RTQNAME_LA: u8 = 0x12;
const CONSTANT_MULTINAME: u8 = 0x09;
const CONSTANT_MULTINAME_A: u8 = 0x0e;
const CONSTANT_MULTINAME_L: u8 = 0x1b;
const CONSTANT_MULTINAME_LA: u8 = 0x1c;
const CONSTANT_GENERIC_CLASS_NAME: u8 = 0x1d;

static NEXT_PRIVATE_NS_ID: AtomicU64 = AtomicU64::new(1);

/// A private namespace is freshly allocated on every occurrence in the
/// source format, never interned, so two private namespaces with identical
/// (discarded) names are still distinct. This id is purely an identity
/// token; it carries no information about the debug-emitted name the source
/// format attaches to private namespaces (see the crate's design notes on
/// why that name is intentionally discarded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrivateNamespaceId(u64);

fn fresh_private_id() -> PrivateNamespaceId {
    PrivateNamespaceId(NEXT_PRIVATE_NS_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Namespace {
    /// The null/any namespace sentinel. This is the constant pool's slot 0,
    /// distinct from any namespace a file can actually declare (in
    /// particular, distinct from the public namespace, `Ordinary("")`).
    Any,
    Ordinary(Arc<str>),
    Package(Arc<str>),
    PackageInternal(Arc<str>),
    Protected(Arc<str>),
    StaticProtected(Arc<str>),
    Explicit(Arc<str>),
    Private(PrivateNamespaceId),
}

impl Namespace {
    /// The "public" namespace is an ordinary namespace with an empty name;
    /// `NamespaceSet` hoists it to index 0 when present.
    pub fn is_public(&self) -> bool {
        matches!(self, Namespace::Ordinary(name) if name.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Namespace::Ordinary(n)
            | Namespace::Package(n)
            | Namespace::PackageInternal(n)
            | Namespace::Protected(n)
            | Namespace::StaticProtected(n)
            | Namespace::Explicit(n) => Some(n),
            Namespace::Any | Namespace::Private(_) => None,
        }
    }

    /// Decode one namespace entry: a 1-byte kind tag and a U30 name index,
    /// resolved against `strings`. Private namespaces ignore the name index
    /// entirely (even though one is always present on the wire) and are
    /// never interned/deduplicated.
    pub fn decode<R: Read>(reader: &mut Reader<R>, strings: &[Arc<str>]) -> Result<Namespace, Error> {
        let kind = reader.read_u8()?;
        let name_index = reader.read_u30()?;
        if kind == CONSTANT_PRIVATE_NS {
            return Ok(Namespace::Private(fresh_private_id()));
        }
        let name = resolve_string(strings, name_index)?;
        match kind {
            CONSTANT_NAMESPACE => Ok(Namespace::Ordinary(name)),
            CONSTANT_PACKAGE_NAMESPACE => Ok(Namespace::Package(name)),
            CONSTANT_PACKAGE_INTERNAL_NS => Ok(Namespace::PackageInternal(name)),
            CONSTANT_PROTECTED_NAMESPACE => Ok(Namespace::Protected(name)),
            CONSTANT_STATIC_PROTECTED_NS => Ok(Namespace::StaticProtected(name)),
            CONSTANT_EXPLICIT_NAMESPACE => Ok(Namespace::Explicit(name)),
            _ => Err(Error::IllegalNamespaceValue { kind }),
        }
    }
}

fn resolve_string(strings: &[Arc<str>], index: u32) -> Result<Arc<str>, Error> {
    strings
        .get(index as usize)
        .cloned()
        .ok_or(Error::ConstPoolOutOfRange {
            pool: crate::error::PoolKind::String,
            index,
            pool_len: strings.len() as u32,
        })
}

/// An ordered collection of namespaces searched during property lookup. If
/// any member is the public namespace, it is moved to index 0 so lookups can
/// check it first without a scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespaceSet(Vec<Namespace>);

impl NamespaceSet {
    pub fn new(mut namespaces: Vec<Namespace>) -> Self {
        if let Some(pos) = namespaces.iter().position(Namespace::is_public) {
            if pos != 0 {
                namespaces.swap(0, pos);
            }
        }
        NamespaceSet(namespaces)
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.0
    }

    pub fn decode<R: Read>(
        reader: &mut Reader<R>,
        namespaces: &[Namespace],
    ) -> Result<NamespaceSet, Error> {
        let count = reader.read_u30()?;
        let mut members = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let index = reader.read_u30()?;
            let ns = namespaces
                .get(index as usize)
                .cloned()
                .ok_or(Error::ConstPoolOutOfRange {
                    pool: crate::error::PoolKind::Namespace,
                    index,
                    pool_len: namespaces.len() as u32,
                })?;
            members.push(ns);
        }
        Ok(NamespaceSet::new(members))
    }
}

/// Which of the ten recognized multiname kinds (plus `GenericClassName`)
/// this multiname is, and how its two index fields should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultinameKind {
    QName,
    QNameAttr,
    Multiname,
    MultinameAttr,
    RtQName,
    RtQNameAttr,
    MultinameL,
    MultinameLAttr,
    RtQNameL,
    RtQNameLAttr,
    GenericClassName,
}

/// Precomputed per-kind classification bits, indexed in the same order as
/// [`MultinameKind`]'s variants. Avoids re-deriving "does this kind have a
/// runtime namespace" from a match on every call.
struct KindFamily {
    runtime_namespace: bool,
    runtime_local_name: bool,
    uses_namespace_set: bool,
    is_attribute: bool,
}

const FAMILIES: [KindFamily; 11] = [
    // QName
    KindFamily {
        runtime_namespace: false,
        runtime_local_name: false,
        uses_namespace_set: false,
        is_attribute: false,
    },
    // QNameAttr
    KindFamily {
        runtime_namespace: false,
        runtime_local_name: false,
        uses_namespace_set: false,
        is_attribute: true,
    },
    // Multiname
    KindFamily {
        runtime_namespace: false,
        runtime_local_name: false,
        uses_namespace_set: true,
        is_attribute: false,
    },
    // MultinameAttr
    KindFamily {
        runtime_namespace: false,
        runtime_local_name: false,
        uses_namespace_set: true,
        is_attribute: true,
    },
    // RtQName
    KindFamily {
        runtime_namespace: true,
        runtime_local_name: false,
        uses_namespace_set: false,
        is_attribute: false,
    },
    // RtQNameAttr
    KindFamily {
        runtime_namespace: true,
        runtime_local_name: false,
        uses_namespace_set: false,
        is_attribute: true,
    },
    // MultinameL
    KindFamily {
        runtime_namespace: false,
        runtime_local_name: true,
        uses_namespace_set: true,
        is_attribute: false,
    },
    // MultinameLAttr
    KindFamily {
        runtime_namespace: false,
        runtime_local_name: true,
        uses_namespace_set: true,
        is_attribute: true,
    },
    // RtQNameL
    KindFamily {
        runtime_namespace: true,
        runtime_local_name: true,
        uses_namespace_set: false,
        is_attribute: false,
    },
    // RtQNameLAttr
    KindFamily {
        runtime_namespace: true,
        runtime_local_name: true,
        uses_namespace_set: false,
        is_attribute: true,
    },
    // GenericClassName
    KindFamily {
        runtime_namespace: false,
        runtime_local_name: false,
        uses_namespace_set: false,
        is_attribute: false,
    },
];

impl MultinameKind {
    fn family(self) -> &'static KindFamily {
        &FAMILIES[self as usize]
    }

    fn from_tag(tag: u8) -> Option<MultinameKind> {
        match tag {
            CONSTANT_QNAME => Some(MultinameKind::QName),
            CONSTANT_QNAME_A => Some(MultinameKind::QNameAttr),
            CONSTANT_MULTINAME => Some(MultinameKind::Multiname),
            CONSTANT_MULTINAME_A => Some(MultinameKind::MultinameAttr),
            CONSTANT_RTQNAME => Some(MultinameKind::RtQName),
            CONSTANT_RTQNAME_A => Some(MultinameKind::RtQNameAttr),
            CONSTANT_MULTINAME_L => Some(MultinameKind::MultinameL),
            CONSTANT_MULTINAME_LA => Some(MultinameKind::MultinameLAttr),
            CONSTANT_RTQNAME_L => Some(MultinameKind::RtQNameL),
            CONSTANT_RTQNAME_LA => Some(MultinameKind::RtQNameLAttr),
            CONSTANT_GENERIC_CLASS_NAME => Some(MultinameKind::GenericClassName),
            _ => None,
        }
    }
}

/// A multiname: `(kind, index1, index2)`. Which pool `index1`/`index2` point
/// into, and whether either is meaningless because the corresponding piece
/// is supplied at runtime, is determined entirely by `kind`.
///
/// Index fields use `0` to mean "provided at runtime" / "not applicable",
/// consistent with slot 0 of every sentinel-prefixed pool being reserved as
/// the null/any slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Multiname {
    kind: Option<MultinameKind>,
    index1: u32,
    index2: u32,
}

impl Multiname {
    /// The all-zero, kind-less multiname: distinguishable from the valid
    /// `QName(0, 0)` sentinel that occupies slot 0 of every multiname pool.
    pub fn invalid() -> Multiname {
        Multiname {
            kind: None,
            index1: 0,
            index2: 0,
        }
    }

    pub fn qname(namespace_index: u32, name_index: u32) -> Multiname {
        Multiname {
            kind: Some(MultinameKind::QName),
            index1: namespace_index,
            index2: name_index,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.kind.is_some()
    }

    pub fn kind(&self) -> Option<MultinameKind> {
        self.kind
    }

    pub fn is_qname(&self) -> bool {
        matches!(self.kind, Some(MultinameKind::QName) | Some(MultinameKind::QNameAttr))
    }

    pub fn is_attribute(&self) -> bool {
        self.kind.map(|k| k.family().is_attribute).unwrap_or(false)
    }

    pub fn has_runtime_namespace(&self) -> bool {
        self.kind
            .map(|k| k.family().runtime_namespace)
            .unwrap_or(false)
    }

    pub fn has_runtime_local_name(&self) -> bool {
        self.kind
            .map(|k| k.family().runtime_local_name)
            .unwrap_or(false)
    }

    pub fn uses_namespace_set(&self) -> bool {
        self.kind
            .map(|k| k.family().uses_namespace_set)
            .unwrap_or(false)
    }

    /// Namespace pool index (QName families) or namespace-set pool index
    /// (Multiname families). Meaningless when `has_runtime_namespace()` is
    /// true or `uses_namespace_set()` is false and this isn't a QName.
    pub fn namespace_or_set_index(&self) -> u32 {
        self.index1
    }

    /// String pool index of the local name. Meaningless when
    /// `has_runtime_local_name()` is true.
    pub fn name_index(&self) -> u32 {
        self.index2
    }

    /// For `GenericClassName`: multiname pool index of the generic
    /// definition.
    pub fn generic_definition_index(&self) -> u32 {
        self.index1
    }

    /// For `GenericClassName`: index into the generic-argument-list pool.
    pub fn generic_arg_list_index(&self) -> u32 {
        self.index2
    }

    /// The number of runtime-supplied "slots" (namespace and/or local name)
    /// this multiname leaves to be filled in by the caller at the
    /// instruction site: 0 for QName/Multiname, 1 for RTQName or
    /// MultinameL, 2 for RTQNameL. An invalid multiname has no defined
    /// runtime-argument count.
    pub fn runtime_arg_count(&self) -> Option<u32> {
        let family = self.kind?.family();
        Some(family.runtime_namespace as u32 + family.runtime_local_name as u32)
    }

    /// Decode one multiname pool entry. `definition_arg_lists` accumulates
    /// the raw (not yet resolved) index lists for any `GenericClassName`
    /// entries encountered, in pool order; the parser driver resolves them
    /// into real multiname lists in a second micro-pass once the whole
    /// multiname pool has been read; see [`crate::parser`].
    pub fn decode<R: Read>(
        reader: &mut Reader<R>,
        raw_generic_arg_lists: &mut Vec<Vec<u32>>,
    ) -> Result<Multiname, Error> {
        let tag = reader.read_u8()?;
        let kind = MultinameKind::from_tag(tag).ok_or(Error::AbcIllegalMultinameKind { kind: tag })?;
        match kind {
            MultinameKind::QName | MultinameKind::QNameAttr => {
                let ns = reader.read_u30()?;
                let name = reader.read_u30()?;
                Ok(Multiname {
                    kind: Some(kind),
                    index1: ns,
                    index2: name,
                })
            }
            MultinameKind::Multiname | MultinameKind::MultinameAttr => {
                let ns_set = reader.read_u30()?;
                if ns_set == 0 {
                    return Err(Error::AbcIllegalMultinamePoolIndex { index: ns_set });
                }
                let name = reader.read_u30()?;
                Ok(Multiname {
                    kind: Some(kind),
                    index1: ns_set,
                    index2: name,
                })
            }
            MultinameKind::RtQName | MultinameKind::RtQNameAttr => {
                let name = reader.read_u30()?;
                Ok(Multiname {
                    kind: Some(kind),
                    index1: 0,
                    index2: name,
                })
            }
            MultinameKind::MultinameL | MultinameKind::MultinameLAttr => {
                let ns_set = reader.read_u30()?;
                if ns_set == 0 {
                    return Err(Error::AbcIllegalMultinamePoolIndex { index: ns_set });
                }
                Ok(Multiname {
                    kind: Some(kind),
                    index1: ns_set,
                    index2: 0,
                })
            }
            MultinameKind::RtQNameL | MultinameKind::RtQNameLAttr => Ok(Multiname {
                kind: Some(kind),
                index1: 0,
                index2: 0,
            }),
            MultinameKind::GenericClassName => {
                let definition = reader.read_u30()?;
                if definition == 0 {
                    return Err(Error::AbcIllegalMultinamePoolIndex { index: definition });
                }
                let arg_count = reader.read_u30()?;
                let mut args = Vec::with_capacity(arg_count as usize);
                for _ in 0..arg_count {
                    let idx = reader.read_u30()?;
                    if idx == 0 {
                        return Err(Error::AbcIllegalMultinamePoolIndex { index: idx });
                    }
                    args.push(idx);
                }
                let list_index = raw_generic_arg_lists.len() as u32;
                raw_generic_arg_lists.push(args);
                Ok(Multiname {
                    kind: Some(kind),
                    index1: definition,
                    index2: list_index,
                })
            }
        }
    }
}

/// The data a multiname's rendering needs from its owning file's pools,
/// resolved ahead of time so this module stays free of a dependency on
/// `AbcFile` itself.
pub struct RenderContext<'a> {
    pub strings: &'a [Arc<str>],
    pub namespaces: &'a [Namespace],
    pub namespace_sets: &'a [NamespaceSet],
    pub multinames: &'a [Multiname],
    pub generic_arg_lists: &'a [Vec<Multiname>],
}

fn render_namespace(ns: &Namespace) -> String {
    match ns {
        Namespace::Any => "*".to_string(),
        Namespace::Private(_) => "private".to_string(),
        Namespace::Ordinary(name)
        | Namespace::Package(name)
        | Namespace::PackageInternal(name)
        | Namespace::Protected(name)
        | Namespace::StaticProtected(name)
        | Namespace::Explicit(name) => name.to_string(),
    }
}

fn render_namespace_set(set: &NamespaceSet) -> String {
    set.namespaces()
        .iter()
        .map(render_namespace)
        .collect::<Vec<_>>()
        .join(",")
}

/// Render a multiname to its textual form, e.g. `flash.display::Sprite` or
/// `@{RTns}::{RTname}`. See the crate's design notes for the exact rendering
/// rules this follows.
pub fn render(ctx: &RenderContext, m: &Multiname) -> Result<String, Error> {
    let Some(kind) = m.kind else {
        return Ok("<invalid>".to_string());
    };

    if kind == MultinameKind::GenericClassName {
        let def = ctx
            .multinames
            .get(m.generic_definition_index() as usize)
            .ok_or(Error::ConstPoolOutOfRange {
                pool: crate::error::PoolKind::Multiname,
                index: m.generic_definition_index(),
                pool_len: ctx.multinames.len() as u32,
            })?;
        let base = render(ctx, def)?;
        let args = ctx
            .generic_arg_lists
            .get(m.generic_arg_list_index() as usize)
            .ok_or(Error::ConstPoolOutOfRange {
                pool: crate::error::PoolKind::GenericArgList,
                index: m.generic_arg_list_index(),
                pool_len: ctx.generic_arg_lists.len() as u32,
            })?;
        let rendered_args = args
            .iter()
            .map(|a| render(ctx, a))
            .collect::<Result<Vec<_>, _>>()?
            .join(",");
        return Ok(format!("{base}<{rendered_args}>"));
    }

    let namespace_part = if m.has_runtime_namespace() {
        "{RTns}".to_string()
    } else if m.uses_namespace_set() {
        let set = ctx
            .namespace_sets
            .get(m.namespace_or_set_index() as usize)
            .ok_or(Error::ConstPoolOutOfRange {
                pool: crate::error::PoolKind::NamespaceSet,
                index: m.namespace_or_set_index(),
                pool_len: ctx.namespace_sets.len() as u32,
            })?;
        render_namespace_set(set)
    } else {
        let ns = ctx
            .namespaces
            .get(m.namespace_or_set_index() as usize)
            .ok_or(Error::ConstPoolOutOfRange {
                pool: crate::error::PoolKind::Namespace,
                index: m.namespace_or_set_index(),
                pool_len: ctx.namespaces.len() as u32,
            })?;
        render_namespace(ns)
    };

    let local_part = if m.has_runtime_local_name() {
        Some("{RTname}".to_string())
    } else {
        let s = ctx
            .strings
            .get(m.name_index() as usize)
            .ok_or(Error::ConstPoolOutOfRange {
                pool: crate::error::PoolKind::String,
                index: m.name_index(),
                pool_len: ctx.strings.len() as u32,
            })?;
        if s.is_empty() && m.name_index() == 0 {
            None
        } else {
            Some(s.to_string())
        }
    };

    let local_part = match local_part {
        Some(s) => s,
        None => "*".to_string(),
    };
    let local_part = if m.is_attribute() {
        format!("@{local_part}")
    } else {
        local_part
    };

    if namespace_part.is_empty() && local_part == "*" {
        return Ok("*".to_string());
    }
    if namespace_part.is_empty() {
        Ok(local_part)
    } else {
        Ok(format!("{namespace_part}::{local_part}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qname_family_has_no_runtime_parts() {
        let m = Multiname::qname(1, 1);
        assert!(!m.has_runtime_namespace());
        assert!(!m.has_runtime_local_name());
        assert_eq!(m.runtime_arg_count(), Some(0));
    }

    #[test]
    fn invalid_multiname_is_invalid() {
        let m = Multiname::invalid();
        assert!(!m.is_valid());
        assert_eq!(m.runtime_arg_count(), None);
    }

    #[test]
    fn namespace_set_hoists_public_namespace() {
        let set = NamespaceSet::new(vec![
            Namespace::Ordinary(Arc::from("some.pkg")),
            Namespace::Ordinary(Arc::from("")),
        ]);
        assert!(set.namespaces()[0].is_public());
    }

    #[test]
    fn decodes_qname_from_bytes() {
        let mut lists = vec![];
        let bytes = [CONSTANT_QNAME, 0x01, 0x02];
        let mut r = Reader::new(&bytes[..], crate::read::ParseOptions::default());
        let m = Multiname::decode(&mut r, &mut lists).unwrap();
        assert_eq!(m.namespace_or_set_index(), 1);
        assert_eq!(m.name_index(), 2);
    }

    #[test]
    fn multiname_with_null_namespace_set_is_illegal() {
        let bytes = [CONSTANT_MULTINAME, 0x00, 0x01];
        let mut r = Reader::new(&bytes[..], crate::read::ParseOptions::default());
        let mut lists = vec![];
        let err = Multiname::decode(&mut r, &mut lists).unwrap_err();
        assert!(matches!(err, Error::AbcIllegalMultinamePoolIndex { index: 0 }));
    }

    #[test]
    fn rtqnamel_has_two_runtime_parts() {
        let bytes = [CONSTANT_RTQNAME_L];
        let mut r = Reader::new(&bytes[..], crate::read::ParseOptions::default());
        let mut lists = vec![];
        let m = Multiname::decode(&mut r, &mut lists).unwrap();
        assert_eq!(m.runtime_arg_count(), Some(2));
    }
}
