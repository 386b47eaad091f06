//! Namespacing of collections inside the shared engine
//!
//! Every collection owns a disjoint slice of the engine's key space:
//!
//! ```text
//! data:  enc("d", kind, name) ++ enc(logical key)
//! meta:  enc("m", kind, name)
//! ```
//!
//! The prefix is itself an encoded key, so it is self-delimiting: no
//! collection's prefix is a prefix of another's, and two collections never
//! physically conflict. Data rows of all collections sort before all
//! metadata rows.

use std::fmt;
use std::ops::Bound;

use stratakv_core::{
    codec::{decode_key, encode_key, encode_key_into, KEY_SENTINEL},
    Key, KeyPart, Range, ScanRange, StrataError, StrataResult,
};

const DATA_SPACE: &str = "d";
const META_SPACE: &str = "m";

/// Kind of a named collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Single value per key
    Map,
    /// Many values per key
    MultiMap,
    /// Integer-indexed sequence
    Array,
}

impl CollectionKind {
    /// Stable tag used in the physical prefix
    pub fn tag(self) -> &'static str {
        match self {
            CollectionKind::Map => "map",
            CollectionKind::MultiMap => "multimap",
            CollectionKind::Array => "array",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Physical key layout of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Namespace {
    name: String,
    kind: CollectionKind,
    prefix: Vec<u8>,
    meta_key: Vec<u8>,
}

impl Namespace {
    pub(crate) fn new(kind: CollectionKind, name: &str) -> StrataResult<Self> {
        if name.is_empty() {
            return Err(StrataError::invalid_argument(format!(
                "{} name cannot be empty",
                kind
            )));
        }
        let prefix = encode_key(&Key::single(DATA_SPACE).push(kind.tag()).push(name));
        let meta_key = encode_key(&Key::single(META_SPACE).push(kind.tag()).push(name));
        Ok(Self {
            name: name.to_string(),
            kind,
            prefix,
            meta_key,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Key holding the collection's metadata (recorded key shape)
    pub(crate) fn meta_key(&self) -> &[u8] {
        &self.meta_key
    }

    /// Physical key of a logical key
    pub(crate) fn physical(&self, key: &Key) -> Vec<u8> {
        let mut out = self.prefix.clone();
        encode_key_into(key, &mut out);
        out
    }

    /// Physical key of one association of a multi-valued key
    pub(crate) fn physical_seq(&self, key: &Key, seq: i64) -> Vec<u8> {
        let mut out = self.physical(key);
        encode_key_into(&Key::single(seq), &mut out);
        out
    }

    /// Logical key of a physical key
    pub(crate) fn logical(&self, raw: &[u8]) -> StrataResult<Key> {
        let suffix = raw.strip_prefix(self.prefix.as_slice()).ok_or_else(|| {
            StrataError::corruption(format!(
                "row outside {} '{}' returned by scan",
                self.kind, self.name
            ))
        })?;
        decode_key(suffix)
    }

    /// Logical key and discriminator of a multi-valued physical key
    pub(crate) fn logical_seq(&self, raw: &[u8]) -> StrataResult<(Key, i64)> {
        let mut parts = self.logical(raw)?.into_parts();
        match parts.pop() {
            Some(KeyPart::Int(seq)) => Ok((Key::new(parts), seq)),
            _ => Err(StrataError::corruption(format!(
                "{} '{}' row without sequence discriminator",
                self.kind, self.name
            ))),
        }
    }

    /// Every data row of the collection
    pub(crate) fn scan_all(&self) -> ScanRange {
        ScanRange::prefix(&self.prefix)
    }

    /// Every physical row under one logical key (itself and extensions)
    pub(crate) fn scan_key(&self, key: &Key) -> ScanRange {
        let lower = self.physical(key);
        let mut upper = lower.clone();
        upper.push(KEY_SENTINEL);
        ScanRange::new(lower, upper)
    }

    /// Physical scan for a logical range
    ///
    /// A logical key K covers `[enc(K), enc(K) ++ SENTINEL)`. Ascending
    /// scans include `start`'s rows and stop before `end`'s; descending
    /// scans exclude `start`'s rows and include `end`'s.
    pub(crate) fn scan_range(
        &self,
        start: Option<&Key>,
        end: Option<&Key>,
        reverse: bool,
        limit: Option<usize>,
    ) -> ScanRange {
        let all = self.scan_all();
        let after = |k: &Key| {
            let mut raw = self.physical(k);
            raw.push(KEY_SENTINEL);
            raw
        };
        let lower = match start {
            Some(k) if reverse => Bound::Included(after(k)),
            Some(k) => Bound::Included(self.physical(k)),
            None => all.lower,
        };
        let upper = match end {
            Some(k) if reverse => Bound::Excluded(after(k)),
            Some(k) => Bound::Excluded(self.physical(k)),
            None => all.upper,
        };
        ScanRange {
            lower,
            upper,
            reverse,
            limit,
        }
    }

    /// Physical scan for a typed [`Range`], with an optional override of
    /// the row limit
    pub(crate) fn scan_for<K>(
        &self,
        range: &Range<K>,
        to_key: impl Fn(&K) -> Key,
        limit: Option<usize>,
    ) -> ScanRange {
        let start = range.start.as_ref().map(&to_key);
        let end = range.end.as_ref().map(&to_key);
        self.scan_range(start.as_ref(), end.as_ref(), range.reverse, limit)
    }
}
