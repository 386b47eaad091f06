//! Logical keys for stratakv collections
//!
//! A logical key is an ordered tuple of primitives. A bare primitive is a
//! 1-tuple. Keys compare component by component, and within a component:
//!
//! - byte strings before text before integers (cross-kind order is fixed so
//!   that dynamic keys still have a total order)
//! - text compares byte-wise
//! - integers compare numerically
//!
//! The derived `Ord` on [`Key`] is exactly the order of the encoded bytes
//! produced by [`crate::codec::encode_key`].
//!
//! Typed collection handles convert their key type to and from [`Key`]
//! through [`ToKey`] and [`FromKey`]. Implementations exist for `String`,
//! `i64`, `i32`, `u32`, `Vec<u8>`, tuples of two or three of those, and
//! [`Key`] itself for dynamically shaped keys.

use std::fmt;

use crate::error::{StrataError, StrataResult};

/// One component of a logical key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
    /// Raw byte string
    Bytes(Vec<u8>),
    /// UTF-8 text
    Text(String),
    /// Signed 64-bit integer
    Int(i64),
}

impl KeyPart {
    /// Kind of this component
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyPart::Bytes(_) => KeyKind::Bytes,
            KeyPart::Text(_) => KeyKind::Text,
            KeyPart::Int(_) => KeyKind::Int,
        }
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Text(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Text(s)
    }
}

impl From<i64> for KeyPart {
    fn from(v: i64) -> Self {
        KeyPart::Int(v)
    }
}

impl From<Vec<u8>> for KeyPart {
    fn from(b: Vec<u8>) -> Self {
        KeyPart::Bytes(b)
    }
}

/// Kind of a key component, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Byte string component
    Bytes,
    /// Text component
    Text,
    /// Integer component
    Int,
}

impl KeyKind {
    /// Single-byte code used when persisting a [`KeyShape`]
    pub fn code(self) -> u8 {
        match self {
            KeyKind::Bytes => b'b',
            KeyKind::Text => b't',
            KeyKind::Int => b'i',
        }
    }

    /// Inverse of [`KeyKind::code`]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'b' => Some(KeyKind::Bytes),
            b't' => Some(KeyKind::Text),
            b'i' => Some(KeyKind::Int),
            _ => None,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Bytes => write!(f, "Bytes"),
            KeyKind::Text => write!(f, "Text"),
            KeyKind::Int => write!(f, "Int"),
        }
    }
}

/// Component kinds of a key, in order
///
/// Maps and multi-maps record the shape of their first key and reject keys
/// of any other shape afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyShape(Vec<KeyKind>);

impl KeyShape {
    /// Shape from component kinds
    pub fn new(kinds: Vec<KeyKind>) -> Self {
        KeyShape(kinds)
    }

    /// Component kinds
    pub fn kinds(&self) -> &[KeyKind] {
        &self.0
    }

    /// Persisted form: one code byte per component
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().map(|k| k.code()).collect()
    }

    /// Parse the persisted form
    pub fn from_bytes(bytes: &[u8]) -> StrataResult<Self> {
        bytes
            .iter()
            .map(|b| {
                KeyKind::from_code(*b).ok_or_else(|| {
                    StrataError::corruption(format!("unknown key kind code 0x{:02X}", b))
                })
            })
            .collect::<StrataResult<Vec<_>>>()
            .map(KeyShape)
    }
}

impl fmt::Display for KeyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, kind) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", kind)?;
        }
        write!(f, ")")
    }
}

/// A logical key: ordered tuple of [`KeyPart`]s
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key(Vec<KeyPart>);

impl Key {
    /// Key from components
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Key(parts)
    }

    /// Single-component key
    pub fn single(part: impl Into<KeyPart>) -> Self {
        Key(vec![part.into()])
    }

    /// Append a component (builder style)
    pub fn push(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }

    /// Components of this key
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Consume into components
    pub fn into_parts(self) -> Vec<KeyPart> {
        self.0
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key has no components
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shape of this key
    pub fn shape(&self) -> KeyShape {
        KeyShape(self.0.iter().map(KeyPart::kind).collect())
    }
}

impl From<KeyPart> for Key {
    fn from(part: KeyPart) -> Self {
        Key(vec![part])
    }
}

/// Conversion of a typed key into a logical [`Key`]
pub trait ToKey {
    /// Build the logical key
    fn to_key(&self) -> Key;
}

/// Conversion of a logical [`Key`] back into a typed key
pub trait FromKey: Sized {
    /// Rebuild the typed key, rejecting keys of another shape
    fn from_key(key: Key) -> StrataResult<Self>;
}

/// A single key component usable inside tuple keys
pub trait KeyComponent: Sized {
    /// Convert into a key part
    fn to_part(&self) -> KeyPart;
    /// Convert back from a key part
    fn from_part(part: KeyPart) -> StrataResult<Self>;
}

fn component_mismatch(expected: KeyKind, got: &KeyPart) -> StrataError {
    StrataError::invalid_argument(format!(
        "expected {} key component, found {}",
        expected,
        got.kind()
    ))
}

impl KeyComponent for String {
    fn to_part(&self) -> KeyPart {
        KeyPart::Text(self.clone())
    }

    fn from_part(part: KeyPart) -> StrataResult<Self> {
        match part {
            KeyPart::Text(s) => Ok(s),
            other => Err(component_mismatch(KeyKind::Text, &other)),
        }
    }
}

impl KeyComponent for Vec<u8> {
    fn to_part(&self) -> KeyPart {
        KeyPart::Bytes(self.clone())
    }

    fn from_part(part: KeyPart) -> StrataResult<Self> {
        match part {
            KeyPart::Bytes(b) => Ok(b),
            other => Err(component_mismatch(KeyKind::Bytes, &other)),
        }
    }
}

impl KeyComponent for i64 {
    fn to_part(&self) -> KeyPart {
        KeyPart::Int(*self)
    }

    fn from_part(part: KeyPart) -> StrataResult<Self> {
        match part {
            KeyPart::Int(v) => Ok(v),
            other => Err(component_mismatch(KeyKind::Int, &other)),
        }
    }
}

macro_rules! narrow_int_component {
    ($($ty:ty),*) => {
        $(
            impl KeyComponent for $ty {
                fn to_part(&self) -> KeyPart {
                    KeyPart::Int(i64::from(*self))
                }

                fn from_part(part: KeyPart) -> StrataResult<Self> {
                    let wide = i64::from_part(part)?;
                    <$ty>::try_from(wide).map_err(|_| {
                        StrataError::invalid_argument(format!(
                            "integer key component {} out of range for {}",
                            wide,
                            stringify!($ty)
                        ))
                    })
                }
            }
        )*
    };
}

narrow_int_component!(i32, u32);

macro_rules! single_component_key {
    ($($ty:ty),*) => {
        $(
            impl ToKey for $ty {
                fn to_key(&self) -> Key {
                    Key(vec![self.to_part()])
                }
            }

            impl FromKey for $ty {
                fn from_key(key: Key) -> StrataResult<Self> {
                    let mut parts = key.into_parts();
                    if parts.len() != 1 {
                        return Err(StrataError::invalid_argument(format!(
                            "expected 1 key component, found {}",
                            parts.len()
                        )));
                    }
                    <$ty as KeyComponent>::from_part(parts.remove(0))
                }
            }
        )*
    };
}

single_component_key!(String, Vec<u8>, i64, i32, u32);

impl ToKey for str {
    fn to_key(&self) -> Key {
        Key(vec![KeyPart::Text(self.to_string())])
    }
}

impl ToKey for [u8] {
    fn to_key(&self) -> Key {
        Key(vec![KeyPart::Bytes(self.to_vec())])
    }
}

impl ToKey for Key {
    fn to_key(&self) -> Key {
        self.clone()
    }
}

impl FromKey for Key {
    fn from_key(key: Key) -> StrataResult<Self> {
        Ok(key)
    }
}

fn take_parts<const N: usize>(key: Key) -> StrataResult<[KeyPart; N]> {
    let parts = key.into_parts();
    let found = parts.len();
    parts.try_into().map_err(|_| {
        StrataError::invalid_argument(format!(
            "expected {} key components, found {}",
            N, found
        ))
    })
}

impl<A: KeyComponent, B: KeyComponent> ToKey for (A, B) {
    fn to_key(&self) -> Key {
        Key(vec![self.0.to_part(), self.1.to_part()])
    }
}

impl<A: KeyComponent, B: KeyComponent> FromKey for (A, B) {
    fn from_key(key: Key) -> StrataResult<Self> {
        let [a, b] = take_parts::<2>(key)?;
        Ok((A::from_part(a)?, B::from_part(b)?))
    }
}

impl<A: KeyComponent, B: KeyComponent, C: KeyComponent> ToKey for (A, B, C) {
    fn to_key(&self) -> Key {
        Key(vec![self.0.to_part(), self.1.to_part(), self.2.to_part()])
    }
}

impl<A: KeyComponent, B: KeyComponent, C: KeyComponent> FromKey for (A, B, C) {
    fn from_key(key: Key) -> StrataResult<Self> {
        let [a, b, c] = take_parts::<3>(key)?;
        Ok((A::from_part(a)?, B::from_part(b)?, C::from_part(c)?))
    }
}

/// Key type usable by a collection handle
pub trait CollectionKey: ToKey + FromKey {}

impl<T: ToKey + FromKey> CollectionKey for T {}
