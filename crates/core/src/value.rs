//! Value encoding for collection entries
//!
//! Values are opaque bytes to the engines. Collection handles are typed,
//! so the value type converts through [`ToValue`] and [`FromValue`].
//! Callers own serialization: implement the traits for domain types, or
//! wrap any serde type in [`Msgpack`].
//!
//! Built-in encodings:
//! - `Vec<u8>` / `[u8]`: verbatim
//! - `String` / `str`: UTF-8 bytes
//! - `i64` / `u64`: 8 bytes big-endian

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StrataError, StrataResult};

/// Conversion of a value into stored bytes
pub trait ToValue {
    /// Serialize the value
    fn to_value(&self) -> StrataResult<Vec<u8>>;
}

/// Conversion of stored bytes back into a value
pub trait FromValue: Sized {
    /// Deserialize the value
    fn from_value(bytes: Vec<u8>) -> StrataResult<Self>;
}

/// Value type usable by a collection handle
pub trait CollectionValue: ToValue + FromValue {}

impl<T: ToValue + FromValue> CollectionValue for T {}

impl ToValue for [u8] {
    fn to_value(&self) -> StrataResult<Vec<u8>> {
        Ok(self.to_vec())
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> StrataResult<Vec<u8>> {
        Ok(self.clone())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(bytes: Vec<u8>) -> StrataResult<Self> {
        Ok(bytes)
    }
}

impl ToValue for str {
    fn to_value(&self) -> StrataResult<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }
}

impl ToValue for String {
    fn to_value(&self) -> StrataResult<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }
}

impl FromValue for String {
    fn from_value(bytes: Vec<u8>) -> StrataResult<Self> {
        String::from_utf8(bytes)
            .map_err(|e| StrataError::serialization(format!("value is not UTF-8: {}", e)))
    }
}

macro_rules! fixed_width_value {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> StrataResult<Vec<u8>> {
                    Ok(self.to_be_bytes().to_vec())
                }
            }

            impl FromValue for $ty {
                fn from_value(bytes: Vec<u8>) -> StrataResult<Self> {
                    let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                        StrataError::serialization(format!(
                            "expected 8 bytes for {}, found {}",
                            stringify!($ty),
                            bytes.len()
                        ))
                    })?;
                    Ok(<$ty>::from_be_bytes(raw))
                }
            }
        )*
    };
}

fixed_width_value!(i64, u64);

/// Wrapper storing any serde type as MessagePack
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use stratakv_core::value::{FromValue, Msgpack, ToValue};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Point { x: i32, y: i32 }
///
/// let bytes = Msgpack(Point { x: 1, y: 2 }).to_value().unwrap();
/// let Msgpack(back) = Msgpack::<Point>::from_value(bytes).unwrap();
/// assert_eq!(back, Point { x: 1, y: 2 });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Msgpack<T>(pub T);

impl<T> Msgpack<T> {
    /// Unwrap the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Serialize> ToValue for Msgpack<T> {
    fn to_value(&self) -> StrataResult<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(&self.0)?)
    }
}

impl<T: DeserializeOwned> FromValue for Msgpack<T> {
    fn from_value(bytes: Vec<u8>) -> StrataResult<Self> {
        Ok(Msgpack(rmp_serde::from_slice(&bytes)?))
    }
}
