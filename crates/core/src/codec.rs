//! Order-preserving key codec
//!
//! Encodes a logical [`Key`] into bytes whose lexicographic order is the
//! logical order of the keys. Every component is self-delimiting, so the
//! encoding of a tuple is the concatenation of its component encodings and
//! tuples compare component-major.
//!
//! # Component Layout
//!
//! | Tag  | Kind  | Payload                                                  |
//! |------|-------|----------------------------------------------------------|
//! | 0x01 | Bytes | bytes with `0x00` escaped as `0x00 0xFF`, then `0x00`     |
//! | 0x02 | Text  | UTF-8 bytes, escaped and terminated like Bytes            |
//! | 0x15 | Int   | 8 bytes big-endian, sign bit flipped                      |
//!
//! Flipping the sign bit maps `i64::MIN..=i64::MAX` onto `0..=u64::MAX`
//! monotonically, so fixed-width integers sort numerically. Variable-width
//! components use a terminator rather than a length prefix: a length prefix
//! would sort `"b"` before `"aa"`.
//!
//! No tag equals [`KEY_SENTINEL`], so `encode(k) ++ [KEY_SENTINEL]` is an
//! exclusive upper bound for every key that extends `k` with more
//! components.

use crate::error::{StrataError, StrataResult};
use crate::key::{Key, KeyPart};

/// Byte string type tag
const BYTES_TAG: u8 = 0x01;

/// Text type tag
const TEXT_TAG: u8 = 0x02;

/// Integer type tag
const INT_TAG: u8 = 0x15;

/// Terminator for variable-width components
const TERMINATOR: u8 = 0x00;

/// Follows an embedded `0x00` inside a variable-width component
const ESCAPE: u8 = 0xFF;

/// Byte greater than every component tag
pub const KEY_SENTINEL: u8 = 0xFF;

const SIGN_FLIP: u64 = 1 << 63;

/// Encode a key into order-preserving bytes
pub fn encode_key(key: &Key) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len_hint(key));
    encode_key_into(key, &mut out);
    out
}

/// Encode a key, appending to `out`
pub fn encode_key_into(key: &Key, out: &mut Vec<u8>) {
    for part in key.parts() {
        encode_part(part, out);
    }
}

fn encoded_len_hint(key: &Key) -> usize {
    key.parts()
        .iter()
        .map(|p| match p {
            KeyPart::Bytes(b) => b.len() + 2,
            KeyPart::Text(s) => s.len() + 2,
            KeyPart::Int(_) => 9,
        })
        .sum()
}

fn encode_part(part: &KeyPart, out: &mut Vec<u8>) {
    match part {
        KeyPart::Bytes(b) => {
            out.push(BYTES_TAG);
            encode_escaped(b, out);
        }
        KeyPart::Text(s) => {
            out.push(TEXT_TAG);
            encode_escaped(s.as_bytes(), out);
        }
        KeyPart::Int(v) => {
            out.push(INT_TAG);
            out.extend_from_slice(&((*v as u64) ^ SIGN_FLIP).to_be_bytes());
        }
    }
}

fn encode_escaped(bytes: &[u8], out: &mut Vec<u8>) {
    for &b in bytes {
        out.push(b);
        if b == TERMINATOR {
            out.push(ESCAPE);
        }
    }
    out.push(TERMINATOR);
}

/// Decode bytes produced by [`encode_key`]
///
/// # Errors
///
/// Returns `Corruption` if the bytes are not a complete encoding.
pub fn decode_key(bytes: &[u8]) -> StrataResult<Key> {
    let mut parts = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (part, next) = decode_part(bytes, pos)?;
        parts.push(part);
        pos = next;
    }
    Ok(Key::new(parts))
}

fn decode_part(bytes: &[u8], pos: usize) -> StrataResult<(KeyPart, usize)> {
    let tag = bytes[pos];
    match tag {
        BYTES_TAG => {
            let (raw, next) = decode_escaped(bytes, pos + 1)?;
            Ok((KeyPart::Bytes(raw), next))
        }
        TEXT_TAG => {
            let (raw, next) = decode_escaped(bytes, pos + 1)?;
            let text = String::from_utf8(raw).map_err(|e| {
                StrataError::corruption(format!("invalid UTF-8 in key at offset {}: {}", pos, e))
            })?;
            Ok((KeyPart::Text(text), next))
        }
        INT_TAG => {
            let end = pos + 9;
            let raw: [u8; 8] = bytes
                .get(pos + 1..end)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(|| {
                    StrataError::corruption(format!("truncated integer key at offset {}", pos))
                })?;
            let v = (u64::from_be_bytes(raw) ^ SIGN_FLIP) as i64;
            Ok((KeyPart::Int(v), end))
        }
        other => Err(StrataError::corruption(format!(
            "unknown key tag 0x{:02X} at offset {}",
            other, pos
        ))),
    }
}

fn decode_escaped(bytes: &[u8], start: usize) -> StrataResult<(Vec<u8>, usize)> {
    let mut out = Vec::new();
    let mut pos = start;
    loop {
        match bytes.get(pos) {
            None => {
                return Err(StrataError::corruption(format!(
                    "missing terminator for key component starting at offset {}",
                    start
                )))
            }
            Some(&TERMINATOR) => {
                if bytes.get(pos + 1) == Some(&ESCAPE) {
                    out.push(TERMINATOR);
                    pos += 2;
                } else {
                    return Ok((out, pos + 1));
                }
            }
            Some(&b) => {
                out.push(b);
                pos += 1;
            }
        }
    }
}

/// Smallest byte string greater than every string starting with `prefix`
///
/// Returns `None` when no such bound exists (empty or all-`0xFF` prefix).
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut out = prefix.to_vec();
    while let Some(last) = out.pop() {
        if last < 0xFF {
            out.push(last + 1);
            return Some(out);
        }
    }
    None
}
