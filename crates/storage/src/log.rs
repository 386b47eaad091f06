//! Operation log file format
//!
//! The durable engine persists every mutation as a record appended to a
//! single log file (`data.log`) and rebuilds its index by replaying the log
//! on open.
//!
//! # File Layout
//!
//! ```text
//! ┌────────────────────────────────────┐
//! │ Header (16 bytes)                  │
//! ├────────────────────────────────────┤
//! │ Record 1                           │
//! ├────────────────────────────────────┤
//! │ ...                                │
//! └────────────────────────────────────┘
//! ```
//!
//! # Record Layout
//!
//! ```text
//! ┌─────────────────┬──────────────┬─────────────────────────┐
//! │ Length (4 bytes)│ CRC32 (4)    │ Payload (Length bytes)  │
//! └─────────────────┴──────────────┴─────────────────────────┘
//!
//! Payload:
//! ┌────────┬──────────────┬───────┬────────────────┬───────────┐
//! │ Op (1) │ KeyLen (4)   │ Key   │ ValueLen (4)   │ Value     │
//! └────────┴──────────────┴───────┴────────────────┴───────────┘
//! ```
//!
//! All integers are little-endian. Delete records carry no value section;
//! Clear records carry neither key nor value.

use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher;

/// Magic bytes identifying a stratakv log file: "SKVL"
pub const LOG_MAGIC: [u8; 4] = *b"SKVL";

/// Current log format version
pub const LOG_FORMAT_VERSION: u32 = 1;

/// Size of the file header in bytes
pub const LOG_HEADER_SIZE: usize = 16;

/// Upper bound on a single record payload
///
/// Writers reject larger records; readers treat a larger length field as
/// corruption.
pub const MAX_RECORD_SIZE: usize = 256 * 1024 * 1024;

const OP_PUT: u8 = 1;
const OP_DELETE: u8 = 2;
const OP_CLEAR: u8 = 3;

/// Build the 16-byte file header
pub fn header_bytes() -> [u8; LOG_HEADER_SIZE] {
    let mut bytes = [0u8; LOG_HEADER_SIZE];
    bytes[0..4].copy_from_slice(&LOG_MAGIC);
    bytes[4..8].copy_from_slice(&LOG_FORMAT_VERSION.to_le_bytes());
    bytes
}

/// Validate a file header
pub fn check_header(bytes: &[u8]) -> Result<(), LogRecordError> {
    if bytes.len() < LOG_HEADER_SIZE {
        return Err(LogRecordError::InsufficientData);
    }
    if bytes[0..4] != LOG_MAGIC {
        return Err(LogRecordError::Malformed("bad magic bytes".to_string()));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != LOG_FORMAT_VERSION {
        return Err(LogRecordError::Malformed(format!(
            "unsupported log format version {}",
            version
        )));
    }
    Ok(())
}

/// One logged mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    /// Key inserted or overwritten
    Put {
        /// Raw key
        key: Vec<u8>,
        /// Raw value
        value: Vec<u8>,
    },
    /// Key removed
    Delete {
        /// Raw key
        key: Vec<u8>,
    },
    /// Every key removed
    Clear,
}

/// Record decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogRecordError {
    /// Buffer ends inside a record (torn write)
    #[error("insufficient data")]
    InsufficientData,

    /// Stored checksum does not match the payload
    #[error("checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum stored in the record
        expected: u32,
        /// Checksum computed over the payload
        computed: u32,
    },

    /// Checksum is valid but the payload cannot be parsed
    #[error("malformed record: {0}")]
    Malformed(String),

    /// Record payload exceeds [`MAX_RECORD_SIZE`]
    #[error("record payload of {size} bytes exceeds maximum of {max} bytes")]
    TooLarge {
        /// Payload size of the rejected record
        size: usize,
        /// Maximum payload size
        max: usize,
    },
}

/// Payload size of a put record
pub fn put_payload_len(key_len: usize, value_len: usize) -> usize {
    key_len.saturating_add(value_len).saturating_add(9)
}

/// Reject payload sizes replay would not accept
pub fn check_payload_len(size: usize) -> Result<(), LogRecordError> {
    if size > MAX_RECORD_SIZE {
        return Err(LogRecordError::TooLarge {
            size,
            max: MAX_RECORD_SIZE,
        });
    }
    Ok(())
}

fn write_len(out: &mut Vec<u8>, len: usize) -> Result<(), LogRecordError> {
    let len = u32::try_from(len).map_err(|_| LogRecordError::TooLarge {
        size: len,
        max: MAX_RECORD_SIZE,
    })?;
    out.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

impl LogRecord {
    /// Size of the payload `to_bytes` would produce
    pub fn payload_len(&self) -> usize {
        match self {
            LogRecord::Put { key, value } => put_payload_len(key.len(), value.len()),
            LogRecord::Delete { key } => key.len().saturating_add(5),
            LogRecord::Clear => 1,
        }
    }

    /// Serialize including length prefix and checksum
    ///
    /// # Errors
    ///
    /// Returns `TooLarge` if the payload exceeds [`MAX_RECORD_SIZE`], so
    /// nothing is written that replay would reject.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LogRecordError> {
        check_payload_len(self.payload_len())?;
        let payload = self.payload()?;
        let mut hasher = Hasher::new();
        hasher.update(&payload);
        let crc = hasher.finalize();

        let mut out = Vec::with_capacity(8 + payload.len());
        write_len(&mut out, payload.len())?;
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    fn payload(&self) -> Result<Vec<u8>, LogRecordError> {
        let mut out = Vec::with_capacity(self.payload_len());
        match self {
            LogRecord::Put { key, value } => {
                out.push(OP_PUT);
                write_len(&mut out, key.len())?;
                out.extend_from_slice(key);
                write_len(&mut out, value.len())?;
                out.extend_from_slice(value);
            }
            LogRecord::Delete { key } => {
                out.push(OP_DELETE);
                write_len(&mut out, key.len())?;
                out.extend_from_slice(key);
            }
            LogRecord::Clear => out.push(OP_CLEAR),
        }
        Ok(out)
    }

    /// Parse one record from the front of `bytes`
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn from_bytes(bytes: &[u8]) -> Result<(LogRecord, usize), LogRecordError> {
        if bytes.len() < 8 {
            return Err(LogRecordError::InsufficientData);
        }
        let mut cursor = Cursor::new(bytes);
        let len = read_u32(&mut cursor)? as usize;
        let expected = read_u32(&mut cursor)?;
        if len > MAX_RECORD_SIZE {
            return Err(LogRecordError::Malformed(format!(
                "record length {} exceeds maximum",
                len
            )));
        }
        let total = 8 + len;
        if bytes.len() < total {
            return Err(LogRecordError::InsufficientData);
        }
        let payload = &bytes[8..total];
        let mut hasher = Hasher::new();
        hasher.update(payload);
        let computed = hasher.finalize();
        if computed != expected {
            return Err(LogRecordError::ChecksumMismatch { expected, computed });
        }
        Ok((Self::parse_payload(payload)?, total))
    }

    fn parse_payload(payload: &[u8]) -> Result<LogRecord, LogRecordError> {
        let mut cursor = Cursor::new(payload);
        let op = cursor
            .read_u8()
            .map_err(|_| LogRecordError::Malformed("empty payload".to_string()))?;
        let record = match op {
            OP_PUT => {
                let key = read_chunk(&mut cursor)?;
                let value = read_chunk(&mut cursor)?;
                LogRecord::Put { key, value }
            }
            OP_DELETE => LogRecord::Delete {
                key: read_chunk(&mut cursor)?,
            },
            OP_CLEAR => LogRecord::Clear,
            other => {
                return Err(LogRecordError::Malformed(format!("unknown op {}", other)));
            }
        };
        if cursor.position() as usize != payload.len() {
            return Err(LogRecordError::Malformed("trailing payload bytes".to_string()));
        }
        Ok(record)
    }
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32, LogRecordError> {
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| LogRecordError::InsufficientData)
}

fn read_chunk(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u8>, LogRecordError> {
    let len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| LogRecordError::Malformed("truncated length".to_string()))? as usize;
    let mut buf = vec![0u8; len];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| LogRecordError::Malformed("truncated chunk".to_string()))?;
    Ok(buf)
}

/// Why replay stopped reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStopReason {
    /// Every byte was consumed
    EndOfData,
    /// The file ends inside a record
    PartialRecord {
        /// Offset of the partial record
        offset: u64,
    },
    /// A record failed validation
    Corrupt {
        /// Offset of the bad record
        offset: u64,
        /// Decoder detail
        detail: String,
    },
}

/// Result of reading a log file
#[derive(Debug)]
pub struct LogContents {
    /// Valid records in file order
    pub records: Vec<LogRecord>,
    /// File offset just past the last valid record
    pub valid_end: u64,
    /// Why reading stopped
    pub stop_reason: ReadStopReason,
}

/// Read every valid record of the log at `path`
///
/// Stops at the first partial or corrupt record; records after it are not
/// trusted because mutations are order-dependent.
pub fn read_log(path: &Path) -> io::Result<LogContents> {
    let mut buffer = Vec::new();
    File::open(path)?.read_to_end(&mut buffer)?;

    check_header(&buffer).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid log header in '{}': {}", path.display(), e),
        )
    })?;

    let mut records = Vec::new();
    let mut offset = LOG_HEADER_SIZE;
    let mut stop_reason = ReadStopReason::EndOfData;
    while offset < buffer.len() {
        match LogRecord::from_bytes(&buffer[offset..]) {
            Ok((record, consumed)) => {
                records.push(record);
                offset += consumed;
            }
            Err(LogRecordError::InsufficientData) => {
                stop_reason = ReadStopReason::PartialRecord {
                    offset: offset as u64,
                };
                break;
            }
            Err(e) => {
                stop_reason = ReadStopReason::Corrupt {
                    offset: offset as u64,
                    detail: e.to_string(),
                };
                break;
            }
        }
    }

    Ok(LogContents {
        records,
        valid_end: offset as u64,
        stop_reason,
    })
}

/// Write a fresh log containing `records` to `path`
pub fn write_log<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a LogRecord>,
) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(&header_bytes())?;
    for record in records {
        let bytes = record
            .to_bytes()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        file.write_all(&bytes)?;
    }
    file.sync_all()
}
