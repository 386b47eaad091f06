//! FileStore: durable sorted engine
//!
//! An in-memory `BTreeMap` index backed by an append-only operation log
//! (see [`crate::log`]). Every mutation is appended to the log before it is
//! applied to the index; opening a directory replays the log.
//!
//! # Recovery
//!
//! A crash can leave a partially written record at the end of the log.
//! Replay stops at the first partial or corrupt record, truncates the file
//! there and logs a warning. Everything before it is recovered.
//!
//! # Compaction
//!
//! Overwrites and deletes leave dead records behind. [`FileStore::compact`]
//! rewrites the log with one `Put` per live key and atomically replaces the
//! old file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{info, warn};

use stratakv_core::{Row, ScanRange, SortedStore, StrataError, StrataResult};

use crate::durability::DurabilityMode;
use crate::log::{self, LogRecord, ReadStopReason};
use crate::memory::{scan_map, RawMap};

/// Log file name inside the data directory
pub const LOG_FILE_NAME: &str = "data.log";

const COMPACT_FILE_NAME: &str = "data.log.compact";

/// Append target of the operation log
trait LogSink: Write + Send {
    fn sync_data(&mut self) -> io::Result<()>;
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

impl LogSink for File {
    fn sync_data(&mut self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

/// Appends records, keeping the file a sequence of whole records
///
/// A failed append is cut back to the previous record boundary. If that
/// cut fails too, the writer is poisoned and refuses every later append.
struct LogWriter<F = File> {
    file: F,
    mode: DurabilityMode,
    writes_since_sync: usize,
    len: u64,
    poisoned: bool,
}

impl<F: LogSink> LogWriter<F> {
    fn new(file: F, len: u64, mode: DurabilityMode) -> Self {
        Self {
            file,
            mode,
            writes_since_sync: 0,
            len,
            poisoned: false,
        }
    }

    fn append(&mut self, record: &LogRecord) -> StrataResult<()> {
        if self.poisoned {
            return Err(StrataError::storage(
                "operation log has a partial record that could not be removed; reopen the store",
            ));
        }
        let bytes = record
            .to_bytes()
            .map_err(|e| StrataError::invalid_argument(e.to_string()))?;
        if let Err(e) = self.write_and_sync(&bytes) {
            self.roll_back();
            return Err(e.into());
        }
        self.len += bytes.len() as u64;
        Ok(())
    }

    fn write_and_sync(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.writes_since_sync += 1;
        if self.mode.should_sync(self.writes_since_sync) {
            self.file.sync_data()?;
            self.writes_since_sync = 0;
        }
        Ok(())
    }

    fn roll_back(&mut self) {
        if let Err(e) = self.file.set_len(self.len) {
            warn!(
                target: "stratakv::storage",
                len = self.len,
                error = %e,
                "Failed to remove partial log record, rejecting further writes"
            );
            self.poisoned = true;
        }
    }

    fn sync(&mut self) -> StrataResult<()> {
        if self.writes_since_sync > 0 {
            self.file.sync_data()?;
            self.writes_since_sync = 0;
        }
        Ok(())
    }
}

/// Error for keys or values too large to log
fn check_put_size(key: &[u8], value: &[u8]) -> StrataResult<()> {
    log::check_payload_len(log::put_payload_len(key.len(), value.len()))
        .map_err(|e| StrataError::invalid_argument(format!("value too large: {}", e)))
}

struct Inner {
    data: RawMap,
    log: LogWriter<File>,
}

impl Inner {
    fn apply(&mut self, record: LogRecord) -> StrataResult<()> {
        self.log.append(&record)?;
        apply_record(&mut self.data, record);
        Ok(())
    }
}

fn apply_record(data: &mut RawMap, record: LogRecord) {
    match record {
        LogRecord::Put { key, value } => {
            data.insert(key, value);
        }
        LogRecord::Delete { key } => {
            data.remove(&key);
        }
        LogRecord::Clear => data.clear(),
    }
}

/// Durable sorted engine backed by an operation log
///
/// Thread-safe through `parking_lot::RwLock`. The write lock covers both
/// the log append and the index update, so the log order is the apply
/// order.
pub struct FileStore {
    dir: PathBuf,
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore").field("dir", &self.dir).finish()
    }
}

impl FileStore {
    /// Open (or create) a store in `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or log cannot be created or read,
    /// or the log header is invalid.
    pub fn open(dir: impl AsRef<Path>, mode: DurabilityMode) -> StrataResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let path = dir.join(LOG_FILE_NAME);

        let mut data = RawMap::new();
        let mut replayed = 0usize;
        if path.exists() {
            let contents = log::read_log(&path)?;
            if contents.stop_reason != ReadStopReason::EndOfData {
                warn!(
                    target: "stratakv::storage",
                    path = %path.display(),
                    reason = ?contents.stop_reason,
                    valid_end = contents.valid_end,
                    "Truncating operation log after last valid record"
                );
                OpenOptions::new()
                    .write(true)
                    .open(&path)?
                    .set_len(contents.valid_end)?;
            }
            replayed = contents.records.len();
            for record in contents.records {
                apply_record(&mut data, record);
            }
        } else {
            log::write_log(&path, std::iter::empty())?;
        }

        let file = OpenOptions::new().append(true).open(&path)?;
        let len = file.metadata()?.len();
        info!(
            target: "stratakv::storage",
            path = %path.display(),
            records = replayed,
            keys = data.len(),
            durability = mode.description(),
            "Opened file store"
        );

        Ok(Self {
            dir,
            inner: RwLock::new(Inner {
                data,
                log: LogWriter::new(file, len, mode),
            }),
        })
    }

    /// Data directory of this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.inner.read().data.len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.inner.read().data.is_empty()
    }

    /// Force pending writes to disk regardless of durability mode
    pub fn sync(&self) -> StrataResult<()> {
        self.inner.write().log.sync()
    }

    /// Rewrite the log with only live entries
    ///
    /// Returns the number of records in the compacted log.
    pub fn compact(&self) -> StrataResult<usize> {
        let mut inner = self.inner.write();
        let path = self.dir.join(LOG_FILE_NAME);
        let tmp = self.dir.join(COMPACT_FILE_NAME);

        let records: Vec<LogRecord> = inner
            .data
            .iter()
            .map(|(k, v)| LogRecord::Put {
                key: k.clone(),
                value: v.clone(),
            })
            .collect();
        log::write_log(&tmp, &records)?;
        fs::rename(&tmp, &path)?;

        let file = OpenOptions::new().append(true).open(&path)?;
        let len = file.metadata()?.len();
        let mode = inner.log.mode;
        inner.log = LogWriter::new(file, len, mode);
        info!(
            target: "stratakv::storage",
            path = %path.display(),
            records = records.len(),
            "Compacted operation log"
        );
        Ok(records.len())
    }
}

impl SortedStore for FileStore {
    fn get(&self, key: &[u8]) -> StrataResult<Option<Vec<u8>>> {
        Ok(self.inner.read().data.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StrataResult<()> {
        check_put_size(key, value)?;
        self.inner.write().apply(LogRecord::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })
    }

    fn put_if_absent(&self, key: &[u8], value: &[u8]) -> StrataResult<bool> {
        check_put_size(key, value)?;
        let mut inner = self.inner.write();
        if inner.data.contains_key(key) {
            return Ok(false);
        }
        inner.apply(LogRecord::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;
        Ok(true)
    }

    fn delete(&self, key: &[u8]) -> StrataResult<bool> {
        let mut inner = self.inner.write();
        if !inner.data.contains_key(key) {
            return Ok(false);
        }
        inner.apply(LogRecord::Delete { key: key.to_vec() })?;
        Ok(true)
    }

    fn scan(&self, range: &ScanRange) -> StrataResult<Vec<Row>> {
        Ok(scan_map(&self.inner.read().data, range))
    }

    fn clear(&self) -> StrataResult<()> {
        self.inner.write().apply(LogRecord::Clear)
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = self.inner.get_mut().log.sync() {
            warn!(
                target: "stratakv::storage",
                dir = %self.dir.display(),
                error = %e,
                "Failed to sync operation log on close"
            );
        }
    }
}
