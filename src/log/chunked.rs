//! Chunked log writer implementation.

use super::config::LogConfig;
use super::directory::ChunkDirectory;
use super::feeder::HeaderFeeder;
use super::reader::ChunkedLogReader;
use crate::batch::RecordBatch;
use crate::error::{ChunkLogError, Result};
use bytes::Bytes;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{IoSlice, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Internal state of the log. Guarded by the outer mutex.
struct LogInner {
    /// Configuration, normalized at open.
    config: LogConfig,
    /// Directory layout helper.
    dir: ChunkDirectory,
    /// Start offsets of each live chunk, strictly increasing. Empty means
    /// the log is closed.
    offsets: Vec<i64>,
    /// Open files parallel to `offsets`; the last is the writable tail.
    files: Vec<File>,
    /// One past the last byte accepted by a write call, over the whole
    /// historical log including expired chunks.
    write_len: i64,
    /// One past the last byte known durable on disk. Never above `write_len`.
    sync_len: i64,
    /// Header feeder consulted after each rotation.
    header: Option<Box<dyn HeaderFeeder>>,
}

/// Counters shared across clones without taking the inner lock.
struct LogShared {
    /// Records submitted since open.
    record_count: AtomicU64,
}

/// An append-only log stored as an ordered sequence of chunk files.
///
/// Records are opaque byte slices. Each record lands entirely within one
/// chunk; when a record would overflow the tail chunk, the log rotates to a
/// new chunk and expires the oldest chunks beyond the retention bound.
/// Clones share the same log; all operations serialize on an internal lock,
/// so a log handle may be shared freely across threads.
///
/// # Example
///
/// ```ignore
/// let log = ChunkedLog::open_with(LogConfig::new("/var/lib/app/events"))?;
/// log.write(Bytes::from_static(b"hello"))?;
/// let mut reader = log.reader(SeekFrom::Start(0))?;
/// ```
#[derive(Clone)]
pub struct ChunkedLog {
    inner: Arc<Mutex<LogInner>>,
    shared: Arc<LogShared>,
}

/// Resolved position of an absolute offset: the chunk holding it.
pub(crate) struct Location {
    /// Absolute start offset of the chunk.
    pub start: i64,
    /// Path of the chunk file.
    pub path: PathBuf,
}

impl ChunkedLog {
    /// Create a closed log with the given configuration.
    #[must_use]
    pub fn new(config: LogConfig) -> Self {
        let dir = ChunkDirectory::new(config.directory.clone());
        Self {
            inner: Arc::new(Mutex::new(LogInner {
                config,
                dir,
                offsets: Vec::new(),
                files: Vec::new(),
                write_len: 0,
                sync_len: 0,
                header: None,
            })),
            shared: Arc::new(LogShared {
                record_count: AtomicU64::new(0),
            }),
        }
    }

    /// Create and open a log in one step.
    pub fn open_with(config: LogConfig) -> Result<Self> {
        let log = Self::new(config);
        log.open()?;
        Ok(log)
    }

    /// Install the feeder that supplies header records for new chunks.
    ///
    /// The feeder runs after every rotation, never at initial open.
    pub fn set_header_feeder(&self, feeder: Box<dyn HeaderFeeder>) {
        self.inner.lock().header = Some(feeder);
    }

    /// Open the log, recovering any chunks already on disk.
    ///
    /// Creates the directory (with parents) if absent, enumerates chunk
    /// files, verifies they form a contiguous offset range, and reopens the
    /// last one as the writable tail. An empty directory gets a fresh tail
    /// chunk at offset zero.
    pub fn open(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.offsets.is_empty() {
            return Err(ChunkLogError::AlreadyOpen {
                dir: inner.config.directory.clone(),
            });
        }
        inner.config.normalize();
        inner.dir.ensure_exists()?;

        let chunks = inner.dir.scan()?;
        if chunks.is_empty() {
            let path = inner.dir.chunk_path(0);
            let file = open_tail(&path)?;
            inner.offsets.push(0);
            inner.files.push(file);
            inner.write_len = 0;
            inner.sync_len = 0;
            return Ok(());
        }

        let mut offsets = Vec::with_capacity(chunks.len());
        let mut files = Vec::with_capacity(chunks.len());
        let mut expected_next = chunks[0].start;
        let last = chunks.len() - 1;
        for (i, chunk) in chunks.iter().enumerate() {
            if chunk.start > expected_next {
                return Err(ChunkLogError::Omission {
                    expected: expected_next,
                    found: chunk.start,
                });
            }
            if chunk.start < expected_next {
                return Err(ChunkLogError::Overlap {
                    expected: expected_next,
                    found: chunk.start,
                });
            }
            let file = if i == last {
                open_tail(&chunk.path)?
            } else {
                File::open(&chunk.path).map_err(|e| ChunkLogError::io(&chunk.path, e))?
            };
            let size = file
                .metadata()
                .map_err(|e| ChunkLogError::io(&chunk.path, e))?
                .len() as i64;
            expected_next += size;
            offsets.push(chunk.start);
            files.push(file);
        }
        inner.offsets = offsets;
        inner.files = files;
        inner.write_len = expected_next;
        inner.sync_len = expected_next;
        tracing::debug!(
            dir = %inner.dir.path().display(),
            chunks = inner.files.len(),
            write_len = inner.write_len,
            "recovered chunked log"
        );
        Ok(())
    }

    /// Append a single record. Returns its length on success.
    pub fn write(&self, rec: impl Into<Bytes>) -> Result<usize> {
        let rec: Bytes = rec.into();
        let n = rec.len();
        self.drain(RecordBatch::from(vec![rec]))?;
        Ok(n)
    }

    /// Append a batch of records, in order.
    ///
    /// Every record lands entirely within one chunk. On success all bytes
    /// are in the OS write buffer; in synced mode they are durable on disk.
    /// On error, records before the failure point were appended and records
    /// at or after it were not; the log stays open and may be retried.
    pub fn drain(&self, recs: RecordBatch) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.offsets.is_empty() {
            return Err(ChunkLogError::NotOpen);
        }
        let submitted = recs.len() as u64;
        let mut pending = recs;
        let mut result = Ok(());

        while !pending.is_empty() {
            let tail_start = inner.offsets[inner.offsets.len() - 1];
            let filled = inner.write_len - tail_start;
            let cap = (inner.config.max_chunk_size - filled).max(0);
            let (prefix, remaining) = pending.whole_record_prefix(cap);

            if prefix.is_empty() {
                // The next record does not fit the tail. A record that
                // cannot fit even an empty chunk would rotate forever.
                let first = pending.records()[0].len() as i64;
                if first > inner.config.max_chunk_size {
                    result = Err(ChunkLogError::RecordTooLarge {
                        size: first,
                        max: inner.config.max_chunk_size,
                    });
                    break;
                }
                if let Err(e) = Self::rotate_locked(&mut inner) {
                    result = Err(e);
                    break;
                }
                if let Some(feeder) = inner.header.as_mut() {
                    let header = feeder.next_header();
                    pending.prepend(header);
                }
                continue;
            }

            let prefix_len = cap - remaining;
            let slices: Vec<IoSlice<'_>> = prefix.iter().map(|r| IoSlice::new(r)).collect();
            let mut tail = &inner.files[inner.files.len() - 1];
            let written = match tail.write_vectored(&slices) {
                Ok(n) => n,
                Err(e) => {
                    result = Err(ChunkLogError::io(inner.dir.chunk_path(tail_start), e));
                    break;
                }
            };
            if written == 0 && prefix_len > 0 {
                result = Err(ChunkLogError::io(
                    inner.dir.chunk_path(tail_start),
                    std::io::Error::new(
                        std::io::ErrorKind::WriteZero,
                        "gather-write accepted no bytes",
                    ),
                ));
                break;
            }
            pending = pending.exact_suffix(written as i64);
            inner.write_len += written as i64;
        }

        if inner.config.synced {
            let idx = inner.files.len() - 1;
            match inner.files[idx].sync_data() {
                Ok(()) => inner.sync_len = inner.write_len,
                Err(e) => {
                    let err = ChunkLogError::io(inner.dir.chunk_path(inner.offsets[idx]), e);
                    if result.is_ok() {
                        result = Err(err);
                    }
                }
            }
        }

        self.shared.record_count.fetch_add(submitted, Ordering::Relaxed);
        result
    }

    /// Freeze the tail and start a new chunk named by the current write
    /// offset, then expire head chunks beyond the retention bound.
    fn rotate_locked(inner: &mut LogInner) -> Result<()> {
        if let Err(e) = inner.files[inner.files.len() - 1].sync_data() {
            tracing::warn!(error = %e, "pre-rotation flush of the tail failed");
        }
        let start = inner.write_len;
        let path = inner.dir.chunk_path(start);
        // Fail before touching state so a failed rotation leaves the old
        // tail writable.
        let file = open_tail(&path)?;
        inner.files.push(file);
        inner.offsets.push(start);
        tracing::debug!(start, chunks = inner.files.len(), "rotated to a new tail chunk");
        while inner.files.len() > inner.config.max_chunks && inner.files.len() > 1 {
            Self::expire_head_locked(inner);
        }
        Ok(())
    }

    /// Drop the oldest chunk: close its handle and unlink its file.
    /// Best-effort; an unlink failure leaves a stray file that the next
    /// open will recover as a live chunk.
    fn expire_head_locked(inner: &mut LogInner) {
        let start = inner.offsets.remove(0);
        drop(inner.files.remove(0));
        let path = inner.dir.chunk_path(start);
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to unlink expired chunk");
        }
    }

    /// Flush the tail chunk to disk.
    pub fn sync(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.files.is_empty() {
            return Err(ChunkLogError::NotOpen);
        }
        let idx = inner.files.len() - 1;
        inner.files[idx]
            .sync_data()
            .map_err(|e| ChunkLogError::io(inner.dir.chunk_path(inner.offsets[idx]), e))?;
        inner.sync_len = inner.write_len;
        Ok(())
    }

    /// Close every file handle and clear in-memory state.
    ///
    /// Persistent state on disk remains; the log may be reopened.
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.files.is_empty() {
            return Err(ChunkLogError::NotOpen);
        }
        inner.files.clear();
        inner.offsets.clear();
        inner.write_len = 0;
        inner.sync_len = 0;
        Ok(())
    }

    /// Open a reader positioned by `whence` against the absolute offset
    /// space. The reader owns an independent read-only file handle.
    pub fn reader(&self, whence: SeekFrom) -> Result<ChunkedLogReader> {
        ChunkedLogReader::open(self.clone(), whence)
    }

    /// Resolve a seek target against a base position and find its chunk.
    ///
    /// `base` is the position `SeekFrom::Current` is relative to. Returns
    /// the resolved absolute position and the chunk holding it; an offset
    /// equal to the write length resolves to one past the last byte of the
    /// tail.
    pub(crate) fn locate_from(&self, base: i64, whence: SeekFrom) -> Result<(i64, Location)> {
        let inner = self.inner.lock();
        if inner.offsets.is_empty() {
            return Err(ChunkLogError::NotOpen);
        }
        let pos = match whence {
            SeekFrom::Start(o) => o as i64,
            SeekFrom::Current(d) => base + d,
            SeekFrom::End(d) => inner.write_len + d,
        };
        let oldest = inner.offsets[0];
        if pos < oldest {
            return Err(ChunkLogError::ChunkMissing {
                offset: pos,
                oldest,
            });
        }
        if pos > inner.write_len {
            return Err(ChunkLogError::OutOfRange {
                offset: pos,
                end: inner.write_len,
            });
        }
        // Largest chunk index whose start is at or below pos. Linear scan;
        // the chunk count is bounded by max_chunks.
        let mut i = inner.offsets.len() - 1;
        while inner.offsets[i] > pos {
            i -= 1;
        }
        let start = inner.offsets[i];
        Ok((
            pos,
            Location {
                start,
                path: inner.dir.chunk_path(start),
            },
        ))
    }

    /// Whether the log is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.inner.lock().offsets.is_empty()
    }

    /// Number of live chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.inner.lock().files.len()
    }

    /// Total bytes ever written, including expired chunks.
    #[must_use]
    pub fn total_size(&self) -> i64 {
        self.inner.lock().write_len
    }

    /// Bytes dropped by expiration: the start offset of the oldest live
    /// chunk. Zero when the log is closed.
    #[must_use]
    pub fn expired_size(&self) -> i64 {
        self.inner.lock().offsets.first().copied().unwrap_or(0)
    }

    /// Live (readable) bytes: total minus expired.
    #[must_use]
    pub fn current_size(&self) -> i64 {
        let inner = self.inner.lock();
        inner.write_len - inner.offsets.first().copied().unwrap_or(inner.write_len)
    }

    /// Bytes known durable on disk.
    #[must_use]
    pub fn synced_size(&self) -> i64 {
        self.inner.lock().sync_len
    }

    /// Records submitted since open.
    #[must_use]
    pub fn record_count(&self) -> u64 {
        self.shared.record_count.load(Ordering::Relaxed)
    }

    /// The directory this log stores chunks in.
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        self.inner.lock().config.directory.clone()
    }
}

impl Drop for ChunkedLog {
    fn drop(&mut self) {
        // Last handle going away: flush the tail best-effort.
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            let inner = inner.get_mut();
            if let Some(tail) = inner.files.last() {
                let _ = tail.sync_data();
            }
        }
    }
}

/// Open (creating if needed) a chunk file as the writable tail.
fn open_tail(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .read(true)
        .open(path)
        .map_err(|e| ChunkLogError::io(path, e))
}
