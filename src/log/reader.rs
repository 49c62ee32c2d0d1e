//! Read-side cursor over a chunked log.

use super::chunked::ChunkedLog;
use crate::error::{ChunkLogError, Result};
use std::fs::File;
use std::io::{self, SeekFrom};

/// A sequential reader over the log's absolute offset space.
///
/// The reader owns its own read-only file handle and uses positional reads,
/// so it never shares cursor state with the writer or with other readers.
/// Chunk boundaries are invisible: when a read hits the end of the current
/// chunk file, the reader re-locates its position against the live log and
/// continues in the next chunk (or reports end of log).
pub struct ChunkedLogReader {
    log: ChunkedLog,
    /// Absolute position of the next byte to read.
    pos: i64,
    /// Start offset of the chunk `file` belongs to.
    off: i64,
    file: File,
}

impl ChunkedLogReader {
    pub(crate) fn open(log: ChunkedLog, whence: SeekFrom) -> Result<Self> {
        let (pos, loc) = log.locate_from(0, whence)?;
        let file = File::open(&loc.path).map_err(|e| ChunkLogError::io(&loc.path, e))?;
        Ok(Self {
            log,
            pos,
            off: loc.start,
            file,
        })
    }

    /// The absolute offset of the next byte this reader will return.
    #[must_use]
    pub fn position(&self) -> i64 {
        self.pos
    }

    /// Move the cursor. Returns the new absolute position.
    ///
    /// Re-locates against the live log, so a reader may seek into bytes
    /// written after it was opened. The chunk file is reopened only when
    /// the target lies in a different chunk. On error the cursor does not
    /// move.
    pub fn seek(&mut self, whence: SeekFrom) -> Result<i64> {
        let (pos, loc) = self.log.locate_from(self.pos, whence)?;
        if loc.start != self.off {
            self.file = File::open(&loc.path).map_err(|e| ChunkLogError::io(&loc.path, e))?;
        }
        self.off = loc.start;
        self.pos = pos;
        Ok(pos)
    }

    /// Read bytes at the cursor into `buf`. Returns the byte count; zero
    /// means the cursor is at the end of the log.
    ///
    /// A read never crosses a chunk boundary, so it may return fewer bytes
    /// than `buf` holds even mid-log; callers that need to fill a buffer
    /// can use the [`io::Read`] impl and `read_exact`.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.pread(buf)?;
        if n > 0 {
            self.pos += n as i64;
            return Ok(n);
        }
        // End of the current chunk file. Re-locate: either the position now
        // falls in a later chunk (rotation happened or we crossed a
        // boundary), or it is still here and the log has no more bytes.
        let old_off = self.off;
        self.seek(SeekFrom::Start(self.pos as u64))?;
        if self.off == old_off {
            return Ok(0);
        }
        let n = self.pread(buf)?;
        self.pos += n as i64;
        Ok(n)
    }

    /// Drop the file handle. Any further use requires a new reader.
    pub fn close(self) {}

    fn pread(&self, buf: &mut [u8]) -> Result<usize> {
        let chunk_off = (self.pos - self.off) as u64;
        read_at(&self.file, buf, chunk_off).map_err(|e| {
            ChunkLogError::io(self.log.directory(), e)
        })
    }
}

impl io::Read for ChunkedLogReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        ChunkedLogReader::read(self, buf).map_err(io::Error::from)
    }
}

impl io::Seek for ChunkedLogReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        ChunkedLogReader::seek(self, pos)
            .map(|p| p as u64)
            .map_err(io::Error::from)
    }
}

#[cfg(unix)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn read_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}
