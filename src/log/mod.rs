//! Append-only chunked log storage.
//!
//! A log is one directory of chunk files. Each chunk carries a contiguous
//! range of the log's absolute offset space and is named by the offset of
//! its first byte:
//!
//! ```text
//! events/
//!   000000000000.log.chunk      bytes [0, 8 MiB)       frozen
//!   000008388608.log.chunk      bytes [8 MiB, 16 MiB)  frozen
//!   000016777216.log.chunk      bytes [16 MiB, ...)    tail (writable)
//! ```
//!
//! Only the tail grows. When a record would overflow it, the log rotates:
//! the tail is flushed and frozen, a new empty tail is created, and chunks
//! beyond the retention bound are expired oldest-first. Offsets of expired
//! bytes remain valid identifiers but are no longer readable.
//!
//! Writers go through [`ChunkedLog`]; readers hold a [`ChunkedLogReader`]
//! with an independent file handle and see a single continuous byte stream
//! across chunk boundaries.

mod chunked;
mod config;
mod directory;
mod feeder;
mod reader;

pub use chunked::ChunkedLog;
pub use config::{LogConfig, DEFAULT_MAX_CHUNKS, DEFAULT_MAX_CHUNK_SIZE};
pub use feeder::{HeaderFeeder, StaticHeader};
pub use reader::ChunkedLogReader;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::RecordBatch;
    use crate::error::ChunkLogError;
    use bytes::Bytes;
    use std::io::SeekFrom;
    use std::path::Path;
    use tempfile::tempdir;

    fn open_log(dir: &Path, max_chunk_size: i64, max_chunks: usize) -> ChunkedLog {
        ChunkedLog::open_with(
            LogConfig::new(dir)
                .with_max_chunk_size(max_chunk_size)
                .with_max_chunks(max_chunks),
        )
        .unwrap()
    }

    fn read_all_from(log: &ChunkedLog, offset: i64) -> Vec<u8> {
        let mut reader = log.reader(SeekFrom::Start(offset as u64)).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            let n = reader.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn open_creates_initial_chunk() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 1024, 4);
        assert!(log.is_open());
        assert_eq!(log.chunk_count(), 1);
        assert_eq!(log.total_size(), 0);
        assert!(dir.path().join("000000000000.log.chunk").is_file());
    }

    #[test]
    fn open_twice_is_rejected() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 1024, 4);
        assert!(matches!(
            log.open(),
            Err(ChunkLogError::AlreadyOpen { .. })
        ));
    }

    #[test]
    fn closed_log_rejects_operations() {
        let log = ChunkedLog::new(LogConfig::ephemeral());
        assert!(matches!(
            log.write(Bytes::from_static(b"x")),
            Err(ChunkLogError::NotOpen)
        ));
        assert!(matches!(log.sync(), Err(ChunkLogError::NotOpen)));
        assert!(matches!(log.close(), Err(ChunkLogError::NotOpen)));
        assert!(matches!(
            log.reader(SeekFrom::Start(0)),
            Err(ChunkLogError::NotOpen)
        ));
    }

    #[test]
    fn close_twice_returns_not_open() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 1024, 4);
        log.close().unwrap();
        assert!(matches!(log.close(), Err(ChunkLogError::NotOpen)));
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 1024, 4);
        let n = log.write(Bytes::from_static(b"hello, chunk")).unwrap();
        assert_eq!(n, 12);
        assert_eq!(read_all_from(&log, 0), b"hello, chunk");
    }

    #[test]
    fn exact_fit_does_not_rotate() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 16, 8);
        log.write(Bytes::from(vec![7u8; 6])).unwrap();
        // Exactly the remaining capacity still fits.
        log.write(Bytes::from(vec![7u8; 10])).unwrap();
        assert_eq!(log.chunk_count(), 1);
        // The next byte overflows and forces exactly one rotation.
        log.write(Bytes::from_static(b"z")).unwrap();
        assert_eq!(log.chunk_count(), 2);
    }

    #[test]
    fn oversized_record_is_rejected() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 8, 4);
        let err = log.write(Bytes::from(vec![0u8; 9])).unwrap_err();
        assert!(matches!(err, ChunkLogError::RecordTooLarge { size: 9, max: 8 }));
        // The log stays open and usable.
        log.write(Bytes::from(vec![0u8; 8])).unwrap();
        assert_eq!(log.total_size(), 8);
    }

    #[test]
    fn records_never_straddle_chunks() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 16, 8);
        log.write(Bytes::from(vec![1u8; 10])).unwrap();
        // 10 of 16 bytes used; a 10-byte record must move whole to chunk 2.
        log.write(Bytes::from(vec![2u8; 10])).unwrap();
        assert_eq!(log.chunk_count(), 2);
        let first = std::fs::metadata(dir.path().join("000000000000.log.chunk")).unwrap();
        let second = std::fs::metadata(dir.path().join("000000000010.log.chunk")).unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 10);
    }

    #[test]
    fn drain_splits_batch_across_chunks() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 8, 32);
        let batch: RecordBatch = (0u8..12).map(|i| Bytes::from(vec![i; 4])).collect();
        log.drain(batch).unwrap();
        assert_eq!(log.total_size(), 48);
        assert_eq!(log.chunk_count(), 6);
        let expected: Vec<u8> = (0u8..12).flat_map(|i| vec![i; 4]).collect();
        assert_eq!(read_all_from(&log, 0), expected);
    }

    #[test]
    fn metrics_track_rotation_and_expiration() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 8, 2);
        for i in 0u8..4 {
            log.write(Bytes::from(vec![i; 8])).unwrap();
        }
        assert_eq!(log.chunk_count(), 2);
        assert_eq!(log.total_size(), 32);
        assert_eq!(log.expired_size(), 16);
        assert_eq!(log.current_size(), 16);
        assert_eq!(log.record_count(), 4);
        assert!(!dir.path().join("000000000000.log.chunk").exists());
        assert!(dir.path().join("000000000016.log.chunk").is_file());
    }

    #[test]
    fn header_feeder_runs_per_rotation_not_at_open() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 16, 8);
        log.set_header_feeder(Box::new(StaticHeader::new(Bytes::from_static(b"HDR!"))));
        log.write(Bytes::from(vec![0u8; 16])).unwrap();
        log.write(Bytes::from(vec![1u8; 8])).unwrap();

        let first = std::fs::read(dir.path().join("000000000000.log.chunk")).unwrap();
        assert_eq!(first, vec![0u8; 16], "initial chunk carries no header");
        let second = std::fs::read(dir.path().join("000000000016.log.chunk")).unwrap();
        assert_eq!(&second[..4], b"HDR!");
        assert_eq!(&second[4..], &[1u8; 8][..]);
    }

    #[test]
    fn sync_is_idempotent() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 1024, 4);
        log.write(Bytes::from_static(b"abc")).unwrap();
        log.sync().unwrap();
        assert_eq!(log.synced_size(), 3);
        log.sync().unwrap();
        assert_eq!(log.synced_size(), 3);
    }

    #[test]
    fn synced_mode_flushes_every_drain() {
        let dir = tempdir().unwrap();
        let log = ChunkedLog::open_with(
            LogConfig::new(dir.path())
                .with_max_chunk_size(64)
                .with_sync(true),
        )
        .unwrap();
        for _ in 0..10 {
            log.write(Bytes::from_static(b"0123456789")).unwrap();
            assert_eq!(log.synced_size(), log.total_size());
        }
    }

    #[test]
    fn reopen_adopts_nonzero_first_offset() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("000000004096.log.chunk"), b"survivors!").unwrap();
        let log = open_log(dir.path(), 1024, 4);
        assert_eq!(log.expired_size(), 4096);
        assert_eq!(log.total_size(), 4106);
        assert_eq!(log.current_size(), 10);
        assert_eq!(read_all_from(&log, 4096), b"survivors!");
    }

    #[test]
    fn seek_to_end_reads_zero() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 1024, 4);
        log.write(Bytes::from_static(b"abcd")).unwrap();
        let mut reader = log.reader(SeekFrom::Start(4)).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        // SeekFrom::End(0) points at the same place.
        let mut reader = log.reader(SeekFrom::End(0)).unwrap();
        assert_eq!(reader.position(), 4);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn seek_past_end_is_out_of_range() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 1024, 4);
        log.write(Bytes::from_static(b"abcd")).unwrap();
        assert!(matches!(
            log.reader(SeekFrom::Start(5)),
            Err(ChunkLogError::OutOfRange { offset: 5, end: 4 })
        ));
    }

    #[test]
    fn seek_below_oldest_is_chunk_missing() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 8, 2);
        for i in 0u8..4 {
            log.write(Bytes::from(vec![i; 8])).unwrap();
        }
        assert_eq!(log.expired_size(), 16);
        assert!(matches!(
            log.reader(SeekFrom::Start(0)),
            Err(ChunkLogError::ChunkMissing { offset: 0, oldest: 16 })
        ));
        assert!(log.reader(SeekFrom::Start(16)).is_ok());
    }

    #[test]
    fn failed_seek_keeps_cursor() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 1024, 4);
        log.write(Bytes::from_static(b"abcd")).unwrap();
        let mut reader = log.reader(SeekFrom::Start(1)).unwrap();
        assert!(reader.seek(SeekFrom::Start(100)).is_err());
        assert_eq!(reader.position(), 1);
        let mut buf = [0u8; 3];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"bcd");
    }

    #[test]
    fn read_crosses_chunk_boundary() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 8, 8);
        for i in 0u8..4 {
            log.write(Bytes::from(vec![i; 4])).unwrap();
        }
        assert_eq!(log.chunk_count(), 2);
        let bytes = read_all_from(&log, 0);
        let expected: Vec<u8> = (0u8..4).flat_map(|i| vec![i; 4]).collect();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn reader_sees_bytes_appended_after_end() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 1024, 4);
        log.write(Bytes::from_static(b"one")).unwrap();
        let mut reader = log.reader(SeekFrom::Start(0)).unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);

        log.write(Bytes::from_static(b"two")).unwrap();
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"two");
    }

    #[test]
    fn reader_follows_rotation() {
        let dir = tempdir().unwrap();
        let log = open_log(dir.path(), 8, 8);
        log.write(Bytes::from(vec![1u8; 8])).unwrap();
        let mut reader = log.reader(SeekFrom::Start(0)).unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 8);
        assert_eq!(reader.read(&mut buf).unwrap(), 0);

        // Tail is full; this write rotates into a fresh chunk.
        log.write(Bytes::from(vec![2u8; 8])).unwrap();
        assert_eq!(reader.read(&mut buf).unwrap(), 8);
        assert_eq!(buf, [2u8; 8]);
    }
}
