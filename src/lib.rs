//! chunklog: an append-only chunked log.
//!
//! A durable byte stream stored on a local filesystem as an ordered
//! sequence of fixed-maximum-size chunk files, with FIFO retention of old
//! chunks once a configured count is exceeded.
//!
//! # Key Components
//!
//! - **[`ChunkedLog`]**: the append side, with rotation, expiration, and
//!   optional synchronous durability
//! - **[`ChunkedLogReader`]**: a cursor over the absolute offset space that
//!   streams across chunk boundaries
//! - **[`RecordBatch`]**: ordered opaque records, appended atomically per
//!   gather-write
//! - **[`HeaderFeeder`]**: optional collaborator supplying header bytes for
//!   each new chunk
//!
//! Records are opaque byte slices; callers choose the framing. The log
//! guarantees a record is never torn across chunks or system writes.
//!
//! # Example
//!
//! ```ignore
//! use chunklog::prelude::*;
//!
//! let log = ChunkedLog::open_with(
//!     LogConfig::new("/var/lib/app/events").with_max_chunks(16),
//! )?;
//! log.write(Bytes::from_static(b"event-1"))?;
//! log.sync()?;
//!
//! let mut reader = log.reader(SeekFrom::Start(0))?;
//! let mut buf = [0u8; 7];
//! reader.read(&mut buf)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod error;
pub mod log;
pub mod prelude;

pub use batch::RecordBatch;
pub use error::{ChunkLogError, Result};
pub use log::{ChunkedLog, ChunkedLogReader, HeaderFeeder, LogConfig, StaticHeader};
