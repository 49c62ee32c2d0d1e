//! Prelude for convenient imports.
//!
//! ```ignore
//! use chunklog::prelude::*;
//! ```

pub use crate::batch::RecordBatch;
pub use crate::error::{ChunkLogError, Result};
pub use crate::log::{
    ChunkedLog, ChunkedLogReader, HeaderFeeder, LogConfig, StaticHeader, DEFAULT_MAX_CHUNKS,
    DEFAULT_MAX_CHUNK_SIZE,
};

pub use bytes::Bytes;
pub use std::io::SeekFrom;
