//! Chunk header feeders.

use crate::batch::RecordBatch;
use bytes::Bytes;

/// Supplies header records for newly rotated chunks.
///
/// The log consults the feeder immediately after every rotation (but not at
/// initial open) and prepends its output to the pending batch, so each new
/// chunk begins with the header bytes. Feeders may be stateful; the log
/// treats the returned records as opaque.
pub trait HeaderFeeder: Send {
    /// Produce the header records for the next chunk.
    fn next_header(&mut self) -> RecordBatch;
}

/// A feeder that emits the same header bytes at the start of every chunk.
#[derive(Debug, Clone)]
pub struct StaticHeader {
    header: Bytes,
}

impl StaticHeader {
    /// Create a feeder emitting `header` once per chunk.
    pub fn new(header: impl Into<Bytes>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl HeaderFeeder for StaticHeader {
    fn next_header(&mut self) -> RecordBatch {
        RecordBatch::from(vec![self.header.clone()])
    }
}
