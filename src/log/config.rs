//! Log configuration.

use std::path::PathBuf;

/// Default maximum size of a single chunk file: 8 MiB.
pub const DEFAULT_MAX_CHUNK_SIZE: i64 = 1 << 23;

/// Default number of live chunks retained before FIFO expiration.
pub const DEFAULT_MAX_CHUNKS: usize = 8;

/// Configuration for a chunked log, fixed at open time.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory holding the chunk files. One directory per log.
    pub directory: PathBuf,
    /// Maximum chunk file size before rotation. A chunk never exceeds this;
    /// a record that would overflow the tail forces a rotation instead.
    pub max_chunk_size: i64,
    /// Live chunks above this count are dropped, oldest first.
    pub max_chunks: usize,
    /// Whether appends are fsynced before `drain` returns.
    ///
    /// When false, bytes reach the page cache only; durability requires an
    /// explicit `sync`.
    pub synced: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/tmp/chunklog"),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
            synced: false,
        }
    }
}

impl LogConfig {
    /// Configuration for a log at `directory` with default limits.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Configuration for a throwaway log under a unique temp directory.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            directory: std::env::temp_dir().join(format!("chunklog_{}", uuid::Uuid::new_v4())),
            ..Self::default()
        }
    }

    /// Set the log directory.
    #[must_use]
    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = dir.into();
        self
    }

    /// Set the maximum chunk file size.
    #[must_use]
    pub fn with_max_chunk_size(mut self, size: i64) -> Self {
        self.max_chunk_size = size;
        self
    }

    /// Set the number of live chunks retained.
    #[must_use]
    pub fn with_max_chunks(mut self, count: usize) -> Self {
        self.max_chunks = count;
        self
    }

    /// Set synchronous durability mode.
    #[must_use]
    pub fn with_sync(mut self, synced: bool) -> Self {
        self.synced = synced;
        self
    }

    /// Replace zero limits with their defaults. Applied at open time.
    pub(crate) fn normalize(&mut self) {
        if self.max_chunk_size == 0 {
            self.max_chunk_size = DEFAULT_MAX_CHUNK_SIZE;
        }
        if self.max_chunks == 0 {
            self.max_chunks = DEFAULT_MAX_CHUNKS;
        }
    }
}
