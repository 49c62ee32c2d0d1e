//! Error types for chunklog.
//!
//! This module provides strongly-typed errors with actionable context.
//! Every variant carries a stable `ENNN` code in its display message so
//! operators can grep logs for the exact failure.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for chunked-log operations.
#[derive(Error, Debug)]
pub enum ChunkLogError {
    // =========================================================================
    // Usage errors (E001-E009)
    // =========================================================================
    /// The operation requires an open log.
    #[error("E001: the log is not open")]
    NotOpen,

    /// `open` was called on a log that is already open.
    #[error("E002: the log is already open at {dir}")]
    AlreadyOpen {
        /// Directory the log is currently open at.
        dir: PathBuf,
    },

    /// A single record cannot fit in an empty chunk and can never be written.
    #[error("E003: record of {size} bytes exceeds the maximum chunk size ({max})")]
    RecordTooLarge {
        /// Byte length of the offending record.
        size: i64,
        /// The configured maximum chunk size.
        max: i64,
    },

    // =========================================================================
    // Recovery errors (E010-E019)
    // =========================================================================
    /// A chunk is missing from the directory; the byte stream has a hole.
    #[error("E010: missing chunk: expected a chunk starting at offset {expected}, found {found}")]
    Omission {
        /// Offset where the next chunk was expected to start.
        expected: i64,
        /// Start offset actually found on disk.
        found: i64,
    },

    /// Two chunks claim overlapping offset ranges.
    #[error("E011: overlapping chunks: chunk at offset {found} starts before offset {expected}")]
    Overlap {
        /// Offset where the next chunk was expected to start.
        expected: i64,
        /// Start offset actually found on disk.
        found: i64,
    },

    /// The log path exists but is not a directory.
    #[error("E012: log path {path} exists and is not a directory")]
    ExistsNotDir {
        /// The conflicting path.
        path: PathBuf,
    },

    // =========================================================================
    // Positioning errors (E020-E029)
    // =========================================================================
    /// The requested offset lies in an expired (deleted) chunk.
    #[error("E020: offset {offset} is below the oldest live chunk (starts at {oldest})")]
    ChunkMissing {
        /// The requested absolute offset.
        offset: i64,
        /// Start offset of the oldest live chunk.
        oldest: i64,
    },

    /// The requested offset lies past the end of the log.
    #[error("E021: offset {offset} is past the end of the log ({end})")]
    OutOfRange {
        /// The requested absolute offset.
        offset: i64,
        /// One past the last written byte.
        end: i64,
    },

    // =========================================================================
    // I/O errors (E030-E039)
    // =========================================================================
    /// A filesystem operation failed.
    #[error("E030: I/O error at {path}: {cause}")]
    Io {
        /// The path where the I/O error occurred.
        path: PathBuf,
        /// Description of the underlying error.
        cause: String,
    },
}

impl ChunkLogError {
    /// Get the stable error code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotOpen => "E001",
            Self::AlreadyOpen { .. } => "E002",
            Self::RecordTooLarge { .. } => "E003",
            Self::Omission { .. } => "E010",
            Self::Overlap { .. } => "E011",
            Self::ExistsNotDir { .. } => "E012",
            Self::ChunkMissing { .. } => "E020",
            Self::OutOfRange { .. } => "E021",
            Self::Io { .. } => "E030",
        }
    }

    /// Check if this error is a caller mistake rather than a state problem.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::NotOpen | Self::AlreadyOpen { .. } | Self::RecordTooLarge { .. }
        )
    }

    /// Check if this error was raised while recovering on-disk state.
    ///
    /// Recovery errors mean the chunk directory is inconsistent and needs
    /// operator intervention before the log can open.
    #[must_use]
    pub fn is_recovery(&self) -> bool {
        matches!(
            self,
            Self::Omission { .. } | Self::Overlap { .. } | Self::ExistsNotDir { .. }
        )
    }

    /// Check if this error is a seek/locate failure.
    ///
    /// Positioning errors do not mutate reader state; the caller may retry
    /// with a different offset.
    #[must_use]
    pub fn is_positioning(&self) -> bool {
        matches!(self, Self::ChunkMissing { .. } | Self::OutOfRange { .. })
    }

    /// Wrap an I/O error with the path it occurred at.
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            cause: err.to_string(),
        }
    }
}

impl From<ChunkLogError> for std::io::Error {
    fn from(err: ChunkLogError) -> Self {
        use std::io::ErrorKind;
        let kind = match &err {
            ChunkLogError::ChunkMissing { .. } => ErrorKind::NotFound,
            ChunkLogError::OutOfRange { .. } => ErrorKind::InvalidInput,
            ChunkLogError::NotOpen | ChunkLogError::AlreadyOpen { .. } => ErrorKind::Other,
            ChunkLogError::RecordTooLarge { .. } => ErrorKind::InvalidInput,
            ChunkLogError::Omission { .. }
            | ChunkLogError::Overlap { .. }
            | ChunkLogError::ExistsNotDir { .. } => ErrorKind::InvalidData,
            ChunkLogError::Io { .. } => ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

/// Result type alias using `ChunkLogError`.
pub type Result<T> = std::result::Result<T, ChunkLogError>;
