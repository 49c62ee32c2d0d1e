//! Chunk directory layout.
//!
//! One directory per log. Each chunk file is named by the absolute start
//! offset of its first byte, zero-padded to twelve decimal digits, followed
//! by a fixed suffix. Zero padding makes lexicographic order equal numeric
//! order, and the constant name length lets the scan reject stray files
//! cheaply.

use crate::error::{ChunkLogError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Filename suffix of every chunk file.
pub(crate) const CHUNK_SUFFIX: &str = ".log.chunk";

/// Decimal digits in the offset prefix of a chunk filename.
pub(crate) const OFFSET_DIGITS: usize = 12;

const CHUNK_NAME_LEN: usize = OFFSET_DIGITS + CHUNK_SUFFIX.len();

/// A chunk file found by a directory scan.
#[derive(Debug, Clone)]
pub(crate) struct ChunkFile {
    /// Absolute start offset parsed from the filename.
    pub start: i64,
    /// Full path of the file.
    pub path: PathBuf,
}

/// Handle to the directory backing a chunked log.
#[derive(Debug, Clone)]
pub(crate) struct ChunkDirectory {
    dir: PathBuf,
}

impl ChunkDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Path of the chunk whose first byte has absolute offset `start`.
    pub fn chunk_path(&self, start: i64) -> PathBuf {
        self.dir
            .join(format!("{:0width$}{}", start, CHUNK_SUFFIX, width = OFFSET_DIGITS))
    }

    /// Create the directory (and parents) if absent.
    ///
    /// Fails with `ExistsNotDir` when the path exists but is not a directory.
    pub fn ensure_exists(&self) -> Result<()> {
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ChunkLogError::ExistsNotDir {
                path: self.dir.clone(),
            }),
            Err(_) => fs::create_dir_all(&self.dir).map_err(|e| ChunkLogError::io(&self.dir, e)),
        }
    }

    /// Enumerate chunk files, sorted by name (equivalently, by start offset).
    ///
    /// Files that are not regular, have the wrong name length, the wrong
    /// suffix, or a non-numeric prefix are ignored.
    pub fn scan(&self) -> Result<Vec<ChunkFile>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| ChunkLogError::io(&self.dir, e))?;
        let mut names: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ChunkLogError::io(&self.dir, e))?;
            let is_file = entry
                .file_type()
                .map_err(|e| ChunkLogError::io(entry.path(), e))?
                .is_file();
            if !is_file {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.len() != CHUNK_NAME_LEN || !name.ends_with(CHUNK_SUFFIX) {
                continue;
            }
            names.push(name.to_string());
        }
        names.sort();
        let mut chunks = Vec::with_capacity(names.len());
        for name in names {
            let Some(start) = parse_start(&name) else {
                continue;
            };
            chunks.push(ChunkFile {
                start,
                path: self.dir.join(&name),
            });
        }
        Ok(chunks)
    }
}

/// Parse the absolute start offset from a chunk filename.
fn parse_start(name: &str) -> Option<i64> {
    let digits = &name[..OFFSET_DIGITS];
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok()
}
