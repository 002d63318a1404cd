//! The error taxonomy every operation in the kernel reports through.
//!
//! Errors are surfaced verbatim from the layer that detects them; no layer
//! swallows an error returned by the layer below it (spec §7).

use thiserror::Error;

use crate::common::{PageNum, SlotNum};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DbError {
    // --- Input / argument errors ---
    #[error("no filename given")]
    NoFilename,
    #[error("invalid page number: {0}")]
    InvalidPageNumber(i64),
    #[error("initialization error: {0}")]
    InitError(String),

    // --- File-system errors ---
    #[error("failed to create page file")]
    FileCreationFailed,
    #[error("page file not found: {0}")]
    FileNotFound(String),
    #[error("page file not closed")]
    FileNotClosed,
    #[error("page file not initialized")]
    FileNotInitialized,
    #[error("failed to seek to offset")]
    OffsetFailed,
    #[error("failed to write block")]
    WriteFailed,
    #[error("failed to read file")]
    ReadFileFailed,

    // --- Page-level errors ---
    #[error("attempted to read non-existing page {0}")]
    ReadNonExistingPage(PageNum),
    #[error("incompatible block size")]
    IncompatibleBlockSize,

    // --- Buffer errors ---
    #[error("buffer pool not allocated")]
    BmNotAllocated,
    #[error("page not found in buffer pool")]
    PageNotFound,
    #[error("no frame available for eviction")]
    NoFrameAvailable,
    #[error("memory allocation failed")]
    MemoryAllocFail,
    #[error("unknown replacement strategy")]
    UnknownStrategy,

    // --- Record-manager errors ---
    #[error("table file already exists")]
    FileAlreadyExists,
    #[error("no free pages available")]
    NoFreePages,
    #[error("no more tuples in scan")]
    NoMoreTuples,
    #[error("invalid slot {0} on page {1}")]
    InvalidSlot(SlotNum, PageNum),
    #[error("attribute index {0} out of range")]
    InvalidAttribute(u16),

    // --- Escape hatch for the underlying OS ---
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DbError {
    fn from(e: std::io::Error) -> Self {
        DbError::Io(e.to_string())
    }
}
