//! Storage layer error types.

use crate::storage::page::PageId;
use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid page type: {0} (expected 0 = table or 1 = index)")]
    InvalidPageType(u8),

    #[error("Corrupt page header: {0}")]
    CorruptPage(String),

    #[error("Invalid slot ID: {slot_id} (slot count: {slot_count})")]
    SlotOutOfRange { slot_id: u16, slot_count: u16 },

    #[error("Row not found: slot {slot_id} has been deleted")]
    RowDeleted { slot_id: u16 },

    #[error("Slot {slot_id} is already deleted")]
    AlreadyDeleted { slot_id: u16 },

    #[error("Page is full: requires {required} bytes but only {available} available")]
    PageFull { required: usize, available: usize },

    #[error("Cannot insert an empty row")]
    EmptyRow,

    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("Text cell too long: {len} bytes (max: {max})")]
    TextTooLong { len: usize, max: usize },

    #[error("Row too large: {len} encoded bytes (max: {max})")]
    RowTooLarge { len: usize, max: usize },

    #[error("Too many cells in row: {count} (max: {max})")]
    TooManyCells { count: usize, max: usize },

    #[error("Page not found: {0:?}")]
    PageNotFound(PageId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
