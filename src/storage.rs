//! Storage layer implementation for slotdb.
//!
//! Pages are the unit of storage. Key components:
//!
//! - **Page**: Fixed-size (4KB) blocks of data owned by one holder at a time
//! - **PageManager**: Allocates pages, in memory or backed by a file
//! - **SlottedPage**: Slotted page format for storing variable-length rows
//!
//! A page is self-contained: header, slot directory and row data all live in
//! its 4096 bytes, so no invariant spans two pages.

pub mod disk;
pub mod error;
pub mod page;

pub use disk::{PageManager, PAGE_SIZE};
pub use error::{StorageError, StorageResult};
pub use page::{Header, Page, PageId, PageType, Slot, SlotId, SlottedPage};
