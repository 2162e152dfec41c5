pub mod page_manager;

pub use page_manager::{FileStore, MemoryStore, PageManager, PAGE_SIZE};
