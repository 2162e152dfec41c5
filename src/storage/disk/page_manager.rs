use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{Page, PageId};
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

pub const PAGE_SIZE: usize = 4096;

/// Hands out pages and, for stores that keep them, reads and writes them back.
///
/// Pages are returned by value: the caller owns a page until it writes it
/// back or drops it.
pub enum PageManager {
    InMemory(MemoryStore),
    FileBacked(FileStore),
}

/// Pages kept in process memory. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    pages: Vec<Box<[u8; PAGE_SIZE]>>,
}

/// Pages stored back to back in a single file, page `n` at `n * PAGE_SIZE`.
pub struct FileStore {
    file: File,
}

impl PageManager {
    pub fn in_memory() -> Self {
        PageManager::InMemory(MemoryStore::default())
    }

    /// Create (or truncate) a page file.
    pub fn create(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        info!("created page file {}", path.display());

        Ok(PageManager::FileBacked(FileStore { file }))
    }

    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let store = FileStore { file };
        let len = store.file.metadata()?.len();
        if len % PAGE_SIZE as u64 != 0 {
            return Err(StorageError::CorruptPage(format!(
                "page file length {} is not a multiple of {}",
                len, PAGE_SIZE
            )));
        }
        info!(
            "opened page file {} ({} pages)",
            path.display(),
            len / PAGE_SIZE as u64
        );

        Ok(PageManager::FileBacked(store))
    }

    pub fn num_pages(&self) -> StorageResult<u32> {
        match self {
            PageManager::InMemory(store) => Ok(store.pages.len() as u32),
            PageManager::FileBacked(store) => {
                let file_size = store.file.metadata()?.len();
                Ok((file_size / PAGE_SIZE as u64) as u32)
            }
        }
    }

    /// Allocate a zero-filled page. Its header reads as an empty table page.
    pub fn allocate_page(&mut self) -> StorageResult<Page> {
        let page_id = PageId(self.num_pages()?);

        match self {
            PageManager::InMemory(store) => {
                store.pages.push(Box::new([0u8; PAGE_SIZE]));
            }
            PageManager::FileBacked(store) => {
                // Extending the file fills the new page with zeros
                let new_size = (page_id.0 as u64 + 1) * PAGE_SIZE as u64;
                store.file.set_len(new_size)?;
            }
        }

        debug!("allocated page {}", page_id.0);
        Ok(Page::new(page_id))
    }

    pub fn read_page(&mut self, page_id: PageId) -> StorageResult<Page> {
        if page_id.0 >= self.num_pages()? {
            return Err(StorageError::PageNotFound(page_id));
        }

        let mut data = Box::new([0u8; PAGE_SIZE]);
        match self {
            PageManager::InMemory(store) => {
                data.copy_from_slice(&store.pages[page_id.0 as usize][..]);
            }
            PageManager::FileBacked(store) => {
                store.file.seek(SeekFrom::Start(Self::page_offset(page_id)))?;
                store.file.read_exact(&mut data[..])?;
            }
        }

        Ok(Page::from_data(page_id, data))
    }

    /// Persist a page previously handed out by [`PageManager::allocate_page`].
    pub fn write_page(&mut self, page: &Page) -> StorageResult<()> {
        let page_id = page.page_id();
        if page_id.0 >= self.num_pages()? {
            return Err(StorageError::PageNotFound(page_id));
        }

        match self {
            PageManager::InMemory(store) => {
                store.pages[page_id.0 as usize].copy_from_slice(page.data());
            }
            PageManager::FileBacked(store) => {
                store.file.seek(SeekFrom::Start(Self::page_offset(page_id)))?;
                store.file.write_all(page.data())?;
                store.file.sync_all()?;
            }
        }

        debug!("wrote page {}", page_id.0);
        Ok(())
    }

    fn page_offset(page_id: PageId) -> u64 {
        page_id.0 as u64 * PAGE_SIZE as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::page::PageType;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_allocate_page_in_memory() -> Result<()> {
        let mut pm = PageManager::in_memory();
        assert_eq!(pm.num_pages()?, 0);

        let page = pm.allocate_page()?;
        assert_eq!(page.page_id(), PageId(0));
        assert!(page.data().iter().all(|&b| b == 0));

        let header = page.read_header()?;
        assert_eq!(header.page_type, PageType::Table);
        assert_eq!(header.slot_count, 0);
        assert_eq!(header.slot_directory_end(), 5);
        assert_eq!(header.free_space_boundary as usize, PAGE_SIZE);

        let page = pm.allocate_page()?;
        assert_eq!(page.page_id(), PageId(1));
        assert_eq!(pm.num_pages()?, 2);

        Ok(())
    }

    #[test]
    fn test_write_and_read_page_in_memory() -> Result<()> {
        let mut pm = PageManager::in_memory();
        let mut page = pm.allocate_page()?;
        page.slotted().insert_row(b"kept in memory")?;
        pm.write_page(&page)?;

        let mut read_back = pm.read_page(PageId(0))?;
        assert_eq!(read_back.data()[..], page.data()[..]);
        assert_eq!(read_back.slotted().row_bytes(0)?, b"kept in memory");

        Ok(())
    }

    #[test]
    fn test_create_and_open() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.db");

        {
            let pm = PageManager::create(&file_path)?;
            assert_eq!(pm.num_pages()?, 0);
        }

        {
            let pm = PageManager::open(&file_path)?;
            assert_eq!(pm.num_pages()?, 0);
        }

        Ok(())
    }

    #[test]
    fn test_allocate_page_file_backed() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.db");
        let mut pm = PageManager::create(&file_path)?;

        let page = pm.allocate_page()?;
        assert_eq!(page.page_id(), PageId(0));
        assert_eq!(pm.num_pages()?, 1);

        let page = pm.allocate_page()?;
        assert_eq!(page.page_id(), PageId(1));
        assert_eq!(pm.num_pages()?, 2);

        // Unwritten pages read back as zeros
        let page = pm.read_page(PageId(1))?;
        assert!(page.data().iter().all(|&b| b == 0));

        Ok(())
    }

    #[test]
    fn test_page_boundary() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.db");
        let mut pm = PageManager::create(&file_path)?;

        let mut page0 = pm.allocate_page()?;
        let mut page1 = pm.allocate_page()?;
        page0.data_mut().fill(1);
        page1.data_mut().fill(2);
        pm.write_page(&page0)?;
        pm.write_page(&page1)?;

        let read = pm.read_page(PageId(0))?;
        assert!(read.data().iter().all(|&b| b == 1));

        let read = pm.read_page(PageId(1))?;
        assert!(read.data().iter().all(|&b| b == 2));

        Ok(())
    }

    #[test]
    fn test_persistence() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.db");

        {
            let mut pm = PageManager::create(&file_path)?;
            let mut page = pm.allocate_page()?;
            page.slotted().insert_row(b"durable row")?;
            pm.write_page(&page)?;
        }

        {
            let mut pm = PageManager::open(&file_path)?;
            assert_eq!(pm.num_pages()?, 1);
            let mut page = pm.read_page(PageId(0))?;
            assert_eq!(page.read_header()?.slot_count, 1);
            assert_eq!(page.slotted().row_bytes(0)?, b"durable row");
        }

        Ok(())
    }

    #[test]
    fn test_read_nonexistent_page() -> Result<()> {
        let mut pm = PageManager::in_memory();
        assert!(matches!(
            pm.read_page(PageId(10)),
            Err(StorageError::PageNotFound(PageId(10)))
        ));

        let dir = tempdir()?;
        let mut pm = PageManager::create(&dir.path().join("test.db"))?;
        assert!(matches!(
            pm.read_page(PageId(0)),
            Err(StorageError::PageNotFound(PageId(0)))
        ));

        Ok(())
    }

    #[test]
    fn test_write_unallocated_page() {
        let mut pm = PageManager::in_memory();
        let page = Page::new(PageId(4));
        assert!(matches!(
            pm.write_page(&page),
            Err(StorageError::PageNotFound(PageId(4)))
        ));
    }

    #[test]
    fn test_open_nonexistent_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("nonexistent.db");

        let result = PageManager::open(&file_path);
        assert!(matches!(result, Err(StorageError::Io(_))));

        Ok(())
    }

    #[test]
    fn test_open_truncated_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("short.db");
        std::fs::write(&file_path, [0u8; 100])?;

        assert!(matches!(
            PageManager::open(&file_path),
            Err(StorageError::CorruptPage(_))
        ));

        Ok(())
    }
}
