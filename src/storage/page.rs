pub mod slotted_page;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::PAGE_SIZE;
use byteorder::{ByteOrder, LittleEndian};

/// Header layout (5 bytes): type u8, slot count u16, free-space boundary u16.
pub const HEADER_SIZE: usize = 5;
const PAGE_TYPE_OFFSET: usize = 0;
const SLOT_COUNT_OFFSET: usize = 1;
const FREE_SPACE_BOUNDARY_OFFSET: usize = 3;

/// Slot size (4 bytes: 2 for offset, 2 for length)
pub const SLOT_SIZE: usize = 4;

/// Index of a slot inside a page's slot directory.
pub type SlotId = u16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Table = 0,
    Index = 1,
}

impl PageType {
    pub fn from_u8(value: u8) -> StorageResult<Self> {
        match value {
            0 => Ok(PageType::Table),
            1 => Ok(PageType::Index),
            _ => Err(StorageError::InvalidPageType(value)),
        }
    }
}

/// Decoded form of the first [`HEADER_SIZE`] bytes of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub page_type: PageType,
    /// Number of slot entries, tombstones included.
    pub slot_count: u16,
    /// Lowest byte offset of the data region in use. Rows are placed below it.
    pub free_space_boundary: u16,
}

impl Header {
    /// Header of a page with no slots and an empty data region.
    pub fn new(page_type: PageType) -> Self {
        Self {
            page_type,
            slot_count: 0,
            free_space_boundary: PAGE_SIZE as u16,
        }
    }

    /// First byte past the slot directory.
    pub fn slot_directory_end(&self) -> usize {
        HEADER_SIZE + self.slot_count as usize * SLOT_SIZE
    }

    /// Largest row the page can take next, after reserving room for its slot.
    pub fn free_space(&self) -> usize {
        (self.free_space_boundary as usize)
            .saturating_sub(self.slot_directory_end())
            .saturating_sub(SLOT_SIZE)
    }

    /// Parse a header. A stored boundary of 0 only occurs on a zero-filled
    /// page and reads as an empty data region; with slots present it is
    /// corrupt.
    pub fn from_bytes(bytes: &[u8]) -> StorageResult<Self> {
        let page_type = PageType::from_u8(bytes[PAGE_TYPE_OFFSET])?;
        let slot_count = LittleEndian::read_u16(&bytes[SLOT_COUNT_OFFSET..SLOT_COUNT_OFFSET + 2]);
        let stored_boundary = LittleEndian::read_u16(
            &bytes[FREE_SPACE_BOUNDARY_OFFSET..FREE_SPACE_BOUNDARY_OFFSET + 2],
        );
        let free_space_boundary = match (stored_boundary, slot_count) {
            (0, 0) => PAGE_SIZE as u16,
            (0, _) => {
                return Err(StorageError::CorruptPage(format!(
                    "free-space boundary 0 with {} slots",
                    slot_count
                )))
            }
            (boundary, _) => boundary,
        };

        let header = Self {
            page_type,
            slot_count,
            free_space_boundary,
        };
        header.validate()?;
        Ok(header)
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[PAGE_TYPE_OFFSET] = self.page_type as u8;
        LittleEndian::write_u16(
            &mut bytes[SLOT_COUNT_OFFSET..SLOT_COUNT_OFFSET + 2],
            self.slot_count,
        );
        LittleEndian::write_u16(
            &mut bytes[FREE_SPACE_BOUNDARY_OFFSET..FREE_SPACE_BOUNDARY_OFFSET + 2],
            self.free_space_boundary,
        );
        bytes
    }

    /// Checks `slot_directory_end <= free_space_boundary <= PAGE_SIZE`.
    pub fn validate(&self) -> StorageResult<()> {
        let boundary = self.free_space_boundary as usize;
        if boundary > PAGE_SIZE {
            return Err(StorageError::CorruptPage(format!(
                "free-space boundary {} is past the page end",
                boundary
            )));
        }
        if boundary < self.slot_directory_end() {
            return Err(StorageError::CorruptPage(format!(
                "free-space boundary {} overlaps slot directory ending at {}",
                boundary,
                self.slot_directory_end()
            )));
        }
        Ok(())
    }
}

/// A slot directory entry. A length of 0 marks a deleted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub offset: u16,
    pub length: u16,
}

impl Slot {
    pub const fn new(offset: u16, length: u16) -> Self {
        Self { offset, length }
    }

    pub const fn is_deleted(&self) -> bool {
        self.length == 0
    }

    /// Byte range of the row this slot points at.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset as usize..self.offset as usize + self.length as usize
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            offset: LittleEndian::read_u16(&bytes[0..2]),
            length: LittleEndian::read_u16(&bytes[2..4]),
        }
    }

    pub fn to_bytes(&self) -> [u8; SLOT_SIZE] {
        let mut bytes = [0u8; SLOT_SIZE];
        LittleEndian::write_u16(&mut bytes[0..2], self.offset);
        LittleEndian::write_u16(&mut bytes[2..4], self.length);
        bytes
    }
}

/// A fixed-size page owned by exactly one holder.
pub struct Page {
    id: PageId,
    data: Box<[u8; PAGE_SIZE]>,
}

impl Page {
    /// A zero-filled page.
    pub fn new(id: PageId) -> Self {
        Self {
            id,
            data: Box::new([0u8; PAGE_SIZE]),
        }
    }

    pub fn from_data(id: PageId, data: Box<[u8; PAGE_SIZE]>) -> Self {
        Self { id, data }
    }

    pub fn page_id(&self) -> PageId {
        self.id
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }

    pub fn read_header(&self) -> StorageResult<Header> {
        Header::from_bytes(&self.data[..HEADER_SIZE])
    }

    /// Slotted view over this page's bytes.
    pub fn slotted(&mut self) -> SlottedPage<'_> {
        SlottedPage::from_data(&mut self.data)
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("id", &self.id)
            .field("header", &self.read_header())
            .finish()
    }
}

pub use slotted_page::SlottedPage;
