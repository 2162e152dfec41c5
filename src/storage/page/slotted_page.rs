//! Slotted page format for variable-length rows.
//!
//! ```text
//! +----------------------+ 0
//! | Header (5 bytes)     |
//! +----------------------+ 5
//! | Slot directory       |  4 bytes per slot, grows toward the page end
//! +----------------------+ slot_directory_end
//! | Free space           |
//! +----------------------+ free_space_boundary
//! | Row data             |  grows toward the header
//! +----------------------+ PAGE_SIZE
//! ```
//!
//! Slot ids are handed out in append order and are never reused. Deleting a
//! row only zeroes its slot length; [`SlottedPage::compact`] reclaims the
//! space and renumbers the surviving slots.

use crate::access::row::Row;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{Header, PageType, Slot, SlotId, HEADER_SIZE, SLOT_SIZE};
use crate::storage::PAGE_SIZE;
use log::{debug, trace, warn};

pub struct SlottedPage<'a> {
    data: &'a mut [u8; PAGE_SIZE],
}

impl<'a> SlottedPage<'a> {
    /// Format `data` as an empty page of the given type.
    pub fn new(data: &'a mut [u8; PAGE_SIZE], page_type: PageType) -> Self {
        data.fill(0);
        let mut page = Self { data };
        page.write_header(Header::new(page_type));
        page
    }

    /// Wrap bytes that already hold a page.
    pub fn from_data(data: &'a mut [u8; PAGE_SIZE]) -> Self {
        Self { data }
    }

    pub fn read_header(&self) -> StorageResult<Header> {
        Header::from_bytes(&self.data[..HEADER_SIZE])
    }

    /// Callers must pass a header that satisfies [`Header::validate`].
    pub fn write_header(&mut self, header: Header) {
        trace!("write header {:?}", header);
        self.data[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
    }

    pub fn slot(&self, slot_id: SlotId) -> StorageResult<Slot> {
        let header = self.read_header()?;
        if slot_id >= header.slot_count {
            return Err(StorageError::SlotOutOfRange {
                slot_id,
                slot_count: header.slot_count,
            });
        }
        Ok(self.read_slot(slot_id))
    }

    /// The whole slot directory, tombstones included.
    pub fn slots(&self) -> StorageResult<Vec<Slot>> {
        let header = self.read_header()?;
        Ok((0..header.slot_count).map(|id| self.read_slot(id)).collect())
    }

    /// Slots that still point at a row, with their ids.
    pub fn live_slots(&self) -> StorageResult<Vec<(SlotId, Slot)>> {
        let slot_count = self.read_header()?.slot_count;
        Ok((0..slot_count)
            .map(|id| (id, self.read_slot(id)))
            .filter(|(_, slot)| !slot.is_deleted())
            .collect())
    }

    /// Bytes available for the next row once its slot entry is accounted for.
    pub fn free_space(&self) -> StorageResult<usize> {
        Ok(self.read_header()?.free_space())
    }

    /// Store an encoded row and return its slot id. Either the row, its slot
    /// and the header are all written, or nothing is.
    pub fn insert_row(&mut self, row_data: &[u8]) -> StorageResult<SlotId> {
        if row_data.is_empty() {
            return Err(StorageError::EmptyRow);
        }

        let mut header = self.read_header()?;
        let required = row_data.len();
        let available = header.free_space();
        if required > available {
            warn!(
                "page full: row needs {} bytes, {} available",
                required, available
            );
            return Err(StorageError::PageFull {
                required,
                available,
            });
        }

        let row_offset = header.free_space_boundary as usize - required;
        self.data[row_offset..row_offset + required].copy_from_slice(row_data);

        let slot_id = header.slot_count;
        self.write_slot(slot_id, Slot::new(row_offset as u16, required as u16));

        header.slot_count += 1;
        header.free_space_boundary = row_offset as u16;
        self.write_header(header);

        debug!(
            "inserted row into slot {} at offset {} ({} bytes)",
            slot_id, row_offset, required
        );
        Ok(slot_id)
    }

    /// Encode `row` and insert it.
    pub fn insert(&mut self, row: &Row) -> StorageResult<SlotId> {
        let bytes = row.encode()?;
        self.insert_row(&bytes)
    }

    /// Raw encoded bytes of a live row.
    pub fn row_bytes(&self, slot_id: SlotId) -> StorageResult<&[u8]> {
        let header = self.read_header()?;
        let slot = self.slot(slot_id)?;
        if slot.is_deleted() {
            return Err(StorageError::RowDeleted { slot_id });
        }

        let range = slot.range();
        if range.start < header.slot_directory_end() || range.end > PAGE_SIZE {
            return Err(StorageError::CorruptPage(format!(
                "slot {} points at {:?}, outside the data region",
                slot_id, range
            )));
        }
        Ok(&self.data[range])
    }

    pub fn read_row(&self, slot_id: SlotId) -> StorageResult<Row> {
        Row::decode(self.row_bytes(slot_id)?)
    }

    /// Tombstone a row. Its bytes stay in place until the next compaction.
    pub fn delete_row(&mut self, slot_id: SlotId) -> StorageResult<()> {
        let mut slot = self.slot(slot_id)?;
        if slot.is_deleted() {
            return Err(StorageError::AlreadyDeleted { slot_id });
        }

        slot.length = 0;
        self.write_slot(slot_id, slot);

        debug!("deleted row in slot {}", slot_id);
        Ok(())
    }

    /// Pack the surviving rows against the page end, in slot order, and drop
    /// tombstoned slots. Survivors are renumbered from 0 keeping their
    /// relative order. Returns how much free space was gained.
    pub fn compact(&mut self) -> StorageResult<usize> {
        let mut header = self.read_header()?;
        let free_before = header.free_space();

        let mut survivors = Vec::new();
        for (slot_id, _) in self.live_slots()? {
            survivors.push(self.row_bytes(slot_id)?.to_vec());
        }

        // Overlapping slots can claim more bytes than the page holds
        let directory_end = HEADER_SIZE + survivors.len() * SLOT_SIZE;
        let data_len: usize = survivors.iter().map(Vec::len).sum();
        if directory_end + data_len > PAGE_SIZE {
            return Err(StorageError::CorruptPage(format!(
                "{} live slots claim {} row bytes, more than the page holds",
                survivors.len(),
                data_len
            )));
        }

        let mut boundary = PAGE_SIZE;
        for (new_id, row) in survivors.iter().enumerate() {
            boundary -= row.len();
            self.data[boundary..boundary + row.len()].copy_from_slice(row);
            self.write_slot(new_id as SlotId, Slot::new(boundary as u16, row.len() as u16));
        }

        // Wipe stale slot entries and the old row bytes now in free space
        self.data[directory_end..boundary].fill(0);

        let dropped = header.slot_count as usize - survivors.len();
        header.slot_count = survivors.len() as u16;
        header.free_space_boundary = boundary as u16;
        self.write_header(header);

        let reclaimed = header.free_space() - free_before;
        debug!(
            "compacted page: dropped {} slots, reclaimed {} bytes",
            dropped, reclaimed
        );
        Ok(reclaimed)
    }

    fn slot_position(slot_id: SlotId) -> usize {
        HEADER_SIZE + slot_id as usize * SLOT_SIZE
    }

    fn read_slot(&self, slot_id: SlotId) -> Slot {
        let pos = Self::slot_position(slot_id);
        Slot::from_bytes(&self.data[pos..pos + SLOT_SIZE])
    }

    fn write_slot(&mut self, slot_id: SlotId, slot: Slot) {
        let pos = Self::slot_position(slot_id);
        self.data[pos..pos + SLOT_SIZE].copy_from_slice(&slot.to_bytes());
    }
}
