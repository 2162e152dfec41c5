//! Self-describing row encoding.
//!
//! ```text
//! +----------------+-----+---------+-----+---------+
//! | cell_count u16 | tag | payload | tag | payload | ...
//! +----------------+-----+---------+-----+---------+
//! ```
//!
//! Payloads: Int64 is 8 bytes little-endian, Bool is one byte (0/1), Null is
//! empty, Text is a `u16` length followed by that many UTF-8 bytes.

use crate::access::value::{Cell, CellType};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::page::{HEADER_SIZE, SLOT_SIZE};
use crate::storage::PAGE_SIZE;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;

/// Longest text payload a single cell may carry.
pub const MAX_TEXT_LEN: usize = PAGE_SIZE - HEADER_SIZE;

/// Largest encoded row an empty page can accept.
pub const MAX_ROW_SIZE: usize = PAGE_SIZE - HEADER_SIZE - SLOT_SIZE;

const CELL_COUNT_SIZE: usize = 2;

/// An ordered sequence of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn encoded_len(&self) -> usize {
        CELL_COUNT_SIZE + self.cells.iter().map(Cell::encoded_len).sum::<usize>()
    }

    /// Encode the row into a buffer of exactly `encoded_len()` bytes.
    pub fn encode(&self) -> StorageResult<Vec<u8>> {
        if self.cells.len() > u16::MAX as usize {
            return Err(StorageError::TooManyCells {
                count: self.cells.len(),
                max: u16::MAX as usize,
            });
        }
        for cell in &self.cells {
            if let Cell::Text(s) = cell {
                if s.len() > MAX_TEXT_LEN {
                    return Err(StorageError::TextTooLong {
                        len: s.len(),
                        max: MAX_TEXT_LEN,
                    });
                }
            }
        }
        let len = self.encoded_len();
        if len > MAX_ROW_SIZE {
            return Err(StorageError::RowTooLarge {
                len,
                max: MAX_ROW_SIZE,
            });
        }

        let mut buf = Vec::with_capacity(len);
        buf.write_u16::<LittleEndian>(self.cells.len() as u16)?;
        for cell in &self.cells {
            buf.write_u8(cell.cell_type() as u8)?;
            match cell {
                Cell::Int64(v) => buf.write_i64::<LittleEndian>(*v)?,
                Cell::Text(s) => {
                    buf.write_u16::<LittleEndian>(s.len() as u16)?;
                    buf.extend_from_slice(s.as_bytes());
                }
                Cell::Bool(b) => buf.write_u8(u8::from(*b))?,
                Cell::Null => {}
            }
        }
        debug_assert_eq!(buf.len(), len);

        Ok(buf)
    }

    /// Decode a row previously produced by [`Row::encode`]. The whole buffer
    /// must be consumed by exactly `cell_count` cells.
    pub fn decode(bytes: &[u8]) -> StorageResult<Row> {
        let mut reader = bytes;
        let cell_count = reader
            .read_u16::<LittleEndian>()
            .map_err(|_| corrupt("buffer too short for cell count"))?;

        // Every cell needs at least its tag byte
        if cell_count as usize > reader.len() {
            return Err(corrupt(format!(
                "cell count {} exceeds remaining {} bytes",
                cell_count,
                reader.len()
            )));
        }

        let mut cells = Vec::with_capacity(cell_count as usize);
        for index in 0..cell_count {
            let tag = reader
                .read_u8()
                .map_err(|_| corrupt(format!("cell {}: missing tag", index)))?;
            let cell = match CellType::from_u8(tag)? {
                CellType::Int64 => {
                    let v = reader
                        .read_i64::<LittleEndian>()
                        .map_err(|_| corrupt(format!("cell {}: truncated int64", index)))?;
                    Cell::Int64(v)
                }
                CellType::Text => {
                    let len = reader
                        .read_u16::<LittleEndian>()
                        .map_err(|_| corrupt(format!("cell {}: truncated text length", index)))?
                        as usize;
                    if len > reader.len() {
                        return Err(corrupt(format!(
                            "cell {}: text length {} exceeds remaining {} bytes",
                            index,
                            len,
                            reader.len()
                        )));
                    }
                    let (text, rest) = reader.split_at(len);
                    reader = rest;
                    let s = std::str::from_utf8(text)
                        .map_err(|e| corrupt(format!("cell {}: {}", index, e)))?;
                    Cell::Text(s.to_string())
                }
                CellType::Bool => match reader.read_u8() {
                    Ok(0) => Cell::Bool(false),
                    Ok(1) => Cell::Bool(true),
                    Ok(other) => {
                        return Err(corrupt(format!(
                            "cell {}: invalid bool byte {}",
                            index, other
                        )))
                    }
                    Err(_) => return Err(corrupt(format!("cell {}: truncated bool", index))),
                },
                CellType::Null => Cell::Null,
            };
            cells.push(cell);
        }

        if !reader.is_empty() {
            return Err(corrupt(format!(
                "{} trailing bytes after {} cells",
                reader.len(),
                cell_count
            )));
        }

        Ok(Row { cells })
    }
}

fn corrupt(msg: impl Into<String>) -> StorageError {
    StorageError::CorruptRow(msg.into())
}

impl From<Vec<Cell>> for Row {
    fn from(cells: Vec<Cell>) -> Self {
        Row::new(cells)
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", cell)?;
        }
        write!(f, ")")
    }
}
