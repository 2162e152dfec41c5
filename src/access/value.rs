use crate::storage::error::{StorageError, StorageResult};
use std::fmt;

/// On-page tag of a cell. The discriminant is the byte written before the
/// cell payload.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Int64 = 0,
    Text = 1,
    Bool = 2,
    Null = 3,
}

impl CellType {
    pub fn from_u8(value: u8) -> StorageResult<Self> {
        match value {
            0 => Ok(CellType::Int64),
            1 => Ok(CellType::Text),
            2 => Ok(CellType::Bool),
            3 => Ok(CellType::Null),
            _ => Err(StorageError::CorruptRow(format!(
                "unknown cell tag: {}",
                value
            ))),
        }
    }
}

/// One typed value inside a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Int64(i64),
    Text(String),
    Bool(bool),
    Null,
}

impl Cell {
    pub fn cell_type(&self) -> CellType {
        match self {
            Cell::Int64(_) => CellType::Int64,
            Cell::Text(_) => CellType::Text,
            Cell::Bool(_) => CellType::Bool,
            Cell::Null => CellType::Null,
        }
    }

    /// Number of bytes this cell occupies once encoded, tag included.
    pub fn encoded_len(&self) -> usize {
        let payload = match self {
            Cell::Int64(_) => 8,
            Cell::Text(s) => 2 + s.len(),
            Cell::Bool(_) => 1,
            Cell::Null => 0,
        };
        1 + payload
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int64(v) => write!(f, "{}", v),
            Cell::Text(s) => write!(f, "{:?}", s),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Null => write!(f, "NULL"),
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int64(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}
