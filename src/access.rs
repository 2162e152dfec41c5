//! Access layer for typed rows.
//!
//! - **Cell**: Type-safe representation of a single column value
//! - **Row**: Ordered cells with a self-describing byte encoding
//!
//! The encoding produced here is what slotted pages store; a page never
//! looks inside a row except to hand its bytes to [`Row::decode`].

pub mod row;
pub mod value;

pub use row::{Row, MAX_ROW_SIZE, MAX_TEXT_LEN};
pub use value::{Cell, CellType};
