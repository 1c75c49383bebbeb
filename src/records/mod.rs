//! Core record cursor module.
//!
//! Layered leaf to root:
//! - [`table`]: the ordinal → byte offset table and its side index format
//! - [`index`]: lazy, cached construction of that table from a stream
//! - [`decoder`]: one raw line → one [`Record`]
//! - [`cursor`]: the iteration and positioning contract built on both

pub mod cursor;
pub mod decoder;
pub mod index;
pub mod iter;
pub mod table;
pub mod types;

pub use cursor::RecordCursor;
pub use decoder::RecordDecoder;
pub use index::OffsetIndex;
pub use iter::RecordIter;
pub use table::OffsetTable;
pub use types::error::{RecordsError, Result};
pub use types::models::{CursorOptions, Record, DEFAULT_KEY_PREFIX};
pub use types::source::LineSource;
