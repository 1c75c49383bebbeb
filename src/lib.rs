//! # line-records
//!
//! A read-only, randomly seekable cursor over line-delimited byte streams.
//! Each line is one record, optionally split into named fields.
//!
//! Forward iteration reads the stream line by line. Seeking and counting use
//! a byte offset index that is built with a single scan the first time it is
//! needed, or supplied up front from a saved side index.
pub mod records;

// Re-export the main types for convenience
pub use records::{
    CursorOptions,
    LineSource,
    OffsetIndex,
    OffsetTable,
    Record,
    RecordCursor,
    RecordDecoder,
    RecordIter,
    RecordsError,
    Result,
};
