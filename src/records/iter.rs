//! `Iterator` adapter over a [`RecordCursor`].
//!
//! # Example
//! ```
//! # use std::io::Cursor;
//! # use line_records::{CursorOptions, RecordCursor};
//! let mut stream = Cursor::new("a\nb\nc\n");
//! let mut cursor = RecordCursor::new(&mut stream, CursorOptions::default());
//! cursor.seek(1).unwrap();
//! let rest: Vec<_> = cursor
//!     .records()
//!     .map(|result| result.map(|(ordinal, record)| (ordinal, record.as_scalar().unwrap().to_string())))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(rest, vec![(1, "b".to_string()), (2, "c".to_string())]);
//! ```

use super::cursor::RecordCursor;
use super::types::error::Result;
use super::types::models::Record;
use super::types::source::LineSource;

/// Yields `(ordinal, record)` pairs from the cursor's current position on.
///
/// The cursor is left past the last yielded record. The iterator stops for
/// good after the stream ends or an I/O error is returned.
///
/// Created by [`RecordCursor::records()`].
pub struct RecordIter<'c, 'a, S: LineSource + ?Sized> {
    cursor: &'c mut RecordCursor<'a, S>,
    started: bool,
    done: bool,
}

impl<'c, 'a, S: LineSource + ?Sized> RecordIter<'c, 'a, S> {
    pub(super) fn new(cursor: &'c mut RecordCursor<'a, S>) -> Self {
        Self {
            cursor,
            started: false,
            done: false,
        }
    }
}

impl<S: LineSource + ?Sized> Iterator for RecordIter<'_, '_, S> {
    type Item = Result<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if self.started {
            if let Err(e) = self.cursor.next() {
                self.done = true;
                return Some(Err(e));
            }
        }
        self.started = true;

        match self.cursor.current() {
            Ok(Some(record)) => Some(Ok((self.cursor.key(), record))),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
